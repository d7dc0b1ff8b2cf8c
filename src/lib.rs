#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
pub mod numerical;
pub mod solver;
pub mod symbolic;

pub use solver::report::SolveResult;
pub use solver::errors::SolverError;
pub use solver::solve_api::{SolverSettings, extract_variables, solve, solve_text, solve_with_settings};
