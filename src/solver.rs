pub mod constants;
pub mod errors;
pub mod normalizer;
pub mod report;
pub mod solve_api;
pub mod system;
