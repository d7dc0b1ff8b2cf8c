//! Top-level solve pipeline: constants → normalization → symbolic model →
//! Newton iteration → report. This is the surface an embedding application
//! calls; everything below it is reusable on its own.

use crate::numerical::NR::NR;
use crate::solver::constants::resolve_constants;
use crate::solver::errors::SolverError;
use crate::solver::normalizer::{flatten_blocks, normalize_equations};
use crate::solver::report::{SolveResult, build_report};
use crate::solver::system::{SymbolicSystem, discover_unknowns};
use std::collections::HashMap;

/// Knobs of a single solve. `Default` reproduces the stock behaviour:
/// tolerance 1e-6 on the residual norm, 50 iterations, seed 42, no
/// terminal logging.
#[derive(Clone, Debug)]
pub struct SolverSettings {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub seed: u64,
    pub loglevel: Option<String>,
}

impl Default for SolverSettings {
    fn default() -> SolverSettings {
        SolverSettings {
            tolerance: 1e-6,
            max_iterations: 50,
            seed: 42,
            loglevel: None,
        }
    }
}

/// Lists the unknowns of an equation set in first-seen source order,
/// applying the same constant resolution and name filtering as a full
/// solve. Callers use this to build initial-guess forms.
pub fn extract_variables(
    equation_lines: &[String],
    constants_text: Option<&str>,
) -> Result<Vec<String>, SolverError> {
    let constants = match constants_text {
        Some(text) => resolve_constants(text)?,
        None => HashMap::new(),
    };
    let equations = normalize_equations(equation_lines);
    Ok(discover_unknowns(&equations, &constants))
}

/// Solves an equation set with default settings.
pub fn solve(
    equation_lines: &[String],
    initial_guess: Option<&HashMap<String, f64>>,
    constants_text: Option<&str>,
) -> Result<SolveResult, SolverError> {
    solve_with_settings(
        equation_lines,
        initial_guess,
        constants_text,
        &SolverSettings::default(),
    )
}

/// Full pipeline with explicit settings.
pub fn solve_with_settings(
    equation_lines: &[String],
    initial_guess: Option<&HashMap<String, f64>>,
    constants_text: Option<&str>,
    settings: &SolverSettings,
) -> Result<SolveResult, SolverError> {
    let constants = match constants_text {
        Some(text) => resolve_constants(text)?,
        None => HashMap::new(),
    };
    let equations = normalize_equations(equation_lines);
    let system = SymbolicSystem::build(&equations, &constants)?;

    let mut nr = NR::new(system);
    nr.set_solver_params(
        settings.tolerance,
        settings.max_iterations,
        settings.seed,
        settings.loglevel.clone(),
    );
    nr.set_initial_guess(initial_guess);
    let converged_in = nr.solve()?;

    build_report(&nr, &equations, &constants, converged_in)
}

/// Convenience entry for raw multi-block text: `---`-delimited blocks are
/// flattened into one equation sequence, then solved as a single system.
pub fn solve_text(
    equation_text: &str,
    initial_guess: Option<&HashMap<String, f64>>,
    constants_text: Option<&str>,
) -> Result<SolveResult, SolverError> {
    let lines = flatten_blocks(equation_text);
    solve(&lines, initial_guess, constants_text)
}
