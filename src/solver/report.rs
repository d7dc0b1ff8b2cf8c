//! Solution reporting. Builds the name→value mapping and the diagnostic log
//! from a converged Newton run: initial guesses, per-iteration residual
//! vectors and norms, the final solution, per-equation residuals recomputed
//! from the *original* equation text (an independent check of the parsed
//! model) and the final residual norm. Purely observational, never alters
//! solver state.

use crate::numerical::NR::NR;
use crate::solver::errors::SolverError;
use crate::solver::normalizer::Equation;
use crate::solver::system::substitution_map;
use crate::symbolic::parse_expr::parse_expression;
use std::collections::HashMap;

/// The sole externally observable output of a successful solve.
#[derive(Clone, Debug)]
pub struct SolveResult {
    /// Final value per unknown, in unknown (first-seen) order.
    pub solution: Vec<(String, f64)>,
    /// Human-readable diagnostic log of the whole run.
    pub log: String,
}

impl SolveResult {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.solution
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn solution_map(&self) -> HashMap<String, f64> {
        self.solution.iter().cloned().collect()
    }
}

// same rounding as the residual trace display: 6 decimal places by value
fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Builds the report from a terminal (converged) Newton state.
pub fn build_report(
    nr: &NR,
    equations: &[Equation],
    constants: &HashMap<String, f64>,
    converged_in: usize,
) -> Result<SolveResult, SolverError> {
    let x = nr
        .result
        .as_ref()
        .unwrap_or(&nr.x);
    let unknowns = &nr.system.unknowns;
    let solution: Vec<(String, f64)> = unknowns
        .iter()
        .cloned()
        .zip(x.iter().copied())
        .collect();

    let mut log = String::new();
    log.push_str("\nSolving using Newton's Raphson Method:\n");

    log.push_str("\nInitial Guess Used:\n");
    for (name, value) in unknowns.iter().zip(nr.initial_guess.iter()) {
        log.push_str(&format!(" {} = {:.4}\n", name, value));
    }

    for (k, record) in nr.trace.iter().enumerate() {
        log.push_str(&format!("\nIteration {}:\n", k + 1));
        let rounded: Vec<String> = record
            .residuals
            .iter()
            .map(|r| round6(*r).to_string())
            .collect();
        log.push_str(&format!(" Residuals:  [{}]\n", rounded.join(", ")));
        log.push_str(&format!(" Residual Norm:  {}\n", record.residual_norm));
    }

    log.push_str(&format!("\nConverged in {} iterations\n", converged_in));

    log.push_str("\nFinal Solution:\n");
    for (name, value) in &solution {
        log.push_str(&format!(" {} = {:.6}\n", name, value));
    }

    let check = check_residuals(equations, constants, &solution)?;
    log.push_str("\nResiduals:\n");
    for (i, residual) in check.iter().enumerate() {
        log.push_str(&format!("Eq{}: {:.6e}\n", i + 1, residual));
    }

    log.push_str(&format!(
        "\nFinal Residual Norm: {:.4e}\n",
        nr.final_residuals.norm()
    ));

    Ok(SolveResult { solution, log })
}

/// Evaluates lhs - rhs of each *original* equation at the final point.
///
/// This goes back through the parser rather than reusing the compiled
/// residuals, so a model-construction bug shows up as a nonzero entry here.
fn check_residuals(
    equations: &[Equation],
    constants: &HashMap<String, f64>,
    solution: &[(String, f64)],
) -> Result<Vec<f64>, SolverError> {
    let mut env = substitution_map(constants);
    for (name, value) in solution {
        env.insert(name.clone(), *value);
    }

    let mut residuals = Vec::with_capacity(equations.len());
    for equation in equations {
        let parse = |side: &str| {
            parse_expression(side).map_err(|message| SolverError::ParseError {
                equation: equation.text.clone(),
                message,
            })
        };
        let lhs = parse(&equation.lhs)?;
        let residual_expr = match &equation.rhs {
            Some(rhs) if !rhs.is_empty() => lhs - parse(rhs)?,
            _ => lhs,
        };
        // domain failures at the solution point show up as NaN in the log
        // instead of failing an otherwise converged solve
        let value = residual_expr.eval_checked(&env).unwrap_or(f64::NAN);
        residuals.push(value);
    }
    Ok(residuals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::normalizer::normalize_equations;
    use crate::solver::system::SymbolicSystem;
    use approx::assert_relative_eq;

    fn solved_nr(lines: &[&str]) -> (NR, Vec<Equation>, usize) {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        let equations = normalize_equations(&lines);
        let system = SymbolicSystem::build(&equations, &HashMap::new()).unwrap();
        let mut nr = NR::new(system);
        nr.set_initial_guess(None);
        let converged_in = nr.main_loop().unwrap();
        (nr, equations, converged_in)
    }

    #[test]
    fn test_report_solution_mapping() {
        let (nr, equations, converged_in) = solved_nr(&["x + y = 3", "x - y = 1"]);
        let result = build_report(&nr, &equations, &HashMap::new(), converged_in).unwrap();
        assert_relative_eq!(result.get("x").unwrap(), 2.0, epsilon = 1e-6);
        assert_relative_eq!(result.get("y").unwrap(), 1.0, epsilon = 1e-6);
        assert!(result.get("z").is_none());
    }

    #[test]
    fn test_report_log_sections() {
        let (nr, equations, converged_in) = solved_nr(&["x - 5 = 0"]);
        let result = build_report(&nr, &equations, &HashMap::new(), converged_in).unwrap();
        assert!(result.log.contains("Solving using Newton's Raphson Method:"));
        assert!(result.log.contains("Initial Guess Used:"));
        assert!(result.log.contains("Iteration 1:"));
        assert!(result.log.contains("Residual Norm:"));
        assert!(result.log.contains("Converged in 1 iterations"));
        assert!(result.log.contains("Final Solution:"));
        assert!(result.log.contains(" x = 5.000000"));
        assert!(result.log.contains("Eq1:"));
        assert!(result.log.contains("Final Residual Norm:"));
    }

    #[test]
    fn test_check_residuals_use_original_text() {
        let solution = vec![("x".to_string(), 2.0), ("y".to_string(), 1.0)];
        let lines = vec!["x + y = 3".to_string(), "x - y = 1".to_string()];
        let equations = normalize_equations(&lines);
        let residuals = check_residuals(&equations, &HashMap::new(), &solution).unwrap();
        assert_relative_eq!(residuals[0], 0.0);
        assert_relative_eq!(residuals[1], 0.0);
    }

    #[test]
    fn test_round6() {
        assert_relative_eq!(round6(1.23456789), 1.234568);
        assert_relative_eq!(round6(-0.0000004), 0.0);
    }
}
