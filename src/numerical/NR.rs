//! Newton-Raphson engine for square nonlinear systems.
//!
//! Example:
//! ```
//! use nonlineq::solver::normalizer::normalize_equations;
//! use nonlineq::solver::system::SymbolicSystem;
//! use nonlineq::numerical::NR::NR;
//! use std::collections::HashMap;
//!
//! let lines = vec!["x + y = 3".to_string(), "x - y = 1".to_string()];
//! let equations = normalize_equations(&lines);
//! let system = SymbolicSystem::build(&equations, &HashMap::new()).unwrap();
//! let mut nr = NR::new(system);
//! nr.set_initial_guess(None);
//! let iterations = nr.main_loop().unwrap();
//! let solution = nr.result.unwrap();
//! assert!((solution[0] - 2.0).abs() < 1e-6);
//! assert!((solution[1] - 1.0).abs() < 1e-6);
//! assert_eq!(iterations, 1);
//! ```

use crate::solver::errors::SolverError;
use crate::solver::system::SymbolicSystem;
use log::{error, info, warn};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};
use std::collections::HashMap;

/// One Newton step as observed before the update was applied.
#[derive(Clone, Debug)]
pub struct IterationRecord {
    pub residuals: DVector<f64>,
    pub residual_norm: f64,
}

pub struct NR {
    pub system: SymbolicSystem,
    pub tolerance: f64,        // convergence test is on the residual L2 norm only
    pub max_iterations: usize, // iteration budget
    pub seed: u64,             // solve-scoped RNG seed for missing guesses
    pub loglevel: Option<String>,

    pub i: usize, // iteration counter
    pub initial_guess: DVector<f64>,
    pub x: DVector<f64>, // current iterate
    pub trace: Vec<IterationRecord>,
    pub final_residuals: DVector<f64>,
    pub result: Option<DVector<f64>>,
}

impl NR {
    pub fn new(system: SymbolicSystem) -> NR {
        NR {
            system,
            tolerance: 1e-6,
            max_iterations: 50,
            seed: 42,
            loglevel: None,
            i: 0,
            initial_guess: DVector::zeros(0),
            x: DVector::zeros(0),
            trace: Vec::new(),
            final_residuals: DVector::zeros(0),
            result: None,
        }
    }

    pub fn set_solver_params(
        &mut self,
        tolerance: f64,
        max_iterations: usize,
        seed: u64,
        loglevel: Option<String>,
    ) {
        assert!(
            tolerance >= 0.0,
            "Tolerance should be a non-negative number."
        );
        assert!(
            max_iterations > 0,
            "Max iterations should be a positive number."
        );
        if let Some(level) = &loglevel {
            assert!(
                level == "debug" || level == "info" || level == "warn" || level == "error",
                "loglevel must be debug, info, warn or error"
            );
        }
        self.tolerance = tolerance;
        self.max_iterations = max_iterations;
        self.seed = seed;
        self.loglevel = loglevel;
    }

    /// Builds x0 for the system's unknowns: the caller-supplied value when
    /// present, otherwise a uniform sample from [0, 2) drawn from an RNG
    /// seeded per solve. Identical inputs and seed reproduce the exact
    /// iterate sequence; concurrent solves share no RNG state.
    pub fn set_initial_guess(&mut self, guess: Option<&HashMap<String, f64>>) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let x0: Vec<f64> = self
            .system
            .unknowns
            .iter()
            .map(|name| {
                guess
                    .and_then(|map| map.get(name).copied())
                    .unwrap_or_else(|| rng.random_range(0.0..2.0))
            })
            .collect();
        self.initial_guess = DVector::from_vec(x0);
        self.x = self.initial_guess.clone();
    }

    /// Runs the Newton iteration to a terminal state.
    ///
    /// Returns the iteration count at convergence, `SingularJacobian` if a
    /// linear solve fails (fatal, no retry), or `DidNotConverge` once the
    /// budget is exhausted. The per-iteration residual trace is kept for the
    /// reporter.
    pub fn main_loop(&mut self) -> Result<usize, SolverError> {
        assert_eq!(
            self.x.len(),
            self.system.len(),
            "Initial guess and vector of unknowns should have the same length."
        );
        for i in 0..self.max_iterations {
            let f = self.system.evaluate_residuals(&self.x);
            let residual_norm = f.norm();

            if residual_norm < self.tolerance {
                info!(
                    "converged in {} iterations, residual norm = {:.4e}",
                    i, residual_norm
                );
                self.i = i;
                self.final_residuals = f;
                self.result = Some(self.x.clone());
                return Ok(i);
            }

            let jacobian = self.system.evaluate_jacobian(&self.x);
            let delta = match Self::solve_linear_system(&jacobian, &(-&f)) {
                Some(delta) => delta,
                None => {
                    error!("jacobian is singular at iteration {}", i);
                    return Err(SolverError::SingularJacobian { iteration: i });
                }
            };

            if let Some(previous) = self.trace.last() {
                if residual_norm > previous.residual_norm {
                    warn!("residual norm is increasing");
                }
            }
            info!("iteration = {}, residual norm = {}", i + 1, residual_norm);
            self.trace.push(IterationRecord {
                residuals: f,
                residual_norm,
            });

            self.x += delta;
            self.i = i + 1;
        }
        error!("maximum number of iterations reached, no solution found");
        self.final_residuals = self.system.evaluate_residuals(&self.x);
        Err(SolverError::DidNotConverge {
            iterations: self.max_iterations,
        })
    }

    fn level_filter(level: &str) -> LevelFilter {
        match level {
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    }

    /// wrapper around main_loop to set up terminal logging when requested
    pub fn solve(&mut self) -> Result<usize, SolverError> {
        if let Some(level) = &self.loglevel {
            let filter = Self::level_filter(level);
            // a second init in the same process fails; that is fine, the
            // existing logger keeps working
            let _ = CombinedLogger::init(vec![TermLogger::new(
                filter,
                Config::default(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )]);
        }
        self.main_loop()
    }

    pub fn get_result(&self) -> Option<DVector<f64>> {
        self.result.clone()
    }

    pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
        a.clone().lu().solve(b)
    }
}
