//! Error taxonomy of the solve pipeline. Every failure reaching the caller
//! is one of these variants; nothing panics on user input and nothing is
//! swallowed. Neither `SingularJacobian` nor `DidNotConverge` is retried —
//! the caller may resubmit with a different initial guess or seed.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolverError {
    /// A constant definition failed to parse, or referenced an undefined
    /// name. Carries the offending line pieces.
    #[error("invalid expression for '{name}': '{expression}': {message}")]
    InvalidExpression {
        name: String,
        expression: String,
        message: String,
    },

    /// A constant definition parsed but hit a numeric domain error while
    /// being evaluated (e.g. log of a negative number).
    #[error("failed to evaluate '{expression}': {message}")]
    EvaluationError { expression: String, message: String },

    /// Equation text could not be converted to a symbolic expression.
    #[error("cannot parse equation '{equation}': {message}")]
    ParseError { equation: String, message: String },

    /// Equation count and unknown count differ; the system is not square
    /// and the jacobian cannot be inverted. Checked before solving.
    #[error("system is not square: {equations} equation(s) but {unknowns} unknown(s)")]
    DimensionMismatch { equations: usize, unknowns: usize },

    /// The jacobian was singular at some iterate. Fatal.
    #[error("jacobian is singular at iteration {iteration}, cannot proceed")]
    SingularJacobian { iteration: usize },

    /// The iteration budget was exhausted without meeting the tolerance.
    #[error("Newton method did not converge within {iterations} iterations")]
    DidNotConverge { iterations: usize },
}

impl SolverError {
    /// Stable machine-readable kind, for callers serializing failures.
    pub fn kind(&self) -> &'static str {
        match self {
            SolverError::InvalidExpression { .. } => "InvalidExpression",
            SolverError::EvaluationError { .. } => "EvaluationError",
            SolverError::ParseError { .. } => "ParseError",
            SolverError::DimensionMismatch { .. } => "DimensionMismatch",
            SolverError::SingularJacobian { .. } => "SingularJacobian",
            SolverError::DidNotConverge { .. } => "DidNotConverge",
        }
    }
}
