//! Constant resolution. Constant definitions (`name = expression`) are
//! evaluated in file order through the restricted expression evaluator; a
//! definition may reference every previously defined constant plus the
//! built-in names `pi` and `e`. Forward references fail, redefinition
//! silently overwrites (last wins).

use crate::solver::errors::SolverError;
use crate::solver::normalizer::normalize_lines;
use crate::symbolic::parse_expr::parse_expression;
use crate::symbolic::symbolic_engine_derivatives::EvalError;
use std::collections::HashMap;
use std::f64::consts::{E, PI};

/// Built-in environment visible to constant definitions.
pub fn builtin_env() -> HashMap<String, f64> {
    let mut env = HashMap::new();
    env.insert("pi".to_string(), PI);
    env.insert("e".to_string(), E);
    env
}

/// Resolves constant-definition text into a name→value table.
///
/// Returns only the user-defined names; `pi`/`e` stay implicit unless
/// redefined. Lines without `=` are skipped.
pub fn resolve_constants(text: &str) -> Result<HashMap<String, f64>, SolverError> {
    let mut resolved: HashMap<String, f64> = HashMap::new();
    let mut env = builtin_env();

    for line in normalize_lines(text) {
        let Some((name, expression)) = line.split_once('=') else {
            continue;
        };
        let name = name.trim();
        let expression = expression.trim();

        let expr = parse_expression(expression).map_err(|message| {
            SolverError::InvalidExpression {
                name: name.to_string(),
                expression: expression.to_string(),
                message,
            }
        })?;
        let value = expr.eval_checked(&env).map_err(|err| match err {
            EvalError::Undefined(_) => SolverError::InvalidExpression {
                name: name.to_string(),
                expression: expression.to_string(),
                message: err.to_string(),
            },
            EvalError::Domain(_) => SolverError::EvaluationError {
                expression: expression.to_string(),
                message: err.to_string(),
            },
        })?;

        resolved.insert(name.to_string(), value);
        env.insert(name.to_string(), value);
    }
    Ok(resolved)
}
