//! Symbolic model builder: turns normalized equations plus a resolved
//! constant table into a square symbolic system with compiled residual and
//! jacobian callables.
//!
//! Pipeline per system: discover unknowns (source order), build `lhs - rhs`
//! residual expressions with constants substituted as literals, derive the
//! jacobian analytically, lambdify everything once. The dimension check
//! (equation count == unknown count) runs before any compilation so a
//! non-square system fails fast instead of dying inside the linear solve.

use crate::solver::errors::SolverError;
use crate::solver::normalizer::Equation;
use crate::symbolic::parse_expr::parse_expression;
use crate::symbolic::symbolic_engine::Expr;
use nalgebra::{DMatrix, DVector};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use std::fmt;

/// Names never treated as unknowns: the function whitelist plus `pi`.
/// `e` is deliberately absent — it is bound inside constant definitions
/// only, so it remains a legal unknown name in equations.
pub const RESERVED_NAMES: [&str; 8] = ["sin", "cos", "tan", "sqrt", "log", "ln", "exp", "pi"];

/// Scans equations for identifier tokens and returns the unknowns in
/// first-seen source order, excluding resolved constants, reserved names and
/// call-position identifiers. A name followed by `(` is a function name, not
/// an unknown; the parser classifies it (whitelisted or `ParseError`), so a
/// bad call like `foo(x)` fails as a parse error instead of inflating the
/// unknown count into a dimension mismatch.
pub fn discover_unknowns(
    equations: &[Equation],
    constants: &HashMap<String, f64>,
) -> Vec<String> {
    // the pattern cannot fail to compile; identifiers are maximal-munch so
    // no \b anchors are needed
    let ident = Regex::new(r"[a-zA-Z_][a-zA-Z0-9_]*").unwrap();
    let mut seen: HashSet<String> = HashSet::new();
    let mut unknowns = Vec::new();
    for equation in equations {
        for m in ident.find_iter(&equation.text) {
            let name = m.as_str();
            if RESERVED_NAMES.contains(&name) || constants.contains_key(name) {
                continue;
            }
            if equation.text[m.end()..].trim_start().starts_with('(') {
                continue;
            }
            if seen.insert(name.to_string()) {
                unknowns.push(name.to_string());
            }
        }
    }
    unknowns
}

/// A compiled square system F(x) = 0 with its jacobian.
pub struct SymbolicSystem {
    /// Unknown names in first-seen source order; fixes the meaning of every
    /// vector/matrix index below.
    pub unknowns: Vec<String>,
    /// Residual expressions lhs - rhs, constants substituted, same order as
    /// the input equations.
    pub residual_exprs: Vec<Expr>,
    /// Symbolic jacobian, residual-major: `jacobian_exprs[i][j]` is
    /// d residual_i / d unknown_j.
    pub jacobian_exprs: Vec<Vec<Expr>>,
    residual_funcs: Vec<Box<dyn Fn(&[f64]) -> f64 + Send + Sync>>,
    jacobian_funcs: Vec<Vec<Box<dyn Fn(&[f64]) -> f64 + Send + Sync>>>,
}

// the compiled closures are opaque; the symbolic side identifies the system
impl fmt::Debug for SymbolicSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolicSystem")
            .field("unknowns", &self.unknowns)
            .field("residual_exprs", &self.residual_exprs)
            .finish_non_exhaustive()
    }
}

impl SymbolicSystem {
    /// Builds the compiled system from normalized equations and resolved
    /// constants. Fails with `DimensionMismatch` for non-square systems and
    /// `ParseError` for equations outside the grammar.
    pub fn build(
        equations: &[Equation],
        constants: &HashMap<String, f64>,
    ) -> Result<SymbolicSystem, SolverError> {
        let unknowns = discover_unknowns(equations, constants);
        if equations.len() != unknowns.len() {
            return Err(SolverError::DimensionMismatch {
                equations: equations.len(),
                unknowns: unknowns.len(),
            });
        }

        let substitution = substitution_map(constants);
        let mut residual_exprs = Vec::with_capacity(equations.len());
        for equation in equations {
            let residual = residual_expr(equation, &substitution)?;
            // a leftover variable here means a reserved name was used as an
            // operand without being callable, e.g. "sqrt = 2"
            for var in residual.all_arguments_are_variables() {
                if !unknowns.contains(&var) {
                    return Err(SolverError::ParseError {
                        equation: equation.text.clone(),
                        message: format!("reserved name '{}' used as a variable", var),
                    });
                }
            }
            residual_exprs.push(residual);
        }

        let var_refs: Vec<&str> = unknowns.iter().map(|s| s.as_str()).collect();
        let jacobian_exprs: Vec<Vec<Expr>> = residual_exprs
            .iter()
            .map(|residual| {
                var_refs
                    .iter()
                    .map(|var| residual.diff(var).simplify())
                    .collect()
            })
            .collect();

        let residual_funcs = residual_exprs
            .iter()
            .map(|expr| expr.lambdify(&var_refs))
            .collect();
        let jacobian_funcs = jacobian_exprs
            .iter()
            .map(|row| row.iter().map(|expr| expr.lambdify(&var_refs)).collect())
            .collect();

        Ok(SymbolicSystem {
            unknowns,
            residual_exprs,
            jacobian_exprs,
            residual_funcs,
            jacobian_funcs,
        })
    }

    pub fn len(&self) -> usize {
        self.unknowns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unknowns.is_empty()
    }

    /// Evaluates F(x) into a DVector, unknown-ordered.
    pub fn evaluate_residuals(&self, x: &DVector<f64>) -> DVector<f64> {
        let args = x.as_slice();
        DVector::from_iterator(
            self.residual_funcs.len(),
            self.residual_funcs.iter().map(|f| f(args)),
        )
    }

    /// Evaluates J(x) into a DMatrix, residual-major rows.
    pub fn evaluate_jacobian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let args = x.as_slice();
        let rows = self.jacobian_funcs.len();
        let cols = self.unknowns.len();
        DMatrix::from_fn(rows, cols, |i, j| self.jacobian_funcs[i][j](args))
    }
}

/// Constant substitution map for equation residuals: `pi` plus the resolved
/// constants, user definitions winning over the built-in.
pub fn substitution_map(constants: &HashMap<String, f64>) -> HashMap<String, f64> {
    let mut map = HashMap::new();
    map.insert("pi".to_string(), PI);
    for (name, value) in constants {
        map.insert(name.clone(), *value);
    }
    map
}

fn residual_expr(
    equation: &Equation,
    substitution: &HashMap<String, f64>,
) -> Result<Expr, SolverError> {
    let parse = |side: &str| {
        parse_expression(side).map_err(|message| SolverError::ParseError {
            equation: equation.text.clone(),
            message,
        })
    };
    let lhs = parse(&equation.lhs)?;
    let residual = match &equation.rhs {
        Some(rhs) if !rhs.is_empty() => lhs - parse(rhs)?,
        _ => lhs,
    };
    Ok(residual.set_variable_from_map(substitution).simplify())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::normalizer::normalize_equations;
    use approx::assert_relative_eq;

    fn equations(lines: &[&str]) -> Vec<Equation> {
        normalize_equations(&lines.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn test_discover_unknowns_first_seen_order() {
        let eqs = equations(&["y + x = 3", "x - z = 1"]);
        let unknowns = discover_unknowns(&eqs, &HashMap::new());
        assert_eq!(unknowns, vec!["y", "x", "z"]);
    }

    #[test]
    fn test_discover_unknowns_excludes_reserved_and_constants() {
        let mut constants = HashMap::new();
        constants.insert("k".to_string(), 2.0);
        let eqs = equations(&["sin(x) + k * y = pi", "sqrt(x) - y = 0"]);
        let unknowns = discover_unknowns(&eqs, &constants);
        assert_eq!(unknowns, vec!["x", "y"]);
    }

    #[test]
    fn test_call_position_names_are_not_unknowns() {
        let eqs = equations(&["foo(x) = 3"]);
        let unknowns = discover_unknowns(&eqs, &HashMap::new());
        assert_eq!(unknowns, vec!["x"]);
    }

    #[test]
    fn test_tg_alias_builds_square_system() {
        let eqs = equations(&["tg(x) = 0.5"]);
        let system = SymbolicSystem::build(&eqs, &HashMap::new()).unwrap();
        assert_eq!(system.unknowns, vec!["x"]);
    }

    #[test]
    fn test_system_debug_shows_symbolic_side() {
        let eqs = equations(&["x - 1 = 0"]);
        let system = SymbolicSystem::build(&eqs, &HashMap::new()).unwrap();
        let repr = format!("{:?}", system);
        assert!(repr.contains("unknowns"));
        assert!(repr.contains("\"x\""));
    }

    #[test]
    fn test_e_is_a_legal_unknown() {
        let eqs = equations(&["e - 5 = 0"]);
        let unknowns = discover_unknowns(&eqs, &HashMap::new());
        assert_eq!(unknowns, vec!["e"]);
    }

    #[test]
    fn test_dimension_mismatch_fails_fast() {
        let eqs = equations(&["x + y = 3"]);
        let err = SymbolicSystem::build(&eqs, &HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            SolverError::DimensionMismatch {
                equations: 1,
                unknowns: 2
            }
        );
    }

    #[test]
    fn test_residual_evaluation() {
        let eqs = equations(&["x + y = 3", "x - y = 1"]);
        let system = SymbolicSystem::build(&eqs, &HashMap::new()).unwrap();
        let x = DVector::from_vec(vec![2.0, 1.0]);
        let f = system.evaluate_residuals(&x);
        assert_relative_eq!(f[0], 0.0);
        assert_relative_eq!(f[1], 0.0);
    }

    #[test]
    fn test_jacobian_evaluation() {
        let eqs = equations(&["x^2 + y^2 = 10", "x - y = 4"]);
        let system = SymbolicSystem::build(&eqs, &HashMap::new()).unwrap();
        let x = DVector::from_vec(vec![3.0, 1.0]);
        let j = system.evaluate_jacobian(&x);
        assert_relative_eq!(j[(0, 0)], 6.0);
        assert_relative_eq!(j[(0, 1)], 2.0);
        assert_relative_eq!(j[(1, 0)], 1.0);
        assert_relative_eq!(j[(1, 1)], -1.0);
    }

    #[test]
    fn test_constants_substituted_as_literals() {
        let mut constants = HashMap::new();
        constants.insert("k".to_string(), 4.0);
        let eqs = equations(&["k * x = 8"]);
        let system = SymbolicSystem::build(&eqs, &constants).unwrap();
        assert_eq!(system.unknowns, vec!["x"]);
        let f = system.evaluate_residuals(&DVector::from_vec(vec![2.0]));
        assert_relative_eq!(f[0], 0.0);
    }

    #[test]
    fn test_pi_substituted_in_equations() {
        let eqs = equations(&["x - pi = 0"]);
        let system = SymbolicSystem::build(&eqs, &HashMap::new()).unwrap();
        let f = system.evaluate_residuals(&DVector::from_vec(vec![PI]));
        assert_relative_eq!(f[0], 0.0);
    }

    #[test]
    fn test_malformed_equation_is_parse_error() {
        let eqs = equations(&["x + = 3"]);
        let err = SymbolicSystem::build(&eqs, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), "ParseError");
    }

    #[test]
    fn test_unknown_function_is_parse_error() {
        let eqs = equations(&["foo(x) = 3"]);
        let err = SymbolicSystem::build(&eqs, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), "ParseError");
        assert!(err.to_string().contains("unknown function"));
    }

    #[test]
    fn test_reserved_name_as_variable_rejected() {
        let eqs = equations(&["sqrt + x = 2"]);
        let err = SymbolicSystem::build(&eqs, &HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), "ParseError");
    }
}
