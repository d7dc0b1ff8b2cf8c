//! # Symbolic Engine Derivatives Module
//!
//! Extends `Expr` with analytic differentiation, variable listing and checked
//! evaluation against a name→value environment. Differentiation feeds the
//! jacobian construction; checked evaluation backs the constant-definition
//! evaluator, where domain failures (log of a negative number, division by
//! zero) must surface as errors instead of silent NaN.

use crate::symbolic::symbolic_engine::Expr;
use std::collections::HashMap;
use std::fmt;

/// Failure while evaluating an expression against an environment.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    /// The expression references a name the environment does not bind.
    Undefined(String),
    /// The expression is syntactically fine but hit a numeric domain error.
    Domain(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvalError::Undefined(name) => write!(f, "undefined name '{}'", name),
            EvalError::Domain(msg) => write!(f, "{}", msg),
        }
    }
}

impl Expr {
    /// Computes the analytical derivative of the expression with respect to a
    /// variable.
    ///
    /// Implements the standard rules: power rule, product rule, quotient
    /// rule, chain rule. For `f^g` with the variable in the exponent the
    /// general rule `f^g * (g' * ln(f) + g * f' / f)` is used.
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => Expr::Add(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Sub(lhs, rhs) => Expr::Sub(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Mul(lhs, rhs) => Expr::Add(
                Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.diff(var)))),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(Expr::Sub(
                    Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                    Box::new(Expr::Mul(Box::new(rhs.diff(var)), lhs.clone())),
                )),
                Box::new(Expr::Mul(rhs.clone(), rhs.clone())),
            ),
            Expr::Pow(base, exp) => {
                if exp.contains_variable(var) {
                    // d(f^g) = f^g * (g' * ln(f) + g * f' / f)
                    Expr::Mul(
                        Box::new(Expr::Pow(base.clone(), exp.clone())),
                        Box::new(Expr::Add(
                            Box::new(Expr::Mul(
                                Box::new(exp.diff(var)),
                                Box::new(Expr::Ln(base.clone())),
                            )),
                            Box::new(Expr::Div(
                                Box::new(Expr::Mul(exp.clone(), Box::new(base.diff(var)))),
                                base.clone(),
                            )),
                        )),
                    )
                } else {
                    Expr::Mul(
                        Box::new(Expr::Mul(
                            exp.clone(),
                            Box::new(Expr::Pow(
                                base.clone(),
                                Box::new(Expr::Sub(exp.clone(), Box::new(Expr::Const(1.0)))),
                            )),
                        )),
                        Box::new(base.diff(var)),
                    )
                }
            }
            Expr::Exp(expr) => {
                Expr::Mul(Box::new(Expr::Exp(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::Ln(expr) => Expr::Div(Box::new(expr.diff(var)), expr.clone()),
            Expr::sin(expr) => {
                Expr::Mul(Box::new(Expr::cos(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::cos(expr) => Expr::Mul(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(Expr::sin(expr.clone())),
                )),
                Box::new(expr.diff(var)),
            ),
            Expr::tg(expr) => Expr::Mul(
                Box::new(Expr::Div(
                    Box::new(Expr::Const(1.0)),
                    Box::new(Expr::Pow(
                        Box::new(Expr::cos(expr.clone())),
                        Box::new(Expr::Const(2.0)),
                    )),
                )),
                Box::new(expr.diff(var)),
            ),
        }
    }

    /// Extracts all unique variable names from the symbolic expression.
    ///
    /// Returns a sorted, deduplicated list. Note the solver's unknown
    /// ordering comes from the source-order scan in the model builder, not
    /// from this method.
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        match self {
            Expr::Var(name) => {
                vars.push(name.clone());
            }
            Expr::Const(_) => {}
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                vars.extend(lhs.all_arguments_are_variables());
                vars.extend(rhs.all_arguments_are_variables());
            }
            Expr::Exp(expr) | Expr::Ln(expr) | Expr::sin(expr) | Expr::cos(expr)
            | Expr::tg(expr) => {
                vars.extend(expr.all_arguments_are_variables());
            }
        }
        vars.sort();
        vars.dedup();
        vars
    }

    /// Evaluates the expression against a name→value environment, failing on
    /// unbound names and numeric domain errors.
    ///
    /// Domain checks mirror what a strict math library raises on: division
    /// by zero, logarithm of a non-positive value, and powers producing
    /// non-finite results from finite operands (e.g. `(-1)^0.5`).
    pub fn eval_checked(&self, env: &HashMap<String, f64>) -> Result<f64, EvalError> {
        match self {
            Expr::Var(name) => env
                .get(name)
                .copied()
                .ok_or_else(|| EvalError::Undefined(name.clone())),
            Expr::Const(val) => Ok(*val),
            Expr::Add(lhs, rhs) => Ok(lhs.eval_checked(env)? + rhs.eval_checked(env)?),
            Expr::Sub(lhs, rhs) => Ok(lhs.eval_checked(env)? - rhs.eval_checked(env)?),
            Expr::Mul(lhs, rhs) => Ok(lhs.eval_checked(env)? * rhs.eval_checked(env)?),
            Expr::Div(lhs, rhs) => {
                let denominator = rhs.eval_checked(env)?;
                if denominator == 0.0 {
                    return Err(EvalError::Domain("division by zero".to_string()));
                }
                Ok(lhs.eval_checked(env)? / denominator)
            }
            Expr::Pow(base, exp) => {
                let base_val = base.eval_checked(env)?;
                let exp_val = exp.eval_checked(env)?;
                let result = base_val.powf(exp_val);
                if result.is_nan() && !base_val.is_nan() && !exp_val.is_nan() {
                    return Err(EvalError::Domain(format!(
                        "invalid power: {}^{}",
                        base_val, exp_val
                    )));
                }
                Ok(result)
            }
            Expr::Exp(expr) => Ok(expr.eval_checked(env)?.exp()),
            Expr::Ln(expr) => {
                let arg = expr.eval_checked(env)?;
                if arg <= 0.0 {
                    return Err(EvalError::Domain(format!(
                        "logarithm of non-positive value {}",
                        arg
                    )));
                }
                Ok(arg.ln())
            }
            Expr::sin(expr) => Ok(expr.eval_checked(env)?.sin()),
            Expr::cos(expr) => Ok(expr.eval_checked(env)?.cos()),
            Expr::tg(expr) => Ok(expr.eval_checked(env)?.tan()),
        }
    }
}
