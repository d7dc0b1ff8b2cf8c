//! Lambdification: converting symbolic expressions to executable closures.
//!
//! The Newton loop evaluates residuals and jacobian elements many times, so
//! each expression is compiled once into a nested closure mirroring the
//! expression tree. Variables are resolved to slice positions at compile
//! time; evaluation itself never touches names.

use crate::symbolic::symbolic_engine::Expr;

impl Expr {
    /// Converts the expression into a closure over a variable-ordered slice.
    ///
    /// `vars` fixes the argument order: position `i` of the input slice is
    /// the value of `vars[i]`. Every variable occurring in the expression
    /// must be listed in `vars`; the model builder guarantees this after
    /// constant substitution.
    pub fn lambdify(&self, vars: &[&str]) -> Box<dyn Fn(&[f64]) -> f64 + Send + Sync> {
        match self {
            Expr::Var(name) => {
                let index = vars.iter().position(|&x| x == name).unwrap();
                Box::new(move |args| args[index])
            }
            Expr::Const(val) => {
                let val = *val;
                Box::new(move |_| val)
            }
            Expr::Add(lhs, rhs) => {
                let lf = lhs.lambdify(vars);
                let rf = rhs.lambdify(vars);
                Box::new(move |args| lf(args) + rf(args))
            }
            Expr::Sub(lhs, rhs) => {
                let lf = lhs.lambdify(vars);
                let rf = rhs.lambdify(vars);
                Box::new(move |args| lf(args) - rf(args))
            }
            Expr::Mul(lhs, rhs) => {
                let lf = lhs.lambdify(vars);
                let rf = rhs.lambdify(vars);
                Box::new(move |args| lf(args) * rf(args))
            }
            Expr::Div(lhs, rhs) => {
                let lf = lhs.lambdify(vars);
                let rf = rhs.lambdify(vars);
                Box::new(move |args| lf(args) / rf(args))
            }
            Expr::Pow(base, exp) => {
                let bf = base.lambdify(vars);
                let ef = exp.lambdify(vars);
                Box::new(move |args| bf(args).powf(ef(args)))
            }
            Expr::Exp(expr) => {
                let f = expr.lambdify(vars);
                Box::new(move |args| f(args).exp())
            }
            Expr::Ln(expr) => {
                let f = expr.lambdify(vars);
                Box::new(move |args| f(args).ln())
            }
            Expr::sin(expr) => {
                let f = expr.lambdify(vars);
                Box::new(move |args| f(args).sin())
            }
            Expr::cos(expr) => {
                let f = expr.lambdify(vars);
                Box::new(move |args| f(args).cos())
            }
            Expr::tg(expr) => {
                let f = expr.lambdify(vars);
                Box::new(move |args| f(args).tan())
            }
        }
    }
}
