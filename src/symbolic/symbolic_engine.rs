//! # Symbolic Engine Module
//!
//! Core symbolic expression type for the equation solver. Equation and
//! constant text is parsed into `Expr` trees which can then be substituted,
//! differentiated analytically and converted into executable Rust closures.
//!
//! The variant set is deliberately restricted to the grammar the solver
//! accepts: literals, the four arithmetic binary operators, powers, and the
//! whitelisted functions (`exp`, `ln`, `sin`, `cos`, `tg`). `sqrt(x)` is
//! represented as `x^0.5` and `tan` is an alias of `tg`; anything else is
//! rejected at parse time, so no other node kind can reach evaluation.

#![allow(non_camel_case_types)]

use std::collections::HashMap;
use std::fmt;

/// Symbolic expression as an abstract syntax tree. Uses Box<Expr> for
/// recursive structures, allowing arbitrarily deep expression trees.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "pressure")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Sine function: sin(x)
    sin(Box<Expr>),
    /// Cosine function: cos(x)
    cos(Box<Expr>),
    /// Tangent function, mathematical notation 'tg'
    tg(Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "ln({})", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::tg(expr) => write!(f, "tg({})", expr),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl Expr {
    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Creates power expression self^rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// Checks if expression is exactly zero (constant 0.0).
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    /// Substitutes multiple variables with constant values using a HashMap.
    ///
    /// Only variables present in the map are substituted; the rest of the
    /// tree is cloned unchanged. Used to bake resolved constants (and `pi`)
    /// into equation residuals as literals.
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) if var_map.contains_key(name) => Expr::Const(var_map[name]),
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.set_variable_from_map(var_map)),
                Box::new(rhs.set_variable_from_map(var_map)),
            ),
            Expr::Pow(base, exp) => Expr::Pow(
                Box::new(base.set_variable_from_map(var_map)),
                Box::new(exp.set_variable_from_map(var_map)),
            ),
            Expr::Exp(expr) => Expr::Exp(Box::new(expr.set_variable_from_map(var_map))),
            Expr::Ln(expr) => Expr::Ln(Box::new(expr.set_variable_from_map(var_map))),
            Expr::sin(expr) => Expr::sin(Box::new(expr.set_variable_from_map(var_map))),
            Expr::cos(expr) => Expr::cos(Box::new(expr.set_variable_from_map(var_map))),
            Expr::tg(expr) => Expr::tg(Box::new(expr.set_variable_from_map(var_map))),
            _ => self.clone(),
        }
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right) => {
                left.contains_variable(var_name) || right.contains_variable(var_name)
            }
            Expr::Exp(expr) | Expr::Ln(expr) | Expr::sin(expr) | Expr::cos(expr)
            | Expr::tg(expr) => expr.contains_variable(var_name),
        }
    }

    /// Algebraic simplification: collapses constant subtrees and applies the
    /// usual identities (x + 0, x * 1, 0 * x, x^1, x^0) recursively. Keeps
    /// jacobian elements produced by `diff` compact.
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Add(lhs, rhs) => {
                let (l, r) = (lhs.simplify(), rhs.simplify());
                match (&l, &r) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b),
                    _ if l.is_zero() => r,
                    _ if r.is_zero() => l,
                    _ => Expr::Add(l.boxed(), r.boxed()),
                }
            }
            Expr::Sub(lhs, rhs) => {
                let (l, r) = (lhs.simplify(), rhs.simplify());
                match (&l, &r) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a - b),
                    _ if r.is_zero() => l,
                    _ => Expr::Sub(l.boxed(), r.boxed()),
                }
            }
            Expr::Mul(lhs, rhs) => {
                let (l, r) = (lhs.simplify(), rhs.simplify());
                match (&l, &r) {
                    (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b),
                    _ if l.is_zero() || r.is_zero() => Expr::Const(0.0),
                    (Expr::Const(a), _) if *a == 1.0 => r,
                    (_, Expr::Const(b)) if *b == 1.0 => l,
                    _ => Expr::Mul(l.boxed(), r.boxed()),
                }
            }
            Expr::Div(lhs, rhs) => {
                let (l, r) = (lhs.simplify(), rhs.simplify());
                match (&l, &r) {
                    (Expr::Const(a), Expr::Const(b)) if *b != 0.0 => Expr::Const(a / b),
                    _ if l.is_zero() && !r.is_zero() => Expr::Const(0.0),
                    (_, Expr::Const(b)) if *b == 1.0 => l,
                    _ => Expr::Div(l.boxed(), r.boxed()),
                }
            }
            Expr::Pow(base, exp) => {
                let (b, e) = (base.simplify(), exp.simplify());
                match (&b, &e) {
                    (Expr::Const(a), Expr::Const(n)) => Expr::Const(a.powf(*n)),
                    (_, Expr::Const(n)) if *n == 1.0 => b,
                    (_, Expr::Const(n)) if *n == 0.0 => Expr::Const(1.0),
                    _ => Expr::Pow(b.boxed(), e.boxed()),
                }
            }
            Expr::Exp(expr) => Expr::Exp(expr.simplify().boxed()),
            Expr::Ln(expr) => Expr::Ln(expr.simplify().boxed()),
            Expr::sin(expr) => Expr::sin(expr.simplify().boxed()),
            Expr::cos(expr) => Expr::cos(expr.simplify().boxed()),
            Expr::tg(expr) => Expr::tg(expr.simplify().boxed()),
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let expr = Expr::Var("x".to_string()) + Expr::Const(2.0);
        assert_eq!(expr.to_string(), "(x + 2)");
    }

    #[test]
    fn test_operator_overloads() {
        let x = Expr::Var("x".to_string());
        let y = Expr::Var("y".to_string());
        let expr = x.clone() * y.clone() - x / y;
        assert_eq!(expr.to_string(), "((x * y) - (x / y))");
    }

    #[test]
    fn test_set_variable_from_map() {
        let mut map = HashMap::new();
        map.insert("k".to_string(), 3.0);
        let expr = Expr::Var("k".to_string()) * Expr::Var("x".to_string());
        let substituted = expr.set_variable_from_map(&map);
        assert_eq!(
            substituted,
            Expr::Const(3.0) * Expr::Var("x".to_string())
        );
    }

    #[test]
    fn test_simplify_identities() {
        let x = Expr::Var("x".to_string());
        let expr = (x.clone() + Expr::Const(0.0)) * Expr::Const(1.0);
        assert_eq!(expr.simplify(), x);
    }

    #[test]
    fn test_simplify_constant_folding() {
        let expr = Expr::Const(2.0) * Expr::Const(3.0) + Expr::Const(1.0);
        assert_eq!(expr.simplify(), Expr::Const(7.0));
    }

    #[test]
    fn test_simplify_pow() {
        let x = Expr::Var("x".to_string());
        assert_eq!(x.clone().pow(Expr::Const(1.0)).simplify(), x.clone());
        assert_eq!(x.pow(Expr::Const(0.0)).simplify(), Expr::Const(1.0));
    }

    #[test]
    fn test_contains_variable() {
        let expr = Expr::sin(Expr::Var("x".to_string()).boxed()) + Expr::Const(1.0);
        assert!(expr.contains_variable("x"));
        assert!(!expr.contains_variable("y"));
    }
}
