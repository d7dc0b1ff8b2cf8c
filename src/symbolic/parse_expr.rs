//! Recursive-descent parser turning a string expression into a symbolic
//! expression. The accepted grammar is deliberately small:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('+' | '-') unary | power
//! power  := atom ('^' unary)?          (right associative)
//! atom   := number | ident | ident '(' expr ')' | '(' expr ')'
//! ```
//!
//! Only whitelisted function names may be called: `sin`, `cos`, `tan`/`tg`,
//! `sqrt`, `log`/`ln`, `exp`. `sqrt(x)` lowers to `x^0.5`, `log`/`ln` both
//! mean the natural logarithm. Every other identifier parses to `Expr::Var`
//! and is resolved later (constant, `pi`/`e`, or unknown). A call to any
//! other name is an error, so expression text can never execute anything
//! beyond this arithmetic.

use crate::symbolic::symbolic_engine::Expr;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent part: digits followed by e/E, optional sign, digits
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number literal '{}'", text))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_rparen(&mut self) -> Result<(), String> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            _ => Err("missing closing bracket".to_string()),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::Add(lhs.boxed(), rhs.boxed());
                }
                Some(Token::Minus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::Sub(lhs.boxed(), rhs.boxed());
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Mul(lhs.boxed(), rhs.boxed());
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Div(lhs.boxed(), rhs.boxed());
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            Some(Token::Minus) => {
                self.advance();
                let inner = self.parse_unary()?;
                // fold the sign into literals so "-2" stays a single constant
                match inner {
                    Expr::Const(val) => Ok(Expr::Const(-val)),
                    other => Ok(Expr::Mul(
                        Expr::Const(-1.0).boxed(),
                        other.boxed(),
                    )),
                }
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, String> {
        let base = self.parse_atom()?;
        if let Some(Token::Caret) = self.peek() {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Pow(base.boxed(), exponent.boxed()));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::Num(value)) => Ok(Expr::Const(value)),
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.advance();
                    let inner = self.parse_expr()?;
                    self.expect_rparen()?;
                    Self::apply_function(&name, inner)
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(tok) => Err(format!("unexpected token {:?}", tok)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn apply_function(name: &str, inner: Expr) -> Result<Expr, String> {
        match name {
            "sin" => Ok(Expr::sin(inner.boxed())),
            "cos" => Ok(Expr::cos(inner.boxed())),
            "tan" | "tg" => Ok(Expr::tg(inner.boxed())),
            "sqrt" => Ok(Expr::Pow(inner.boxed(), Expr::Const(0.5).boxed())),
            "log" | "ln" => Ok(Expr::Ln(inner.boxed())),
            "exp" => Ok(Expr::Exp(inner.boxed())),
            other => Err(format!("unknown function '{}'", other)),
        }
    }
}

/// Parses a mathematical expression from string representation.
///
/// Returns the symbolic expression tree or a message describing the first
/// syntax error. Trailing input after a complete expression is an error
/// ("x 5" or "x) + y" do not silently parse a prefix).
pub fn parse_expression(input: &str) -> Result<Expr, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty expression".to_string());
    }
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!(
            "unexpected trailing input near token {:?}",
            parser.tokens[parser.pos]
        ));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_constant() {
        let expr = parse_expression("42").unwrap();
        assert_eq!(expr, Expr::Const(42.0));
    }

    #[test]
    fn test_parse_variable() {
        let expr = parse_expression("x").unwrap();
        assert_eq!(expr, Expr::Var("x".to_string()));
    }

    #[test]
    fn test_parse_scientific_notation() {
        let expr = parse_expression("1.5e-3").unwrap();
        assert_eq!(expr, Expr::Const(1.5e-3));
    }

    #[test]
    fn test_parse_addition() {
        let expr = parse_expression("x + 2").unwrap();
        assert_eq!(
            expr,
            Expr::Add(
                Box::new(Expr::Var("x".to_string())),
                Box::new(Expr::Const(2.0))
            )
        );
    }

    #[test]
    fn test_parse_precedence() {
        // 1 + 2 * x parses as 1 + (2 * x)
        let expr = parse_expression("1 + 2 * x").unwrap();
        assert_eq!(
            expr,
            Expr::Add(
                Box::new(Expr::Const(1.0)),
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(2.0)),
                    Box::new(Expr::Var("x".to_string()))
                ))
            )
        );
    }

    #[test]
    fn test_parse_power() {
        let expr = parse_expression("x^2").unwrap();
        assert_eq!(
            expr,
            Expr::Pow(
                Box::new(Expr::Var("x".to_string())),
                Box::new(Expr::Const(2.0))
            )
        );
    }

    #[test]
    fn test_parse_power_right_associative() {
        let expr = parse_expression("x^2^3").unwrap();
        assert_eq!(
            expr,
            Expr::Pow(
                Box::new(Expr::Var("x".to_string())),
                Box::new(Expr::Pow(
                    Box::new(Expr::Const(2.0)),
                    Box::new(Expr::Const(3.0))
                ))
            )
        );
    }

    #[test]
    fn test_parse_unary_minus() {
        let expr = parse_expression("-x + 2").unwrap();
        assert_eq!(
            expr,
            Expr::Add(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(Expr::Var("x".to_string()))
                )),
                Box::new(Expr::Const(2.0))
            )
        );
    }

    #[test]
    fn test_parse_negative_literal() {
        let expr = parse_expression("-2.5").unwrap();
        assert_eq!(expr, Expr::Const(-2.5));
    }

    #[test]
    fn test_parse_brackets() {
        let expr = parse_expression("(x + y) * z").unwrap();
        assert_eq!(
            expr,
            Expr::Mul(
                Box::new(Expr::Add(
                    Box::new(Expr::Var("x".to_string())),
                    Box::new(Expr::Var("y".to_string()))
                )),
                Box::new(Expr::Var("z".to_string()))
            )
        );
    }

    #[test]
    fn test_parse_functions() {
        assert_eq!(
            parse_expression("sin(x)").unwrap(),
            Expr::sin(Box::new(Expr::Var("x".to_string())))
        );
        assert_eq!(
            parse_expression("tan(x)").unwrap(),
            Expr::tg(Box::new(Expr::Var("x".to_string())))
        );
        assert_eq!(
            parse_expression("ln(x)").unwrap(),
            Expr::Ln(Box::new(Expr::Var("x".to_string())))
        );
        assert_eq!(
            parse_expression("log(x)").unwrap(),
            Expr::Ln(Box::new(Expr::Var("x".to_string())))
        );
    }

    #[test]
    fn test_parse_sqrt_lowers_to_pow() {
        let expr = parse_expression("sqrt(x)").unwrap();
        assert_eq!(
            expr,
            Expr::Pow(
                Box::new(Expr::Var("x".to_string())),
                Box::new(Expr::Const(0.5))
            )
        );
    }

    #[test]
    fn test_parse_nested_functions() {
        let expr = parse_expression("sin(cos(x))").unwrap();
        assert_eq!(
            expr,
            Expr::sin(Box::new(Expr::cos(Box::new(Expr::Var("x".to_string())))))
        );
    }

    #[test]
    fn test_parse_complex_expression() {
        let expr = parse_expression("(x + y) * (z - 2) / exp(w)").unwrap();
        let x = Box::new(Expr::Var("x".to_string()));
        let y = Box::new(Expr::Var("y".to_string()));
        let z = Box::new(Expr::Var("z".to_string()));
        let w = Box::new(Expr::Var("w".to_string()));
        let x_plus_y = Box::new(Expr::Add(x, y));
        let z_minus_two = Box::new(Expr::Sub(z, Box::new(Expr::Const(2.0))));
        let e = Box::new(Expr::Exp(w));
        let expected = Expr::Div(Box::new(Expr::Mul(x_plus_y, z_minus_two)), e);
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_unknown_function_rejected() {
        let result = parse_expression("system(x)");
        assert!(result.unwrap_err().contains("unknown function"));
    }

    #[test]
    fn test_unmatched_brackets() {
        assert!(parse_expression("(x + y").is_err());
        assert!(parse_expression("x + y)").is_err());
    }

    #[test]
    fn test_incomplete_expression() {
        assert!(parse_expression("x +").is_err());
        assert!(parse_expression("").is_err());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse_expression("x 5").is_err());
    }

    #[test]
    fn test_disallowed_characters_rejected() {
        assert!(parse_expression("x; y").is_err());
        assert!(parse_expression("__import__('os')").is_err());
    }
}
