//! # Symbolic Engine Module
//!
//! Minimal symbolic expression tree used to describe product terms. A term built on an
//! `Expr` can answer the two questions the factorization engine asks of it:
//! - does the value depend on variable `x`? (`contains_variable`)
//! - what is its analytic integral over `x`? (see `symbolic_integration`)
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - symbolic variables like "x", "y"
//! - **Constants**: `Const(f64)` - numerical constants
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `Abs`, `sin`, `cos`
//!
//! ### Key Methods
//! - `Symbols(symbols: &str)` - Create multiple variables from comma-separated string
//! - `extract_variables()` - ordered list of variable names in the expression
//! - `substitute_variable()` / `set_variable()` - substitution
//! - `eval_map()` - numerical evaluation against a map of variable values
//! - `simplify()` - constant folding and identity removal

#![allow(non_camel_case_types)]

use std::collections::HashMap;
use std::f64;
use std::fmt;

/// Core symbolic expression enum representing mathematical expressions as an abstract syntax tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedProduct::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "y", "mass")
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
    /// Absolute value: |x|
    Abs(Box<Expr>),
    /// Sine function: sin(x)
    sin(Box<Expr>),
    /// Cosine function: cos(x)
    cos(Box<Expr>),
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
            Expr::Abs(expr) => write!(f, "abs({})", expr),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
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
    /// Creates multiple symbolic variables from a comma-separated string.
    /// Whitespace is trimmed and empty tokens are skipped.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let vars = Expr::Symbols("x, y, z");
    /// assert_eq!(vars.len(), 3);
    /// ```
    pub fn Symbols(symbols: &str) -> Vec<Expr> {
        symbols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Expr::Var(s.to_string()))
            .collect()
    }

    /// Wraps the expression in a Box for recursive variants.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// e^(self)
    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    /// ln(self)
    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    /// |self|
    pub fn abs(self) -> Expr {
        Expr::Abs(self.boxed())
    }

    /// self^rhs
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// true if expression is Const(0.0)
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    /// true if expression is Const(1.0)
    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
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
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::Abs(expr)
            | Expr::sin(expr)
            | Expr::cos(expr) => {
                expr.contains_variable(var_name)
            }
        }
    }

    /// Returns the names of all variables in order of first appearance, without duplicates.
    pub fn extract_variables(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables(&self, found: &mut Vec<String>) {
        match self {
            Expr::Var(name) => {
                if !found.contains(name) {
                    found.push(name.clone());
                }
            }
            Expr::Const(_) => {}
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right) => {
                left.collect_variables(found);
                right.collect_variables(found);
            }
            Expr::Exp(expr)
            | Expr::Ln(expr)
            | Expr::Abs(expr)
            | Expr::sin(expr)
            | Expr::cos(expr) => {
                expr.collect_variables(found)
            }
        }
    }

    /// Applies `f` to every direct child, rebuilding the same node kind.
    fn map_children(&self, f: &impl Fn(&Expr) -> Expr) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Sub(lhs, rhs) => Expr::Sub(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Mul(lhs, rhs) => Expr::Mul(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Div(lhs, rhs) => Expr::Div(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Pow(base, exp) => Expr::Pow(f(base).boxed(), f(exp).boxed()),
            Expr::Exp(expr) => Expr::Exp(f(expr).boxed()),
            Expr::Ln(expr) => Expr::Ln(f(expr).boxed()),
            Expr::Abs(expr) => Expr::Abs(f(expr).boxed()),
            Expr::sin(expr) => Expr::sin(f(expr).boxed()),
            Expr::cos(expr) => Expr::cos(f(expr).boxed()),
        }
    }

    /// substitute a variable with an expression
    pub fn substitute_variable(&self, var: &str, replacement: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => replacement.clone(),
            _ => self.map_children(&|child| child.substitute_variable(var, replacement)),
        }
    }

    /// Substitutes a variable with a constant value throughout the expression.
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        self.substitute_variable(var, &Expr::Const(value))
    }

    /// Evaluates the expression. Every variable must be present in `values`.
    pub fn eval_map(&self, values: &HashMap<String, f64>) -> Result<f64, String> {
        let res = match self {
            Expr::Var(name) => match values.get(name) {
                Some(val) => *val,
                None => return Err(format!("no value for variable {}", name)),
            },
            Expr::Const(val) => *val,
            Expr::Add(lhs, rhs) => lhs.eval_map(values)? + rhs.eval_map(values)?,
            Expr::Sub(lhs, rhs) => lhs.eval_map(values)? - rhs.eval_map(values)?,
            Expr::Mul(lhs, rhs) => lhs.eval_map(values)? * rhs.eval_map(values)?,
            Expr::Div(lhs, rhs) => lhs.eval_map(values)? / rhs.eval_map(values)?,
            Expr::Pow(base, exp) => base.eval_map(values)?.powf(exp.eval_map(values)?),
            Expr::Exp(expr) => expr.eval_map(values)?.exp(),
            Expr::Ln(expr) => expr.eval_map(values)?.ln(),
            Expr::Abs(expr) => expr.eval_map(values)?.abs(),
            Expr::sin(expr) => expr.eval_map(values)?.sin(),
            Expr::cos(expr) => expr.eval_map(values)?.cos(),
        };
        Ok(res)
    }

    /// Folds constant subexpressions and removes the trivial identities
    /// x+0, x-0, x*1, x*0, x/1, x^1, x^0.
    pub fn simplify(&self) -> Expr {
        let expr = self.map_children(&|child| child.simplify());
        match expr {
            Expr::Add(lhs, rhs) => match (*lhs, *rhs) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a + b),
                (l, r) if l.is_zero() => r,
                (l, r) if r.is_zero() => l,
                (l, r) => l + r,
            },
            Expr::Sub(lhs, rhs) => match (*lhs, *rhs) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a - b),
                (l, r) if r.is_zero() => l,
                (l, r) if l == r => Expr::Const(0.0),
                (l, r) => l - r,
            },
            Expr::Mul(lhs, rhs) => match (*lhs, *rhs) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a * b),
                (l, r) if l.is_zero() || r.is_zero() => Expr::Const(0.0),
                (l, r) if l.is_one() => r,
                (l, r) if r.is_one() => l,
                (l, r) => l * r,
            },
            Expr::Div(lhs, rhs) => match (*lhs, *rhs) {
                (Expr::Const(a), Expr::Const(b)) if b != 0.0 => Expr::Const(a / b),
                (l, r) if l.is_zero() && !r.is_zero() => Expr::Const(0.0),
                (l, r) if r.is_one() => l,
                (l, r) => l / r,
            },
            Expr::Pow(base, exp) => match (*base, *exp) {
                (Expr::Const(a), Expr::Const(b)) => Expr::Const(a.powf(b)),
                (_, e) if e.is_zero() => Expr::Const(1.0),
                (b, e) if e.is_one() => b,
                (b, e) => b.pow(e),
            },
            Expr::Exp(inner) => match *inner {
                Expr::Const(a) => Expr::Const(a.exp()),
                other => other.exp(),
            },
            Expr::Ln(inner) => match *inner {
                Expr::Const(a) if a > 0.0 => Expr::Const(a.ln()),
                other => other.ln(),
            },
            Expr::Abs(inner) => match *inner {
                Expr::Const(a) => Expr::Const(a.abs()),
                other => other.abs(),
            },
            Expr::sin(inner) => match *inner {
                Expr::Const(a) => Expr::Const(a.sin()),
                other => Expr::sin(other.boxed()),
            },
            Expr::cos(inner) => match *inner {
                Expr::Const(a) => Expr::Const(a.cos()),
                other => Expr::cos(other.boxed()),
            },
            other => other,
        }
    }
}

//___________________________________MACROS____________________________________

/// Macro to create symbolic variables from a comma-separated list
/// Usage: symbols!(x, y, z) -> creates variables x, y, z
#[macro_export]
macro_rules! symbols {
    ($($var:ident),+ $(,)?) => {
        {
            let var_names = stringify!($($var),+);
            let vars = $crate::symbolic::symbolic_engine::Expr::Symbols(var_names);
            let mut iter = vars.into_iter();
            ($(
                {
                    let $var = iter.next().unwrap();
                    $var
                }
            ),+)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_symbols_skips_empty_tokens() {
        let vars = Expr::Symbols("x, ,y,");
        assert_eq!(
            vars,
            vec![Expr::Var("x".to_string()), Expr::Var("y".to_string())]
        );
    }

    #[test]
    fn test_extract_variables_keeps_first_appearance_order() {
        let (x, y) = symbols!(x, y);
        let expr = y.clone() * x.clone().exp() + y.pow(Expr::Const(2.0)) - x;
        assert_eq!(expr.extract_variables(), vec!["y".to_string(), "x".to_string()]);
    }

    #[test]
    fn test_contains_variable() {
        let (x, y) = symbols!(x, y);
        let expr = Expr::sin(Box::new(x * Expr::Const(2.0))) + Expr::Const(1.0);
        assert!(expr.contains_variable("x"));
        assert!(!expr.contains_variable("y"));
        assert!(y.contains_variable("y"));
    }

    #[test]
    fn test_eval_map() {
        let (x, y) = symbols!(x, y);
        let expr = x.clone() * y.clone() + x.pow(Expr::Const(2.0)) / y;
        let values = HashMap::from([("x".to_string(), 2.0), ("y".to_string(), 4.0)]);
        assert_relative_eq!(expr.eval_map(&values).unwrap(), 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eval_map_missing_variable() {
        let expr = Expr::Var("z".to_string()) + Expr::Const(1.0);
        let err = expr.eval_map(&HashMap::new()).unwrap_err();
        assert!(err.contains("z"));
    }

    #[test]
    fn test_substitute_and_set_variable() {
        let (x, y) = symbols!(x, y);
        let expr = x.clone() * y.clone();
        let substituted = expr.substitute_variable("x", &(y.clone() + Expr::Const(1.0)));
        assert_eq!(substituted, (y.clone() + Expr::Const(1.0)) * y.clone());
        assert_eq!(expr.set_variable("y", 3.0), x * Expr::Const(3.0));
    }

    #[test]
    fn test_simplify() {
        let x = Expr::Var("x".to_string());
        let expr = (x.clone() * Expr::Const(1.0) + Expr::Const(0.0))
            * (Expr::Const(2.0) + Expr::Const(3.0));
        assert_eq!(expr.simplify(), x.clone() * Expr::Const(5.0));
        assert_eq!((x.clone() - x.clone()).simplify(), Expr::Const(0.0));
        assert_eq!(x.clone().pow(Expr::Const(0.0)).simplify(), Expr::Const(1.0));
    }

    #[test]
    fn test_abs() {
        let x = Expr::Var("x".to_string());
        let expr = (x.clone() - Expr::Const(5.0)).abs();
        let values = HashMap::from([("x".to_string(), 1.0)]);
        assert_relative_eq!(expr.eval_map(&values).unwrap(), 4.0);
        assert!(expr.contains_variable("x"));
        assert_eq!(format!("{}", expr), "abs((x - 5))");
        assert_eq!(Expr::Const(-2.0).abs().simplify(), Expr::Const(2.0));
        assert_eq!(
            expr.set_variable("x", 3.0).simplify(),
            Expr::Const(2.0)
        );
    }
}
