//! Sparse multivariate polynomials over named variables.
//!
//! Used as the fallback of symbolic integration: any expression built from
//! constants, variables, `+ - *`, division by constants and non-negative integer powers
//! is expanded into a polynomial, integrated monomial by monomial and turned back into
//! an `Expr`. This is what makes products like `x * (x * y)` integrable even though
//! neither factor is free of `x`.

use crate::symbolic::symbolic_engine::Expr;
use std::collections::{BTreeMap, HashMap};

/// variable name -> exponent, only positive exponents are stored
pub type Monomial = BTreeMap<String, u32>;

/// highest power expanded by `from_expr`
const MAX_EXPANDED_POWER: f64 = 64.0;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, f64>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(c: f64) -> Self {
        let mut poly = Self::zero();
        poly.add_term(Monomial::new(), c);
        poly
    }

    pub fn variable(name: &str) -> Self {
        let mut poly = Self::zero();
        poly.add_term(Monomial::from([(name.to_string(), 1)]), 1.0);
        poly
    }

    fn add_term(&mut self, monomial: Monomial, coeff: f64) {
        let entry = self.terms.entry(monomial).or_insert(0.0);
        *entry += coeff;
        self.terms.retain(|_, c| *c != 0.0);
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Some(c) if the polynomial has no variables
    pub fn as_constant(&self) -> Option<f64> {
        match self.terms.len() {
            0 => Some(0.0),
            1 => self.terms.get(&Monomial::new()).copied(),
            _ => None,
        }
    }

    /// highest exponent of `var` over all monomials
    pub fn degree_in(&self, var: &str) -> u32 {
        self.terms
            .keys()
            .map(|m| m.get(var).copied().unwrap_or(0))
            .max()
            .unwrap_or(0)
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let mut res = self.clone();
        for (m, c) in &other.terms {
            res.add_term(m.clone(), *c);
        }
        res
    }

    pub fn scale(&self, factor: f64) -> Polynomial {
        let mut res = Polynomial::zero();
        for (m, c) in &self.terms {
            res.add_term(m.clone(), c * factor);
        }
        res
    }

    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        let mut res = Polynomial::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &other.terms {
                let mut m = m1.clone();
                for (var, e) in m2 {
                    *m.entry(var.clone()).or_insert(0) += e;
                }
                res.add_term(m, c1 * c2);
            }
        }
        res
    }

    fn powi(&self, n: u32) -> Polynomial {
        (0..n).fold(Polynomial::constant(1.0), |acc, _| acc.mul(self))
    }

    /// Expands `expr` into a polynomial; None if it is not polynomial.
    /// Subexpressions without variables are evaluated to constants first.
    pub fn from_expr(expr: &Expr) -> Option<Polynomial> {
        if expr.extract_variables().is_empty() {
            return expr.eval_map(&HashMap::new()).ok().map(Polynomial::constant);
        }
        match expr {
            Expr::Var(name) => Some(Polynomial::variable(name)),
            Expr::Const(c) => Some(Polynomial::constant(*c)),
            Expr::Add(lhs, rhs) => Some(Self::from_expr(lhs)?.add(&Self::from_expr(rhs)?)),
            Expr::Sub(lhs, rhs) => {
                Some(Self::from_expr(lhs)?.add(&Self::from_expr(rhs)?.scale(-1.0)))
            }
            Expr::Mul(lhs, rhs) => Some(Self::from_expr(lhs)?.mul(&Self::from_expr(rhs)?)),
            Expr::Div(lhs, rhs) => {
                let denominator = Self::from_expr(rhs)?.as_constant()?;
                if denominator == 0.0 {
                    return None;
                }
                Some(Self::from_expr(lhs)?.scale(1.0 / denominator))
            }
            Expr::Pow(base, exp) => match exp.as_ref() {
                Expr::Const(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= MAX_EXPANDED_POWER => {
                    Some(Self::from_expr(base)?.powi(*n as u32))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Antiderivative with respect to `var` (no integration constant).
    pub fn integrate(&self, var: &str) -> Polynomial {
        let mut res = Polynomial::zero();
        for (m, c) in &self.terms {
            let mut m = m.clone();
            let e = m.entry(var.to_string()).or_insert(0);
            *e += 1;
            let new_exp = *e as f64;
            res.add_term(m, c / new_exp);
        }
        res
    }

    /// Partial derivative with respect to `var`.
    pub fn derivative(&self, var: &str) -> Polynomial {
        let mut res = Polynomial::zero();
        for (m, c) in &self.terms {
            let Some(&e) = m.get(var) else {
                continue;
            };
            let mut m = m.clone();
            if e == 1 {
                m.remove(var);
            } else {
                m.insert(var.to_string(), e - 1);
            }
            res.add_term(m, c * e as f64);
        }
        res
    }

    /// Collects the coefficient of `var^power` as a polynomial in the remaining variables.
    pub fn coefficient_of(&self, var: &str, power: u32) -> Polynomial {
        let mut res = Polynomial::zero();
        for (m, c) in &self.terms {
            if m.get(var).copied().unwrap_or(0) == power {
                let mut m = m.clone();
                m.remove(var);
                res.add_term(m, *c);
            }
        }
        res
    }

    pub fn to_expr(&self) -> Expr {
        let mut sum: Option<Expr> = None;
        for (m, c) in &self.terms {
            let mut term = Expr::Const(*c);
            for (var, e) in m {
                let factor = if *e == 1 {
                    Expr::Var(var.clone())
                } else {
                    Expr::Var(var.clone()).pow(Expr::Const(*e as f64))
                };
                term = term * factor;
            }
            sum = Some(match sum {
                Some(acc) => acc + term,
                None => term,
            });
        }
        sum.unwrap_or(Expr::Const(0.0)).simplify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols;
    use approx::assert_relative_eq;

    #[test]
    fn test_expand_product() {
        let (x, y) = symbols!(x, y);
        // (x + 1) * (x - 1) = x^2 - 1
        let expr = (x.clone() + Expr::Const(1.0)) * (x.clone() - Expr::Const(1.0));
        let poly = Polynomial::from_expr(&expr).unwrap();
        let expected = Polynomial::variable("x")
            .mul(&Polynomial::variable("x"))
            .add(&Polynomial::constant(-1.0));
        assert_eq!(poly, expected);
        assert_eq!(poly.degree_in("x"), 2);
        assert_eq!(poly.degree_in("y"), 0);
        assert!(Polynomial::from_expr(&(x * y.exp())).is_none());
    }

    #[test]
    fn test_constant_subexpressions_are_folded() {
        let x = Expr::Var("x".to_string());
        let expr = x * Expr::Const(0.0).exp() / Expr::Const(2.0);
        let poly = Polynomial::from_expr(&expr).unwrap();
        assert_eq!(poly, Polynomial::variable("x").scale(0.5));
    }

    #[test]
    fn test_integrate_and_derivative() {
        let (x, y) = symbols!(x, y);
        let expr = Expr::Const(3.0) * x.clone().pow(Expr::Const(2.0)) * y.clone();
        let poly = Polynomial::from_expr(&expr).unwrap();
        let integral = poly.integrate("x");
        // x^3 * y
        let values = HashMap::from([("x".to_string(), 2.0), ("y".to_string(), 5.0)]);
        assert_relative_eq!(integral.to_expr().eval_map(&values).unwrap(), 40.0, epsilon = 1e-12);
        assert_eq!(integral.derivative("x"), poly);
    }

    #[test]
    fn test_coefficient_of() {
        let (x, y) = symbols!(x, y);
        let expr = Expr::Const(2.0) * x.clone() * y.clone() + x + Expr::Const(4.0);
        let poly = Polynomial::from_expr(&expr).unwrap();
        let coeff = poly.coefficient_of("x", 1);
        assert_eq!(coeff, Polynomial::variable("y").scale(2.0).add(&Polynomial::constant(1.0)));
        assert_eq!(poly.coefficient_of("x", 0).as_constant(), Some(4.0));
    }

    #[test]
    fn test_zero_polynomial_to_expr() {
        let x = Expr::Var("x".to_string());
        let poly = Polynomial::from_expr(&(x.clone() - x)).unwrap();
        assert!(poly.is_zero());
        assert_eq!(poly.to_expr(), Expr::Const(0.0));
    }
}
