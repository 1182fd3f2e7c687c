use crate::symbolic::polynomial::Polynomial;
use crate::symbolic::symbolic_engine::Expr;

impl Expr {
    /// SYMBOLIC INTEGRATION

    /// Main integration method - integrates with respect to a variable.
    /// Returns the indefinite integral (without constant of integration) or a
    /// description of the construct that could not be integrated.
    pub fn integrate(&self, var: &str) -> Result<Expr, String> {
        // ∫ c dx = c*x for anything free of x
        if !self.contains_variable(var) {
            return Ok(self.clone() * Expr::Var(var.to_string()));
        }
        let integrated = match self {
            // ∫ x dx = x²/2
            Expr::Var(_) => Ok(Expr::Var(var.to_string()).pow(Expr::Const(2.0)) / Expr::Const(2.0)),
            Expr::Const(c) => Ok(Expr::Const(*c) * Expr::Var(var.to_string())),
            // ∫ (f ± g) dx = ∫ f dx ± ∫ g dx
            Expr::Add(lhs, rhs) => Ok(lhs.integrate(var)? + rhs.integrate(var)?),
            Expr::Sub(lhs, rhs) => Ok(lhs.integrate(var)? - rhs.integrate(var)?),
            Expr::Mul(lhs, rhs) => self.integrate_multiplication(lhs, rhs, var),
            Expr::Div(lhs, rhs) => self.integrate_division(lhs, rhs, var),
            Expr::Pow(base, exp) => self.integrate_power(base, exp, var),
            Expr::Exp(inner) => {
                let a = linear_coefficient(inner, var)
                    .ok_or_else(|| format!("Cannot integrate exponential: e^({})", inner))?;
                Ok(self.clone() / a)
            }
            // ∫ ln(ax+b) dx = ((ax+b) ln(ax+b) - (ax+b)) / a
            Expr::Ln(inner) => {
                let a = linear_coefficient(inner, var)
                    .ok_or_else(|| format!("Cannot integrate logarithm: ln({})", inner))?;
                let u = inner.as_ref().clone();
                Ok((u.clone() * u.clone().ln() - u) / a)
            }
            Expr::Abs(inner) => Err(format!("Cannot integrate abs({})", inner)),
            Expr::sin(inner) => {
                let a = linear_coefficient(inner, var)
                    .ok_or_else(|| format!("Cannot integrate sin({})", inner))?;
                Ok(-Expr::cos(inner.clone()) / a)
            }
            Expr::cos(inner) => {
                let a = linear_coefficient(inner, var)
                    .ok_or_else(|| format!("Cannot integrate cos({})", inner))?;
                Ok(Expr::sin(inner.clone()) / a)
            }
        }?;
        Ok(integrated.simplify())
    }

    /// Product integration: constant factors first, then polynomial * exponential,
    /// then full polynomial expansion.
    fn integrate_multiplication(&self, lhs: &Expr, rhs: &Expr, var: &str) -> Result<Expr, String> {
        if !lhs.contains_variable(var) {
            return Ok(lhs.clone() * rhs.integrate(var)?);
        }
        if !rhs.contains_variable(var) {
            return Ok(lhs.integrate(var)? * rhs.clone());
        }
        if let Some(result) = integrate_polynomial_times_exponential(lhs, rhs, var) {
            return Ok(result);
        }
        if let Some(result) = integrate_polynomial_times_exponential(rhs, lhs, var) {
            return Ok(result);
        }
        self.integrate_as_polynomial(var)
            .ok_or_else(|| format!("Cannot integrate product: {} * {}", lhs, rhs))
    }

    fn integrate_division(&self, lhs: &Expr, rhs: &Expr, var: &str) -> Result<Expr, String> {
        // ∫ f(x)/c dx = (1/c) * ∫ f(x) dx
        if !rhs.contains_variable(var) {
            return Ok(lhs.integrate(var)? / rhs.clone());
        }
        // ∫ c/(ax+b) dx = c ln|ax+b| / a
        if !lhs.contains_variable(var) {
            if let Some(a) = linear_coefficient(rhs, var) {
                return Ok(lhs.clone() * rhs.clone().abs().ln() / a);
            }
        }
        Err(format!("Cannot integrate division: {} / {}", lhs, rhs))
    }

    fn integrate_power(&self, base: &Expr, exp: &Expr, var: &str) -> Result<Expr, String> {
        // ∫ (ax+b)^n dx = (ax+b)^(n+1) / (a (n+1)),  n = -1 gives ln|ax+b| / a
        if let Expr::Const(n) = exp {
            if let Some(a) = linear_coefficient(base, var) {
                if (*n + 1.0).abs() < f64::EPSILON {
                    return Ok(base.clone().abs().ln() / a);
                }
                let new_exp = Expr::Const(n + 1.0);
                return Ok(base.clone().pow(new_exp.clone()) / (a * new_exp));
            }
        }
        // ∫ c^x dx = c^x / ln(c)
        if let (Expr::Const(c), Expr::Var(x)) = (base, exp) {
            if x == var && *c > 0.0 && (*c - 1.0).abs() > f64::EPSILON {
                return Ok(self.clone() / Expr::Const(*c).ln());
            }
        }
        self.integrate_as_polynomial(var)
            .ok_or_else(|| format!("Cannot integrate power: ({})^({})", base, exp))
    }

    fn integrate_as_polynomial(&self, var: &str) -> Option<Expr> {
        Polynomial::from_expr(self).map(|poly| poly.integrate(var).to_expr())
    }

    /// Definite integral over `var` between two symbolic bounds: F(upper) - F(lower).
    /// The bounds may themselves be variables, which keeps the result reusable when the
    /// limits change.
    pub fn definite_integral_expr(&self, var: &str, lower: &Expr, upper: &Expr) -> Result<Expr, String> {
        let indefinite = self.integrate(var)?;
        let at_upper = indefinite.substitute_variable(var, upper);
        let at_lower = indefinite.substitute_variable(var, lower);
        Ok((at_upper - at_lower).simplify())
    }
}

/// `a` for an argument of the form a*var + b with `a` free of `var` and non-zero.
fn linear_coefficient(inner: &Expr, var: &str) -> Option<Expr> {
    let poly = Polynomial::from_expr(inner)?;
    if poly.degree_in(var) != 1 {
        return None;
    }
    let a = poly.coefficient_of(var, 1);
    if a.is_zero() {
        return None;
    }
    Some(a.to_expr())
}

/// ∫ p(x) e^(ax+b) dx = e^(ax+b) Σ_k (-1)^k p^(k)(x) / a^(k+1),  p polynomial in x
fn integrate_polynomial_times_exponential(poly: &Expr, exp: &Expr, var: &str) -> Option<Expr> {
    let Expr::Exp(inner) = exp else {
        return None;
    };
    let a = linear_coefficient(inner, var)?;
    let mut p = Polynomial::from_expr(poly)?;
    let mut sum = Polynomial::zero().to_expr();
    let mut k = 0;
    while !p.is_zero() {
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        let denominator = a.clone().pow(Expr::Const((k + 1) as f64));
        sum = sum + Expr::Const(sign) * p.to_expr() / denominator;
        p = p.derivative(var);
        k += 1;
    }
    Some((exp.clone() * sum).simplify())
}
