//! Terms that can take part in a product.
//!
//! `RealTerm` is the contract the factorization engine relies on: a current value, the
//! dependency oracle (`depends_on` / `depends_on_any`) and analytic integration
//! (`create_integral`, which returns `Ok(None)` when the term cannot be integrated
//! analytically and an error only when building the integral failed). `CategoryTerm` is the discrete counterpart; it contributes its integer
//! index to a product.
//!
//! Concrete terms:
//! - `FormulaTerm` - a symbolic expression, optionally with hand-written antiderivatives
//! - `AnalyticIntegral` - closed-form integral of a `FormulaTerm`, limits read at evaluation
//! - `Category` - a category variable of the `VarStore`

use crate::product::error::ProductError;
use crate::product::range_names::RangeName;
use crate::product::variables::{VarSet, VarStore};
use crate::symbolic::symbolic_engine::Expr;
use itertools::Itertools;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub trait RealTerm: fmt::Debug {
    fn name(&self) -> &str;

    /// Current value given the state of the variables.
    fn value(&self, env: &VarStore) -> Result<f64, ProductError>;

    fn depends_on(&self, var: &str) -> bool;

    fn depends_on_any(&self, vars: &VarSet) -> bool {
        vars.iter().any(|var| self.depends_on(var))
    }

    /// All variables the value depends on.
    fn variables(&self) -> VarSet;

    /// Symbolic expression of the value, if the term has one.
    fn symbolic_form(&self) -> Option<Expr> {
        None
    }

    /// Analytic integral over `vars` restricted to `range`; `Ok(None)` if unsupported.
    fn create_integral(
        self: Rc<Self>,
        vars: &VarSet,
        range: Option<RangeName>,
    ) -> Result<Option<Rc<dyn RealTerm>>, ProductError>;
}

pub trait CategoryTerm: fmt::Debug {
    fn name(&self) -> &str;

    fn index(&self, env: &VarStore) -> Result<i64, ProductError>;

    fn depends_on(&self, var: &str) -> bool;

    fn symbolic_form(&self) -> Option<Expr> {
        None
    }
}

/// `<term>_Int[x,y]` or `<term>_Int[x,y]_<range>`
pub fn integral_name(term: &str, vars: &VarSet, range: Option<RangeName>) -> String {
    let base = format!("{}_Int[{}]", term, vars.iter().join(","));
    match range {
        Some(range) => format!("{}_{}", base, range),
        None => base,
    }
}

fn lower_bound_symbol(var: &str) -> String {
    format!("{}@lo", var)
}

fn upper_bound_symbol(var: &str) -> String {
    format!("{}@hi", var)
}

//___________________________________FORMULA TERM____________________________________

/// A real term given by a symbolic expression.
///
/// Antiderivatives supplied with `with_antiderivative` take precedence over symbolic
/// integration when the term is integrated over that variable first.
#[derive(Debug, Clone)]
pub struct FormulaTerm {
    name: String,
    expr: Expr,
    antiderivatives: HashMap<String, Expr>,
}

impl FormulaTerm {
    pub fn new(name: &str, expr: Expr) -> Self {
        Self {
            name: name.to_string(),
            expr,
            antiderivatives: HashMap::new(),
        }
    }

    /// The variable itself as a factor.
    pub fn variable(name: &str) -> Self {
        Self::new(name, Expr::Var(name.to_string()))
    }

    pub fn with_antiderivative(mut self, var: &str, antiderivative: Expr) -> Self {
        self.antiderivatives.insert(var.to_string(), antiderivative);
        self
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Integrates over `vars` one after another; every step replaces the variable by its
    /// bound placeholders, so the result only needs the limits at evaluation time.
    pub fn closed_form_integral(&self, vars: &VarSet) -> Result<Expr, String> {
        let mut current = self.expr.clone();
        for (step, var) in vars.iter().enumerate() {
            let lower = Expr::Var(lower_bound_symbol(var));
            let upper = Expr::Var(upper_bound_symbol(var));
            current = match self.antiderivatives.get(var) {
                Some(antiderivative) if step == 0 => (antiderivative.substitute_variable(var, &upper)
                    - antiderivative.substitute_variable(var, &lower))
                .simplify(),
                _ => current.definite_integral_expr(var, &lower, &upper)?,
            };
        }
        Ok(current)
    }
}

impl RealTerm for FormulaTerm {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, env: &VarStore) -> Result<f64, ProductError> {
        self.expr
            .eval_map(&env.values())
            .map_err(|msg| ProductError::InvalidInput(format!("term {}: {}", self.name, msg)))
    }

    fn depends_on(&self, var: &str) -> bool {
        self.expr.contains_variable(var)
    }

    fn variables(&self) -> VarSet {
        VarSet::from_names(self.expr.extract_variables())
    }

    fn symbolic_form(&self) -> Option<Expr> {
        Some(self.expr.clone())
    }

    fn create_integral(
        self: Rc<Self>,
        vars: &VarSet,
        range: Option<RangeName>,
    ) -> Result<Option<Rc<dyn RealTerm>>, ProductError> {
        match self.closed_form_integral(vars) {
            Ok(closed_form) => {
                let integral = AnalyticIntegral::new(&self.name, &self.variables(), closed_form, vars, range);
                debug!("created analytic integral {} = {}", integral.name, integral.closed_form);
                Ok(Some(Rc::new(integral)))
            }
            Err(msg) => {
                debug!("no analytic integral of {} over {}: {}", self.name, vars, msg);
                Ok(None)
            }
        }
    }
}

//___________________________________ANALYTIC INTEGRAL____________________________________

/// Closed-form integral of a term. The integration limits are placeholders in the closed
/// form and are looked up in the `VarStore` (named range or full domain) at evaluation.
#[derive(Debug, Clone)]
pub struct AnalyticIntegral {
    name: String,
    closed_form: Expr,
    vars: VarSet,
    parameters: VarSet,
    range: Option<RangeName>,
}

impl AnalyticIntegral {
    pub fn new(
        integrand: &str,
        integrand_vars: &VarSet,
        closed_form: Expr,
        vars: &VarSet,
        range: Option<RangeName>,
    ) -> Self {
        Self {
            name: integral_name(integrand, vars, range),
            closed_form,
            vars: vars.clone(),
            parameters: integrand_vars.difference(vars),
            range,
        }
    }

    pub fn closed_form(&self) -> &Expr {
        &self.closed_form
    }

    pub fn integration_vars(&self) -> &VarSet {
        &self.vars
    }
}

impl RealTerm for AnalyticIntegral {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, env: &VarStore) -> Result<f64, ProductError> {
        let mut values = env.values();
        for var in self.vars.iter() {
            let (lo, hi) = env.bounds(var, self.range)?;
            values.insert(lower_bound_symbol(var), lo);
            values.insert(upper_bound_symbol(var), hi);
        }
        self.closed_form
            .eval_map(&values)
            .map_err(|msg| ProductError::InvalidInput(format!("integral {}: {}", self.name, msg)))
    }

    fn depends_on(&self, var: &str) -> bool {
        self.parameters.contains(var)
    }

    fn variables(&self) -> VarSet {
        self.parameters.clone()
    }

    fn create_integral(
        self: Rc<Self>,
        _vars: &VarSet,
        _range: Option<RangeName>,
    ) -> Result<Option<Rc<dyn RealTerm>>, ProductError> {
        Ok(None)
    }
}

//___________________________________CATEGORY____________________________________

/// Category variable of the `VarStore` used as a product factor.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
}

impl Category {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl CategoryTerm for Category {
    fn name(&self) -> &str {
        &self.name
    }

    fn index(&self, env: &VarStore) -> Result<i64, ProductError> {
        env.category_index(&self.name)
    }

    fn depends_on(&self, var: &str) -> bool {
        self.name == var
    }

    fn symbolic_form(&self) -> Option<Expr> {
        Some(Expr::Var(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols;
    use approx::assert_relative_eq;

    fn store() -> VarStore {
        let mut store = VarStore::new();
        store.add_real("x", 1.0, 0.0, 2.0).unwrap();
        store.add_real("y", 3.0, 0.0, 1.0 + 3.0).unwrap();
        store.add_category("c", &[("a", 2), ("b", 5)], "b").unwrap();
        store
    }

    #[test]
    fn test_formula_term_value_and_dependencies() {
        let (x, y) = symbols!(x, y);
        let term = FormulaTerm::new("f", x * y + Expr::Const(1.0));
        let env = store();
        assert_relative_eq!(term.value(&env).unwrap(), 4.0, epsilon = 1e-12);
        assert!(term.depends_on("x"));
        assert!(!term.depends_on("z"));
        assert!(term.depends_on_any(&VarSet::from_names(["z", "y"])));
        assert!(!term.depends_on_any(&VarSet::from_names(["z"])));
        assert_eq!(term.variables(), VarSet::from_names(["x", "y"]));
    }

    #[test]
    fn test_formula_term_unknown_variable() {
        let term = FormulaTerm::variable("w");
        assert!(matches!(term.value(&store()), Err(ProductError::InvalidInput(_))));
    }

    #[test]
    fn test_integral_over_full_domain_and_named_range() {
        let x = Expr::Var("x".to_string());
        let term = Rc::new(FormulaTerm::new("f", x.clone() * x));
        let mut env = store();
        let vars = VarSet::from_names(["x"]);

        let full = Rc::clone(&term).create_integral(&vars, None).unwrap().unwrap();
        assert_eq!(full.name(), "f_Int[x]");
        // ∫_0^2 x² dx
        assert_relative_eq!(full.value(&env).unwrap(), 8.0 / 3.0, epsilon = 1e-12);
        assert!(!full.depends_on("x"));

        let token = env.set_range("x", "low", 0.0, 1.0).unwrap();
        let partial = Rc::clone(&term).create_integral(&vars, Some(token)).unwrap().unwrap();
        assert_eq!(partial.name(), "f_Int[x]_low");
        assert_relative_eq!(partial.value(&env).unwrap(), 1.0 / 3.0, epsilon = 1e-12);

        // limits are read at evaluation time
        env.set_range("x", "low", 0.0, 2.0).unwrap();
        assert_relative_eq!(partial.value(&env).unwrap(), 8.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_dimensional_integral_keeps_parameters() {
        let (x, y, a) = symbols!(x, y, a);
        let term = Rc::new(FormulaTerm::new("h", a * x * y));
        let mut env = store();
        env.add_real("a", 2.0, 0.0, 10.0).unwrap();
        let integral = term
            .create_integral(&VarSet::from_names(["x", "y"]), None)
            .unwrap()
            .unwrap();
        // a * (2²/2) * (4²/2)
        assert_relative_eq!(integral.value(&env).unwrap(), 32.0, epsilon = 1e-10);
        assert!(integral.depends_on("a"));
        assert!(!integral.depends_on("y"));
        assert_eq!(integral.variables(), VarSet::from_names(["a"]));
    }

    #[test]
    fn test_supplied_antiderivative_is_used() {
        let x = Expr::Var("x".to_string());
        // deliberately "wrong" antiderivative so the test can tell which path was taken
        let term = Rc::new(
            FormulaTerm::new("g", x.clone()).with_antiderivative("x", Expr::Const(10.0) * x),
        );
        let integral = term.create_integral(&VarSet::from_names(["x"]), None).unwrap().unwrap();
        assert_relative_eq!(integral.value(&store()).unwrap(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reciprocal_integral_below_pole() {
        let x = Expr::Var("x".to_string());
        let reciprocal = Rc::new(FormulaTerm::new("r", Expr::Const(1.0) / (x.clone() - Expr::Const(5.0))));
        let power = Rc::new(FormulaTerm::new("p", (x - Expr::Const(5.0)).pow(Expr::Const(-1.0))));
        let env = store();
        let vars = VarSet::from_names(["x"]);
        // ∫_0^2 dx / (x - 5) = ln(3/5)
        let expected = (3.0f64 / 5.0).ln();
        let integral = reciprocal.create_integral(&vars, None).unwrap().unwrap();
        assert_relative_eq!(integral.value(&env).unwrap(), expected, epsilon = 1e-12);
        let integral = power.create_integral(&vars, None).unwrap().unwrap();
        assert_relative_eq!(integral.value(&env).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_unsupported_integral_returns_none() {
        let x = Expr::Var("x".to_string());
        let gaussian = Rc::new(FormulaTerm::new("gauss", (-(x.clone() * x)).exp()));
        let integral = gaussian.create_integral(&VarSet::from_names(["x"]), None).unwrap();
        assert!(integral.is_none());
    }

    #[test]
    fn test_category_term() {
        let cat = Category::new("c");
        let mut env = store();
        assert_eq!(cat.index(&env).unwrap(), 5);
        env.set_label("c", "a").unwrap();
        assert_eq!(cat.index(&env).unwrap(), 2);
        assert!(cat.depends_on("c"));
        assert!(!cat.depends_on("x"));
        assert_eq!(cat.symbolic_form(), Some(Expr::Var("c".to_string())));
    }
}
