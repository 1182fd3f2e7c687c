//! The product of real and category terms, with factorized analytic integration.
//!
//! Integration requests go through the term grouper; when the terms split into at least two
//! independent groups the list of partial integrals is built once, stored in the product's
//! cache and identified by an integral code (`slot + 1`, `0` meaning "no factorized
//! integral"). Evaluating the code multiplies the cached list. Entries dropped from the
//! cache are rebuilt into the same slot on the next evaluation of their code.
//!
//! # Examples
//! ```
//! use RustedProduct::product::product_main::{Product, ProductArg};
//! use RustedProduct::product::terms::FormulaTerm;
//! use RustedProduct::product::variables::{VarSet, VarStore};
//! use RustedProduct::symbols;
//! let (x, y) = symbols!(x, y);
//! let mut env = VarStore::new();
//! env.add_real("x", 0.5, 0.0, 1.0).unwrap();
//! env.add_real("y", 0.5, 0.0, 2.0).unwrap();
//! let prod = Product::new(
//!     "fg",
//!     vec![
//!         ProductArg::real(FormulaTerm::new("f", x)),
//!         ProductArg::real(FormulaTerm::new("g", y)),
//!     ],
//! )
//! .unwrap();
//! let (code, claimed) = prod
//!     .analytical_integral_code(&VarSet::from_names(["x", "y"]), None)
//!     .unwrap();
//! assert_eq!(code, 1);
//! assert_eq!(claimed.len(), 2);
//! // ∫x dx over [0,1] times ∫y dy over [0,2]
//! assert!((prod.analytical_integral(code, &env).unwrap() - 1.0).abs() < 1e-12);
//! ```

use crate::product::config::ProductConfig;
use crate::product::error::ProductError;
use crate::product::grouping::{describe_groups, group_product_terms};
use crate::product::integral_cache::{CacheKey, IntegralCache};
use crate::product::numeric;
use crate::product::partial_integrals::{build_partial_integrals, calculate};
use crate::product::range_names::RangeName;
use crate::product::terms::{AnalyticIntegral, CategoryTerm, FormulaTerm, RealTerm, integral_name};
use crate::product::variables::{VarSet, VarStore};
use crate::symbolic::symbolic_engine::Expr;
use itertools::Itertools;
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use strum_macros::{Display, EnumIter};

/// A product member: real-valued or category-valued.
#[derive(Debug, Clone)]
pub enum ProductArg {
    Real(Rc<dyn RealTerm>),
    Category(Rc<dyn CategoryTerm>),
}

impl ProductArg {
    pub fn real<T: RealTerm + 'static>(term: T) -> Self {
        ProductArg::Real(Rc::new(term))
    }

    pub fn category<T: CategoryTerm + 'static>(term: T) -> Self {
        ProductArg::Category(Rc::new(term))
    }

    pub fn name(&self) -> &str {
        match self {
            ProductArg::Real(term) => term.name(),
            ProductArg::Category(term) => term.name(),
        }
    }
}

/// Path taken by `Product::integral_with_method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum IntegrationMethod {
    /// no integration variable the product depends on
    Trivial,
    /// cached list of partial integrals
    Factorized,
    /// closed form of the whole product
    JointAnalytic,
    /// Gauss-Legendre quadrature
    Numeric,
}

#[derive(Debug)]
pub struct Product {
    name: String,
    real_terms: Vec<Rc<dyn RealTerm>>,
    cat_terms: Vec<Rc<dyn CategoryTerm>>,
    cache: RefCell<IntegralCache>,
    config: ProductConfig,
}

impl Product {
    pub fn new(name: &str, args: Vec<ProductArg>) -> Result<Self, ProductError> {
        Self::with_config(name, args, ProductConfig::default())
    }

    /// Validates the members (non-empty, unique names) and builds the product; on error
    /// nothing is built.
    pub fn with_config(
        name: &str,
        args: Vec<ProductArg>,
        config: ProductConfig,
    ) -> Result<Self, ProductError> {
        if name.trim().is_empty() {
            return Err(ProductError::InvalidInput("product name is empty".to_string()));
        }
        config.validate()?;
        let mut seen = HashSet::new();
        for arg in &args {
            if arg.name().trim().is_empty() {
                return Err(ProductError::InvalidInput(format!(
                    "product {} has a member with an empty name",
                    name
                )));
            }
            if !seen.insert(arg.name().to_string()) {
                return Err(ProductError::InvalidInput(format!(
                    "product {} has duplicate member {}",
                    name,
                    arg.name()
                )));
            }
        }

        let mut real_terms = Vec::new();
        let mut cat_terms = Vec::new();
        for arg in args {
            match arg {
                ProductArg::Real(term) => real_terms.push(term),
                ProductArg::Category(term) => cat_terms.push(term),
            }
        }
        debug!(
            "product {} of real terms ({}) and category terms ({})",
            name,
            real_terms.iter().map(|t| t.name()).join(","),
            cat_terms.iter().map(|t| t.name()).join(",")
        );
        Ok(Self {
            name: name.to_string(),
            real_terms,
            cat_terms,
            cache: RefCell::new(IntegralCache::new(config.cache_size)),
            config,
        })
    }

    /// Copy under a new name sharing the members, with an empty cache.
    pub fn renamed(&self, name: &str) -> Result<Self, ProductError> {
        let args = self
            .real_terms
            .iter()
            .cloned()
            .map(ProductArg::Real)
            .chain(self.cat_terms.iter().cloned().map(ProductArg::Category))
            .collect();
        Self::with_config(name, args, self.config.clone())
    }

    pub fn real_terms(&self) -> &[Rc<dyn RealTerm>] {
        &self.real_terms
    }

    pub fn category_terms(&self) -> &[Rc<dyn CategoryTerm>] {
        &self.cat_terms
    }

    pub fn config(&self) -> &ProductConfig {
        &self.config
    }

    pub fn set_force_numeric(&mut self, force_numeric: bool) {
        self.config.force_numeric = force_numeric;
    }

    /// Product of the real term values and the category indices.
    pub fn evaluate(&self, env: &VarStore) -> Result<f64, ProductError> {
        Ok(calculate(&self.real_terms, env)? * self.category_factor(env)?)
    }

    fn category_factor(&self, env: &VarStore) -> Result<f64, ProductError> {
        self.cat_terms
            .iter()
            .try_fold(1.0, |acc, cat| -> Result<f64, ProductError> {
                Ok(acc * cat.index(env)? as f64)
            })
    }

    /// All variables the members depend on, categories included.
    pub fn parameters(&self) -> VarSet {
        let mut params = VarSet::new();
        for term in &self.real_terms {
            params.extend(&term.variables());
        }
        for cat in &self.cat_terms {
            params.insert(cat.name());
        }
        params
    }

    /// True if some real member depends on `var`: the product then insists on integrating
    /// over it itself.
    pub fn force_analytical_int(&self, var: &str) -> bool {
        self.real_terms.iter().any(|term| term.depends_on(var))
    }

    /// Slot of the partial-integral list for `iset` over `range`, building and caching it
    /// on a miss. `None` if the real terms do not split into at least two groups.
    pub fn part_int_list(
        &self,
        iset: &VarSet,
        range: Option<RangeName>,
    ) -> Result<Option<usize>, ProductError> {
        let key = CacheKey::new(iset, iset, range);
        if let Some(slot) = self.cache.borrow().lookup(&key) {
            debug!("{}: cache hit for {} in slot {}", self.name, iset, slot);
            return Ok(Some(slot));
        }

        let groups = group_product_terms(&self.real_terms, iset)?;
        debug!(
            "{}: grouping over {}: {}",
            self.name,
            iset,
            describe_groups(&groups, &self.real_terms)
        );
        if groups.len() < 2 {
            return Ok(None);
        }

        let entry = build_partial_integrals(&groups, &self.real_terms, range, &self.config)?;
        let slot = self.cache.borrow_mut().store(key, iset.clone(), entry);
        debug!("{}: stored partial integrals over {} in slot {}", self.name, iset, slot);
        Ok(Some(slot))
    }

    /// Integral code for `all_vars` over the named range and the variables it claims;
    /// `(0, ∅)` when there is no factorized integral.
    pub fn analytical_integral_code(
        &self,
        all_vars: &VarSet,
        range: Option<&str>,
    ) -> Result<(usize, VarSet), ProductError> {
        self.analytical_integral_code_token(all_vars, RangeName::intern_opt(range))
    }

    fn analytical_integral_code_token(
        &self,
        all_vars: &VarSet,
        range: Option<RangeName>,
    ) -> Result<(usize, VarSet), ProductError> {
        if self.config.force_numeric {
            return Ok((0, VarSet::new()));
        }
        let anal_vars = VarSet::from_names(all_vars.iter().filter(|v| self.force_analytical_int(v)));
        if anal_vars.is_empty() {
            return Ok((0, VarSet::new()));
        }
        match self.part_int_list(&anal_vars, range)? {
            Some(slot) => Ok((slot + 1, anal_vars)),
            None => Ok((0, VarSet::new())),
        }
    }

    /// Value of the factorized integral `code`: the product of the cached list times the
    /// category indices. Sterilized entries are rebuilt first.
    pub fn analytical_integral(&self, code: usize, env: &VarStore) -> Result<f64, ProductError> {
        let slot = match code.checked_sub(1) {
            Some(slot) if self.cache.borrow().contains_slot(slot) => slot,
            _ => {
                error!("{}: unknown integral code {}", self.name, code);
                return Err(ProductError::UnknownCode(code));
            }
        };

        let cached = self
            .cache
            .borrow()
            .entry(slot)
            .map(|entry| entry.resolved_terms());
        let terms = match cached {
            Some(terms) => terms?,
            None => self.revive(slot)?,
        };
        Ok(calculate(&terms, env)? * self.category_factor(env)?)
    }

    fn revive(&self, slot: usize) -> Result<Vec<Rc<dyn RealTerm>>, ProductError> {
        let (descriptor, range) = self
            .cache
            .borrow()
            .descriptor(slot)
            .map(|(descriptor, key)| (descriptor.clone(), key.range()))
            .ok_or(ProductError::UnknownCode(slot + 1))?;
        let vars = descriptor.select(&self.parameters());
        debug!("{}: reviving sterilized slot {} over {}", self.name, slot, vars);

        let revived = self.part_int_list(&vars, range)?.map_or(0, |s| s + 1);
        if revived != slot + 1 {
            error!(
                "{}: revival of code {} produced code {}",
                self.name,
                slot + 1,
                revived
            );
            return Err(ProductError::CacheCorruption {
                requested: slot + 1,
                revived,
            });
        }
        self.cache
            .borrow()
            .entry(slot)
            .map(|entry| entry.resolved_terms())
            .unwrap_or_else(|| {
                Err(ProductError::InvariantViolation(format!(
                    "slot {} still sterile after revival",
                    slot
                )))
            })
    }

    /// Integral over `vars`, restricted to the named `range`.
    pub fn integral(
        &self,
        vars: &VarSet,
        range: Option<&str>,
        env: &VarStore,
    ) -> Result<f64, ProductError> {
        Ok(self.integral_with_method(vars, range, env)?.0)
    }

    /// Integral over `vars` and the path that produced it. Variables the product does not
    /// depend on contribute the width of their range.
    pub fn integral_with_method(
        &self,
        vars: &VarSet,
        range: Option<&str>,
        env: &VarStore,
    ) -> Result<(f64, IntegrationMethod), ProductError> {
        let range = RangeName::intern_opt(range);
        let (dependent, free) = self.split_integration_vars(vars)?;
        let width = range_width(&free, range, env)?;

        if dependent.is_empty() {
            return Ok((self.evaluate(env)? * width, IntegrationMethod::Trivial));
        }

        if !self.config.force_numeric {
            if let Some(slot) = self.factorized_slot(&dependent, range)? {
                let value = self.analytical_integral(slot + 1, env)?;
                return Ok((value * width, IntegrationMethod::Factorized));
            }
            if let Some(joint) = self.joint_integral(&dependent, range) {
                return Ok((joint.value(env)? * width, IntegrationMethod::JointAnalytic));
            }
        }

        info!(
            "{}: numeric integration over {} with {} Gauss-Legendre nodes per variable",
            self.name, dependent, self.config.quadrature_degree
        );
        let value = numeric::integrate(
            |point| self.evaluate(point),
            &dependent,
            range,
            env,
            self.config.quadrature_degree,
        )?;
        Ok((value * width, IntegrationMethod::Numeric))
    }

    /// Splits integration variables into those a real member depends on and the free ones.
    /// Category variables cannot be integrated over.
    fn split_integration_vars(&self, vars: &VarSet) -> Result<(VarSet, VarSet), ProductError> {
        if let Some(cat) = vars
            .iter()
            .find(|v| self.cat_terms.iter().any(|cat| cat.depends_on(v)))
        {
            return Err(ProductError::InvalidInput(format!(
                "{}: summation over category {} is not supported",
                self.name, cat
            )));
        }
        let (dependent, free): (Vec<&str>, Vec<&str>) =
            vars.iter().partition(|v| self.force_analytical_int(v));
        Ok((VarSet::from_names(dependent), VarSet::from_names(free)))
    }

    /// Like `part_int_list`, but a group without a closed form means "no factorized
    /// integral" instead of an error.
    fn factorized_slot(
        &self,
        dependent: &VarSet,
        range: Option<RangeName>,
    ) -> Result<Option<usize>, ProductError> {
        match self.part_int_list(dependent, range) {
            Err(ProductError::IntegralUnsupported { term, vars }) => {
                warn!(
                    "{}: no factorized integral, {} is not integrable over {}",
                    self.name, term, vars
                );
                Ok(None)
            }
            other => other,
        }
    }

    /// Closed-form integral of the whole product, if every member has a symbolic form and
    /// the product of those forms can be integrated.
    pub fn joint_integral(&self, vars: &VarSet, range: Option<RangeName>) -> Option<AnalyticIntegral> {
        let expr = self.symbolic_form()?;
        match FormulaTerm::new(&self.name, expr).closed_form_integral(vars) {
            Ok(closed_form) => Some(AnalyticIntegral::new(
                &self.name,
                &self.parameters(),
                closed_form,
                vars,
                range,
            )),
            Err(msg) => {
                debug!("{}: no joint analytic integral over {}: {}", self.name, vars, msg);
                None
            }
        }
    }

    /// Drops every cached entry; codes stay valid and are rebuilt on demand.
    pub fn sterilize_cache(&self) {
        self.cache.borrow_mut().sterilize_all();
    }

    /// Drops the entry of `code`; false if it was not live.
    pub fn sterilize(&self, code: usize) -> bool {
        code.checked_sub(1)
            .map(|slot| self.cache.borrow_mut().sterilize(slot))
            .unwrap_or(false)
    }

    /// Number of live cache entries.
    pub fn cache_len(&self) -> usize {
        self.cache.borrow().live_len()
    }

    /// Names of the cached list of `code`, if it is live.
    pub fn cached_term_names(&self, code: usize) -> Option<Vec<String>> {
        let slot = code.checked_sub(1)?;
        self.cache.borrow().entry(slot).map(|entry| entry.term_names())
    }

    pub fn is_cached(&self, code: usize) -> bool {
        code.checked_sub(1)
            .map(|slot| self.cache.borrow().is_live(slot))
            .unwrap_or(false)
    }
}

impl RealTerm for Product {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, env: &VarStore) -> Result<f64, ProductError> {
        self.evaluate(env)
    }

    fn depends_on(&self, var: &str) -> bool {
        self.force_analytical_int(var) || self.cat_terms.iter().any(|cat| cat.depends_on(var))
    }

    fn variables(&self) -> VarSet {
        self.parameters()
    }

    fn symbolic_form(&self) -> Option<Expr> {
        let reals = self.real_terms.iter().map(|t| t.symbolic_form());
        let cats = self.cat_terms.iter().map(|t| t.symbolic_form());
        reals
            .chain(cats)
            .collect::<Option<Vec<Expr>>>()?
            .into_iter()
            .reduce(|acc, factor| acc * factor)
            .or(Some(Expr::Const(1.0)))
    }

    /// Factorized integral when the dependent variables split the members into independent
    /// groups, otherwise the joint closed form. Free variables contribute the width of their
    /// range, as in `integral`.
    fn create_integral(
        self: Rc<Self>,
        vars: &VarSet,
        range: Option<RangeName>,
    ) -> Result<Option<Rc<dyn RealTerm>>, ProductError> {
        if self.config.force_numeric {
            return Ok(None);
        }
        let (dependent, free) = self.split_integration_vars(vars)?;
        if dependent.is_empty() {
            let integral = ProductIntegral::new(Rc::clone(&self), 0, vars, &free, range);
            return Ok(Some(Rc::new(integral)));
        }
        if let Some(slot) = self.factorized_slot(&dependent, range)? {
            let integral = ProductIntegral::new(Rc::clone(&self), slot + 1, vars, &free, range);
            return Ok(Some(Rc::new(integral)));
        }
        Ok(self
            .joint_integral(vars, range)
            .map(|joint| Rc::new(joint) as Rc<dyn RealTerm>))
    }
}

/// Product of the widths of `vars` over `range`; 1 for no variables.
fn range_width(vars: &VarSet, range: Option<RangeName>, env: &VarStore) -> Result<f64, ProductError> {
    vars.iter().try_fold(1.0, |acc, var| -> Result<f64, ProductError> {
        let (lo, hi) = env.bounds(var, range)?;
        Ok(acc * (hi - lo))
    })
}

//___________________________________PRODUCT INTEGRAL____________________________________

/// Integral of a product as a term: the product's cached list for `code` (or the product
/// itself for code 0) times the widths of the free variables.
#[derive(Debug)]
pub struct ProductIntegral {
    name: String,
    product: Rc<Product>,
    code: usize,
    free_vars: VarSet,
    range: Option<RangeName>,
    parameters: VarSet,
}

impl ProductIntegral {
    pub fn new(
        product: Rc<Product>,
        code: usize,
        vars: &VarSet,
        free_vars: &VarSet,
        range: Option<RangeName>,
    ) -> Self {
        Self {
            name: integral_name(&product.name, vars, range),
            parameters: product.parameters().difference(vars),
            product,
            code,
            free_vars: free_vars.clone(),
            range,
        }
    }

    pub fn code(&self) -> usize {
        self.code
    }
}

impl RealTerm for ProductIntegral {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, env: &VarStore) -> Result<f64, ProductError> {
        let base = match self.code {
            0 => self.product.evaluate(env)?,
            code => self.product.analytical_integral(code, env)?,
        };
        Ok(base * range_width(&self.free_vars, self.range, env)?)
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
