//! Partial-integral lists: turns the groups of a product into the list of factors whose
//! product is the integral of the whole product.
//!
//! Per group: several terms are wrapped in a synthesized sub-product, a single term is used
//! as is; the group's term is then integrated over the group's variables, except for the
//! independent group (no variables) which is appended unchanged.

use crate::product::config::ProductConfig;
use crate::product::error::ProductError;
use crate::product::grouping::Group;
use crate::product::product_main::{Product, ProductArg};
use crate::product::range_names::RangeName;
use crate::product::terms::RealTerm;
use crate::product::variables::VarStore;
use itertools::Itertools;
use log::{debug, error};
use std::rc::Rc;

/// Element of a cached product list: an input term of the product or an index into the
/// entry's own arena of synthesized terms.
#[derive(Debug, Clone)]
pub enum PartialTerm {
    Borrowed(Rc<dyn RealTerm>),
    Owned(usize),
}

/// Product list plus the sub-products and integrals created for it.
#[derive(Debug, Default)]
pub struct CacheEntry {
    prod_list: Vec<PartialTerm>,
    owned: Vec<Rc<dyn RealTerm>>,
}

impl CacheEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_borrowed(&mut self, term: Rc<dyn RealTerm>) {
        self.prod_list.push(PartialTerm::Borrowed(term));
    }

    /// Takes ownership of a synthesized term without listing it.
    pub fn adopt(&mut self, term: Rc<dyn RealTerm>) -> usize {
        self.owned.push(term);
        self.owned.len() - 1
    }

    pub fn push_owned(&mut self, index: usize) {
        self.prod_list.push(PartialTerm::Owned(index));
    }

    pub fn resolve(&self, part: &PartialTerm) -> Option<Rc<dyn RealTerm>> {
        match part {
            PartialTerm::Borrowed(term) => Some(Rc::clone(term)),
            PartialTerm::Owned(index) => self.owned.get(*index).cloned(),
        }
    }

    /// The product list with owned indices resolved.
    pub fn resolved_terms(&self) -> Result<Vec<Rc<dyn RealTerm>>, ProductError> {
        self.prod_list
            .iter()
            .map(|part| {
                self.resolve(part).ok_or_else(|| {
                    ProductError::InvariantViolation(format!(
                        "product list refers to a missing owned term {:?}",
                        part
                    ))
                })
            })
            .collect()
    }

    pub fn owned(&self) -> &[Rc<dyn RealTerm>] {
        &self.owned
    }

    pub fn term_names(&self) -> Vec<String> {
        self.prod_list
            .iter()
            .filter_map(|part| self.resolve(part))
            .map(|term| term.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.prod_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prod_list.is_empty()
    }
}

/// `SUBPROD_a_X_b_X_c` with the member names sorted.
pub fn sub_product_name<S: AsRef<str>>(names: &[S]) -> String {
    let joined = names.iter().map(|s| s.as_ref()).sorted().join("_X_");
    format!("SUBPROD_{}", joined)
}

/// Builds the product list for `groups` (the output of the term grouper over the same
/// `real_terms`). Sub-products inherit `config`.
pub fn build_partial_integrals(
    groups: &[Group],
    real_terms: &[Rc<dyn RealTerm>],
    range: Option<RangeName>,
    config: &ProductConfig,
) -> Result<CacheEntry, ProductError> {
    let mut entry = CacheEntry::new();
    for group in groups {
        let member = |i: usize| {
            real_terms.get(i).cloned().ok_or_else(|| {
                ProductError::InvariantViolation(format!("group refers to unknown term {}", i))
            })
        };
        let (term, owned_at) = match group.terms.len() {
            0 => {
                error!("group over {} has no terms", group.vars);
                return Err(ProductError::InvariantViolation(format!(
                    "group over {} has no terms",
                    group.vars
                )));
            }
            1 => {
                let index = group.terms.first().copied().unwrap_or(usize::MAX);
                (member(index)?, None)
            }
            _ => {
                let members = group
                    .terms
                    .iter()
                    .map(|&i| member(i))
                    .collect::<Result<Vec<_>, _>>()?;
                let names: Vec<&str> = members.iter().map(|t| t.name()).collect();
                let name = sub_product_name(&names);
                let args = members.iter().cloned().map(ProductArg::Real).collect();
                let sub_product: Rc<dyn RealTerm> =
                    Rc::new(Product::with_config(&name, args, config.clone())?);
                debug!("created sub-product {} over {}", name, group.vars);
                let index = entry.adopt(Rc::clone(&sub_product));
                (sub_product, Some(index))
            }
        };

        if group.vars.is_empty() {
            match owned_at {
                Some(index) => entry.push_owned(index),
                None => entry.push_borrowed(term),
            }
            continue;
        }

        let term_name = term.name().to_string();
        match term.create_integral(&group.vars, range)? {
            Some(integral) => {
                debug!("partial integral {} over {}", integral.name(), group.vars);
                let index = entry.adopt(integral);
                entry.push_owned(index);
            }
            None => {
                error!(
                    "term {} cannot be integrated analytically over {}",
                    term_name, group.vars
                );
                return Err(ProductError::IntegralUnsupported {
                    term: term_name,
                    vars: group.vars.to_string(),
                });
            }
        }
    }
    debug!("partial integral list: ({})", entry.term_names().join(","));
    Ok(entry)
}

/// Product of the current values of `terms`; 1 for an empty list.
pub fn calculate(terms: &[Rc<dyn RealTerm>], env: &VarStore) -> Result<f64, ProductError> {
    terms
        .iter()
        .try_fold(1.0, |acc, term| -> Result<f64, ProductError> {
            Ok(acc * term.value(env)?)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::grouping::group_product_terms;
    use crate::product::terms::FormulaTerm;
    use crate::product::variables::VarSet;
    use crate::symbolic::symbolic_engine::Expr;
    use crate::symbols;
    use approx::assert_relative_eq;
    use std::collections::BTreeSet;

    fn env() -> VarStore {
        let mut env = VarStore::new();
        env.add_real("x", 0.5, 0.0, 1.0).unwrap();
        env.add_real("y", 2.0, 0.0, 3.0).unwrap();
        env.add_real("a", 4.0, 0.0, 10.0).unwrap();
        env
    }

    fn terms(list: Vec<FormulaTerm>) -> Vec<Rc<dyn RealTerm>> {
        list.into_iter()
            .map(|t| Rc::new(t) as Rc<dyn RealTerm>)
            .collect()
    }

    #[test]
    fn test_sub_product_name_is_sorted() {
        assert_eq!(sub_product_name(&["h", "f", "g"]), "SUBPROD_f_X_g_X_h");
        assert_eq!(sub_product_name(&["f"]), "SUBPROD_f");
    }

    #[test]
    fn test_independent_term_and_single_integral() {
        let (x, y) = symbols!(x, y);
        let real = terms(vec![FormulaTerm::new("f", x), FormulaTerm::new("g", y)]);
        let vars = VarSet::from_names(["x"]);
        let groups = group_product_terms(&real, &vars).unwrap();
        let entry = build_partial_integrals(&groups, &real, None, &ProductConfig::default()).unwrap();
        assert_eq!(entry.term_names(), vec!["g", "f_Int[x]"]);
        assert_eq!(entry.owned().len(), 1);
        // y * ∫_0^1 x dx
        let value = calculate(&entry.resolved_terms().unwrap(), &env()).unwrap();
        assert_relative_eq!(value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_multi_term_group_becomes_sub_product() {
        let (x, y, a) = symbols!(x, y, a);
        let real = terms(vec![
            FormulaTerm::new("h", x.clone() * x.clone()),
            FormulaTerm::new("f", x),
            FormulaTerm::new("g", y),
            FormulaTerm::new("k", a),
        ]);
        let vars = VarSet::from_names(["x", "y"]);
        let groups = group_product_terms(&real, &vars).unwrap();
        let entry = build_partial_integrals(&groups, &real, None, &ProductConfig::default()).unwrap();
        assert_eq!(
            entry.term_names(),
            vec!["k", "SUBPROD_f_X_h_Int[x]", "g_Int[y]"]
        );
        // sub-product and its integral plus the integral of g
        assert_eq!(entry.owned().len(), 3);
        assert_eq!(entry.owned()[0].name(), "SUBPROD_f_X_h");
        // a * ∫_0^1 x³ dx * ∫_0^3 y dy
        let value = calculate(&entry.resolved_terms().unwrap(), &env()).unwrap();
        assert_relative_eq!(value, 4.0 * 0.25 * 4.5, epsilon = 1e-10);
    }

    #[test]
    fn test_range_is_passed_to_integrals() {
        let (x, y) = symbols!(x, y);
        let real = terms(vec![FormulaTerm::new("f", x), FormulaTerm::new("g", y)]);
        let mut env = env();
        let token = env.set_range("x", "half", 0.0, 0.5).unwrap();
        let vars = VarSet::from_names(["x", "y"]);
        let groups = group_product_terms(&real, &vars).unwrap();
        let entry =
            build_partial_integrals(&groups, &real, Some(token), &ProductConfig::default()).unwrap();
        assert_eq!(entry.term_names(), vec!["f_Int[x]_half", "g_Int[y]_half"]);
        // y has no range "half": full domain
        let value = calculate(&entry.resolved_terms().unwrap(), &env).unwrap();
        assert_relative_eq!(value, 0.125 * 4.5, epsilon = 1e-12);
    }

    #[test]
    fn test_unsupported_integral_is_fatal() {
        let (x, y) = symbols!(x, y);
        let real = terms(vec![
            FormulaTerm::new("gauss", (-(x.clone() * x)).exp()),
            FormulaTerm::new("g", y),
        ]);
        let vars = VarSet::from_names(["x", "y"]);
        let groups = group_product_terms(&real, &vars).unwrap();
        let err = build_partial_integrals(&groups, &real, None, &ProductConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ProductError::IntegralUnsupported {
                term: "gauss".to_string(),
                vars: "(x)".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_group_is_a_contract_violation() {
        let real = terms(vec![FormulaTerm::new("c", Expr::Const(3.0))]);
        let groups = vec![
            Group::new(VarSet::new(), BTreeSet::from([0])),
            Group::new(VarSet::from_names(["x"]), BTreeSet::new()),
        ];
        let err = build_partial_integrals(&groups, &real, None, &ProductConfig::default()).unwrap_err();
        assert!(matches!(err, ProductError::InvariantViolation(_)));
    }

    #[test]
    fn test_calculate_empty_list_is_one() {
        assert_relative_eq!(calculate(&[], &env()).unwrap(), 1.0);
    }
}
