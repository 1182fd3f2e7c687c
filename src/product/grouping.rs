//! Term grouping: partitions the real terms of a product by the integration variables
//! they depend on.
//!
//! Terms that share an integration variable must be integrated together, so groups whose
//! term sets overlap are merged until the groups are independent. The result is the set of
//! connected components of the bipartite (variable, term) dependency graph, plus one group
//! with an empty variable set for the terms free of every integration variable.
//!
//! The pairwise overlap scan is quadratic in the number of groups, which stays small
//! (one group per integration variable at most).

use crate::product::error::ProductError;
use crate::product::terms::RealTerm;
use crate::product::variables::VarSet;
use itertools::Itertools;
use log::error;
use std::collections::BTreeSet;
use std::rc::Rc;

/// A set of integration variables and the indices of the real terms depending on them.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub vars: VarSet,
    pub terms: BTreeSet<usize>,
}

impl Group {
    pub fn new(vars: VarSet, terms: BTreeSet<usize>) -> Self {
        Self { vars, terms }
    }

    pub fn overlaps(&self, other: &Group) -> bool {
        !self.terms.is_disjoint(&other.terms)
    }

    /// Names of the member terms, in product order.
    pub fn term_names(&self, real_terms: &[Rc<dyn RealTerm>]) -> Vec<String> {
        self.terms
            .iter()
            .map(|&i| real_terms[i].name().to_string())
            .collect()
    }

    fn absorb(&mut self, other: Group) {
        self.vars.extend(&other.vars);
        self.terms.extend(other.terms);
    }
}

/// First pair (i, j), i < j, of groups sharing a term.
pub fn find_overlap(groups: &[Group]) -> Option<(usize, usize)> {
    (0..groups.len())
        .tuple_combinations()
        .find(|&(i, j)| groups[i].overlaps(&groups[j]))
}

/// Groups the real terms of a product for integration over `int_vars`.
///
/// The independent group (empty variable set) comes first if there is one, followed by
/// the merged variable groups in the order of their first variable in `int_vars`.
pub fn group_product_terms(
    real_terms: &[Rc<dyn RealTerm>],
    int_vars: &VarSet,
) -> Result<Vec<Group>, ProductError> {
    let mut groups = Vec::new();

    let independent: BTreeSet<usize> = real_terms
        .iter()
        .enumerate()
        .filter(|(_, term)| !term.depends_on_any(int_vars))
        .map(|(i, _)| i)
        .collect();
    if !independent.is_empty() {
        groups.push(Group::new(VarSet::new(), independent));
    }

    for var in int_vars.iter() {
        let dependents: BTreeSet<usize> = real_terms
            .iter()
            .enumerate()
            .filter(|(_, term)| term.depends_on(var))
            .map(|(i, _)| i)
            .collect();
        groups.push(Group::new(VarSet::from_names([var]), dependents));
    }

    while let Some((i, j)) = find_overlap(&groups) {
        let merged = groups.remove(j);
        groups[i].absorb(merged);
    }

    let found_vars: usize = groups.iter().map(|g| g.vars.len()).sum();
    let found_terms: usize = groups.iter().map(|g| g.terms.len()).sum();
    if found_vars != int_vars.len() || found_terms != real_terms.len() {
        error!(
            "inconsistent dependencies while grouping over {}: {}",
            int_vars,
            describe_groups(&groups, real_terms)
        );
        return Err(ProductError::GroupingInconsistent {
            expected_vars: int_vars.len(),
            found_vars,
            expected_terms: real_terms.len(),
            found_terms,
        });
    }
    Ok(groups)
}

/// ` [ (x) -> (f,h) , (y) -> (g) ] `
pub fn describe_groups(groups: &[Group], real_terms: &[Rc<dyn RealTerm>]) -> String {
    let body = groups
        .iter()
        .map(|g| format!("{} -> ({})", g.vars, g.term_names(real_terms).join(",")))
        .join(" , ");
    format!(" [ {} ] ", body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::range_names::RangeName;
    use crate::product::terms::FormulaTerm;
    use crate::product::variables::VarStore;
    use crate::symbolic::symbolic_engine::Expr;
    use crate::symbols;

    fn terms(list: Vec<FormulaTerm>) -> Vec<Rc<dyn RealTerm>> {
        list.into_iter()
            .map(|t| Rc::new(t) as Rc<dyn RealTerm>)
            .collect()
    }

    fn names(groups: &[Group], real_terms: &[Rc<dyn RealTerm>]) -> Vec<(Vec<String>, Vec<String>)> {
        groups
            .iter()
            .map(|g| (g.vars.normalized(), g.term_names(real_terms)))
            .collect()
    }

    fn owned(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fully_separable_product() {
        let (x, y, z) = symbols!(x, y, z);
        let real = terms(vec![
            FormulaTerm::new("f", x.exp()),
            FormulaTerm::new("g", y.clone() * y),
            FormulaTerm::new("k", z),
        ]);
        let groups = group_product_terms(&real, &VarSet::from_names(["x", "y"])).unwrap();
        assert_eq!(
            names(&groups, &real),
            vec![
                (vec![], owned(&["k"])),
                (owned(&["x"]), owned(&["f"])),
                (owned(&["y"]), owned(&["g"])),
            ]
        );
    }

    #[test]
    fn test_shared_variable_chain_merges_everything() {
        // f(x), g(y), h(x,y): h links the x and y groups
        let (x, y) = symbols!(x, y);
        let real = terms(vec![
            FormulaTerm::new("f", x.clone()),
            FormulaTerm::new("g", y.clone()),
            FormulaTerm::new("h", x * y),
        ]);
        let groups = group_product_terms(&real, &VarSet::from_names(["x", "y"])).unwrap();
        assert_eq!(
            names(&groups, &real),
            vec![(owned(&["x", "y"]), owned(&["f", "g", "h"]))]
        );
    }

    #[test]
    fn test_transitive_merge_over_three_variables() {
        // a(x,y), b(y,z) connect x-y-z; c(w) stays alone
        let (x, y, z, w) = symbols!(x, y, z, w);
        let real = terms(vec![
            FormulaTerm::new("a", x * y.clone()),
            FormulaTerm::new("c", w),
            FormulaTerm::new("b", y + z),
        ]);
        let int_vars = VarSet::from_names(["z", "w", "x", "y"]);
        let groups = group_product_terms(&real, &int_vars).unwrap();
        assert_eq!(
            names(&groups, &real),
            vec![
                (owned(&["x", "y", "z"]), owned(&["a", "b"])),
                (owned(&["w"]), owned(&["c"])),
            ]
        );
        // merged variables are appended in merge order
        assert_eq!(groups[0].vars.iter().collect::<Vec<_>>(), vec!["z", "y", "x"]);
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let (x, y, z) = symbols!(x, y, z);
        let real = terms(vec![
            FormulaTerm::new("f", x.clone() * z.clone()),
            FormulaTerm::new("g", y.clone()),
            FormulaTerm::new("h", z),
            FormulaTerm::new("k", Expr::Const(2.0)),
        ]);
        let int_vars = VarSet::from_names(["x", "y", "z"]);
        let first = group_product_terms(&real, &int_vars).unwrap();
        let second = group_product_terms(&real, &int_vars).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_counts_always_add_up() {
        let (x, y, z) = symbols!(x, y, z);
        let real = terms(vec![
            FormulaTerm::new("t0", x.clone()),
            FormulaTerm::new("t1", x.clone() * y.clone()),
            FormulaTerm::new("t2", z.clone()),
            FormulaTerm::new("t3", Expr::Const(1.0)),
            FormulaTerm::new("t4", y.clone() + z.clone()),
        ]);
        for vars in [
            vec!["x"],
            vec!["y"],
            vec!["z", "x"],
            vec!["x", "y", "z"],
            vec![],
        ] {
            let int_vars = VarSet::from_names(vars);
            let groups = group_product_terms(&real, &int_vars).unwrap();
            let n_vars: usize = groups.iter().map(|g| g.vars.len()).sum();
            let n_terms: usize = groups.iter().map(|g| g.terms.len()).sum();
            assert_eq!(n_vars, int_vars.len());
            assert_eq!(n_terms, real.len());
            assert!(find_overlap(&groups).is_none());
        }
    }

    #[test]
    fn test_describe_groups() {
        let (x, y) = symbols!(x, y);
        let real = terms(vec![FormulaTerm::new("f", x), FormulaTerm::new("g", y)]);
        let groups = group_product_terms(&real, &VarSet::from_names(["x"])).unwrap();
        assert_eq!(describe_groups(&groups, &real), " [ () -> (g) , (x) -> (f) ] ");
    }

    /// Claims to depend on the set but on none of its members.
    #[derive(Debug)]
    struct InconsistentTerm;

    impl RealTerm for InconsistentTerm {
        fn name(&self) -> &str {
            "liar"
        }
        fn value(&self, _env: &VarStore) -> Result<f64, ProductError> {
            Ok(1.0)
        }
        fn depends_on(&self, _var: &str) -> bool {
            false
        }
        fn depends_on_any(&self, _vars: &VarSet) -> bool {
            true
        }
        fn variables(&self) -> VarSet {
            VarSet::from_names(["x"])
        }
        fn create_integral(
            self: Rc<Self>,
            _vars: &VarSet,
            _range: Option<RangeName>,
        ) -> Result<Option<Rc<dyn RealTerm>>, ProductError> {
            Ok(None)
        }
    }

    #[test]
    fn test_inconsistent_oracle_is_fatal() {
        let real: Vec<Rc<dyn RealTerm>> = vec![Rc::new(InconsistentTerm)];
        let err = group_product_terms(&real, &VarSet::from_names(["x"])).unwrap_err();
        assert_eq!(
            err,
            ProductError::GroupingInconsistent {
                expected_vars: 1,
                found_vars: 1,
                expected_terms: 1,
                found_terms: 0,
            }
        );
    }
}
