//! Variables: ordered variable-name sets and the store of current values.
//!
//! `VarSet` is the integration-variable set handed to the grouper. Its iteration order is
//! insertion order (the grouper emits one group per variable in that order), while
//! `normalized()` gives the order-independent form used in cache keys.
//!
//! `VarStore` holds what terms read when they are evaluated: current values, full domains
//! and named ranges of real variables, and the current state of category variables.

use crate::product::error::ProductError;
use crate::product::range_names::RangeName;
use itertools::Itertools;
use log::warn;
use std::collections::HashMap;
use std::fmt;

/// Ordered, duplicate-free set of variable names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VarSet {
    names: Vec<String>,
}

impl VarSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from names, dropping repeated ones.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    /// Returns false if the name was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn extend(&mut self, other: &VarSet) {
        for name in other.iter() {
            self.insert(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Sorted names; equal for sets with the same members.
    pub fn normalized(&self) -> Vec<String> {
        self.names.iter().cloned().sorted().collect()
    }

    pub fn same_members(&self, other: &VarSet) -> bool {
        self.normalized() == other.normalized()
    }

    pub fn is_disjoint(&self, other: &VarSet) -> bool {
        !self.iter().any(|name| other.contains(name))
    }

    /// Members of `self` that are also in `available`, in the order of `self`.
    /// Re-derives a variable set from a persisted descriptor.
    pub fn select(&self, available: &VarSet) -> VarSet {
        VarSet::from_names(self.iter().filter(|name| available.contains(name)))
    }

    /// Members of `self` missing from `other`.
    pub fn difference(&self, other: &VarSet) -> VarSet {
        VarSet::from_names(self.iter().filter(|name| !other.contains(name)))
    }
}

impl fmt::Display for VarSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({})", self.names.iter().join(","))
    }
}

/// A real variable: current value, full domain and named sub-ranges.
#[derive(Clone, Debug)]
pub struct RealVar {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    ranges: HashMap<RangeName, (f64, f64)>,
}

/// A category variable: labelled states with integer indices and the current state.
#[derive(Clone, Debug)]
pub struct CategoryVar {
    states: Vec<(String, i64)>,
    current: usize,
}

impl CategoryVar {
    pub fn index(&self) -> i64 {
        self.states[self.current].1
    }

    pub fn label(&self) -> &str {
        &self.states[self.current].0
    }
}

#[derive(Clone, Debug, Default)]
pub struct VarStore {
    reals: HashMap<String, RealVar>,
    categories: HashMap<String, CategoryVar>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_new_name(&self, name: &str) -> Result<(), ProductError> {
        if name.trim().is_empty() {
            return Err(ProductError::InvalidInput("variable name is empty".to_string()));
        }
        if self.contains(name) {
            return Err(ProductError::InvalidInput(format!(
                "variable {} is already defined",
                name
            )));
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.reals.contains_key(name) || self.categories.contains_key(name)
    }

    /// Defines a real variable with domain [min, max] and an initial value inside it.
    pub fn add_real(&mut self, name: &str, value: f64, min: f64, max: f64) -> Result<(), ProductError> {
        self.check_new_name(name)?;
        if !(min < max) {
            return Err(ProductError::InvalidInput(format!(
                "domain of {} is empty: [{}, {}]",
                name, min, max
            )));
        }
        if !(min..=max).contains(&value) {
            return Err(ProductError::InvalidInput(format!(
                "initial value {} of {} is outside [{}, {}]",
                value, name, min, max
            )));
        }
        self.reals.insert(
            name.to_string(),
            RealVar {
                value,
                min,
                max,
                ranges: HashMap::new(),
            },
        );
        Ok(())
    }

    pub fn real(&self, name: &str) -> Result<&RealVar, ProductError> {
        self.reals
            .get(name)
            .ok_or_else(|| ProductError::UnknownVariable(name.to_string()))
    }

    pub fn value(&self, name: &str) -> Result<f64, ProductError> {
        Ok(self.real(name)?.value)
    }

    /// Sets the current value, clipped to the full domain.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), ProductError> {
        let var = self
            .reals
            .get_mut(name)
            .ok_or_else(|| ProductError::UnknownVariable(name.to_string()))?;
        if value < var.min || value > var.max {
            warn!(
                "value {} of {} outside [{}, {}], clipped",
                value, name, var.min, var.max
            );
        }
        var.value = value.clamp(var.min, var.max);
        Ok(())
    }

    /// Defines (or redefines) the named range `range_name` of `var`.
    pub fn set_range(
        &mut self,
        var: &str,
        range_name: &str,
        lo: f64,
        hi: f64,
    ) -> Result<RangeName, ProductError> {
        if range_name.trim().is_empty() {
            return Err(ProductError::InvalidInput("range name is empty".to_string()));
        }
        if !(lo < hi) {
            return Err(ProductError::InvalidInput(format!(
                "range {} of {} is empty: [{}, {}]",
                range_name, var, lo, hi
            )));
        }
        let real = self
            .reals
            .get_mut(var)
            .ok_or_else(|| ProductError::UnknownVariable(var.to_string()))?;
        let token = RangeName::intern(range_name);
        real.ranges.insert(token, (lo, hi));
        Ok(token)
    }

    /// Integration limits of `var`: the named range if `var` defines it, otherwise the full domain.
    pub fn bounds(&self, var: &str, range: Option<RangeName>) -> Result<(f64, f64), ProductError> {
        let real = self.real(var)?;
        match range {
            None => Ok((real.min, real.max)),
            Some(token) => match real.ranges.get(&token) {
                Some(bounds) => Ok(*bounds),
                None => {
                    warn!(
                        "variable {} has no range {}, using full domain [{}, {}]",
                        var, token, real.min, real.max
                    );
                    Ok((real.min, real.max))
                }
            },
        }
    }

    /// Defines a category with labelled states; `current` selects the initial state.
    pub fn add_category(
        &mut self,
        name: &str,
        states: &[(&str, i64)],
        current: &str,
    ) -> Result<(), ProductError> {
        self.check_new_name(name)?;
        if states.is_empty() {
            return Err(ProductError::InvalidInput(format!("category {} has no states", name)));
        }
        if !states.iter().map(|(label, _)| *label).all_unique() {
            return Err(ProductError::InvalidInput(format!(
                "category {} has duplicate state labels",
                name
            )));
        }
        let current = states
            .iter()
            .position(|(label, _)| *label == current)
            .ok_or_else(|| {
                ProductError::InvalidInput(format!("category {} has no state {}", name, current))
            })?;
        let states = states
            .iter()
            .map(|(label, index)| (label.to_string(), *index))
            .collect();
        self.categories
            .insert(name.to_string(), CategoryVar { states, current });
        Ok(())
    }

    pub fn category(&self, name: &str) -> Result<&CategoryVar, ProductError> {
        self.categories
            .get(name)
            .ok_or_else(|| ProductError::UnknownVariable(name.to_string()))
    }

    pub fn set_label(&mut self, name: &str, label: &str) -> Result<(), ProductError> {
        let cat = self
            .categories
            .get_mut(name)
            .ok_or_else(|| ProductError::UnknownVariable(name.to_string()))?;
        cat.current = cat
            .states
            .iter()
            .position(|(l, _)| l == label)
            .ok_or_else(|| {
                ProductError::InvalidInput(format!("category {} has no state {}", name, label))
            })?;
        Ok(())
    }

    pub fn category_index(&self, name: &str) -> Result<i64, ProductError> {
        Ok(self.category(name)?.index())
    }

    /// Snapshot of all current values; categories contribute their index.
    pub fn values(&self) -> HashMap<String, f64> {
        let mut values: HashMap<String, f64> = self
            .reals
            .iter()
            .map(|(name, var)| (name.clone(), var.value))
            .collect();
        values.extend(
            self.categories
                .iter()
                .map(|(name, cat)| (name.clone(), cat.index() as f64)),
        );
        values
    }
}
