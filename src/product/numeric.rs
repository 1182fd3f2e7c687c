//! Numeric fallback: nested Gauss-Legendre quadrature of a function of the variable store.
//! Only used by `Product::integral` when no analytic path exists.

use crate::product::error::ProductError;
use crate::product::range_names::RangeName;
use crate::product::variables::{VarSet, VarStore};
use gauss_quad::GaussLegendre;
use log::debug;
use std::cell::RefCell;

type Limits = (String, f64, f64);

fn nested<F>(
    f: &F,
    limits: &[Limits],
    env: &VarStore,
    quad: &GaussLegendre,
    failure: &RefCell<Option<ProductError>>,
) -> f64
where
    F: Fn(&VarStore) -> Result<f64, ProductError>,
{
    match limits.split_first() {
        None => match f(env) {
            Ok(value) => value,
            Err(e) => {
                failure.borrow_mut().get_or_insert(e);
                f64::NAN
            }
        },
        Some(((var, lo, hi), rest)) => quad.integrate(*lo, *hi, |x| {
            let mut point = env.clone();
            if let Err(e) = point.set_value(var, x) {
                failure.borrow_mut().get_or_insert(e);
                return f64::NAN;
            }
            nested(f, rest, &point, quad, failure)
        }),
    }
}

/// Integrates `f` over `vars`, each between its bounds for `range` (full domain if `None`),
/// with `degree` nodes per variable. The other variables keep their values in `env`.
pub fn integrate<F>(
    f: F,
    vars: &VarSet,
    range: Option<RangeName>,
    env: &VarStore,
    degree: usize,
) -> Result<f64, ProductError>
where
    F: Fn(&VarStore) -> Result<f64, ProductError>,
{
    let limits = vars
        .iter()
        .map(|var| {
            let (lo, hi) = env.bounds(var, range)?;
            Ok((var.to_string(), lo, hi))
        })
        .collect::<Result<Vec<Limits>, ProductError>>()?;
    let quad = GaussLegendre::new(degree).map_err(|e| {
        ProductError::NumericIntegration(format!(
            "Failed to create Gauss-Legendre quadrature: {:?}",
            e
        ))
    })?;
    debug!(
        "Gauss-Legendre quadrature of degree {} over {} ({} evaluations)",
        degree,
        vars,
        degree.saturating_pow(limits.len() as u32)
    );

    let failure = RefCell::new(None);
    let result = nested(&f, &limits, env, &quad, &failure);
    if let Some(e) = failure.into_inner() {
        return Err(e);
    }
    if !result.is_finite() {
        return Err(ProductError::NumericIntegration(format!(
            "non-finite result {} over {}",
            result, vars
        )));
    }
    Ok(result)
}
