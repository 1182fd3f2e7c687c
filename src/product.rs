//!
//! # product - factorized integration of products of terms
//!
//! A `Product` multiplies real-valued terms and category terms. Integrating it over a set
//! of variables splits the real terms into groups that share no integration variable, so
//! each group is integrated on its own and the integral of the product is the product of
//! the partial integrals. The partial-integral lists are cached per
//! (integration variables, range) and addressed by integer codes.
//!
//! ## Module Structure
//! - `terms`: the term contracts (`RealTerm`, `CategoryTerm`) and the concrete terms
//! - `variables`: variable sets and the store of values, domains and named ranges
//! - `range_names`: interned range names
//! - `grouping`: partition of terms by shared integration variables
//! - `partial_integrals`: sub-products and partial integrals of the groups
//! - `integral_cache`: slots of partial-integral lists with sterilization and revival
//! - `product_main`: the product, its integral codes and integration paths
//! - `numeric`: Gauss-Legendre fallback
//! - `config`: settings, TOML loading
//! - `error`: error type
//!
pub mod config;
pub mod error;
pub mod grouping;
pub mod integral_cache;
pub mod numeric;
pub mod partial_integrals;
/// the product and its factorized integrals
pub mod product_main;
pub mod range_names;
pub mod terms;
pub mod variables;
