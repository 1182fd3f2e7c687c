//! examples of usage of RustedProduct
/// Product factorization and cached partial integrals examples
pub mod product_examples;
/// Symbolic operations examples
pub mod symbolic_examples;
