#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
pub mod Examples;
pub mod Utils;
/// factorization of products of terms and cached partial integrals
pub mod product;
/// symbolic expressions and their analytic integration
pub mod symbolic;
