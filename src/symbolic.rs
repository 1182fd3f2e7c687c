#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// # Symbolic engine
/// expression tree used to describe product terms: dependency queries, substitution,
/// evaluation against a map of variable values
///# Example#
/// ```
/// use RustedProduct::symbolic::symbolic_engine::Expr;
/// use std::collections::HashMap;
/// let x = Expr::Var("x".to_string());
/// let y = Expr::Var("y".to_string());
/// let f = x.clone() * y.clone() + x.exp();
/// assert!(f.contains_variable("x"));
/// assert_eq!(f.extract_variables(), vec!["x".to_string(), "y".to_string()]);
/// let values = HashMap::from([("x".to_string(), 0.0), ("y".to_string(), 2.0)]);
/// assert_eq!(f.eval_map(&values).unwrap(), 1.0);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
///________________________________________________________________________________________________________________________________________________
/// analytic (indefinite and definite) integration of symbolic expressions
/// Example#
/// ```
/// use RustedProduct::symbolic::symbolic_engine::Expr;
/// use std::collections::HashMap;
/// let x = Expr::Var("x".to_string());
/// let f = x.clone() * x;
/// let area = f
///     .definite_integral_expr("x", &Expr::Const(0.0), &Expr::Const(3.0))
///     .unwrap();
/// assert!((area.eval_map(&HashMap::new()).unwrap() - 9.0).abs() < 1e-12);
/// ```
pub mod symbolic_integration;
/// sparse multivariate polynomials, the fallback of symbolic integration
pub mod polynomial;
