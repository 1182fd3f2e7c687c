#![allow(non_snake_case)]

use crate::symbolic::polynomial::Polynomial;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbols;
use std::collections::HashMap;

#[allow(dead_code)]
pub fn sym_examples(example: usize) {
    let (x, y, a) = symbols!(x, y, a);
    match example {
        0 => {
            // BUILD AND EVALUATE an expression of several variables
            let f = a.clone() * x.clone() * y.clone() + x.clone().exp();
            println!("f = {}", f);
            println!("variables {:?}", f.extract_variables());
            println!("depends on y: {}, on z: {}", f.contains_variable("y"), f.contains_variable("z"));
            let values = HashMap::from([
                ("x".to_string(), 0.0),
                ("y".to_string(), 2.0),
                ("a".to_string(), 3.0),
            ]);
            match f.eval_map(&values) {
                Ok(value) => println!("f(0, 2; a = 3) = {}", value),
                Err(e) => println!("evaluation failed: {}", e),
            }
            // substitution keeps the rest of the tree
            let g = f.substitute_variable("x", &(y.clone() * Expr::Const(2.0))).simplify();
            println!("f(x -> 2y) = {}", g);
        }
        1 => {
            // INDEFINITE AND DEFINITE INTEGRALS
            for f in [
                x.clone() * x.clone() * a.clone(),
                (Expr::Const(2.0) * x.clone() + Expr::Const(1.0)).exp(),
                x.clone() * x.clone().exp(),
                Expr::Const(1.0) / (x.clone() + Expr::Const(3.0)),
                (-(x.clone() * x.clone())).exp(),
            ] {
                match f.integrate("x") {
                    Ok(antiderivative) => println!("∫ {} dx = {}", f, antiderivative),
                    Err(e) => println!("∫ {} dx: {}", f, e),
                }
            }
            let area = (x.clone() * y.clone())
                .definite_integral_expr("x", &Expr::Const(0.0), &Expr::Const(1.0));
            match area {
                Ok(area) => println!("∫_0^1 x*y dx = {}", area),
                Err(e) => println!("{}", e),
            }
        }
        2 => {
            // POLYNOMIALS: the fallback of symbolic integration
            let p = (x.clone() + y.clone()) * (x.clone() - y.clone());
            if let Some(poly) = Polynomial::from_expr(&p) {
                println!("{} = {}", p, poly.to_expr());
                println!("degree in x: {}", poly.degree_in("x"));
                println!("d/dx = {}", poly.derivative("x").to_expr());
                println!("∫ dy = {}", poly.integrate("y").to_expr());
            }
        }
        _ => println!("no such example"),
    }
}
