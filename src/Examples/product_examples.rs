#![allow(non_snake_case)]

use crate::Utils::logger::init_logger;
use crate::product::config::ProductConfig;
use crate::product::error::ProductError;
use crate::product::product_main::{Product, ProductArg};
use crate::product::terms::{Category, FormulaTerm, RealTerm};
use crate::product::variables::{VarSet, VarStore};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbols;
use std::rc::Rc;

fn demo_store() -> Result<VarStore, ProductError> {
    let mut env = VarStore::new();
    env.add_real("x", 0.5, 0.0, 1.0)?;
    env.add_real("y", 1.0, 0.0, 2.0)?;
    env.add_real("z", 2.0, 0.0, 3.0)?;
    env.add_real("mu", 1.5, 0.0, 5.0)?;
    env.add_category("channel", &[("electron", 1), ("muon", 2)], "muon")?;
    env.set_range("x", "signal", 0.25, 0.75)?;
    Ok(env)
}

/// Runs demo `example` with products built from `config`; logging follows
/// `config.log_level`.
#[allow(dead_code)]
pub fn product_examples(example: usize, config: &ProductConfig) -> Result<(), ProductError> {
    init_logger(config.log_level, None);
    let mut env = demo_store()?;
    let (x, y, z, mu) = symbols!(x, y, z, mu);
    match example {
        0 => {
            // SEPARABLE PRODUCT: f(x) * g(y) * h(z) integrated over x and y
            let prod = Product::with_config(
                "fgh",
                vec![
                    ProductArg::real(FormulaTerm::new("f", mu.clone() * x.clone())),
                    ProductArg::real(FormulaTerm::new("g", y.clone() * y.clone())),
                    ProductArg::real(FormulaTerm::new("h", z.clone().exp())),
                ],
                config.clone(),
            )?;
            println!("value = {}", prod.evaluate(&env)?);
            let int_vars = VarSet::from_names(["x", "y"]);
            let (code, claimed) = prod.analytical_integral_code(&int_vars, None)?;
            println!("integral code {} claims {}", code, claimed);
            println!("cached list: {:?}", prod.cached_term_names(code));
            println!("integral = {}", prod.analytical_integral(code, &env)?);
            // the same list is reused when only the values change
            env.set_value("z", 1.0)?;
            println!("integral at z = 1: {}", prod.analytical_integral(code, &env)?);
            let (signal, method) = prod.integral_with_method(&int_vars, Some("signal"), &env)?;
            println!("integral over signal range = {} ({})", signal, method);
        }
        1 => {
            // SHARED VARIABLES: h(x,y) links f(x) and g(y), no factorization is possible
            let prod = Product::with_config(
                "linked",
                vec![
                    ProductArg::real(FormulaTerm::new("f", x.clone())),
                    ProductArg::real(FormulaTerm::new("g", y.clone())),
                    ProductArg::real(FormulaTerm::new("h", x.clone() + y.clone())),
                ],
                config.clone(),
            )?;
            let int_vars = VarSet::from_names(["x", "y"]);
            let (code, _) = prod.analytical_integral_code(&int_vars, None)?;
            println!("integral code {} (0 = not factorizable)", code);
            let (value, method) = prod.integral_with_method(&int_vars, None, &env)?;
            println!("integral = {} via {}", value, method);
        }
        2 => {
            // CATEGORY TERMS contribute their index
            let prod = Product::with_config(
                "weighted",
                vec![
                    ProductArg::real(FormulaTerm::new("w", Expr::Const(2.5))),
                    ProductArg::category(Category::new("channel")),
                ],
                config.clone(),
            )?;
            println!("muon: {}", prod.evaluate(&env)?);
            env.set_label("channel", "electron")?;
            println!("electron: {}", prod.evaluate(&env)?);
        }
        3 => {
            // CACHE PRESSURE: entries are sterilized and revived transparently
            let mut config = config.clone();
            config.set_cache_size(1);
            let prod = Product::with_config(
                "fg",
                vec![
                    ProductArg::real(FormulaTerm::new("f", x.clone())),
                    ProductArg::real(FormulaTerm::new("g", y.clone())),
                ],
                config,
            )?;
            let (code_x, _) = prod.analytical_integral_code(&VarSet::from_names(["x"]), None)?;
            let (code_y, _) = prod.analytical_integral_code(&VarSet::from_names(["y"]), None)?;
            println!(
                "codes {} and {}, live: {} {}",
                code_x,
                code_y,
                prod.is_cached(code_x),
                prod.is_cached(code_y)
            );
            println!("revived integral over x = {}", prod.analytical_integral(code_x, &env)?);
            prod.sterilize_cache();
            println!("after sterilize_cache: {} live entries", prod.cache_len());
            println!("integral over y = {}", prod.analytical_integral(code_y, &env)?);
        }
        4 => {
            // NUMERIC FALLBACK: a gaussian has no closed form in this engine
            let gauss = (-(x.clone() * x.clone())).exp();
            let prod = Product::with_config(
                "gauss_y",
                vec![
                    ProductArg::real(FormulaTerm::new("gauss", gauss)),
                    ProductArg::real(FormulaTerm::new("g", y.clone())),
                ],
                config.clone(),
            )?;
            let (value, method) =
                prod.integral_with_method(&VarSet::from_names(["x", "y"]), None, &env)?;
            println!("integral = {} via {}", value, method);
        }
        5 => {
            // HAND-WRITTEN ANTIDERIVATIVE and products nested in products
            let f = FormulaTerm::new("f", x.clone().exp())
                .with_antiderivative("x", x.clone().exp());
            let inner: Rc<dyn RealTerm> = Rc::new(Product::with_config(
                "inner",
                vec![ProductArg::real(f), ProductArg::real(FormulaTerm::new("g", y.clone()))],
                config.clone(),
            )?);
            let outer = Product::with_config(
                "outer",
                vec![ProductArg::Real(inner), ProductArg::real(FormulaTerm::new("k", z.clone()))],
                config.clone(),
            )?;
            let int_vars = VarSet::from_names(["x", "y", "z"]);
            let (code, _) = outer.analytical_integral_code(&int_vars, None)?;
            println!("cached list: {:?}", outer.cached_term_names(code));
            println!("integral = {}", outer.analytical_integral(code, &env)?);
        }
        _ => println!("no such example"),
    }
    Ok(())
}
