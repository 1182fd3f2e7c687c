#![allow(non_snake_case)]
use RustedProduct::Examples::product_examples::product_examples;
use RustedProduct::Examples::symbolic_examples::sym_examples;
use RustedProduct::product::config::ProductConfig;

fn main() {
    let example = 0;
    // settings and log level of the product demos
    let config = match ProductConfig::from_file("product.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("using default settings: {}", e);
            ProductConfig::default()
        }
    };
    match example {
        // products: factorized integrals, caching, fallbacks
        0..=5 => {
            if let Err(e) = product_examples(example, &config) {
                eprintln!("example {} failed: {}", example, e);
            }
        }
        // symbolic engine
        10..=12 => sym_examples(example % 10),
        _ => println!("no such example"),
    }
}
