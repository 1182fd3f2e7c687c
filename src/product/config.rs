//! Settings of a product: cache capacity, numeric integration switch, quadrature degree
//! and log level. Can be read from a TOML file:
//!
//! ```toml
//! [product]
//! cache_size = 10
//! force_numeric = false
//! quadrature_degree = 32
//! log_level = "info"
//! ```
//! The `[product]` header is optional; keys may also sit at the top level.

use crate::product::error::ProductError;
use log::{LevelFilter, warn};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductConfig {
    /// maximal number of live cache entries
    pub cache_size: usize,
    /// skip the analytic paths of `Product::integral`
    pub force_numeric: bool,
    /// Gauss-Legendre nodes per integration variable
    pub quadrature_degree: usize,
    pub log_level: LevelFilter,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            cache_size: 10,
            force_numeric: false,
            quadrature_degree: 32,
            log_level: LevelFilter::Info,
        }
    }
}

/// Any `log::LevelFilter` name, case-insensitive; "none" is accepted for "off".
pub fn parse_log_level(level: &str) -> Result<LevelFilter, ProductError> {
    let level = level.trim();
    if level.eq_ignore_ascii_case("none") {
        return Ok(LevelFilter::Off);
    }
    LevelFilter::from_str(level).map_err(|_| {
        ProductError::Config(format!(
            "log_level must be trace, debug, info, warn, error or off, got {}",
            level
        ))
    })
}

impl ProductConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cache_size(&mut self, cache_size: usize) -> &mut Self {
        self.cache_size = cache_size;
        self
    }

    pub fn set_force_numeric(&mut self, force_numeric: bool) -> &mut Self {
        self.force_numeric = force_numeric;
        self
    }

    pub fn set_quadrature_degree(&mut self, degree: usize) -> &mut Self {
        self.quadrature_degree = degree;
        self
    }

    pub fn set_log_level(&mut self, level: LevelFilter) -> &mut Self {
        self.log_level = level;
        self
    }

    pub fn validate(&self) -> Result<(), ProductError> {
        if self.cache_size == 0 {
            return Err(ProductError::Config("cache_size must be at least 1".to_string()));
        }
        if self.quadrature_degree < 2 {
            return Err(ProductError::Config(
                "quadrature_degree must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ProductError> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| ProductError::Config(e.to_string()))?;
        let section = match table.get("product") {
            Some(toml::Value::Table(section)) => section.clone(),
            Some(_) => {
                return Err(ProductError::Config(
                    "[product] must be a table".to_string(),
                ));
            }
            None => table,
        };

        let mut config = Self::default();
        for (key, value) in section.iter() {
            match (key.as_str(), value) {
                ("cache_size", toml::Value::Integer(n)) => {
                    config.cache_size = usize::try_from(*n).map_err(|_| {
                        ProductError::Config(format!("cache_size must be positive, got {}", n))
                    })?;
                }
                ("quadrature_degree", toml::Value::Integer(n)) => {
                    config.quadrature_degree = usize::try_from(*n).map_err(|_| {
                        ProductError::Config(format!(
                            "quadrature_degree must be positive, got {}",
                            n
                        ))
                    })?;
                }
                ("force_numeric", toml::Value::Boolean(flag)) => config.force_numeric = *flag,
                ("log_level", toml::Value::String(level)) => {
                    config.log_level = parse_log_level(level)?;
                }
                ("cache_size" | "quadrature_degree" | "force_numeric" | "log_level", other) => {
                    return Err(ProductError::Config(format!(
                        "unexpected value type for {}: {}",
                        key,
                        other.type_str()
                    )));
                }
                _ => warn!("ignoring unknown configuration key {}", key),
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProductError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ProductError::Config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProductConfig::default();
        assert_eq!(config.cache_size, 10);
        assert!(!config.force_numeric);
        assert_eq!(config.quadrature_degree, 32);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_setters_chain() {
        let mut config = ProductConfig::new();
        config
            .set_cache_size(3)
            .set_force_numeric(true)
            .set_quadrature_degree(8)
            .set_log_level(LevelFilter::Warn);
        assert_eq!(config.cache_size, 3);
        assert!(config.force_numeric);
        assert_eq!(config.quadrature_degree, 8);
        assert_eq!(config.log_level, LevelFilter::Warn);
    }

    #[test]
    fn test_parse_product_section() {
        let text = r#"
            [product]
            cache_size = 4
            force_numeric = true
            quadrature_degree = 16
            log_level = "debug"
            colour = "blue"
        "#;
        let config = ProductConfig::from_toml_str(text).unwrap();
        assert_eq!(config.cache_size, 4);
        assert!(config.force_numeric);
        assert_eq!(config.quadrature_degree, 16);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_parse_top_level_keys_and_defaults() {
        let config = ProductConfig::from_toml_str("log_level = \"none\"").unwrap();
        assert_eq!(config.log_level, LevelFilter::Off);
        assert_eq!(config.cache_size, 10);
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(parse_log_level("TRACE").unwrap(), LevelFilter::Trace);
        assert_eq!(parse_log_level(" Warn ").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_log_level("off").unwrap(), LevelFilter::Off);
        assert_eq!(parse_log_level("None").unwrap(), LevelFilter::Off);
        assert!(matches!(parse_log_level(""), Err(ProductError::Config(_))));
    }

    #[test]
    fn test_invalid_configurations() {
        for text in [
            "cache_size = 0",
            "cache_size = -3",
            "quadrature_degree = 1",
            "force_numeric = \"yes\"",
            "log_level = \"loud\"",
            "product = 5",
            "cache_size = ",
        ] {
            let err = ProductConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ProductError::Config(_)), "{}", text);
        }
    }

    #[test]
    fn test_missing_file() {
        let err = ProductConfig::from_file("/nonexistent/product.toml").unwrap_err();
        assert!(matches!(err, ProductError::Config(_)));
    }
}
