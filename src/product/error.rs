use std::fmt;

/// Error types of the factorization engine.
///
/// `InvalidInput`, `UnknownVariable` and `Config` are caller mistakes. `GroupingInconsistent`,
/// `IntegralUnsupported`, `InvariantViolation`, `UnknownCode` and `CacheCorruption` are fatal:
/// a term broke its contract or the cache is corrupted, and the current request is aborted.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductError {
    InvalidInput(String),
    UnknownVariable(String),
    GroupingInconsistent {
        expected_vars: usize,
        found_vars: usize,
        expected_terms: usize,
        found_terms: usize,
    },
    IntegralUnsupported { term: String, vars: String },
    InvariantViolation(String),
    UnknownCode(usize),
    CacheCorruption { requested: usize, revived: usize },
    NumericIntegration(String),
    Config(String),
}

impl fmt::Display for ProductError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProductError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ProductError::UnknownVariable(name) => write!(f, "Unknown variable: {}", name),
            ProductError::GroupingInconsistent {
                expected_vars,
                found_vars,
                expected_terms,
                found_terms,
            } => write!(
                f,
                "Inconsistent term grouping: {} of {} integration variables and {} of {} terms assigned",
                found_vars, expected_vars, found_terms, expected_terms
            ),
            ProductError::IntegralUnsupported { term, vars } => {
                write!(f, "Term {} cannot be integrated analytically over {}", term, vars)
            }
            ProductError::InvariantViolation(msg) => write!(f, "Invariant violated: {}", msg),
            ProductError::UnknownCode(code) => write!(f, "Unknown integral code {}", code),
            ProductError::CacheCorruption { requested, revived } => write!(
                f,
                "Cache revival of code {} landed in code {}",
                requested, revived
            ),
            ProductError::NumericIntegration(msg) => write!(f, "Numerical integration failed: {}", msg),
            ProductError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ProductError {}
