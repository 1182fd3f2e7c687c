//! Interned names of integration ranges.
//!
//! Cache keys carry a `RangeName` token instead of the range string, so two requests for
//! the textually equal range compare equal by token. The registry is process-wide and
//! only ever grows.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// Token of an interned range name: its position in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeName(usize);

/// string <-> token table
#[derive(Debug, Default)]
pub struct NameRegistry {
    tokens: HashMap<String, RangeName>,
    names: Vec<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> RangeName {
        if let Some(token) = self.tokens.get(name) {
            return *token;
        }
        let token = RangeName(self.names.len());
        self.names.push(name.to_string());
        self.tokens.insert(name.to_string(), token);
        token
    }

    pub fn lookup(&self, name: &str) -> Option<RangeName> {
        self.tokens.get(name).copied()
    }

    pub fn name_of(&self, token: RangeName) -> Option<&str> {
        self.names.get(token.0).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn global_registry() -> &'static Mutex<NameRegistry> {
    static REGISTRY: OnceLock<Mutex<NameRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(NameRegistry::new()))
}

impl RangeName {
    /// Interns `name` in the process-wide registry.
    pub fn intern(name: &str) -> RangeName {
        let mut registry = global_registry()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry.intern(name)
    }

    /// Interns an optional name; `None` (no range) stays `None`.
    pub fn intern_opt(name: Option<&str>) -> Option<RangeName> {
        name.map(RangeName::intern)
    }

    pub fn name(&self) -> String {
        let registry = global_registry()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry.name_of(*self).unwrap_or("<unregistered>").to_string()
    }
}

impl fmt::Display for RangeName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
