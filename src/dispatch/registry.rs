use std::collections::BTreeMap;

use crate::{
    launch::error::{LaunchError, configuration_error},
    predicates::types::ViewPredicate,
};

/// Name → predicate table consulted while the dispatch table is built.
#[derive(Debug, Clone, Default)]
pub struct PredicateRegistry {
    by_name: BTreeMap<String, ViewPredicate>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_predicates() -> Result<Self, LaunchError> {
        let mut registry = Self::new();
        for predicate in ViewPredicate::BUILTIN {
            registry.register(predicate.name(), predicate)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, name: &str, predicate: ViewPredicate) -> Result<(), LaunchError> {
        if name.trim().is_empty() {
            return Err(configuration_error("view predicate name cannot be empty"));
        }

        match self.by_name.get(name) {
            Some(existing) if *existing == predicate => Ok(()),
            Some(existing) => Err(configuration_error(format!(
                "view predicate '{name}' is already registered as '{}'",
                existing.name()
            ))),
            None => {
                self.by_name.insert(name.to_string(), predicate);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Result<ViewPredicate, LaunchError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| configuration_error(format!("unknown view predicate '{name}'")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
