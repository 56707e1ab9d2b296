//! Export collection
//!
//! Two mechanisms feed one export set: the `export_facts` directive and the
//! `export: true` flag on any registering directive. Each export owns its
//! top-level key; a later export of the same name replaces the earlier one.

use netfacts_core::{Map, Scope, Value};
use serde::Serialize;

use crate::config::ExportPolicy;
use crate::error::{DirectiveError, Location};
use crate::eval::Evaluator;

/// The facts produced by a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExportSet {
    facts: Map<String, Value>,
}

impl ExportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fact, returning the value it replaced
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.facts.insert(name.into(), value)
    }

    /// Merge facts key by key; incoming values win
    pub fn merge(&mut self, facts: Map<String, Value>) {
        for (name, value) in facts {
            self.facts.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.facts.get(name)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.facts.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.facts)
    }
}

/// Accumulates exports over a run
#[derive(Debug, Default)]
pub(crate) struct ExportCollector {
    set: ExportSet,
}

impl ExportCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Run an `export_facts` directive: resolve every entry once and merge.
    ///
    /// Returns the resolved mapping so it can also be registered.
    pub(crate) fn export_facts(
        &mut self,
        eval: &mut Evaluator<'_>,
        facts: &Map<String, Value>,
        scope: &Scope,
        location: &Location,
    ) -> Result<Value, DirectiveError> {
        let mut resolved = Map::new();
        for (key, expression) in facts {
            let key = eval.resolve_key(key, scope, location)?;
            let value = eval.resolve_tree(expression, scope, location)?;
            resolved.insert(key, value);
        }
        tracing::debug!(count = resolved.len(), "{}: exporting facts", location);
        self.set.merge(resolved.clone());
        Ok(Value::Object(resolved))
    }

    /// Handle `export: true` on a directive that has produced `result`
    pub(crate) fn export_registered(
        &mut self,
        eval: &mut Evaluator<'_>,
        register: Option<&str>,
        result: &Value,
        location: &Location,
    ) -> Result<(), DirectiveError> {
        match register {
            Some(name) => {
                tracing::debug!("{}: exporting '{}'", location, name);
                self.set.insert(name, result.clone());
                Ok(())
            }
            None => {
                let message = "export requested without a register name";
                match eval.config().export_policy {
                    ExportPolicy::Warn => {
                        eval.warn(location, message);
                        Ok(())
                    }
                    ExportPolicy::Error => Err(DirectiveError::Export {
                        location: location.clone(),
                        message: message.to_string(),
                    }),
                }
            }
        }
    }

    pub(crate) fn finish(self) -> ExportSet {
        self.set
    }
}
