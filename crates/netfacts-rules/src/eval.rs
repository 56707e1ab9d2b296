//! Expression evaluation with the engine's recovery policy applied

use netfacts_core::value::{coerce_native, render, type_name};
use netfacts_core::{Diagnostics, ExpressionError, ExpressionResolver, Map, Scope, Value};
use serde_json::json;

use crate::config::EngineConfig;
use crate::error::{DirectiveError, Location};

/// Wraps an `ExpressionResolver` with the run's policies.
///
/// Undefined paths become null plus a warning unless `strict` is set;
/// syntax errors are always fatal.
pub(crate) struct Evaluator<'e> {
    resolver: &'e dyn ExpressionResolver,
    config: &'e EngineConfig,
    diagnostics: Diagnostics,
}

impl<'e> Evaluator<'e> {
    pub(crate) fn new(resolver: &'e dyn ExpressionResolver, config: &'e EngineConfig) -> Self {
        Self {
            resolver,
            config,
            diagnostics: Diagnostics::new(),
        }
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        self.config
    }

    pub(crate) fn warn(&mut self, location: &Location, message: impl std::fmt::Display) {
        self.diagnostics.warn(format!("{}: {}", location, message));
    }

    /// Record a message that already names its directive
    pub(crate) fn warn_message(&mut self, message: impl Into<String>) {
        self.diagnostics.warn(message);
    }

    pub(crate) fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn recover(
        &mut self,
        result: Result<Value, ExpressionError>,
        location: &Location,
    ) -> Result<Value, DirectiveError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) if err.is_undefined() && !self.config.strict => {
                self.warn(location, format!("{}, using null", err));
                Ok(Value::Null)
            }
            Err(source) => Err(DirectiveError::Expression {
                location: location.clone(),
                source,
            }),
        }
    }

    /// Resolve a template string to its native value
    pub(crate) fn resolve(&mut self, text: &str, scope: &Scope, location: &Location) -> Result<Value, DirectiveError> {
        let result = self.resolver.resolve(text, scope);
        self.recover(result, location)
    }

    /// Resolve an expression that may omit its braces
    pub(crate) fn resolve_bare(&mut self, text: &str, scope: &Scope, location: &Location) -> Result<Value, DirectiveError> {
        let result = self.resolver.resolve_bare(text, scope);
        self.recover(result, location)
    }

    /// Resolve a template string and render it as text
    pub(crate) fn resolve_text(&mut self, text: &str, scope: &Scope, location: &Location) -> Result<String, DirectiveError> {
        self.resolve(text, scope, location).map(|value| render(&value))
    }

    /// Resolve a mapping key; keys without placeholders are used verbatim
    pub(crate) fn resolve_key(&mut self, key: &str, scope: &Scope, location: &Location) -> Result<String, DirectiveError> {
        if key.contains("{{") {
            self.resolve_text(key, scope, location)
        } else {
            Ok(key.to_string())
        }
    }

    /// Resolve every string leaf of a literal tree
    pub(crate) fn resolve_tree(&mut self, value: &Value, scope: &Scope, location: &Location) -> Result<Value, DirectiveError> {
        match value {
            Value::String(text) => {
                let resolved = self.resolve(text, scope, location)?;
                if self.config.coerce_native && text.contains("{{") {
                    Ok(coerce_native(resolved))
                } else {
                    Ok(resolved)
                }
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_tree(item, scope, location))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut resolved = Map::new();
                for (key, item) in map {
                    let key = self.resolve_key(key, scope, location)?;
                    let item = self.resolve_tree(item, scope, location)?;
                    resolved.insert(key, item);
                }
                Ok(Value::Object(resolved))
            }
            other => Ok(other.clone()),
        }
    }

    /// Evaluate a `when` condition
    pub(crate) fn condition(&mut self, condition: &str, scope: &Scope, location: &Location) -> Result<bool, DirectiveError> {
        self.resolver
            .evaluate_condition(condition, scope)
            .map_err(|source| DirectiveError::Expression {
                location: location.clone(),
                source,
            })
    }

    /// Resolve a loop source into the values to iterate.
    ///
    /// Sequences iterate their elements and mappings iterate `{key, value}`
    /// pairs in insertion order. Null iterates nothing, with a warning.
    pub(crate) fn iteration_items(&mut self, source: &Value, scope: &Scope, location: &Location) -> Result<Vec<Value>, DirectiveError> {
        let resolved = match source {
            Value::String(expression) => self.resolve_bare(expression, scope, location)?,
            literal => self.resolve_tree(literal, scope, location)?,
        };

        match resolved {
            Value::Array(items) => Ok(items),
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(key, value)| json!({"key": key, "value": value}))
                .collect()),
            Value::Null => {
                self.warn(location, "loop resolved to null, nothing to iterate");
                Ok(Vec::new())
            }
            other => Err(DirectiveError::schema(
                location,
                format!("loop must resolve to a sequence or mapping, got {}", type_name(&other)),
            )),
        }
    }
}
