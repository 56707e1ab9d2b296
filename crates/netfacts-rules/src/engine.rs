//! The directive driver
//!
//! Walks a document in order. Per directive: evaluate `when`, expand `loop`,
//! dispatch on the kind, bind `register`, then forward to the export
//! collector when `export: true`. A run either returns the complete export
//! set with its warnings or fails with the first fatal error.

use netfacts_core::{ExpressionResolver, Map, PathResolver, Scope, Value};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{DirectiveError, Location};
use crate::eval::Evaluator;
use crate::export::{ExportCollector, ExportSet};
use crate::schema::{Directive, DirectiveKind, Document};
use crate::template::TemplateBuilder;

/// Variable holding the text a run was given
pub const CONTENT_VAR: &str = "content";

/// Variable bound to the current element inside a `loop`
pub const ITEM_VAR: &str = "item";

/// What a successful run produces
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOutput {
    pub facts: ExportSet,
    pub warnings: Vec<String>,
}

/// Runs directive documents against device output.
///
/// An engine is immutable; every run owns its scope and export set, so one
/// engine can serve any number of runs.
pub struct Engine {
    config: EngineConfig,
    resolver: Box<dyn ExpressionResolver + Send + Sync>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            resolver: Box::new(PathResolver::new()),
        }
    }

    /// Replace the default path resolver
    pub fn with_resolver(mut self, resolver: impl ExpressionResolver + Send + Sync + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one document against `content`
    pub fn execute(
        &self,
        document: &Document,
        content: &str,
        seed_vars: &Map<String, Value>,
    ) -> Result<RunOutput, DirectiveError> {
        self.execute_all(std::slice::from_ref(document), content, seed_vars)
    }

    /// Run several documents against the same `content`.
    ///
    /// Each document gets a fresh scope; all of them feed one export set.
    pub fn execute_all(
        &self,
        documents: &[Document],
        content: &str,
        seed_vars: &Map<String, Value>,
    ) -> Result<RunOutput, DirectiveError> {
        let mut run = Run {
            config: &self.config,
            eval: Evaluator::new(&*self.resolver, &self.config),
            exports: ExportCollector::new(),
        };

        for document in documents {
            match document.origin() {
                Some(origin) => tracing::debug!("running {} directives from {}", document.len(), origin.display()),
                None => tracing::debug!("running {} directives", document.len()),
            }

            let mut scope = Scope::with_vars(seed_vars.clone());
            scope.set(CONTENT_VAR, Value::String(content.to_string()));
            run.directives(document.directives(), &Location::root(), &mut scope)?;
        }

        Ok(RunOutput {
            facts: run.exports.finish(),
            warnings: run.eval.into_diagnostics().into_warnings(),
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish_non_exhaustive()
    }
}

/// State of one run
struct Run<'e> {
    config: &'e EngineConfig,
    eval: Evaluator<'e>,
    exports: ExportCollector,
}

impl Run<'_> {
    /// Execute a directive list, returning what its directives registered
    fn directives(
        &mut self,
        directives: &[Directive],
        parent: &Location,
        scope: &mut Scope,
    ) -> Result<Map<String, Value>, DirectiveError> {
        let mut registered = Map::new();

        for (index, directive) in directives.iter().enumerate() {
            let location = parent.child(index, directive.name.as_deref());
            match self.directive(directive, &location, scope) {
                Ok(Some(result)) => {
                    if let Some(name) = &directive.register {
                        scope.set(name.as_str(), result.clone());
                        registered.insert(name.clone(), result);
                    }
                }
                Ok(None) => {}
                Err(err) if self.config.continue_on_error => {
                    self.eval.warn_message(format!("{}; continuing", err));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(registered)
    }

    /// Execute one directive; `None` means it was skipped by `when`
    fn directive(
        &mut self,
        directive: &Directive,
        location: &Location,
        scope: &mut Scope,
    ) -> Result<Option<Value>, DirectiveError> {
        if let Some(condition) = &directive.when {
            if !self.eval.condition(condition, scope, location)? {
                tracing::debug!("{}: skipped, condition '{}' is false", location, condition);
                return Ok(None);
            }
        }

        tracing::debug!("{}: running {}", location, directive.kind.keyword());

        let result = match &directive.loop_over {
            None => self.body(&directive.kind, location, scope, None)?,
            Some(source) => {
                let items = self.eval.iteration_items(source, scope, location)?;
                let mut results = Vec::with_capacity(items.len());
                for item in items {
                    scope.push_frame();
                    scope.set(ITEM_VAR, item.clone());
                    let result = self.body(&directive.kind, location, scope, Some(&item));
                    scope.pop_frame();
                    results.push(result?);
                }
                Value::Array(results)
            }
        };

        if directive.export {
            self.exports
                .export_registered(&mut self.eval, directive.register.as_deref(), &result, location)?;
        }

        Ok(Some(result))
    }

    /// Dispatch on the directive kind for one iteration
    fn body(
        &mut self,
        kind: &DirectiveKind,
        location: &Location,
        scope: &mut Scope,
        item: Option<&Value>,
    ) -> Result<Value, DirectiveError> {
        match kind {
            DirectiveKind::PatternMatch(matcher) => {
                let content = self.eval.resolve_text(matcher.content_expression(), scope, location)?;
                Ok(matcher.run(&content, self.config.section_trailing))
            }
            DirectiveKind::PatternGroup(body) => {
                scope.push_frame();
                if let Some(Value::String(text)) = item {
                    scope.set(CONTENT_VAR, Value::String(text.clone()));
                }
                let result = self.directives(body, location, scope);
                scope.pop_frame();
                result.map(Value::Object)
            }
            DirectiveKind::JsonTemplate(args) => {
                TemplateBuilder::new(&mut self.eval, location).build(&args.template, scope)
            }
            DirectiveKind::ExportFacts(facts) => self.exports.export_facts(&mut self.eval, facts, scope, location),
        }
    }
}
