//! Expression resolver
//!
//! Resolves template strings and `when` conditions against a `Scope`.

use crate::error::ExpressionError;
use crate::expr::{CompareOp, Condition, Expr, Template, TemplatePart};
use crate::scope::Scope;
use crate::value::{is_truthy, loose_eq, render, Value};

/// Resolves expressions against a scope.
///
/// The engine only depends on this trait, so hosts can plug in a richer
/// expression language as long as it honours the same error contract:
/// `ExpressionError::Undefined` for missing paths, `Syntax` for malformed input.
pub trait ExpressionResolver {
    /// Resolve a template string (`"{{ a.b }}"`, `"x-{{ a }}"`, `"literal"`)
    fn resolve(&self, expression: &str, scope: &Scope) -> Result<Value, ExpressionError>;

    /// Evaluate a `when` condition. Undefined paths evaluate as false.
    fn evaluate_condition(&self, condition: &str, scope: &Scope) -> Result<bool, ExpressionError>;

    /// Resolve an expression that may be written without braces (`loop: sections`)
    fn resolve_bare(&self, expression: &str, scope: &Scope) -> Result<Value, ExpressionError> {
        if expression.contains("{{") {
            self.resolve(expression, scope)
        } else {
            self.resolve(&format!("{{{{ {} }}}}", expression), scope)
        }
    }
}

/// Default resolver: dotted-path and index lookups, literals, conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl PathResolver {
    pub fn new() -> Self {
        Self
    }

    fn eval_expr(&self, expr: &Expr, scope: &Scope) -> Result<Value, ExpressionError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Path(path) => scope
                .resolve_path(path)
                .cloned()
                .ok_or_else(|| ExpressionError::Undefined {
                    path: path.to_string(),
                }),
        }
    }

    /// Like `eval_expr`, but a missing path is just null
    fn eval_lenient(&self, expr: &Expr, scope: &Scope) -> Value {
        self.eval_expr(expr, scope).unwrap_or(Value::Null)
    }

    fn eval_condition(&self, condition: &Condition, scope: &Scope) -> bool {
        match condition {
            Condition::Expr(expr) => is_truthy(&self.eval_lenient(expr, scope)),
            Condition::Not(inner) => !self.eval_condition(inner, scope),
            Condition::Defined { path, negated } => {
                scope.resolve_path(path).is_some() != *negated
            }
            Condition::Compare { left, op, right } => {
                let equal = loose_eq(
                    &self.eval_lenient(left, scope),
                    &self.eval_lenient(right, scope),
                );
                match op {
                    CompareOp::Eq => equal,
                    CompareOp::Ne => !equal,
                }
            }
            Condition::And(parts) => parts.iter().all(|c| self.eval_condition(c, scope)),
            Condition::Or(parts) => parts.iter().any(|c| self.eval_condition(c, scope)),
        }
    }
}

impl ExpressionResolver for PathResolver {
    fn resolve(&self, expression: &str, scope: &Scope) -> Result<Value, ExpressionError> {
        match Template::parse(expression)? {
            Template::Literal(text) => Ok(Value::String(text)),
            Template::Single(expr) => self.eval_expr(&expr, scope),
            Template::Parts(parts) => {
                let mut out = String::new();
                for part in &parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Expr(expr) => {
                            out.push_str(&render(&self.eval_expr(expr, scope)?))
                        }
                    }
                }
                Ok(Value::String(out))
            }
        }
    }

    fn evaluate_condition(&self, condition: &str, scope: &Scope) -> Result<bool, ExpressionError> {
        let parsed = Condition::parse(condition)?;
        Ok(self.eval_condition(&parsed, scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> Scope {
        let mut scope = Scope::new();
        scope.set("hostname", json!("leaf01"));
        scope.set("mtu", json!({"matches": ["1500"]}));
        scope.set("enabled", json!(true));
        scope.set("empty", json!({"matches": []}));
        scope
    }

    #[test]
    fn test_resolve_literal_text() {
        let resolver = PathResolver::new();
        assert_eq!(resolver.resolve("X", &scope()).unwrap(), json!("X"));
    }

    #[test]
    fn test_resolve_single_keeps_native_value() {
        let resolver = PathResolver::new();
        assert_eq!(
            resolver.resolve("{{ mtu }}", &scope()).unwrap(),
            json!({"matches": ["1500"]})
        );
        assert_eq!(
            resolver.resolve("{{ mtu.matches[0] }}", &scope()).unwrap(),
            json!("1500")
        );
    }

    #[test]
    fn test_resolve_interpolation() {
        let resolver = PathResolver::new();
        assert_eq!(
            resolver
                .resolve("{{ hostname }}:{{ mtu.matches.0 }}", &scope())
                .unwrap(),
            json!("leaf01:1500")
        );
    }

    #[test]
    fn test_resolve_undefined_path() {
        let resolver = PathResolver::new();
        let err = resolver.resolve("{{ empty.matches[0] }}", &scope()).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::Undefined {
                path: "empty.matches[0]".into()
            }
        );
        assert!(err.is_undefined());
    }

    #[test]
    fn test_resolve_bare() {
        let resolver = PathResolver::new();
        assert_eq!(
            resolver.resolve_bare("mtu.matches", &scope()).unwrap(),
            json!(["1500"])
        );
        assert_eq!(
            resolver.resolve_bare("{{ hostname }}", &scope()).unwrap(),
            json!("leaf01")
        );
    }

    #[test]
    fn test_conditions() {
        let resolver = PathResolver::new();
        let scope = scope();
        let check = |c: &str| resolver.evaluate_condition(c, &scope).unwrap();

        assert!(check("enabled"));
        assert!(!check("not enabled"));
        assert!(check("mtu.matches"));
        assert!(!check("empty.matches"));
        assert!(!check("missing"));
        assert!(check("missing is not defined"));
        assert!(check("mtu.matches[0] == 1500"));
        assert!(check("hostname != 'spine01'"));
        assert!(check("enabled and hostname == \"leaf01\""));
        assert!(check("missing or enabled"));
    }

    #[test]
    fn test_condition_syntax_error() {
        let resolver = PathResolver::new();
        let err = resolver.evaluate_condition("a ==", &scope()).unwrap_err();
        assert!(matches!(err, ExpressionError::Syntax { .. }));
    }
}
