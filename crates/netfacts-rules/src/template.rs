//! `json_template` evaluation

use netfacts_core::{Map, Scope, Value};

use crate::error::{DirectiveError, Location};
use crate::eval::Evaluator;
use crate::schema::{NodeBody, Repeat, TemplateNode};

/// Builds a value tree from template nodes against the current scope
pub(crate) struct TemplateBuilder<'a, 'e> {
    eval: &'a mut Evaluator<'e>,
    location: &'a Location,
}

impl<'a, 'e> TemplateBuilder<'a, 'e> {
    pub(crate) fn new(eval: &'a mut Evaluator<'e>, location: &'a Location) -> Self {
        Self { eval, location }
    }

    /// Build one object from a node list
    pub(crate) fn build(&mut self, nodes: &[TemplateNode], scope: &mut Scope) -> Result<Value, DirectiveError> {
        self.build_object(nodes, scope).map(Value::Object)
    }

    fn build_object(&mut self, nodes: &[TemplateNode], scope: &mut Scope) -> Result<Map<String, Value>, DirectiveError> {
        let mut object = Map::new();
        for node in nodes {
            if let Some(condition) = &node.when {
                if !self.eval.condition(condition, scope, self.location)? {
                    tracing::trace!("{}: template key '{}' skipped", self.location, node.key);
                    continue;
                }
            }

            let key = self.eval.resolve_key(&node.key, scope, self.location)?;
            let value = match &node.body {
                NodeBody::Value(value) => self.eval.resolve_tree(value, scope, self.location)?,
                NodeBody::Object { nodes, repeat: None } => self.build(nodes, scope)?,
                NodeBody::Object {
                    nodes,
                    repeat: Some(repeat),
                } => {
                    let mut merged = Map::new();
                    for item in self.repeat(nodes, repeat, scope)? {
                        merged.extend(item);
                    }
                    Value::Object(merged)
                }
                NodeBody::Elements { nodes, repeat: None } => Value::Array(vec![self.build(nodes, scope)?]),
                NodeBody::Elements {
                    nodes,
                    repeat: Some(repeat),
                } => Value::Array(
                    self.repeat(nodes, repeat, scope)?
                        .into_iter()
                        .map(Value::Object)
                        .collect(),
                ),
            };
            object.insert(key, value);
        }
        Ok(object)
    }

    /// Build `nodes` once per element of `repeat.over`, with the element
    /// bound to `repeat.var` in a frame of its own
    fn repeat(
        &mut self,
        nodes: &[TemplateNode],
        repeat: &Repeat,
        scope: &mut Scope,
    ) -> Result<Vec<Map<String, Value>>, DirectiveError> {
        let source = Value::String(repeat.over.clone());
        let items = self.eval.iteration_items(&source, scope, self.location)?;

        let mut built = Vec::with_capacity(items.len());
        for item in items {
            scope.push_frame();
            scope.set(&repeat.var, item);
            let result = self.build_object(nodes, scope);
            scope.pop_frame();
            built.push(result?);
        }
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::schema::JsonTemplateArgs;
    use netfacts_core::PathResolver;
    use serde_json::json;

    fn build(template: &str, scope: &mut Scope) -> (Value, Vec<String>) {
        let args: JsonTemplateArgs = serde_yaml::from_str(template).unwrap();
        let config = EngineConfig::default();
        let resolver = PathResolver::new();
        let mut eval = Evaluator::new(&resolver, &config);
        let location = Location::root().child(0, Some("template"));

        let value = TemplateBuilder::new(&mut eval, &location)
            .build(&args.template, scope)
            .unwrap();
        (value, eval.into_diagnostics().into_warnings())
    }

    fn interface_scope() -> Scope {
        let mut scope = Scope::new();
        scope.set("name", json!({"matches": ["Ethernet1"]}));
        scope.set("mtu", json!({"matches": ["1500"]}));
        scope.set("vlans", json!([10, 20]));
        scope.set("enabled", json!(true));
        scope
    }

    #[test]
    fn test_nested_object_with_native_values() {
        let mut scope = interface_scope();
        let (value, warnings) = build(
            r#"
template:
  - key: "{{ name.matches[0] }}"
    object:
      - key: mtu
        value: "{{ mtu.matches[0] }}"
      - key: tags
        value: ["core", "{{ name.matches[0] }}"]
"#,
            &mut scope,
        );

        assert_eq!(value, json!({"Ethernet1": {"mtu": 1500, "tags": ["core", "Ethernet1"]}}));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_repeat_elements_and_object() {
        let mut scope = interface_scope();
        let (value, _) = build(
            r#"
template:
  - key: vlans
    elements:
      - key: id
        value: "{{ vlan }}"
    repeat_for: "{{ vlans }}"
    repeat_var: vlan
  - key: by_id
    object:
      - key: "vlan{{ item }}"
        value: "{{ item }}"
    repeat_for: vlans
"#,
            &mut scope,
        );

        assert_eq!(
            value,
            json!({
                "vlans": [{"id": 10}, {"id": 20}],
                "by_id": {"vlan10": 10, "vlan20": 20}
            })
        );
        // the repeat frames are gone
        assert_eq!(scope.depth(), 1);
        assert!(!scope.contains("vlan"));
    }

    #[test]
    fn test_when_skips_node() {
        let mut scope = interface_scope();
        let (value, _) = build(
            r#"
template:
  - key: kept
    value: yes
    when: "{{ enabled }}"
  - key: dropped
    value: no
    when: "not enabled"
  - key: shutdown
    value: true
    when: "missing is defined"
"#,
            &mut scope,
        );

        assert_eq!(value, json!({"kept": "yes"}));
    }

    #[test]
    fn test_unresolved_leaf_is_null_with_warning() {
        let mut scope = interface_scope();
        let (value, warnings) = build(
            r#"
template:
  - key: description
    value: "{{ description.matches[0] }}"
"#,
            &mut scope,
        );

        assert_eq!(value, json!({"description": null}));
        assert_eq!(warnings.len(), 1);
    }
}
