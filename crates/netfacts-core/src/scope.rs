//! Variable scope management for a run.
//!
//! Scopes provide variable bindings with:
//! - Nested frames (push/pop around loop iterations and groups)
//! - Innermost-first lookup
//! - Path resolution for nested access (`item.value.matches[0]`)

use crate::expr::{PathSegment, VarPath};
use crate::value::{Map, Value};

/// Variable scope with nested frames.
///
/// Variables are looked up from innermost to outermost frame. The root frame
/// lives for the whole run and can never be popped.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Stack of variable frames. Last element is the innermost frame.
    frames: Vec<Map<String, Value>>,
}

impl Scope {
    /// Create a new scope with one empty frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Map::new()],
        }
    }

    /// Create a scope whose root frame holds the given variables.
    pub fn with_vars(vars: Map<String, Value>) -> Self {
        Self { frames: vec![vars] }
    }

    /// Push a new frame (entering a loop iteration or a group).
    pub fn push_frame(&mut self) {
        self.frames.push(Map::new());
    }

    /// Pop the innermost frame and return its bindings.
    ///
    /// The root frame is never popped; `None` is returned instead.
    pub fn pop_frame(&mut self) -> Option<Map<String, Value>> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Number of frames currently on the stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Set a variable in the current (innermost) frame.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Get a variable by name, searching from innermost to outermost frame.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Check if a variable exists in any frame.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve a variable path like `item.value` or `sections[0]`.
    ///
    /// Returns None if any segment of the path is missing.
    pub fn resolve_path(&self, path: &VarPath) -> Option<&Value> {
        let mut current = self.get(&path.root)?;
        for segment in &path.segments {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                (PathSegment::Key(key), Value::Array(items)) => {
                    let index = key.parse::<i64>().ok()?;
                    index_sequence(items, index)?
                }
                (PathSegment::Index(index), Value::Array(items)) => index_sequence(items, *index)?,
                (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// Index a sequence; negative indices count from the end.
fn index_sequence(items: &[Value], index: i64) -> Option<&Value> {
    let len = items.len() as i64;
    let index = if index < 0 { len + index } else { index };
    if index < 0 {
        return None;
    }
    items.get(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(text: &str) -> VarPath {
        VarPath::parse(text).unwrap()
    }

    #[test]
    fn test_innermost_frame_wins() {
        let mut scope = Scope::new();
        scope.set("item", json!("outer"));
        scope.push_frame();
        scope.set("item", json!("inner"));

        assert_eq!(scope.get("item"), Some(&json!("inner")));
        scope.pop_frame();
        assert_eq!(scope.get("item"), Some(&json!("outer")));
    }

    #[test]
    fn test_root_frame_cannot_be_popped() {
        let mut scope = Scope::new();
        scope.set("content", json!("text"));

        assert!(scope.pop_frame().is_none());
        assert_eq!(scope.depth(), 1);
        assert!(scope.contains("content"));
    }

    #[test]
    fn test_pop_returns_frame_bindings() {
        let mut scope = Scope::new();
        scope.push_frame();
        scope.set("name", json!({"matches": ["Ethernet1"]}));

        let frame = scope.pop_frame().unwrap();
        assert_eq!(frame.get("name"), Some(&json!({"matches": ["Ethernet1"]})));
        assert!(!scope.contains("name"));
    }

    #[test]
    fn test_resolve_nested_path() {
        let mut scope = Scope::new();
        scope.set(
            "item",
            json!({"key": "eth0", "value": {"matches": ["1500", "9000"]}}),
        );

        assert_eq!(scope.resolve_path(&path("item.key")), Some(&json!("eth0")));
        assert_eq!(
            scope.resolve_path(&path("item.value.matches[1]")),
            Some(&json!("9000"))
        );
        assert_eq!(
            scope.resolve_path(&path("item.value.matches.0")),
            Some(&json!("1500"))
        );
        assert_eq!(
            scope.resolve_path(&path("item.value.matches[-1]")),
            Some(&json!("9000"))
        );
        assert_eq!(scope.resolve_path(&path("item.value.missing")), None);
        assert_eq!(scope.resolve_path(&path("item.value.matches[5]")), None);
        assert_eq!(scope.resolve_path(&path("nothing")), None);
    }
}
