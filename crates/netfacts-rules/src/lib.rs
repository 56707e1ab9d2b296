//! netfacts-rules: Directive documents and the rule engine
//!
//! A document is a YAML (or JSON) sequence of directives that is run in
//! order against device output:
//!
//! ```yaml
//! - name: interface sections
//!   pattern_match:
//!     regex: "^(\\S+) is (up|down)"
//!     match_all: true
//!     match_greedy: true
//!   register: sections
//!
//! - name: interface details
//!   loop: "{{ sections }}"
//!   pattern_group:
//!     - pattern_match: {regex: "^(\\S+) is"}
//!       register: name
//!     - pattern_match: {regex: "MTU (\\d+)"}
//!       register: mtu
//!   register: interfaces
//!
//! - json_template:
//!     template:
//!       - key: interfaces
//!         elements:
//!           - key: name
//!             value: "{{ entry.name.matches[0] }}"
//!           - key: mtu
//!             value: "{{ entry.mtu.matches[0] }}"
//!         repeat_for: "{{ interfaces }}"
//!         repeat_var: entry
//!   register: facts
//!   export: true
//! ```
//!
//! ```no_run
//! use netfacts_rules::{load_document_from_str, Engine, EngineConfig};
//! use netfacts_core::Map;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = load_document_from_str("- export_facts: {model: X}")?;
//! let engine = Engine::new(EngineConfig::default());
//! let output = engine.execute(&document, "show version output", &Map::new())?;
//! assert_eq!(output.facts.get("model").and_then(|v| v.as_str()), Some("X"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
mod eval;
pub mod export;
pub mod loader;
pub mod matcher;
pub mod schema;
mod template;

pub use config::{EngineConfig, ExportPolicy, SectionTrailing};
pub use engine::{Engine, RunOutput};
pub use error::{DirectiveError, Location};
pub use export::ExportSet;
pub use loader::{load_document_from_file, load_document_from_str, load_documents_from_dir, LoadError};
pub use matcher::{MatchMode, PatternMatcher};
pub use schema::{Directive, DirectiveKind, Document, JsonTemplateArgs, NodeBody, PatternMatchArgs, Repeat, TemplateNode};
