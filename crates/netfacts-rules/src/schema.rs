//! Directive document schema
//!
//! A document is an ordered YAML sequence of directives. Each directive is a
//! mapping with exactly one kind key (`pattern_match`, `pattern_group`,
//! `json_template`, `export_facts`) plus the common options `name`, `when`,
//! `loop`, `register` and `export`. Documents are validated completely when
//! they are loaded; regexes are compiled at the same time.

use std::path::{Path, PathBuf};

use netfacts_core::{Map, Value};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DirectiveError, Location};
use crate::matcher::PatternMatcher;

/// Keys that select a directive's kind
pub const DIRECTIVE_KINDS: &[&str] = &["pattern_match", "pattern_group", "json_template", "export_facts"];

/// A validated, ordered sequence of directives
#[derive(Debug, Clone, Default)]
pub struct Document {
    directives: Vec<Directive>,
    origin: Option<PathBuf>,
}

impl Document {
    pub fn new(directives: Vec<Directive>) -> Self {
        Self {
            directives,
            origin: None,
        }
    }

    /// Build a document from parsed YAML.
    ///
    /// An empty (null) document is allowed and has no directives.
    pub fn from_yaml(value: &serde_yaml::Value) -> Result<Self, DirectiveError> {
        let root = Location::root();
        match value {
            serde_yaml::Value::Null => Ok(Self::default()),
            serde_yaml::Value::Sequence(items) => {
                let directives = parse_directives(items, &root)?;
                Ok(Self::new(directives))
            }
            other => Err(DirectiveError::schema(
                &root,
                format!("a document must be a sequence of directives, got {}", yaml_type(other)),
            )),
        }
    }

    /// Record the file this document was loaded from
    pub fn with_origin(mut self, path: impl Into<PathBuf>) -> Self {
        self.origin = Some(path.into());
        self
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// One rule-language instruction plus its common options
#[derive(Debug, Clone)]
pub struct Directive {
    pub name: Option<String>,
    pub kind: DirectiveKind,
    /// Condition gating the directive; evaluated before loop expansion
    pub when: Option<String>,
    /// Expression or literal sequence/mapping to iterate over
    pub loop_over: Option<Value>,
    pub register: Option<String>,
    pub export: bool,
}

/// The four directive kinds with their typed arguments
#[derive(Debug, Clone)]
pub enum DirectiveKind {
    PatternMatch(PatternMatcher),
    PatternGroup(Vec<Directive>),
    JsonTemplate(JsonTemplateArgs),
    ExportFacts(Map<String, Value>),
}

impl DirectiveKind {
    /// The document keyword for this kind
    pub fn keyword(&self) -> &'static str {
        match self {
            DirectiveKind::PatternMatch(_) => "pattern_match",
            DirectiveKind::PatternGroup(_) => "pattern_group",
            DirectiveKind::JsonTemplate(_) => "json_template",
            DirectiveKind::ExportFacts(_) => "export_facts",
        }
    }
}

/// Arguments of `pattern_match`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PatternMatchArgs {
    /// Regular expression; may use `{{ ALPHAS }}`, `{{ NUMS }}`, `{{ IPV4 }}`
    pub regex: String,

    /// Text to match against; defaults to the run's input
    #[serde(default, alias = "contents")]
    pub content: Option<String>,

    #[serde(default)]
    pub match_all: bool,

    #[serde(default)]
    pub match_greedy: bool,

    /// Regex closing a greedy section (the closing line is included)
    #[serde(default)]
    pub match_until: Option<String>,
}

/// Arguments of `json_template`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonTemplateArgs {
    pub template: Vec<TemplateNode>,
}

/// One `{key, ...}` entry of a template
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawTemplateNode")]
pub struct TemplateNode {
    /// Output key; may itself be an expression
    pub key: String,
    pub when: Option<String>,
    pub body: NodeBody,
}

/// What a template node produces
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    /// A leaf; strings are resolved, sequences and mappings leaf by leaf
    Value(Value),
    /// A nested object
    Object {
        nodes: Vec<TemplateNode>,
        repeat: Option<Repeat>,
    },
    /// A nested object wrapped in an array (one per repetition)
    Elements {
        nodes: Vec<TemplateNode>,
        repeat: Option<Repeat>,
    },
}

/// `repeat_for` / `repeat_var` on an object or elements node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repeat {
    pub over: String,
    pub var: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTemplateNode {
    key: ScalarText,
    #[serde(default, deserialize_with = "deserialize_some")]
    value: Option<Value>,
    #[serde(default)]
    object: Option<Vec<TemplateNode>>,
    #[serde(default)]
    elements: Option<Vec<TemplateNode>>,
    #[serde(default)]
    repeat_for: Option<String>,
    #[serde(default)]
    repeat_var: Option<String>,
    #[serde(default)]
    when: Option<ScalarText>,
}

impl TryFrom<RawTemplateNode> for TemplateNode {
    type Error = String;

    fn try_from(raw: RawTemplateNode) -> Result<Self, Self::Error> {
        let key = raw.key.0;
        let repeat = match (raw.repeat_for, raw.repeat_var) {
            (Some(over), var) => Some(Repeat {
                over,
                var: var.unwrap_or_else(|| "item".to_string()),
            }),
            (None, Some(_)) => {
                return Err(format!("template node '{}': repeat_var requires repeat_for", key));
            }
            (None, None) => None,
        };

        let body = match (raw.value, raw.object, raw.elements) {
            (Some(value), None, None) => {
                if repeat.is_some() {
                    return Err(format!(
                        "template node '{}': repeat_for only applies to object or elements",
                        key
                    ));
                }
                NodeBody::Value(value)
            }
            (None, Some(nodes), None) => NodeBody::Object { nodes, repeat },
            (None, None, Some(nodes)) => NodeBody::Elements { nodes, repeat },
            (None, None, None) => {
                return Err(format!(
                    "template node '{}' needs one of value, object or elements",
                    key
                ));
            }
            _ => {
                return Err(format!(
                    "template node '{}' may only have one of value, object or elements",
                    key
                ));
            }
        };

        Ok(TemplateNode {
            key,
            when: raw.when.map(|w| w.0),
            body,
        })
    }
}

/// Distinguishes an explicit `value: null` from a missing `value`
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A YAML scalar read as text (`when: true`, `key: 10`)
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScalarText(String);

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Scalar {
            Bool(bool),
            Int(i64),
            Float(f64),
            Text(String),
        }

        Ok(ScalarText(match Scalar::deserialize(deserializer)? {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s,
        }))
    }
}

fn parse_directives(items: &[serde_yaml::Value], parent: &Location) -> Result<Vec<Directive>, DirectiveError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_directive(item, parent, index))
        .collect()
}

fn parse_directive(value: &serde_yaml::Value, parent: &Location, index: usize) -> Result<Directive, DirectiveError> {
    let Some(mapping) = value.as_mapping() else {
        return Err(DirectiveError::schema(
            &parent.child(index, None),
            format!("a directive must be a mapping, got {}", yaml_type(value)),
        ));
    };

    let name = match mapping.get("name") {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(name)) => Some(name.clone()),
        Some(other) => {
            return Err(DirectiveError::schema(
                &parent.child(index, None),
                format!("'name' must be a string, got {}", yaml_type(other)),
            ));
        }
    };
    let location = parent.child(index, name.as_deref());

    let mut kind: Option<DirectiveKind> = None;
    let mut when = None;
    let mut loop_over = None;
    let mut register = None;
    let mut export = false;

    for (key, arg) in mapping {
        let Some(key) = key.as_str() else {
            return Err(DirectiveError::schema(&location, "directive keys must be strings"));
        };

        match key {
            "name" => {}
            "when" => {
                let text: ScalarText = from_yaml(arg, &location, "when")?;
                when = Some(text.0);
            }
            "loop" => loop_over = Some(from_yaml::<Value>(arg, &location, "loop")?),
            "register" => {
                let name: String = from_yaml(arg, &location, "register")?;
                if !is_identifier(&name) {
                    return Err(DirectiveError::schema(
                        &location,
                        format!("register name '{}' is not a valid variable name", name),
                    ));
                }
                register = Some(name);
            }
            "export" => export = from_yaml(arg, &location, "export")?,
            _ if DIRECTIVE_KINDS.contains(&key) => {
                if let Some(existing) = &kind {
                    return Err(DirectiveError::schema(
                        &location,
                        format!(
                            "directive has more than one kind: '{}' and '{}'",
                            existing.keyword(),
                            key
                        ),
                    ));
                }
                kind = Some(parse_kind(key, arg, &location)?);
            }
            other => {
                return Err(DirectiveError::schema(
                    &location,
                    format!("unknown key '{}'", other),
                ));
            }
        }
    }

    let kind = kind.ok_or_else(|| {
        DirectiveError::schema(
            &location,
            format!("missing directive kind, expected one of {}", DIRECTIVE_KINDS.join(", ")),
        )
    })?;

    Ok(Directive {
        name,
        kind,
        when,
        loop_over,
        register,
        export,
    })
}

fn parse_kind(keyword: &str, arg: &serde_yaml::Value, location: &Location) -> Result<DirectiveKind, DirectiveError> {
    match keyword {
        "pattern_match" => {
            let args: PatternMatchArgs = from_yaml(arg, location, keyword)?;
            PatternMatcher::compile(args)
                .map(DirectiveKind::PatternMatch)
                .map_err(|source| DirectiveError::Pattern {
                    location: location.clone(),
                    source,
                })
        }
        "pattern_group" => match arg.as_sequence() {
            Some(items) => parse_directives(items, location).map(DirectiveKind::PatternGroup),
            None => Err(DirectiveError::schema(
                location,
                format!("pattern_group must be a sequence of directives, got {}", yaml_type(arg)),
            )),
        },
        "json_template" => from_yaml(arg, location, keyword).map(DirectiveKind::JsonTemplate),
        "export_facts" => from_yaml(arg, location, keyword).map(DirectiveKind::ExportFacts),
        other => Err(DirectiveError::schema(
            location,
            format!("unknown directive '{}'", other),
        )),
    }
}

fn from_yaml<T>(value: &serde_yaml::Value, location: &Location, what: &str) -> Result<T, DirectiveError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_yaml::from_value(value.clone())
        .map_err(|e| DirectiveError::schema(location, format!("invalid {}: {}", what, e)))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn yaml_type(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}
