//! Expression syntax
//!
//! Three small grammars share one module:
//! - `VarPath`: `root(.field | .0 | [0] | ['key'])*`
//! - `Template`: text with embedded `{{ expr }}` placeholders
//! - `Condition`: the `when` language (`not`, `and`, `or`, `is defined`,
//!   `==`, `!=`)

use std::fmt;

use crate::error::ExpressionError;
use crate::value::Value;

/// One step of a variable path
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// `.name` or `['name']`
    Key(String),
    /// `.0` or `[0]`; negative values count from the end
    Index(i64),
}

/// A dotted/indexed variable reference such as `item.value.matches[0]`
#[derive(Debug, Clone, PartialEq)]
pub struct VarPath {
    pub root: String,
    pub segments: Vec<PathSegment>,
}

impl VarPath {
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let src = text.trim();
        let chars: Vec<char> = src.chars().collect();
        let mut pos = 0;

        let root = take_ident(&chars, &mut pos)
            .ok_or_else(|| ExpressionError::syntax(src, "expected a variable name"))?;
        let mut segments = Vec::new();

        while pos < chars.len() {
            match chars[pos] {
                '.' => {
                    pos += 1;
                    if let Some(ident) = take_ident(&chars, &mut pos) {
                        segments.push(PathSegment::Key(ident));
                    } else if let Some(index) = take_int(&chars, &mut pos) {
                        segments.push(PathSegment::Index(index));
                    } else {
                        return Err(ExpressionError::syntax(src, "expected a field after '.'"));
                    }
                }
                '[' => {
                    pos += 1;
                    skip_ws(&chars, &mut pos);
                    let segment = match chars.get(pos) {
                        Some(&quote) if quote == '\'' || quote == '"' => {
                            pos += 1;
                            let start = pos;
                            while pos < chars.len() && chars[pos] != quote {
                                pos += 1;
                            }
                            if pos >= chars.len() {
                                return Err(ExpressionError::syntax(src, "unterminated string key"));
                            }
                            let key: String = chars[start..pos].iter().collect();
                            pos += 1;
                            PathSegment::Key(key)
                        }
                        _ => take_int(&chars, &mut pos)
                            .map(PathSegment::Index)
                            .ok_or_else(|| ExpressionError::syntax(src, "expected an index"))?,
                    };
                    skip_ws(&chars, &mut pos);
                    if chars.get(pos) != Some(&']') {
                        return Err(ExpressionError::syntax(src, "expected ']'"));
                    }
                    pos += 1;
                    segments.push(segment);
                }
                other => {
                    return Err(ExpressionError::syntax(
                        src,
                        format!("unexpected character '{}'", other),
                    ));
                }
            }
        }

        Ok(Self { root, segments })
    }
}

impl fmt::Display for VarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

fn take_ident(chars: &[char], pos: &mut usize) -> Option<String> {
    let start = *pos;
    match chars.get(start) {
        Some(c) if c.is_alphabetic() || *c == '_' => {}
        _ => return None,
    }
    let mut end = start + 1;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    *pos = end;
    Some(chars[start..end].iter().collect())
}

fn take_int(chars: &[char], pos: &mut usize) -> Option<i64> {
    let start = *pos;
    let mut end = start;
    if chars.get(end) == Some(&'-') {
        end += 1;
    }
    let digits_start = end;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    let text: String = chars[start..end].iter().collect();
    let value = text.parse().ok()?;
    *pos = end;
    Some(value)
}

fn skip_ws(chars: &[char], pos: &mut usize) {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
}

/// A single expression: a variable path or a literal
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(VarPath),
    Literal(Value),
}

impl Expr {
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let src = text.trim();
        if src.is_empty() {
            return Err(ExpressionError::syntax(text, "empty expression"));
        }

        if let Some(quote @ ('\'' | '"')) = src.chars().next() {
            if src.len() < 2 || !src.ends_with(quote) {
                return Err(ExpressionError::syntax(src, "unterminated string literal"));
            }
            return Ok(Expr::Literal(Value::String(src[1..src.len() - 1].to_string())));
        }

        match src {
            "true" | "True" | "yes" | "Yes" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" | "False" | "no" | "No" => return Ok(Expr::Literal(Value::Bool(false))),
            "null" | "none" | "None" => return Ok(Expr::Literal(Value::Null)),
            _ => {}
        }

        if src.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            if let Ok(n) = src.parse::<i64>() {
                return Ok(Expr::Literal(Value::from(n)));
            }
            if let Some(n) = src.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                return Ok(Expr::Literal(Value::Number(n)));
            }
        }

        VarPath::parse(src).map(Expr::Path)
    }
}

/// One piece of an interpolated template
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

/// A string value that may embed `{{ expr }}` placeholders
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// No placeholders; the text is the value
    Literal(String),
    /// Exactly one placeholder and nothing else; resolves to a native value
    Single(Expr),
    /// Placeholders mixed with text; resolves to a string
    Parts(Vec<TemplatePart>),
}

impl Template {
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let mut parts = Vec::new();
        let mut rest = text;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                parts.push(TemplatePart::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| ExpressionError::syntax(text, "unclosed '{{'"))?;
            parts.push(TemplatePart::Expr(Expr::parse(&after[..end])?));
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            parts.push(TemplatePart::Text(rest.to_string()));
        }

        let mut exprs = parts.iter().filter_map(|p| match p {
            TemplatePart::Expr(e) => Some(e),
            TemplatePart::Text(_) => None,
        });
        let first = match exprs.next() {
            None => return Ok(Template::Literal(text.to_string())),
            Some(first) => first,
        };
        let only_whitespace_text = parts.iter().all(|p| match p {
            TemplatePart::Text(t) => t.trim().is_empty(),
            TemplatePart::Expr(_) => true,
        });
        if exprs.next().is_none() && only_whitespace_text {
            return Ok(Template::Single(first.clone()));
        }

        Ok(Template::Parts(parts))
    }
}

/// Comparison operators usable in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

/// A parsed `when` condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Expr(Expr),
    Not(Box<Condition>),
    Defined { path: VarPath, negated: bool },
    Compare { left: Expr, op: CompareOp, right: Expr },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        let src = strip_braces(text.trim());
        if src.is_empty() {
            return Err(ExpressionError::syntax(text, "empty condition"));
        }

        let alternatives = split_outside_quotes(src, " or ");
        if alternatives.len() > 1 {
            return alternatives
                .into_iter()
                .map(Condition::parse)
                .collect::<Result<_, _>>()
                .map(Condition::Or);
        }
        let conjuncts = split_outside_quotes(src, " and ");
        if conjuncts.len() > 1 {
            return conjuncts
                .into_iter()
                .map(Condition::parse)
                .collect::<Result<_, _>>()
                .map(Condition::And);
        }

        if let Some(rest) = src.strip_prefix("not ") {
            return Ok(Condition::Not(Box::new(Condition::parse(rest)?)));
        }

        for (suffix, negated) in [
            (" is not defined", true),
            (" is undefined", true),
            (" is defined", false),
        ] {
            if let Some(path) = src.strip_suffix(suffix) {
                return Ok(Condition::Defined {
                    path: VarPath::parse(path)?,
                    negated,
                });
            }
        }

        for (token, op) in [("==", CompareOp::Eq), ("!=", CompareOp::Ne)] {
            let sides = split_outside_quotes(src, token);
            if sides.len() == 2 {
                return Ok(Condition::Compare {
                    left: Expr::parse(sides[0])?,
                    op,
                    right: Expr::parse(sides[1])?,
                });
            }
            if sides.len() > 2 {
                return Err(ExpressionError::syntax(src, "chained comparisons are not supported"));
            }
        }

        Expr::parse(src).map(Condition::Expr)
    }
}

/// Remove one surrounding `{{ ... }}` pair, if the whole text is one placeholder
fn strip_braces(text: &str) -> &str {
    match text.strip_prefix("{{").and_then(|t| t.strip_suffix("}}")) {
        Some(inner) if !inner.contains("{{") => inner.trim(),
        _ => text,
    }
}

/// Split on `separator` wherever it does not occur inside a quoted string
fn split_outside_quotes<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut skip_until = 0;

    for (i, c) in text.char_indices() {
        if i < skip_until {
            continue;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if text[i..].starts_with(separator) => {
                pieces.push(text[start..i].trim());
                start = i + separator.len();
                skip_until = start;
            }
            None => {}
        }
    }
    pieces.push(text[start..].trim());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_var_path() {
        let path = VarPath::parse(" item.value.matches[0] ").unwrap();
        assert_eq!(path.root, "item");
        assert_eq!(
            path.segments,
            vec![
                PathSegment::Key("value".into()),
                PathSegment::Key("matches".into()),
                PathSegment::Index(0),
            ]
        );
        assert_eq!(path.to_string(), "item.value.matches[0]");
    }

    #[test]
    fn test_parse_var_path_quoted_and_numeric_keys() {
        let path = VarPath::parse("facts['oper-status'].1[-1]").unwrap();
        assert_eq!(
            path.segments,
            vec![
                PathSegment::Key("oper-status".into()),
                PathSegment::Index(1),
                PathSegment::Index(-1),
            ]
        );
    }

    #[test]
    fn test_parse_var_path_errors() {
        assert!(VarPath::parse("").is_err());
        assert!(VarPath::parse("1abc").is_err());
        assert!(VarPath::parse("a.").is_err());
        assert!(VarPath::parse("a[0").is_err());
        assert!(VarPath::parse("a | upper").is_err());
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(Expr::parse("'up'").unwrap(), Expr::Literal(json!("up")));
        assert_eq!(Expr::parse("\"down\"").unwrap(), Expr::Literal(json!("down")));
        assert_eq!(Expr::parse("1500").unwrap(), Expr::Literal(json!(1500)));
        assert_eq!(Expr::parse("-2").unwrap(), Expr::Literal(json!(-2)));
        assert_eq!(Expr::parse("True").unwrap(), Expr::Literal(json!(true)));
        assert_eq!(Expr::parse("None").unwrap(), Expr::Literal(Value::Null));
        assert!(matches!(Expr::parse("mtu").unwrap(), Expr::Path(_)));
        assert!(Expr::parse("'open").is_err());
    }

    #[test]
    fn test_parse_yes_no_literals() {
        assert_eq!(Expr::parse("yes").unwrap(), Expr::Literal(json!(true)));
        assert_eq!(Expr::parse("Yes").unwrap(), Expr::Literal(json!(true)));
        assert_eq!(Expr::parse("no").unwrap(), Expr::Literal(json!(false)));
        assert_eq!(Expr::parse("No").unwrap(), Expr::Literal(json!(false)));
        assert!(matches!(Expr::parse("yes_count").unwrap(), Expr::Path(_)));
    }

    #[test]
    fn test_parse_template_kinds() {
        assert_eq!(
            Template::parse("plain text").unwrap(),
            Template::Literal("plain text".into())
        );
        assert!(matches!(
            Template::parse(" {{ mtu.matches[0] }} ").unwrap(),
            Template::Single(Expr::Path(_))
        ));
        let parts = Template::parse("{{ name }}/{{ index }}").unwrap();
        match parts {
            Template::Parts(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected parts, got {:?}", other),
        }
        assert!(Template::parse("{{ name ").is_err());
    }

    #[test]
    fn test_parse_conditions() {
        assert!(matches!(
            Condition::parse("{{ enabled }}").unwrap(),
            Condition::Expr(Expr::Path(_))
        ));
        assert!(matches!(
            Condition::parse("not enabled").unwrap(),
            Condition::Not(_)
        ));
        assert_eq!(
            Condition::parse("mtu is not defined").unwrap(),
            Condition::Defined {
                path: VarPath::parse("mtu").unwrap(),
                negated: true
            }
        );
        assert!(matches!(
            Condition::parse("item.value == 'up'").unwrap(),
            Condition::Compare { op: CompareOp::Eq, .. }
        ));
        assert!(matches!(
            Condition::parse("a is defined and b != 'x or y'").unwrap(),
            Condition::And(ref parts) if parts.len() == 2
        ));
        assert!(matches!(
            Condition::parse("a or b or c").unwrap(),
            Condition::Or(ref parts) if parts.len() == 3
        ));
    }
}
