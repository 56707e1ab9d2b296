//! Pattern matching engine for `pattern_match` directives
//!
//! Runs a compiled regex over device output in one of four modes and
//! shapes the result as match objects or text sections.

use std::borrow::Cow;
use std::sync::OnceLock;

use netfacts_core::{Map, Value};
use regex::{Captures, Regex};

use crate::config::SectionTrailing;
use crate::schema::PatternMatchArgs;

/// Canned sub-patterns usable as `{{ NAME }}` inside a regex
const NAMED_PATTERNS: &[(&str, &str)] = &[
    ("ALPHAS", r"(\w+)"),
    ("NUMS", r"(\d+)"),
    (
        "IPV4",
        r"(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])",
    ),
];

/// Matching mode selected by `match_all` / `match_greedy`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// First matching line only
    First,
    /// Every match on every line
    All,
    /// Anchor-delimited text sections
    Sections,
    /// Greedy without `match_all`: the whole content as one section
    Whole,
}

impl MatchMode {
    fn from_flags(match_all: bool, match_greedy: bool) -> Self {
        match (match_all, match_greedy) {
            (false, false) => MatchMode::First,
            (true, false) => MatchMode::All,
            (true, true) => MatchMode::Sections,
            (false, true) => MatchMode::Whole,
        }
    }
}

/// A `pattern_match` directive with its regexes compiled
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    args: PatternMatchArgs,
    regex: Regex,
    until: Option<Regex>,
    mode: MatchMode,
}

impl PatternMatcher {
    /// Compile the directive's regexes
    pub fn compile(args: PatternMatchArgs) -> Result<Self, regex::Error> {
        let regex = Regex::new(&expand_named_patterns(&args.regex))?;
        let until = args
            .match_until
            .as_deref()
            .map(|until| Regex::new(&expand_named_patterns(until)))
            .transpose()?;
        let mode = MatchMode::from_flags(args.match_all, args.match_greedy);

        Ok(Self {
            args,
            regex,
            until,
            mode,
        })
    }

    pub fn args(&self) -> &PatternMatchArgs {
        &self.args
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Expression producing the text to match; defaults to the run's input
    pub fn content_expression(&self) -> &str {
        self.args.content.as_deref().unwrap_or("{{ content }}")
    }

    /// Run the pattern over `content`.
    ///
    /// `First` yields one match object (`{matches: []}` when nothing
    /// matched); the other modes yield a sequence.
    pub fn run(&self, content: &str, trailing: SectionTrailing) -> Value {
        match self.mode {
            MatchMode::First => self.first(content),
            MatchMode::All => self.all(content),
            MatchMode::Sections => self.sections(content, trailing),
            MatchMode::Whole => Value::Array(vec![Value::String(content.to_string())]),
        }
    }

    fn first(&self, content: &str) -> Value {
        content
            .lines()
            .find_map(|line| self.regex.captures(line))
            .map(|caps| match_result(&self.regex, &caps))
            .unwrap_or_else(empty_match)
    }

    fn all(&self, content: &str) -> Value {
        let matches = content
            .lines()
            .flat_map(|line| self.regex.captures_iter(line))
            .map(|caps| match_result(&self.regex, &caps))
            .collect();
        Value::Array(matches)
    }

    fn sections(&self, content: &str, trailing: SectionTrailing) -> Value {
        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        let is_anchor = |line: &str| self.regex.is_match(strip_eol(line));
        let mut sections = Vec::new();
        let mut index = 0;

        while index < lines.len() {
            if !is_anchor(lines[index]) {
                index += 1;
                continue;
            }

            let start = index;
            let mut end = index + 1;
            match &self.until {
                Some(until) => {
                    while end < lines.len() && !until.is_match(strip_eol(lines[end])) {
                        end += 1;
                    }
                    // the closing line belongs to the section
                    if end < lines.len() {
                        end += 1;
                    }
                }
                None => {
                    while end < lines.len() && !is_anchor(lines[end]) {
                        end += 1;
                    }
                }
            }

            let mut span = &lines[start..end];
            if trailing == SectionTrailing::Trim {
                while span.len() > 1 && span[span.len() - 1].trim().is_empty() {
                    span = &span[..span.len() - 1];
                }
            }
            sections.push(Value::String(span.concat()));
            index = end;
        }

        Value::Array(sections)
    }
}

/// Replace `{{ ALPHAS }}`-style macros with their sub-patterns
pub fn expand_named_patterns(regex: &str) -> Cow<'_, str> {
    static MACRO_REGEX: OnceLock<Regex> = OnceLock::new();
    let macro_regex = MACRO_REGEX.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").expect("macro pattern is valid")
    });

    macro_regex.replace_all(regex, |caps: &Captures| {
        NAMED_PATTERNS
            .iter()
            .find(|(name, _)| *name == &caps[1])
            .map(|(_, pattern)| pattern.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn empty_match() -> Value {
    let mut obj = Map::new();
    obj.insert("matches".to_string(), Value::Array(Vec::new()));
    Value::Object(obj)
}

/// Build `{matches: [...], <named groups>...}` for one match.
///
/// A regex without capture groups reports the whole match as its only entry.
fn match_result(regex: &Regex, caps: &Captures) -> Value {
    let as_value = |m: Option<regex::Match>| {
        m.map(|m| Value::String(m.as_str().to_string()))
            .unwrap_or(Value::Null)
    };

    let groups: Vec<Value> = if caps.len() > 1 {
        (1..caps.len()).map(|i| as_value(caps.get(i))).collect()
    } else {
        vec![as_value(caps.get(0))]
    };

    let mut obj = Map::new();
    obj.insert("matches".to_string(), Value::Array(groups));
    for name in regex.capture_names().flatten() {
        if name != "matches" {
            obj.insert(name.to_string(), as_value(caps.name(name)));
        }
    }
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHOW_INTERFACES: &str = "\
Ethernet1 is up
  Hardware is Ethernet,
  MTU 1500 bytes,
  Description: uplink
Ethernet2 is down
  Hardware is Ethernet,
  MTU 9000 bytes,

Management1 is up
  MTU 1500 bytes,
";

    fn matcher(regex: &str, match_all: bool, match_greedy: bool) -> PatternMatcher {
        PatternMatcher::compile(PatternMatchArgs {
            regex: regex.to_string(),
            content: None,
            match_all,
            match_greedy,
            match_until: None,
        })
        .unwrap()
    }

    #[test]
    fn test_first_match_returns_groups_in_order() {
        let m = matcher(r"^(\S+) is (up|down)", false, false);
        assert_eq!(m.mode(), MatchMode::First);
        assert_eq!(
            m.run(SHOW_INTERFACES, SectionTrailing::Keep),
            json!({"matches": ["Ethernet1", "up"]})
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        let m = matcher(r"^Loopback(\d+)", false, false);
        assert_eq!(
            m.run(SHOW_INTERFACES, SectionTrailing::Keep),
            json!({"matches": []})
        );

        let all = matcher(r"^Loopback(\d+)", true, false);
        assert_eq!(all.run(SHOW_INTERFACES, SectionTrailing::Keep), json!([]));
    }

    #[test]
    fn test_match_all_in_line_order() {
        let m = matcher(r"MTU (\d+) bytes", true, false);
        assert_eq!(
            m.run(SHOW_INTERFACES, SectionTrailing::Keep),
            json!([
                {"matches": ["1500"]},
                {"matches": ["9000"]},
                {"matches": ["1500"]}
            ])
        );
    }

    #[test]
    fn test_named_groups_are_exposed() {
        let m = matcher(r"^(?P<name>\S+) is (?P<state>\w+)", false, false);
        assert_eq!(
            m.run(SHOW_INTERFACES, SectionTrailing::Keep),
            json!({"matches": ["Ethernet1", "up"], "name": "Ethernet1", "state": "up"})
        );
    }

    #[test]
    fn test_no_groups_reports_whole_match() {
        let m = matcher(r"Description: \w+", false, false);
        assert_eq!(
            m.run(SHOW_INTERFACES, SectionTrailing::Keep),
            json!({"matches": ["Description: uplink"]})
        );
    }

    #[test]
    fn test_sections_one_per_anchor() {
        let m = matcher(r"^\S+ is (up|down)", true, true);
        let sections = m.run(SHOW_INTERFACES, SectionTrailing::Keep);
        assert_eq!(
            sections,
            json!([
                "Ethernet1 is up\n  Hardware is Ethernet,\n  MTU 1500 bytes,\n  Description: uplink\n",
                "Ethernet2 is down\n  Hardware is Ethernet,\n  MTU 9000 bytes,\n\n",
                "Management1 is up\n  MTU 1500 bytes,\n"
            ])
        );
    }

    #[test]
    fn test_sections_drop_preamble_and_trim_blank_lines() {
        let content = format!("show interfaces\n\n{}", SHOW_INTERFACES);
        let m = matcher(r"^\S+ is (up|down)", true, true);
        let sections = m.run(&content, SectionTrailing::Trim);
        let sections = sections.as_array().unwrap();

        assert_eq!(sections.len(), 3);
        assert_eq!(
            sections[1],
            json!("Ethernet2 is down\n  Hardware is Ethernet,\n  MTU 9000 bytes,\n")
        );
    }

    #[test]
    fn test_sections_with_match_until() {
        let m = PatternMatcher::compile(PatternMatchArgs {
            regex: r"^\S+ is (up|down)".to_string(),
            content: None,
            match_all: true,
            match_greedy: true,
            match_until: Some(r"^\s+MTU".to_string()),
        })
        .unwrap();

        assert_eq!(
            m.run(SHOW_INTERFACES, SectionTrailing::Keep),
            json!([
                "Ethernet1 is up\n  Hardware is Ethernet,\n  MTU 1500 bytes,\n",
                "Ethernet2 is down\n  Hardware is Ethernet,\n  MTU 9000 bytes,\n",
                "Management1 is up\n  MTU 1500 bytes,\n"
            ])
        );
    }

    #[test]
    fn test_greedy_without_match_all_is_whole_content() {
        let m = matcher(r"^\S+ is", false, true);
        assert_eq!(m.mode(), MatchMode::Whole);
        assert_eq!(
            m.run("a is up\nb is up\n", SectionTrailing::Keep),
            json!(["a is up\nb is up\n"])
        );
    }

    #[test]
    fn test_named_pattern_macros() {
        assert_eq!(expand_named_patterns(r"MTU {{ NUMS }}"), r"MTU (\d+)");
        assert_eq!(expand_named_patterns(r"{{UNKNOWN}}"), r"{{UNKNOWN}}");

        let m = matcher(r"address {{ IPV4 }}", false, false);
        let result = m.run("  address 10.0.0.1/24", SectionTrailing::Keep);
        assert_eq!(result["matches"][0], json!("0."));
        assert_eq!(result["matches"][2], json!("1"));
    }

    #[test]
    fn test_invalid_regex_fails_to_compile() {
        let err = PatternMatcher::compile(PatternMatchArgs {
            regex: r"(unclosed".to_string(),
            content: None,
            match_all: false,
            match_greedy: false,
            match_until: None,
        });
        assert!(err.is_err());
    }
}
