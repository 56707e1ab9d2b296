//! Engine policies
//!
//! Every knob has the lenient behaviour as its default: unresolved paths
//! become null, exports without a register warn, runs abort on the first
//! fatal error.

use serde::{Deserialize, Serialize};

/// What to do when `export: true` has no usable `register`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPolicy {
    /// Emit a warning and carry on
    #[default]
    Warn,
    /// Fail the directive with an export error
    Error,
}

/// How blank lines at the end of a greedy section are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTrailing {
    /// A section runs up to, but excluding, the next anchor line
    #[default]
    Keep,
    /// Blank lines directly before the next anchor are dropped
    Trim,
}

/// Configuration for an `Engine`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unresolved expression paths fail the run instead of becoming null
    pub strict: bool,
    /// Fatal directive failures become warnings and the run continues
    pub continue_on_error: bool,
    pub export_policy: ExportPolicy,
    pub section_trailing: SectionTrailing,
    /// Templated strings that look like integers become numbers,
    /// empty templated strings become null
    pub coerce_native: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict: false,
            continue_on_error: false,
            export_policy: ExportPolicy::Warn,
            section_trailing: SectionTrailing::Keep,
            coerce_native: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_export_policy(mut self, policy: ExportPolicy) -> Self {
        self.export_policy = policy;
        self
    }

    pub fn with_section_trailing(mut self, trailing: SectionTrailing) -> Self {
        self.section_trailing = trailing;
        self
    }

    pub fn with_coerce_native(mut self, coerce: bool) -> Self {
        self.coerce_native = coerce;
        self
    }
}
