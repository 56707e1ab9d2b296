//! Directive errors and their locations

use std::fmt;

use netfacts_core::ExpressionError;
use thiserror::Error;

/// Position of a directive inside a document.
///
/// `indices` holds the 1-based position at each nesting level, so the
/// second directive inside the third top-level group is `#3.2`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    indices: Vec<usize>,
    name: Option<String>,
}

impl Location {
    /// Location of the document itself (no directive)
    pub fn root() -> Self {
        Self::default()
    }

    /// Location of the `index`-th (0-based) directive below this one
    pub fn child(&self, index: usize, name: Option<&str>) -> Self {
        let mut indices = self.indices.clone();
        indices.push(index + 1);
        Self {
            indices,
            name: name.map(str::to_string),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indices.is_empty() {
            return write!(f, "document");
        }
        let position: Vec<String> = self.indices.iter().map(|i| i.to_string()).collect();
        write!(f, "directive #{}", position.join("."))?;
        if let Some(name) = &self.name {
            write!(f, " '{}'", name)?;
        }
        Ok(())
    }
}

/// Errors that abort a run (or, for expressions and exports, that do so
/// only under the stricter policies)
#[derive(Error, Debug)]
pub enum DirectiveError {
    #[error("schema error in {location}: {message}")]
    Schema { location: Location, message: String },

    #[error("invalid regex in {location}: {source}")]
    Pattern {
        location: Location,
        #[source]
        source: regex::Error,
    },

    #[error("expression error in {location}: {source}")]
    Expression {
        location: Location,
        #[source]
        source: ExpressionError,
    },

    #[error("export error in {location}: {message}")]
    Export { location: Location, message: String },
}

impl DirectiveError {
    pub fn schema(location: &Location, message: impl Into<String>) -> Self {
        Self::Schema {
            location: location.clone(),
            message: message.into(),
        }
    }

    /// Where the failing directive sits in its document
    pub fn location(&self) -> &Location {
        match self {
            DirectiveError::Schema { location, .. }
            | DirectiveError::Pattern { location, .. }
            | DirectiveError::Expression { location, .. }
            | DirectiveError::Export { location, .. } => location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let root = Location::root();
        assert_eq!(root.to_string(), "document");

        let group = root.child(2, Some("interfaces"));
        assert_eq!(group.to_string(), "directive #3 'interfaces'");

        let nested = group.child(0, None);
        assert_eq!(nested.to_string(), "directive #3.1");
        assert_eq!(nested.indices(), &[3, 1]);
    }

    #[test]
    fn test_error_reports_location() {
        let location = Location::root().child(0, Some("bad"));
        let err = DirectiveError::schema(&location, "unknown directive 'foo'");
        assert_eq!(
            err.to_string(),
            "schema error in directive #1 'bad': unknown directive 'foo'"
        );
        assert_eq!(err.location().name(), Some("bad"));
    }
}
