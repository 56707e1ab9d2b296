//! Expression resolution errors

use thiserror::Error;

/// Errors that can occur while parsing or resolving an expression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("undefined variable path '{path}'")]
    Undefined { path: String },

    #[error("invalid expression '{expression}': {message}")]
    Syntax { expression: String, message: String },
}

impl ExpressionError {
    pub(crate) fn syntax(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Whether this error only means a path had no value
    pub fn is_undefined(&self) -> bool {
        matches!(self, ExpressionError::Undefined { .. })
    }
}
