//! Non-fatal warning channel for a run

/// Collects warnings raised while a document runs.
///
/// Every warning is also emitted as a `tracing` event so hosts that install
/// a subscriber see them as they happen.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_keep_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("first");
        diagnostics.warn(String::from("second"));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.into_warnings(), vec!["first", "second"]);
    }
}
