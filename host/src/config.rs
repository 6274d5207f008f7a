//! Session configuration.

/// Configuration for a host/module session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Entry points the module must export; checked at session start.
    pub required_entries: Vec<String>,

    /// Reject modules declaring imports the dispatcher does not provide.
    /// A module linked against a missing import would only fail later, in
    /// the middle of an invoke.
    pub strict_imports: bool,
}

impl SessionConfig {
    pub fn with_required_entries<S: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = S>,
    ) -> Self {
        self.required_entries = entries.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strict_imports(mut self, strict: bool) -> Self {
        self.strict_imports = strict;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            required_entries: Vec::new(),
            strict_imports: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert!(config.required_entries.is_empty());
        assert!(config.strict_imports);
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::default()
            .with_required_entries(["run", "step"])
            .with_strict_imports(false);
        assert_eq!(config.required_entries, vec!["run", "step"]);
        assert!(!config.strict_imports);
    }
}
