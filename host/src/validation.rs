//! Module validation before first use.
//!
//! A module is checked against the session configuration and the
//! dispatcher's import table once, at session construction. Anything that
//! fails here would otherwise surface mid-invoke as a missing import or
//! entry point.

use gangplank_interop::ModuleInfo;

use crate::config::SessionConfig;
use crate::error::SessionError;

/// Validate `info` against `config` and the imports the dispatcher
/// actually provides.
pub fn validate_module(
    info: &ModuleInfo,
    config: &SessionConfig,
    provided: &[&str],
) -> Result<(), SessionError> {
    if info.name.is_empty() {
        return Err(SessionError::validation("module declares no name"));
    }

    let missing_entries: Vec<&str> = config
        .required_entries
        .iter()
        .map(String::as_str)
        .filter(|e| !info.entries.iter().any(|have| have == e))
        .collect();
    if !missing_entries.is_empty() {
        return Err(SessionError::validation(format!(
            "module `{}` is missing required entry points: {}",
            info.name,
            missing_entries.join(", ")
        )));
    }

    if config.strict_imports {
        let unsatisfied: Vec<&str> = info
            .imports
            .iter()
            .map(String::as_str)
            .filter(|i| !provided.contains(i))
            .collect();
        if !unsatisfied.is_empty() {
            return Err(SessionError::validation(format!(
                "module `{}` declares unsatisfied imports: {}",
                info.name,
                unsatisfied.join(", ")
            )));
        }
    }

    Ok(())
}
