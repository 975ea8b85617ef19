//! Device family profiles and rejection classification.

use crate::{SessionError, SessionResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

fn default_deadline_ms() -> u64 {
    10_000
}

/// Per-device-family configuration supplied as data.
///
/// The error patterns classify response text that looks successful at
/// the transport level but means the device rejected the command.
///
/// # Example
///
/// ```
/// use unicli_session::DeviceProfile;
///
/// let profile = DeviceProfile::from_json(
///     r#"{
///         "family": "ios",
///         "error_patterns": ["(?m)^% Invalid input", "(?m)^% Error"],
///         "deadline_ms": 5000
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(profile.family, "ios");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Device family name (e.g. "ios", "junos", "vrp").
    pub family: String,
    /// Regex sources matching rejection text.
    #[serde(default)]
    pub error_patterns: Vec<String>,
    /// Per-command deadline in milliseconds.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

impl DeviceProfile {
    /// Parses a profile from JSON.
    pub fn from_json(json: &str) -> SessionResult<Self> {
        serde_json::from_str(json).map_err(|e| SessionError::InvalidProfile {
            family: "<unparsed>".to_string(),
            message: e.to_string(),
        })
    }

    /// Compiles the error patterns.
    pub fn compile(&self) -> SessionResult<ErrorPatterns> {
        ErrorPatterns::new(&self.family, &self.error_patterns)
    }
}

/// Compiled rejection patterns for one device family.
#[derive(Debug)]
pub struct ErrorPatterns {
    family: String,
    patterns: Vec<Regex>,
}

impl ErrorPatterns {
    /// Compiles pattern sources for a family.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidProfile`] on the first source that
    /// does not compile.
    pub fn new<S: AsRef<str>>(family: impl Into<String>, sources: &[S]) -> SessionResult<Self> {
        let family = family.into();
        let mut patterns = Vec::with_capacity(sources.len());
        for source in sources {
            let regex =
                Regex::new(source.as_ref()).map_err(|e| SessionError::InvalidProfile {
                    family: family.clone(),
                    message: e.to_string(),
                })?;
            patterns.push(regex);
        }
        Ok(Self { family, patterns })
    }

    /// An empty pattern set: every response is accepted.
    pub fn none(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            patterns: Vec::new(),
        }
    }

    /// Returns the device family name.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Returns the source of the first pattern matching `response`, if
    /// any.
    pub fn matched(&self, response: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.is_match(response))
            .map(|p| p.as_str())
    }

    /// Returns true if `response` matches any rejection pattern.
    pub fn is_rejection(&self, response: &str) -> bool {
        self.matched(response).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_from_json_defaults() {
        let profile = DeviceProfile::from_json(r#"{"family": "junos"}"#).unwrap();
        assert_eq!(profile.family, "junos");
        assert!(profile.error_patterns.is_empty());
        assert_eq!(profile.deadline_ms, 10_000);
    }

    #[test]
    fn test_profile_invalid_json() {
        let err = DeviceProfile::from_json("not json").unwrap_err();
        assert!(matches!(err, SessionError::InvalidProfile { .. }));
    }

    #[test]
    fn test_rejection_classification() {
        let patterns =
            ErrorPatterns::new("ios", &["(?m)^% Invalid input", "(?m)^% Incomplete command"])
                .unwrap();

        assert!(patterns.is_rejection("% Invalid input detected at '^' marker."));
        assert!(!patterns.is_rejection("interface eth0\n  mtu 9100"));
        assert_eq!(
            patterns.matched("% Incomplete command."),
            Some("(?m)^% Incomplete command")
        );
    }

    #[test]
    fn test_invalid_pattern_source() {
        let err = ErrorPatterns::new("ios", &["(unclosed"]).unwrap_err();
        match err {
            SessionError::InvalidProfile { family, .. } => assert_eq!(family, "ios"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_none_accepts_everything() {
        let patterns = ErrorPatterns::none("generic");
        assert!(!patterns.is_rejection("% Error: looks bad but nothing is configured"));
    }
}
