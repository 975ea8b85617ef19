//! Named patterns and typed capture-group access.

use crate::{ExtractResult, ParseError};
use regex::{Captures, Regex};

/// A compiled regex with a stable name.
///
/// The name identifies the pattern in every [`ParseError`], so vendor
/// adapters can build their patterns once in `Lazy` statics and still get
/// actionable failures at extraction time.
///
/// # Example
///
/// ```
/// use once_cell::sync::Lazy;
/// use unicli_extract::NamedPattern;
///
/// static VLAN_LINE: Lazy<NamedPattern> =
///     Lazy::new(|| NamedPattern::new("vlan-line", r"^vlan (?P<id>\d+)$").unwrap());
///
/// assert_eq!(VLAN_LINE.name(), "vlan-line");
/// ```
#[derive(Debug)]
pub struct NamedPattern {
    name: String,
    regex: Regex,
}

impl NamedPattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidPattern`] if the source does not
    /// compile.
    pub fn new(name: impl Into<String>, source: &str) -> ExtractResult<Self> {
        let name = name.into();
        let regex = Regex::new(source).map_err(|e| ParseError::InvalidPattern {
            pattern: name.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { name, regex })
    }

    /// Returns the pattern name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the compiled regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Applies the pattern to one segment, returning the match if any.
    pub(crate) fn match_segment<'t>(&self, segment: &'t str) -> Option<FieldMatch<'_, 't>> {
        self.regex.captures(segment).map(|caps| FieldMatch {
            pattern: &self.name,
            segment,
            caps,
        })
    }
}

/// One pattern match over a single line or segment, with typed access to
/// capture groups.
#[derive(Debug)]
pub struct FieldMatch<'p, 't> {
    pattern: &'p str,
    segment: &'t str,
    caps: Captures<'t>,
}

impl<'p, 't> FieldMatch<'p, 't> {
    /// Returns the matched line or segment.
    pub fn segment(&self) -> &'t str {
        self.segment
    }

    /// Returns a named group if it participated in the match.
    pub fn opt_str(&self, group: &str) -> Option<&'t str> {
        self.caps.name(group).map(|m| m.as_str())
    }

    /// Returns a named group, or [`ParseError::MissingGroup`].
    pub fn req_str(&self, group: &str) -> ExtractResult<&'t str> {
        self.opt_str(group).ok_or_else(|| ParseError::MissingGroup {
            pattern: self.pattern.to_string(),
            line: self.segment.to_string(),
            group: group.to_string(),
        })
    }

    /// Parses a named group as `u16`.
    pub fn req_u16(&self, group: &str) -> ExtractResult<u16> {
        self.parse_group(group, "u16")
    }

    /// Parses a named group as `u32`.
    pub fn req_u32(&self, group: &str) -> ExtractResult<u32> {
        self.parse_group(group, "u32")
    }

    /// Parses a named group as `u64`.
    pub fn req_u64(&self, group: &str) -> ExtractResult<u64> {
        self.parse_group(group, "u64")
    }

    /// Parses a named group as `i64`.
    pub fn req_i64(&self, group: &str) -> ExtractResult<i64> {
        self.parse_group(group, "i64")
    }

    fn parse_group<T: std::str::FromStr>(
        &self,
        group: &str,
        wanted: &'static str,
    ) -> ExtractResult<T> {
        let raw = self.req_str(group)?;
        raw.parse().map_err(|_| ParseError::InvalidValue {
            pattern: self.pattern.to_string(),
            line: self.segment.to_string(),
            value: raw.to_string(),
            wanted,
        })
    }
}
