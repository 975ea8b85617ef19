//! Extraction runs over lines and segments.

use crate::pattern::{FieldMatch, NamedPattern};
use crate::ExtractResult;

/// Configurable extraction run.
///
/// By default every conversion result is kept in order of appearance,
/// duplicates included. Deduplication only happens when the caller
/// explicitly asks for it via [`Extractor::distinct`]; a keep/drop
/// predicate can be applied before results are materialized.
///
/// # Example
///
/// ```
/// use unicli_extract::{Extractor, NamedPattern};
///
/// let pattern = NamedPattern::new("vlan", r"vlan (?P<id>\d+)").unwrap();
/// let ids = Extractor::new(&pattern)
///     .distinct()
///     .all_where("vlan 1\nvlan 100\nvlan 1", |m| m.req_u16("id"), |id| *id != 1)
///     .unwrap();
/// assert_eq!(ids, vec![100]);
/// ```
#[derive(Debug)]
pub struct Extractor<'p> {
    pattern: &'p NamedPattern,
    distinct: bool,
}

impl<'p> Extractor<'p> {
    /// Creates an extractor for the given pattern.
    pub fn new(pattern: &'p NamedPattern) -> Self {
        Self {
            pattern,
            distinct: false,
        }
    }

    /// Requests deduplication of converted results.
    ///
    /// The first occurrence wins; order of the survivors still equals
    /// order of appearance in the input.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Extracts from every line of `text`, in input order.
    ///
    /// Lines that do not match are silently skipped. A conversion
    /// failure aborts the run with the underlying [`crate::ParseError`].
    pub fn all<T, F>(&self, text: &str, convert: F) -> ExtractResult<Vec<T>>
    where
        T: PartialEq,
        F: FnMut(&FieldMatch<'_, '_>) -> ExtractResult<T>,
    {
        self.run(text.lines(), convert, |_: &T| true)
    }

    /// Extracts from every line of `text`, keeping only results the
    /// predicate accepts.
    pub fn all_where<T, F, P>(&self, text: &str, convert: F, keep: P) -> ExtractResult<Vec<T>>
    where
        T: PartialEq,
        F: FnMut(&FieldMatch<'_, '_>) -> ExtractResult<T>,
        P: FnMut(&T) -> bool,
    {
        self.run(text.lines(), convert, keep)
    }

    /// Extracts from caller-supplied segments instead of lines.
    ///
    /// Useful for block-structured `show` output where the record
    /// separator is not a newline.
    pub fn segments<'t, T, F>(
        &self,
        segments: impl IntoIterator<Item = &'t str>,
        convert: F,
    ) -> ExtractResult<Vec<T>>
    where
        T: PartialEq,
        F: FnMut(&FieldMatch<'_, '_>) -> ExtractResult<T>,
    {
        self.run(segments.into_iter(), convert, |_: &T| true)
    }

    /// Extracts the first match of `text`, if any.
    pub fn first<T, F>(&self, text: &str, mut convert: F) -> ExtractResult<Option<T>>
    where
        F: FnMut(&FieldMatch<'_, '_>) -> ExtractResult<T>,
    {
        for line in text.lines() {
            if let Some(m) = self.pattern.match_segment(line) {
                return convert(&m).map(Some);
            }
        }
        Ok(None)
    }

    fn run<'t, T, F, P>(
        &self,
        segments: impl Iterator<Item = &'t str>,
        mut convert: F,
        mut keep: P,
    ) -> ExtractResult<Vec<T>>
    where
        T: PartialEq,
        F: FnMut(&FieldMatch<'_, '_>) -> ExtractResult<T>,
        P: FnMut(&T) -> bool,
    {
        let mut out: Vec<T> = Vec::new();
        for segment in segments {
            let Some(m) = self.pattern.match_segment(segment) else {
                continue;
            };
            let value = convert(&m)?;
            if !keep(&value) {
                continue;
            }
            if self.distinct && out.contains(&value) {
                continue;
            }
            out.push(value);
        }
        Ok(out)
    }
}

/// Extracts every matching line of `text` through `convert`, in order of
/// appearance.
pub fn extract_all<T, F>(text: &str, pattern: &NamedPattern, convert: F) -> ExtractResult<Vec<T>>
where
    T: PartialEq,
    F: FnMut(&FieldMatch<'_, '_>) -> ExtractResult<T>,
{
    Extractor::new(pattern).all(text, convert)
}

/// Extracts the first matching line of `text`, if any.
pub fn extract_first<T, F>(
    text: &str,
    pattern: &NamedPattern,
    convert: F,
) -> ExtractResult<Option<T>>
where
    F: FnMut(&FieldMatch<'_, '_>) -> ExtractResult<T>,
{
    Extractor::new(pattern).first(text, convert)
}

/// Extracts from caller-supplied segments instead of lines.
pub fn extract_segments<'t, T, F>(
    segments: impl IntoIterator<Item = &'t str>,
    pattern: &NamedPattern,
    convert: F,
) -> ExtractResult<Vec<T>>
where
    T: PartialEq,
    F: FnMut(&FieldMatch<'_, '_>) -> ExtractResult<T>,
{
    Extractor::new(pattern).segments(segments, convert)
}
