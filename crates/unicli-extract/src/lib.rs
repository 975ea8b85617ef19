//! Regex-based field extraction from semi-structured CLI text.
//!
//! This crate is the foundation for every Reader in the engine: it pulls
//! typed values out of `show`/`display` command output using named
//! patterns, tolerating lines that do not match and failing loudly when a
//! matched value cannot be converted.
//!
//! - [`NamedPattern`]: a compiled regex with a stable name used in errors
//! - [`FieldMatch`]: one match with typed capture-group access
//! - [`Extractor`]: configurable extraction runs (`distinct`, keep/drop)
//! - [`extract_all`] / [`extract_first`]: the common one-shot entry points
//!
//! Extraction is pure: no I/O, no implicit defaults. Non-matching lines
//! are silently skipped; a conversion failure is a [`ParseError`]
//! carrying the offending line and the pattern name.
//!
//! # Example
//!
//! ```
//! use unicli_extract::{extract_all, NamedPattern};
//!
//! let pattern = NamedPattern::new("vlan-id", r"^vlan (?P<id>\d+)$").unwrap();
//! let ids = extract_all("vlan 12\nbogus line\nvlan 14", &pattern, |m| m.req_u16("id"))
//!     .unwrap();
//! assert_eq!(ids, vec![12, 14]);
//! ```

mod error;
mod extract;
mod pattern;

pub use error::{ExtractResult, ParseError};
pub use extract::{extract_all, extract_first, extract_segments, Extractor};
pub use pattern::{FieldMatch, NamedPattern};
