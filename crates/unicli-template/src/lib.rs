//! Diff-aware CLI command templating.
//!
//! This crate is the foundation for every Writer in the engine: it turns
//! a template string plus a set of named bindings into CLI command text.
//! Templates are parsed once into a typed AST ([`Template::parse`]) and
//! rendered many times ([`Template::render`]) by a tree-walking
//! evaluator — single pass, left to right, no backtracking.
//!
//! Supported constructs:
//!
//! - substitution: `{$name}` / `{$iface.config.mtu}`
//! - conditionals: `{% if ($cond) %}…{% elseIf ($other) %}…{% else %}…{% endif %}`
//! - loops: `{% loop in $members as $m %}…{% endloop %}`
//! - the update macro:
//!   ``{$data|update(mtu,mtu `mtu`\n,no mtu\n)}`` — compares
//!   `before.mtu` and `after.mtu` of a diff-pair binding and renders the
//!   changed or removed fragment, or nothing at all. This is what turns a
//!   full desired-state object into a minimal delta of CLI lines.
//!
//! Missing bindings render as empty text; an unresolvable field inside
//! `update()` is a [`TemplateError`] because it indicates an adapter bug,
//! not absent data.
//!
//! # Example
//!
//! ```
//! use unicli_model::ConfigNode;
//! use unicli_template::{Bindings, DiffPair, Template};
//!
//! let template = Template::parse(
//!     "interface {$name}\n{$data|update(mtu,mtu `mtu`\n,no mtu\n)}",
//! )
//! .unwrap();
//!
//! let before = ConfigNode::builder().field("mtu", 1500u64).build().unwrap();
//! let after = ConfigNode::builder().field("mtu", 9000u64).build().unwrap();
//! let bindings = Bindings::new()
//!     .bind("name", "eth0")
//!     .bind("data", DiffPair::modify(before, after));
//!
//! assert_eq!(template.render(&bindings).unwrap(), "interface eth0\nmtu 9000\n");
//! ```

mod ast;
mod error;
mod parser;
mod render;
mod value;

pub use error::TemplateError;
pub use render::Template;
pub use value::{Bindings, DiffPair, TemplateValue};

/// Parses and renders `source` in one call.
///
/// Prefer [`Template::parse`] when the same template is rendered for
/// many transactions.
pub fn render(source: &str, bindings: &Bindings) -> Result<String, TemplateError> {
    Template::parse(source)?.render(bindings)
}
