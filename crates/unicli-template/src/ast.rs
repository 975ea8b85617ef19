//! Typed template AST.

/// A dotted variable reference: `$name.field.subfield`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VarRef {
    pub name: String,
    pub fields: Vec<String>,
}

/// One node of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    /// Literal text emitted as-is.
    Text(String),
    /// `{$name.field}` substitution.
    Subst(VarRef),
    /// `{% if %}` chain: each arm is a condition plus its body; the
    /// final else body is optional.
    If {
        arms: Vec<(VarRef, Vec<Node>)>,
        otherwise: Option<Vec<Node>>,
    },
    /// `{% loop in $seq as $item %}` over an ordered sequence.
    Loop {
        seq: VarRef,
        bind: String,
        body: Vec<Node>,
    },
    /// `{$var|update(field,changed,removed)}` diff macro.
    Update {
        var: String,
        field: String,
        changed: Vec<Fragment>,
        removed: Vec<Fragment>,
        /// Source text of the macro, carried for error context.
        source: String,
    },
}

/// A piece of an `update()` inner template: literal text or a
/// backtick-quoted field reference resolved against the active side of
/// the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    Text(String),
    FieldRef(String),
}
