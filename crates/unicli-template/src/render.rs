//! Tree-walking template evaluator.

use crate::ast::{Fragment, Node, VarRef};
use crate::value::{Bindings, DiffPair, TemplateValue};
use crate::{parser, TemplateError};
use unicli_model::{ConfigNode, Value};

/// A parsed template, renderable against many binding sets.
///
/// See the crate docs for the supported constructs.
#[derive(Debug)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parses template source into a typed AST.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Parse`] with the byte offset of the
    /// malformed construct.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            nodes: parser::parse(source)?,
        })
    }

    /// Renders the template against the given bindings.
    pub fn render(&self, bindings: &Bindings) -> Result<String, TemplateError> {
        let mut out = String::new();
        let mut scope = Scope {
            bindings,
            locals: Vec::new(),
        };
        render_nodes(&self.nodes, &mut scope, &mut out)?;
        Ok(out)
    }
}

/// Lexical scope: the caller's bindings plus loop-local variables.
struct Scope<'a> {
    bindings: &'a Bindings,
    locals: Vec<(String, &'a TemplateValue)>,
}

impl<'a> Scope<'a> {
    fn lookup(&self, name: &str) -> Option<&'a TemplateValue> {
        self.locals
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .or_else(|| self.bindings.get(name))
    }
}

/// A resolved reference.
enum Resolved<'a> {
    Scalar(&'a Value),
    Node(&'a ConfigNode),
    List(&'a [TemplateValue]),
    Diff(&'a DiffPair),
}

fn resolve<'a>(scope: &Scope<'a>, var: &VarRef) -> Option<Resolved<'a>> {
    resolve_in(scope.lookup(&var.name)?, &var.fields)
}

fn resolve_in<'a>(base: &'a TemplateValue, fields: &[String]) -> Option<Resolved<'a>> {
    match base {
        TemplateValue::Scalar(v) => fields.is_empty().then_some(Resolved::Scalar(v)),
        TemplateValue::List(l) => fields.is_empty().then_some(Resolved::List(l)),
        TemplateValue::Node(n) => resolve_node(n, fields),
        TemplateValue::Diff(d) => {
            if fields.is_empty() {
                return Some(Resolved::Diff(d));
            }
            // Field access on a diff pair reads the desired state,
            // falling back to the previous state on delete.
            resolve_node(d.after().or(d.before())?, fields)
        }
    }
}

fn resolve_node<'a>(node: &'a ConfigNode, fields: &[String]) -> Option<Resolved<'a>> {
    let mut current = node;
    for (i, field) in fields.iter().enumerate() {
        if i == fields.len() - 1 {
            if let Some(value) = current.get(field) {
                return Some(Resolved::Scalar(value));
            }
            return current.child(field).map(Resolved::Node);
        }
        current = current.child(field)?;
    }
    Some(Resolved::Node(node))
}

/// Truthiness of a condition reference: absent is false, booleans by
/// value, a non-empty sequence or any other present value is true.
fn truthy(resolved: Option<&Resolved<'_>>) -> bool {
    match resolved {
        None => false,
        Some(Resolved::Scalar(Value::Bool(b))) => *b,
        Some(Resolved::Scalar(_)) => true,
        Some(Resolved::Node(_)) => true,
        Some(Resolved::List(items)) => !items.is_empty(),
        Some(Resolved::Diff(pair)) => pair.after().is_some(),
    }
}

fn render_nodes<'a>(
    nodes: &[Node],
    scope: &mut Scope<'a>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Subst(var) => {
                // Missing bindings render empty; only scalars have a
                // textual form.
                if let Some(Resolved::Scalar(value)) = resolve(scope, var) {
                    out.push_str(&value.to_string());
                }
            }
            Node::If { arms, otherwise } => {
                let mut taken = false;
                for (cond, body) in arms {
                    if truthy(resolve(scope, cond).as_ref()) {
                        render_nodes(body, scope, out)?;
                        taken = true;
                        break;
                    }
                }
                if !taken {
                    if let Some(body) = otherwise {
                        render_nodes(body, scope, out)?;
                    }
                }
            }
            Node::Loop { seq, bind, body } => {
                let items = match resolve(scope, seq) {
                    Some(Resolved::List(items)) => items,
                    // An absent or non-sequence binding iterates nothing.
                    _ => &[],
                };
                for item in items {
                    scope.locals.push((bind.clone(), item));
                    let result = render_nodes(body, scope, out);
                    scope.locals.pop();
                    result?;
                }
            }
            Node::Update {
                var,
                field,
                changed,
                removed,
                source,
            } => render_update(scope, var, field, changed, removed, source, out)?,
        }
    }
    Ok(())
}

/// Evaluates the `update()` macro against a diff-pair binding.
fn render_update(
    scope: &Scope<'_>,
    var: &str,
    field: &str,
    changed: &[Fragment],
    removed: &[Fragment],
    source: &str,
    out: &mut String,
) -> Result<(), TemplateError> {
    let Some(TemplateValue::Diff(pair)) = scope.lookup(var) else {
        // update() on anything but a diff pair is an adapter bug.
        return Err(TemplateError::unresolved(var, source));
    };

    let before_value = pair.before().and_then(|n| n.lookup(field));
    let after_value = pair.after().and_then(|n| n.lookup(field));

    match (before_value, after_value) {
        (_, Some(after_field)) => {
            let is_change = pair.before().is_none() || before_value != Some(after_field);
            if is_change {
                let active = pair.after().expect("after side present");
                render_fragments(changed, active, var, source, out)?;
            }
        }
        (Some(_), None) => {
            let active = pair.before().expect("before side present");
            render_fragments(removed, active, var, source, out)?;
        }
        (None, None) => {}
    }
    Ok(())
}

/// Renders one inner template of `update()`, resolving backtick field
/// references against the active side.
fn render_fragments(
    fragments: &[Fragment],
    active: &ConfigNode,
    var: &str,
    source: &str,
    out: &mut String,
) -> Result<(), TemplateError> {
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => out.push_str(text),
            Fragment::FieldRef(reference) => {
                // Accept both `mtu` and `$data.mtu` reference forms.
                let dotted = reference
                    .strip_prefix('$')
                    .and_then(|r| r.strip_prefix(var))
                    .and_then(|r| r.strip_prefix('.'))
                    .unwrap_or(reference);
                let value = active
                    .lookup(dotted)
                    .ok_or_else(|| TemplateError::unresolved(reference.clone(), source))?;
                out.push_str(&value.to_string());
            }
        }
    }
    Ok(())
}
