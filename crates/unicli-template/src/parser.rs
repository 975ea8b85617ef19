//! Template source parser.
//!
//! Hand-rolled scanner producing the typed AST. Constructs are `{$...}`
//! (substitution or the update macro) and `{% ... %}` control tags; a
//! lone `{` is literal text.

use crate::ast::{Fragment, Node, VarRef};
use crate::TemplateError;

/// Block terminator tags handed back to the enclosing construct.
#[derive(Debug, PartialEq, Eq)]
enum Tag {
    ElseIf(VarRef),
    Else,
    EndIf,
    EndLoop,
}

pub(crate) fn parse(source: &str) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser { src: source, pos: 0 };
    let (nodes, terminator) = parser.parse_nodes()?;
    if let Some(tag) = terminator {
        return Err(TemplateError::parse(
            parser.pos,
            format!("unexpected {}", tag_name(&tag)),
        ));
    }
    Ok(nodes)
}

fn tag_name(tag: &Tag) -> &'static str {
    match tag {
        Tag::ElseIf(_) => "'elseIf' outside an if block",
        Tag::Else => "'else' outside an if block",
        Tag::EndIf => "'endif' without matching 'if'",
        Tag::EndLoop => "'endloop' without matching 'loop'",
    }
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    /// Parses nodes until a terminator tag or end of input.
    ///
    /// The terminator, if any, is returned for the enclosing construct
    /// to validate; at top level any terminator is an error.
    fn parse_nodes(&mut self) -> Result<(Vec<Node>, Option<Tag>), TemplateError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            if rest.starts_with("{$") {
                flush_text(&mut text, &mut nodes);
                nodes.push(self.parse_dollar()?);
            } else if rest.starts_with("{%") {
                flush_text(&mut text, &mut nodes);
                let tag_pos = self.pos;
                match self.parse_tag()? {
                    OpenOrClose::If(cond) => nodes.push(self.parse_if(cond, tag_pos)?),
                    OpenOrClose::Loop { seq, bind } => {
                        nodes.push(self.parse_loop(seq, bind, tag_pos)?)
                    }
                    OpenOrClose::Close(tag) => return Ok((nodes, Some(tag))),
                }
            } else {
                // Advance one char of literal text.
                let ch = rest.chars().next().expect("non-empty rest");
                text.push(ch);
                self.pos += ch.len_utf8();
            }
        }

        flush_text(&mut text, &mut nodes);
        Ok((nodes, None))
    }

    /// Parses an if chain after its opening tag has been consumed.
    fn parse_if(&mut self, first_cond: VarRef, start: usize) -> Result<Node, TemplateError> {
        let mut arms = Vec::new();
        let mut cond = first_cond;
        let mut otherwise = None;

        loop {
            let (body, terminator) = self.parse_nodes()?;
            match terminator {
                Some(Tag::ElseIf(next_cond)) => {
                    arms.push((cond, body));
                    cond = next_cond;
                }
                Some(Tag::Else) => {
                    arms.push((cond, body));
                    let (else_body, end) = self.parse_nodes()?;
                    match end {
                        Some(Tag::EndIf) => {
                            otherwise = Some(else_body);
                            break;
                        }
                        _ => {
                            return Err(TemplateError::parse(
                                start,
                                "expected 'endif' after 'else' block",
                            ))
                        }
                    }
                }
                Some(Tag::EndIf) => {
                    arms.push((cond, body));
                    break;
                }
                _ => return Err(TemplateError::parse(start, "unterminated 'if' block")),
            }
        }

        Ok(Node::If { arms, otherwise })
    }

    /// Parses a loop body after its opening tag has been consumed.
    fn parse_loop(
        &mut self,
        seq: VarRef,
        bind: String,
        start: usize,
    ) -> Result<Node, TemplateError> {
        let (body, terminator) = self.parse_nodes()?;
        match terminator {
            Some(Tag::EndLoop) => Ok(Node::Loop { seq, bind, body }),
            _ => Err(TemplateError::parse(start, "unterminated 'loop' block")),
        }
    }

    /// Parses one `{% ... %}` tag.
    fn parse_tag(&mut self) -> Result<OpenOrClose, TemplateError> {
        let start = self.pos;
        let inner_start = start + 2;
        let end = self.src[inner_start..]
            .find("%}")
            .ok_or_else(|| TemplateError::parse(start, "unterminated '{%' tag"))?;
        let content = self.src[inner_start..inner_start + end].trim();
        self.pos = inner_start + end + 2;

        if let Some(rest) = content.strip_prefix("if") {
            return Ok(OpenOrClose::If(parse_condition(rest, start)?));
        }
        if let Some(rest) = content.strip_prefix("elseIf") {
            return Ok(OpenOrClose::Close(Tag::ElseIf(parse_condition(
                rest, start,
            )?)));
        }
        match content {
            "else" => Ok(OpenOrClose::Close(Tag::Else)),
            "endif" => Ok(OpenOrClose::Close(Tag::EndIf)),
            "endloop" => Ok(OpenOrClose::Close(Tag::EndLoop)),
            _ => {
                if let Some(rest) = content.strip_prefix("loop") {
                    return parse_loop_head(rest, start);
                }
                Err(TemplateError::parse(
                    start,
                    format!("unknown tag '{}'", content),
                ))
            }
        }
    }

    /// Parses `{$...}`: a substitution or the update macro.
    fn parse_dollar(&mut self) -> Result<Node, TemplateError> {
        let start = self.pos;
        self.pos += 2;

        let name = self.take_ident(start)?;
        match self.peek() {
            Some('}') => {
                self.pos += 1;
                Ok(Node::Subst(VarRef {
                    name,
                    fields: Vec::new(),
                }))
            }
            Some('.') => {
                let mut fields = Vec::new();
                while self.peek() == Some('.') {
                    self.pos += 1;
                    fields.push(self.take_ident(start)?);
                }
                match self.peek() {
                    Some('}') => {
                        self.pos += 1;
                        Ok(Node::Subst(VarRef { name, fields }))
                    }
                    _ => Err(TemplateError::parse(
                        start,
                        "expected '}' after variable reference",
                    )),
                }
            }
            Some('|') => {
                self.pos += 1;
                self.parse_update(name, start)
            }
            _ => Err(TemplateError::parse(
                start,
                "expected '}', '.', or '|' in variable reference",
            )),
        }
    }

    /// Parses `update(field,changed,removed)}` after the pipe.
    ///
    /// Arguments split at commas outside backticks; the macro terminates
    /// at the first `)}` outside backticks, so fragments may contain
    /// parentheses but not that closing sequence.
    fn parse_update(&mut self, var: String, start: usize) -> Result<Node, TemplateError> {
        if !self.src[self.pos..].starts_with("update(") {
            return Err(TemplateError::parse(
                start,
                "only 'update(...)' may follow '|'",
            ));
        }
        self.pos += "update(".len();

        let mut args: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut in_backticks = false;

        loop {
            let Some(ch) = self.peek() else {
                return Err(TemplateError::parse(start, "unterminated 'update(' macro"));
            };
            self.pos += ch.len_utf8();
            match ch {
                '`' => {
                    in_backticks = !in_backticks;
                    current.push(ch);
                }
                ',' if !in_backticks => {
                    args.push(current);
                    current = String::new();
                }
                ')' if !in_backticks && self.peek() == Some('}') => {
                    self.pos += 1;
                    args.push(current);
                    break;
                }
                _ => current.push(ch),
            }
        }
        if args.len() != 3 {
            return Err(TemplateError::parse(
                start,
                format!(
                    "'update(' takes (field, changed, removed), got {} argument(s)",
                    args.len()
                ),
            ));
        }

        let field = args[0].trim().to_string();
        if field.is_empty() {
            return Err(TemplateError::parse(start, "'update(' field name is empty"));
        }
        let source = self.src[start..self.pos].to_string();
        Ok(Node::Update {
            var,
            field,
            changed: parse_fragments(&args[1], start)?,
            removed: parse_fragments(&args[2], start)?,
            source,
        })
    }

    fn take_ident(&mut self, construct_start: usize) -> Result<String, TemplateError> {
        let rest = &self.src[self.pos..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '-'))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(TemplateError::parse(
                construct_start,
                "expected identifier",
            ));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }
}

enum OpenOrClose {
    If(VarRef),
    Loop { seq: VarRef, bind: String },
    Close(Tag),
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}

/// Parses the `($ref)` condition of an if/elseIf tag; parentheses are
/// optional.
fn parse_condition(rest: &str, pos: usize) -> Result<VarRef, TemplateError> {
    let inner = rest.trim();
    let inner = inner
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(inner)
        .trim();
    parse_var_ref(inner, pos)
}

/// Parses `in $seq as $item` of a loop tag.
fn parse_loop_head(rest: &str, pos: usize) -> Result<OpenOrClose, TemplateError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        ["in", seq, "as", item] => {
            let seq = parse_var_ref(seq, pos)?;
            let bind = parse_var_ref(item, pos)?;
            if !bind.fields.is_empty() {
                return Err(TemplateError::parse(
                    pos,
                    "loop binding must be a plain variable",
                ));
            }
            Ok(OpenOrClose::Loop {
                seq,
                bind: bind.name,
            })
        }
        _ => Err(TemplateError::parse(
            pos,
            "expected 'loop in $seq as $item'",
        )),
    }
}

fn parse_var_ref(s: &str, pos: usize) -> Result<VarRef, TemplateError> {
    let body = s
        .strip_prefix('$')
        .ok_or_else(|| TemplateError::parse(pos, format!("expected '$' reference, got '{s}'")))?;
    let mut segments = body.split('.');
    let name = segments.next().unwrap_or_default();
    if name.is_empty() {
        return Err(TemplateError::parse(pos, "empty variable name"));
    }
    let fields: Vec<String> = segments.map(str::to_string).collect();
    if fields.iter().any(String::is_empty) {
        return Err(TemplateError::parse(
            pos,
            format!("empty field segment in '{s}'"),
        ));
    }
    Ok(VarRef {
        name: name.to_string(),
        fields,
    })
}

/// Splits an update fragment at backticks: outside is literal text,
/// inside is a field reference.
fn parse_fragments(raw: &str, pos: usize) -> Result<Vec<Fragment>, TemplateError> {
    let mut fragments = Vec::new();
    for (i, piece) in raw.split('`').enumerate() {
        if i % 2 == 0 {
            if !piece.is_empty() {
                fragments.push(Fragment::Text(piece.to_string()));
            }
        } else {
            let reference = piece.trim();
            if reference.is_empty() {
                return Err(TemplateError::parse(pos, "empty '`' field reference"));
            }
            fragments.push(Fragment::FieldRef(reference.to_string()));
        }
    }
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_and_lone_brace() {
        let nodes = parse("mtu { 9100 }").unwrap();
        assert_eq!(nodes, vec![Node::Text("mtu { 9100 }".to_string())]);
    }

    #[test]
    fn test_substitution() {
        let nodes = parse("interface {$name}").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Text("interface ".to_string()),
                Node::Subst(VarRef {
                    name: "name".to_string(),
                    fields: vec![],
                }),
            ]
        );
    }

    #[test]
    fn test_dotted_substitution() {
        let nodes = parse("{$iface.config.mtu}").unwrap();
        assert_eq!(
            nodes,
            vec![Node::Subst(VarRef {
                name: "iface".to_string(),
                fields: vec!["config".to_string(), "mtu".to_string()],
            })]
        );
    }

    #[test]
    fn test_if_else_chain() {
        let nodes =
            parse("{% if ($a) %}A{% elseIf ($b) %}B{% else %}C{% endif %}").unwrap();
        match &nodes[0] {
            Node::If { arms, otherwise } => {
                assert_eq!(arms.len(), 2);
                assert_eq!(arms[0].0.name, "a");
                assert_eq!(arms[1].0.name, "b");
                assert_eq!(otherwise.as_deref(), Some(&[Node::Text("C".to_string())][..]));
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn test_loop_head() {
        let nodes = parse("{% loop in $members as $m %}{$m.name}\n{% endloop %}").unwrap();
        match &nodes[0] {
            Node::Loop { seq, bind, body } => {
                assert_eq!(seq.name, "members");
                assert_eq!(bind, "m");
                assert_eq!(body.len(), 2);
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn test_update_macro() {
        let nodes = parse("{$data|update(mtu,mtu `mtu`\n,no mtu\n)}").unwrap();
        match &nodes[0] {
            Node::Update {
                var,
                field,
                changed,
                removed,
                ..
            } => {
                assert_eq!(var, "data");
                assert_eq!(field, "mtu");
                assert_eq!(
                    changed,
                    &vec![
                        Fragment::Text("mtu ".to_string()),
                        Fragment::FieldRef("mtu".to_string()),
                        Fragment::Text("\n".to_string()),
                    ]
                );
                assert_eq!(removed, &vec![Fragment::Text("no mtu\n".to_string())]);
            }
            other => panic!("unexpected node: {other:?}"),
        }
    }

    #[test]
    fn test_update_arity_error() {
        let err = parse("{$data|update(mtu,only one)}").unwrap_err();
        assert!(err.to_string().contains("got 2 argument(s)"));
    }

    #[test]
    fn test_unterminated_constructs() {
        assert!(parse("{% if ($a) %}no end").is_err());
        assert!(parse("{% loop in $s as $i %}body").is_err());
        assert!(parse("{$name").is_err());
        assert!(parse("{$data|update(a,b,c").is_err());
    }

    #[test]
    fn test_stray_terminators() {
        assert!(parse("{% endif %}").is_err());
        assert!(parse("{% endloop %}").is_err());
        assert!(parse("{% else %}").is_err());
    }

    #[test]
    fn test_unknown_tag() {
        let err = parse("{% include x %}").unwrap_err();
        assert!(err.to_string().contains("unknown tag"));
    }
}
