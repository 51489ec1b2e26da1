//! Message templates: `"Order {orderId} shipped to {customer}"`.
//!
//! Placeholders have the form `{[@|$]name[,alignment][:format]}`. A property
//! missing from the event leaves the placeholder text untouched, so
//! `"{missing}"` renders as `{missing}`.

use crate::record::Properties;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destructuring {
    Default,
    /// `{@name}`
    Destructure,
    /// `{$name}`
    Stringify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    /// Pad on the right instead of the left.
    pub left: bool,
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyToken {
    /// Original placeholder text including braces.
    pub raw: String,
    pub name: String,
    pub destructuring: Destructuring,
    pub alignment: Option<Alignment>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Property(PropertyToken),
}

/// A parsed message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<Token>,
}

impl MessageTemplate {
    pub fn parse(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' if bytes.get(i + 1) == Some(&b'{') => {
                    literal.push('{');
                    i += 2;
                }
                b'{' => {
                    let rest = &text[i + 1..];
                    match rest.find(&['{', '}'][..]) {
                        Some(end) if rest.as_bytes()[end] == b'}' => {
                            let raw = &text[i..i + end + 2];
                            match PropertyToken::parse(&rest[..end], raw) {
                                Some(token) => {
                                    if !literal.is_empty() {
                                        tokens.push(Token::Text(std::mem::take(&mut literal)));
                                    }
                                    tokens.push(Token::Property(token));
                                }
                                None => literal.push_str(raw),
                            }
                            i += end + 2;
                        }
                        // Unclosed, or another `{` starts first.
                        _ => {
                            literal.push('{');
                            i += 1;
                        }
                    }
                }
                b'}' => {
                    literal.push('}');
                    i += if bytes.get(i + 1) == Some(&b'}') { 2 } else { 1 };
                }
                _ => {
                    let end = text[i..]
                        .find(&['{', '}'][..])
                        .map_or(text.len(), |off| i + off);
                    literal.push_str(&text[i..end]);
                    i = end;
                }
            }
        }

        if !literal.is_empty() {
            tokens.push(Token::Text(literal));
        }

        MessageTemplate { text: text.to_string(), tokens }
    }

    /// The raw template text, as hashed for the fingerprint.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn render(&self, properties: &Properties) -> String {
        let mut out = String::with_capacity(self.text.len());
        for token in &self.tokens {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Property(prop) => match properties.get(&prop.name) {
                    Some(value) => prop.render_value(value, &mut out),
                    None => out.push_str(&prop.raw),
                },
            }
        }
        out
    }
}

impl PropertyToken {
    fn parse(inner: &str, raw: &str) -> Option<Self> {
        let (head, format) = match inner.split_once(':') {
            Some((_, "")) => return None,
            Some((head, format)) => (head, Some(format.to_string())),
            None => (inner, None),
        };

        let (name, alignment) = match head.split_once(',') {
            Some((name, align)) => (name, Some(parse_alignment(align)?)),
            None => (head, None),
        };

        let (destructuring, name) = if let Some(n) = name.strip_prefix('@') {
            (Destructuring::Destructure, n)
        } else if let Some(n) = name.strip_prefix('$') {
            (Destructuring::Stringify, n)
        } else {
            (Destructuring::Default, name)
        };

        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }

        Some(PropertyToken {
            raw: raw.to_string(),
            name: name.to_string(),
            destructuring,
            alignment,
            format,
        })
    }

    fn render_value(&self, value: &Value, out: &mut String) {
        let text = match (value, self.format.as_deref()) {
            (_, Some("j")) => value.to_string(),
            (Value::String(s), _) => s.clone(),
            // Compact JSON for everything else.
            (other, _) => other.to_string(),
        };

        match self.alignment {
            Some(align) => {
                let pad = align.width.saturating_sub(text.chars().count());
                if align.left {
                    out.push_str(&text);
                    out.extend(std::iter::repeat(' ').take(pad));
                } else {
                    out.extend(std::iter::repeat(' ').take(pad));
                    out.push_str(&text);
                }
            }
            None => out.push_str(&text),
        }
    }
}

/// Widest alignment honored; wider placeholders render as literal text.
pub const MAX_ALIGNMENT_WIDTH: usize = 1024;

fn parse_alignment(s: &str) -> Option<Alignment> {
    let (left, digits) = match s.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let width: usize = digits.parse().ok()?;
    if width > MAX_ALIGNMENT_WIDTH {
        return None;
    }
    Some(Alignment { left, width })
}

/// Parse `template` and render it against `properties` in one step.
pub fn render(template: &str, properties: &Properties) -> String {
    MessageTemplate::parse(template).render(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn substitutes_named_properties() {
        let p = props(json!({"name": "World"}));
        assert_eq!(render("Hello {name}", &p), "Hello World");
    }

    #[test]
    fn renders_non_string_values_as_json() {
        let p = props(json!({"id": 42, "ok": true, "none": null, "tags": ["a", 1], "o": {"k": "v"}}));
        assert_eq!(
            render("{id} {ok} {none} {tags} {o}", &p),
            r#"42 true null ["a",1] {"k":"v"}"#
        );
    }

    #[test]
    fn missing_property_keeps_placeholder() {
        let p = props(json!({"a": 1}));
        assert_eq!(render("{a} and {missing,5:x}", &p), "1 and {missing,5:x}");
    }

    #[test]
    fn double_braces_are_literal() {
        let p = props(json!({"a": 1}));
        assert_eq!(render("{{a}} is {a} }}", &p), "{a} is 1 }");
    }

    #[test]
    fn malformed_placeholders_render_as_text() {
        let p = props(json!({"a": 1}));
        assert_eq!(render("{} {a b} {a,x} {a: } {unclosed", &p), "{} {a b} {a,x} 1 {unclosed");
        assert_eq!(render("{{{a}", &p), "{1");
        assert_eq!(render("{ {a}", &p), "{ 1");
    }

    #[test]
    fn destructuring_prefix_is_not_part_of_name() {
        let p = props(json!({"order": {"id": 7}, "user": "bob"}));
        let t = MessageTemplate::parse("{@order} by {$user}");
        match &t.tokens()[0] {
            Token::Property(prop) => {
                assert_eq!(prop.name, "order");
                assert_eq!(prop.destructuring, Destructuring::Destructure);
            }
            other => panic!("unexpected token {:?}", other),
        }
        assert_eq!(t.render(&p), r#"{"id":7} by bob"#);
    }

    #[test]
    fn honors_alignment_and_json_format() {
        let p = props(json!({"n": "ab", "s": "q"}));
        assert_eq!(render("[{n,4}][{n,-4}][{n,1}]", &p), "[  ab][ab  ][ab]");
        assert_eq!(render("{s:j} {s:l}", &p), "\"q\" q");
    }

    #[test]
    fn oversized_alignment_renders_as_text() {
        let p = props(json!({"n": "ab"}));
        assert_eq!(render("{n,99999999999999}", &p), "{n,99999999999999}");
        assert_eq!(render("{n,-1025}|{n,1024}", &p).len(), "{n,-1025}|".len() + 1024);
    }

    #[test]
    fn keeps_raw_text() {
        let t = MessageTemplate::parse("Hello {name}");
        assert_eq!(t.text(), "Hello {name}");
        assert_eq!(t.tokens().len(), 2);
    }
}
