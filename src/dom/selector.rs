//! A small CSS selector subset: `tag`, `#id`, `.class`, `[attr]`,
//! `[attr=value]`, descendant combinators and comma-separated lists.

use std::str::FromStr;

use thiserror::Error;

use super::node::Element;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected character '{found}' at offset {offset} in selector '{selector}'")]
    Unexpected {
        selector: String,
        found: char,
        offset: usize,
    },

    #[error("unsupported combinator '{0}'; only descendant combinators are supported")]
    UnsupportedCombinator(char),

    #[error("unterminated attribute selector in '{0}'")]
    UnterminatedAttribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

/// Compound selectors joined by descendant combinators; the last one is the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for group in input.split(',') {
            alternatives.push(parse_complex(group, input)?);
        }
        Ok(Self { alternatives })
    }

    /// Whether `el` matches, given its ancestors ordered root first.
    pub fn matches(&self, ancestors: &[&Element], el: &Element) -> bool {
        self.alternatives.iter().any(|complex| complex.matches(ancestors, el))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl Complex {
    fn matches(&self, ancestors: &[&Element], el: &Element) -> bool {
        let Some((subject, rest)) = self.parts.split_last() else {
            return false;
        };
        if !subject.matches(el) {
            return false;
        }

        // Descendant-only chains can be matched greedily, nearest ancestor first
        let mut remaining = rest.iter().rev().peekable();
        for ancestor in ancestors.iter().rev() {
            match remaining.peek() {
                Some(part) if part.matches(ancestor) => {
                    remaining.next();
                }
                Some(_) => {}
                None => break,
            }
        }
        remaining.peek().is_none()
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && tag != el.tag() {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| el.has_class(class)) {
            return false;
        }
        self.attrs.iter().all(|attr| match &attr.value {
            Some(value) => el.attr(&attr.name) == Some(value.as_str()),
            None => el.has_attr(&attr.name),
        })
    }
}

fn parse_complex(group: &str, whole: &str) -> Result<Complex, SelectorError> {
    let chars: Vec<(usize, char)> = group.char_indices().collect();
    let mut parts = Vec::new();
    let mut current = Compound::default();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
                i += 1;
            }
            '>' | '+' | '~' => return Err(SelectorError::UnsupportedCombinator(c)),
            '#' => {
                let (ident, next) = read_ident(&chars, i + 1);
                if ident.is_empty() {
                    return Err(unexpected(whole, c, offset));
                }
                current.id = Some(ident);
                i = next;
            }
            '.' => {
                let (ident, next) = read_ident(&chars, i + 1);
                if ident.is_empty() {
                    return Err(unexpected(whole, c, offset));
                }
                current.classes.push(ident);
                i = next;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|(_, c)| *c == ']')
                    .map(|p| p + i)
                    .ok_or_else(|| SelectorError::UnterminatedAttribute(whole.to_string()))?;
                let body: String = chars[i + 1..close].iter().map(|(_, c)| *c).collect();
                current.attrs.push(parse_attr_match(&body));
                i = close + 1;
            }
            '*' => {
                current.tag = Some("*".to_string());
                i += 1;
            }
            c if is_ident_char(c) => {
                let (ident, next) = read_ident(&chars, i);
                current.tag = Some(ident.to_ascii_lowercase());
                i = next;
            }
            _ => return Err(unexpected(whole, c, offset)),
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }
    if parts.is_empty() {
        return Err(SelectorError::Empty);
    }
    Ok(Complex { parts })
}

fn parse_attr_match(body: &str) -> AttrMatch {
    match body.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            AttrMatch {
                name: name.trim().to_ascii_lowercase(),
                value: Some(value.to_string()),
            }
        }
        None => AttrMatch {
            name: body.trim().to_ascii_lowercase(),
            value: None,
        },
    }
}

fn read_ident(chars: &[(usize, char)], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && is_ident_char(chars[end].1) {
        end += 1;
    }
    (chars[start..end].iter().map(|(_, c)| *c).collect(), end)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn unexpected(selector: &str, found: char, offset: usize) -> SelectorError {
    SelectorError::Unexpected {
        selector: selector.to_string(),
        found,
        offset,
    }
}
