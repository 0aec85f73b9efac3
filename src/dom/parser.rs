//! Forgiving HTML parser producing an owned `Node` tree.
//!
//! Handles quoted/unquoted/bare attributes, void elements, comments,
//! doctype declarations and raw-text `script`/`style` bodies. Closing tags
//! that match an open ancestor implicitly close everything in between;
//! stray closing tags are dropped. Text is entity-decoded on the way in and
//! re-escaped by the serializer.

use std::collections::BTreeMap;

use super::node::{Element, Node, VOID_ELEMENTS};

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Parse a markup fragment into a list of nodes.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let mut pos = 0;
    let mut open = Vec::new();
    let mut nodes = parse_nodes(html, &mut pos, &mut open);
    merge_adjacent_text(&mut nodes);
    nodes
}

/// Parse a full document and return its `<html>` element.
///
/// Markup without an `<html>` root is wrapped in one.
pub fn parse_document(html: &str) -> Element {
    let nodes = parse_fragment(html);
    let root = nodes
        .iter()
        .filter_map(Node::as_element)
        .find(|el| el.tag() == "html")
        .cloned();

    match root {
        Some(root) => root,
        None => Element::from_parts("html".to_string(), BTreeMap::new(), nodes),
    }
}

fn parse_nodes(html: &str, pos: &mut usize, open: &mut Vec<String>) -> Vec<Node> {
    let bytes = html.as_bytes();
    let mut nodes = Vec::new();

    while *pos < bytes.len() {
        if bytes[*pos] != b'<' {
            let start = *pos;
            while *pos < bytes.len() && bytes[*pos] != b'<' {
                *pos += 1;
            }
            nodes.push(Node::Text(decode_entities(&html[start..*pos])));
            continue;
        }

        let rest = &html[*pos..];

        if rest.starts_with("<!--") {
            let body_start = *pos + 4;
            match html[body_start..].find("-->") {
                Some(end) => {
                    nodes.push(Node::Comment(html[body_start..body_start + end].to_string()));
                    *pos = body_start + end + 3;
                }
                None => {
                    nodes.push(Node::Comment(html[body_start..].to_string()));
                    *pos = bytes.len();
                }
            }
            continue;
        }

        // Doctype and other declarations are dropped
        if rest.starts_with("<!") || rest.starts_with("<?") {
            skip_past(bytes, pos, b'>');
            continue;
        }

        if rest.starts_with("</") {
            let name_start = *pos + 2;
            let mut name_end = name_start;
            while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
                name_end += 1;
            }
            let name = html[name_start..name_end].to_ascii_lowercase();

            if open.last().is_some_and(|top| *top == name) {
                skip_past(bytes, pos, b'>');
                return nodes;
            }
            if open.iter().any(|tag| *tag == name) {
                // Let the matching ancestor consume it
                return nodes;
            }
            skip_past(bytes, pos, b'>');
            continue;
        }

        let next = bytes.get(*pos + 1).copied().unwrap_or(b' ');
        if !next.is_ascii_alphabetic() {
            // A lone '<' is text
            *pos += 1;
            nodes.push(Node::Text("<".to_string()));
            continue;
        }

        nodes.push(Node::Element(parse_element(html, pos, open)));
    }

    nodes
}

fn parse_element(html: &str, pos: &mut usize, open: &mut Vec<String>) -> Element {
    let bytes = html.as_bytes();
    *pos += 1;

    let tag_start = *pos;
    while *pos < bytes.len() && is_name_byte(bytes[*pos]) {
        *pos += 1;
    }
    let tag = html[tag_start..*pos].to_ascii_lowercase();

    // Quote-aware scan for the end of the start tag
    let attrs_start = *pos;
    let mut in_quote: Option<u8> = None;
    let mut self_closed = false;
    while *pos < bytes.len() {
        let b = bytes[*pos];
        match in_quote {
            Some(q) if b == q => in_quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => in_quote = Some(b),
            None if b == b'>' => break,
            None if b == b'/' && bytes.get(*pos + 1) == Some(&b'>') => {
                self_closed = true;
                break;
            }
            None => {}
        }
        *pos += 1;
    }
    let attrs = parse_attrs(&html[attrs_start..*pos]);

    if self_closed {
        *pos += 2;
    } else if *pos < bytes.len() {
        *pos += 1;
    }

    if self_closed || VOID_ELEMENTS.contains(&tag.as_str()) {
        return Element::from_parts(tag, attrs, Vec::new());
    }

    if RAW_TEXT_TAGS.contains(&tag.as_str()) {
        let close = format!("</{tag}");
        let body_start = *pos;
        let body_end = find_ascii_case_insensitive(&html[body_start..], &close)
            .map(|offset| body_start + offset)
            .unwrap_or(bytes.len());
        *pos = body_end;
        skip_past(bytes, pos, b'>');

        let body = &html[body_start..body_end];
        let children = if body.is_empty() {
            Vec::new()
        } else {
            vec![Node::Text(body.to_string())]
        };
        return Element::from_parts(tag, attrs, children);
    }

    open.push(tag.clone());
    let mut children = parse_nodes(html, pos, open);
    open.pop();
    merge_adjacent_text(&mut children);

    Element::from_parts(tag, attrs, children)
}

/// Parse a raw attribute string: `key="value"`, `key='value'`, `key=value`, `key`.
fn parse_attrs(raw: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let bytes = raw.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' && bytes[i] != b'/' {
            i += 1;
        }
        let name = raw[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let value = if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                i += 1;
                let value_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                let value = &raw[value_start..i];
                i = (i + 1).min(bytes.len());
                value
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &raw[value_start..i]
            };
            if !name.is_empty() {
                map.entry(name).or_insert_with(|| decode_entities(value));
            }
        } else if !name.is_empty() {
            map.entry(name).or_insert_with(String::new);
        }
    }

    map
}

fn merge_adjacent_text(nodes: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match (merged.last_mut(), node) {
            (Some(Node::Text(prev)), Node::Text(text)) => prev.push_str(&text),
            (_, Node::Text(text)) if text.is_empty() => {}
            (_, node) => merged.push(node),
        }
    }
    *nodes = merged;
}

/// Decode the handful of entities page markup actually uses.
/// Unknown entities are kept verbatim.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &candidate[1..end];
            decode_entity(entity).map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn skip_past(bytes: &[u8], pos: &mut usize, target: u8) {
    while *pos < bytes.len() && bytes[*pos] != target {
        *pos += 1;
    }
    if *pos < bytes.len() {
        *pos += 1;
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn first_element(nodes: &[Node]) -> &Element {
        nodes
            .iter()
            .find_map(Node::as_element)
            .expect("fragment should contain an element")
    }

    // ==================== Structure Tests ====================

    #[test]
    fn test_parse_nested_elements() {
        let nodes = parse_fragment(r#"<main class="page home"><h1 data-i18n="title">Hi</h1><p>x</p></main>"#);
        let main = first_element(&nodes);
        assert_eq!(main.tag(), "main");
        assert_eq!(main.class_name(), "page home");
        assert_eq!(main.element_children().count(), 2);
        assert_eq!(main.text_content(), "Hix");
    }

    #[test]
    fn test_parse_document_finds_html_root() {
        let root = parse_document("<!DOCTYPE html><html lang=\"de\"><body><main></main></body></html>");
        assert_eq!(root.tag(), "html");
        assert_eq!(root.attr("lang"), Some("de"));
    }

    #[test]
    fn test_parse_document_wraps_bare_markup() {
        let root = parse_document("<main>content</main>");
        assert_eq!(root.tag(), "html");
        assert_eq!(root.element_children().next().map(Element::tag), Some("main"));
    }

    #[test]
    fn test_void_elements_have_no_children() {
        let nodes = parse_fragment(r#"<form><input placeholder="Name"><textarea data-i18n-placeholder="msg"></textarea></form>"#);
        let form = first_element(&nodes);
        let tags: Vec<_> = form.element_children().map(Element::tag).collect();
        assert_eq!(tags, vec!["input", "textarea"]);
    }

    #[test]
    fn test_self_closing_syntax() {
        let nodes = parse_fragment("<div><br/><span/>after</div>");
        let div = first_element(&nodes);
        assert_eq!(div.element_children().count(), 2);
        assert_eq!(div.text_content(), "after");
    }

    #[test]
    fn test_unclosed_child_closed_by_ancestor() {
        let nodes = parse_fragment("<ul><li>one<li>two</ul><p>next</p>");
        assert_eq!(nodes.len(), 2);
        let ul = first_element(&nodes);
        assert_eq!(ul.text_content(), "onetwo");
    }

    #[test]
    fn test_stray_closing_tag_is_dropped() {
        let nodes = parse_fragment("<div>a</span>b</div>");
        let div = first_element(&nodes);
        assert_eq!(div.text_content(), "ab");
    }

    #[test]
    fn test_script_body_is_raw() {
        let nodes = parse_fragment("<script>if (a < b) { x = '</div>'; }</script>");
        let script = first_element(&nodes);
        // the body stops at the first "</script" only
        assert_eq!(script.text_content(), "if (a < b) { x = '</div>'; }");
    }

    #[test]
    fn test_comments_are_kept() {
        let nodes = parse_fragment("<!-- nav --><nav></nav>");
        assert!(matches!(&nodes[0], Node::Comment(body) if body == " nav "));
    }

    // ==================== Attribute Tests ====================

    #[test]
    fn test_attribute_forms() {
        let attrs = parse_attrs(r#" href="about.html" data-lang='en' hidden width=10"#);
        assert_eq!(attrs.get("href").map(String::as_str), Some("about.html"));
        assert_eq!(attrs.get("data-lang").map(String::as_str), Some("en"));
        assert_eq!(attrs.get("hidden").map(String::as_str), Some(""));
        assert_eq!(attrs.get("width").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_attribute_with_gt_inside_quotes() {
        let nodes = parse_fragment(r#"<a title="a > b" href="x.html">x</a>"#);
        let a = first_element(&nodes);
        assert_eq!(a.attr("title"), Some("a > b"));
        assert_eq!(a.attr("href"), Some("x.html"));
    }

    #[test]
    fn test_duplicate_attribute_keeps_first() {
        let attrs = parse_attrs(r#" class="a" class="b""#);
        assert_eq!(attrs.get("class").map(String::as_str), Some("a"));
    }

    // ==================== Entity Tests ====================

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("&#252;ber &#xFC;ber"), "über über");
        assert_eq!(decode_entities("R&D &unknown;"), "R&D &unknown;");
    }

    #[test]
    fn test_text_round_trip_through_serializer() {
        let nodes = parse_fragment("<p>Fish &amp; Chips &lt;3</p>");
        let p = first_element(&nodes);
        assert_eq!(p.text_content(), "Fish & Chips <3");
        assert_eq!(p.inner_html(), "Fish &amp; Chips &lt;3");
    }

    #[test]
    fn test_utf8_text_survives() {
        let nodes = parse_fragment("<span>Über mich — 🎧</span>");
        assert_eq!(first_element(&nodes).text_content(), "Über mich — 🎧");
    }

    proptest! {
        #[test]
        fn prop_text_content_survives_serialize_and_reparse(text in "[a-zA-Z0-9 <>&\"'äöü]{0,40}") {
            let mut el = Element::new("p");
            el.set_text_content(&text);
            let reparsed = parse_fragment(&el.outer_html());
            let p = first_element(&reparsed);
            prop_assert_eq!(p.text_content(), text);
        }

        #[test]
        fn prop_parser_never_panics(input in ".{0,80}") {
            let _ = parse_fragment(&input);
        }
    }
}
