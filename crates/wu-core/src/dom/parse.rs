//! A forgiving HTML tokenizer and tree builder.
//!
//! Handles what page templates and partials actually contain: elements,
//! quoted and unquoted attributes, void elements, raw-text elements
//! (`script`, `style`), comments, doctype and character references.
//! Mismatched end tags close up to the nearest open element with that name
//! and are otherwise ignored. There is no implied-tag insertion.

use super::{Document, NodeId, VOID_ELEMENTS};

const RAW_TEXT: &[&str] = &["script", "style"];
const ESCAPABLE_RAW_TEXT: &[&str] = &["textarea", "title"];

/// Parse `html` and append the resulting nodes under `parent`.
pub(super) fn parse_into(doc: &mut Document, parent: NodeId, html: &str, inert_scripts: bool) {
    let mut stack: Vec<(NodeId, String)> = Vec::new();
    let mut pos = 0;
    let bytes = html.as_bytes();

    let current = |stack: &[(NodeId, String)]| stack.last().map_or(parent, |(id, _)| *id);

    while pos < html.len() {
        if bytes[pos] != b'<' {
            let end = html[pos..].find('<').map_or(html.len(), |i| pos + i);
            let text = decode_entities(&html[pos..end]);
            let t = doc.create_text(&text);
            doc.append_raw(current(&stack), t);
            pos = end;
            continue;
        }

        let rest = &html[pos..];

        if let Some(body) = rest.strip_prefix("<!--") {
            let (text, consumed) = match body.find("-->") {
                Some(i) => (&body[..i], 4 + i + 3),
                None => (body, rest.len()),
            };
            let c = doc.create_comment(text);
            doc.append_raw(current(&stack), c);
            pos += consumed;
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            // Unterminated markup runs to the end of input.
            let close = rest.find('>');
            let inner = rest[2..close.unwrap_or(rest.len())].trim();
            if rest.starts_with("<!") {
                let d = doc.create_doctype(inner);
                doc.append_raw(current(&stack), d);
            }
            pos += close.map_or(rest.len(), |i| i + 1);
            continue;
        }

        if let Some(after) = rest.strip_prefix("</") {
            let close = after.find('>');
            let name = after[..close.unwrap_or(after.len())]
                .trim()
                .to_ascii_lowercase();
            if let Some(i) = stack.iter().rposition(|(_, t)| *t == name) {
                stack.truncate(i);
            }
            pos += 2 + close.map_or(after.len(), |i| i + 1);
            continue;
        }

        let Some(tag) = read_start_tag(rest) else {
            // A lone '<' that does not open a tag is text.
            let t = doc.create_text("<");
            doc.append_raw(current(&stack), t);
            pos += 1;
            continue;
        };
        pos += tag.consumed;

        let el = doc.create_element(&tag.name);
        if let Some(e) = doc.element_mut(el) {
            e.attrs = tag.attrs;
            e.inert = inert_scripts && tag.name == "script";
        }
        doc.append_raw(current(&stack), el);

        if VOID_ELEMENTS.contains(&tag.name.as_str()) || tag.self_closing {
            continue;
        }

        let raw = RAW_TEXT.contains(&tag.name.as_str());
        if raw || ESCAPABLE_RAW_TEXT.contains(&tag.name.as_str()) {
            let body = &html[pos..];
            let close = find_close_tag(body, &tag.name);
            let content = &body[..close.unwrap_or(body.len())];
            if !content.is_empty() {
                let text = if raw {
                    content.to_owned()
                } else {
                    decode_entities(content)
                };
                let t = doc.create_text(&text);
                doc.append_raw(el, t);
            }
            pos += match close {
                Some(i) => i + body[i..].find('>').map_or(body.len() - i, |j| j + 1),
                None => body.len(),
            };
            continue;
        }

        stack.push((el, tag.name));
    }
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
    consumed: usize,
}

fn read_start_tag(input: &str) -> Option<StartTag> {
    let bytes = input.as_bytes();
    let mut i = 1;
    if !bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    let name_start = i;
    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
        i += 1;
    }
    let name = input[name_start..i].to_ascii_lowercase();

    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        match bytes[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                self_closing = bytes.get(i + 1) == Some(&b'>');
                i += 1;
                continue;
            }
            _ => {}
        }

        let key_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>')
            && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
        {
            i += 1;
        }
        let key = input[key_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match bytes.get(i) {
                Some(&q @ (b'"' | b'\'')) => {
                    let start = i + 1;
                    let end = input[start..]
                        .find(q as char)
                        .map_or(input.len(), |j| start + j);
                    value = decode_entities(&input[start..end]);
                    i = (end + 1).min(input.len());
                }
                Some(_) => {
                    let start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = decode_entities(&input[start..i]);
                }
                None => {}
            }
        }

        if !key.is_empty() && !attrs.iter().any(|(k, _)| *k == key) {
            attrs.push((key, value));
        }
    }

    Some(StartTag {
        name,
        attrs,
        self_closing,
        consumed: i,
    })
}

/// Byte offset of `</name` (case-insensitive) in `body`.
fn find_close_tag(body: &str, name: &str) -> Option<usize> {
    let lower = body.to_ascii_lowercase();
    let needle = format!("</{name}");
    let mut from = 0;
    while let Some(i) = lower[from..].find(&needle) {
        let at = from + i;
        let next = lower.as_bytes().get(at + needle.len());
        if next.is_none_or(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/') {
            return Some(at);
        }
        from = at + needle.len();
    }
    None
}

/// Decode the character references templates use in practice.
#[must_use]
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn attributes_quoted_unquoted_and_boolean() {
        let doc = Document::parse(r#"<input type=text name='stage' disabled value="a &quot;b&quot;">"#);
        let input = doc.elements_by_tag("input")[0];
        assert_eq!(doc.attr(input, "type"), Some("text"));
        assert_eq!(doc.attr(input, "name"), Some("stage"));
        assert_eq!(doc.attr(input, "disabled"), Some(""));
        assert_eq!(doc.attr(input, "value"), Some("a \"b\""));
    }

    #[test]
    fn script_body_is_raw_text() {
        let doc = Document::parse("<script>if (a < b && c) { x('</div>'); }</script><p>after</p>");
        let script = doc.elements_by_tag("script")[0];
        assert_eq!(doc.text_content(script), "if (a < b && c) { x('</div>'); }");
        assert_eq!(doc.elements_by_tag("p").len(), 1);
    }

    #[test]
    fn mismatched_end_tags_are_tolerated() {
        let doc = Document::parse("<div><span>a</div><p>b</p></em>");
        assert_eq!(doc.to_html(), "<div><span>a</span></div><p>b</p>");
    }

    #[test]
    fn self_closing_and_comments() {
        let doc = Document::parse("<div data-include=\"/nav.html\"/><!-- note --><i>x</i>");
        assert_eq!(doc.to_html(), "<div data-include=\"/nav.html\"></div><!-- note --><i>x</i>");
    }

    #[test]
    fn entity_decoding() {
        assert_eq!(decode_entities("R&amp;D &lt;3 &#65;&#x42; &bogus; &"), "R&D <3 AB &bogus; &");
    }

    #[test]
    fn unterminated_markup_before_multibyte_text() {
        let doc = Document::parse("<p>x</p><!é");
        assert_eq!(doc.elements_by_tag("p").len(), 1);

        let doc = Document::parse("<b>Café</b></é");
        let b = doc.elements_by_tag("b")[0];
        assert_eq!(doc.text_content(b), "Café");

        let doc = Document::parse("<i>ok</i><?é");
        assert_eq!(doc.to_html(), "<i>ok</i>");
    }

    #[test]
    fn stray_lt_is_text() {
        let doc = Document::parse("<p>a < b</p>");
        let p = doc.elements_by_tag("p")[0];
        assert_eq!(doc.text_content(p), "a < b");
    }
}
