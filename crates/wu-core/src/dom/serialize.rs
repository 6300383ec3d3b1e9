//! HTML serialization.

use std::fmt::Write as _;

use super::{Document, NodeData, NodeId, VOID_ELEMENTS};

pub(super) fn children_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for &c in doc.children(node) {
        write_node(doc, c, &mut out);
    }
    out
}

pub(super) fn node_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.data(node) {
        NodeData::Document => {
            for &c in doc.children(node) {
                write_node(doc, c, out);
            }
        }
        NodeData::Doctype(text) => {
            let _ = write!(out, "<!{text}>");
        }
        NodeData::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
        NodeData::Text(text) => {
            let raw = doc
                .parent(node)
                .and_then(|p| doc.tag(p))
                .is_some_and(|t| t == "script" || t == "style");
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (k, v) in &el.attrs {
                out.push(' ');
                out.push_str(k);
                if !v.is_empty() {
                    out.push_str("=\"");
                    escape_attr(v, out);
                    out.push('"');
                }
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                return;
            }
            for &c in doc.children(node) {
                write_node(doc, c, out);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
