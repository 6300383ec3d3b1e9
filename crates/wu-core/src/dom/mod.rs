//! Owned in-memory document model.
//!
//! Nodes live in an arena (`Vec<Node>`) addressed by [`NodeId`]; detaching a
//! node only unlinks it, so ids stay valid for the document's lifetime. The
//! model covers exactly what the client layer touches: elements with
//! attributes, text, comments, and script execution bookkeeping.
//!
//! Script semantics follow the platform's: a `<script>` produced by parsing
//! a fragment is inert and never runs, while a script element created with
//! [`Document::create_element`] runs once, when it first becomes connected
//! to the document. "Running" means being queued for the host, which drains
//! the queue with [`Document::take_pending_scripts`].

mod parse;
mod serialize;

use std::collections::HashSet;

pub use parse::decode_entities;

/// Elements that never have children or an end tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Escape `text` for interpolation into markup, as element text or as a
/// quoted attribute value.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    /// Parsed from a fragment: the platform will never execute it.
    pub(crate) inert: bool,
    /// Already queued for execution (or ran at page load).
    pub(crate) started: bool,
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A script the document has handed to the host for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    /// Every attribute, in source order.
    pub attrs: Vec<(String, String)>,
    /// Inline source text.
    pub text: String,
}

impl ScriptRecord {
    /// The `src` attribute, for external scripts.
    #[must_use]
    pub fn src(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == "src")
            .map(|(_, v)| v.as_str())
    }
}

/// An HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    pending_scripts: Vec<ScriptRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with only the document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            pending_scripts: Vec::new(),
        }
    }

    /// Parse a full page. Scripts in the initial markup count as already run.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root();
        parse::parse_into(&mut doc, root, html, false);
        for id in doc.descendants(root) {
            if let Some(el) = doc.element_mut(id) {
                el.started = true;
            }
        }
        doc
    }

    /// The document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The first element child of the document node (normally `<html>`).
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&c| self.is_element(c))
    }

    /// The first `<head>` element.
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.find_tag("head")
    }

    /// The first `<body>` element.
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.find_tag("body")
    }

    // --- Node creation ---

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            inert: false,
            started: false,
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_owned()))
    }

    pub(crate) fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_owned()))
    }

    pub(crate) fn create_doctype(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Doctype(text.to_owned()))
    }

    /// Parse `html` into detached top-level nodes. Scripts inside are inert.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let holder = self.push(NodeData::Document);
        parse::parse_into(self, holder, html, true);
        let children = std::mem::take(&mut self.nodes[holder.0].children);
        for &c in &children {
            self.nodes[c.0].parent = None;
        }
        children
    }

    /// Recreate `script` as a fresh, executable element with the same
    /// attributes and inline text, replacing it in place.
    pub fn recreate_script(&mut self, script: NodeId) -> NodeId {
        let attrs = self
            .element(script)
            .map(|el| el.attrs.clone())
            .unwrap_or_default();
        let text = self.text_content(script);

        let fresh = self.create_element("script");
        if let Some(el) = self.element_mut(fresh) {
            el.attrs = attrs;
        }
        if !text.is_empty() {
            let t = self.create_text(&text);
            self.append_child(fresh, t);
        }
        self.replace_with(script, &[fresh]);
        fresh
    }

    // --- Tree mutation ---

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.on_inserted(child);
    }

    /// Insert `child` before `reference` under `parent`. Appends when
    /// `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference);
        self.nodes[child.0].parent = Some(parent);
        match pos {
            Some(i) => self.nodes[parent.0].children.insert(i, child),
            None => self.nodes[parent.0].children.push(child),
        }
        self.on_inserted(child);
    }

    /// Replace `node` with `replacements`, in order. `node` ends up detached.
    pub fn replace_with(&mut self, node: NodeId, replacements: &[NodeId]) {
        let Some(parent) = self.nodes[node.0].parent else {
            return;
        };
        for &r in replacements {
            self.insert_before(parent, r, node);
        }
        self.detach(node);
    }

    /// Detach `node` from its parent. No-op for detached nodes.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    /// Remove every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for c in children {
            self.nodes[c.0].parent = None;
        }
    }

    /// Replace all children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(node, t);
        }
    }

    // --- Attributes ---

    /// Attribute value, if present.
    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the attribute is present.
    #[must_use]
    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        match el.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => value.clone_into(v),
            None => el.attrs.push((name, value.to_owned())),
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element_mut(node) {
            el.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
    }

    /// Whether the element carries the boolean `hidden` attribute.
    #[must_use]
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.has_attr(node, "hidden")
    }

    /// Add or remove the `hidden` attribute.
    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if hidden {
            if !self.is_hidden(node) {
                self.set_attr(node, "hidden", "");
            }
        } else {
            self.remove_attr(node, "hidden");
        }
    }

    // --- Queries ---

    /// Lowercase tag name for elements.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    /// Whether `node` is an element.
    #[must_use]
    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].data, NodeData::Element(_))
    }

    /// Children of `node`, in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Whether `node` is connected to the document node.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == self.root() {
                return true;
            }
            match self.nodes[cur.0].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Descendant elements of `node` in document order, `node` excluded.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.is_element(id) {
                out.push(id);
            }
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Connected elements carrying attribute `name`, in document order.
    #[must_use]
    pub fn elements_with_attr(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&id| self.has_attr(id, name))
            .collect()
    }

    /// Connected elements with the given tag, in document order.
    #[must_use]
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&id| self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// The first connected element with `id="..."`.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(id))
    }

    /// `content` of the first `<meta name="...">`.
    #[must_use]
    pub fn meta_content(&self, name: &str) -> Option<&str> {
        self.elements_by_tag("meta")
            .into_iter()
            .find(|&m| {
                self.attr(m, "name")
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .and_then(|m| self.attr(m, "content"))
    }

    /// Concatenated text of `node` and its descendants.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    /// Hand queued scripts to the host, emptying the queue.
    pub fn take_pending_scripts(&mut self) -> Vec<ScriptRecord> {
        std::mem::take(&mut self.pending_scripts)
    }

    /// Scripts queued but not yet taken.
    #[must_use]
    pub fn pending_scripts(&self) -> &[ScriptRecord] {
        &self.pending_scripts
    }

    /// Inert scripts at or below `node`, in document order.
    #[must_use]
    pub fn inert_scripts(&self, node: NodeId) -> Vec<NodeId> {
        let mut candidates = vec![node];
        candidates.extend(self.descendants(node));
        candidates
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|el| el.tag == "script" && el.inert))
            .collect()
    }

    /// Serialize the whole document.
    #[must_use]
    pub fn to_html(&self) -> String {
        serialize::children_html(self, self.root())
    }

    /// Serialize `node` including its own tags.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        serialize::node_html(self, node)
    }

    /// Serialize the children of `node`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        serialize::children_html(self, node)
    }

    // --- Internals ---

    pub(crate) fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0].data
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Append during parsing: no script bookkeeping.
    pub(crate) fn append_raw(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    fn find_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements_by_tag(tag).into_iter().next()
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Element(_) | NodeData::Document => {
                for &c in &self.nodes[node.0].children {
                    self.collect_text(c, out);
                }
            }
            NodeData::Comment(_) | NodeData::Doctype(_) => {}
        }
    }

    /// Queue executable scripts in a subtree that just became connected.
    fn on_inserted(&mut self, node: NodeId) {
        if !self.is_connected(node) {
            return;
        }
        let mut subtree = vec![node];
        subtree.extend(self.descendants(node));
        let mut seen = HashSet::new();
        for id in subtree {
            if !seen.insert(id) {
                continue;
            }
            let runnable = self
                .element(id)
                .is_some_and(|el| el.tag == "script" && !el.inert && !el.started);
            if !runnable {
                continue;
            }
            let text = self.text_content(id);
            if let Some(el) = self.element_mut(id) {
                el.started = true;
                let record = ScriptRecord {
                    attrs: el.attrs.clone(),
                    text,
                };
                self.pending_scripts.push(record);
            }
        }
    }
}
