//! MemTree: arena-backed render tree
//!
//! Stands in for the browser DOM in tests and non-browser hosts. Node handles
//! are arena indices; removed nodes stay in the arena, detached. Every write
//! is logged as a `MutationRecord` the way a MutationObserver would see it.

use std::fmt;

use crate::tree::{MutationRecord, RenderTree, SimpleSelector};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        classes: Vec<String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct MemTree {
    nodes: Vec<NodeData>,
    root: NodeId,
    location: String,
    mutations: Vec<MutationRecord>,
}

impl MemTree {
    /// Empty document with a `body` root
    pub fn new(location: &str) -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Element {
                    tag: "body".to_string(),
                    attributes: Vec::new(),
                    classes: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            location: location.to_string(),
            mutations: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_location(&mut self, location: &str) {
        self.location = location.to_string();
    }

    /// Append `<tag class="class">` (class may be empty)
    pub fn element(&mut self, parent: NodeId, tag: &str, class: &str) -> NodeId {
        let id = self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            classes: class.split_whitespace().map(str::to_string).collect(),
        });
        self.attach(parent, id);
        id
    }

    /// Append a text node
    pub fn text_node(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.alloc(NodeKind::Text(text.to_string()));
        self.attach(parent, id);
        id
    }

    /// Rewrite the data of an existing text node
    pub fn set_character_data(&mut self, node: NodeId, text: &str) {
        if let Some(NodeKind::Text(data)) = self.nodes.get_mut(node.0 as usize).map(|n| &mut n.kind) {
            *data = text.to_string();
            self.mutations.push(MutationRecord::character_data());
        }
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.data(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).and_then(|n| n.parent)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match self.data(node).map(|n| &n.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag),
            _ => None,
        }
    }

    /// Drain the mutation log
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.len()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData { kind, parent: None, children: Vec::new() });
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.nodes.get_mut(parent.0 as usize) {
            p.children.push(child);
            self.nodes[child.0 as usize].parent = Some(parent);
            self.mutations.push(MutationRecord::child_list(1, 0));
        }
    }

    fn detach_children(&mut self, node: NodeId) -> u32 {
        let children = match self.nodes.get_mut(node.0 as usize) {
            Some(n) => std::mem::take(&mut n.children),
            None => return 0,
        };
        for child in &children {
            self.nodes[child.0 as usize].parent = None;
        }
        children.len() as u32
    }

    fn matches(&self, node: NodeId, selectors: &[SimpleSelector]) -> bool {
        let Some(NodeKind::Element { tag, attributes, classes }) = self.data(node).map(|n| &n.kind) else {
            return false;
        };
        selectors.iter().any(|sel| match sel {
            SimpleSelector::Tag(t) => tag == t,
            SimpleSelector::Class(c) => classes.iter().any(|have| have == c),
            SimpleSelector::Id(id) => attributes.iter().any(|(k, v)| k == "id" && v == id),
        })
    }

    /// Pre-order descendants of `scope`, excluding `scope` itself
    fn descendants(&self, scope: NodeId, out: &mut Vec<NodeId>) {
        if let Some(n) = self.data(scope) {
            for &child in &n.children {
                out.push(child);
                self.descendants(child, out);
            }
        }
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.data(node) {
            Some(NodeData { kind: NodeKind::Text(t), .. }) => out.push_str(t),
            Some(n) => {
                for &child in &n.children {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }
}

impl RenderTree for MemTree {
    type Node = NodeId;

    fn location(&self) -> String {
        self.location.clone()
    }

    fn query_first(&self, selector: &str) -> Option<NodeId> {
        self.query_document(selector).into_iter().next()
    }

    fn query_all(&self, scope: &NodeId, selector: &str) -> Vec<NodeId> {
        let selectors = SimpleSelector::parse_list(selector);
        let mut all = Vec::new();
        self.descendants(*scope, &mut all);
        all.into_iter().filter(|&n| self.matches(n, &selectors)).collect()
    }

    fn query_document(&self, selector: &str) -> Vec<NodeId> {
        let selectors = SimpleSelector::parse_list(selector);
        let mut all = vec![self.root];
        self.descendants(self.root, &mut all);
        all.into_iter().filter(|&n| self.matches(n, &selectors)).collect()
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let selectors = SimpleSelector::parse_list(selector);
        let mut current = Some(*node);
        while let Some(n) = current {
            if self.matches(n, &selectors) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    fn attr(&self, node: &NodeId, name: &str) -> Option<String> {
        match self.data(*node).map(|n| &n.kind) {
            Some(NodeKind::Element { classes, .. }) if name == "class" => {
                Some(classes.join(" "))
            }
            Some(NodeKind::Element { attributes, .. }) => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_attr(&mut self, node: &NodeId, name: &str, value: &str) {
        if let Some(NodeKind::Element { attributes, .. }) = self.nodes.get_mut(node.0 as usize).map(|n| &mut n.kind) {
            match attributes.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
            self.mutations.push(MutationRecord::attributes());
        }
    }

    fn remove_attr(&mut self, node: &NodeId, name: &str) {
        if let Some(NodeKind::Element { attributes, .. }) = self.nodes.get_mut(node.0 as usize).map(|n| &mut n.kind) {
            let before = attributes.len();
            attributes.retain(|(k, _)| k != name);
            if attributes.len() != before {
                self.mutations.push(MutationRecord::attributes());
            }
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        match self.data(*node).map(|n| &n.kind) {
            Some(NodeKind::Element { classes, .. }) => classes.iter().any(|c| c == class),
            _ => false,
        }
    }

    fn toggle_class(&mut self, node: &NodeId, class: &str, on: bool) {
        if let Some(NodeKind::Element { classes, .. }) = self.nodes.get_mut(node.0 as usize).map(|n| &mut n.kind) {
            let present = classes.iter().any(|c| c == class);
            if on && !present {
                classes.push(class.to_string());
            } else if !on && present {
                classes.retain(|c| c != class);
            } else {
                return;
            }
            self.mutations.push(MutationRecord::attributes());
        }
    }

    fn text(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.collect_text(*node, &mut out);
        out
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        if self.data(*node).is_none() {
            return;
        }
        let removed = self.detach_children(*node);
        let added = if text.is_empty() {
            0
        } else {
            let id = self.alloc(NodeKind::Text(text.to_string()));
            self.nodes[node.0 as usize].children.push(id);
            self.nodes[id.0 as usize].parent = Some(*node);
            1
        };
        if added + removed > 0 {
            self.mutations.push(MutationRecord::child_list(added, removed));
        }
    }

    fn clear(&mut self, node: &NodeId) {
        let removed = self.detach_children(*node);
        if removed > 0 {
            self.mutations.push(MutationRecord::child_list(0, removed));
        }
    }

    fn append_element(&mut self, parent: &NodeId, tag: &str, class: &str) -> Option<NodeId> {
        self.data(*parent)?;
        Some(self.element(*parent, tag, class))
    }

    fn append_text(&mut self, parent: &NodeId, text: &str) {
        self.text_node(*parent, text);
    }
}

// =============================================================================
// Tests
// =============================================================================
