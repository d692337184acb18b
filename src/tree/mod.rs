//! Render-tree seam
//!
//! The host page owns the tree and re-renders it whenever it likes. The
//! engine reads it through `RenderTree` and only the decoration code writes to
//! it. Selectors are the simple forms the engine needs: `tag`, `.class`,
//! `#id`, and comma-separated lists of those.

pub mod memory;
pub mod web;

pub use memory::*;
pub use web::*;

use serde::{Deserialize, Serialize};

/// DOM-like access to a render tree
pub trait RenderTree {
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// Current page location (absolute URL)
    fn location(&self) -> String;

    /// First element in the document matching `selector`
    fn query_first(&self, selector: &str) -> Option<Self::Node>;

    /// Descendants of `scope` matching `selector`, in document order
    fn query_all(&self, scope: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// Every element in the document matching `selector`, in document order
    fn query_document(&self, selector: &str) -> Vec<Self::Node>;

    /// Nearest inclusive ancestor matching `selector`
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    fn attr(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attr(&mut self, node: &Self::Node, name: &str, value: &str);
    fn remove_attr(&mut self, node: &Self::Node, name: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn toggle_class(&mut self, node: &Self::Node, class: &str, on: bool);

    /// Concatenated text of all descendant text nodes
    fn text(&self, node: &Self::Node) -> String;

    /// Replace all children with a single text node
    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Remove all children
    fn clear(&mut self, node: &Self::Node);

    /// Append a new element with one class, returning it.
    /// `None` if the host refused to create it.
    fn append_element(&mut self, parent: &Self::Node, tag: &str, class: &str) -> Option<Self::Node>;

    fn append_text(&mut self, parent: &Self::Node, text: &str);
}

/// Kind of a mutation observed on the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    ChildList,
    CharacterData,
    Attributes,
}

/// One entry of a mutation batch, as reported by a MutationObserver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRecord {
    #[serde(rename = "type")]
    pub kind: MutationKind,
    #[serde(default)]
    pub added: u32,
    #[serde(default)]
    pub removed: u32,
}

impl MutationRecord {
    pub fn child_list(added: u32, removed: u32) -> Self {
        Self { kind: MutationKind::ChildList, added, removed }
    }

    pub fn character_data() -> Self {
        Self { kind: MutationKind::CharacterData, added: 0, removed: 0 }
    }

    pub fn attributes() -> Self {
        Self { kind: MutationKind::Attributes, added: 0, removed: 0 }
    }

    /// Structural or text change; attribute-only churn never warrants a rescan
    pub fn is_relevant(&self) -> bool {
        match self.kind {
            MutationKind::ChildList => self.added > 0 || self.removed > 0,
            MutationKind::CharacterData => true,
            MutationKind::Attributes => false,
        }
    }
}

/// One simple selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Tag(String),
    Class(String),
    Id(String),
}

impl SimpleSelector {
    /// Parse `"a, .x, #y"`; unsupported parts are dropped
    pub fn parse_list(selector: &str) -> Vec<SimpleSelector> {
        selector
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| {
                if let Some(class) = part.strip_prefix('.') {
                    Some(SimpleSelector::Class(class.to_string()))
                } else if let Some(id) = part.strip_prefix('#') {
                    Some(SimpleSelector::Id(id.to_string()))
                } else if part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                    Some(SimpleSelector::Tag(part.to_ascii_lowercase()))
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_list() {
        let parsed = SimpleSelector::parse_list("a, span , .wc-token,#wc-widget");
        assert_eq!(
            parsed,
            vec![
                SimpleSelector::Tag("a".into()),
                SimpleSelector::Tag("span".into()),
                SimpleSelector::Class("wc-token".into()),
                SimpleSelector::Id("wc-widget".into()),
            ]
        );
        assert!(SimpleSelector::parse_list("div > a").is_empty());
    }

    #[test]
    fn test_relevant_mutations() {
        assert!(MutationRecord::child_list(1, 0).is_relevant());
        assert!(MutationRecord::child_list(0, 2).is_relevant());
        assert!(!MutationRecord::child_list(0, 0).is_relevant());
        assert!(MutationRecord::character_data().is_relevant());
        assert!(!MutationRecord::attributes().is_relevant());
    }

    #[test]
    fn test_mutation_record_from_js_shape() {
        let rec: MutationRecord =
            serde_json::from_str(r#"{ "type": "childList", "added": 2 }"#).unwrap();
        assert_eq!(rec, MutationRecord::child_list(2, 0));
    }
}
