//! DomTree: `RenderTree` over the live page through `web-sys`
//!
//! DOM exceptions are swallowed per call: a node the host removed or locked
//! simply reads as empty, which the engine already treats as "skip".

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, NodeList};

use crate::tree::RenderTree;

pub struct DomTree {
    document: Document,
}

impl DomTree {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Tree for the current window's document, if there is one
    pub fn from_window() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self::new(document))
    }

    fn elements(list: NodeList) -> Vec<Element> {
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }
}

impl RenderTree for DomTree {
    type Node = Element;

    fn location(&self) -> String {
        self.document
            .location()
            .and_then(|loc| loc.href().ok())
            .unwrap_or_default()
    }

    fn query_first(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, scope: &Element, selector: &str) -> Vec<Element> {
        match scope.query_selector_all(selector) {
            Ok(list) => Self::elements(list),
            Err(_) => Vec::new(),
        }
    }

    fn query_document(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => Self::elements(list),
            Err(_) => Vec::new(),
        }
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn attr(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attr(&mut self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn remove_attr(&mut self, node: &Element, name: &str) {
        let _ = node.remove_attribute(name);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn toggle_class(&mut self, node: &Element, class: &str, on: bool) {
        let _ = node.class_list().toggle_with_force(class, on);
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn clear(&mut self, node: &Element) {
        node.set_text_content(None);
    }

    fn append_element(&mut self, parent: &Element, tag: &str, class: &str) -> Option<Element> {
        let el = self.document.create_element(tag).ok()?;
        if !class.is_empty() {
            el.set_class_name(class);
        }
        parent.append_child(&el).ok()?;
        Some(el)
    }

    fn append_text(&mut self, parent: &Element, text: &str) {
        let _ = parent.append_with_str_1(text);
    }
}
