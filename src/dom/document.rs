use tracing::warn;

use super::node::{Element, Node};
use super::parser;
use super::selector::Selector;

/// Child-index path from the document element to a descendant element.
/// The empty path addresses the document element itself.
pub type NodePath = Vec<usize>;

/// A parsed document rooted at its `<html>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            root: parser::parse_document(html),
        }
    }

    pub fn document_element(&self) -> &Element {
        &self.root
    }

    pub fn document_element_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn element(&self, path: &[usize]) -> Option<&Element> {
        let mut current = &self.root;
        for &index in path {
            current = current.children().get(index)?.as_element()?;
        }
        Some(current)
    }

    pub fn element_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &index in path {
            current = current.children_mut().get_mut(index)?.as_element_mut()?;
        }
        Some(current)
    }

    /// Paths of all elements matching `selector`, in document order.
    ///
    /// An invalid selector matches nothing and is logged.
    pub fn select_paths(&self, selector: &str) -> Vec<NodePath> {
        match Selector::parse(selector) {
            Ok(selector) => self.select_paths_with(&selector),
            Err(e) => {
                warn!("Ignoring invalid selector '{}': {}", selector, e);
                Vec::new()
            }
        }
    }

    pub fn select_paths_with(&self, selector: &Selector) -> Vec<NodePath> {
        let mut found = Vec::new();
        let mut ancestors = Vec::new();
        let mut path = Vec::new();
        walk(&self.root, &mut ancestors, &mut path, &mut |ancestors, el, path| {
            if selector.matches(ancestors, el) {
                found.push(path.to_vec());
            }
        });
        found
    }

    pub fn select(&self, selector: &str) -> Vec<&Element> {
        self.select_paths(selector)
            .iter()
            .filter_map(|path| self.element(path))
            .collect()
    }

    pub fn first(&self, selector: &str) -> Option<&Element> {
        let path = self.select_paths(selector).into_iter().next()?;
        self.element(&path)
    }

    pub fn first_path(&self, selector: &str) -> Option<NodePath> {
        self.select_paths(selector).into_iter().next()
    }

    pub fn first_mut(&mut self, selector: &str) -> Option<&mut Element> {
        let path = self.first_path(selector)?;
        self.element_mut(&path)
    }

    pub fn exists(&self, selector: &str) -> bool {
        !self.select_paths(selector).is_empty()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<&Element> {
        self.first_path_where(|el| el.id() == Some(id))
            .and_then(|path| self.element(&path))
    }

    pub fn get_element_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        let path = self.first_path_where(|el| el.id() == Some(id))?;
        self.element_mut(&path)
    }

    /// Apply `f` to every element matching `selector`; returns how many were visited.
    pub fn for_each_mut(&mut self, selector: &str, mut f: impl FnMut(&mut Element)) -> usize {
        let paths = self.select_paths(selector);
        let mut visited = 0;
        for path in &paths {
            if let Some(el) = self.element_mut(path) {
                f(el);
                visited += 1;
            }
        }
        visited
    }

    /// Nearest ancestor-or-self of `path` matching `selector`.
    pub fn closest_path(&self, path: &[usize], selector: &Selector) -> Option<NodePath> {
        let mut chain = Vec::with_capacity(path.len() + 1);
        chain.push(&self.root);
        let mut current = &self.root;
        for &index in path {
            current = current.children().get(index)?.as_element()?;
            chain.push(current);
        }

        (0..chain.len()).rev().find_map(|depth| {
            let (ancestors, rest) = chain.split_at(depth);
            selector
                .matches(ancestors, rest[0])
                .then(|| path[..depth].to_vec())
        })
    }

    pub fn outer_html(&self) -> String {
        self.root.outer_html()
    }

    fn first_path_where(&self, predicate: impl Fn(&Element) -> bool) -> Option<NodePath> {
        let mut found = None;
        let mut ancestors = Vec::new();
        let mut path = Vec::new();
        walk(&self.root, &mut ancestors, &mut path, &mut |_, el, path| {
            if found.is_none() && predicate(el) {
                found = Some(path.to_vec());
            }
        });
        found
    }
}

fn walk<'a>(
    el: &'a Element,
    ancestors: &mut Vec<&'a Element>,
    path: &mut Vec<usize>,
    visit: &mut dyn FnMut(&[&'a Element], &'a Element, &[usize]),
) {
    visit(ancestors, el, path);
    ancestors.push(el);
    for (index, child) in el.children().iter().enumerate() {
        if let Node::Element(child) = child {
            path.push(index);
            walk(child, ancestors, path, visit);
            path.pop();
        }
    }
    ancestors.pop();
}
