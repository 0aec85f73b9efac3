//! Headless document model.
//!
//! The page scripts only ever touch a narrow slice of the DOM: selector
//! queries, attributes, the class list, a few inline style properties, text
//! content and inner markup. This module provides exactly that slice over an
//! owned element tree.
//!
//! - `parser`: forgiving HTML parser for fetched pages and inner markup
//! - `selector`: the selector subset used by the site's scripts
//! - `node`: element API and serializer
//! - `document`: tree queries addressed by child-index paths

mod document;
mod node;
mod parser;
mod selector;

pub use document::{Document, NodePath};
pub use node::{Element, Node};
pub use parser::parse_fragment;
pub use selector::{Selector, SelectorError};
