//! Modelo de documento XML usado por instancias, modelos y requests.
//!
//! - `document`: árbol mutable en arena (`XmlDocument`, `NodeId`).
//! - `parse`: texto → documento (quick-xml).
//! - `serialize`: documento → texto determinista.
//! - `namespace`: contextos prefijo → URI.

pub mod document;
pub mod namespace;
mod parse;
mod serialize;

pub use document::{NodeId, NodeKind, XmlDocument};
pub use namespace::{split_qname, NamespaceContext};
