//! Tabla de decoración: ids, anotaciones de tipo y propiedades de modelo por
//! nodo. Vive al lado del documento y nunca se serializa con la instancia.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TYPE;
use crate::xml::{NodeId, XmlDocument};

/// Propiedades de un nodo calculadas por los binds del modelo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProperties {
    pub required: bool,
    pub relevant: bool,
    pub readonly: bool,
    /// Resultado de la expresión `constraint` (true si no hay).
    pub constraint: bool,
}

impl Default for ItemProperties {
    fn default() -> Self {
        Self { required: false,
               relevant: true,
               readonly: false,
               constraint: true }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Decoration {
    ids: BTreeMap<u32, NodeId>,
    types: BTreeMap<NodeId, String>,
    properties: BTreeMap<NodeId, ItemProperties>,
}

impl Decoration {
    /// Numera elementos y atributos en preorden: la raíz es 0 y los atributos
    /// de un elemento van justo después de él y antes de sus hijos.
    pub fn assign_ids(doc: &XmlDocument) -> Self {
        let mut decoration = Decoration::default();
        let mut next = 0u32;
        let mut stack: Vec<NodeId> = doc.document_element().into_iter().collect();
        while let Some(element) = stack.pop() {
            decoration.ids.insert(next, element);
            next += 1;
            for a in doc.attributes(element) {
                decoration.ids.insert(next, *a);
                next += 1;
            }
            stack.extend(doc.children(element).iter().rev().filter(|c| doc.is_element(**c)));
        }
        decoration
    }

    pub fn node(&self, id: u32) -> Option<NodeId> {
        self.ids.get(&id).copied()
    }

    pub fn id_of(&self, node: NodeId) -> Option<u32> {
        self.ids.iter().find(|(_, n)| **n == node).map(|(id, _)| *id)
    }

    pub fn id_count(&self) -> usize {
        self.ids.len()
    }

    pub fn set_type(&mut self, node: NodeId, type_name: &str) {
        self.types.insert(node, type_name.to_string());
    }

    /// Tipo anotado explícitamente, si lo hay.
    pub fn declared_type(&self, node: NodeId) -> Option<&str> {
        self.types.get(&node).map(String::as_str)
    }

    pub fn type_of(&self, node: NodeId) -> &str {
        self.declared_type(node).unwrap_or(DEFAULT_TYPE)
    }

    pub fn typed_nodes(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.types.iter().map(|(n, t)| (*n, t.as_str()))
    }

    pub fn properties(&self, node: NodeId) -> ItemProperties {
        self.properties.get(&node).copied().unwrap_or_default()
    }

    pub fn properties_mut(&mut self, node: NodeId) -> &mut ItemProperties {
        self.properties.entry(node).or_default()
    }

    pub fn decorated_nodes(&self) -> impl Iterator<Item = (NodeId, ItemProperties)> + '_ {
        self.properties.iter().map(|(n, p)| (*n, *p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_preorder_with_attributes_first() {
        let doc = XmlDocument::parse(r#"<form a="1"><x b="2"><z/></x><y/></form>"#).unwrap();
        let d = Decoration::assign_ids(&doc);
        let names: Vec<_> = (0..6).map(|i| doc.name(d.node(i).unwrap()).unwrap().to_string()).collect();
        assert_eq!(names, vec!["form", "a", "x", "b", "z", "y"]);
        assert_eq!(d.node(6), None);
        assert_eq!(d.id_count(), 6);
    }

    #[test]
    fn properties_default_to_relevant_and_valid() {
        let d = Decoration::default();
        let p = d.properties(NodeId(3));
        assert!(p.relevant && p.constraint && !p.required && !p.readonly);
    }
}
