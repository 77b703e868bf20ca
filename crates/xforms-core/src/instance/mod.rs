//! Instancia XForms: documento mutable + tabla de decoración.
//!
//! La instancia pertenece en exclusiva al orquestador mientras se ensambla y
//! es de sólo lectura una vez terminada. Las ids asignadas por
//! `set_initial_decoration` apuntan a nodos del documento y son las que
//! referencian los parámetros `$node^<id>` del request.

pub mod decoration;

use std::io::Write;

use crate::errors::{InputName, XFormsError};
use crate::hashing::hash_bytes;
use crate::xml::{NamespaceContext, NodeId, XmlDocument};
use crate::xpath::{NoVariables, XPathExpr};

pub use decoration::{Decoration, ItemProperties};

#[derive(Debug, Clone)]
pub struct Instance {
    document: XmlDocument,
    decoration: Decoration,
}

impl Instance {
    pub fn new(document: XmlDocument) -> Self {
        Self { document,
               decoration: Decoration::default() }
    }

    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut XmlDocument {
        &mut self.document
    }

    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    pub(crate) fn decoration_mut(&mut self) -> &mut Decoration {
        &mut self.decoration
    }

    /// Asigna ids en preorden sobre el documento actual. Reemplaza cualquier
    /// decoración previa.
    pub fn set_initial_decoration(&mut self) {
        self.decoration = Decoration::assign_ids(&self.document);
    }

    pub fn node_for_id(&self, id: u32) -> Option<NodeId> {
        self.decoration.node(id).filter(|n| self.document.is_attached(*n))
    }

    /// Fija valor y (si viene) anotación de tipo del nodo con esa id.
    pub fn set_value_for_id(&mut self, id: u32, value: &str, type_name: Option<&str>) -> Result<(), XFormsError> {
        let node = self.node_for_id(id).ok_or(XFormsError::IdResolution(id))?;
        self.document.set_string_value(node, value);
        if let Some(t) = type_name {
            self.decoration.set_type(node, t);
        }
        Ok(())
    }

    pub fn value_for_id(&self, id: u32) -> Option<String> {
        self.node_for_id(id).map(|n| self.document.string_value(n))
    }

    pub fn type_for_id(&self, id: u32) -> Option<&str> {
        self.node_for_id(id).map(|n| self.decoration.type_of(n))
    }

    /// Resuelve `reference` desde el nodo documento con el contexto de
    /// namespaces dado y fija el valor del primer nodo encontrado. Sin
    /// coincidencias no hace nada.
    pub fn set_value_for_param(&mut self, reference: &str, namespaces: &NamespaceContext, value: &str) -> Result<(), XFormsError> {
        let expr = XPathExpr::compile(reference, namespaces).map_err(|e| XFormsError::malformed(InputName::Filter, e.to_string()))?;
        let nodes = expr.select_nodes(&self.document, self.document.root(), &NoVariables)
                        .map_err(|e| XFormsError::malformed(InputName::Filter, e.to_string()))?;
        if let Some(first) = nodes.first() {
            self.document.set_string_value(*first, value);
        }
        Ok(())
    }

    /// Serializa la instancia en `sink`. No modifica la instancia.
    pub fn read<W: Write>(&self, sink: W) -> Result<(), XFormsError> {
        self.document.write_to(sink).map_err(XFormsError::Serialization)
    }

    pub fn to_xml_string(&self) -> Result<String, XFormsError> {
        self.document.to_xml_string().map_err(XFormsError::Serialization)
    }

    /// Hash blake3 de la serialización.
    pub fn fingerprint(&self) -> Result<String, XFormsError> {
        let mut buf = Vec::new();
        self.read(&mut buf)?;
        Ok(hash_bytes(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Instance {
        let mut i = Instance::new(XmlDocument::parse("<form><x/><y/></form>").unwrap());
        i.set_initial_decoration();
        i
    }

    #[test]
    fn set_value_for_id_updates_value_and_type() {
        let mut i = form();
        i.set_value_for_id(1, "hello", Some("xs:string")).unwrap();
        assert_eq!(i.to_xml_string().unwrap(), "<form><x>hello</x><y/></form>");
        assert_eq!(i.type_for_id(1), Some("xs:string"));
        assert_eq!(i.type_for_id(2), Some("xs:string"));
    }

    #[test]
    fn unknown_id_is_reported() {
        let mut i = form();
        assert_eq!(i.set_value_for_id(99, "v", None), Err(XFormsError::IdResolution(99)));
    }

    #[test]
    fn param_without_match_is_a_noop() {
        let mut i = form();
        let before = i.fingerprint().unwrap();
        i.set_value_for_param("/form/missing", &NamespaceContext::new(), "v").unwrap();
        assert_eq!(i.fingerprint().unwrap(), before);
    }

    #[test]
    fn param_reference_must_select_nodes() {
        let mut i = form();
        let err = i.set_value_for_param("count(/form/x)", &NamespaceContext::new(), "v").unwrap_err();
        assert!(matches!(err, XFormsError::MalformedInput { input: InputName::Filter, .. }), "got {err:?}");
    }

    #[test]
    fn param_with_undeclared_prefix_is_malformed() {
        let mut i = form();
        let err = i.set_value_for_param("/p:form", &NamespaceContext::new(), "v").unwrap_err();
        assert!(matches!(err, XFormsError::MalformedInput { input: InputName::Filter, .. }), "got {err:?}");
    }
}
