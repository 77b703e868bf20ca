use log::debug;

use super::types::check_type;
use super::{InstanceValidator, ValidatedOutput, ValidationIssue};
use crate::constants::{XXFORMS_NAMESPACE_URI, XXFORMS_PREFIX};
use crate::errors::XFormsError;
use crate::instance::Instance;
use crate::xml::NodeId;
use crate::xpath::sort_document_order;

/// Validador por defecto: comprueba las anotaciones de decoración (tipo,
/// `required`, `constraint`) de los nodos relevantes y marca los inválidos
/// con `xxforms:valid="false"` y `xxforms:error`.
///
/// No descarga ni interpreta el schema; la URI sólo se registra en el log.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoratingValidator;

impl DecoratingValidator {
    fn check_node(instance: &Instance, node: NodeId) -> Option<String> {
        let doc = instance.document();
        let decoration = instance.decoration();
        let props = decoration.properties(node);
        if !props.relevant {
            return None;
        }
        let value = doc.string_value(node);
        if props.required && value.is_empty() {
            return Some("value is required".to_string());
        }
        if !value.is_empty() {
            if let Some(type_name) = decoration.declared_type(node) {
                if let Err(reason) = check_type(type_name, &value) {
                    return Some(reason);
                }
            }
        }
        if !props.constraint {
            return Some("constraint is not satisfied".to_string());
        }
        None
    }
}

impl InstanceValidator for DecoratingValidator {
    fn validate(&self, instance: &Instance, schema: &str) -> Result<ValidatedOutput, XFormsError> {
        let source = instance.document();
        let decoration = instance.decoration();
        let mut nodes: Vec<NodeId> = decoration.typed_nodes()
                                               .map(|(n, _)| n)
                                               .chain(decoration.decorated_nodes().map(|(n, _)| n))
                                               .filter(|n| source.is_attached(*n))
                                               .collect();
        sort_document_order(source, &mut nodes);

        let mut document = source.clone();
        let mut issues = Vec::new();
        for node in nodes {
            let Some(message) = Self::check_node(instance, node) else {
                continue;
            };
            // Un atributo inválido se señala en su elemento.
            let element = if document.is_attribute(node) { document.parent(node) } else { Some(node) };
            if let Some(element) = element {
                document.set_attribute(element, &format!("{XXFORMS_PREFIX}:valid"), "false");
                document.set_attribute(element, &format!("{XXFORMS_PREFIX}:error"), &message);
            }
            issues.push(ValidationIssue { id: decoration.id_of(node),
                                          message });
        }

        if !issues.is_empty() {
            if let Some(root) = document.document_element() {
                document.declare_namespace(root, XXFORMS_PREFIX, XXFORMS_NAMESPACE_URI);
            }
        }
        debug!("validated instance against '{schema}': {} issue(s)", issues.len());
        Ok(ValidatedOutput { document,
                             valid: issues.is_empty(),
                             issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    fn instance(xml: &str) -> Instance {
        let mut i = Instance::new(XmlDocument::parse(xml).unwrap());
        i.set_initial_decoration();
        i
    }

    #[test]
    fn valid_instance_is_emitted_unchanged() {
        let mut i = instance("<form><age/></form>");
        i.set_value_for_id(1, "42", Some("xs:integer")).unwrap();
        let out = DecoratingValidator.validate(&i, "form.xsd").unwrap();
        assert!(out.valid);
        assert_eq!(out.document.to_xml_string().unwrap(), "<form><age>42</age></form>");
    }

    #[test]
    fn invalid_nodes_are_marked() {
        let mut i = instance("<form><age/></form>");
        i.set_value_for_id(1, "old", Some("xs:integer")).unwrap();
        let out = DecoratingValidator.validate(&i, "form.xsd").unwrap();
        assert!(!out.valid);
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].id, Some(1));
        assert_eq!(out.document.to_xml_string().unwrap(),
                   r#"<form xmlns:xxforms="http://orbeon.org/oxf/xml/xforms"><age xxforms:valid="false" xxforms:error="&apos;old&apos; is not a valid xs:integer">old</age></form>"#);
    }

    #[test]
    fn required_and_relevance() {
        let mut i = instance("<form><a/><b/></form>");
        let a = i.node_for_id(1).unwrap();
        let b = i.node_for_id(2).unwrap();
        i.decoration_mut().properties_mut(a).required = true;
        let pb = i.decoration_mut().properties_mut(b);
        pb.required = true;
        pb.relevant = false;
        let out = DecoratingValidator.validate(&i, "s").unwrap();
        assert_eq!(out.issues, vec![ValidationIssue { id: Some(1),
                                                      message: "value is required".into() }]);
    }
}
