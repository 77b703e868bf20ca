//! Parámetros del request: asignaciones por id, instancia enviada y acciones.
//!
//! Formato de entrada:
//!
//! ```text
//! <request><parameters>
//!   <parameter><name>$node^1</name><value type="xs:string">hello</value></parameter>
//!   <parameter><name>$instance</name><value>&lt;form&gt;…&lt;/form&gt;</value></parameter>
//!   <parameter><name>$action</name><value>&lt;setvalue ref="/form/x"&gt;1&lt;/setvalue&gt;</value></parameter>
//! </parameters></request>
//! ```
//!
//! El valor de `$instance`/`$action` puede llegar como texto escapado o como
//! elemento hijo de `value`. Otros nombres de parámetro se ignoran.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::action::Action;
use crate::constants::{ACTION_PARAM, INSTANCE_PARAM, NODE_PARAM_PREFIX};
use crate::errors::{InputName, XFormsError};
use crate::xml::{NodeId, XmlDocument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValue {
    pub value: String,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestParameters {
    ids: BTreeMap<u32, FieldValue>,
    #[serde(skip)]
    instance: Option<XmlDocument>,
    actions: Vec<Action>,
}

impl RequestParameters {
    pub fn parse(text: &str) -> Result<RequestParameters, XFormsError> {
        let doc = XmlDocument::parse(text).map_err(|e| XFormsError::malformed(InputName::Request, e))?;
        let root = doc.document_element()
                      .ok_or_else(|| XFormsError::malformed(InputName::Request, "no root element"))?;
        if doc.local_name(root) != Some("request") {
            return Err(XFormsError::malformed(InputName::Request, "expected a request element"));
        }

        let mut params = RequestParameters::default();
        for section in children_named(&doc, root, "parameters") {
            for parameter in children_named(&doc, section, "parameter") {
                params.add_parameter(&doc, parameter)?;
            }
        }
        debug!("request: {} id(s), instance={}, {} action(s)",
               params.ids.len(),
               params.instance.is_some(),
               params.actions.len());
        Ok(params)
    }

    fn add_parameter(&mut self, doc: &XmlDocument, parameter: NodeId) -> Result<(), XFormsError> {
        let name = children_named(doc, parameter, "name").first()
                                                           .map(|n| doc.string_value(*n).trim().to_string())
                                                           .ok_or_else(|| XFormsError::malformed(InputName::Request, "parameter without name"))?;
        let values = children_named(doc, parameter, "value");

        if let Some(raw_id) = name.strip_prefix(NODE_PARAM_PREFIX) {
            let id: u32 = raw_id.parse()
                                .map_err(|_| XFormsError::malformed(InputName::Request, format!("invalid node id in '{name}'")))?;
            let joined = values.iter().map(|v| doc.string_value(*v)).collect::<Vec<_>>().join(" ");
            let type_name = values.iter().find_map(|v| doc.attribute_value(*v, "type"));
            let entry = self.ids.entry(id).or_insert(FieldValue { value: String::new(),
                                                                  type_name: None });
            if entry.value.is_empty() {
                entry.value = joined;
            } else if !joined.is_empty() {
                entry.value.push(' ');
                entry.value.push_str(&joined);
            }
            if entry.type_name.is_none() {
                entry.type_name = type_name;
            }
        } else if name == INSTANCE_PARAM {
            if self.instance.is_some() {
                return Err(XFormsError::malformed(InputName::Request, "more than one $instance parameter"));
            }
            let value = single_value(doc, &values, INSTANCE_PARAM)?;
            self.instance = Some(embedded_document(doc, value, InputName::SubmittedInstance)?);
        } else if name == ACTION_PARAM {
            for value in values {
                let action_doc = embedded_document(doc, value, InputName::Action)?;
                let root = action_doc.document_element()
                                     .ok_or_else(|| XFormsError::malformed(InputName::Action, "empty action"))?;
                self.actions.push(Action::from_element(&action_doc, root)?);
            }
        }
        Ok(())
    }

    /// Asignaciones en orden ascendente de id.
    pub fn ids(&self) -> impl Iterator<Item = (u32, &FieldValue)> {
        self.ids.iter().map(|(id, v)| (*id, v))
    }

    pub fn value_for_id(&self, id: u32) -> Option<&str> {
        self.ids.get(&id).map(|v| v.value.as_str())
    }

    pub fn type_for_id(&self, id: u32) -> Option<&str> {
        self.ids.get(&id).and_then(|v| v.type_name.as_deref())
    }

    pub fn instance(&self) -> Option<&XmlDocument> {
        self.instance.as_ref()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn with_value(mut self, id: u32, value: impl Into<String>, type_name: Option<&str>) -> Self {
        self.ids.insert(id,
                        FieldValue { value: value.into(),
                                     type_name: type_name.map(str::to_string) });
        self
    }

    pub fn with_instance(mut self, instance: XmlDocument) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

fn children_named(doc: &XmlDocument, parent: NodeId, local: &str) -> Vec<NodeId> {
    doc.child_elements(parent)
       .into_iter()
       .filter(|c| doc.local_name(*c) == Some(local))
       .collect()
}

fn single_value(doc: &XmlDocument, values: &[NodeId], name: &str) -> Result<NodeId, XFormsError> {
    match values {
        [one] => Ok(*one),
        _ => Err(XFormsError::malformed(InputName::Request,
                                        format!("{name} expects exactly one value, got {} ({})",
                                                values.len(),
                                                values.iter().map(|v| doc.string_value(*v)).collect::<Vec<_>>().join(", ")))),
    }
}

/// Documento embebido en un `value`: elemento hijo o texto XML escapado.
fn embedded_document(doc: &XmlDocument, value: NodeId, input: InputName) -> Result<XmlDocument, XFormsError> {
    match doc.child_elements(value).as_slice() {
        [element] => Ok(XmlDocument::from_subtree(doc, *element)),
        [] => XmlDocument::parse(&doc.string_value(value)).map_err(|e| XFormsError::malformed(input, e)),
        _ => Err(XFormsError::malformed(input, "value holds more than one element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_types_and_joined_values() {
        let p = RequestParameters::parse(r#"<request><parameters>
            <parameter><name>$node^2</name><value type="xs:integer">4</value><value>2</value></parameter>
            <parameter><name>$node^1</name><value>hello</value></parameter>
            <parameter><name>other</name><value>ignored</value></parameter>
        </parameters></request>"#).unwrap();
        let ids: Vec<u32> = p.ids().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(p.value_for_id(2), Some("4 2"));
        assert_eq!(p.type_for_id(2), Some("xs:integer"));
        assert_eq!(p.type_for_id(1), None);
        assert!(p.instance().is_none());
        assert!(p.actions().is_empty());
    }

    #[test]
    fn parses_escaped_and_inline_embedded_documents() {
        let p = RequestParameters::parse(r#"<request><parameters>
            <parameter><name>$instance</name><value>&lt;form&gt;&lt;x&gt;s&lt;/x&gt;&lt;/form&gt;</value></parameter>
            <parameter><name>$action</name><value><setvalue ref="/form/x">1</setvalue></value></parameter>
            <parameter><name>$action</name><value>&lt;delete nodeset="/form/x"/&gt;</value></parameter>
        </parameters></request>"#).unwrap();
        assert_eq!(p.instance().unwrap().to_xml_string().unwrap(), "<form><x>s</x></form>");
        let names: Vec<_> = p.actions().iter().map(Action::name).collect();
        assert_eq!(names, vec!["setvalue", "delete"]);
    }

    #[test]
    fn bad_ids_and_embedded_documents_are_malformed() {
        let err = RequestParameters::parse("<request><parameters><parameter><name>$node^x</name><value/></parameter></parameters></request>").unwrap_err();
        assert!(matches!(err, XFormsError::MalformedInput { input: InputName::Request, .. }));

        let err = RequestParameters::parse("<request><parameters><parameter><name>$instance</name><value>&lt;form</value></parameter></parameters></request>").unwrap_err();
        assert!(matches!(err, XFormsError::MalformedInput { input: InputName::SubmittedInstance, .. }));

        assert!(RequestParameters::parse("<form/>").is_err());
    }
}
