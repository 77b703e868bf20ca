//! Acciones XForms aplicadas durante la reconstrucción.
//!
//! Conjunto cerrado (`setvalue`, `insert`, `delete`) despachado con `match`.
//! Cada acción guarda los namespaces en ámbito de su elemento de origen y no
//! tiene estado después de construida. Las acciones se ejecutan en el orden
//! del request y no son transaccionales: si una falla, la reconstrucción
//! entera falla.

mod context;

use serde::Serialize;

use crate::errors::{InputName, XFormsError};
use crate::xml::{NodeId, XmlDocument};
use crate::xpath::XPathExpr;

pub use context::ActionFunctionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Before,
    After,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetValueSource {
    Literal(String),
    Expression(XPathExpr),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    SetValue { reference: XPathExpr, value: SetValueSource },
    Insert { nodeset: XPathExpr, at: Option<XPathExpr>, position: InsertPosition },
    Delete { nodeset: XPathExpr, at: Option<XPathExpr> },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetValue { .. } => "setvalue",
            Action::Insert { .. } => "insert",
            Action::Delete { .. } => "delete",
        }
    }

    /// Parsea un elemento de acción serializado, p.ej.
    /// `<setvalue ref="/form/x">1</setvalue>`.
    pub fn parse(text: &str) -> Result<Action, XFormsError> {
        let doc = XmlDocument::parse(text).map_err(|e| XFormsError::malformed(InputName::Action, e))?;
        let root = doc.document_element()
                      .ok_or_else(|| XFormsError::malformed(InputName::Action, "empty action"))?;
        Action::from_element(&doc, root)
    }

    /// Construye la acción desde un elemento, reconocido por nombre local.
    pub fn from_element(doc: &XmlDocument, element: NodeId) -> Result<Action, XFormsError> {
        let namespaces = doc.in_scope_namespaces(element);
        let local = doc.local_name(element).unwrap_or_default();
        let compile = |attr: &str| -> Result<Option<XPathExpr>, XFormsError> {
            doc.attribute_value(element, attr)
               .map(|src| XPathExpr::compile(&src, &namespaces))
               .transpose()
               .map_err(|e| XFormsError::malformed(InputName::Action, e.to_string()))
        };
        let required = |attr: &str| -> Result<XPathExpr, XFormsError> {
            compile(attr)?.ok_or_else(|| XFormsError::malformed(InputName::Action, format!("{local} requires a '{attr}' attribute")))
        };

        match local {
            "setvalue" => {
                let value = match compile("value")? {
                    Some(expr) => SetValueSource::Expression(expr),
                    None => SetValueSource::Literal(doc.string_value(element)),
                };
                Ok(Action::SetValue { reference: required("ref")?,
                                      value })
            }
            "insert" => {
                let position = match doc.attribute_value(element, "position").as_deref() {
                    None | Some("after") => InsertPosition::After,
                    Some("before") => InsertPosition::Before,
                    Some(other) => {
                        return Err(XFormsError::malformed(InputName::Action, format!("invalid insert position '{other}'")))
                    }
                };
                Ok(Action::Insert { nodeset: required("nodeset")?,
                                    at: compile("at")?,
                                    position })
            }
            "delete" => Ok(Action::Delete { nodeset: required("nodeset")?,
                                            at: compile("at")? }),
            other => Err(XFormsError::malformed(InputName::Action, format!("unknown action '{other}'"))),
        }
    }

    /// Ejecuta la acción sobre `doc`. Las expresiones se evalúan desde el
    /// nodo documento.
    pub fn run(&self, fctx: &ActionFunctionContext, doc: &mut XmlDocument) -> Result<(), XFormsError> {
        let root = doc.root();
        match self {
            Action::SetValue { reference, value } => {
                let nodes = reference.select_nodes(doc, root, fctx).map_err(|e| self.failure(e.to_string()))?;
                let target = *nodes.first()
                                   .ok_or_else(|| self.failure(format!("ref '{}' matched no node", reference.source())))?;
                let text = match value {
                    SetValueSource::Literal(s) => s.clone(),
                    SetValueSource::Expression(e) => e.evaluate_string(doc, target, fctx)
                                                      .map_err(|e| self.failure(e.to_string()))?,
                };
                doc.set_string_value(target, &text);
                Ok(())
            }
            Action::Insert { nodeset, at, position } => {
                let nodes = nodeset.select_nodes(doc, root, fctx).map_err(|e| self.failure(e.to_string()))?;
                let Some(last) = nodes.last().copied() else {
                    return Err(self.failure(format!("nodeset '{}' is empty", nodeset.source())));
                };
                let target = nodes[self.index(at.as_ref(), doc, fctx, nodes.len())?];
                if doc.is_attribute(target) {
                    return Err(self.failure("attribute nodes cannot be inserted"));
                }
                let parent = doc.parent(target).ok_or_else(|| self.failure("target has no parent"))?;
                if parent == root {
                    return Err(self.failure("cannot insert a sibling of the root element"));
                }
                let offset = doc.position_in_parent(target).unwrap_or(0);
                let index = match position {
                    InsertPosition::Before => offset,
                    InsertPosition::After => offset + 1,
                };
                let copy = doc.deep_copy(last);
                doc.insert_child_at(parent, index, copy);
                Ok(())
            }
            Action::Delete { nodeset, at } => {
                let nodes = nodeset.select_nodes(doc, root, fctx).map_err(|e| self.failure(e.to_string()))?;
                if nodes.is_empty() {
                    return Ok(());
                }
                let targets = match at {
                    Some(_) => vec![nodes[self.index(at.as_ref(), doc, fctx, nodes.len())?]],
                    None => nodes,
                };
                if targets.iter().any(|t| doc.parent(*t) == Some(root)) {
                    return Err(self.failure("cannot delete the root element"));
                }
                for t in targets {
                    doc.detach(t);
                }
                Ok(())
            }
        }
    }

    /// Índice 0-based a partir de `at` (1-based, por defecto el último),
    /// acotado a [1, size].
    fn index(&self, at: Option<&XPathExpr>, doc: &XmlDocument, fctx: &ActionFunctionContext, size: usize) -> Result<usize, XFormsError> {
        let Some(expr) = at else {
            return Ok(size - 1);
        };
        let n = expr.evaluate_number(doc, doc.root(), fctx)
                    .map_err(|e| self.failure(e.to_string()))?
                    .round();
        if n.is_nan() {
            return Ok(size - 1);
        }
        Ok((n.max(1.0).min(size as f64) as usize) - 1)
    }

    fn failure(&self, reason: impl Into<String>) -> XFormsError {
        XFormsError::action(self.name(), reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::XPathValue;

    fn doc() -> XmlDocument {
        XmlDocument::parse("<form><x/><items><item>a</item><item>b</item></items></form>").unwrap()
    }

    fn run(action: &str, doc: &mut XmlDocument) -> Result<(), XFormsError> {
        Action::parse(action)?.run(&ActionFunctionContext::new(), doc)
    }

    #[test]
    fn setvalue_literal_and_expression() {
        let mut d = doc();
        run(r#"<setvalue ref="/form/x">lit</setvalue>"#, &mut d).unwrap();
        assert_eq!(d.to_xml_string().unwrap(), "<form><x>lit</x><items><item>a</item><item>b</item></items></form>");
        run(r#"<setvalue ref="/form/x" value="count(/form/items/item)"/>"#, &mut d).unwrap();
        assert!(d.to_xml_string().unwrap().starts_with("<form><x>2</x>"));
    }

    #[test]
    fn setvalue_reads_variables() {
        let mut d = doc();
        let fctx = ActionFunctionContext::new().with_variable("v", XPathValue::String("from-var".into()));
        Action::parse(r#"<setvalue ref="/form/x" value="$v"/>"#).unwrap().run(&fctx, &mut d).unwrap();
        assert!(d.to_xml_string().unwrap().starts_with("<form><x>from-var</x>"));
    }

    #[test]
    fn setvalue_without_target_fails() {
        let mut d = doc();
        let err = run(r#"<setvalue ref="/form/missing">v</setvalue>"#, &mut d).unwrap_err();
        assert!(matches!(err, XFormsError::ActionExecution { ref action, .. } if action == "setvalue"));
    }

    #[test]
    fn insert_clones_last_node_after_at() {
        let mut d = doc();
        run(r#"<insert nodeset="/form/items/item" at="1" position="after"/>"#, &mut d).unwrap();
        assert_eq!(d.to_xml_string().unwrap(),
                   "<form><x/><items><item>a</item><item>b</item><item>b</item></items></form>");
        let mut d = doc();
        run(r#"<insert nodeset="/form/items/item" at="1" position="before"/>"#, &mut d).unwrap();
        assert_eq!(d.to_xml_string().unwrap(),
                   "<form><x/><items><item>b</item><item>a</item><item>b</item></items></form>");
    }

    #[test]
    fn insert_at_is_clamped() {
        let mut d = doc();
        run(r#"<insert nodeset="/form/items/item" at="42" position="before"/>"#, &mut d).unwrap();
        assert_eq!(d.to_xml_string().unwrap(),
                   "<form><x/><items><item>a</item><item>b</item><item>b</item></items></form>");
    }

    #[test]
    fn insert_into_empty_nodeset_fails() {
        let mut d = doc();
        assert!(run(r#"<insert nodeset="/form/none"/>"#, &mut d).is_err());
    }

    #[test]
    fn delete_semantics() {
        let mut d = doc();
        run(r#"<delete nodeset="/form/items/item" at="1"/>"#, &mut d).unwrap();
        assert_eq!(d.to_xml_string().unwrap(), "<form><x/><items><item>b</item></items></form>");
        run(r#"<delete nodeset="/form/none"/>"#, &mut d).unwrap();
        run(r#"<delete nodeset="/form/items/item"/>"#, &mut d).unwrap();
        assert_eq!(d.to_xml_string().unwrap(), "<form><x/><items/></form>");
        assert!(run(r#"<delete nodeset="/form"/>"#, &mut d).is_err());
    }

    #[test]
    fn evaluation_failures_are_action_errors() {
        for action in [r#"<setvalue ref="/form/x" value="$nope"/>"#,
                       r#"<setvalue ref="1">v</setvalue>"#,
                       r#"<insert nodeset="'items'"/>"#,
                       r#"<insert nodeset="/form/items/item" at="$missing"/>"#,
                       r#"<delete nodeset="count(/form/items/item)"/>"#]
        {
            let mut d = doc();
            let err = run(action, &mut d).unwrap_err();
            assert!(matches!(err, XFormsError::ActionExecution { .. }), "{action}: got {err:?}");
        }
    }

    #[test]
    fn unknown_action_is_malformed() {
        let err = Action::parse("<toggle case='x'/>").unwrap_err();
        assert!(matches!(err, XFormsError::MalformedInput { input: InputName::Action, .. }));
        assert!(Action::parse("<setvalue>no ref</setvalue>").is_err());
    }
}
