//! Binds del modelo (model item properties) y su aplicación sobre una
//! instancia ya mutada por ids, parámetros de ruta y acciones.

use serde::Serialize;

use crate::errors::{InputName, XFormsError};
use crate::instance::Instance;
use crate::xml::{NodeId, XmlDocument};
use crate::xpath::{NoVariables, XPathExpr};

#[derive(Debug, Clone, Serialize)]
pub struct Bind {
    pub nodeset: XPathExpr,
    pub calculate: Option<XPathExpr>,
    pub required: Option<XPathExpr>,
    pub relevant: Option<XPathExpr>,
    pub readonly: Option<XPathExpr>,
    pub constraint: Option<XPathExpr>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Binds anidados: su nodeset es relativo a cada nodo del exterior.
    pub children: Vec<Bind>,
}

impl Bind {
    /// Construye un bind desde un elemento `bind` del modelo. Las expresiones
    /// se compilan con los namespaces en ámbito del elemento.
    pub(crate) fn from_element(doc: &XmlDocument, element: NodeId) -> Result<Bind, XFormsError> {
        let namespaces = doc.in_scope_namespaces(element);
        let compile = |attr: &str| -> Result<Option<XPathExpr>, XFormsError> {
            match doc.attribute_value(element, attr) {
                Some(src) => XPathExpr::compile(&src, &namespaces).map(Some)
                                                                  .map_err(|e| XFormsError::malformed(InputName::Model, e.to_string())),
                None => Ok(None),
            }
        };
        let nodeset = compile("nodeset")?.ok_or_else(|| XFormsError::malformed(InputName::Model, "bind without nodeset"))?;
        let mut children = Vec::new();
        for c in doc.child_elements(element) {
            if doc.local_name(c) == Some("bind") {
                children.push(Bind::from_element(doc, c)?);
            }
        }
        Ok(Bind { nodeset,
                  calculate: compile("calculate")?,
                  required: compile("required")?,
                  relevant: compile("relevant")?,
                  readonly: compile("readonly")?,
                  constraint: compile("constraint")?,
                  type_name: doc.attribute_value(element, "type"),
                  children })
    }

    fn bound_nodes(&self, doc: &XmlDocument, context: NodeId) -> Result<Vec<NodeId>, XFormsError> {
        self.nodeset.select_nodes(doc, context, &NoVariables)
    }
}

/// Aplica los binds: primero todos los `calculate` (en orden de bind y de
/// documento) y después las anotaciones, para que éstas vean los valores
/// calculados.
pub fn apply_binds(binds: &[Bind], instance: &mut Instance) -> Result<(), XFormsError> {
    let Some(root) = instance.document().document_element() else {
        return Ok(());
    };
    for bind in binds {
        calculate(bind, instance, root)?;
    }
    for bind in binds {
        annotate(bind, instance, root)?;
    }
    Ok(())
}

fn calculate(bind: &Bind, instance: &mut Instance, context: NodeId) -> Result<(), XFormsError> {
    for node in bind.bound_nodes(instance.document(), context)? {
        if let Some(expr) = &bind.calculate {
            let value = expr.evaluate_string(instance.document(), node, &NoVariables)?;
            instance.document_mut().set_string_value(node, &value);
        }
        for child in &bind.children {
            calculate(child, instance, node)?;
        }
    }
    Ok(())
}

fn annotate(bind: &Bind, instance: &mut Instance, context: NodeId) -> Result<(), XFormsError> {
    for node in bind.bound_nodes(instance.document(), context)? {
        let doc = instance.document();
        let flag = |e: &Option<XPathExpr>| -> Result<Option<bool>, XFormsError> {
            e.as_ref().map(|x| x.evaluate_boolean(doc, node, &NoVariables)).transpose()
        };
        let required = flag(&bind.required)?;
        let relevant = flag(&bind.relevant)?;
        let readonly = flag(&bind.readonly)?;
        let constraint = flag(&bind.constraint)?;

        let decoration = instance.decoration_mut();
        if let Some(t) = &bind.type_name {
            decoration.set_type(node, t);
        }
        let props = decoration.properties_mut(node);
        if let Some(v) = required {
            props.required = v;
        }
        if let Some(v) = relevant {
            props.relevant = v;
        }
        if let Some(v) = readonly {
            props.readonly = v;
        }
        if let Some(v) = constraint {
            props.constraint = v;
        }
        for child in &bind.children {
            annotate(child, instance, node)?;
        }
    }
    Ok(())
}
