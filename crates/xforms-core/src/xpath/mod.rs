//! Subconjunto XPath 1.0 usado por binds, acciones y parámetros de ruta.
//!
//! Una expresión se compila contra un `NamespaceContext`: los prefijos se
//! verifican en compilación, de modo que un prefijo no declarado falla antes
//! de tocar la instancia.

mod ast;
mod eval;
mod parser;
mod value;

use serde::{Serialize, Serializer};

use crate::errors::XFormsError;
use crate::xml::{NamespaceContext, NodeId, XmlDocument};

pub(crate) use eval::sort_document_order;
pub use value::{format_number, parse_xpath_number, XPathValue};

/// Resolución de variables `$nombre` durante la evaluación.
pub trait FunctionContext {
    fn variable(&self, name: &str) -> Option<XPathValue>;
}

/// Contexto sin variables.
pub struct NoVariables;

impl FunctionContext for NoVariables {
    fn variable(&self, _name: &str) -> Option<XPathValue> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct XPathExpr {
    source: String,
    expr: ast::Expr,
    namespaces: NamespaceContext,
}

impl XPathExpr {
    pub fn compile(source: &str, namespaces: &NamespaceContext) -> Result<Self, XFormsError> {
        let expr = parser::parse_expr(source).map_err(|e| XFormsError::XPath(format!("{source}: {e}")))?;
        let mut prefixes = Vec::new();
        expr.prefixes(&mut prefixes);
        if let Some(p) = prefixes.iter().find(|p| namespaces.resolve(p).is_none()) {
            return Err(XFormsError::XPath(format!("{source}: undeclared namespace prefix '{p}'")));
        }
        Ok(Self { source: source.to_string(),
                  expr,
                  namespaces: namespaces.clone() })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, doc: &XmlDocument, context: NodeId, functions: &dyn FunctionContext) -> Result<XPathValue, XFormsError> {
        let ctx = eval::EvalContext { doc,
                                      node: context,
                                      position: 1,
                                      size: 1,
                                      namespaces: &self.namespaces,
                                      functions };
        eval::evaluate(&self.expr, &ctx).map_err(|e| XFormsError::XPath(format!("{}: {e}", self.source)))
    }

    /// Evalúa y exige un node-set.
    pub fn select_nodes(&self, doc: &XmlDocument, context: NodeId, functions: &dyn FunctionContext) -> Result<Vec<NodeId>, XFormsError> {
        match self.evaluate(doc, context, functions)? {
            XPathValue::Nodes(n) => Ok(n),
            other => Err(XFormsError::XPath(format!("{}: expected a node-set, got {}", self.source, other.type_name()))),
        }
    }

    pub fn evaluate_string(&self, doc: &XmlDocument, context: NodeId, functions: &dyn FunctionContext) -> Result<String, XFormsError> {
        Ok(self.evaluate(doc, context, functions)?.to_string_value(doc))
    }

    pub fn evaluate_boolean(&self, doc: &XmlDocument, context: NodeId, functions: &dyn FunctionContext) -> Result<bool, XFormsError> {
        Ok(self.evaluate(doc, context, functions)?.to_boolean())
    }

    pub fn evaluate_number(&self, doc: &XmlDocument, context: NodeId, functions: &dyn FunctionContext) -> Result<f64, XFormsError> {
        Ok(self.evaluate(doc, context, functions)?.to_number(doc))
    }
}

/// Se serializa como su texto fuente (para fingerprints y depuración).
impl Serialize for XPathExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}
