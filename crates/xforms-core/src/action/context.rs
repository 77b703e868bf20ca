use indexmap::IndexMap;

use crate::xpath::{FunctionContext, XPathValue};

/// Contexto de funciones de una acción: sólo expone variables `$nombre`.
/// El orquestador crea uno nuevo por acción.
#[derive(Debug, Clone, Default)]
pub struct ActionFunctionContext {
    variables: IndexMap<String, XPathValue>,
}

impl ActionFunctionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: XPathValue) -> Self {
        self.variables.insert(name.into(), value);
        self
    }
}

impl FunctionContext for ActionFunctionContext {
    fn variable(&self, name: &str) -> Option<XPathValue> {
        self.variables.get(name).cloned()
    }
}
