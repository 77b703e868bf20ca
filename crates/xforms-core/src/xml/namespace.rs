//! Contexto de espacios de nombres (prefijo → URI).
//!
//! Se captura en el punto de definición de cada referencia (param del filtro,
//! bind del modelo, acción) y se usa al resolver sus location paths.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::XML_NAMESPACE_URI;

/// Mapa ordenado prefijo → URI. El prefijo vacío es el namespace por defecto.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceContext(IndexMap<String, String>);

impl NamespaceContext {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
        where I: IntoIterator<Item = (K, V)>,
              K: Into<String>,
              V: Into<String>
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Declara (o redefine) un prefijo.
    pub fn declare(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.0.insert(prefix.into(), uri.into());
    }

    /// Resuelve un prefijo. `xml` está siempre ligado.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE_URI);
        }
        self.0.get(prefix).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Separa un nombre calificado en (prefijo, local). Sin prefijo → "".
pub fn split_qname(name: &str) -> (&str, &str) {
    match name.split_once(':') {
        Some((p, l)) => (p, l),
        None => ("", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_prefix_is_always_bound() {
        let ctx = NamespaceContext::new();
        assert_eq!(ctx.resolve("xml"), Some(XML_NAMESPACE_URI));
        assert_eq!(ctx.resolve("f"), None);
    }

    #[test]
    fn split_qname_handles_both_forms() {
        assert_eq!(split_qname("f:form"), ("f", "form"));
        assert_eq!(split_qname("form"), ("", "form"));
    }
}
