//! Parámetros de ruta: pares (referencia del `filter`, valor capturado del
//! `matcher-result`) alineados por posición.

use serde::Serialize;

use crate::errors::{InputName, XFormsError};
use crate::xml::{NamespaceContext, XmlDocument};

/// Referencia de un `<param ref="…"/>` con los namespaces en ámbito del
/// elemento que la declara.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathParam {
    pub reference: String,
    pub namespaces: NamespaceContext,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PathParameters {
    params: Vec<PathParam>,
    values: Vec<String>,
}

impl PathParameters {
    /// Alinea ambas secuencias; longitudes distintas son input mal formado.
    pub fn new(params: Vec<PathParam>, values: Vec<String>) -> Result<Self, XFormsError> {
        if params.len() != values.len() {
            return Err(XFormsError::malformed(InputName::MatcherResult,
                                              format!("{} group(s) for {} filter param(s)", values.len(), params.len())));
        }
        Ok(Self { params, values })
    }

    pub fn parse(filter: &str, matcher_result: &str) -> Result<Self, XFormsError> {
        Self::new(parse_filter(filter)?, parse_matcher_result(matcher_result)?)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathParam, &str)> {
        self.params.iter().zip(self.values.iter().map(String::as_str))
    }
}

/// `<params><param ref="…"/>…</params>`
pub fn parse_filter(text: &str) -> Result<Vec<PathParam>, XFormsError> {
    let doc = XmlDocument::parse(text).map_err(|e| XFormsError::malformed(InputName::Filter, e))?;
    let root = doc.document_element()
                  .ok_or_else(|| XFormsError::malformed(InputName::Filter, "no root element"))?;
    let mut params = Vec::new();
    for p in doc.child_elements(root) {
        if doc.local_name(p) != Some("param") {
            continue;
        }
        let reference = doc.attribute_value(p, "ref")
                           .ok_or_else(|| XFormsError::malformed(InputName::Filter, "param without ref"))?;
        params.push(PathParam { reference,
                                namespaces: doc.in_scope_namespaces(p) });
    }
    Ok(params)
}

/// `<result><group>…</group>…</result>`
pub fn parse_matcher_result(text: &str) -> Result<Vec<String>, XFormsError> {
    let doc = XmlDocument::parse(text).map_err(|e| XFormsError::malformed(InputName::MatcherResult, e))?;
    let root = doc.document_element()
                  .ok_or_else(|| XFormsError::malformed(InputName::MatcherResult, "no root element"))?;
    Ok(doc.child_elements(root)
          .into_iter()
          .filter(|g| doc.local_name(*g) == Some("group"))
          .map(|g| doc.string_value(g))
          .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_params_with_groups() {
        let p = PathParameters::parse(r#"<params xmlns:f="urn:f"><param ref="/f:form/f:a"/><param ref="/f:form/f:b"/></params>"#,
                                      "<result><group>1</group><group/></result>").unwrap();
        let pairs: Vec<_> = p.iter().map(|(param, v)| (param.reference.as_str(), v)).collect();
        assert_eq!(pairs, vec![("/f:form/f:a", "1"), ("/f:form/f:b", "")]);
        let (first, _) = p.iter().next().unwrap();
        assert_eq!(first.namespaces.resolve("f"), Some("urn:f"));
    }

    #[test]
    fn count_mismatch_is_malformed() {
        let err = PathParameters::parse(r#"<params><param ref="/a"/></params>"#, "<result/>").unwrap_err();
        assert!(matches!(err, XFormsError::MalformedInput { input: InputName::MatcherResult, .. }));
    }

    #[test]
    fn param_without_ref_is_rejected() {
        assert!(parse_filter("<params><param/></params>").is_err());
    }
}
