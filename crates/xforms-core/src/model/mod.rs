//! Modelo XForms: plantilla de instancia inicial, binds y schema opcional.
//!
//! El modelo es inmutable una vez parseado y se comparte (`Arc<Model>`)
//! entre ejecuciones a través del cache de modelos, cuya clave es el hash
//! del texto fuente (`Model::source_hash`).

pub mod bind;

use serde::Serialize;

use crate::errors::{InputName, XFormsError};
use crate::hashing::hash_str;
use crate::instance::Instance;
use crate::xml::XmlDocument;

pub use bind::{apply_binds, Bind};

#[derive(Debug, Clone, Serialize)]
pub struct Model {
    #[serde(skip)]
    template: XmlDocument,
    binds: Vec<Bind>,
    schema: Option<String>,
    source_hash: String,
}

impl Model {
    /// Parsea `<model [schema=".."]><instance>…</instance><bind …/>…</model>`.
    /// Los elementos se reconocen por nombre local.
    pub fn parse(text: &str) -> Result<Model, XFormsError> {
        let doc = XmlDocument::parse(text).map_err(|e| XFormsError::malformed(InputName::Model, e))?;
        let root = doc.document_element()
                      .ok_or_else(|| XFormsError::malformed(InputName::Model, "no root element"))?;
        if doc.local_name(root) != Some("model") {
            return Err(XFormsError::malformed(InputName::Model,
                                              format!("expected a model element, found '{}'", doc.name(root).unwrap_or_default())));
        }

        let mut template = None;
        let mut binds = Vec::new();
        for child in doc.child_elements(root) {
            match doc.local_name(child) {
                Some("instance") if template.is_none() => {
                    let content = doc.child_elements(child);
                    match content.as_slice() {
                        [single] => template = Some(XmlDocument::from_subtree(&doc, *single)),
                        _ => {
                            return Err(XFormsError::malformed(InputName::Model,
                                                              "instance must contain exactly one root element"))
                        }
                    }
                }
                Some("instance") => {
                    return Err(XFormsError::malformed(InputName::Model, "more than one instance"));
                }
                Some("bind") => binds.push(Bind::from_element(&doc, child)?),
                _ => {}
            }
        }

        let template = template.ok_or_else(|| XFormsError::malformed(InputName::Model, "model has no instance"))?;
        Ok(Model { template,
                   binds,
                   schema: doc.attribute_value(root, "schema").filter(|s| !s.is_empty()),
                   source_hash: hash_str(text) })
    }

    pub fn template(&self) -> &XmlDocument {
        &self.template
    }

    /// Copia nueva de la plantilla, sin decorar.
    pub fn initial_instance(&self) -> Instance {
        Instance::new(self.template.clone())
    }

    pub fn binds(&self) -> &[Bind] {
        &self.binds
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }
}
