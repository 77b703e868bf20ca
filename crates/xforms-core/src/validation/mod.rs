//! Entrega de la instancia terminada a validación.
//!
//! La validación es una llamada síncrona a un `InstanceValidator`. Una
//! instancia inválida no es un error: el validador devuelve un
//! `ValidatedOutput` con `valid = false` y el documento anotado.

mod decorating;
pub mod types;

use std::io::Write;

use serde::Serialize;

use crate::errors::XFormsError;
use crate::instance::Instance;
use crate::xml::XmlDocument;

pub use decorating::DecoratingValidator;

/// Problema encontrado en un nodo de la instancia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Id de decoración del nodo, si tiene.
    pub id: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidatedOutput {
    pub document: XmlDocument,
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidatedOutput {
    pub fn read<W: Write>(&self, sink: W) -> Result<(), XFormsError> {
        self.document.write_to(sink).map_err(XFormsError::Serialization)
    }
}

pub trait InstanceValidator: Send + Sync {
    /// Valida `instance` contra `schema` (URI declarada por el modelo).
    fn validate(&self, instance: &Instance, schema: &str) -> Result<ValidatedOutput, XFormsError>;
}
