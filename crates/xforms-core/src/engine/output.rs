//! Entradas y salidas del procesador.

use std::io::Write;

use serde::{Deserialize, Serialize};

use super::stage::{reconstruction_fingerprint, StageRecord};
use crate::errors::XFormsError;
use crate::instance::Instance;
use crate::validation::ValidatedOutput;

/// Los cuatro inputs textuales del procesador. `filter` y `matcher_result`
/// van juntos; si sólo llega uno, el otro cuenta como secuencia vacía.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorInputs {
    pub model: String,
    pub request: String,
    pub filter: Option<String>,
    pub matcher_result: Option<String>,
}

impl ProcessorInputs {
    pub fn new(model: impl Into<String>, request: impl Into<String>) -> Self {
        Self { model: model.into(),
               request: request.into(),
               filter: None,
               matcher_result: None }
    }

    pub fn with_path_params(mut self, filter: impl Into<String>, matcher_result: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self.matcher_result = Some(matcher_result.into());
        self
    }
}

/// Resultado de `InstanceEngine::reconstruct`.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub instance: Instance,
    /// Vacío si la instancia vino del cache.
    pub stages: Vec<StageRecord>,
    pub from_cache: bool,
}

impl Reconstruction {
    pub fn fingerprint(&self) -> String {
        reconstruction_fingerprint(&self.stages)
    }
}

/// Documento emitido: la instancia tal cual o la salida del validador.
#[derive(Debug, Clone)]
pub enum ProcessorOutput {
    Instance(Instance),
    Validated(ValidatedOutput),
}

impl ProcessorOutput {
    pub fn read<W: Write>(&self, sink: W) -> Result<(), XFormsError> {
        match self {
            ProcessorOutput::Instance(i) => i.read(sink),
            ProcessorOutput::Validated(v) => v.read(sink),
        }
    }

    pub fn to_xml_string(&self) -> Result<String, XFormsError> {
        let mut buf = Vec::new();
        self.read(&mut buf)?;
        String::from_utf8(buf).map_err(|e| XFormsError::Serialization(e.to_string()))
    }

    /// `None` si no hubo validación.
    pub fn validation(&self) -> Option<&ValidatedOutput> {
        match self {
            ProcessorOutput::Validated(v) => Some(v),
            ProcessorOutput::Instance(_) => None,
        }
    }
}
