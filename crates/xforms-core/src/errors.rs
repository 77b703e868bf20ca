//! Errores específicos del core.
//!
//! Todas las variantes son fatales para la etapa: la reconstrucción produce
//! una instancia completa o falla entera. Un fallo de validación NO es un
//! error (ver `validation::ValidatedOutput`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Nombre lógico de cada input del procesador (para mensajes de error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputName {
    Model,
    Request,
    Filter,
    MatcherResult,
    /// Instancia enviada explícitamente dentro del request.
    SubmittedInstance,
    /// Elemento de acción embebido en un parámetro `$action`.
    Action,
}

impl std::fmt::Display for InputName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InputName::Model => "model",
            InputName::Request => "request",
            InputName::Filter => "filter",
            InputName::MatcherResult => "matcher-result",
            InputName::SubmittedInstance => "instance",
            InputName::Action => "action",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum XFormsError {
    #[error("malformed {input} input: {reason}")]
    MalformedInput { input: InputName, reason: String },
    #[error("no instance node for id {0}")]
    IdResolution(u32),
    #[error("action '{action}' failed: {reason}")]
    ActionExecution { action: String, reason: String },
    #[error("xpath: {0}")]
    XPath(String),
    #[error("serialization: {0}")]
    Serialization(String),
}

impl XFormsError {
    pub fn malformed(input: InputName, reason: impl Into<String>) -> Self {
        XFormsError::MalformedInput { input,
                                      reason: reason.into() }
    }

    pub fn action(action: &str, reason: impl Into<String>) -> Self {
        XFormsError::ActionExecution { action: action.to_string(),
                                       reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_variant_names_the_input() {
        let e = XFormsError::malformed(InputName::MatcherResult, "missing root");
        assert_eq!(e.to_string(), "malformed matcher-result input: missing root");
    }

    #[test]
    fn id_resolution_format() {
        assert_eq!(XFormsError::IdResolution(99).to_string(), "no instance node for id 99");
    }
}
