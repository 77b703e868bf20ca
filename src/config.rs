//! Configuración del procesador.
//! Carga variables de entorno (.env vía dotenvy) y expone una instancia
//! global inmutable (`CONFIG`). Los callers pueden construir su propia
//! `ProcessorConfig` y sobreescribir valores programáticamente.
use std::env;

use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Variable que activa/desactiva la validación contra schema.
pub const VALIDATE_VAR: &str = "XFORMS_VALIDATE";

/// Configuración del procesador de input XForms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Validar la instancia cuando el modelo declara schema (por defecto `true`).
    pub validate: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self { validate: true }
    }
}

impl ProcessorConfig {
    /// Lee la configuración del entorno del proceso.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|k| env::var(k).ok())
    }

    /// Lee la configuración desde una función de búsqueda de variables.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(VALIDATE_VAR) {
            config.validate = parse_flag(&raw).ok_or_else(|| AppError::Config(format!("{VALIDATE_VAR}: valor inválido '{raw}'")))?;
        }
        Ok(config)
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<ProcessorConfig> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
    ProcessorConfig::from_env().unwrap_or_else(|e| {
                                   warn!("{e}; usando configuración por defecto");
                                   ProcessorConfig::default()
                               })
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_validation_enabled() {
        let c = ProcessorConfig::from_vars(|_| None).unwrap();
        assert!(c.validate);
    }

    #[test]
    fn reads_flag_variants() {
        for (raw, expected) in [("false", false), ("0", false), ("OFF", false), ("true", true), (" yes ", true)] {
            let c = ProcessorConfig::from_vars(|k| (k == VALIDATE_VAR).then(|| raw.to_string())).unwrap();
            assert_eq!(c.validate, expected, "valor {raw}");
        }
    }

    #[test]
    fn rejects_unknown_values() {
        let err = ProcessorConfig::from_vars(|_| Some("quizá".into())).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
