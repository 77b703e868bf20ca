use thiserror::Error;
use xforms_core::XFormsError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de uso: {0}")]
    Usage(String),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    XForms(#[from] XFormsError),
}

impl AppError {
    /// Código de salida del binario: 2 uso, 4 input, 5 reconstrucción.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Usage(_) | AppError::Config(_) => 2,
            AppError::Io(_) | AppError::XForms(XFormsError::MalformedInput { .. }) => 4,
            AppError::XForms(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xforms_core::InputName;

    #[test]
    fn test_usage_variant_format() {
        let err = AppError::Usage("falta --model".into());
        assert_eq!(err.to_string(), "Error de uso: falta --model");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_io_variant_from() {
        let io_err = std::io::Error::other("falló IO");
        let err: AppError = io_err.into();
        assert_eq!(err.to_string(), "Error en IO: falló IO");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_core_errors_are_transparent() {
        let err: AppError = XFormsError::IdResolution(99).into();
        assert_eq!(err.to_string(), "no instance node for id 99");
        assert_eq!(err.exit_code(), 5);
        let err: AppError = XFormsError::malformed(InputName::Filter, "x").into();
        assert_eq!(err.exit_code(), 4);
    }
}
