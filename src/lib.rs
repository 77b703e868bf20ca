//! xforms-input: binario y fachada sobre `xforms-core`.
//!
//! Expone la configuración (`CONFIG`), los errores de aplicación y un
//! atajo `process` que construye el motor y ejecuta una reconstrucción.
pub mod cli;
pub mod config;
pub mod errors;

pub use config::{ProcessorConfig, CONFIG};
pub use errors::AppError;
pub use xforms_core;

use xforms_core::{DecoratingValidator, ExecutionContext, InMemoryInstanceCache, InstanceEngine, ProcessorInputs,
                  ProcessorOutput};

pub type DefaultEngine = InstanceEngine<InMemoryInstanceCache, DecoratingValidator>;

/// Motor por defecto configurado según `config`.
pub fn build_engine(config: &ProcessorConfig) -> DefaultEngine {
    InstanceEngine::new().validate(config.validate).build()
}

/// Ejecución única con una id nueva.
pub fn process(config: &ProcessorConfig, inputs: &ProcessorInputs) -> Result<ProcessorOutput, AppError> {
    let engine = build_engine(config);
    Ok(engine.run(&ExecutionContext::new(), inputs)?)
}
