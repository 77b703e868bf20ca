//! Inyección determinista de cambios sobre la instancia.
//!
//! Cada etapa de la reconstrucción posterior a la selección (ids, parámetros
//! de ruta, acciones, binds) es un `InstanceInjector`; `CompositeInjector`
//! las aplica en el orden fijado por el orquestador.

pub mod composite;
pub mod injector;
pub mod sources;

pub use composite::CompositeInjector;
pub use injector::InstanceInjector;
pub use sources::{ActionSequence, BindSet};
