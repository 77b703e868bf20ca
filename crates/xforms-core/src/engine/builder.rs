//! Builder para `InstanceEngine`.
//!
//! Parte del cache de instancias y el validador (en memoria y
//! `DecoratingValidator` con `InstanceEngine::new()`) y permite
//! reemplazarlos por otras implementaciones antes de construir.

use crate::engine::cache::{InstanceCache, ModelCache};
use crate::engine::InstanceEngine;
use crate::validation::InstanceValidator;

#[derive(Debug)]
pub struct EngineBuilder<C: InstanceCache, V: InstanceValidator> {
    instance_cache: C,
    validator: V,
    validate: bool,
}

impl<C: InstanceCache, V: InstanceValidator> EngineBuilder<C, V> {
    pub(crate) fn new(instance_cache: C, validator: V) -> Self {
        Self { instance_cache,
               validator,
               validate: true }
    }

    /// Reemplaza el cache de instancias.
    pub fn instance_cache<C2: InstanceCache>(self, instance_cache: C2) -> EngineBuilder<C2, V> {
        EngineBuilder { instance_cache,
                        validator: self.validator,
                        validate: self.validate }
    }

    /// Reemplaza el validador.
    pub fn validator<V2: InstanceValidator>(self, validator: V2) -> EngineBuilder<C, V2> {
        EngineBuilder { instance_cache: self.instance_cache,
                        validator,
                        validate: self.validate }
    }

    /// Activa o desactiva la validación (activa por defecto).
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn build(self) -> InstanceEngine<C, V> {
        InstanceEngine { instance_cache: self.instance_cache,
                         validator: self.validator,
                         models: ModelCache::new(),
                         validate: self.validate }
    }
}
