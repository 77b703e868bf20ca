//! Caches del motor: instancias por ejecución y modelos parseados.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use uuid::Uuid;

use crate::errors::XFormsError;
use crate::hashing::hash_str;
use crate::instance::Instance;
use crate::model::Model;

/// Instancias terminadas, por id de ejecución.
pub trait InstanceCache: Send + Sync {
    fn get(&self, execution_id: Uuid) -> Option<Instance>;
    fn put(&self, execution_id: Uuid, instance: Instance);
    fn remove(&self, execution_id: Uuid) -> Option<Instance>;
}

#[derive(Debug, Default)]
pub struct InMemoryInstanceCache {
    pub inner: DashMap<Uuid, Instance>,
}

impl InMemoryInstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl InstanceCache for InMemoryInstanceCache {
    fn get(&self, execution_id: Uuid) -> Option<Instance> {
        self.inner.get(&execution_id).map(|e| e.value().clone())
    }

    fn put(&self, execution_id: Uuid, instance: Instance) {
        self.inner.insert(execution_id, instance);
    }

    fn remove(&self, execution_id: Uuid) -> Option<Instance> {
        self.inner.remove(&execution_id).map(|(_, i)| i)
    }
}

/// Modelos parseados, por hash blake3 del texto. Único estado compartido
/// entre ejecuciones concurrentes; sólo lectura una vez insertado.
#[derive(Debug, Default)]
pub struct ModelCache {
    models: DashMap<String, Arc<Model>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(&self, text: &str) -> Result<Arc<Model>, XFormsError> {
        let key = hash_str(text);
        if let Some(hit) = self.models.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }
        let model = Arc::new(Model::parse(text)?);
        debug!("model cache miss, parsed model {}", &key[..12]);
        Ok(Arc::clone(self.models.entry(key).or_insert(model).value()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_cache_shares_parsed_models() {
        let cache = ModelCache::new();
        let a = cache.get_or_parse("<model><instance><f/></instance></model>").unwrap();
        let b = cache.get_or_parse("<model><instance><f/></instance></model>").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert!(cache.get_or_parse("<model/>").is_err());
        assert_eq!(cache.len(), 1);
    }
}
