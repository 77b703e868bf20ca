//! Etapas de la reconstrucción y su registro observable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::ENGINE_VERSION;
use crate::hashing::hash_value;

/// Etapas en el orden en que se ejecutan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Instancia inicial elegida (request o plantilla) y decorada.
    Selected,
    IdsApplied,
    PathParamsApplied,
    ActionsApplied,
    BindsApplied,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Selected => "selected",
            Stage::IdsApplied => "ids applied",
            Stage::PathParamsApplied => "path params applied",
            Stage::ActionsApplied => "actions applied",
            Stage::BindsApplied => "binds applied",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    /// blake3 de la serialización de la instancia al terminar la etapa.
    pub instance_hash: String,
    /// Fingerprint de la etapa: versión del motor + etapa + `instance_hash`.
    pub fingerprint: String,
    pub ts: DateTime<Utc>, // metadato (no entra en fingerprint)
}

impl StageRecord {
    pub fn new(stage: Stage, instance_hash: String) -> Self {
        let fingerprint = hash_value(&json!({
                                         "engine_version": ENGINE_VERSION,
                                         "stage": stage,
                                         "instance_hash": instance_hash,
                                     }));
        Self { stage,
               instance_hash,
               fingerprint,
               ts: Utc::now() }
    }
}

/// Fingerprint agregado de una reconstrucción (fingerprints de etapa en
/// orden).
pub fn reconstruction_fingerprint(stages: &[StageRecord]) -> String {
    let fps: Vec<&str> = stages.iter().map(|s| s.fingerprint.as_str()).collect();
    hash_value(&json!({ "engine_version": ENGINE_VERSION, "stages": fps }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_does_not_affect_fingerprint() {
        let a = StageRecord::new(Stage::IdsApplied, "h".into());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = StageRecord::new(Stage::IdsApplied, "h".into());
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, StageRecord::new(Stage::ActionsApplied, "h".into()).fingerprint);
    }
}
