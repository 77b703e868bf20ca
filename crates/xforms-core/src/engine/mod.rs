//! Orquestador de la reconstrucción de instancias.
//!
//! Provee el motor, su builder, los caches y los tipos de entrada/salida.

pub mod builder;
pub mod cache;
pub mod context;
pub mod core;
pub mod output;
pub mod stage;

pub use builder::EngineBuilder;
pub use cache::{InMemoryInstanceCache, InstanceCache, ModelCache};
pub use context::ExecutionContext;
pub use self::core::InstanceEngine;
pub use output::{ProcessorInputs, ProcessorOutput, Reconstruction};
pub use stage::{Stage, StageRecord};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::XFormsError;

    const MODEL: &str = "<model><instance><form><x/><y/></form></instance></model>";

    fn request(body: &str) -> String {
        format!("<request><parameters>{body}</parameters></request>")
    }

    #[test]
    fn test_reconstruct_records_every_stage() {
        let engine = InstanceEngine::new().build();
        let ctx = ExecutionContext::new();
        let inputs = ProcessorInputs::new(MODEL, request("<parameter><name>$node^1</name><value>hello</value></parameter>"));
        let r = engine.reconstruct(&ctx, &inputs).expect("reconstruction");

        assert!(!r.from_cache);
        let stages: Vec<Stage> = r.stages.iter().map(|s| s.stage).collect();
        assert_eq!(stages,
                   vec![Stage::Selected, Stage::IdsApplied, Stage::PathParamsApplied, Stage::ActionsApplied, Stage::BindsApplied]);
        assert_eq!(r.stages.last().unwrap().instance_hash, r.instance.fingerprint().unwrap());
        assert_ne!(r.stages[0].instance_hash, r.stages[1].instance_hash);
        assert_eq!(r.instance.to_xml_string().unwrap(), "<form><x>hello</x><y/></form>");
    }

    #[test]
    fn test_failure_caches_nothing() {
        let engine = InstanceEngine::new().build();
        let ctx = ExecutionContext::new();
        let inputs = ProcessorInputs::new(MODEL, request("<parameter><name>$node^99</name><value>v</value></parameter>"));
        let err = engine.reconstruct(&ctx, &inputs).unwrap_err();
        assert_eq!(err, XFormsError::IdResolution(99));
        assert!(engine.instance_cache().is_empty());
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let engine = InstanceEngine::new().build();
        let ctx = ExecutionContext::new();
        let inputs = ProcessorInputs::new(MODEL, request(""));
        assert!(!engine.reconstruct(&ctx, &inputs).unwrap().from_cache);
        assert!(engine.reconstruct(&ctx, &inputs).unwrap().from_cache);
        assert!(engine.invalidate(&ctx));
        assert!(!engine.invalidate(&ctx));
        assert!(!engine.reconstruct(&ctx, &inputs).unwrap().from_cache);
    }

    #[test]
    fn test_emit_hands_off_a_built_instance() {
        let engine = InstanceEngine::new().build();
        let ctx = ExecutionContext::new();
        let with_schema = r#"<model schema="form.xsd"><instance><form><x/><y/></form></instance></model>"#;
        let inputs = ProcessorInputs::new(with_schema, request("<parameter><name>$node^1</name><value>hello</value></parameter>"));
        let r = engine.reconstruct(&ctx, &inputs).unwrap();
        assert!(!r.from_cache);

        let model = engine.model(with_schema).unwrap();
        let out = engine.emit(&ctx, &model, r.instance.clone()).unwrap();
        let validated = out.validation().expect("model declares a schema");
        assert!(validated.valid);
        assert_eq!(out.to_xml_string().unwrap(), "<form><x>hello</x><y/></form>");

        let plain = engine.model(MODEL).unwrap();
        let out = engine.emit(&ctx, &plain, r.instance).unwrap();
        assert!(out.validation().is_none());
        assert_eq!(engine.instance_cache().len(), 1);
    }
}
