use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use xforms_core::{ExecutionContext, Instance, InstanceEngine, InstanceValidator, ProcessorInputs, ProcessorOutput, ValidatedOutput,
                  XFormsError};

const MODEL_WITH_SCHEMA: &str = r#"<model schema="form.xsd">
    <instance><form><age/></form></instance>
    <bind nodeset="/form/age" type="xs:integer"/>
</model>"#;

fn request(age: &str) -> String {
    format!("<request><parameters><parameter><name>$node^1</name><value>{age}</value></parameter></parameters></request>")
}

/// Validador que cuenta invocaciones y delega en la instancia sin tocarla.
#[derive(Clone, Default)]
struct CountingValidator {
    calls: Arc<AtomicUsize>,
}

impl InstanceValidator for CountingValidator {
    fn validate(&self, instance: &Instance, _schema: &str) -> Result<ValidatedOutput, XFormsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ValidatedOutput { document: instance.document().clone(),
                             valid: true,
                             issues: vec![] })
    }
}

#[test]
fn disabled_validation_never_calls_the_validator() {
    let validator = CountingValidator::default();
    let calls = validator.calls.clone();
    let engine = InstanceEngine::new().validator(validator).validate(false).build();
    let out = engine.run(&ExecutionContext::new(), &ProcessorInputs::new(MODEL_WITH_SCHEMA, request("abc"))).unwrap();
    assert!(matches!(out, ProcessorOutput::Instance(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn model_without_schema_is_not_validated() {
    let validator = CountingValidator::default();
    let calls = validator.calls.clone();
    let engine = InstanceEngine::new().validator(validator).build();
    let model = "<model><instance><form><age/></form></instance></model>";
    engine.run(&ExecutionContext::new(), &ProcessorInputs::new(model, request("1"))).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn enabled_validation_with_schema_calls_the_validator_once() {
    let validator = CountingValidator::default();
    let calls = validator.calls.clone();
    let engine = InstanceEngine::new().validator(validator).build();
    let out = engine.run(&ExecutionContext::new(), &ProcessorInputs::new(MODEL_WITH_SCHEMA, request("1"))).unwrap();
    assert!(out.validation().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn non_conforming_instance_emits_the_validator_output() {
    let engine = InstanceEngine::new().build();
    let out = engine.run(&ExecutionContext::new(), &ProcessorInputs::new(MODEL_WITH_SCHEMA, request("abc")))
                    .expect("validation failure is not an error");
    let validated = out.validation().expect("validated output");
    assert!(!validated.valid);
    let xml = out.to_xml_string().unwrap();
    assert!(xml.contains(r#"xxforms:valid="false""#), "{xml}");
    assert!(xml.contains(r#"xmlns:xxforms="http://orbeon.org/oxf/xml/xforms""#), "{xml}");
}

#[test]
fn conforming_instance_passes_through() {
    let engine = InstanceEngine::new().build();
    let out = engine.run(&ExecutionContext::new(), &ProcessorInputs::new(MODEL_WITH_SCHEMA, request("30"))).unwrap();
    assert!(out.validation().map(|v| v.valid).unwrap_or(false));
    assert_eq!(out.to_xml_string().unwrap(), "<form><age>30</age></form>");
}
