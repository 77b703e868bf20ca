use std::fs;
use std::path::PathBuf;

use uuid::Uuid;
use xforms_input::cli::{parse_args, Command};
use xforms_input::xforms_core::{InputName, XFormsError};
use xforms_input::{build_engine, process, AppError, ProcessorConfig};

const MODEL: &str = r#"<model schema="form.xsd"><instance><form><name/><age/></form></instance></model>"#;

fn request(body: &str) -> String {
    format!("<request><parameters>{body}</parameters></request>")
}

fn write_temp(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("xforms-input-{}-{name}", Uuid::new_v4()));
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn process_applies_ids_and_validates() {
    let inputs = xforms_input::xforms_core::ProcessorInputs::new(MODEL,
                                                                 request(r#"<parameter><name>$node^1</name><value>Ana</value></parameter>
           <parameter><name>$node^2</name><value type="xs:integer">x</value></parameter>"#));
    let out = process(&ProcessorConfig::default(), &inputs).unwrap();
    let validated = out.validation().expect("model declares a schema");
    assert!(!validated.valid);
    assert_eq!(validated.issues.len(), 1);
    assert_eq!(validated.issues[0].id, Some(2));
}

#[test]
fn disabled_validation_emits_the_instance() {
    let inputs = xforms_input::xforms_core::ProcessorInputs::new(MODEL,
                                                                 request("<parameter><name>$node^1</name><value>Ana</value></parameter>"));
    let config = ProcessorConfig::default().with_validate(false);
    let out = process(&config, &inputs).unwrap();
    assert!(out.validation().is_none());
    assert_eq!(out.to_xml_string().unwrap(), "<form><name>Ana</name><age/></form>");
}

#[test]
fn core_errors_map_to_exit_codes() {
    let inputs = xforms_input::xforms_core::ProcessorInputs::new(MODEL,
                                                                 request("<parameter><name>$node^9</name><value>v</value></parameter>"));
    let err = process(&ProcessorConfig::default(), &inputs).unwrap_err();
    assert!(matches!(err, AppError::XForms(XFormsError::IdResolution(9))));
    assert_eq!(err.exit_code(), 5);

    let inputs = xforms_input::xforms_core::ProcessorInputs::new(MODEL, "<request>");
    let err = process(&ProcessorConfig::default(), &inputs).unwrap_err();
    assert!(matches!(err,
                     AppError::XForms(XFormsError::MalformedInput { input: InputName::Request, .. })));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn cli_arguments_load_input_files() {
    let model = write_temp("model.xml", MODEL);
    let req = write_temp("request.xml", &request("<parameter><name>$node^2</name><value>30</value></parameter>"));
    let cmd = parse_args(["--model".to_string(),
                          model.display().to_string(),
                          "--request".to_string(),
                          req.display().to_string(),
                          "--no-validate".to_string()]).unwrap();
    let Command::Run(run) = cmd else { panic!("esperaba Run") };
    let inputs = run.load_inputs().unwrap();
    assert_eq!(inputs.model, MODEL);
    assert!(inputs.filter.is_none());

    let engine = build_engine(&ProcessorConfig::default().with_validate(!run.no_validate));
    let out = engine.run(&Default::default(), &inputs).unwrap();
    assert_eq!(out.to_xml_string().unwrap(), "<form><name/><age>30</age></form>");

    let _ = fs::remove_file(model);
    let _ = fs::remove_file(req);
}

#[test]
fn missing_input_file_is_an_io_error() {
    let cmd = parse_args(["--model", "/nonexistent/xforms-model.xml", "--request", "/nonexistent/r.xml"]).unwrap();
    let Command::Run(run) = cmd else { panic!("esperaba Run") };
    let err = run.load_inputs().unwrap_err();
    assert!(matches!(err, AppError::Io(_)));
    assert_eq!(err.exit_code(), 4);
}
