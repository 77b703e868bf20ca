use xforms_core::{ExecutionContext, InstanceEngine, ProcessorInputs, XFormsError};

const MODEL: &str = "<model><instance><form><x/></form></instance></model>";

fn inputs(id: u32, value: &str) -> ProcessorInputs {
    let req = format!("<request><parameters><parameter><name>$node^{id}</name><value>{value}</value></parameter></parameters></request>");
    ProcessorInputs::new(MODEL, req)
}

#[test]
fn batch_runs_are_isolated_and_ordered() {
    let engine = InstanceEngine::new().build();
    let executions: Vec<(ExecutionContext, ProcessorInputs)> =
        (0..16).map(|i| {
                   let id = if i % 5 == 4 { 9 } else { 1 };
                   (ExecutionContext::new(), inputs(id, &format!("v{i}")))
               })
               .collect();

    let results = engine.run_batch(&executions);
    assert_eq!(results.len(), 16);
    for (i, r) in results.iter().enumerate() {
        if i % 5 == 4 {
            assert_eq!(r.as_ref().unwrap_err(), &XFormsError::IdResolution(9));
        } else {
            let xml = r.as_ref().unwrap().to_xml_string().unwrap();
            assert_eq!(xml, format!("<form><x>v{i}</x></form>"));
        }
    }
    assert_eq!(engine.model_cache().len(), 1, "all executions share one parsed model");
    assert_eq!(engine.instance_cache().len(), 13);
}
