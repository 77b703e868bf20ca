use xforms_core::injection::{CompositeInjector, InstanceInjector};
use xforms_core::{Instance, Stage, XFormsError, XmlDocument};

#[derive(Debug)]
struct Append(&'static str, Stage);

impl InstanceInjector for Append {
    fn stage(&self) -> Stage {
        self.1
    }

    fn inject(&self, instance: &mut Instance) -> Result<(), XFormsError> {
        let doc = instance.document_mut();
        let root = doc.document_element().ok_or_else(|| XFormsError::Serialization("no root".into()))?;
        let current = doc.string_value(root);
        doc.set_string_value(root, &format!("{current}{}", self.0));
        Ok(())
    }
}

#[derive(Debug)]
struct Fail;

impl InstanceInjector for Fail {
    fn stage(&self) -> Stage {
        Stage::ActionsApplied
    }

    fn inject(&self, _instance: &mut Instance) -> Result<(), XFormsError> {
        Err(XFormsError::action("setvalue", "forced"))
    }
}

#[test]
fn composite_injector_applies_in_order_and_reports_each_stage() {
    let a = Append("a", Stage::IdsApplied);
    let b = Append("b", Stage::PathParamsApplied);
    let c = CompositeInjector::with_injectors(vec![&a, &b]);
    let mut instance = Instance::new(XmlDocument::with_root("r"));
    let mut seen = Vec::new();
    c.apply(&mut instance, |stage, i| {
         seen.push((stage, i.to_xml_string()?));
         Ok(())
     })
     .unwrap();
    assert_eq!(seen,
               vec![(Stage::IdsApplied, "<r>a</r>".to_string()), (Stage::PathParamsApplied, "<r>ab</r>".to_string())]);
}

#[test]
fn composite_injector_stops_at_first_error() {
    let a = Append("a", Stage::IdsApplied);
    let b = Append("b", Stage::BindsApplied);
    let c = CompositeInjector::with_injectors(vec![&a, &Fail, &b]);
    let mut instance = Instance::new(XmlDocument::with_root("r"));
    let mut stages = Vec::new();
    let err = c.apply(&mut instance, |stage, _| {
                   stages.push(stage);
                   Ok(())
               })
               .unwrap_err();
    assert!(matches!(err, XFormsError::ActionExecution { .. }));
    assert_eq!(stages, vec![Stage::IdsApplied]);
    assert_eq!(instance.to_xml_string().unwrap(), "<r>a</r>");
}
