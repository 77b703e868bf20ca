//! Implementaciones de `InstanceInjector` para cada fuente de cambios.

use log::debug;

use super::InstanceInjector;
use crate::action::{Action, ActionFunctionContext};
use crate::engine::Stage;
use crate::errors::XFormsError;
use crate::instance::Instance;
use crate::model::{apply_binds, Bind};
use crate::params::PathParameters;
use crate::request::RequestParameters;

/// Asignaciones `$node^<id>` en orden ascendente de id; falla en la primera
/// id sin nodo.
impl InstanceInjector for RequestParameters {
    fn stage(&self) -> Stage {
        Stage::IdsApplied
    }

    fn inject(&self, instance: &mut Instance) -> Result<(), XFormsError> {
        for (id, field) in self.ids() {
            instance.set_value_for_id(id, &field.value, field.type_name.as_deref())?;
        }
        Ok(())
    }
}

/// Valores capturados no vacíos sobre su referencia.
impl InstanceInjector for PathParameters {
    fn stage(&self) -> Stage {
        Stage::PathParamsApplied
    }

    fn inject(&self, instance: &mut Instance) -> Result<(), XFormsError> {
        for (param, value) in self.iter() {
            if value.is_empty() {
                continue;
            }
            instance.set_value_for_param(&param.reference, &param.namespaces, value)?;
        }
        Ok(())
    }
}

/// Acciones del request, cada una con un contexto de funciones nuevo.
#[derive(Debug)]
pub struct ActionSequence<'a>(pub &'a [Action]);

impl InstanceInjector for ActionSequence<'_> {
    fn stage(&self) -> Stage {
        Stage::ActionsApplied
    }

    fn inject(&self, instance: &mut Instance) -> Result<(), XFormsError> {
        for (i, action) in self.0.iter().enumerate() {
            debug!("running action #{i} ({})", action.name());
            action.run(&ActionFunctionContext::new(), instance.document_mut())?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct BindSet<'a>(pub &'a [Bind]);

impl InstanceInjector for BindSet<'_> {
    fn stage(&self) -> Stage {
        Stage::BindsApplied
    }

    fn inject(&self, instance: &mut Instance) -> Result<(), XFormsError> {
        apply_binds(self.0, instance)
    }
}
