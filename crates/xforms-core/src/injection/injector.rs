//! Contrato para las etapas que mutan la instancia.
//!
//! Un `InstanceInjector` aplica una fuente de cambios (ids del request,
//! parámetros de ruta, acciones, binds) sobre la instancia. Los inyectores
//! son deterministas: mismo input, misma instancia resultante.

use std::fmt::Debug;

use crate::engine::Stage;
use crate::errors::XFormsError;
use crate::instance::Instance;

pub trait InstanceInjector: Send + Sync + Debug {
    /// Etapa de la reconstrucción que representa este inyector.
    fn stage(&self) -> Stage;

    fn inject(&self, instance: &mut Instance) -> Result<(), XFormsError>;
}
