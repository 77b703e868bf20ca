//! `CompositeInjector`: aplica una secuencia de `InstanceInjector` en orden
//! fijo y notifica al caller después de cada uno.

use super::InstanceInjector;
use crate::engine::Stage;
use crate::errors::XFormsError;
use crate::instance::Instance;

/// Compone inyectores prestados. El orden de aplicación es el de inserción;
/// el primer error detiene la composición.
#[derive(Debug, Default)]
pub struct CompositeInjector<'a> {
    pub injectors: Vec<&'a dyn InstanceInjector>,
}

impl<'a> CompositeInjector<'a> {
    pub fn new() -> Self {
        Self { injectors: vec![] }
    }

    pub fn with_injectors(inj: Vec<&'a dyn InstanceInjector>) -> Self {
        Self { injectors: inj }
    }

    pub fn push(&mut self, injector: &'a dyn InstanceInjector) {
        self.injectors.push(injector);
    }

    /// Aplica los inyectores sobre `instance`; `after_each` recibe la etapa
    /// recién terminada y la instancia en ese punto.
    pub fn apply<F>(&self, instance: &mut Instance, mut after_each: F) -> Result<(), XFormsError>
        where F: FnMut(Stage, &Instance) -> Result<(), XFormsError>
    {
        for injector in self.injectors.iter() {
            injector.inject(instance)?;
            after_each(injector.stage(), instance)?;
        }
        Ok(())
    }
}
