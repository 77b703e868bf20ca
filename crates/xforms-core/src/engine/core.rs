//! Núcleo de `InstanceEngine`: reconstrucción de instancias.

use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;

use crate::engine::cache::{InMemoryInstanceCache, InstanceCache, ModelCache};
use crate::engine::context::ExecutionContext;
use crate::engine::output::{ProcessorInputs, ProcessorOutput, Reconstruction};
use crate::engine::stage::{Stage, StageRecord};
use crate::engine::EngineBuilder;
use crate::errors::XFormsError;
use crate::injection::{ActionSequence, BindSet, CompositeInjector};
use crate::instance::Instance;
use crate::model::Model;
use crate::params::{parse_filter, parse_matcher_result, PathParameters};
use crate::request::RequestParameters;
use crate::validation::{DecoratingValidator, InstanceValidator};

/// Motor de reconstrucción de instancias.
///
/// Para cada ejecución: reutiliza la instancia cacheada si existe; si no,
/// selecciona la instancia inicial, la decora y aplica en orden ids,
/// parámetros de ruta, acciones y binds. La instancia terminada se guarda en
/// el cache bajo la id de ejecución. Un fallo en cualquier etapa aborta la
/// ejecución sin cachear nada.
#[derive(Debug)]
pub struct InstanceEngine<C, V>
    where C: InstanceCache,
          V: InstanceValidator
{
    pub(crate) instance_cache: C,
    pub(crate) validator: V,
    pub(crate) models: ModelCache,
    pub(crate) validate: bool,
}

impl InstanceEngine<InMemoryInstanceCache, DecoratingValidator> {
    /// Builder con cache en memoria y `DecoratingValidator`.
    #[inline]
    pub fn new() -> EngineBuilder<InMemoryInstanceCache, DecoratingValidator> {
        EngineBuilder::new(InMemoryInstanceCache::new(), DecoratingValidator)
    }
}

impl<C, V> InstanceEngine<C, V>
    where C: InstanceCache,
          V: InstanceValidator
{
    #[inline]
    pub fn builder(instance_cache: C, validator: V) -> EngineBuilder<C, V> {
        EngineBuilder::new(instance_cache, validator)
    }

    pub fn instance_cache(&self) -> &C {
        &self.instance_cache
    }

    pub fn model_cache(&self) -> &ModelCache {
        &self.models
    }

    pub fn validate_enabled(&self) -> bool {
        self.validate
    }

    /// Modelo parseado (compartido vía cache de modelos).
    pub fn model(&self, text: &str) -> Result<Arc<Model>, XFormsError> {
        self.models.get_or_parse(text)
    }

    /// Reconstruye (o recupera del cache) la instancia de la ejecución.
    pub fn reconstruct(&self, ctx: &ExecutionContext, inputs: &ProcessorInputs) -> Result<Reconstruction, XFormsError> {
        let execution_id = ctx.execution_id;
        if let Some(instance) = self.instance_cache.get(execution_id) {
            info!("execution {execution_id}: reusing cached instance");
            return Ok(Reconstruction { instance,
                                       stages: Vec::new(),
                                       from_cache: true });
        }

        let model = self.model(&inputs.model)?;
        let request = RequestParameters::parse(&inputs.request)?;
        let path_params = PathParameters::new(match &inputs.filter {
                                                  Some(f) => parse_filter(f)?,
                                                  None => Vec::new(),
                                              },
                                              match &inputs.matcher_result {
                                                  Some(m) => parse_matcher_result(m)?,
                                                  None => Vec::new(),
                                              })?;

        let (instance, stages) = self.assemble(&model, &request, &path_params)?;
        let reconstruction = Reconstruction { instance,
                                              stages,
                                              from_cache: false };
        info!("execution {execution_id}: reconstructed instance ({} id(s), {} path param(s), {} action(s), {} bind(s)) fingerprint={}",
              request.ids().count(),
              path_params.len(),
              request.actions().len(),
              model.binds().len(),
              reconstruction.fingerprint());
        self.instance_cache.put(execution_id, reconstruction.instance.clone());
        Ok(reconstruction)
    }

    fn assemble(&self,
                model: &Model,
                request: &RequestParameters,
                path_params: &PathParameters)
                -> Result<(Instance, Vec<StageRecord>), XFormsError> {
        let mut instance = match request.instance() {
            Some(submitted) => Instance::new(submitted.clone()),
            None => model.initial_instance(),
        };
        instance.set_initial_decoration();

        let mut stages = vec![StageRecord::new(Stage::Selected, instance.fingerprint()?)];

        let actions = ActionSequence(request.actions());
        let binds = BindSet(model.binds());
        let mut composite = CompositeInjector::new();
        composite.push(request);
        composite.push(path_params);
        composite.push(&actions);
        composite.push(&binds);
        composite.apply(&mut instance, |stage, current| {
                     debug!("{stage}: {}", current.to_xml_string()?);
                     stages.push(StageRecord::new(stage, current.fingerprint()?));
                     Ok(())
                 })?;
        Ok((instance, stages))
    }

    /// Reconstrucción + entrega a validación.
    pub fn run(&self, ctx: &ExecutionContext, inputs: &ProcessorInputs) -> Result<ProcessorOutput, XFormsError> {
        let reconstruction = self.reconstruct(ctx, inputs)?;
        let model = self.model(&inputs.model)?;
        self.emit(ctx, &model, reconstruction.instance)
    }

    /// Entrega una instancia ya reconstruida a validación. Se valida sólo si
    /// la validación está activa y el modelo declara un schema; si no, se
    /// emite la instancia tal cual.
    pub fn emit(&self, ctx: &ExecutionContext, model: &Model, instance: Instance) -> Result<ProcessorOutput, XFormsError> {
        match model.schema() {
            Some(schema) if self.validate => {
                let validated = self.validator.validate(&instance, schema)?;
                if !validated.valid {
                    info!("execution {}: instance is not valid ({} issue(s))",
                          ctx.execution_id,
                          validated.issues.len());
                }
                Ok(ProcessorOutput::Validated(validated))
            }
            _ => Ok(ProcessorOutput::Instance(instance)),
        }
    }

    /// Ejecuta ejecuciones independientes en paralelo. Cada una trabaja sobre
    /// su propia instancia; el resultado conserva el orden de entrada.
    pub fn run_batch(&self, executions: &[(ExecutionContext, ProcessorInputs)]) -> Vec<Result<ProcessorOutput, XFormsError>> {
        executions.par_iter().map(|(ctx, inputs)| self.run(ctx, inputs)).collect()
    }

    /// Descarta la instancia cacheada de la ejecución. Devuelve `true` si
    /// había una.
    pub fn invalidate(&self, ctx: &ExecutionContext) -> bool {
        self.instance_cache.remove(ctx.execution_id).is_some()
    }
}
