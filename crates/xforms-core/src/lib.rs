//! xforms-core: reconstrucción determinista de instancias XForms.
pub mod action;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod hashing;
pub mod injection;
pub mod instance;
pub mod model;
pub mod params;
pub mod request;
pub mod validation;
pub mod xml;
pub mod xpath;

pub use action::{Action, ActionFunctionContext};
pub use engine::{EngineBuilder, ExecutionContext, InMemoryInstanceCache, InstanceCache, InstanceEngine, ModelCache,
                 ProcessorInputs, ProcessorOutput, Reconstruction, Stage, StageRecord};
pub use errors::{InputName, XFormsError};
pub use injection::{CompositeInjector, InstanceInjector};
pub use instance::{Instance, ItemProperties};
pub use model::{Bind, Model};
pub use params::{PathParam, PathParameters};
pub use request::{FieldValue, RequestParameters};
pub use validation::{DecoratingValidator, InstanceValidator, ValidatedOutput, ValidationIssue};
pub use xml::{NamespaceContext, NodeId, XmlDocument};
pub use xpath::{FunctionContext, XPathExpr, XPathValue};
