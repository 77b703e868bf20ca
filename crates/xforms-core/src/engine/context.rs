use uuid::Uuid;

/// Contexto de una ejecución del procesador. La id identifica la instancia
/// en el `InstanceCache`: dos ejecuciones con la misma id comparten
/// instancia reconstruida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionContext {
    pub execution_id: Uuid,
}

impl ExecutionContext {
    /// Contexto con una id nueva (v4).
    pub fn new() -> Self {
        Self { execution_id: Uuid::new_v4() }
    }

    pub fn with_id(execution_id: Uuid) -> Self {
        Self { execution_id }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
