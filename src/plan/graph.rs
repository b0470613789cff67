/// Stage graph - append-only arena of stages
///
/// Stages are only ever appended and reference earlier stages, so insertion
/// order is already a topological order.
use crate::error::{AssemblyError, AssemblyResult};
use crate::plan::stage::{Stage, StageId, StageOperator};
use crate::schema::Scope;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StageGraph {
    stages: Vec<Stage>,
}

impl StageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage; every upstream must already exist
    pub fn add(&mut self, name: impl Into<String>, operator: StageOperator, scope: Scope) -> AssemblyResult<StageId> {
        let id = StageId(self.stages.len());
        if let Some(bad) = operator.upstreams().into_iter().find(|up| up.0 >= id.0) {
            return Err(AssemblyError::internal(format!(
                "stage {} references unknown upstream {}",
                id, bad
            )));
        }
        self.stages.push(Stage {
            id,
            name: name.into(),
            operator,
            scope,
        });
        Ok(id)
    }

    /// Drop every stage from `len` on; used to discard a failed build
    pub fn truncate(&mut self, len: usize) {
        self.stages.truncate(len);
    }

    pub fn get(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(id.0)
    }

    pub fn scope_of(&self, id: StageId) -> Option<&Scope> {
        self.get(id).map(|s| &s.scope)
    }

    pub fn upstream_of(&self, id: StageId) -> Vec<StageId> {
        self.get(id).map(Stage::upstreams).unwrap_or_default()
    }

    /// Stages consuming `id`
    pub fn downstream_of(&self, id: StageId) -> Vec<StageId> {
        self.stages
            .iter()
            .filter(|s| s.upstreams().contains(&id))
            .map(|s| s.id)
            .collect()
    }

    /// Stages no other stage consumes
    pub fn tails(&self) -> Vec<StageId> {
        let consumed: HashSet<StageId> = self.stages.iter().flat_map(Stage::upstreams).collect();
        self.stages
            .iter()
            .map(|s| s.id)
            .filter(|id| !consumed.contains(id))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
