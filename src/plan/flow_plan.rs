/// Finished pipeline description handed to the execution side
use crate::error::AssemblyResult;
use crate::plan::graph::StageGraph;
use crate::plan::stage::StageId;
use crate::schema::Scope;
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Final scope and tail stage of a named branch or source
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BranchOutput {
    pub scope: Scope,
    pub tail: StageId,
}

#[derive(Clone, Debug, Serialize)]
pub struct FlowPlan {
    pub name: String,
    pub graph: StageGraph,
    pub sources: BTreeMap<String, BranchOutput>,
    pub branches: BTreeMap<String, BranchOutput>,
}

impl FlowPlan {
    /// Final scope of a branch
    pub fn scope(&self, branch: &str) -> Option<&Scope> {
        self.branches.get(branch).map(|b| &b.scope)
    }

    pub fn tail(&self, branch: &str) -> Option<StageId> {
        self.branches.get(branch).map(|b| b.tail)
    }

    pub fn to_json(&self) -> AssemblyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write plan to {}", path.display()))
    }
}
