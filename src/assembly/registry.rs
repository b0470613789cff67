/// Branch registry and the flow-wide state shared by every assembly of a flow
use crate::config::BuilderConfig;
use crate::error::{AssemblyError, AssemblyResult};
use crate::plan::flow_plan::BranchOutput;
use crate::plan::graph::StageGraph;
use fxhash::FxHashMap;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Name -> final scope and tail stage
#[derive(Clone, Debug, Default)]
pub struct BranchRegistry {
    entries: FxHashMap<String, BranchOutput>,
}

impl BranchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a branch. A second registration under the same name overwrites
    /// the first unless `strict` is set.
    pub fn register(&mut self, name: &str, entry: BranchOutput, strict: bool) -> AssemblyResult<Option<BranchOutput>> {
        if strict && self.entries.contains_key(name) {
            return Err(AssemblyError::DuplicateBranch { name: name.to_string() });
        }
        let previous = self.entries.insert(name.to_string(), entry);
        if previous.is_some() {
            tracing::warn!("Branch '{}' registered twice; later registration wins", name);
        }
        Ok(previous)
    }

    pub fn get(&self, name: &str) -> AssemblyResult<&BranchOutput> {
        self.entries
            .get(name)
            .ok_or_else(|| AssemblyError::unknown_branch(name, self.names()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn to_sorted(&self) -> BTreeMap<String, BranchOutput> {
        self.entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// State shared by reference across one flow's assembly tree
#[derive(Clone, Debug, Default)]
pub(crate) struct FlowState {
    pub graph: StageGraph,
    pub sources: BranchRegistry,
    pub branches: BranchRegistry,
    pub config: BuilderConfig,
}

/// Graph length and branch registry before a build started
#[derive(Debug)]
pub(crate) struct Checkpoint {
    graph_len: usize,
    branches: BranchRegistry,
}

impl FlowState {
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            graph_len: self.graph.len(),
            branches: self.branches.clone(),
        }
    }

    /// Forget every stage and branch registered since `checkpoint`
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.graph.truncate(checkpoint.graph_len);
        self.branches = checkpoint.branches;
    }
}

pub(crate) type SharedFlow = Rc<RefCell<FlowState>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::stage::StageId;
    use crate::schema::{field_names, Scope};

    fn entry(fields: &[&str], tail: usize) -> BranchOutput {
        BranchOutput {
            scope: Scope::new("b", field_names(fields.iter().copied())).unwrap(),
            tail: StageId(tail),
        }
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let mut registry = BranchRegistry::new();
        assert!(registry.register("b", entry(&["a"], 0), false).unwrap().is_none());
        let previous = registry.register("b", entry(&["x"], 3), false).unwrap();
        assert_eq!(previous.unwrap().tail, StageId(0));
        assert_eq!(registry.get("b").unwrap().scope.fields(), &field_names(["x"])[..]);
    }

    #[test]
    fn test_strict_rejects_duplicate() {
        let mut registry = BranchRegistry::new();
        registry.register("b", entry(&["a"], 0), true).unwrap();
        let err = registry.register("b", entry(&["a"], 1), true).unwrap_err();
        assert_eq!(err, AssemblyError::DuplicateBranch { name: "b".to_string() });
    }

    #[test]
    fn test_unknown_lists_known_names() {
        let mut registry = BranchRegistry::new();
        registry.register("zeta", entry(&["a"], 0), false).unwrap();
        registry.register("alpha", entry(&["a"], 1), false).unwrap();
        match registry.get("missing").unwrap_err() {
            AssemblyError::UnknownBranch { name, known, .. } => {
                assert_eq!(name, "missing");
                assert_eq!(known, field_names(["alpha", "zeta"]));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
