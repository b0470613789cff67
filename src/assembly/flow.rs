/// Flow - root of a pipeline description
use crate::assembly::builder::{Assembly, Parent};
use crate::assembly::registry::{FlowState, SharedFlow};
use crate::config::BuilderConfig;
use crate::error::AssemblyResult;
use crate::plan::flow_plan::{BranchOutput, FlowPlan};
use crate::plan::stage::StageOperator;
use crate::schema::fields::field_names;
use crate::schema::Scope;
use std::cell::RefCell;
use std::rc::Rc;

/// Pipeline under construction. Owns the stage graph and the branch registry
/// shared by all of its assemblies.
#[derive(Debug)]
pub struct Flow {
    name: String,
    shared: SharedFlow,
}

impl Flow {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, BuilderConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: BuilderConfig) -> Self {
        Self {
            name: name.into(),
            shared: Rc::new(RefCell::new(FlowState {
                config,
                ..Default::default()
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> BuilderConfig {
        self.shared.borrow().config.clone()
    }

    /// Declare an input; a root assembly of the same name starts from it
    pub fn source<I, S>(&mut self, name: &str, fields: I) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register_source(name, field_names(fields), None)
    }

    pub fn source_with_key<I, S, K, KS>(&mut self, name: &str, fields: I, key: K) -> AssemblyResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        K: IntoIterator<Item = KS>,
        KS: Into<String>,
    {
        self.register_source(name, field_names(fields), Some(field_names(key)))
    }

    fn register_source(&mut self, name: &str, fields: Vec<String>, key: Option<Vec<String>>) -> AssemblyResult<&mut Self> {
        let scope = Scope::new(name, fields.clone())?.with_primary_key(key)?;
        {
            let mut state = self.shared.borrow_mut();
            let tail = state.graph.add(name, StageOperator::Source { fields }, scope.clone())?;
            let strict = state.config.strict_branch_names;
            state.sources.register(name, BranchOutput { scope, tail }, strict)?;
        }
        tracing::debug!("Declared source '{}' in flow '{}'", name, self.name);
        Ok(self)
    }

    /// Build a root assembly; its final scope is registered under `name`
    pub fn assembly<F>(&mut self, name: &str, block: F) -> AssemblyResult<&mut Self>
    where
        F: FnOnce(&mut Assembly) -> AssemblyResult<()>,
    {
        let parent = Parent::Root {
            flow: self.name.clone(),
        };
        Assembly::build(name, parent, &self.shared, block)?;
        Ok(self)
    }

    /// Final scope of a finished branch
    pub fn scope_of(&self, name: &str) -> AssemblyResult<Scope> {
        let state = self.shared.borrow();
        let scope = state.branches.get(name).map(|b| b.scope.clone());
        scope
    }

    pub fn branch_names(&self) -> Vec<String> {
        self.shared.borrow().branches.names()
    }

    /// Hand the finished description over
    pub fn finish(self) -> FlowPlan {
        let state = match Rc::try_unwrap(self.shared) {
            Ok(cell) => cell.into_inner(),
            Err(shared) => {
                let state = shared.borrow().clone();
                state
            }
        };
        tracing::debug!(
            "Finished flow '{}': {} stages, {} branches",
            self.name,
            state.graph.len(),
            state.branches.names().len()
        );
        FlowPlan {
            name: self.name,
            sources: state.sources.to_sorted(),
            branches: state.branches.to_sorted(),
            graph: state.graph,
        }
    }
}
