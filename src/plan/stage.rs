/// Stage records - one node per dataflow stage
use crate::plan::joiner::Joiner;
use crate::plan::operation::Operation;
use crate::schema::{Fields, Scope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a stage inside a `StageGraph`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageId(pub usize);

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stage kind tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Source,
    Head,
    RowTransform,
    Aggregation,
    GroupBy,
    CoGroup,
}

/// Which fields a row-transform emits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSelector {
    /// Only the operation results
    Results,
    /// Incoming fields plus results
    All,
    /// Results replace their arguments in place
    Replace,
}

/// Stage parameters
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageOperator {
    /// Declared pipeline input
    Source { fields: Vec<String> },

    /// Named pipe opened by an assembly; continues its parent's tail or a source
    Head { upstream: Option<StageId> },

    /// Row-wise transform
    Each {
        upstream: StageId,
        arguments: Fields,
        operation: Operation,
        output: OutputSelector,
    },

    /// Aggregation over the current group
    Every {
        upstream: StageId,
        arguments: Fields,
        operation: Operation,
        declared: Vec<String>,
    },

    /// Group (or merge then group) one or more inputs
    GroupBy {
        upstreams: Vec<StageId>,
        group_fields: Vec<String>,
        sort_fields: Vec<String>,
        reverse: bool,
    },

    /// Join several inputs on per-side keys
    CoGroup {
        upstreams: Vec<StageId>,
        group_fields: Vec<Vec<String>>,
        declared_fields: Vec<String>,
        joiner: Joiner,
    },
}

impl StageOperator {
    pub fn kind(&self) -> StageKind {
        match self {
            StageOperator::Source { .. } => StageKind::Source,
            StageOperator::Head { .. } => StageKind::Head,
            StageOperator::Each { .. } => StageKind::RowTransform,
            StageOperator::Every { .. } => StageKind::Aggregation,
            StageOperator::GroupBy { .. } => StageKind::GroupBy,
            StageOperator::CoGroup { .. } => StageKind::CoGroup,
        }
    }

    /// Upstream stages in input order
    pub fn upstreams(&self) -> Vec<StageId> {
        match self {
            StageOperator::Source { .. } => Vec::new(),
            StageOperator::Head { upstream } => upstream.iter().copied().collect(),
            StageOperator::Each { upstream, .. } | StageOperator::Every { upstream, .. } => vec![*upstream],
            StageOperator::GroupBy { upstreams, .. } | StageOperator::CoGroup { upstreams, .. } => {
                upstreams.clone()
            }
        }
    }
}

/// A stage with the scope it produces
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stage {
    pub id: StageId,
    /// Owning assembly (or source) name
    pub name: String,
    pub operator: StageOperator,
    pub scope: Scope,
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        self.operator.kind()
    }

    pub fn upstreams(&self) -> Vec<StageId> {
        self.operator.upstreams()
    }
}
