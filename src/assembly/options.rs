/// Per-operation options with typed defaults
use crate::plan::joiner::Joiner;
use crate::plan::operation::{AssertionLevel, Capability, Operation};
use crate::schema::fields::field_names;
use crate::schema::Fields;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Options of a row-wise transform
#[derive(Clone, Debug)]
pub struct EachOptions {
    pub operation: Operation,
    /// Fields the stage emits; `None` keeps the incoming fields
    pub output: Option<Vec<String>>,
}

impl EachOptions {
    pub fn filter(capability: Arc<dyn Capability>) -> Self {
        Self {
            operation: Operation::filter(capability),
            output: None,
        }
    }

    pub fn function(capability: Arc<dyn Capability>) -> Self {
        Self {
            operation: Operation::function(capability),
            output: None,
        }
    }

    pub fn output<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output = Some(field_names(fields));
        self
    }
}

/// Options of an aggregation
#[derive(Clone, Debug)]
pub struct EveryOptions {
    pub operation: Operation,
    /// Result fields; `None` names the results after the arguments
    pub output: Option<Vec<String>>,
}

impl EveryOptions {
    pub fn aggregator(capability: Arc<dyn Capability>) -> Self {
        Self {
            operation: Operation::aggregator(capability),
            output: None,
        }
    }

    pub fn buffer(capability: Arc<dyn Capability>) -> Self {
        Self {
            operation: Operation::buffer(capability),
            output: None,
        }
    }

    pub fn output<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output = Some(field_names(fields));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupByOptions {
    /// Secondary sort; defaults to the group fields
    pub sort_by: Option<Vec<String>>,
    pub reverse: bool,
}

impl GroupByOptions {
    pub fn sort_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_by = Some(field_names(fields));
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

/// Joined branches and their keys
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinInputs {
    /// Same key fields on every branch, branches in call order
    Shared { branches: Vec<String>, key: Vec<String> },
    /// Own key per branch; branches in sorted name order
    PerBranch(BTreeMap<String, Vec<String>>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinOptions {
    pub inputs: JoinInputs,
    pub joiner: Joiner,
    /// Output fields; defaults to the deduplicated union of the inputs
    pub declared_fields: Option<Vec<String>>,
}

impl JoinOptions {
    /// Join `branches` on the same `key` fields
    pub fn on<B, BS, K, KS>(branches: B, key: K) -> Self
    where
        B: IntoIterator<Item = BS>,
        BS: AsRef<str>,
        K: IntoIterator<Item = KS>,
        KS: Into<String>,
    {
        Self {
            inputs: JoinInputs::Shared {
                branches: branches.into_iter().map(|b| b.as_ref().to_string()).collect(),
                key: field_names(key),
            },
            joiner: Joiner::default(),
            declared_fields: None,
        }
    }

    /// Join with a key per branch
    pub fn keyed<I, B, K, KS>(keys: I) -> Self
    where
        I: IntoIterator<Item = (B, K)>,
        B: AsRef<str>,
        K: IntoIterator<Item = KS>,
        KS: Into<String>,
    {
        Self {
            inputs: JoinInputs::PerBranch(
                keys.into_iter()
                    .map(|(branch, key)| (branch.as_ref().to_string(), field_names(key)))
                    .collect(),
            ),
            joiner: Joiner::default(),
            declared_fields: None,
        }
    }

    pub fn joiner(mut self, joiner: Joiner) -> Self {
        self.joiner = joiner;
        self
    }

    pub fn declared_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_fields = Some(field_names(fields));
        self
    }
}

/// Options of `copy`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CopyOptions {
    pub from: Fields,
    /// New names, positionally; defaults to the source names
    pub into: Option<Vec<String>>,
}

impl CopyOptions {
    pub fn new(from: impl Into<Fields>) -> Self {
        Self {
            from: from.into(),
            into: None,
        }
    }

    pub fn into_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.into = Some(field_names(fields));
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssertOptions {
    /// Falls back to the configured default level
    pub level: Option<AssertionLevel>,
}

impl AssertOptions {
    pub fn level(level: AssertionLevel) -> Self {
        Self { level: Some(level) }
    }
}
