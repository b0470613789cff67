/// Operation parameters threaded into stages
///
/// Filters, functions, aggregators, buffers and assertions are supplied by the
/// caller and never inspected; the builder only records them. Identity and
/// First are the two operations the builder emits itself.
use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Opaque row or group operation supplied by the execution side
pub trait Capability: fmt::Debug + Send + Sync {
    /// Label used in diagnostics and plan export
    fn name(&self) -> &str;
}

/// Named capability with no behavior of its own
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedCapability(pub String);

impl NamedCapability {
    pub fn new(name: impl Into<String>) -> Arc<dyn Capability> {
        Arc::new(Self(name.into()))
    }
}

impl Capability for NamedCapability {
    fn name(&self) -> &str {
        &self.0
    }
}

/// Assertion strictness
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionLevel {
    #[default]
    Strict,
    Valid,
    None,
}

fn serialize_capability<S: Serializer>(cap: &Arc<dyn Capability>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(cap.name())
}

fn serialize_types<S: Serializer>(types: &Option<Vec<DataType>>, s: S) -> Result<S::Ok, S::Error> {
    let names: Option<Vec<String>> = types
        .as_ref()
        .map(|types| types.iter().map(|t| t.to_string()).collect());
    names.serialize(s)
}

/// Operation slot of a stage
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Filter {
        #[serde(serialize_with = "serialize_capability")]
        capability: Arc<dyn Capability>,
    },
    Function {
        #[serde(serialize_with = "serialize_capability")]
        capability: Arc<dyn Capability>,
    },
    Aggregator {
        #[serde(serialize_with = "serialize_capability")]
        capability: Arc<dyn Capability>,
    },
    Buffer {
        #[serde(serialize_with = "serialize_capability")]
        capability: Arc<dyn Capability>,
    },
    Assertion {
        #[serde(serialize_with = "serialize_capability")]
        capability: Arc<dyn Capability>,
        level: AssertionLevel,
    },
    /// Pass values through, optionally under new names and types
    Identity {
        rename: Option<Vec<String>>,
        #[serde(serialize_with = "serialize_types")]
        types: Option<Vec<DataType>>,
    },
    /// Keep the first value per group, ignoring the rest
    First,
}

impl Operation {
    pub fn filter(capability: Arc<dyn Capability>) -> Self {
        Operation::Filter { capability }
    }

    pub fn function(capability: Arc<dyn Capability>) -> Self {
        Operation::Function { capability }
    }

    pub fn aggregator(capability: Arc<dyn Capability>) -> Self {
        Operation::Aggregator { capability }
    }

    pub fn buffer(capability: Arc<dyn Capability>) -> Self {
        Operation::Buffer { capability }
    }

    pub fn identity() -> Self {
        Operation::Identity {
            rename: None,
            types: None,
        }
    }

    pub fn identity_as(names: Vec<String>) -> Self {
        Operation::Identity {
            rename: Some(names),
            types: None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Operation::Filter { capability }
            | Operation::Function { capability }
            | Operation::Aggregator { capability }
            | Operation::Buffer { capability }
            | Operation::Assertion { capability, .. } => capability.name().to_string(),
            Operation::Identity { .. } => "identity".to_string(),
            Operation::First => "first".to_string(),
        }
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operation::Identity { rename: a, types: x }, Operation::Identity { rename: b, types: y }) => {
                a == b && x == y
            }
            (Operation::First, Operation::First) => true,
            (Operation::Assertion { capability: a, level: x }, Operation::Assertion { capability: b, level: y }) => {
                Arc::ptr_eq(a, b) && x == y
            }
            (Operation::Filter { capability: a }, Operation::Filter { capability: b })
            | (Operation::Function { capability: a }, Operation::Function { capability: b })
            | (Operation::Aggregator { capability: a }, Operation::Aggregator { capability: b })
            | (Operation::Buffer { capability: a }, Operation::Buffer { capability: b }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
