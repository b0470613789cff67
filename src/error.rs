/// Unified error type for pipeline construction
/// Every variant carries the offending names so a failed build can be diagnosed
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    /// A join or lookup referenced a branch that was never registered
    #[error("Could not find branch '{name}' (known branches: {known:?})")]
    UnknownBranch {
        name: String,
        known: Vec<String>,
        context: Option<String>,
    },

    /// Unrecognized joiner kind, mixed-joiner entry, or mixed arity mismatch
    #[error("Invalid joiner: {message}")]
    InvalidJoiner {
        message: String,
        value: Option<String>,
        context: Option<String>,
    },

    /// A field-level operation named fields absent from the current scope
    #[error("Invalid field reference in '{scope}' ({operation}): {fields:?} not in {available:?}")]
    InvalidFieldReference {
        scope: String,
        operation: String,
        fields: Vec<String>,
        available: Vec<String>,
    },

    /// Stage parameters do not fit the upstream scope
    #[error("Schema precondition failed in '{scope}': {message} {fields:?}")]
    SchemaPrecondition {
        scope: String,
        message: String,
        fields: Vec<String>,
        context: Option<String>,
    },

    /// Branch name registered twice while strict branch names are enabled
    #[error("Branch '{name}' is already registered")]
    DuplicateBranch { name: String },

    /// `cast` named a type missing from the type table
    #[error("Unknown type '{type_name}' for field '{field}'")]
    UnknownType { field: String, type_name: String },

    /// Configuration or export failures
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        context: Option<String>,
    },
}

impl AssemblyError {
    pub fn unknown_branch(name: impl Into<String>, known: Vec<String>) -> Self {
        Self::UnknownBranch {
            name: name.into(),
            known,
            context: None,
        }
    }

    pub fn invalid_joiner(message: impl Into<String>) -> Self {
        Self::InvalidJoiner {
            message: message.into(),
            value: None,
            context: None,
        }
    }

    pub fn invalid_joiner_value(message: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidJoiner {
            message: message.into(),
            value: Some(value.into()),
            context: None,
        }
    }

    pub fn invalid_fields(
        scope: impl Into<String>,
        operation: impl Into<String>,
        fields: Vec<String>,
        available: Vec<String>,
    ) -> Self {
        Self::InvalidFieldReference {
            scope: scope.into(),
            operation: operation.into(),
            fields,
            available,
        }
    }

    pub fn precondition(scope: impl Into<String>, message: impl Into<String>, fields: Vec<String>) -> Self {
        Self::SchemaPrecondition {
            scope: scope.into(),
            message: message.into(),
            fields,
            context: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::UnknownBranch { context: ctx, .. } => *ctx = Some(context.into()),
            Self::InvalidJoiner { context: ctx, .. } => *ctx = Some(context.into()),
            Self::SchemaPrecondition { context: ctx, .. } => *ctx = Some(context.into()),
            Self::Internal { context: ctx, .. } => *ctx = Some(context.into()),
            _ => {}
        }
        self
    }

    /// Offending names carried by the error, for diagnostics
    pub fn offending_names(&self) -> Vec<String> {
        match self {
            Self::UnknownBranch { name, .. } | Self::DuplicateBranch { name } => vec![name.clone()],
            Self::InvalidJoiner { value, .. } => value.iter().cloned().collect(),
            Self::InvalidFieldReference { fields, .. } | Self::SchemaPrecondition { fields, .. } => {
                fields.clone()
            }
            Self::UnknownType { field, type_name } => vec![field.clone(), type_name.clone()],
            Self::Internal { .. } => Vec::new(),
        }
    }
}

impl From<anyhow::Error> for AssemblyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            context: None,
        }
    }
}

impl From<serde_json::Error> for AssemblyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            context: Some("serialization".to_string()),
        }
    }
}

/// Result type alias for construction operations
pub type AssemblyResult<T> = Result<T, AssemblyError>;
