/// Scope - the schema flowing out of a stage at one point of construction
use crate::error::{AssemblyError, AssemblyResult};
use crate::schema::fields::{find_duplicates, missing_from};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouping context carried by the output of a group-by, co-group or aggregation stage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    /// Fields rows are grouped by
    pub key: Vec<String>,

    /// Primary-key concept carried into the group; decides first-fields reduction
    pub primary_key: Option<Vec<String>>,

    /// Fields of the grouped tuples, usable as aggregation arguments
    pub values: Vec<String>,

    /// Key followed by every aggregate result emitted so far
    pub fields: Vec<String>,

    /// Fields consumed or produced by aggregations in this context
    pub aggregated: Vec<String>,
}

impl Grouping {
    pub fn new(key: Vec<String>, primary_key: Option<Vec<String>>, values: Vec<String>) -> Self {
        Self {
            fields: key.clone(),
            key,
            primary_key,
            values,
            aggregated: Vec::new(),
        }
    }
}

/// Output schema of a stage: ordered unique field names plus key metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,
    fields: Vec<String>,
    primary_key: Option<Vec<String>>,
    grouping: Option<Grouping>,
}

impl Scope {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            primary_key: None,
            grouping: None,
        }
    }

    /// Build a scope, rejecting duplicate names
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> AssemblyResult<Self> {
        let name = name.into();
        let dups = find_duplicates(&fields);
        if !dups.is_empty() {
            return Err(AssemblyError::precondition(name, "duplicate field names", dups));
        }
        Ok(Self {
            name,
            fields,
            primary_key: None,
            grouping: None,
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn primary_key(&self) -> Option<&[String]> {
        self.primary_key.as_deref()
    }

    pub fn grouping(&self) -> Option<&Grouping> {
        self.grouping.as_ref()
    }

    pub fn grouping_key(&self) -> Option<&[String]> {
        self.grouping.as_ref().map(|g| g.key.as_slice())
    }

    pub fn grouping_primary_key(&self) -> Option<&[String]> {
        self.grouping.as_ref().and_then(|g| g.primary_key.as_deref())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Copy with the name rebound; used when a branch forks from its parent
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Declare or clear the primary key. Every key field must be present.
    pub fn with_primary_key(mut self, key: Option<Vec<String>>) -> AssemblyResult<Self> {
        if let Some(key) = &key {
            let missing = missing_from(key, &self.fields);
            if !missing.is_empty() {
                return Err(AssemblyError::invalid_fields(
                    self.name.clone(),
                    "primary",
                    missing,
                    self.fields.clone(),
                ));
            }
        }
        self.primary_key = key;
        Ok(self)
    }

    pub fn with_grouping(mut self, grouping: Option<Grouping>) -> Self {
        self.grouping = grouping;
        self
    }

    pub(crate) fn grouping_mut(&mut self) -> Option<&mut Grouping> {
        self.grouping.as_mut()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope: {}, fields: {:?}", self.name, self.fields)?;
        if let Some(key) = &self.primary_key {
            write!(f, ", primary key: {:?}", key)?;
        }
        if let Some(grouping) = &self.grouping {
            write!(
                f,
                ", grouping key: {:?}, grouping primary key: {:?}, grouping fields: {:?}",
                grouping.key, grouping.primary_key, grouping.fields
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fields::field_names;

    #[test]
    fn test_duplicate_fields_rejected() {
        let err = Scope::new("s", field_names(["a", "b", "a"])).unwrap_err();
        assert_eq!(err.offending_names(), vec!["a".to_string()]);
    }

    #[test]
    fn test_primary_key_must_be_subset() {
        let scope = Scope::new("s", field_names(["id", "name"])).unwrap();
        let scope = scope.with_primary_key(Some(field_names(["id"]))).unwrap();
        assert_eq!(scope.primary_key(), Some(&["id".to_string()][..]));
        assert!(scope.with_primary_key(Some(field_names(["zzz"]))).is_err());
    }

    #[test]
    fn test_renamed_keeps_schema() {
        let scope = Scope::new("parent", field_names(["id"])).unwrap();
        let child = scope.renamed("child");
        assert_eq!(child.name, "child");
        assert_eq!(child.fields(), scope.fields());
    }

    #[test]
    fn test_display_mentions_grouping() {
        let scope = Scope::new("g", field_names(["id", "v"]))
            .unwrap()
            .with_grouping(Some(Grouping::new(field_names(["id"]), None, field_names(["id", "v"]))));
        assert!(scope.to_string().contains("grouping key: [\"id\"]"));
    }
}
