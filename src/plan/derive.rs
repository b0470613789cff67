/// Scope derivation
///
/// Rules computing the outgoing scope of a stage from its incoming scopes.
use crate::error::{AssemblyError, AssemblyResult};
use crate::schema::fields::{intersection, is_subset, missing_from, union_dedup};
use crate::schema::{Grouping, Scope};

/// Derivation rule with the parameters it needs
#[derive(Clone, Copy, Debug)]
pub enum Derivation<'a> {
    /// Row-wise transform: declared output replaces the fields when given
    RowTransform { declared: Option<&'a [String]> },
    /// Aggregation: grouping fields followed by the declared results
    Aggregation {
        arguments: &'a [String],
        declared: &'a [String],
    },
    /// Group-level assertion: validates, emits nothing
    GroupAssertion,
    /// Group-by over inputs sharing one field list
    GroupBy { key: &'a [String] },
    /// Join: `key` is the grouping key of the result, `declared` its fields
    CoGroup {
        key: &'a [String],
        declared: &'a [String],
    },
}

/// Check declared argument fields against the fields an upstream offers
pub fn check_arguments(scope_name: &str, arguments: &[String], available: &[String]) -> AssemblyResult<()> {
    let missing = missing_from(arguments, available);
    if !missing.is_empty() {
        return Err(AssemblyError::precondition(
            scope_name,
            "argument fields not produced by upstream",
            missing,
        ));
    }
    Ok(())
}

/// Derive the outgoing scope named `name` from `incoming`
pub fn derive_scope(name: &str, incoming: &[&Scope], rule: Derivation<'_>) -> AssemblyResult<Scope> {
    let Some(first) = incoming.first() else {
        return Err(AssemblyError::precondition(name, "stage has no incoming scope", Vec::new()));
    };

    match rule {
        Derivation::RowTransform { declared } => {
            let fields = declared.map(<[String]>::to_vec).unwrap_or_else(|| first.fields().to_vec());
            let scope = Scope::new(name, fields)?;
            // Key survives only while all of its fields do
            let key = first
                .primary_key()
                .filter(|key| is_subset(key, scope.fields()))
                .map(<[String]>::to_vec);
            scope.with_primary_key(key)
        }

        Derivation::Aggregation { arguments, declared } => {
            let Some(grouping) = first.grouping() else {
                return Err(AssemblyError::precondition(
                    name,
                    "aggregation requires a preceding group or join",
                    arguments.to_vec(),
                ));
            };
            check_arguments(name, arguments, &grouping.values)?;
            let mut fields = grouping.fields.clone();
            fields.extend(declared.iter().cloned());
            let scope = Scope::new(name, fields.clone())?;

            let mut next = grouping.clone();
            next.fields = fields;
            next.aggregated = union_dedup(&union_dedup(&next.aggregated, arguments), declared);
            Ok(scope.with_grouping(Some(next)))
        }

        Derivation::GroupAssertion => {
            if first.grouping().is_none() {
                return Err(AssemblyError::precondition(
                    name,
                    "group assertion requires a preceding group or join",
                    Vec::new(),
                ));
            }
            Ok(first.renamed(name))
        }

        Derivation::GroupBy { key } => {
            if key.is_empty() {
                return Err(AssemblyError::precondition(name, "group-by needs at least one field", Vec::new()));
            }
            for other in &incoming[1..] {
                if other.fields() != first.fields() {
                    return Err(AssemblyError::precondition(
                        name,
                        "merged inputs must share the same fields",
                        other.fields().to_vec(),
                    ));
                }
            }
            check_arguments(name, key, first.fields())?;
            let grouping_primary_key = first.primary_key().map(|pk| intersection(pk, key));
            let grouping = Grouping::new(key.to_vec(), grouping_primary_key, first.fields().to_vec());
            let scope = Scope::new(name, first.fields().to_vec())?
                .with_primary_key(first.primary_key().map(<[String]>::to_vec))?;
            Ok(scope.with_grouping(Some(grouping)))
        }

        Derivation::CoGroup { key, declared } => {
            let grouping = Grouping::new(key.to_vec(), Some(key.to_vec()), declared.to_vec());
            Ok(Scope::new(name, declared.to_vec())?.with_grouping(Some(grouping)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::field_names;

    fn keyed(fields: &[&str], key: &[&str]) -> Scope {
        Scope::new("in", field_names(fields.iter().copied()))
            .unwrap()
            .with_primary_key(Some(field_names(key.iter().copied())))
            .unwrap()
    }

    #[test]
    fn test_row_transform_clears_grouping() {
        let grouped = derive_scope(
            "g",
            &[&keyed(&["id", "v"], &["id"])],
            Derivation::GroupBy { key: &field_names(["id"]) },
        )
        .unwrap();
        let each = derive_scope("e", &[&grouped], Derivation::RowTransform { declared: None }).unwrap();
        assert!(each.grouping().is_none());
        assert_eq!(each.primary_key(), Some(&field_names(["id"])[..]));
    }

    #[test]
    fn test_row_transform_drops_key_with_missing_field() {
        let declared = field_names(["v"]);
        let each = derive_scope(
            "e",
            &[&keyed(&["id", "v"], &["id"])],
            Derivation::RowTransform { declared: Some(&declared) },
        )
        .unwrap();
        assert_eq!(each.fields(), &declared[..]);
        assert!(each.primary_key().is_none());
    }

    #[test]
    fn test_aggregation_without_grouping_fails() {
        let args = field_names(["v"]);
        let err = derive_scope(
            "a",
            &[&keyed(&["id", "v"], &["id"])],
            Derivation::Aggregation { arguments: &args, declared: &args },
        )
        .unwrap_err();
        assert!(matches!(err, AssemblyError::SchemaPrecondition { .. }));
    }

    #[test]
    fn test_aggregation_emits_key_then_results() {
        let grouped = derive_scope(
            "g",
            &[&keyed(&["id", "amount", "label"], &["id"])],
            Derivation::GroupBy { key: &field_names(["id"]) },
        )
        .unwrap();
        assert_eq!(grouped.grouping_primary_key(), Some(&field_names(["id"])[..]));

        let args = field_names(["amount"]);
        let declared = field_names(["total"]);
        let agg = derive_scope(
            "g",
            &[&grouped],
            Derivation::Aggregation { arguments: &args, declared: &declared },
        )
        .unwrap();
        assert_eq!(agg.fields(), &field_names(["id", "total"])[..]);
        assert_eq!(agg.grouping_key(), Some(&field_names(["id"])[..]));
        assert_eq!(agg.grouping().unwrap().aggregated, field_names(["amount", "total"]));
        assert!(agg.primary_key().is_none());
    }

    #[test]
    fn test_group_by_missing_key_field() {
        let err = derive_scope(
            "g",
            &[&keyed(&["id"], &["id"])],
            Derivation::GroupBy { key: &field_names(["zzz"]) },
        )
        .unwrap_err();
        assert_eq!(err.offending_names(), field_names(["zzz"]));
    }
}
