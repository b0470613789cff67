/// Field algebra
/// Ordered operations over field-name lists used wherever schemas are combined or restricted
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Field selector: an explicit ordered list of names or the "all fields" wildcard
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fields {
    All,
    Names(Vec<String>),
}

impl Fields {
    pub fn all() -> Self {
        Fields::All
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Fields::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Fields::All)
    }

    /// Explicit names, `None` for the wildcard
    pub fn as_names(&self) -> Option<&[String]> {
        match self {
            Fields::All => None,
            Fields::Names(names) => Some(names),
        }
    }

    /// Expand the selector against the fields actually available
    pub fn resolve(&self, available: &[String]) -> Vec<String> {
        match self {
            Fields::All => available.to_vec(),
            Fields::Names(names) => names.clone(),
        }
    }
}

impl Default for Fields {
    fn default() -> Self {
        Fields::All
    }
}

impl From<Vec<String>> for Fields {
    fn from(names: Vec<String>) -> Self {
        Fields::Names(names)
    }
}

impl From<&[&str]> for Fields {
    fn from(names: &[&str]) -> Self {
        Fields::names(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Fields {
    fn from(names: [&str; N]) -> Self {
        Fields::names(names)
    }
}

impl From<&str> for Fields {
    fn from(name: &str) -> Self {
        Fields::Names(vec![name.to_string()])
    }
}

/// Owned name list from anything string-like
pub fn field_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

/// Ordered union: all of `left`, then the members of `right` not seen yet
pub fn union_dedup(left: &[String], right: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(left.len() + right.len());
    let mut out = Vec::with_capacity(left.len() + right.len());
    for name in left.iter().chain(right.iter()) {
        if seen.insert(name.as_str()) {
            out.push(name.clone());
        }
    }
    out
}

/// Members of `left` not in `right`, order of `left` kept
pub fn difference(left: &[String], right: &[String]) -> Vec<String> {
    let remove: HashSet<&str> = right.iter().map(String::as_str).collect();
    left.iter().filter(|f| !remove.contains(f.as_str())).cloned().collect()
}

/// Members of `left` also in `right`, order of `left` kept
pub fn intersection(left: &[String], right: &[String]) -> Vec<String> {
    let keep: HashSet<&str> = right.iter().map(String::as_str).collect();
    left.iter().filter(|f| keep.contains(f.as_str())).cloned().collect()
}

pub fn is_subset(subset: &[String], superset: &[String]) -> bool {
    missing_from(subset, superset).is_empty()
}

/// Names in `wanted` that `available` lacks
pub fn missing_from(wanted: &[String], available: &[String]) -> Vec<String> {
    difference(wanted, available)
}

/// Names appearing more than once, reported once each in first-seen order
pub fn find_duplicates(fields: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups: Vec<String> = Vec::new();
    for name in fields {
        if !seen.insert(name.as_str()) && !dups.contains(name) {
            dups.push(name.clone());
        }
    }
    dups
}

fn unique_name(taken: &HashSet<String>, candidate: &str, suffix: &str) -> String {
    let mut name = candidate.to_string();
    while taken.contains(&name) {
        name.push_str(suffix);
    }
    name
}

/// Concatenate several field lists, renaming collisions by appending `suffix`
/// until unique. The first occurrence of a name is kept verbatim.
pub fn dedup_field_names(groups: &[Vec<String>], suffix: &str) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for group in groups {
        for name in group {
            let name = unique_name(&taken, name, suffix);
            taken.insert(name.clone());
            out.push(name);
        }
    }
    out
}

/// Declared output fields of a join.
///
/// `sides` pairs each input's fields with its join key. A key field of a later
/// side whose name matches the first side's key at the same position collapses
/// into the first side's field; every other collision is renamed with `suffix`.
pub fn dedup_join_fields(sides: &[(Vec<String>, Vec<String>)], suffix: &str) -> Vec<String> {
    let Some((_, left_key)) = sides.first() else {
        return Vec::new();
    };
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for (index, (fields, key)) in sides.iter().enumerate() {
        for name in fields {
            if index > 0 {
                let shared_key = key
                    .iter()
                    .position(|k| k == name)
                    .map(|pos| left_key.get(pos) == Some(name))
                    .unwrap_or(false);
                if shared_key && taken.contains(name) {
                    continue;
                }
            }
            let name = unique_name(&taken, name, suffix);
            taken.insert(name.clone());
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(names: &[&str]) -> Vec<String> {
        field_names(names.iter().copied())
    }

    #[test]
    fn test_union_keeps_first_seen_order() {
        assert_eq!(union_dedup(&v(&["a", "b"]), &v(&["b", "c", "a"])), v(&["a", "b", "c"]));
    }

    #[test]
    fn test_difference_and_intersection() {
        let all = v(&["id", "name", "amount"]);
        assert_eq!(difference(&all, &v(&["name"])), v(&["id", "amount"]));
        assert_eq!(intersection(&all, &v(&["amount", "id", "zzz"])), v(&["id", "amount"]));
        assert!(is_subset(&v(&["amount"]), &all));
        assert_eq!(missing_from(&v(&["zzz", "id"]), &all), v(&["zzz"]));
    }

    #[test]
    fn test_wildcard_resolves_to_available() {
        let available = v(&["x", "y"]);
        assert_eq!(Fields::All.resolve(&available), available);
        assert_eq!(Fields::from("y").resolve(&available), v(&["y"]));
    }

    #[test]
    fn test_find_duplicates() {
        assert_eq!(find_duplicates(&v(&["a", "b", "a", "a"])), v(&["a"]));
        assert!(find_duplicates(&v(&["a", "b"])).is_empty());
    }

    #[test]
    fn test_dedup_suffix_applied_until_unique() {
        let groups = vec![v(&["id", "id_"]), v(&["id"]), v(&["id"])];
        assert_eq!(dedup_field_names(&groups, "_"), v(&["id", "id_", "id__", "id___"]));
    }

    #[test]
    fn test_dedup_join_collapses_shared_key() {
        let sides = vec![
            (v(&["id", "name"]), v(&["id"])),
            (v(&["id", "amount", "name"]), v(&["id"])),
        ];
        assert_eq!(dedup_join_fields(&sides, "_"), v(&["id", "name", "amount", "name_"]));
    }

    #[test]
    fn test_dedup_join_keeps_differently_named_keys() {
        let sides = vec![
            (v(&["id", "name"]), v(&["id"])),
            (v(&["customer_id", "id"]), v(&["customer_id"])),
        ];
        assert_eq!(dedup_join_fields(&sides, "_"), v(&["id", "name", "customer_id", "id_"]));
    }
}
