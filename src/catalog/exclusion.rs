//! Exclusion index: which identifiers the vendor accepts, and what each one excludes.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::error::{CatalogError, CatalogResult};

/// Mapping from field identifier to the identifiers it cannot be combined with in one query.
///
/// Keys are what the vendor currently accepts. Placeholder-form keys (`ga:goalXXCompletions`)
/// appear only for templates whose numbered members are configured per profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExclusionIndex {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl ExclusionIndex {
    /// Build an index from `(identifier, exclusions)` pairs. Later duplicates replace earlier ones.
    pub fn build<I, K, E, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(id, excl)| (id.into(), excl.into_iter().map(Into::into).collect()))
            .collect();
        Self { entries }
    }

    /// Build an index from a JSON object of `identifier -> [identifier, ...]`.
    ///
    /// Anything else (a non-object root, a non-array value, a non-string member) is rejected.
    pub fn from_json_value(value: &Value) -> CatalogResult<Self> {
        let obj = value.as_object().ok_or_else(|| CatalogError::InvalidInput {
            message: "exclusion index must be a json object of identifier -> [identifiers]".to_string(),
        })?;

        let mut entries = BTreeMap::new();
        for (id, excl) in obj {
            let items = excl.as_array().ok_or_else(|| CatalogError::InvalidInput {
                message: format!("exclusions for '{id}' must be an array"),
            })?;
            let mut set = BTreeSet::new();
            for item in items {
                let s = item.as_str().ok_or_else(|| CatalogError::InvalidInput {
                    message: format!("exclusions for '{id}' must contain only strings, got {item}"),
                })?;
                set.insert(s.to_string());
            }
            entries.insert(id.clone(), set);
        }

        Ok(Self { entries })
    }

    /// Whether `identifier` is currently queryable.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Exclusion set for `identifier`, if it is a key.
    pub fn get(&self, identifier: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(identifier)
    }

    /// Iterate keys in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `a` and `b` may not be requested together (checked in both directions).
    pub fn excludes(&self, a: &str, b: &str) -> bool {
        mutually_excluded(|id| self.get(id), a, b)
    }
}

/// Whether either of `a` and `b` lists the other in the exclusion set `exclusions_of` returns.
pub(crate) fn mutually_excluded<'s>(
    exclusions_of: impl Fn(&str) -> Option<&'s BTreeSet<String>>,
    a: &str,
    b: &str,
) -> bool {
    exclusions_of(a).is_some_and(|s| s.contains(b)) || exclusions_of(b).is_some_and(|s| s.contains(a))
}
