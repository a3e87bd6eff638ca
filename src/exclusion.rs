//! Attribute / association-type exclusion on flat records and on media values.
//!
//! Codes are literal text. A key is excluded by code `c` when it is exactly `c`,
//! or starts with `c` immediately followed by the suffix separator `-`
//! (localized, scoped and currency variants). `description_short` survives the
//! exclusion of `description`.

use crate::catalog::ProductValue;
use crate::flatten::{ExportRecord, SUFFIX_SEPARATOR};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    codes: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { codes: codes.into_iter().map(Into::into).filter(|c: &String| !c.is_empty()).collect() }
    }

    /// Attribute codes and association type codes share one key space.
    pub fn union(attributes: &BTreeSet<String>, association_types: &BTreeSet<String>) -> Self {
        Self::new(attributes.iter().chain(association_types.iter()).cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    pub fn excludes_key(&self, key: &str) -> bool {
        self.codes.iter().any(|code| key_matches_code(key, code))
    }
}

/// `key == code` or `key` starts with `code` followed by `-`.
pub fn key_matches_code(key: &str, code: &str) -> bool {
    match key.strip_prefix(code) {
        Some(rest) => rest.is_empty() || rest.starts_with(SUFFIX_SEPARATOR),
        None => false,
    }
}

/// Remove every non-structural key an excluded code matches.
///
/// The key set is snapshotted first and the removal set computed against the
/// snapshot; the result is rebuilt from the entries that survive.
pub fn exclude(record: ExportRecord, excluded: &ExclusionSet) -> ExportRecord {
    if excluded.is_empty() {
        return record;
    }
    let snapshot: Vec<&str> = record.keys().collect();
    let doomed: BTreeSet<String> = snapshot
        .iter()
        .filter(|k| !record.is_structural(k) && excluded.excludes_key(k))
        .map(|k| k.to_string())
        .collect();
    if doomed.is_empty() {
        return record;
    }
    tracing::trace!(removed = doomed.len(), "excluded record keys");
    record.without_keys(&doomed)
}

/// Drop media values whose attribute is excluded, so no file reference for them
/// is ever produced.
pub fn filter_media_values<'v, I>(values: I, excluded_attributes: &ExclusionSet) -> Vec<&'v ProductValue>
where
    I: IntoIterator<Item = &'v ProductValue>,
{
    values
        .into_iter()
        .filter(|v| !(v.data.is_media() && excluded_attributes.contains_code(&v.attribute)))
        .collect()
}
