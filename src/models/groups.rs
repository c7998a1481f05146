use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Partition of the unique keyword list into named groups.
///
/// Serializes as a plain JSON object (`{"group": ["kw", ...]}`), which is the
/// keyword-group checkpoint format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordGroups(BTreeMap<String, BTreeSet<String>>);

impl KeywordGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.0.iter().map(|(name, members)| (name.as_str(), members))
    }

    /// Total number of member keywords across all groups.
    pub fn keyword_count(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn insert(&mut self, name: impl Into<String>, members: BTreeSet<String>) {
        self.0.insert(name.into(), members);
    }

    /// Returns the first name in `names` that is not a group, if any.
    pub fn first_missing<'a>(&self, names: &'a [String]) -> Option<&'a str> {
        names
            .iter()
            .find(|name| !self.contains(name))
            .map(String::as_str)
    }

    /// Replaces the named groups with one group holding the union of their
    /// members.
    ///
    /// All names are validated before anything is touched, so on error the map
    /// is exactly as it was. Repeated names count once. `new_name` may reuse
    /// one of the merged names but not the name of a group that survives.
    pub fn merge(&mut self, names: &[String], new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::Precondition(
                "New group name must not be empty".to_string(),
            ));
        }
        if names.is_empty() {
            return Err(AppError::Precondition(
                "Select at least one group to merge".to_string(),
            ));
        }
        if let Some(missing) = self.first_missing(names) {
            return Err(AppError::UnknownGroup(missing.to_string()));
        }
        if self.0.contains_key(new_name) && !names.iter().any(|n| n == new_name) {
            return Err(AppError::NameCollision(new_name.to_string()));
        }

        let mut merged = BTreeSet::new();
        for name in names {
            if let Some(members) = self.0.remove(name) {
                merged.extend(members);
            }
        }
        tracing::info!(
            "Merged {} groups into '{}' ({} keywords)",
            names.len(),
            new_name,
            merged.len()
        );
        self.0.insert(new_name.to_string(), merged);
        Ok(())
    }
}

impl From<BTreeMap<String, BTreeSet<String>>> for KeywordGroups {
    fn from(map: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, BTreeSet<String>)> for KeywordGroups {
    fn from_iter<T: IntoIterator<Item = (String, BTreeSet<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Non-mutating form of [`KeywordGroups::merge`].
pub fn merge_groups(groups: &KeywordGroups, names: &[String], new_name: &str) -> Result<KeywordGroups> {
    let mut merged = groups.clone();
    merged.merge(names, new_name)?;
    Ok(merged)
}
