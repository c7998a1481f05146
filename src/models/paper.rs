use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One imported paper. Identity is the trimmed title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub publication_year: i32,
    /// Normalized keywords, already filtered by the import exclusion rules.
    pub keywords: BTreeSet<String>,
}

impl Paper {
    pub fn new<I, S>(title: impl Into<String>, publication_year: i32, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            publication_year,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}
