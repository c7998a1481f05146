//! Semantic grouping of the unique keyword list.

mod embedder;
mod ward;

use std::collections::{BTreeSet, HashMap};

pub use embedder::Embedder;
#[cfg(feature = "fastembed")]
pub use embedder::FastEmbedder;
use ward::ward_linkage;

use crate::error::{AppError, Result};
use crate::models::KeywordGroups;

/// Where to cut the dendrogram. Exactly one criterion applies per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusterMode {
    FixedCount(usize),
    DistanceThreshold(f64),
}

impl ClusterMode {
    /// A requested count of zero means "cut by distance instead".
    pub fn from_request(clusters: usize, distance_threshold: f64) -> Self {
        if clusters == 0 {
            Self::DistanceThreshold(distance_threshold)
        } else {
            Self::FixedCount(clusters)
        }
    }

    fn validate(self) -> Result<Self> {
        match self {
            Self::DistanceThreshold(d) if !d.is_finite() || d <= 0.0 => Err(AppError::Config(
                format!("Distance threshold must be a positive number, got {}", d),
            )),
            mode => Ok(mode),
        }
    }
}

impl std::fmt::Display for ClusterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedCount(n) => write!(f, "{} clusters", n),
            Self::DistanceThreshold(d) => write!(f, "distance threshold {}", d),
        }
    }
}

/// Builds groups from per-keyword cluster labels.
///
/// Each group is named after its first member in `keywords` order.
pub fn group_by_labels(keywords: &[String], labels: &[usize]) -> KeywordGroups {
    let mut named: Vec<(String, BTreeSet<String>)> = Vec::new();
    let mut slot_of_label = HashMap::new();

    for (keyword, label) in keywords.iter().zip(labels) {
        let slot = *slot_of_label.entry(*label).or_insert_with(|| {
            named.push((keyword.clone(), BTreeSet::new()));
            named.len() - 1
        });
        named[slot].1.insert(keyword.clone());
    }

    let mut groups = KeywordGroups::new();
    for (name, members) in named {
        groups.insert(name, members);
    }
    groups
}

/// Embeds `keywords` and partitions them with Ward agglomerative clustering.
pub fn cluster(keywords: &[String], mode: ClusterMode, embedder: &mut dyn Embedder) -> Result<KeywordGroups> {
    let mode = mode.validate()?;
    if keywords.is_empty() {
        return Ok(KeywordGroups::new());
    }

    tracing::info!(
        "Embedding {} keywords with {} ({} dimensions)",
        keywords.len(),
        embedder.model_name(),
        embedder.dimension()
    );
    let embeddings = embedder.embed_batch(keywords)?;
    if embeddings.len() != keywords.len() {
        return Err(AppError::MissingCapability(format!(
            "Embedding backend returned {} vectors for {} keywords",
            embeddings.len(),
            keywords.len()
        )));
    }

    let dendrogram = ward_linkage(&embeddings)?;
    let labels = match mode {
        ClusterMode::FixedCount(n) => dendrogram.cut_to_count(n),
        ClusterMode::DistanceThreshold(d) => dendrogram.cut_at_distance(d),
    };

    let groups = group_by_labels(keywords, &labels);
    tracing::info!("Grouped {} keywords into {} groups ({})", keywords.len(), groups.len(), mode);
    Ok(groups)
}
