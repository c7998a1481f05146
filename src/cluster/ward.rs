//! Agglomerative clustering with Ward linkage on Euclidean distance.
//!
//! The dendrogram comes from `kodama`, whose merge heights use the same scale
//! as SciPy and scikit-learn: two singletons merge at their Euclidean
//! distance.

use kodama::{linkage, Method, Step};
use ndarray::{Array2, ArrayView1};

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct Dendrogram {
    points: usize,
    /// Ascending by dissimilarity. Step `i` creates cluster `points + i`.
    steps: Vec<Step<f64>>,
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    (&a - &b).mapv(|d| d * d).sum().sqrt()
}

/// Builds the complete Ward dendrogram over `points`.
///
/// All vectors must have the same dimension.
pub fn ward_linkage(points: &[Vec<f32>]) -> Result<Dendrogram> {
    let n = points.len();
    let dimension = points.first().map_or(0, Vec::len);
    if points.iter().any(|p| p.len() != dimension) {
        return Err(AppError::MissingCapability(
            "Embedding backend returned vectors of different dimensions".to_string(),
        ));
    }
    if n < 2 {
        return Ok(Dendrogram {
            points: n,
            steps: Vec::new(),
        });
    }

    let flat: Vec<f64> = points
        .iter()
        .flat_map(|p| p.iter().map(|v| f64::from(*v)))
        .collect();
    let matrix = Array2::from_shape_vec((n, dimension), flat)
        .map_err(|e| AppError::MissingCapability(format!("Invalid embedding matrix: {}", e)))?;

    // Condensed upper triangle, row by row.
    let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            condensed.push(euclidean(matrix.row(i), matrix.row(j)));
        }
    }

    let dendrogram = linkage(&mut condensed, n, Method::Ward);
    tracing::debug!("Ward linkage over {} points produced {} merges", n, dendrogram.len());
    Ok(Dendrogram {
        points: n,
        steps: dendrogram.steps().to_vec(),
    })
}

impl Dendrogram {
    /// Cluster labels after applying the `applied` lowest merges. Labels are
    /// numbered in order of first appearance among the input points.
    fn labels_after(&self, applied: usize) -> Vec<usize> {
        let mut members: Vec<Vec<usize>> = (0..self.points).map(|i| vec![i]).collect();
        for step in self.steps.iter().take(applied) {
            let mut merged = std::mem::take(&mut members[step.cluster1]);
            merged.append(&mut members[step.cluster2]);
            members.push(merged);
        }

        let mut clusters: Vec<&Vec<usize>> = members.iter().filter(|m| !m.is_empty()).collect();
        clusters.sort_by_key(|m| m.iter().min().copied());

        let mut labels = vec![0; self.points];
        for (label, cluster) in clusters.iter().enumerate() {
            for point in cluster.iter() {
                labels[*point] = label;
            }
        }
        labels
    }

    /// Cuts so that exactly `clusters` groups remain (or one per point when
    /// `clusters` exceeds the number of points).
    pub fn cut_to_count(&self, clusters: usize) -> Vec<usize> {
        let applied = self.points.saturating_sub(clusters.max(1));
        self.labels_after(applied)
    }

    /// Applies every merge whose height is below `threshold`.
    pub fn cut_at_distance(&self, threshold: f64) -> Vec<usize> {
        let applied = self
            .steps
            .iter()
            .take_while(|step| step.dissimilarity < threshold)
            .count();
        self.labels_after(applied)
    }
}
