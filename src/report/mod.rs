//! Rendering of per-group trend tables.

mod trends;

pub use trends::{trend_file_name, trends_title, CsvTrendReport};

use std::path::PathBuf;

use crate::db::GroupTrend;
use crate::error::Result;

/// Receives an already computed `[name, publication_year, unique_paper_count]`
/// table and turns it into an artifact.
pub trait TrendRenderer {
    /// Returns the path of the written artifact, if any.
    fn render(&mut self, title: &str, rows: &[GroupTrend]) -> Result<Option<PathBuf>>;
}

/// Drops rows of groups on the plot exclusion list.
pub fn without_excluded(rows: Vec<GroupTrend>, excluded: &[String]) -> Vec<GroupTrend> {
    rows.into_iter()
        .filter(|row| !excluded.contains(&row.name))
        .collect()
}
