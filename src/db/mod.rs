mod repository;
mod schema;

pub use repository::{
    GroupTrend, GroupYearTable, RebuildReport, RegroupReport, Repository, StoreCounts,
};

/// Inclusive publication-year filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Matches every year.
    pub fn unbounded() -> Self {
        Self::new(i32::MIN, i32::MAX)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::unbounded()
    }
}
