mod groups;
mod paper;

pub use groups::{merge_groups, KeywordGroups};
pub use paper::Paper;
