mod catalog;
mod import;
mod normalize;

pub use catalog::unique_keywords;
pub use import::{import_folder, merge_and_deduplicate, ImportOptions, ImportReport};
