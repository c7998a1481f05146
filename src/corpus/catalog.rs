use std::collections::{HashMap, HashSet};

use crate::models::Paper;

/// Corpus-wide keyword frequencies, in the order keywords were first counted.
///
/// Each paper contributes at most one to a keyword since paper keywords are
/// already a set.
pub fn keyword_counts(papers: &[Paper]) -> Vec<(String, usize)> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for keyword in papers.iter().flat_map(|p| p.keywords.iter()) {
        match position.get(keyword.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                position.insert(keyword.as_str(), counts.len());
                counts.push((keyword.clone(), 1));
            }
        }
    }
    counts
}

/// Distinct keywords ordered by descending frequency, minus `excluded`.
///
/// The sort is stable, so equally frequent keywords keep first-counted order.
pub fn unique_keywords(papers: &[Paper], excluded: &HashSet<String>) -> Vec<String> {
    let mut counts = keyword_counts(papers);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(keyword, _)| keyword)
        .filter(|keyword| !excluded.contains(keyword))
        .collect()
}
