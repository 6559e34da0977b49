use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::model::{NodeId, Tree};

pub fn fuzzy_score(needle: &str, hay: &str) -> Option<i64> {
    let m = SkimMatcherV2::default();
    m.fuzzy_match(hay, needle)
}

/// Leaves whose label or class name matches `needle`, best first.
pub fn filter_leaves(tree: &Tree, needle: &str) -> Vec<(NodeId, i64)> {
    let m = SkimMatcherV2::default();
    let mut hits: Vec<(NodeId, i64)> = tree
        .leaves()
        .filter_map(|(id, d)| {
            let label = tree.get(id).map(|n| n.label.as_str()).unwrap_or("");
            let score = m
                .fuzzy_match(label, needle)
                .max(m.fuzzy_match(d.class_name(), needle))?;
            Some((id, score))
        })
        .collect();
    hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    hits
}
