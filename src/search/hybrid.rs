//! Hybrid fusion of vector and keyword retrieval
//!
//! The two producers run independently against the store; this module only
//! merges their outputs, so the ranking policy is testable without a store.

use std::collections::HashSet;

use crate::types::RetrievalHit;

fn by_distance_then_id(a: &RetrievalHit, b: &RetrievalHit) -> std::cmp::Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// Merge vector-ranked hits with keyword-matched hits.
///
/// Ranking:
/// 1. records in both sets, by vector distance ascending
/// 2. keyword-only records, by their own distance; equal distances keep
///    the keyword producer's order
///
/// Vector hits that did not match the keyword are dropped. The result is
/// deduplicated by `doc_id` and holds at most `top_k` records.
pub fn fuse_hybrid(
    vector: Vec<RetrievalHit>,
    keyword: Vec<RetrievalHit>,
    top_k: usize,
) -> Vec<RetrievalHit> {
    let keyword_ids: HashSet<String> = keyword.iter().map(|h| h.doc_id.clone()).collect();
    let mut seen: HashSet<String> = HashSet::new();

    let mut fused: Vec<RetrievalHit> = vector
        .into_iter()
        .filter(|h| keyword_ids.contains(&h.doc_id))
        .filter(|h| seen.insert(h.doc_id.clone()))
        .collect();
    fused.sort_by(by_distance_then_id);

    let mut keyword_only: Vec<RetrievalHit> = keyword
        .into_iter()
        .filter(|h| seen.insert(h.doc_id.clone()))
        .collect();
    // Stable: ties stay in producer order
    keyword_only.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    fused.extend(keyword_only);
    fused.truncate(top_k);
    fused
}
