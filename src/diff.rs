// src/diff.rs
use std::collections::HashSet;

/// Titles present in `extracted` but absent from `known`, in extraction order.
///
/// Membership is exact-string. Repeats inside `extracted` are each tested
/// against `known` only, so a genuinely new title that the extractor reports
/// twice stays twice; deduplicating occurrences is the extractor's call, not
/// ours.
pub fn diff_new(known: &[String], extracted: &[String]) -> Vec<String> {
    let seen: HashSet<&str> = known.iter().map(String::as_str).collect();
    extracted
        .iter()
        .filter(|title| !seen.contains(title.as_str()))
        .cloned()
        .collect()
}
