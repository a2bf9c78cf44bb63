//! Fuzzy similarity scoring for the fallback tier.
//!
//! Thresholds in configs are calibrated against [`TokenSetRatio`]; swapping the
//! scorer means re-tuning `fuzzy_min_score`.

use std::collections::BTreeSet;

/// Similarity between two display strings, 0 (unrelated) to 100 (same).
pub trait Scorer {
    fn name(&self) -> &'static str;
    fn score(&self, a: &str, b: &str) -> u8;
}

/// Token-set ratio: compares the shared whitespace tokens and the sorted
/// leftovers of each side, keeping the best of the three alignments.
/// Case-sensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetRatio;

impl Scorer for TokenSetRatio {
    fn name(&self) -> &'static str {
        "token_set_ratio"
    }

    fn score(&self, a: &str, b: &str) -> u8 {
        token_set_ratio(a, b).round().clamp(0.0, 100.0) as u8
    }
}

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let sect: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    // One side is contained in the other.
    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let diff_ab_joined = diff_ab.join(" ");
    let diff_ba_joined = diff_ba.join(" ");
    let ab_len = diff_ab_joined.chars().count();
    let ba_len = diff_ba_joined.chars().count();
    let sect_len = sect.join(" ").chars().count();
    let sep = usize::from(sect_len != 0);

    let sect_ab_len = sect_len + sep + ab_len;
    let sect_ba_len = sect_len + sep + ba_len;

    // sect+ab vs sect+ba only differ in their tails.
    let dist = indel_distance(&diff_ab_joined, &diff_ba_joined);
    let result = normalized_similarity(dist, sect_ab_len + sect_ba_len);
    if sect_len == 0 {
        return result;
    }

    // sect vs sect+ab (and sect+ba): the distance is the appended tail.
    let sect_ab_ratio = normalized_similarity(sep + ab_len, sect_len + sect_ab_len);
    let sect_ba_ratio = normalized_similarity(sep + ba_len, sect_len + sect_ba_len);

    result.max(sect_ab_ratio).max(sect_ba_ratio)
}

fn normalized_similarity(distance: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        return 100.0;
    }
    100.0 * (1.0 - distance as f64 / total_len as f64)
}

/// Insertions + deletions turning `a` into `b`, over characters.
pub fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() + b.len() - 2 * lcs_len(&a, &b)
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Highest-scoring choice; the earliest one wins ties. `None` only for an
/// empty choice list.
pub fn best_match<S: Scorer + ?Sized>(scorer: &S, query: &str, choices: &[String]) -> Option<(usize, u8)> {
    let mut best: Option<(usize, u8)> = None;
    for (i, choice) in choices.iter().enumerate() {
        let score = scorer.score(query, choice);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((i, score));
            if score == 100 {
                break;
            }
        }
    }
    best
}
