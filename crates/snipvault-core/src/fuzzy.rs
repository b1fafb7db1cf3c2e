//! Query/candidate similarity scoring.
//!
//! Three tiers, checked in order: exact match, literal substring, then a
//! matched-blocks ratio. The tier order is a ranking contract. A
//! near-identical ratio hit can still score above the 0.8 substring floor;
//! that discontinuity is part of the contract, so keep the tiers separate
//! instead of folding them into one formula.

use std::borrow::Cow;

const SUBSTRING_FLOOR: f64 = 0.8;
const SUBSTRING_COVERAGE_SPAN: f64 = 0.2;

/// Similarity between `query` and `candidate` in `[0, 1]`.
///
/// An empty query matches everything (1.0). An empty candidate matches
/// nothing (0.0). A substring hit scores
/// `0.8 + 0.2 * len(query) / len(candidate)`, rewarding coverage; anything
/// else falls through to [`matched_blocks_ratio`].
#[must_use]
pub fn similarity(query: &str, candidate: &str, case_sensitive: bool) -> f64 {
    if query.is_empty() {
        return 1.0;
    }
    if candidate.is_empty() {
        return 0.0;
    }

    let query = fold_case(query, case_sensitive);
    let candidate = fold_case(candidate, case_sensitive);

    if query == candidate {
        return 1.0;
    }

    if candidate.contains(query.as_ref()) {
        let coverage = char_len(&query) / char_len(&candidate);
        return SUBSTRING_COVERAGE_SPAN.mul_add(coverage, SUBSTRING_FLOOR);
    }

    matched_blocks_ratio(&query, &candidate)
}

/// `2M / T` where `M` is the total length of common blocks found by
/// recursively taking the longest common substring of the still-unmatched
/// regions, and `T` is the combined length of both strings.
#[must_use]
pub fn matched_blocks_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matched_block_len(&a, &b);
    2.0 * usize_to_f64(matched) / usize_to_f64(total)
}

/// Non-overlapping byte spans of every literal occurrence of `query` in
/// `candidate`, for UI emphasis. Strictly literal: a positive fuzzy score
/// with no substring occurrence yields no spans. The scan resumes past each
/// hit, so overlapping occurrences collapse onto the earliest set.
#[must_use]
pub fn highlight_spans(query: &str, candidate: &str, case_sensitive: bool) -> Vec<(usize, usize)> {
    if query.is_empty() || candidate.is_empty() {
        return Vec::new();
    }

    let needle: Vec<char> = query.chars().collect();
    let haystack: Vec<(usize, char)> = candidate.char_indices().collect();
    if needle.len() > haystack.len() {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut i = 0usize;
    while i + needle.len() <= haystack.len() {
        let window = &haystack[i..i + needle.len()];
        let hit = window
            .iter()
            .zip(&needle)
            .all(|((_, have), want)| chars_equal(*have, *want, case_sensitive));
        if hit {
            let start = window[0].0;
            let (last_offset, last_char) = window[needle.len() - 1];
            spans.push((start, last_offset + last_char.len_utf8()));
            i += needle.len();
        } else {
            i += 1;
        }
    }
    spans
}

fn fold_case(text: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_lowercase())
    }
}

fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(&b)
    }
}

fn char_len(text: &str) -> f64 {
    usize_to_f64(text.chars().count())
}

fn matched_block_len(a: &[char], b: &[char]) -> usize {
    let (a_start, b_start, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matched_block_len(&a[..a_start], &b[..b_start])
        + matched_block_len(&a[a_start + len..], &b[b_start + len..])
}

/// Earliest longest common substring of `a` and `b` as
/// `(start_in_a, start_in_b, len)`. Dynamic program over one row; strict
/// `>` keeps the earliest hit on ties.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0usize, 0usize, 0usize);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let len = prev[j] + 1;
                row[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        prev = row;
    }
    best
}

#[allow(clippy::cast_precision_loss)]
fn usize_to_f64(value: usize) -> f64 {
    value as f64
}
