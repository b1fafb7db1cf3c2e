//! Relevance ranking over fuzzy per-field scores.
//!
//! Scores combine with fixed per-field weights, filter by threshold, and
//! stable-sort descending. Sort stability is a contract: candidates with
//! equal combined scores keep their input order.

use serde::Serialize;

use crate::error::{Result, SnipError};
use crate::fuzzy;
use crate::models::{SnippetRecord, TagRecord};

pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_SNIPPET_LIMIT: usize = 50;
pub const DEFAULT_TAG_LIMIT: usize = 20;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Per-field ranking weights, keyed by field name. Constructed weights must
/// be non-negative and sum to 1.0.
#[derive(Debug, Clone)]
pub struct FieldWeights {
    entries: Vec<(String, f64)>,
}

impl FieldWeights {
    pub fn new(entries: Vec<(String, f64)>) -> Result<Self> {
        if entries.is_empty() {
            return Err(SnipError::Validation("field weights are empty".to_string()));
        }
        if let Some((field, weight)) = entries.iter().find(|(_, w)| *w < 0.0 || !w.is_finite()) {
            return Err(SnipError::Validation(format!(
                "weight for field '{field}' must be a non-negative finite number, got {weight}"
            )));
        }
        let sum: f64 = entries.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SnipError::Validation(format!(
                "field weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(Self { entries })
    }

    /// Snippet defaults: name 0.4, code 0.3, description 0.2, language 0.1.
    #[must_use]
    pub fn snippet_defaults() -> Self {
        Self {
            entries: vec![
                ("name".to_string(), 0.4),
                ("code".to_string(), 0.3),
                ("description".to_string(), 0.2),
                ("language".to_string(), 0.1),
            ],
        }
    }

    /// Tag defaults: name 0.7, description 0.3.
    #[must_use]
    pub fn tag_defaults() -> Self {
        Self {
            entries: vec![
                ("name".to_string(), 0.7),
                ("description".to_string(), 0.3),
            ],
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(field, weight)| (field.as_str(), *weight))
    }
}

/// Threshold and truncation settings for one ranking pass.
#[derive(Debug, Clone, Copy)]
pub struct RankOptions {
    pub threshold: f64,
    pub limit: usize,
}

impl RankOptions {
    #[must_use]
    pub fn snippets() -> Self {
        Self {
            threshold: DEFAULT_SCORE_THRESHOLD,
            limit: DEFAULT_SNIPPET_LIMIT,
        }
    }

    #[must_use]
    pub fn tags() -> Self {
        Self {
            threshold: DEFAULT_SCORE_THRESHOLD,
            limit: DEFAULT_TAG_LIMIT,
        }
    }
}

/// A candidate paired with its combined score.
#[derive(Debug, Clone, Serialize)]
pub struct Ranked<T> {
    pub item: T,
    pub score: f64,
}

/// Weighted combined score of one snippet against `query`. A missing field
/// scores as an empty candidate.
#[must_use]
pub fn snippet_score(query: &str, snippet: &SnippetRecord, weights: &FieldWeights) -> f64 {
    combined_score(query, weights, |field| snippet_field(snippet, field))
}

/// Weighted combined score of one tag against `query`.
#[must_use]
pub fn tag_score(query: &str, tag: &TagRecord, weights: &FieldWeights) -> f64 {
    combined_score(query, weights, |field| tag_field(tag, field))
}

pub fn rank_snippets(
    query: &str,
    snippets: Vec<SnippetRecord>,
    weights: &FieldWeights,
    options: RankOptions,
) -> Vec<Ranked<SnippetRecord>> {
    rank(query, snippets, options, |query, snippet| {
        snippet_score(query, snippet, weights)
    })
}

pub fn rank_tags(
    query: &str,
    tags: Vec<TagRecord>,
    weights: &FieldWeights,
    options: RankOptions,
) -> Vec<Ranked<TagRecord>> {
    rank(query, tags, options, |query, tag| tag_score(query, tag, weights))
}

fn rank<T>(
    query: &str,
    candidates: Vec<T>,
    options: RankOptions,
    score: impl Fn(&str, &T) -> f64,
) -> Vec<Ranked<T>> {
    // Explicit identity case: an empty query returns every candidate at
    // 1.0 in input order, untruncated.
    if query.is_empty() {
        return candidates
            .into_iter()
            .map(|item| Ranked { item, score: 1.0 })
            .collect();
    }

    let mut ranked: Vec<Ranked<T>> = candidates
        .into_iter()
        .filter_map(|item| {
            let score = score(query, &item);
            (score >= options.threshold).then_some(Ranked { item, score })
        })
        .collect();

    // Vec::sort_by is stable; equal scores keep input order.
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(options.limit);
    ranked
}

fn combined_score<'a>(
    query: &str,
    weights: &FieldWeights,
    field_value: impl Fn(&str) -> Option<&'a str>,
) -> f64 {
    weights
        .entries()
        .map(|(field, weight)| {
            let value = field_value(field).unwrap_or("");
            weight * fuzzy::similarity(query, value, false)
        })
        .sum()
}

fn snippet_field<'a>(snippet: &'a SnippetRecord, field: &str) -> Option<&'a str> {
    match field {
        "name" => Some(snippet.name.as_str()),
        "code" => Some(snippet.code.as_str()),
        "description" => snippet.description.as_deref(),
        "language" => snippet.language.as_deref(),
        _ => None,
    }
}

fn tag_field<'a>(tag: &'a TagRecord, field: &str) -> Option<&'a str> {
    match field {
        "name" => Some(tag.name.as_str()),
        "description" => tag.description.as_deref(),
        _ => None,
    }
}
