use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use super::text::{char_set_jaccard, sequence_ratio, word_jaccard, word_set};
use crate::config::StitchConfig;
use crate::fingerprint::{DEFAULT_PATTERN_FAMILIES, family_patterns};
use crate::model::{ColumnType, TableFragment};
use crate::normalize::HeaderNormalizer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FragmentSimilarity {
    pub header: f64,
    pub column_count: f64,
    pub row_format: f64,
    pub data_pattern: f64,
    pub structure: f64,
    pub split_detected: bool,
    pub total: f64,
}

/// Which column-split rules fired for a pair of header rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitRules {
    /// Two shared words appear glued together on one side.
    pub shared_words: bool,
    /// Joined headers overlap closely while their word counts differ.
    pub joined_overlap: bool,
    /// Column counts differ but the header text is largely the same.
    pub content_similarity: bool,
}

impl SplitRules {
    pub fn any(&self) -> bool {
        self.shared_words || self.joined_overlap || self.content_similarity
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CellPattern {
    numeric: bool,
    currency: bool,
    date_like: bool,
    alphabetic: bool,
    average_length: f64,
}

impl CellPattern {
    fn agrees_with(&self, other: &Self, max_length_gap: f64) -> bool {
        let flags = [
            self.numeric == other.numeric,
            self.currency == other.currency,
            self.date_like == other.date_like,
            self.alphabetic == other.alphabetic,
        ];
        let agreeing = flags.iter().filter(|agree| **agree).count();
        agreeing >= 3 && (self.average_length - other.average_length).abs() <= max_length_gap
    }
}

/// Five-signal similarity between two raw fragments, used to decide whether
/// they belong to the same logical table.
#[derive(Debug, Clone)]
pub struct FragmentScorer {
    normalizer: HeaderNormalizer,
    config: StitchConfig,
    date_patterns: Vec<Regex>,
}

impl FragmentScorer {
    pub fn new(normalizer: HeaderNormalizer, config: StitchConfig) -> Self {
        Self {
            normalizer,
            config,
            date_patterns: family_patterns(DEFAULT_PATTERN_FAMILIES, ColumnType::Date),
        }
    }

    pub fn normalizer(&self) -> &HeaderNormalizer {
        &self.normalizer
    }

    pub fn score(
        &self,
        left: &TableFragment,
        right: &TableFragment,
        canonical_width: usize,
    ) -> FragmentSimilarity {
        let (header, split_detected) = self.header_similarity_detail(&left.headers, &right.headers);
        let column_count = column_count_similarity(left.column_count(), right.column_count());
        let row_format = (row_format_conformance(left, canonical_width)
            + row_format_conformance(right, canonical_width))
            / 2.0;
        let data_pattern = self.data_pattern_similarity(left, right);
        let structure = structure_similarity(left, right);

        let weights = self.config.weights;
        let weighted = header * weights.header
            + column_count * weights.column_count
            + row_format * weights.row_format
            + data_pattern * weights.data_pattern
            + structure * weights.structure;
        let total_weight = weights.total();
        let total = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        };

        FragmentSimilarity {
            header,
            column_count,
            row_format,
            data_pattern,
            structure,
            split_detected,
            total,
        }
    }

    pub fn header_similarity(&self, left: &[String], right: &[String]) -> f64 {
        self.header_similarity_detail(left, right).0
    }

    fn header_similarity_detail(&self, left: &[String], right: &[String]) -> (f64, bool) {
        let left = self.normalizer.normalize_all(left);
        let right = self.normalizer.normalize_all(right);

        if self.evaluate_split_rules(&left, &right).any() {
            let left_joined = join_non_empty(&left);
            let right_joined = join_non_empty(&right);
            let score = 0.7 * sequence_ratio(&left_joined, &right_joined)
                + 0.3 * word_jaccard(&left_joined, &right_joined);
            return (score, true);
        }

        let slots = left.len().max(right.len());
        if slots == 0 {
            return (1.0, false);
        }

        let total = (0..slots)
            .map(|index| {
                let a = left.get(index).map(String::as_str).unwrap_or("");
                let b = right.get(index).map(String::as_str).unwrap_or("");
                sequence_ratio(a, b)
            })
            .sum::<f64>();

        (total / slots as f64, false)
    }

    /// Evaluates every column-split rule on two raw header rows.
    pub fn split_rules(&self, left: &[String], right: &[String]) -> SplitRules {
        let left = self.normalizer.normalize_all(left);
        let right = self.normalizer.normalize_all(right);
        self.evaluate_split_rules(&left, &right)
    }

    /// Rules that suggest the two normalized header rows are the same columns
    /// cut at different boundaries by the extractor.
    fn evaluate_split_rules(&self, left: &[String], right: &[String]) -> SplitRules {
        let left_joined = join_non_empty(left);
        let right_joined = join_non_empty(right);
        if left_joined.is_empty() || right_joined.is_empty() {
            return SplitRules::default();
        }

        let rules = self.config.split_detection;
        let column_gap = left.len().abs_diff(right.len());

        let left_words = word_set(&left_joined);
        let right_words = word_set(&right_joined);
        let shared = left_words
            .intersection(&right_words)
            .cloned()
            .collect::<BTreeSet<String>>();

        let shared_words = shared.len() >= rules.min_shared_words
            && column_gap >= 1
            && shared.iter().any(|first| {
                shared.iter().any(|second| {
                    if first == second {
                        return false;
                    }
                    let concatenated = format!("{first}{second}");
                    left_joined.contains(&concatenated) || right_joined.contains(&concatenated)
                })
            });

        let left_word_count = left_joined.split_whitespace().count();
        let right_word_count = right_joined.split_whitespace().count();
        let joined_overlap = sequence_ratio(&left_joined, &right_joined)
            >= rules.joined_overlap_floor
            && left_word_count.abs_diff(right_word_count) >= rules.min_word_count_gap;

        let content_similarity = column_gap >= 1
            && 0.7 * word_jaccard(&left_joined, &right_joined)
                + 0.3 * char_set_jaccard(&left_joined, &right_joined)
                >= rules.content_similarity_floor;

        SplitRules {
            shared_words,
            joined_overlap,
            content_similarity,
        }
    }

    /// True when the cell, or one of its whitespace-separated tokens, matches
    /// a date pattern.
    pub fn looks_like_date(&self, cell: &str) -> bool {
        let cell = cell.trim();
        if cell.is_empty() {
            return false;
        }
        if self.date_patterns.iter().any(|pattern| pattern.is_match(cell)) {
            return true;
        }
        cell.split_whitespace()
            .map(|token| token.trim_matches(|ch: char| !ch.is_alphanumeric()))
            .filter(|token| !token.is_empty())
            .any(|token| self.date_patterns.iter().any(|pattern| pattern.is_match(token)))
    }

    fn data_pattern_similarity(&self, left: &TableFragment, right: &TableFragment) -> f64 {
        let sample_rows = self.config.pattern_sample_rows.max(1);
        let columns = left.column_count().min(right.column_count());

        let mut compared = 0usize;
        let mut agreeing = 0usize;
        for column in 0..columns {
            let (Some(a), Some(b)) = (
                self.cell_pattern(left, column, sample_rows),
                self.cell_pattern(right, column, sample_rows),
            ) else {
                continue;
            };

            compared += 1;
            if a.agrees_with(&b, self.config.max_length_gap) {
                agreeing += 1;
            }
        }

        if compared == 0 {
            return 0.0;
        }
        agreeing as f64 / compared as f64
    }

    fn cell_pattern(
        &self,
        fragment: &TableFragment,
        column: usize,
        sample_rows: usize,
    ) -> Option<CellPattern> {
        let cells = fragment
            .rows
            .iter()
            .take(sample_rows)
            .filter_map(|row| row.get(column))
            .map(|cell| cell.trim())
            .collect::<Vec<&str>>();
        if cells.is_empty() {
            return None;
        }

        let total_length = cells.iter().map(|cell| cell.chars().count()).sum::<usize>();
        Some(CellPattern {
            numeric: cells
                .iter()
                .any(|cell| cell.chars().any(|ch| ch.is_ascii_digit())),
            currency: cells
                .iter()
                .any(|cell| cell.chars().any(|ch| matches!(ch, '$' | '€' | '£' | '¥'))),
            date_like: cells.iter().any(|cell| self.looks_like_date(cell)),
            alphabetic: cells
                .iter()
                .any(|cell| cell.chars().any(char::is_alphabetic)),
            average_length: total_length as f64 / cells.len() as f64,
        })
    }
}

fn join_non_empty(headers: &[String]) -> String {
    headers
        .iter()
        .filter(|header| !header.is_empty())
        .map(String::as_str)
        .collect::<Vec<&str>>()
        .join(" ")
}

pub fn column_count_similarity(left: usize, right: usize) -> f64 {
    let widest = left.max(right);
    if widest == 0 {
        return 1.0;
    }
    1.0 - left.abs_diff(right) as f64 / widest as f64
}

pub fn row_format_conformance(fragment: &TableFragment, canonical_width: usize) -> f64 {
    if fragment.rows.is_empty() {
        return 1.0;
    }

    let conforming = fragment
        .rows
        .iter()
        .filter(|row| row.len().abs_diff(canonical_width) <= 1)
        .count();
    conforming as f64 / fragment.rows.len() as f64
}

pub fn structure_similarity(left: &TableFragment, right: &TableFragment) -> f64 {
    let mut checks = 2usize;
    let mut points = 0usize;

    if left.has_headers() == right.has_headers() {
        points += 1;
    }

    let left_rows = left.rows.len();
    let right_rows = right.rows.len();
    if (left_rows > 0) == (right_rows > 0) {
        points += 1;
    }

    if left_rows > 0 && right_rows > 0 {
        checks += 1;
        let ratio_gap = left_rows.abs_diff(right_rows) as f64 / left_rows.max(right_rows) as f64;
        if ratio_gap <= 0.5 {
            points += 1;
        }
    }

    points as f64 / checks as f64
}
