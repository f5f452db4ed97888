use serde::Serialize;

use super::text::sequence_ratio;
use crate::config::MatchConfig;
use crate::model::{FormatProfile, StructureDescriptor};
use crate::normalize::HeaderNormalizer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderPairing {
    pub observed: String,
    pub stored: String,
    pub ratio: f64,
    pub exact: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeaderMatch {
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub slots: usize,
    pub pairings: Vec<HeaderPairing>,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileSimilarity {
    pub header: f64,
    pub structure: f64,
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub total: f64,
}

/// Two-signal similarity between a newly observed table and a stored profile.
#[derive(Debug, Clone)]
pub struct ProfileScorer {
    normalizer: HeaderNormalizer,
    config: MatchConfig,
}

impl ProfileScorer {
    pub fn new(normalizer: HeaderNormalizer, config: MatchConfig) -> Self {
        Self { normalizer, config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn score(
        &self,
        headers: &[String],
        structure: &StructureDescriptor,
        profile: &FormatProfile,
    ) -> ProfileSimilarity {
        let header_match = self.match_headers(headers, &profile.headers, self.config.fuzzy_ratio_floor);
        let structure_score = structure_similarity(structure, &profile.structure);

        let weight_sum = self.config.header_weight + self.config.structure_weight;
        let total = if weight_sum > 0.0 {
            (header_match.score * self.config.header_weight
                + structure_score * self.config.structure_weight)
                / weight_sum
        } else {
            0.0
        };

        ProfileSimilarity {
            header: header_match.score,
            structure: structure_score,
            exact_matches: header_match.exact_matches,
            fuzzy_matches: header_match.fuzzy_matches,
            total,
        }
    }

    pub fn header_similarity(&self, observed: &[String], stored: &[String]) -> f64 {
        self.match_headers(observed, stored, self.config.fuzzy_ratio_floor)
            .score
    }

    pub fn strict_header_similarity(&self, observed: &[String], stored: &[String]) -> f64 {
        self.match_headers(observed, stored, self.config.strict_fuzzy_ratio_floor)
            .score
    }

    /// Pairs headers exactly first, then fuzzily above `fuzzy_floor`; every
    /// stored header is consumed at most once.
    pub fn match_headers(&self, observed: &[String], stored: &[String], fuzzy_floor: f64) -> HeaderMatch {
        let slots = observed.len().max(stored.len());
        if slots == 0 {
            return HeaderMatch::default();
        }

        let observed_norm = self.normalizer.normalize_all(observed);
        let stored_norm = self.normalizer.normalize_all(stored);
        let mut consumed = vec![false; stored_norm.len()];
        let mut matched = vec![false; observed_norm.len()];
        let mut pairings = Vec::<HeaderPairing>::new();

        for (index, header) in observed_norm.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let candidate = stored_norm
                .iter()
                .enumerate()
                .find(|(position, value)| !consumed[*position] && *value == header)
                .map(|(position, _)| position);
            if let Some(position) = candidate {
                consumed[position] = true;
                matched[index] = true;
                pairings.push(HeaderPairing {
                    observed: observed[index].clone(),
                    stored: stored[position].clone(),
                    ratio: 1.0,
                    exact: true,
                });
            }
        }
        let exact_matches = pairings.len();

        for (index, header) in observed_norm.iter().enumerate() {
            if matched[index] || header.is_empty() {
                continue;
            }

            let mut best: Option<(usize, f64)> = None;
            for (position, value) in stored_norm.iter().enumerate() {
                if consumed[position] || value.is_empty() {
                    continue;
                }
                let ratio = sequence_ratio(header, value);
                if best.is_none_or(|(_, best_ratio)| ratio > best_ratio) {
                    best = Some((position, ratio));
                }
            }

            if let Some((position, ratio)) = best.filter(|(_, ratio)| *ratio > fuzzy_floor) {
                consumed[position] = true;
                matched[index] = true;
                pairings.push(HeaderPairing {
                    observed: observed[index].clone(),
                    stored: stored[position].clone(),
                    ratio,
                    exact: false,
                });
            }
        }
        let fuzzy_matches = pairings.len() - exact_matches;

        let coverage = (exact_matches + fuzzy_matches) as f64 / slots as f64;
        let exactness = exact_matches as f64 / slots as f64;
        let weight_total = self.config.coverage_weight + self.config.exactness_weight;
        let score = if weight_total > 0.0 {
            (self.config.coverage_weight * coverage + self.config.exactness_weight * exactness)
                / weight_total
        } else {
            0.0
        };

        HeaderMatch {
            exact_matches,
            fuzzy_matches,
            slots,
            pairings,
            score,
        }
    }
}

/// Field-by-field comparison against a stored descriptor; zero counts are
/// treated as unknown and left out of the average.
pub fn structure_similarity(observed: &StructureDescriptor, stored: &StructureDescriptor) -> f64 {
    let mut scores = Vec::<f64>::with_capacity(3);

    if observed.column_count > 0 && stored.column_count > 0 {
        scores.push(banded_similarity(
            observed.column_count,
            stored.column_count,
            (2, 1.0),
            (4, 0.7),
        ));
    }

    if observed.typical_row_count > 0 && stored.typical_row_count > 0 {
        scores.push(banded_similarity(
            observed.typical_row_count,
            stored.typical_row_count,
            (5, 1.0),
            (10, 0.8),
        ));
    }

    scores.push(if observed.has_header_row == stored.has_header_row {
        1.0
    } else {
        0.5
    });

    scores.iter().sum::<f64>() / scores.len() as f64
}

fn banded_similarity(left: usize, right: usize, near: (usize, f64), far: (usize, f64)) -> f64 {
    let gap = left.abs_diff(right);
    if gap <= near.0 {
        return near.1;
    }
    if gap <= far.0 {
        return far.1;
    }
    left.min(right) as f64 / left.max(right) as f64
}
