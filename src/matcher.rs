use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::MatchConfig;
use crate::model::{ColumnPattern, FormatProfile, StructureDescriptor};
use crate::normalize::HeaderNormalizer;
use crate::similarity::{ProfileScorer, ProfileSimilarity};

/// Best stored profile for an observed table, borrowed from the candidate list.
#[derive(Debug, Clone, Serialize)]
pub struct FormatMatch<'a> {
    pub position: usize,
    pub profile: &'a FormatProfile,
    pub similarity: ProfileSimilarity,
}

impl<'a> FormatMatch<'a> {
    pub fn score(&self) -> f64 {
        self.similarity.total
    }

    pub fn field_mapping(&self) -> &'a BTreeMap<String, String> {
        &self.profile.field_mapping
    }

    pub fn column_patterns(&self) -> &'a [ColumnPattern] {
        &self.profile.column_patterns
    }

    pub fn corrections(&self) -> &'a serde_json::Value {
        &self.profile.corrections
    }
}

#[derive(Debug, Clone)]
pub struct FormatMatcher {
    scorer: ProfileScorer,
}

impl Default for FormatMatcher {
    fn default() -> Self {
        Self::new(HeaderNormalizer::default(), MatchConfig::default())
    }
}

impl FormatMatcher {
    pub fn new(normalizer: HeaderNormalizer, config: MatchConfig) -> Self {
        Self {
            scorer: ProfileScorer::new(normalizer, config),
        }
    }

    pub fn scorer(&self) -> &ProfileScorer {
        &self.scorer
    }

    /// Highest-scoring profile above the acceptance threshold. Equal scores
    /// keep the profile seen first, so the result follows `profiles` order.
    pub fn find_best_match<'a>(
        &self,
        headers: &[String],
        structure: &StructureDescriptor,
        profiles: &'a [FormatProfile],
    ) -> Option<FormatMatch<'a>> {
        let mut best: Option<FormatMatch<'a>> = None;

        for (position, profile) in profiles.iter().enumerate() {
            let similarity = self.scorer.score(headers, structure, profile);
            debug!(
                signature = %profile.signature,
                header = similarity.header,
                structure = similarity.structure,
                total = similarity.total,
                "scored stored profile"
            );

            if best
                .as_ref()
                .is_none_or(|current| similarity.total > current.similarity.total)
            {
                best = Some(FormatMatch {
                    position,
                    profile,
                    similarity,
                });
            }
        }

        let threshold = self.scorer.config().accept_threshold;
        best.filter(|candidate| candidate.similarity.total > threshold)
    }
}
