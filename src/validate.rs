use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::config::{MatchConfig, SamplingConfig};
use crate::fingerprint::{ColumnFingerprinter, DEFAULT_PATTERN_FAMILIES, column_values};
use crate::model::{ColumnPattern, ColumnType, FormatProfile, StructureDescriptor};
use crate::normalize::HeaderNormalizer;
use crate::similarity::ProfileScorer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnValidation {
    pub position: usize,
    pub header: Option<String>,
    pub learned_type: ColumnType,
    pub observed_type: ColumnType,
    pub type_matches: bool,
    pub pattern_matches: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormatValidation {
    pub header_match_score: f64,
    pub type_agreement: f64,
    pub pattern_agreement: f64,
    pub overall_score: f64,
    pub columns: Vec<ColumnValidation>,
    pub warnings: Vec<String>,
}

/// Re-checks a matched profile against freshly observed data.
#[derive(Debug, Clone)]
pub struct FormatValidator {
    scorer: ProfileScorer,
    fingerprinter: ColumnFingerprinter,
    sample_limit: usize,
}

impl Default for FormatValidator {
    fn default() -> Self {
        Self::new(
            HeaderNormalizer::default(),
            MatchConfig::default(),
            SamplingConfig::default(),
        )
    }
}

impl FormatValidator {
    pub fn new(normalizer: HeaderNormalizer, config: MatchConfig, sampling: SamplingConfig) -> Self {
        Self {
            scorer: ProfileScorer::new(normalizer, config),
            fingerprinter: ColumnFingerprinter::new(
                DEFAULT_PATTERN_FAMILIES,
                sampling.inference_samples,
            ),
            sample_limit: sampling.inference_samples.max(1),
        }
    }

    pub fn validate(
        &self,
        profile: &FormatProfile,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> FormatValidation {
        let header_match_score = self
            .scorer
            .strict_header_similarity(headers, &profile.headers);

        let width = StructureDescriptor::from_table(headers, rows).column_count;
        let observed = self.fingerprinter.fingerprint_columns(width, rows);

        let mut warnings = Vec::<String>::new();
        let columns = profile
            .column_patterns
            .iter()
            .zip(observed.iter())
            .enumerate()
            .map(|(position, (learned, seen))| {
                let samples = column_values(rows, position, self.sample_limit);
                let header = headers
                    .get(position)
                    .filter(|header| !header.trim().is_empty())
                    .cloned();
                let type_matches = learned.column_type == seen.column_type;

                if !type_matches {
                    let label = header.as_deref().unwrap_or("<unnamed>");
                    warn!(
                        column = position + 1,
                        header = label,
                        learned = learned.column_type.as_str(),
                        observed = seen.column_type.as_str(),
                        "column type differs from learned format"
                    );
                    warnings.push(format!(
                        "column {} ({label}): learned type {} but observed {}",
                        position + 1,
                        learned.column_type.as_str(),
                        seen.column_type.as_str()
                    ));
                }

                ColumnValidation {
                    position,
                    header,
                    learned_type: learned.column_type,
                    observed_type: seen.column_type,
                    type_matches,
                    pattern_matches: pattern_agrees(learned, seen, &samples),
                }
            })
            .collect::<Vec<ColumnValidation>>();

        let type_agreement = fraction(columns.iter().filter(|column| column.type_matches).count(), columns.len());
        let pattern_agreement = fraction(
            columns.iter().filter(|column| column.pattern_matches).count(),
            columns.len(),
        );

        FormatValidation {
            header_match_score,
            type_agreement,
            pattern_agreement,
            overall_score: (header_match_score + type_agreement + pattern_agreement) / 3.0,
            columns,
            warnings,
        }
    }
}

/// A learned expression must compile and match at least half of the
/// observed samples; two absent expressions agree.
fn pattern_agrees(learned: &ColumnPattern, observed: &ColumnPattern, samples: &[String]) -> bool {
    let Some(expression) = learned.expression.as_deref() else {
        return observed.expression.is_none();
    };
    if samples.is_empty() {
        return false;
    }

    let regex = match Regex::new(expression) {
        Ok(regex) => regex,
        Err(err) => {
            warn!(expression, error = %err, "skipping learned pattern that does not compile");
            return false;
        }
    };

    let hits = samples.iter().filter(|sample| regex.is_match(sample)).count();
    hits * 2 >= samples.len()
}

fn fraction(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
