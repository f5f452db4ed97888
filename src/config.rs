use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusteringMode {
    #[default]
    SeedGreedy,
    Transitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentWeights {
    pub header: f64,
    pub column_count: f64,
    pub row_format: f64,
    pub data_pattern: f64,
    pub structure: f64,
}

impl Default for FragmentWeights {
    fn default() -> Self {
        Self {
            header: 0.30,
            column_count: 0.20,
            row_format: 0.25,
            data_pattern: 0.15,
            structure: 0.10,
        }
    }
}

impl FragmentWeights {
    pub fn total(&self) -> f64 {
        self.header + self.column_count + self.row_format + self.data_pattern + self.structure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitDetection {
    pub min_shared_words: usize,
    pub joined_overlap_floor: f64,
    pub min_word_count_gap: usize,
    pub content_similarity_floor: f64,
}

impl Default for SplitDetection {
    fn default() -> Self {
        Self {
            min_shared_words: 3,
            joined_overlap_floor: 0.7,
            min_word_count_gap: 2,
            content_similarity_floor: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    pub merge_threshold: f64,
    pub clustering: ClusteringMode,
    pub weights: FragmentWeights,
    pub split_detection: SplitDetection,
    pub pattern_sample_rows: usize,
    pub max_length_gap: f64,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            merge_threshold: 0.6,
            clustering: ClusteringMode::SeedGreedy,
            weights: FragmentWeights::default(),
            split_detection: SplitDetection::default(),
            pattern_sample_rows: 3,
            max_length_gap: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub accept_threshold: f64,
    pub header_weight: f64,
    pub structure_weight: f64,
    /// Header-score credit for every paired header, exact or fuzzy.
    pub coverage_weight: f64,
    /// Extra header-score credit for exact pairings only.
    pub exactness_weight: f64,
    pub fuzzy_ratio_floor: f64,
    pub strict_fuzzy_ratio_floor: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.5,
            header_weight: 0.8,
            structure_weight: 0.2,
            coverage_weight: 0.8,
            exactness_weight: 0.2,
            fuzzy_ratio_floor: 0.6,
            strict_fuzzy_ratio_floor: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub inference_samples: usize,
    pub stored_samples: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            inference_samples: 20,
            stored_samples: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub stitch: StitchConfig,
    pub matching: MatchConfig,
    pub sampling: SamplingConfig,
}

impl ReconcileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.stitch.weights.total() <= 0.0 {
            bail!("stitch.weights must not all be zero");
        }
        if self.matching.header_weight + self.matching.structure_weight <= 0.0 {
            bail!("matching header/structure weights must not both be zero");
        }
        if self.matching.coverage_weight < 0.0 || self.matching.exactness_weight < 0.0 {
            bail!("matching coverage/exactness weights must not be negative");
        }
        if self.matching.coverage_weight + self.matching.exactness_weight <= 0.0 {
            bail!("matching coverage/exactness weights must not both be zero");
        }
        for (name, value) in [
            ("stitch.merge_threshold", self.stitch.merge_threshold),
            ("matching.accept_threshold", self.matching.accept_threshold),
            ("matching.fuzzy_ratio_floor", self.matching.fuzzy_ratio_floor),
            (
                "matching.strict_fuzzy_ratio_floor",
                self.matching.strict_fuzzy_ratio_floor,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{name} must be within 0.0..=1.0, got {value}");
            }
        }
        if self.sampling.inference_samples == 0 {
            bail!("sampling.inference_samples must be at least 1");
        }
        Ok(())
    }
}
