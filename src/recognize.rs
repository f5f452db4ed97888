use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::config::ReconcileConfig;
use crate::matcher::FormatMatcher;
use crate::model::{FormatProfile, StructureDescriptor};
use crate::normalize::HeaderNormalizer;
use crate::profile::ProfileBuilder;
use crate::similarity::ProfileSimilarity;
use crate::store::ProfileStore;
use crate::validate::{FormatValidation, FormatValidator};

#[derive(Debug, Clone, Serialize)]
pub struct RecognizedFormat {
    /// Stored profile after its usage was recorded.
    pub profile: FormatProfile,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<ProfileSimilarity>,
    pub validation: FormatValidation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Recognition {
    Exact(RecognizedFormat),
    Fuzzy(RecognizedFormat),
    NoMatch { signature: String, candidates: usize },
}

impl Recognition {
    pub fn format(&self) -> Option<&RecognizedFormat> {
        match self {
            Self::Exact(format) | Self::Fuzzy(format) => Some(format),
            Self::NoMatch { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.format().is_some()
    }
}

/// Exact-then-fuzzy lookup of a table layout in an owner's profile store.
pub struct FormatRecognizer<S: ProfileStore> {
    store: S,
    builder: ProfileBuilder,
    matcher: FormatMatcher,
    validator: FormatValidator,
}

impl<S: ProfileStore> FormatRecognizer<S> {
    pub fn new(store: S, config: &ReconcileConfig) -> Self {
        Self::with_normalizer(store, HeaderNormalizer::default(), config)
    }

    pub fn with_normalizer(store: S, normalizer: HeaderNormalizer, config: &ReconcileConfig) -> Self {
        Self {
            store,
            builder: ProfileBuilder::new(normalizer.clone(), config.sampling),
            matcher: FormatMatcher::new(normalizer.clone(), config.matching),
            validator: FormatValidator::new(normalizer, config.matching, config.sampling),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn recognize(
        &self,
        owner_scope_id: &str,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> Result<Recognition> {
        let structure = StructureDescriptor::from_table(headers, rows);
        let signature = self.builder.signatures().signature(headers, &structure);

        if let Some(profile) = self.store.get_by_signature(owner_scope_id, &signature)? {
            let validation = self.validator.validate(&profile, headers, rows);
            let profile = self.record_use(owner_scope_id, profile)?;
            info!(
                owner = owner_scope_id,
                signature = %signature,
                usage_count = profile.usage_count,
                "recognized format by signature"
            );
            return Ok(Recognition::Exact(RecognizedFormat {
                profile,
                score: 1.0,
                similarity: None,
                validation,
            }));
        }

        let profiles = self.store.list(owner_scope_id)?;
        let Some(found) = self
            .matcher
            .find_best_match(headers, &structure, &profiles)
        else {
            info!(
                owner = owner_scope_id,
                signature = %signature,
                candidates = profiles.len(),
                "no stored format matched"
            );
            return Ok(Recognition::NoMatch {
                signature,
                candidates: profiles.len(),
            });
        };

        let score = found.score();
        let similarity = found.similarity.clone();
        let validation = self.validator.validate(found.profile, headers, rows);
        let profile = self.record_use(owner_scope_id, found.profile.clone())?;
        info!(
            owner = owner_scope_id,
            matched = %profile.signature,
            score,
            overall = validation.overall_score,
            "recognized format by similarity"
        );

        Ok(Recognition::Fuzzy(RecognizedFormat {
            profile,
            score,
            similarity: Some(similarity),
            validation,
        }))
    }

    /// Stores a human-confirmed mapping for this layout.
    pub fn learn(
        &self,
        owner_scope_id: &str,
        headers: &[String],
        rows: &[Vec<String>],
        field_mapping: BTreeMap<String, String>,
        corrections: serde_json::Value,
        confidence: f64,
    ) -> Result<FormatProfile> {
        let profile = self.builder.build(
            owner_scope_id,
            headers,
            rows,
            field_mapping,
            corrections,
            confidence,
        );
        let stored = self.store.upsert(owner_scope_id, &profile)?;
        info!(
            owner = owner_scope_id,
            signature = %stored.signature,
            columns = stored.structure.column_count,
            usage_count = stored.usage_count,
            "learned format profile"
        );
        Ok(stored)
    }

    fn record_use(&self, owner_scope_id: &str, mut profile: FormatProfile) -> Result<FormatProfile> {
        profile.last_used = Utc::now();
        self.store.upsert(owner_scope_id, &profile)
    }
}
