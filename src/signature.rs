use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::StructureDescriptor;
use crate::normalize::HeaderNormalizer;

pub const SIGNATURE_HEX_LEN: usize = 64;

#[derive(Debug, Serialize)]
struct CanonicalFormat<'a> {
    column_count: usize,
    has_header_row: bool,
    headers: &'a [String],
}

#[derive(Debug, Clone, Default)]
pub struct SignatureBuilder {
    normalizer: HeaderNormalizer,
}

impl SignatureBuilder {
    pub fn new(normalizer: HeaderNormalizer) -> Self {
        Self { normalizer }
    }

    /// Sorted, non-empty normalized header tokens.
    pub fn canonical_headers(&self, headers: &[String]) -> Vec<String> {
        let mut tokens = headers
            .iter()
            .map(|header| self.normalizer.normalize(header))
            .filter(|token| !token.is_empty())
            .collect::<Vec<String>>();
        tokens.sort();
        tokens
    }

    pub fn canonical_record(&self, headers: &[String], structure: &StructureDescriptor) -> String {
        let tokens = self.canonical_headers(headers);
        let record = CanonicalFormat {
            column_count: structure.column_count,
            has_header_row: structure.has_header_row,
            headers: &tokens,
        };

        serde_json::to_string(&record).unwrap_or_else(|_| tokens.join("\u{1f}"))
    }

    pub fn signature(&self, headers: &[String], structure: &StructureDescriptor) -> String {
        let record = self.canonical_record(headers, structure);
        let mut hasher = Sha256::new();
        hasher.update(record.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
