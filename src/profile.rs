use std::collections::{BTreeMap, HashSet};

use chrono::Utc;

use crate::config::SamplingConfig;
use crate::fingerprint::{ColumnFingerprinter, DEFAULT_PATTERN_FAMILIES, column_values};
use crate::model::{DataQualityMetrics, FormatProfile, StructureDescriptor};
use crate::normalize::HeaderNormalizer;
use crate::signature::SignatureBuilder;

pub const MAX_CONFIDENCE: f64 = 100.0;

/// Turns a confirmed table plus its field mapping into a storable profile.
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    signatures: SignatureBuilder,
    fingerprinter: ColumnFingerprinter,
    sampling: SamplingConfig,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self::new(HeaderNormalizer::default(), SamplingConfig::default())
    }
}

impl ProfileBuilder {
    pub fn new(normalizer: HeaderNormalizer, sampling: SamplingConfig) -> Self {
        Self {
            signatures: SignatureBuilder::new(normalizer),
            fingerprinter: ColumnFingerprinter::new(
                DEFAULT_PATTERN_FAMILIES,
                sampling.inference_samples,
            ),
            sampling,
        }
    }

    pub fn signatures(&self) -> &SignatureBuilder {
        &self.signatures
    }

    pub fn fingerprinter(&self) -> &ColumnFingerprinter {
        &self.fingerprinter
    }

    pub fn build(
        &self,
        owner_scope_id: &str,
        headers: &[String],
        rows: &[Vec<String>],
        field_mapping: BTreeMap<String, String>,
        corrections: serde_json::Value,
        confidence: f64,
    ) -> FormatProfile {
        let structure = StructureDescriptor::from_table(headers, rows);
        let signature = self.signatures.signature(headers, &structure);
        let column_patterns = self
            .fingerprinter
            .fingerprint_columns(structure.column_count, rows);
        let column_samples = (0..structure.column_count)
            .map(|column| column_values(rows, column, self.sampling.stored_samples))
            .collect::<Vec<Vec<String>>>();

        let now = Utc::now();
        FormatProfile {
            owner_scope_id: owner_scope_id.to_string(),
            signature,
            headers: headers.to_vec(),
            column_patterns,
            column_samples,
            structure,
            quality: quality_metrics(structure.column_count, rows),
            field_mapping,
            corrections,
            confidence: clamp_confidence(confidence),
            usage_count: 1,
            last_used: now,
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, MAX_CONFIDENCE)
    }
}

/// Completeness over the padded `rows x width` grid plus the share of rows
/// repeating an earlier row. Empty tables score zero on both.
pub fn quality_metrics(width: usize, rows: &[Vec<String>]) -> DataQualityMetrics {
    let total_cells = width * rows.len();
    let filled_cells = rows
        .iter()
        .map(|row| {
            row.iter()
                .take(width)
                .filter(|cell| !cell.trim().is_empty())
                .count()
        })
        .sum::<usize>();

    let mut seen = HashSet::<&[String]>::new();
    let duplicates = rows
        .iter()
        .filter(|row| !seen.insert(row.as_slice()))
        .count();

    DataQualityMetrics {
        completeness: ratio(filled_cells, total_cells),
        duplicate_row_ratio: ratio(duplicates, rows.len()),
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{ProfileBuilder, clamp_confidence, quality_metrics};
    use crate::model::ColumnType;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn commission_rows() -> Vec<Vec<String>> {
        vec![
            cells(&["Acme", "$1,200.00", "01/15/2024"]),
            cells(&["Globex", "$310.50", "02/15/2024"]),
            cells(&["Initech", "$75.00", "03/15/2024"]),
            cells(&["Umbrella", "$18.25", "04/15/2024"]),
            cells(&["Hooli", "$920.00", "05/15/2024"]),
            cells(&["Stark", "$44.00", "06/15/2024"]),
        ]
    }

    #[test]
    fn build_fills_every_learned_field() {
        let headers = cells(&["Group Name", "Commission Paid", "Paid Date"]);
        let mapping = BTreeMap::from([
            ("Group Name".to_string(), "company_name".to_string()),
            ("Commission Paid".to_string(), "commission_amount".to_string()),
        ]);

        let profile = ProfileBuilder::default().build(
            "carrier-1",
            &headers,
            &commission_rows(),
            mapping.clone(),
            serde_json::json!({"statement_date": "2024-06-30"}),
            87.5,
        );

        assert_eq!(profile.owner_scope_id, "carrier-1");
        assert_eq!(profile.signature.len(), 64);
        assert_eq!(profile.headers, headers);
        assert_eq!(profile.field_mapping, mapping);
        assert_eq!(profile.structure.column_count, 3);
        assert_eq!(profile.structure.typical_row_count, 6);
        assert!(profile.structure.has_header_row);
        assert_eq!(profile.usage_count, 1);
        assert_eq!(profile.created_at, profile.last_used);

        let types = profile
            .column_patterns
            .iter()
            .map(|pattern| pattern.column_type)
            .collect::<Vec<ColumnType>>();
        assert_eq!(
            types,
            vec![ColumnType::String, ColumnType::Currency, ColumnType::Date]
        );
        assert!(profile.column_patterns[0].expression.is_none());
        assert!(profile.column_patterns[1].expression.is_some());

        assert_eq!(profile.column_samples.len(), 3);
        assert_eq!(profile.column_samples[0].len(), 5);
        assert_eq!(profile.column_samples[0][0], "Acme");
    }

    #[test]
    fn signature_matches_a_reordered_header_list() {
        let builder = ProfileBuilder::default();
        let rows = commission_rows();
        let first = builder.build(
            "o",
            &cells(&["Group Name", "Commission Paid", "Paid Date"]),
            &rows,
            BTreeMap::new(),
            serde_json::Value::Null,
            50.0,
        );
        let second = builder.build(
            "o",
            &cells(&["paid date", "GROUP NAME", "Commission  Paid"]),
            &rows,
            BTreeMap::new(),
            serde_json::Value::Null,
            50.0,
        );
        assert_eq!(first.signature, second.signature);
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(clamp_confidence(140.0), 100.0);
        assert_eq!(clamp_confidence(-3.0), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(42.0), 42.0);
    }

    #[test]
    fn quality_counts_blanks_and_repeated_rows() {
        let rows = vec![
            cells(&["A", "1"]),
            cells(&["A", "1"]),
            cells(&["B", ""]),
            cells(&["C"]),
        ];
        let quality = quality_metrics(2, &rows);
        assert!((quality.completeness - 6.0 / 8.0).abs() < 1e-9);
        assert!((quality.duplicate_row_ratio - 0.25).abs() < 1e-9);

        let empty = quality_metrics(3, &[]);
        assert_eq!(empty.completeness, 0.0);
        assert_eq!(empty.duplicate_row_ratio, 0.0);
    }
}
