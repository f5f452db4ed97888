use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_HEADER_PREFIX: &str = "Column_";

pub fn placeholder_header(position: usize) -> String {
    format!("{PLACEHOLDER_HEADER_PREFIX}{position}")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentMetadata {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub extractor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One raw table extract handed over by an extraction backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableFragment {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footers: Vec<String>,
    #[serde(default)]
    pub metadata: FragmentMetadata,
}

impl TableFragment {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            ..Self::default()
        }
    }

    pub fn has_headers(&self) -> bool {
        self.headers.iter().any(|header| !header.trim().is_empty())
    }

    pub fn widest_row(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        if self.has_headers() {
            self.headers.len()
        } else {
            self.widest_row()
        }
    }

    pub fn source_id(&self, index: usize) -> String {
        if let Some(fragment_id) = self
            .metadata
            .fragment_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return fragment_id.to_string();
        }

        let extractor = self
            .metadata
            .extractor_id
            .as_deref()
            .unwrap_or("fragment");
        match self.metadata.page {
            Some(page) => format!("{extractor}-p{page}-{index}"),
            None => format!("{extractor}-{index}"),
        }
    }

    /// Pads every row to the header width, growing the header with placeholder
    /// names when a row is wider than it.
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        let (headers, rows) = normalize_shape(&self.headers, &self.rows);
        normalized.headers = headers;
        normalized.rows = rows;
        normalized
    }
}

pub(crate) fn normalize_shape(
    headers: &[String],
    rows: &[Vec<String>],
) -> (Vec<String>, Vec<Vec<String>>) {
    let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut headers = if headers.iter().all(|header| header.trim().is_empty()) {
        (1..=widest).map(placeholder_header).collect::<Vec<String>>()
    } else {
        headers.to_vec()
    };

    while headers.len() < widest {
        headers.push(placeholder_header(headers.len() + 1));
    }

    let width = headers.len();
    let rows = rows
        .iter()
        .map(|row| {
            let mut out = row.clone();
            out.resize(width, String::new());
            out
        })
        .collect::<Vec<Vec<String>>>();

    (headers, rows)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeProvenance {
    pub count: usize,
    pub source_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedMetadata {
    pub page: Option<u32>,
    pub pages: Vec<u32>,
    pub extractor_id: Option<String>,
    pub merged_from: MergeProvenance,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footers: Vec<String>,
    pub row_count: usize,
    pub metadata: MergedMetadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDescriptor {
    pub column_count: usize,
    pub typical_row_count: usize,
    pub has_header_row: bool,
}

impl StructureDescriptor {
    pub fn from_table(headers: &[String], rows: &[Vec<String>]) -> Self {
        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            column_count: headers.len().max(widest),
            typical_row_count: rows.len(),
            has_header_row: headers.iter().any(|header| !header.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Date,
    Currency,
    Percentage,
    Phone,
    Ssn,
    Number,
    String,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Currency => "currency",
            Self::Percentage => "percentage",
            Self::Phone => "phone",
            Self::Ssn => "ssn",
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

/// Learned shape of one column: its inferred type and, when one could be
/// derived, a regular expression generating its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPattern {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl ColumnPattern {
    pub fn untyped() -> Self {
        Self {
            column_type: ColumnType::String,
            expression: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityMetrics {
    pub completeness: f64,
    pub duplicate_row_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatProfile {
    pub owner_scope_id: String,
    pub signature: String,
    pub headers: Vec<String>,
    pub column_patterns: Vec<ColumnPattern>,
    pub column_samples: Vec<Vec<String>>,
    pub structure: StructureDescriptor,
    pub quality: DataQualityMetrics,
    pub field_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub corrections: serde_json::Value,
    pub confidence: f64,
    pub usage_count: u64,
    pub last_used: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{StructureDescriptor, TableFragment, placeholder_header};

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn normalized_pads_rows_and_extends_headers() {
        let fragment = TableFragment::new(
            cells(&["Company", "Premium"]),
            vec![cells(&["A"]), cells(&["B", "2", "extra"])],
        );

        let normalized = fragment.normalized();
        assert_eq!(normalized.headers, vec!["Company", "Premium", "Column_3"]);
        assert_eq!(normalized.rows[0], vec!["A", "", ""]);
        assert_eq!(normalized.rows[1], vec!["B", "2", "extra"]);
    }

    #[test]
    fn normalized_generates_placeholders_for_missing_headers() {
        let fragment = TableFragment::new(Vec::new(), vec![cells(&["a", "b"])]);
        let normalized = fragment.normalized();
        assert_eq!(
            normalized.headers,
            vec![placeholder_header(1), placeholder_header(2)]
        );
    }

    #[test]
    fn source_id_prefers_explicit_fragment_id() {
        let mut fragment = TableFragment::default();
        fragment.metadata.extractor_id = Some("vision".to_string());
        fragment.metadata.page = Some(3);
        assert_eq!(fragment.source_id(1), "vision-p3-1");

        fragment.metadata.fragment_id = Some("frag-9".to_string());
        assert_eq!(fragment.source_id(1), "frag-9");
    }

    #[test]
    fn structure_descriptor_uses_widest_shape() {
        let structure =
            StructureDescriptor::from_table(&cells(&["A"]), &[cells(&["1", "2"]), cells(&["3"])]);
        assert_eq!(structure.column_count, 2);
        assert_eq!(structure.typical_row_count, 2);
        assert!(structure.has_header_row);
    }
}
