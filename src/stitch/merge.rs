use std::collections::BTreeSet;

use crate::model::{
    MergeProvenance, MergedMetadata, MergedTable, TableFragment, normalize_shape,
};

const ROW_COUNT_KEY: &str = "row_count";

/// Folds the fragments of one group, given in original order, into a single
/// table. `source_ids` must line up with `members`; `fallback_header` names the
/// columns when no member carries a header.
pub fn merge_fragments(
    members: &[&TableFragment],
    source_ids: Vec<String>,
    fallback_header: &[String],
) -> MergedTable {
    let Some(first) = members.first() else {
        return MergedTable::default();
    };

    let mut header: &[String] = &[];
    for fragment in members.iter().filter(|fragment| fragment.has_headers()) {
        if fragment.headers.len() > header.len() {
            header = fragment.headers.as_slice();
        }
    }
    if header.is_empty() {
        header = fallback_header;
    }

    let rows = members
        .iter()
        .flat_map(|fragment| fragment.rows.iter().cloned())
        .collect::<Vec<Vec<String>>>();
    let (headers, rows) = normalize_shape(header, &rows);
    let row_count = rows.len();

    let confidences = members
        .iter()
        .filter_map(|fragment| fragment.confidence)
        .collect::<Vec<f64>>();
    let confidence = if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
    };

    let mut footers = Vec::<String>::new();
    for footer in members.iter().flat_map(|fragment| fragment.footers.iter()) {
        if !footers.contains(footer) {
            footers.push(footer.clone());
        }
    }

    let pages = members
        .iter()
        .filter_map(|fragment| fragment.metadata.page)
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect::<Vec<u32>>();

    let mut extra = first.metadata.extra.clone();
    if extra
        .get(ROW_COUNT_KEY)
        .is_some_and(serde_json::Value::is_number)
    {
        extra.insert(ROW_COUNT_KEY.to_string(), serde_json::Value::from(row_count));
    }

    MergedTable {
        headers,
        rows,
        confidence,
        footers,
        row_count,
        metadata: MergedMetadata {
            page: first.metadata.page,
            pages,
            extractor_id: first.metadata.extractor_id.clone(),
            merged_from: MergeProvenance {
                count: members.len(),
                source_ids,
            },
            extra,
        },
    }
}
