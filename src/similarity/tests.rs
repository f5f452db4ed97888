use std::collections::BTreeMap;

use chrono::Utc;

use super::*;
use crate::config::{MatchConfig, StitchConfig};
use crate::model::{DataQualityMetrics, FormatProfile, StructureDescriptor, TableFragment};
use crate::normalize::HeaderNormalizer;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn fragment(headers: &[&str], rows: &[&[&str]]) -> TableFragment {
    TableFragment::new(strings(headers), rows.iter().map(|row| strings(row)).collect())
}

fn fragment_scorer() -> FragmentScorer {
    FragmentScorer::new(HeaderNormalizer::default(), StitchConfig::default())
}

fn profile_scorer() -> ProfileScorer {
    ProfileScorer::new(HeaderNormalizer::default(), MatchConfig::default())
}

fn close(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

fn stored_profile(headers: &[&str], structure: StructureDescriptor) -> FormatProfile {
    let now = Utc::now();
    FormatProfile {
        owner_scope_id: "carrier-1".to_string(),
        signature: "sig".to_string(),
        headers: strings(headers),
        column_patterns: Vec::new(),
        column_samples: Vec::new(),
        structure,
        quality: DataQualityMetrics::default(),
        field_mapping: BTreeMap::new(),
        corrections: serde_json::Value::Null,
        confidence: 90.0,
        usage_count: 1,
        last_used: now,
        created_at: now,
        updated_at: now,
    }
}

fn premium_fragment() -> TableFragment {
    fragment(
        &["Company", "Premium", "Date"],
        &[
            &["Acme", "$100.00", "01/02/2024"],
            &["Globex", "$250.00", "01/03/2024"],
        ],
    )
}

#[test]
fn header_similarity_of_a_header_with_itself_is_one() {
    let scorer = fragment_scorer();
    for headers in [
        strings(&["Company", "Premium"]),
        strings(&["Group Name", "Invoice Total", "Commission Paid", "Adj"]),
        strings(&["", "Policy No."]),
    ] {
        assert!(close(scorer.header_similarity(&headers, &headers), 1.0));
    }
}

#[test]
fn identical_fragments_score_full_marks() {
    let scorer = fragment_scorer();
    let left = premium_fragment();
    let similarity = scorer.score(&left, &left, 3);
    assert!(close(similarity.total, 1.0), "{similarity:?}");
    assert!(!similarity.split_detected);
}

#[test]
fn headerless_continuation_clears_the_stitch_threshold() {
    let scorer = fragment_scorer();
    let continuation = fragment(&[], &[&["Initech", "$75.00", "01/04/2024"]]);

    let similarity = scorer.score(&premium_fragment(), &continuation, 3);
    assert!(close(similarity.header, 0.0));
    assert!(close(similarity.column_count, 1.0));
    assert!(close(similarity.row_format, 1.0));
    assert!(close(similarity.data_pattern, 1.0));
    assert!(close(similarity.structure, 2.0 / 3.0));
    assert!(similarity.total >= 0.6, "{similarity:?}");
}

#[test]
fn unrelated_fragments_stay_below_the_stitch_threshold() {
    let scorer = fragment_scorer();
    let agents = fragment(
        &["Agent", "Region", "Phone", "Email", "Start", "Status"],
        &[
            &["Bob Smith", "North", "555-123-4567", "bob@example.com", "2020", "Active"],
            &["Ann Lee", "South", "555-222-3333", "ann@example.com", "2019", "Inactive"],
        ],
    );

    let similarity = scorer.score(&premium_fragment(), &agents, 6);
    assert!(similarity.total < 0.6, "{similarity:?}");
}

#[test]
fn smart_column_split_switches_to_phrase_comparison() {
    let scorer = fragment_scorer();
    let left = fragment(&["Company Name", "Premium Amount", "Commission"], &[]);
    let right = fragment(&["Company", "Name Premium", "Amount", "Commission"], &[]);

    let similarity = scorer.score(&left, &right, 4);
    assert!(similarity.split_detected);
    assert!(close(similarity.header, 1.0));
}

#[test]
fn each_split_rule_fires_on_its_own() {
    let scorer = fragment_scorer();

    let glued = scorer.split_rules(
        &strings(&["Policy", "Holder", "Zone", "Policyholder", "Tariff"]),
        &strings(&["Policy Holder", "Zone Band", "Grade Level"]),
    );
    assert_eq!(
        glued,
        SplitRules {
            shared_words: true,
            ..SplitRules::default()
        }
    );

    let reworded = scorer.split_rules(
        &strings(&["Premium Total", "Due"]),
        &strings(&["Premium Total Annual Rate", "Due"]),
    );
    assert_eq!(
        reworded,
        SplitRules {
            joined_overlap: true,
            ..SplitRules::default()
        }
    );

    let recut = scorer.split_rules(
        &strings(&["Company Name", "Premium Amount", "Commission"]),
        &strings(&["Company", "Name Premium", "Amount", "Commission"]),
    );
    assert_eq!(
        recut,
        SplitRules {
            content_similarity: true,
            ..SplitRules::default()
        }
    );

    let unrelated = scorer.split_rules(
        &strings(&["Carrier", "State"]),
        &strings(&["Agent", "Phone", "Email"]),
    );
    assert!(!unrelated.any());
}

#[test]
fn split_detected_by_the_overlap_rule_alone_uses_phrase_scoring() {
    let scorer = fragment_scorer();
    let left = fragment(&["Premium Total", "Due"], &[]);
    let right = fragment(&["Premium Total Annual Rate", "Due"], &[]);

    let similarity = scorer.score(&left, &right, 2);
    assert!(similarity.split_detected);
    assert!(similarity.header > 0.6, "{similarity:?}");
}

#[test]
fn date_cells_follow_the_date_pattern_family() {
    let scorer = fragment_scorer();
    for cell in ["01/02/2024", "Paid 2024-01-15", "Jan 5, 2024", "(12.31.2023)"] {
        assert!(scorer.looks_like_date(cell), "{cell} should look like a date");
    }
    for cell in ["12.50", "Acme", "1-2", "555-123-4567", ""] {
        assert!(!scorer.looks_like_date(cell), "{cell} should not look like a date");
    }
}

#[test]
fn spelled_out_dates_agree_with_numeric_dates() {
    let scorer = fragment_scorer();
    let spelled = fragment(&[], &[&["Initech", "$75.00", "Jan 4, 2024"]]);

    let similarity = scorer.score(&premium_fragment(), &spelled, 3);
    assert!(close(similarity.data_pattern, 1.0), "{similarity:?}");
}

#[test]
fn column_count_similarity_is_relative_to_the_wider_side() {
    assert!(close(column_count_similarity(3, 4), 0.75));
    assert!(close(column_count_similarity(0, 0), 1.0));
}

#[test]
fn row_format_counts_rows_within_one_of_canonical_width() {
    let ragged = fragment(&["A", "B", "C"], &[&["1", "2", "3"], &["1"], &["1", "2", "3", "4"]]);
    assert!(close(row_format_conformance(&ragged, 3), 2.0 / 3.0));
}

#[test]
fn renamed_headers_resolve_through_fuzzy_pairing() {
    let scorer = profile_scorer();
    let stored = strings(&["Group Name", "Invoice Total", "Commission Paid"]);
    let observed = strings(&["Group", "Invoice Amount", "Commission"]);

    let header_match = scorer.match_headers(&observed, &stored, 0.6);
    assert!(header_match.fuzzy_matches >= 2, "{header_match:?}");
    assert_eq!(header_match.exact_matches + header_match.fuzzy_matches, 3);
    assert!(header_match.score > 0.5);

    let strict = scorer.strict_header_similarity(&observed, &stored);
    assert!(strict < header_match.score);
}

#[test]
fn exact_header_pairs_consume_each_stored_header_once() {
    let scorer = profile_scorer();
    let stored = strings(&["Premium"]);
    let observed = strings(&["Premium", "premium"]);

    let header_match = scorer.match_headers(&observed, &stored, 0.6);
    assert_eq!(header_match.exact_matches, 1);
    assert_eq!(header_match.fuzzy_matches, 0);
    assert!(close(header_match.score, 0.5));

    assert!(close(scorer.header_similarity(&stored, &stored), 1.0));
    assert!(close(scorer.header_similarity(&[], &[]), 0.0));
}

#[test]
fn profile_structure_uses_banded_credit() {
    let observed = StructureDescriptor {
        column_count: 5,
        typical_row_count: 20,
        has_header_row: true,
    };
    let stored = StructureDescriptor {
        column_count: 3,
        typical_row_count: 14,
        has_header_row: true,
    };
    assert!(close(profile_structure_similarity(&observed, &stored), 2.8 / 3.0));

    let distant = StructureDescriptor {
        column_count: 10,
        typical_row_count: 100,
        has_header_row: false,
    };
    let small = StructureDescriptor {
        column_count: 3,
        typical_row_count: 20,
        has_header_row: true,
    };
    assert!(close(profile_structure_similarity(&distant, &small), 1.0 / 3.0));
}

#[test]
fn profile_structure_skips_unknown_row_counts() {
    let observed = StructureDescriptor {
        column_count: 3,
        typical_row_count: 0,
        has_header_row: true,
    };
    let stored = StructureDescriptor {
        column_count: 3,
        typical_row_count: 50,
        has_header_row: true,
    };
    assert!(close(profile_structure_similarity(&observed, &stored), 1.0));
}

#[test]
fn profile_score_weights_header_and_structure() {
    let scorer = profile_scorer();
    let structure = StructureDescriptor {
        column_count: 3,
        typical_row_count: 12,
        has_header_row: true,
    };
    let profile = stored_profile(&["Group Name", "Invoice Total", "Commission Paid"], structure);

    let similarity = scorer.score(
        &strings(&["Group", "Invoice Amount", "Commission"]),
        &structure,
        &profile,
    );
    assert!(close(similarity.header, 0.8));
    assert!(close(similarity.structure, 1.0));
    assert!(close(similarity.total, 0.84));
}

#[test]
fn header_score_weights_come_from_config() {
    let config = MatchConfig {
        coverage_weight: 1.0,
        exactness_weight: 0.0,
        ..MatchConfig::default()
    };
    let scorer = ProfileScorer::new(HeaderNormalizer::default(), config);
    let stored = strings(&["Group Name", "Invoice Total", "Commission Paid"]);
    let observed = strings(&["Group", "Invoice Amount", "Commission"]);

    assert!(close(scorer.header_similarity(&observed, &stored), 1.0));

    let exact_only = ProfileScorer::new(
        HeaderNormalizer::default(),
        MatchConfig {
            coverage_weight: 0.0,
            exactness_weight: 1.0,
            ..MatchConfig::default()
        },
    );
    assert!(close(exact_only.header_similarity(&observed, &stored), 0.0));
    assert!(close(exact_only.header_similarity(&stored, &stored), 1.0));
}
