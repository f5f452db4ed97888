use super::*;
use crate::config::{ClusteringMode, StitchConfig};
use crate::model::TableFragment;
use crate::normalize::HeaderNormalizer;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn fragment(headers: &[&str], rows: &[&[&str]]) -> TableFragment {
    TableFragment::new(strings(headers), rows.iter().map(|row| strings(row)).collect())
}

fn rows(values: &[&[&str]]) -> Vec<Vec<String>> {
    values.iter().map(|row| strings(row)).collect()
}

fn stitcher(clustering: ClusteringMode) -> FragmentStitcher {
    let config = StitchConfig {
        clustering,
        ..StitchConfig::default()
    };
    FragmentStitcher::new(HeaderNormalizer::default(), config)
}

/// A~B and B~C clear the threshold, A~C does not.
fn chained_fragments() -> Vec<TableFragment> {
    let a = fragment(&["aaa", "bbb", "ccc"], &[&["a", "b", "c"], &["d", "e", "f"]]);
    let c = fragment(
        &["xxx", "yyy", "zzz"],
        &[
            &["abcdefghijabcdefghij", "abcdefghijabcdefghij", "abcdefghijabcdefghij"],
            &["abcdefghijabcdefghij", "abcdefghijabcdefghij", "abcdefghijabcdefghij"],
        ],
    );
    let b = fragment(
        &["aaa", "bbb", "zzz"],
        &[
            &["abcdefghij", "abcdefghij", "abcdefghij"],
            &["abcdefghij", "abcdefghij", "abcdefghij"],
        ],
    );
    vec![a, c, b]
}

#[test]
fn stitching_one_fragment_is_identity() {
    let single = fragment(&["Company", "Premium"], &[&["A", "1"], &["B", "2"]]);

    let merged = FragmentStitcher::default().stitch(std::slice::from_ref(&single));
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].headers, single.headers);
    assert_eq!(merged[0].rows, single.rows);
    assert_eq!(merged[0].metadata.merged_from.count, 1);
}

#[test]
fn identical_headers_merge_rows_in_order() {
    let fragments = vec![
        fragment(&["Company", "Premium"], &[&["A", "1"], &["B", "2"]]),
        fragment(&["Company", "Premium"], &[&["C", "3"]]),
    ];

    let merged = FragmentStitcher::default().stitch(&fragments);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].headers, strings(&["Company", "Premium"]));
    assert_eq!(merged[0].rows, rows(&[&["A", "1"], &["B", "2"], &["C", "3"]]));
    assert_eq!(merged[0].row_count, 3);
    assert_eq!(merged[0].metadata.merged_from.count, 2);
}

#[test]
fn exact_header_fast_path_ignores_case_and_spacing() {
    let fragments = vec![
        fragment(&["Company", "Premium"], &[&["A", "1"]]),
        fragment(&["Name", "Phone"], &[&["Bob", "555-123-4567"]]),
        fragment(&[" COMPANY ", "premium"], &[&["B", "2"]]),
    ];

    let stitcher = FragmentStitcher::default();
    let groups = stitcher.group(&fragments);
    assert_eq!(groups[0].members, vec![0, 2]);
    assert_eq!(groups[0].formation, GroupFormation::ExactHeaders);
    assert_eq!(groups[1].members, vec![1]);
    assert_eq!(groups[1].formation, GroupFormation::Singleton);
}

#[test]
fn headerless_continuation_joins_the_previous_page() {
    let fragments = vec![
        fragment(
            &["Company", "Premium", "Date"],
            &[
                &["Acme", "$100.00", "01/02/2024"],
                &["Globex", "$250.00", "01/03/2024"],
            ],
        ),
        fragment(&[], &[&["Initech", "$75.00", "01/04/2024"]]),
    ];

    let merged = FragmentStitcher::default().stitch(&fragments);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].headers, strings(&["Company", "Premium", "Date"]));
    assert_eq!(merged[0].row_count, 3);
    assert_eq!(merged[0].rows[2], strings(&["Initech", "$75.00", "01/04/2024"]));
}

#[test]
fn greedy_clustering_compares_against_the_seed_only() {
    let fragments = chained_fragments();

    let groups = stitcher(ClusteringMode::SeedGreedy).group(&fragments);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].members, vec![0, 2]);
    assert_eq!(groups[0].formation, GroupFormation::Similarity);
    assert_eq!(groups[1].members, vec![1]);
}

#[test]
fn transitive_clustering_follows_chains() {
    let fragments = chained_fragments();

    let groups = stitcher(ClusteringMode::Transitive).group(&fragments);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].members, vec![0, 1, 2]);

    let merged = stitcher(ClusteringMode::Transitive).stitch(&fragments);
    assert_eq!(merged[0].row_count, 6);
}

#[test]
fn merge_records_provenance_and_rewrites_row_counts() {
    let mut first = fragment(&["Company", "Premium"], &[&["A", "1"]]);
    first.confidence = Some(0.8);
    first.footers = strings(&["Page total: 1"]);
    first.metadata.page = Some(2);
    first.metadata.extractor_id = Some("vision".to_string());
    first
        .metadata
        .extra
        .insert("row_count".to_string(), serde_json::json!(1));
    first
        .metadata
        .extra
        .insert("statement".to_string(), serde_json::json!("Q1"));

    let mut second = fragment(&["Company", "Premium"], &[&["B", "2"], &["C"]]);
    second.confidence = Some(0.6);
    second.footers = strings(&["Page total: 1", "Grand total: 3"]);
    second.metadata.page = Some(1);
    second.metadata.fragment_id = Some("ocr-7".to_string());

    let merged = FragmentStitcher::default().stitch(&[first, second]);
    let table = &merged[0];

    assert_eq!(table.rows[2], strings(&["C", ""]));
    assert_eq!(table.metadata.page, Some(2));
    assert_eq!(table.metadata.pages, vec![1, 2]);
    assert_eq!(table.metadata.extractor_id.as_deref(), Some("vision"));
    assert_eq!(
        table.metadata.merged_from.source_ids,
        strings(&["vision-p2-0", "ocr-7"])
    );
    assert_eq!(table.metadata.extra["row_count"], serde_json::json!(3));
    assert_eq!(table.metadata.extra["statement"], serde_json::json!("Q1"));
    assert_eq!(table.footers, strings(&["Page total: 1", "Grand total: 3"]));
    assert!((table.confidence.unwrap_or_default() - 0.7).abs() < 1e-9);
}

#[test]
fn longest_header_in_group_wins() {
    let short = fragment(&["Company", "Premium"], &[&["A", "1", "x"]]);
    let long = fragment(&["Company", "Premium", "Note"], &[&["B", "2", "y"]]);

    let members = [&short, &long];
    let merged = merge_fragments(&members, strings(&["s", "l"]), &[]);
    assert_eq!(merged.headers, strings(&["Company", "Premium", "Note"]));
    assert_eq!(merged.row_count, 2);
}

#[test]
fn empty_inputs_produce_empty_results() {
    let stitcher = FragmentStitcher::default();
    assert!(stitcher.stitch(&[]).is_empty());

    let merged = stitcher.stitch(&[TableFragment::default()]);
    assert_eq!(merged.len(), 1);
    assert!(merged[0].headers.is_empty());
    assert!(merged[0].rows.is_empty());
    assert_eq!(merged[0].row_count, 0);

    assert!(merge_fragments(&[], Vec::new(), &[]).rows.is_empty());
}

#[test]
fn canonical_header_falls_back_to_placeholders() {
    let fragments = vec![
        fragment(&[], &[&["a", "b"]]),
        fragment(&[], &[&["a", "b", "c"]]),
    ];
    assert_eq!(
        canonical_header(&fragments),
        strings(&["Column_1", "Column_2", "Column_3"])
    );

    let with_header = vec![fragments[0].clone(), fragment(&["One"], &[])];
    assert_eq!(canonical_header(&with_header), strings(&["One"]));
}

#[test]
fn headerless_singleton_takes_the_document_header() {
    let text_rows = [
        ["Acme", "Premier", "Smith"],
        ["Globex", "Basic", "Jones"],
        ["Initech", "Premier", "Brown"],
        ["Umbrella", "Basic", "Green"],
        ["Hooli", "Premier", "White"],
        ["Stark", "Basic", "Black"],
        ["Wayne", "Premier", "Gray"],
        ["Wonka", "Basic", "Stone"],
        ["Tyrell", "Premier", "Wood"],
        ["Cyberdyne", "Basic", "Lake"],
    ];
    let headered = TableFragment::new(
        strings(&["Company", "Premium", "Agent"]),
        text_rows.iter().map(|row| strings(row)).collect(),
    );
    let numeric = fragment(&[], &[&["1", "2", "3"]]);

    let merged = FragmentStitcher::default().stitch(&[headered, numeric]);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[1].metadata.merged_from.count, 1);
    assert_eq!(merged[1].headers, strings(&["Company", "Premium", "Agent"]));
    assert_eq!(merged[1].rows, rows(&[&["1", "2", "3"]]));
}

#[test]
fn fallback_header_grows_only_for_wider_rows() {
    let canonical = strings(&["Company", "Premium", "Agent"]);
    let wide = fragment(&[], &[&["1", "2", "3", "4"]]);
    let narrow = fragment(&[], &[&["1"]]);

    let merged = merge_fragments(&[&wide], strings(&["w"]), &canonical);
    assert_eq!(merged.headers, strings(&["Company", "Premium", "Agent", "Column_4"]));

    let merged = merge_fragments(&[&narrow], strings(&["n"]), &canonical);
    assert_eq!(merged.headers, canonical);
    assert_eq!(merged.rows, rows(&[&["1", "", ""]]));
}

#[test]
fn headerless_fragments_share_the_fast_path_bucket() {
    let fragments = vec![
        fragment(
            &[],
            &[&["a", "1"], &["b", "2"], &["c", "3"], &["d", "4"]],
        ),
        fragment(&["Company", "Premium", "Agent", "State"], &[&["Acme", "$1.00", "Bob", "OH"]]),
        fragment(&[], &[&["e", "5", "Ann", "TX"]]),
    ];

    let groups = FragmentStitcher::default().group(&fragments);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].members, vec![0, 2]);
    assert_eq!(groups[0].formation, GroupFormation::ExactHeaders);
    assert_eq!(groups[1].members, vec![1]);

    let merged = FragmentStitcher::default().stitch(&fragments);
    assert_eq!(merged[0].headers, strings(&["Company", "Premium", "Agent", "State"]));
    assert_eq!(merged[0].rows[0], strings(&["a", "1", "", ""]));
    assert_eq!(merged[0].row_count, 5);
}
