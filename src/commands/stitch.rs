use anyhow::Result;
use serde::{Deserialize, Serialize};
use tabrecon::normalize::HeaderNormalizer;
use tabrecon::{FragmentStitcher, MergedTable, ReconcileConfig, TableFragment};
use tracing::{info, warn};

use crate::cli::StitchArgs;
use crate::util::{emit_json, now_utc_string, read_json};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StitchInput {
    Fragments(Vec<TableFragment>),
    Document { fragments: Vec<TableFragment> },
}

impl StitchInput {
    fn into_fragments(self) -> Vec<TableFragment> {
        match self {
            Self::Fragments(fragments) | Self::Document { fragments } => fragments,
        }
    }
}

#[derive(Debug, Serialize)]
struct StitchReport {
    generated_at: String,
    source: String,
    fragment_count: usize,
    table_count: usize,
    tables: Vec<MergedTable>,
}

pub fn run(args: StitchArgs, config: &ReconcileConfig) -> Result<()> {
    let fragments = read_json::<StitchInput>(&args.input)?.into_fragments();
    if fragments.is_empty() {
        warn!(path = %args.input.display(), "input holds no fragments");
    }

    let stitcher = FragmentStitcher::new(HeaderNormalizer::default(), config.stitch);
    let tables = stitcher.stitch(&fragments);

    let report = StitchReport {
        generated_at: now_utc_string(),
        source: args.input.display().to_string(),
        fragment_count: fragments.len(),
        table_count: tables.len(),
        tables,
    };
    emit_json(args.output.as_deref(), &report)?;

    info!(
        fragments = report.fragment_count,
        tables = report.table_count,
        clustering = ?config.stitch.clustering,
        "stitch completed"
    );
    Ok(())
}
