use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use tabrecon::{FormatRecognizer, ReconcileConfig, TableFragment};
use tracing::{info, warn};

use crate::cli::LearnArgs;
use crate::commands::open_store;
use crate::util::read_json;

pub fn run(args: LearnArgs, config: &ReconcileConfig) -> Result<()> {
    let table: TableFragment = read_json(&args.input)?;
    let mapping: BTreeMap<String, String> = read_json(&args.mapping)?;

    if mapping.is_empty() {
        bail!("mapping {} is empty", args.mapping.display());
    }
    for source_header in mapping.keys() {
        if !table.headers.iter().any(|header| header == source_header) {
            warn!(header = %source_header, "mapped header not present in input table");
        }
    }

    let corrections = match args.corrections.as_deref() {
        Some(raw) => serde_json::from_str(raw).context("failed to parse --corrections as json")?,
        None => serde_json::Value::Null,
    };

    let recognizer = FormatRecognizer::new(open_store(&args.db)?, config);
    let profile = recognizer.learn(
        &args.owner,
        &table.headers,
        &table.rows,
        mapping,
        corrections,
        args.confidence,
    )?;

    info!(
        db = %args.db.display(),
        owner = %profile.owner_scope_id,
        signature = %profile.signature,
        usage_count = profile.usage_count,
        confidence = profile.confidence,
        completeness = profile.quality.completeness,
        "learn completed"
    );
    Ok(())
}
