use anyhow::Result;
use serde::Serialize;
use tabrecon::{FormatRecognizer, ReconcileConfig, Recognition, TableFragment};
use tracing::{info, warn};

use crate::cli::RecognizeArgs;
use crate::commands::open_store;
use crate::util::{emit_json, now_utc_string, read_json};

#[derive(Debug, Serialize)]
struct RecognizeReport {
    generated_at: String,
    owner: String,
    source: String,
    result: Recognition,
}

pub fn run(args: RecognizeArgs, config: &ReconcileConfig) -> Result<()> {
    let table: TableFragment = read_json(&args.input)?;
    let recognizer = FormatRecognizer::new(open_store(&args.db)?, config);

    let result = recognizer.recognize(&args.owner, &table.headers, &table.rows)?;
    match &result {
        Recognition::Exact(found) | Recognition::Fuzzy(found) => {
            for warning in &found.validation.warnings {
                warn!(warning = %warning, "learned format drift");
            }
            info!(
                signature = %found.profile.signature,
                score = found.score,
                validation = found.validation.overall_score,
                usage_count = found.profile.usage_count,
                mapped_fields = found.profile.field_mapping.len(),
                "format recognized"
            );
        }
        Recognition::NoMatch {
            signature,
            candidates,
        } => {
            info!(
                signature = %signature,
                candidates,
                "no learned format matched; run `learn` after confirming a mapping"
            );
        }
    }

    let report = RecognizeReport {
        generated_at: now_utc_string(),
        owner: args.owner,
        source: args.input.display().to_string(),
        result,
    };
    emit_json(args.output.as_deref(), &report)
}
