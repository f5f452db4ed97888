use anyhow::Result;
use serde::Serialize;
use tabrecon::normalize::HeaderNormalizer;
use tabrecon::signature::SignatureBuilder;
use tabrecon::{StructureDescriptor, TableFragment};
use tracing::info;

use crate::cli::SignatureArgs;
use crate::util::{emit_json, read_json};

#[derive(Debug, Serialize)]
struct SignatureReport {
    signature: String,
    canonical_headers: Vec<String>,
    structure: StructureDescriptor,
}

pub fn run(args: SignatureArgs) -> Result<()> {
    let table: TableFragment = read_json(&args.input)?;
    let builder = SignatureBuilder::new(HeaderNormalizer::default());

    let structure = StructureDescriptor::from_table(&table.headers, &table.rows);
    let report = SignatureReport {
        signature: builder.signature(&table.headers, &structure),
        canonical_headers: builder.canonical_headers(&table.headers),
        structure,
    };

    info!(
        signature = %report.signature,
        columns = structure.column_count,
        has_header_row = structure.has_header_row,
        "computed format signature"
    );
    emit_json(None, &report)
}
