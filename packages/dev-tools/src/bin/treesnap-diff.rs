//! Change Diff Tool
//!
//! Diffs two versions of one document and prints the change record as
//! pretty JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin treesnap-diff -- users/alice before.json after.json
//! ```
//!
//! Each file holds one document body in fixture encoding, or `null` for a
//! document that does not exist on that side.

use anyhow::{Context, Result};
use treesnap_core::services::change_diff::build_change_record;
use treesnap_dev_tools::{change_event_from_json, init_tracing, read_json};

const USAGE: &str = "Usage: treesnap-diff <document-path> <before.json> <after.json>";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let document_path = args.next().context(USAGE)?;
    let before = read_json(args.next().context(USAGE)?)?;
    let after = read_json(args.next().context(USAGE)?)?;

    let event = change_event_from_json(&document_path, &before, &after)?;
    tracing::info!("Diffing {} on '{}'", event.event_type(), document_path);

    let record = build_change_record(&event)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
