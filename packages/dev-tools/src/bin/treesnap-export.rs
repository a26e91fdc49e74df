//! Fixture Export Tool
//!
//! Loads a JSON fixture into an in-memory store and prints the tree exported
//! from a root path as pretty JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin treesnap-export -- fixture.json users
//! cargo run --bin treesnap-export -- fixture.json users/alice
//!
//! # Root path from the environment
//! TREESNAP_ROOT_PATH=users cargo run --bin treesnap-export -- fixture.json
//! ```
//!
//! `TREESNAP_MAX_DEPTH` and `TREESNAP_MAX_CONCURRENT_FETCHES` bound the walk.

use anyhow::{Context, Result};
use std::sync::Arc;
use treesnap_core::db::MemoryStore;
use treesnap_core::services::{BackupConfig, BackupService};
use treesnap_dev_tools::{init_tracing, read_json};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let fixture_path = args
        .next()
        .context("Usage: treesnap-export <fixture.json> [root-path]")?;
    let root_path = args.next();

    let fixture = read_json(&fixture_path)?;
    let store = Arc::new(MemoryStore::from_fixture(&fixture).await?);
    tracing::info!(
        "Loaded {} documents from {}",
        store.document_count().await,
        fixture_path
    );

    let config = BackupConfig::from_env()?;
    let service = BackupService::with_config(store, config)?;
    let tree = service.start(root_path.as_deref()).await?;

    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
