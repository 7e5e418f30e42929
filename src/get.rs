//! Record lookup by identifier for the `eod get` command.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::models::SummaryRecord;
use crate::sqlite_store::SqliteStore;
use crate::store::Store;

/// Load one stored record from the configured database.
pub async fn get_record(config: &Config, eo_id: &str) -> Result<Option<SummaryRecord>> {
    let pool = db::connect(config).await?;
    let record = SqliteStore::new(pool.clone()).get(eo_id).await;
    pool.close().await;
    record
}

/// CLI entry point: print the record as pretty JSON, exit 1 if absent.
pub async fn run_get(config: &Config, eo_id: &str) -> Result<()> {
    let record = match get_record(config, eo_id).await? {
        Some(r) => r,
        None => {
            eprintln!("Error: executive order not found: {}", eo_id);
            std::process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
