use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the summaries table and its indexes. Safe to run repeatedly.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS summaries (
            eo_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            date_issued TEXT NOT NULL,
            president TEXT NOT NULL,
            html_url TEXT NOT NULL,
            pdf_url TEXT NOT NULL,
            summary_json TEXT NOT NULL,
            impact_json TEXT NOT NULL,
            primary_beneficiary TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_summaries_date_issued ON summaries(date_issued DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_summaries_president ON summaries(president)")
        .execute(pool)
        .await?;

    Ok(())
}
