//! SQLite-backed [`Store`] implementation.
//!
//! One row per record in `summaries`. Scalar fields get their own columns so
//! the read API can filter in SQL; the bullet list and impact mapping are
//! stored as JSON text.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::models::{BeneficiaryGroup, SummaryRecord};
use crate::store::{RecordFilter, Store};

const SELECT_COLUMNS: &str = "SELECT eo_id, title, date_issued, president, html_url, pdf_url, \
     summary_json, impact_json, primary_beneficiary FROM summaries";

/// SQLite implementation of the [`Store`] trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &SqliteRow) -> Result<SummaryRecord> {
    let eo_id: String = row.get("eo_id");
    let summary_json: String = row.get("summary_json");
    let impact_json: String = row.get("impact_json");
    let primary: String = row.get("primary_beneficiary");

    Ok(SummaryRecord {
        summary: serde_json::from_str(&summary_json)
            .with_context(|| format!("corrupt summary for {}", eo_id))?,
        impact: serde_json::from_str(&impact_json)
            .with_context(|| format!("corrupt impact for {}", eo_id))?,
        primary_beneficiary: BeneficiaryGroup::from_key(&primary)
            .ok_or_else(|| anyhow!("unknown primary beneficiary '{}' for {}", primary, eo_id))?,
        title: row.get("title"),
        date_issued: row.get("date_issued"),
        president: row.get("president"),
        html_url: row.get("html_url"),
        pdf_url: row.get("pdf_url"),
        eo_id,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn exists(&self, eo_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM summaries WHERE eo_id = ?")
            .bind(eo_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn get(&self, eo_id: &str) -> Result<Option<SummaryRecord>> {
        let row = sqlx::query(&format!("{} WHERE eo_id = ?", SELECT_COLUMNS))
            .bind(eo_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn save(&self, record: &SummaryRecord) -> Result<()> {
        let summary_json = serde_json::to_string(&record.summary)?;
        let impact_json = serde_json::to_string(&record.impact)?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO summaries (eo_id, title, date_issued, president, html_url, pdf_url,
                                   summary_json, impact_json, primary_beneficiary, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(eo_id) DO UPDATE SET
                title = excluded.title,
                date_issued = excluded.date_issued,
                president = excluded.president,
                html_url = excluded.html_url,
                pdf_url = excluded.pdf_url,
                summary_json = excluded.summary_json,
                impact_json = excluded.impact_json,
                primary_beneficiary = excluded.primary_beneficiary
            "#,
        )
        .bind(&record.eo_id)
        .bind(&record.title)
        .bind(&record.date_issued)
        .bind(&record.president)
        .bind(&record.html_url)
        .bind(&record.pdf_url)
        .bind(&summary_json)
        .bind(&impact_json)
        .bind(record.primary_beneficiary.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<SummaryRecord>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        query.push(" WHERE 1 = 1");

        if let Some(ref president) = filter.president {
            query
                .push(" AND instr(lower(president), ")
                .push_bind(president.to_lowercase())
                .push(") > 0");
        }
        if let Some(ref year) = filter.year {
            query
                .push(" AND substr(date_issued, 1, ")
                .push_bind(year.chars().count() as i64)
                .push(") = ")
                .push_bind(year.clone());
        }
        if let Some(ref month) = filter.month {
            query
                .push(" AND substr(date_issued, 6, 2) = ")
                .push_bind(month.clone());
        }
        if let Some(ref day) = filter.day {
            query
                .push(" AND substr(date_issued, 9, 2) = ")
                .push_bind(day.clone());
        }
        query.push(" ORDER BY date_issued DESC, eo_id ASC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }
}
