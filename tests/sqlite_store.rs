//! SQLite store round-trips and filtering in a temporary database.

use eo_digest::config::Config;
use eo_digest::db;
use eo_digest::migrate;
use eo_digest::models::{BeneficiaryGroup, DocumentDescriptor, ImpactMapping, SummaryRecord};
use eo_digest::sqlite_store::SqliteStore;
use eo_digest::store::{RecordFilter, Store};
use tempfile::TempDir;

async fn open_store(tmp: &TempDir) -> SqliteStore {
    let mut config = Config::default();
    config.db.path = tmp.path().join("data").join("eod.sqlite");
    migrate::run_migrations(&config).await.unwrap();
    SqliteStore::new(db::connect(&config).await.unwrap())
}

fn record(eo_id: &str, date: &str, president: &str) -> SummaryRecord {
    let descriptor = DocumentDescriptor {
        eo_id: eo_id.to_string(),
        title: format!("Order {}", eo_id),
        president: president.to_string(),
        date_issued: date.to_string(),
        html_url: format!("https://example.test/{}", eo_id),
        pdf_url: format!("https://example.test/{}.pdf", eo_id),
    };
    let mut impact = ImpactMapping::new();
    impact.insert(BeneficiaryGroup::Average, "Modest change.".to_string());
    impact.insert(BeneficiaryGroup::Poorest, "Some relief.".to_string());
    impact.insert(BeneficiaryGroup::Richest, "Lower taxes.".to_string());
    SummaryRecord::from_parts(
        &descriptor,
        vec!["First point".to_string(), "Second point".to_string()],
        impact,
        BeneficiaryGroup::Richest,
    )
}

async fn seeded(tmp: &TempDir) -> SqliteStore {
    let store = open_store(tmp).await;
    for r in [
        record("2021-01001", "2021-01-20", "Joe Biden"),
        record("2021-03001", "2021-03-05", "Joe Biden"),
        record("2019-03002", "2019-03-05", "Donald Trump"),
        record("2025-02001", "2025-02-14", "Donald Trump"),
    ] {
        store.save(&r).await.unwrap();
    }
    store
}

fn ids(records: &[SummaryRecord]) -> Vec<&str> {
    records.iter().map(|r| r.eo_id.as_str()).collect()
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.db.path = tmp.path().join("eod.sqlite");
    migrate::run_migrations(&config).await.unwrap();
    migrate::run_migrations(&config).await.unwrap();
}

#[tokio::test]
async fn save_then_get_round_trips() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let original = record("2025-00001", "2025-01-21", "Donald Trump");

    assert!(!store.exists("2025-00001").await.unwrap());
    store.save(&original).await.unwrap();
    assert!(store.exists("2025-00001").await.unwrap());
    assert_eq!(store.get("2025-00001").await.unwrap(), Some(original));
    assert_eq!(store.get("nope").await.unwrap(), None);
}

#[tokio::test]
async fn save_replaces_existing_record() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let mut r = record("2025-00001", "2025-01-21", "Donald Trump");
    store.save(&r).await.unwrap();

    r.summary = vec!["Rewritten".to_string()];
    store.save(&r).await.unwrap();

    let all = store.list(&RecordFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].summary, vec!["Rewritten"]);
}

#[tokio::test]
async fn list_is_newest_first() {
    let tmp = TempDir::new().unwrap();
    let store = seeded(&tmp).await;

    let all = store.list(&RecordFilter::default()).await.unwrap();
    assert_eq!(
        ids(&all),
        vec!["2025-02001", "2021-03001", "2021-01001", "2019-03002"]
    );
}

#[tokio::test]
async fn list_filters_by_president_substring_ignoring_case() {
    let tmp = TempDir::new().unwrap();
    let store = seeded(&tmp).await;

    let filter = RecordFilter {
        president: Some("BIDEN".into()),
        ..RecordFilter::default()
    }
    .normalized();
    let found = store.list(&filter).await.unwrap();
    assert_eq!(ids(&found), vec!["2021-03001", "2021-01001"]);
}

#[tokio::test]
async fn list_filters_by_date_segments() {
    let tmp = TempDir::new().unwrap();
    let store = seeded(&tmp).await;

    let by_year = RecordFilter {
        year: Some("2021".into()),
        ..RecordFilter::default()
    }
    .normalized();
    assert_eq!(
        ids(&store.list(&by_year).await.unwrap()),
        vec!["2021-03001", "2021-01001"]
    );

    // Month without year matches across years; "3" pads to "03".
    let by_month = RecordFilter {
        month: Some("3".into()),
        ..RecordFilter::default()
    }
    .normalized();
    assert_eq!(
        ids(&store.list(&by_month).await.unwrap()),
        vec!["2021-03001", "2019-03002"]
    );

    let by_day = RecordFilter {
        year: Some("2025".into()),
        day: Some("14".into()),
        ..RecordFilter::default()
    }
    .normalized();
    assert_eq!(ids(&store.list(&by_day).await.unwrap()), vec!["2025-02001"]);
}

#[tokio::test]
async fn list_with_no_match_is_empty() {
    let tmp = TempDir::new().unwrap();
    let store = seeded(&tmp).await;

    let filter = RecordFilter {
        president: Some("Lincoln".into()),
        ..RecordFilter::default()
    }
    .normalized();
    assert!(store.list(&filter).await.unwrap().is_empty());
}
