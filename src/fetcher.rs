//! Listing-API fetcher.
//!
//! Pages through the Federal Register documents endpoint, keeps items of the
//! configured document type, derives the issuing president from the
//! publication date, and returns everything newest-first.
//!
//! Any request or decode failure aborts the whole fetch; no partial result is
//! returned.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::models::DocumentDescriptor;

pub const UNKNOWN_PRESIDENT: &str = "Unknown";

/// Inauguration dates, most recent first. A boundary date belongs to the
/// incoming administration.
const ADMINISTRATIONS: &[((i32, u32, u32), &str)] = &[
    ((2025, 1, 20), "Donald Trump"),
    ((2021, 1, 20), "Joe Biden"),
    ((2017, 1, 20), "Donald Trump"),
    ((2009, 1, 20), "Barack Obama"),
    ((2001, 1, 20), "George W. Bush"),
    ((1993, 1, 20), "Bill Clinton"),
];

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Map an ISO publication date to the president in office.
///
/// Returns [`UNKNOWN_PRESIDENT`] for malformed dates and for dates before the
/// earliest boundary.
pub fn derive_president(date: &str) -> &'static str {
    let Some(date) = parse_date(date) else {
        return UNKNOWN_PRESIDENT;
    };
    ADMINISTRATIONS
        .iter()
        .find(|((y, m, d), _)| NaiveDate::from_ymd_opt(*y, *m, *d).is_some_and(|start| date >= start))
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_PRESIDENT)
}

/// Sort descriptors by issue date, newest first. Unparseable dates sort last.
pub fn sort_newest_first(descriptors: &mut [DocumentDescriptor]) {
    descriptors.sort_by(|a, b| parse_date(&b.date_issued).cmp(&parse_date(&a.date_issued)));
}

#[derive(Debug, Deserialize)]
struct ListingPage {
    #[serde(default)]
    results: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    document_number: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    pdf_url: Option<String>,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default, rename = "type")]
    doc_type: Option<String>,
}

impl ListingItem {
    fn into_descriptor(self) -> DocumentDescriptor {
        let date_issued = self.publication_date.unwrap_or_default();
        DocumentDescriptor {
            eo_id: self.document_number.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            president: derive_president(&date_issued).to_string(),
            date_issued,
            html_url: self.html_url.unwrap_or_default(),
            pdf_url: self.pdf_url.unwrap_or_default(),
        }
    }
}

/// Client for the paginated listing API.
pub struct Fetcher {
    http: reqwest::Client,
    config: SourceConfig,
}

impl Fetcher {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Fetch every matching descriptor, newest first.
    ///
    /// Stops after `max_pages` pages or at the first page with no items of
    /// the configured type.
    pub async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Vec<DocumentDescriptor>> {
        let mut descriptors = Vec::new();

        for page in 1..=self.config.max_pages {
            let listing = tokio::select! {
                biased;
                _ = cancel.cancelled() => bail!("fetch cancelled"),
                listing = self.fetch_page(page) => listing?,
            };

            let before = descriptors.len();
            descriptors.extend(
                listing
                    .results
                    .into_iter()
                    .filter(|item| item.doc_type.as_deref() == Some(self.config.document_type.as_str()))
                    .map(ListingItem::into_descriptor),
            );

            let matched = descriptors.len() - before;
            debug!(page, matched, "listing page fetched");
            if matched == 0 {
                break;
            }
        }

        sort_newest_first(&mut descriptors);
        info!(count = descriptors.len(), "fetched document descriptors");
        Ok(descriptors)
    }

    async fn fetch_page(&self, page: u32) -> Result<ListingPage> {
        let page_str = page.to_string();
        let per_page = self.config.page_size.to_string();
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("conditions[term]", self.config.search_term.as_str()),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
                ("page", page_str.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("listing request failed on page {}", page))?
            .error_for_status()
            .with_context(|| format!("listing request failed on page {}", page))?;

        response
            .json::<ListingPage>()
            .await
            .with_context(|| format!("failed to decode listing page {}", page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_dates_belong_to_incoming_administration() {
        assert_eq!(derive_president("2025-01-20"), "Donald Trump");
        assert_eq!(derive_president("2025-01-19"), "Joe Biden");
        assert_eq!(derive_president("2021-01-20"), "Joe Biden");
        assert_eq!(derive_president("2021-01-19"), "Donald Trump");
        assert_eq!(derive_president("2017-01-20"), "Donald Trump");
        assert_eq!(derive_president("2017-01-19"), "Barack Obama");
        assert_eq!(derive_president("2009-01-20"), "Barack Obama");
        assert_eq!(derive_president("2009-01-19"), "George W. Bush");
        assert_eq!(derive_president("2001-01-20"), "George W. Bush");
        assert_eq!(derive_president("2001-01-19"), "Bill Clinton");
        assert_eq!(derive_president("1993-01-20"), "Bill Clinton");
    }

    #[test]
    fn before_earliest_boundary_is_unknown() {
        assert_eq!(derive_president("1993-01-19"), UNKNOWN_PRESIDENT);
        assert_eq!(derive_president("1980-06-01"), UNKNOWN_PRESIDENT);
    }

    #[test]
    fn malformed_dates_are_unknown() {
        assert_eq!(derive_president(""), UNKNOWN_PRESIDENT);
        assert_eq!(derive_president("2021/01/20"), UNKNOWN_PRESIDENT);
        assert_eq!(derive_president("2021-13-01"), UNKNOWN_PRESIDENT);
        assert_eq!(derive_president("yesterday"), UNKNOWN_PRESIDENT);
    }

    #[test]
    fn sorts_newest_first_with_bad_dates_last() {
        let make = |id: &str, date: &str| DocumentDescriptor {
            eo_id: id.into(),
            title: String::new(),
            president: String::new(),
            date_issued: date.into(),
            html_url: String::new(),
            pdf_url: String::new(),
        };
        let mut items = vec![
            make("a", "2019-05-01"),
            make("b", "garbage"),
            make("c", "2024-12-31"),
            make("d", "2021-01-20"),
        ];
        sort_newest_first(&mut items);
        let ids: Vec<&str> = items.iter().map(|d| d.eo_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn listing_item_tolerates_nulls() {
        let page: ListingPage = serde_json::from_str(
            r#"{"results":[{"title":"T","document_number":"2020-1","html_url":null,"pdf_url":null,"publication_date":"2020-03-01","type":"Presidential Document"}]}"#,
        )
        .unwrap();
        let item = page.results.into_iter().next().unwrap().into_descriptor();
        assert_eq!(item.eo_id, "2020-1");
        assert_eq!(item.president, "Donald Trump");
        assert_eq!(item.pdf_url, "");
    }
}
