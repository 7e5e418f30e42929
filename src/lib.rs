//! # EO Digest
//!
//! Ingests U.S. executive orders from the Federal Register, turns each one
//! into a plain-English bullet summary with a per-group impact assessment,
//! and stores the result for a read-only JSON API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────────┐   ┌─────────┐
//! │ Fetcher  │──▶│ Pipeline (N workers)          │──▶│ SQLite  │
//! │ listing  │   │ dedupe → extract → chunk →    │   │ summaries│
//! │ API      │   │ summarize → impact → validate │   └────┬────┘
//! └──────────┘   └──────────────────────────────┘        │
//!                                            ┌───────────┤
//!                                            ▼           ▼
//!                                       ┌────────┐  ┌────────┐
//!                                       │  CLI   │  │  HTTP  │
//!                                       │ (eod)  │  │  API   │
//!                                       └────────┘  └────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`fetcher`] | Listing API client and authorship table |
//! | [`extract`] | PDF download and text extraction |
//! | [`chunk`] | Text chunking |
//! | [`generation`] | Text-generation service client |
//! | [`summarize`] | Chunk summaries, merge, impact assessment |
//! | [`beneficiary`] | Primary beneficiary inference |
//! | [`validate`] | Record completeness check |
//! | [`store`] | Store trait, filters, in-memory store |
//! | [`sqlite_store`] | SQLite store |
//! | [`pipeline`] | Worker pool orchestrator |
//! | [`ingest`] | `eod ingest` wiring |
//! | [`server`] | Read-side HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod beneficiary;
pub mod chunk;
pub mod config;
pub mod db;
pub mod extract;
pub mod fetcher;
pub mod generation;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod sqlite_store;
pub mod store;
pub mod summarize;
pub mod validate;
