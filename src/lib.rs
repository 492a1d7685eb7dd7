//! # News Notes
//!
//! Scrapes article teasers from a news front page into a document store and
//! serves a small REST API for listing them and attaching notes.
//!
//! ## Architecture
//!
//! Leaf-first:
//! 1. **Store** ([`store`]): one long-lived connection, `articles` and `notes` collections
//! 2. **Fetching** ([`scrapers::PageFetcher`]): a single GET of the source page
//! 3. **Extraction** ([`scrapers::Extractor`]): selector-map driven, one record per card
//! 4. **Orchestration** ([`scrape`]): fetch, extract, one independent write per record
//! 5. **API** ([`http`]): axum routes over the store and the scraper

pub mod cli;
pub mod error;
pub mod http;
pub mod models;
pub mod scrape;
pub mod scrapers;
pub mod store;
pub mod utils;
