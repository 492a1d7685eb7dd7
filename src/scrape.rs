//! Scrape orchestration: fetch the listing page, extract cards, store articles.
//!
//! Every extracted record is written with its own independent create. A
//! failed write is logged and never affects its siblings.
//!
//! Two ways to run:
//! - [`Scraper::spawn_run`] issues the writes as detached tasks and returns
//!   as soon as they are issued, so callers do not see the final outcome.
//! - [`Scraper::run`] issues the same writes concurrently, waits for all of
//!   them, and reports per-record outcomes as a [`ScrapeReport`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{error, info, instrument};
use url::Url;

use crate::error::{FetchError, StoreError};
use crate::models::{Article, ArticleRecord, ScrapeReport};
use crate::scrapers::{Extractor, PageFetcher};
use crate::store::DocumentStore;
use crate::utils::truncate_for_log;

/// Destination for scraped records.
#[async_trait]
pub trait ArticleSink: Send + Sync {
    async fn create_article(&self, record: &ArticleRecord) -> Result<Article, StoreError>;
}

#[async_trait]
impl ArticleSink for DocumentStore {
    async fn create_article(&self, record: &ArticleRecord) -> Result<Article, StoreError> {
        DocumentStore::create_article(self, record).await
    }
}

/// Fetcher, extractor, and store wired together for one source page.
#[derive(Clone)]
pub struct Scraper {
    fetcher: PageFetcher,
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn ArticleSink>,
    source_url: Url,
}

impl Scraper {
    pub fn new(
        fetcher: PageFetcher,
        extractor: Arc<dyn Extractor>,
        store: impl ArticleSink + 'static,
        source_url: Url,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            store: Arc::new(store),
            source_url,
        }
    }

    pub fn source_url(&self) -> &Url {
        &self.source_url
    }

    /// Download the source page and extract its cards.
    #[instrument(level = "info", skip(self), fields(source = %self.source_url))]
    pub async fn fetch_records(&self) -> Result<Vec<ArticleRecord>, FetchError> {
        let html = self.fetcher.fetch(self.source_url.as_str()).await?;
        let records = self.extractor.extract(&html, &self.source_url);
        info!(count = records.len(), "Extracted article records");
        Ok(records)
    }

    /// Fetch, extract, and spawn one create per record without waiting.
    ///
    /// Returns how many creates were issued.
    #[instrument(level = "info", skip(self), fields(source = %self.source_url))]
    pub async fn spawn_run(&self) -> Result<usize, FetchError> {
        let records = self.fetch_records().await?;
        let issued = records.len();

        for (index, record) in records.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                match store.create_article(&record).await {
                    Ok(article) => info!(
                        index,
                        id = %article.id,
                        title = %truncate_for_log(&article.title, 80),
                        "Saved article"
                    ),
                    Err(e) => error!(index, link = %record.link, error = %e, "Failed to save article"),
                }
            });
        }

        info!(issued, "Issued article writes");
        Ok(issued)
    }

    /// Fetch, extract, and create every record, waiting for all writes.
    #[instrument(level = "info", skip(self), fields(source = %self.source_url))]
    pub async fn run(&self) -> Result<ScrapeReport, FetchError> {
        let records = self.fetch_records().await?;
        let found = records.len();

        let outcomes = join_all(records.iter().enumerate().map(|(index, record)| {
            let store = self.store.as_ref();
            async move {
                let outcome = store.create_article(record).await;
                if let Err(e) = &outcome {
                    error!(index, link = %record.link, error = %e, "Failed to save article");
                }
                outcome.ok()
            }
        }))
        .await;

        let articles: Vec<_> = outcomes.into_iter().flatten().collect();
        let saved = articles.len();
        let failed = found - saved;
        info!(found, saved, failed, "Scrape complete");

        Ok(ScrapeReport {
            source: self.source_url.to_string(),
            found,
            saved,
            failed,
            articles,
        })
    }
}
