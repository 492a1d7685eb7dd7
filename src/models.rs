//! Data models for scraped articles and the notes attached to them.
//!
//! This module defines the documents stored in the two collections:
//! - [`ArticleRecord`]: One card as extracted from the listing page, not yet stored
//! - [`Article`]: A stored article, optionally referencing a note
//! - [`Note`]: A free-form note document
//! - [`ArticleWithNote`]: An article with its referenced note joined in
//!
//! Identifiers serialize as `_id` to keep the document-store shape clients
//! of the API expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single card pulled off the listing page.
///
/// Fields are empty strings when the card lacks the corresponding node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// The headline text.
    pub title: String,
    /// The teaser image URL.
    pub image: String,
    /// The article URL.
    pub link: String,
}

/// An article as stored in the `articles` collection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub image: String,
    pub link: String,
    /// Id of the attached note, if any.
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A note as stored in the `notes` collection.
///
/// Notes carry whatever fields the request payload supplied.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// An article with its note reference resolved.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleWithNote {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub image: String,
    pub link: String,
    /// The full note, or `None` when unset or when the referenced note is gone.
    pub note: Option<Note>,
    pub created_at: DateTime<Utc>,
}

impl ArticleWithNote {
    pub fn join(article: Article, note: Option<Note>) -> Self {
        Self {
            id: article.id,
            title: article.title,
            image: article.image,
            link: article.link,
            note,
            created_at: article.created_at,
        }
    }
}

/// Equality filter over article fields; an empty filter matches everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    pub title: Option<String>,
    pub link: Option<String>,
    pub note: Option<String>,
}

impl ArticleFilter {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.link.is_none() && self.note.is_none()
    }
}

/// Outcome of an awaited scrape run.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    /// The page that was scraped.
    pub source: String,
    /// Number of cards extracted from the page.
    pub found: usize,
    /// Number of articles written.
    pub saved: usize,
    /// Number of writes that failed.
    pub failed: usize,
    /// The articles that were written, in extraction order.
    pub articles: Vec<Article>,
}
