//! Document store client for the `articles` and `notes` collections.
//!
//! The store is a single long-lived SQLite connection. Articles keep their
//! fixed fields in columns; notes are schema-free and keep their payload as
//! a JSON document. Ids are UUID v4 rendered as 32 hex characters, and any
//! string that does not parse as one is rejected with
//! [`StoreError::InvalidId`] before touching the database.
//!
//! Nothing here enforces uniqueness or referential integrity: the same card
//! scraped twice becomes two articles, and an article may point at a note
//! that no longer exists.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Article, ArticleFilter, ArticleRecord, ArticleWithNote, Note};

type ArticleRow = (String, String, String, String, Option<String>, DateTime<Utc>);
type NoteRow = (String, String, DateTime<Utc>);

const ARTICLE_COLUMNS: &str = "SELECT id, title, image, link, note, created_at FROM articles";

/// Handle to the document store. Cloning shares the underlying connection.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    /// Open the store at `url` and create both collections if missing.
    ///
    /// `sqlite::memory:` gives a private in-memory store, which lives as long
    /// as this handle and its clones.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_collections().await?;
        info!("Document store ready");
        Ok(store)
    }

    async fn ensure_collections(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY NOT NULL,
                title TEXT NOT NULL,
                image TEXT NOT NULL,
                link TEXT NOT NULL,
                note TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY NOT NULL,
                fields TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new article built from `record`.
    #[instrument(level = "debug", skip_all, fields(title = %record.title))]
    pub async fn create_article(&self, record: &ArticleRecord) -> Result<Article, StoreError> {
        let article = Article {
            id: new_id(),
            title: record.title.clone(),
            image: record.image.clone(),
            link: record.link.clone(),
            note: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO articles (id, title, image, link, note, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(article.id.clone())
        .bind(article.title.clone())
        .bind(article.image.clone())
        .bind(article.link.clone())
        .bind(Option::<String>::None)
        .bind(article.created_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %article.id, "Created article");
        Ok(article)
    }

    /// All articles matching `filter`, in insertion order.
    pub async fn find_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>, StoreError> {
        // Note ids are stored in simple form; accept any UUID spelling.
        let note = filter.note.as_deref().map(parse_id).transpose()?;
        let mut query = QueryBuilder::<Sqlite>::new(ARTICLE_COLUMNS);
        let clauses = [
            ("title", &filter.title),
            ("link", &filter.link),
            ("note", &note),
        ];

        let mut first = true;
        for (column, value) in clauses {
            if let Some(value) = value {
                query.push(if first { " WHERE " } else { " AND " });
                query.push(column);
                query.push(" = ");
                query.push_bind(value.clone());
                first = false;
            }
        }
        query.push(" ORDER BY rowid");

        let rows: Vec<ArticleRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(article_from_row).collect())
    }

    pub async fn count_articles(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn find_article(&self, id: &str) -> Result<Option<Article>, StoreError> {
        let id = parse_id(id)?;
        let row: Option<ArticleRow> = sqlx::query_as(&format!("{ARTICLE_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(article_from_row))
    }

    pub async fn find_note(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let id = parse_id(id)?;
        let row: Option<NoteRow> =
            sqlx::query_as("SELECT id, fields, created_at FROM notes WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(note_from_row).transpose()
    }

    /// Look up an article and inline its note.
    ///
    /// A dangling note reference comes back as `note: None`.
    pub async fn find_article_with_note(
        &self,
        id: &str,
    ) -> Result<Option<ArticleWithNote>, StoreError> {
        let Some(mut article) = self.find_article(id).await? else {
            return Ok(None);
        };
        let note = match article.note.take() {
            Some(note_id) => self.find_note(&note_id).await?,
            None => None,
        };
        Ok(Some(ArticleWithNote::join(article, note)))
    }

    /// Insert a note holding `fields`. Reserved keys in the payload are ignored.
    #[instrument(level = "debug", skip_all, fields(field_count = fields.len()))]
    pub async fn create_note(&self, mut fields: Map<String, Value>) -> Result<Note, StoreError> {
        fields.remove("_id");
        fields.remove("created_at");

        let id = new_id();
        let document = serde_json::to_string(&fields).map_err(|source| StoreError::Decode {
            id: id.clone(),
            source,
        })?;
        let created_at = Utc::now();

        sqlx::query("INSERT INTO notes (id, fields, created_at) VALUES (?, ?, ?)")
            .bind(id.clone())
            .bind(document)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        debug!(%id, "Created note");
        Ok(Note {
            id,
            created_at,
            fields,
        })
    }

    /// Point the article at `note_id` and return the updated article.
    ///
    /// Returns `None` when no article has `article_id`; the note is not
    /// checked for existence.
    pub async fn set_article_note(
        &self,
        article_id: &str,
        note_id: &str,
    ) -> Result<Option<Article>, StoreError> {
        let article_id = parse_id(article_id)?;
        let note_id = parse_id(note_id)?;

        let result = sqlx::query("UPDATE articles SET note = ? WHERE id = ?")
            .bind(note_id)
            .bind(article_id.clone())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_article(&article_id).await
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Normalize `raw` to the stored id form, or reject it.
fn parse_id(raw: &str) -> Result<String, StoreError> {
    Uuid::try_parse(raw)
        .map(|id| id.simple().to_string())
        .map_err(|_| StoreError::InvalidId(raw.to_string()))
}

fn article_from_row((id, title, image, link, note, created_at): ArticleRow) -> Article {
    Article {
        id,
        title,
        image,
        link,
        note,
        created_at,
    }
}

fn note_from_row((id, fields, created_at): NoteRow) -> Result<Note, StoreError> {
    let fields = serde_json::from_str(&fields).map_err(|source| StoreError::Decode {
        id: id.clone(),
        source,
    })?;
    Ok(Note {
        id,
        created_at,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_store() -> DocumentStore {
        DocumentStore::connect("sqlite::memory:").await.unwrap()
    }

    fn record(title: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            image: format!("https://img.example.com/{title}.jpg"),
            link: format!("https://example.com/{title}"),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_articles_in_order() {
        let store = memory_store().await;
        for title in ["one", "two", "three"] {
            store.create_article(&record(title)).await.unwrap();
        }

        let articles = store.find_articles(&ArticleFilter::default()).await.unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["one", "two", "three"]);
        assert_eq!(store.count_articles().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_records_are_kept() {
        let store = memory_store().await;
        let first = store.create_article(&record("same")).await.unwrap();
        let second = store.create_article(&record("same")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.count_articles().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_articles_with_filter() {
        let store = memory_store().await;
        store.create_article(&record("alpha")).await.unwrap();
        store.create_article(&record("beta")).await.unwrap();

        let filter = ArticleFilter {
            title: Some("beta".into()),
            ..Default::default()
        };
        let found = store.find_articles(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].link, "https://example.com/beta");
    }

    #[tokio::test]
    async fn test_find_article_missing_is_none() {
        let store = memory_store().await;
        let id = Uuid::new_v4().simple().to_string();
        assert!(store.find_article(&id).await.unwrap().is_none());
        assert!(store.find_article_with_note(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let store = memory_store().await;
        let err = store.find_article("not-an-id").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(ref raw) if raw == "not-an-id"));
    }

    #[tokio::test]
    async fn test_hyphenated_id_is_accepted() {
        let store = memory_store().await;
        let article = store.create_article(&record("x")).await.unwrap();
        let hyphenated = Uuid::try_parse(&article.id).unwrap().hyphenated().to_string();

        let found = store.find_article(&hyphenated).await.unwrap().unwrap();
        assert_eq!(found.id, article.id);
    }

    #[tokio::test]
    async fn test_create_note_strips_reserved_keys() {
        let store = memory_store().await;
        let mut fields = Map::new();
        fields.insert("_id".into(), json!("spoofed"));
        fields.insert("body".into(), json!("remember this"));

        let note = store.create_note(fields).await.unwrap();
        assert_ne!(note.id, "spoofed");
        assert!(!note.fields.contains_key("_id"));

        let stored = store.find_note(&note.id).await.unwrap().unwrap();
        assert_eq!(stored.fields["body"], "remember this");
    }

    #[tokio::test]
    async fn test_set_article_note_and_join() {
        let store = memory_store().await;
        let article = store.create_article(&record("noted")).await.unwrap();
        let mut fields = Map::new();
        fields.insert("text".into(), json!("hello"));
        let note = store.create_note(fields).await.unwrap();

        let updated = store
            .set_article_note(&article.id, &note.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.note.as_deref(), Some(note.id.as_str()));

        let joined = store
            .find_article_with_note(&article.id)
            .await
            .unwrap()
            .unwrap();
        let joined_note = joined.note.unwrap();
        assert_eq!(joined_note.id, note.id);
        assert_eq!(joined_note.fields["text"], "hello");
    }

    #[tokio::test]
    async fn test_set_note_on_missing_article_is_none() {
        let store = memory_store().await;
        let note = store.create_note(Map::new()).await.unwrap();
        let missing = Uuid::new_v4().simple().to_string();

        assert!(store.set_article_note(&missing, &note.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dangling_note_reference_joins_as_none() {
        let store = memory_store().await;
        let article = store.create_article(&record("orphan")).await.unwrap();
        let ghost = Uuid::new_v4().simple().to_string();
        store.set_article_note(&article.id, &ghost).await.unwrap();

        let joined = store
            .find_article_with_note(&article.id)
            .await
            .unwrap()
            .unwrap();
        assert!(joined.note.is_none());
    }

    #[tokio::test]
    async fn test_filter_by_note_accepts_hyphenated_id() {
        let store = memory_store().await;
        let article = store.create_article(&record("annotated")).await.unwrap();
        store.create_article(&record("plain")).await.unwrap();
        let note = store.create_note(Map::new()).await.unwrap();
        store.set_article_note(&article.id, &note.id).await.unwrap();

        let hyphenated = Uuid::try_parse(&note.id).unwrap().hyphenated().to_string();
        for spelling in [note.id.clone(), hyphenated] {
            let filter = ArticleFilter {
                note: Some(spelling),
                ..Default::default()
            };
            let found = store.find_articles(&filter).await.unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].id, article.id);
        }
    }

    #[tokio::test]
    async fn test_filter_by_malformed_note_is_invalid_id() {
        let store = memory_store().await;
        let filter = ArticleFilter {
            note: Some("not-an-id".into()),
            ..Default::default()
        };
        let err = store.find_articles(&filter).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }
}
