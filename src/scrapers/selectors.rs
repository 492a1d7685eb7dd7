//! Declarative selector maps and the extractor that runs them.
//!
//! A [`SelectorMap`] names a card selector and, per field, a chain of
//! selectors that are matched against *direct children* one level at a
//! time, starting from the card. This mirrors how the listing markup nests
//! and keeps a stray match deeper in the card from leaking into a field.
//!
//! Maps can be written in YAML:
//!
//! ```yaml
//! card: ".card--left"
//! title:
//!   path: [".card__content", ".card__details", ".card__headlines",
//!          ".card__headline", "a", ".card__headline__text"]
//! image:
//!   path: [".card__content", ".card__image__wrapper", ".card__image", "img"]
//!   attr: src
//! link:
//!   path: [".card__content", ".card__details", ".card__headlines",
//!          ".card__headline", "a"]
//!   attr: href
//! ```
//!
//! A field without `attr` reads the concatenated text of every element the
//! chain reaches; a field with `attr` reads that attribute from the first
//! element reached.

use std::path::Path;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::SelectorError;
use crate::models::ArticleRecord;
use crate::scrapers::Extractor;
use crate::utils::{normalize_whitespace, resolve_url};

/// Where one field lives inside a card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldSpec {
    /// Child selectors, applied one level at a time from the card.
    pub path: Vec<String>,
    /// Attribute to read; `None` reads text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

impl FieldSpec {
    pub fn text<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            attr: None,
        }
    }

    pub fn attr<I, S>(path: I, attr: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            attr: Some(attr.to_string()),
        }
    }
}

/// Card selector plus one [`FieldSpec`] per record field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectorMap {
    pub card: String,
    pub title: FieldSpec,
    pub image: FieldSpec,
    pub link: FieldSpec,
}

impl SelectorMap {
    pub fn from_yaml(yaml: &str) -> Result<Self, SelectorError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SelectorError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        let map = Self::from_yaml(&yaml)?;
        info!(card = %map.card, "Loaded selector map");
        Ok(map)
    }
}

#[derive(Debug, Clone)]
enum Read {
    Text,
    Attr(String),
}

#[derive(Debug, Clone)]
struct CompiledField {
    path: Vec<Selector>,
    read: Read,
}

impl CompiledField {
    fn compile(spec: &FieldSpec) -> Result<Self, SelectorError> {
        let path = spec
            .path
            .iter()
            .map(|s| compile_selector(s))
            .collect::<Result<Vec<_>, _>>()?;
        let read = match &spec.attr {
            Some(name) => Read::Attr(name.clone()),
            None => Read::Text,
        };
        Ok(Self { path, read })
    }

    /// Follow the child chain from `card`, keeping every match at each level.
    fn reach<'a>(&self, card: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let mut current = vec![card];
        for step in &self.path {
            let mut next = Vec::new();
            for node in &current {
                for child in node.children().filter_map(ElementRef::wrap) {
                    if step.matches(&child) {
                        next.push(child);
                    }
                }
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }

    fn read(&self, card: ElementRef<'_>) -> String {
        let reached = self.reach(card);
        match &self.read {
            Read::Text => reached
                .iter()
                .flat_map(|el| el.text())
                .collect::<String>(),
            Read::Attr(name) => reached
                .first()
                .and_then(|el| el.value().attr(name))
                .unwrap_or_default()
                .to_string(),
        }
    }
}

fn compile_selector(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError::Invalid {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// [`Extractor`] backed by a compiled [`SelectorMap`].
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    card: Selector,
    title: CompiledField,
    image: CompiledField,
    link: CompiledField,
}

impl SelectorExtractor {
    /// Compile every selector in `map` up front.
    pub fn new(map: &SelectorMap) -> Result<Self, SelectorError> {
        Ok(Self {
            card: compile_selector(&map.card)?,
            title: CompiledField::compile(&map.title)?,
            image: CompiledField::compile(&map.image)?,
            link: CompiledField::compile(&map.link)?,
        })
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, html: &str, page_url: &Url) -> Vec<ArticleRecord> {
        let document = Html::parse_document(html);
        let records: Vec<ArticleRecord> = document
            .select(&self.card)
            .map(|card| ArticleRecord {
                title: normalize_whitespace(&self.title.read(card)),
                image: resolve_url(page_url, &self.image.read(card)),
                link: resolve_url(page_url, &self.link.read(card)),
            })
            .collect();

        debug!(count = records.len(), %page_url, "Extracted cards");
        records
    }
}
