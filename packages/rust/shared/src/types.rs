//! Core domain types for the reading list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ArticleId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for article identifiers (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub Uuid);

impl ArticleId {
    /// Generate a new time-sortable article identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ArticleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ArticleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// NewArticle
// ---------------------------------------------------------------------------

/// A submitted article, as handed to the ingestion worker.
///
/// The URL is still raw at this point; normalization happens inside the
/// worker before enrichment and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    /// Raw article URL as submitted.
    pub url: String,
    /// Article title.
    pub title: String,
    /// Free-text description; may be empty.
    #[serde(default)]
    pub description: String,
    /// Preview image URL; may be empty.
    #[serde(default)]
    pub image_url: String,
    /// When the article was read/submitted.
    pub date: DateTime<Utc>,
    /// Marked as a favourite at submission time.
    #[serde(default)]
    pub is_favourite: bool,
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// A persisted article. Created only by the ingestion worker after
/// normalization and enrichment; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier, generated at persist time.
    pub id: ArticleId,
    /// Normalized (fragment-stripped) article URL.
    pub url: String,
    /// Article title.
    pub title: String,
    /// Description, truncated by the worker when over-long.
    pub description: String,
    /// Preview image URL; may be empty.
    pub image_url: String,
    /// When the article was read/submitted.
    pub date: DateTime<Utc>,
    /// Link to the matching Hacker News discussion, when one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussion_url: Option<String>,
    /// Favourite flag.
    pub is_favourite: bool,
}

// ---------------------------------------------------------------------------
// SiteBundle
// ---------------------------------------------------------------------------

/// A single named file inside a publishable site bundle.
#[derive(Debug, Clone)]
pub struct BundleFile {
    /// Path of the file within the published site (e.g. `index.html`).
    pub path: String,
    /// Raw file content.
    pub content: Vec<u8>,
}

/// The publish artifact: a set of in-memory files produced by the site
/// builder and shipped by the uploader. The pipeline core passes this from
/// build to upload without inspecting it.
#[derive(Debug, Clone, Default)]
pub struct SiteBundle {
    /// Files making up the site.
    pub files: Vec<BundleFile>,
}

impl SiteBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file to the bundle.
    pub fn add_file(&mut self, path: impl Into<String>, content: Vec<u8>) {
        self.files.push(BundleFile {
            path: path.into(),
            content,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_id_roundtrip() {
        let id = ArticleId::new();
        let s = id.to_string();
        let parsed: ArticleId = s.parse().expect("parse ArticleId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn new_article_deserializes_with_defaults() {
        let article: NewArticle = serde_json::from_str(
            r#"{"url": "https://example.com", "title": "A title", "date": "2026-08-24T10:00:00Z"}"#,
        )
        .expect("deserialize NewArticle");
        assert_eq!(article.description, "");
        assert_eq!(article.image_url, "");
        assert!(!article.is_favourite);
    }

    #[test]
    fn article_serializes_without_empty_discussion() {
        let article = Article {
            id: ArticleId::new(),
            url: "https://example.com/".into(),
            title: "A title".into(),
            description: String::new(),
            image_url: String::new(),
            date: Utc::now(),
            discussion_url: None,
            is_favourite: false,
        };
        let json = serde_json::to_string(&article).expect("serialize Article");
        assert!(!json.contains("discussion_url"));
    }
}
