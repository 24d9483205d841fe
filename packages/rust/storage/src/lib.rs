//! libSQL storage layer for the reading list.
//!
//! The [`Storage`] struct wraps a local libSQL database holding the article
//! table. All writes go through the single ingestion worker; HTTP handlers
//! only read.

mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use libsql::{Connection, Database, params};

use readstack_core::ArticleStore;
use readstack_shared::{Article, ReadstackError, Result};

const ARTICLE_COLUMNS: &str =
    "id, url, title, description, image_url, date, discussion_url, is_favourite";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ReadstackError::Storage(format!("create {}: {e}", parent.display()))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Apply migrations newer than the recorded schema version.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    ReadstackError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 before any migration has been applied.
    async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Insert a new article.
    pub async fn insert_article(&self, article: &Article) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO articles (id, url, title, description, image_url, date, discussion_url, is_favourite)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    article.id.to_string(),
                    article.url.as_str(),
                    article.title.as_str(),
                    article.description.as_str(),
                    article.image_url.as_str(),
                    article.date.to_rfc3339(),
                    article.discussion_url.as_deref(),
                    article.is_favourite as i64,
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Fetch every article, oldest first.
    pub async fn get_all_articles(&self) -> Result<Vec<Article>> {
        let rows = self
            .conn
            .query(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY date ASC"),
                params![],
            )
            .await
            .map_err(storage_err)?;
        collect_articles(rows).await
    }

    /// Fetch the articles read within one calendar month, oldest first.
    pub async fn get_articles_for_month(&self, year: i32, month: u32) -> Result<Vec<Article>> {
        let start = month_start(year, month)?;
        let end = if month == 12 {
            month_start(year + 1, 1)?
        } else {
            month_start(year, month + 1)?
        };

        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {ARTICLE_COLUMNS} FROM articles
                     WHERE date >= ?1 AND date < ?2 ORDER BY date ASC"
                ),
                params![start.to_rfc3339(), end.to_rfc3339()],
            )
            .await
            .map_err(storage_err)?;
        collect_articles(rows).await
    }
}

#[async_trait]
impl ArticleStore for Storage {
    async fn insert(&self, article: &Article) -> Result<()> {
        self.insert_article(article).await
    }

    async fn get_all(&self) -> Result<Vec<Article>> {
        self.get_all_articles().await
    }
}

fn storage_err(err: impl std::fmt::Display) -> ReadstackError {
    ReadstackError::Storage(err.to_string())
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| ReadstackError::validation(format!("invalid year/month: {year}-{month}")))
}

async fn collect_articles(mut rows: libsql::Rows) -> Result<Vec<Article>> {
    let mut articles = Vec::new();
    while let Some(row) = rows.next().await.map_err(storage_err)? {
        articles.push(article_from_row(&row)?);
    }
    Ok(articles)
}

fn article_from_row(row: &libsql::Row) -> Result<Article> {
    let id: String = row.get(0).map_err(storage_err)?;
    let date: String = row.get(5).map_err(storage_err)?;

    Ok(Article {
        id: id.parse().map_err(storage_err)?,
        url: row.get(1).map_err(storage_err)?,
        title: row.get(2).map_err(storage_err)?,
        description: row.get(3).map_err(storage_err)?,
        image_url: row.get(4).map_err(storage_err)?,
        date: DateTime::parse_from_rfc3339(&date)
            .map_err(storage_err)?
            .with_timezone(&Utc),
        discussion_url: row.get::<Option<String>>(6).map_err(storage_err)?,
        is_favourite: row.get::<i64>(7).map_err(storage_err)? != 0,
    })
}
