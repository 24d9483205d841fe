//! Shared types, error model, and configuration for readstack.
//!
//! This crate is the foundation depended on by all other readstack crates.
//! It provides:
//! - [`ReadstackError`], the unified error type
//! - Domain types ([`NewArticle`], [`Article`], [`ArticleId`], [`SiteBundle`])
//! - Configuration ([`Config`], loaded from the environment)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{Config, PublishConfig};
pub use error::{ReadstackError, Result};
pub use types::{Article, ArticleId, BundleFile, NewArticle, SiteBundle};
