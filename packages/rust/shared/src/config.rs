//! Server configuration, read from `READSTACK_*` environment variables.
//!
//! The daemon is configured entirely through the environment; there is no
//! config file. Required variables fail fast at startup with a
//! [`ReadstackError::Config`].

use std::path::PathBuf;

use crate::error::{ReadstackError, Result};

/// Required: bearer token accepted by the ingest endpoints.
const ENV_INGEST_TOKEN: &str = "READSTACK_INGEST_TOKEN";
/// Optional: HTTP listen address.
const ENV_HTTP_ADDR: &str = "READSTACK_HTTP_ADDR";
/// Optional: path of the libSQL database file.
const ENV_DATABASE_PATH: &str = "READSTACK_DATABASE_PATH";
/// Required: upload endpoint of the static pages host.
const ENV_PAGES_ENDPOINT: &str = "READSTACK_PAGES_ENDPOINT";
/// Required: `user:password` credentials for the pages host.
const ENV_PAGES_AUTH: &str = "READSTACK_PAGES_AUTH";
/// Required: site slug under which the bundle is published.
const ENV_SITE_SLUG: &str = "READSTACK_SITE_SLUG";

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:9231";
const DEFAULT_DATABASE_PATH: &str = "readstack.sqlite3.db";

/// Settings for publishing the rendered site to the pages host.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Full URL of the bundle upload endpoint.
    pub endpoint: String,
    /// Basic-auth credentials in `user:password` form.
    pub auth: String,
    /// Site slug sent alongside the bundle.
    pub site_slug: String,
}

/// Top-level daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub http_addr: String,
    /// Token required on ingest and regenerate endpoints.
    pub ingest_token: String,
    /// Location of the article database.
    pub database_path: PathBuf,
    /// Publish settings.
    pub publish: PublishConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Kept separate from [`Config::from_env`] so tests can supply variables
    /// without mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            http_addr: optional(&lookup, ENV_HTTP_ADDR, DEFAULT_HTTP_ADDR),
            ingest_token: required(&lookup, ENV_INGEST_TOKEN)?,
            database_path: PathBuf::from(optional(
                &lookup,
                ENV_DATABASE_PATH,
                DEFAULT_DATABASE_PATH,
            )),
            publish: PublishConfig {
                endpoint: required(&lookup, ENV_PAGES_ENDPOINT)?,
                auth: required(&lookup, ENV_PAGES_AUTH)?,
                site_slug: required(&lookup, ENV_SITE_SLUG)?,
            },
        })
    }
}

fn required(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ReadstackError::config(format!("{name} not set")))
}

fn optional(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}
