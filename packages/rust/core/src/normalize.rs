//! URL normalization applied before lookup and storage.

use url::Url;

use readstack_shared::{ReadstackError, Result};

/// Parse `raw` and strip any fragment component, returning the canonical
/// string form.
///
/// Fragments identify positions within a page; without stripping them the
/// same article could be stored under several distinct URLs.
pub fn normalize_url(raw: &str) -> Result<String> {
    let mut parsed = Url::parse(raw).map_err(|_| ReadstackError::invalid_url(raw))?;
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}
