//! Saving links shared from other applications.
//!
//! Share targets hand over a `url` and/or free `text` field. Some platforms
//! put the URL inside the text, so the first `http(s)://` run is extracted.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::metadata::MetadataFetcher;
use crate::{Link, LinkService, NewLink};

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid URL pattern"));

/// Finds the URL to save from shared parameters.
///
/// The `url` parameter wins when present and non-empty; otherwise `text` is
/// searched.
///
/// # Examples
///
/// ```
/// use shelf::share::extract_shared_url;
///
/// let url = extract_shared_url(None, Some("Look at this https://example.com/a cool"));
/// assert_eq!(url.as_deref(), Some("https://example.com/a"));
/// ```
pub fn extract_shared_url(url: Option<&str>, text: Option<&str>) -> Option<String> {
    let candidate = url
        .filter(|u| !u.trim().is_empty())
        .or(text)
        .filter(|t| !t.trim().is_empty())?;

    URL_PATTERN
        .find(candidate)
        .map(|m| m.as_str().to_string())
}

/// Outcome of processing a shared link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The link was fetched and saved.
    Saved(Link),
    /// A link with this URL already exists; nothing was fetched.
    AlreadySaved(Link),
    /// The shared payload contained no URL.
    NoUrl,
}

/// Saves a shared link, fetching its metadata first.
///
/// Already-saved URLs are detected before the AI is called.
pub fn process_shared_link(
    service: &LinkService,
    fetcher: &MetadataFetcher,
    url: Option<&str>,
    text: Option<&str>,
) -> Result<ShareOutcome> {
    let Some(url) = extract_shared_url(url, text) else {
        return Ok(ShareOutcome::NoUrl);
    };

    if let Some(existing) = service.find_by_url(&url)? {
        tracing::info!(url = %url, "shared link already exists");
        return Ok(ShareOutcome::AlreadySaved(existing));
    }

    let metadata = fetcher.fetch_link_metadata(&url);
    match service.add_link(NewLink::new(url.as_str(), metadata))? {
        Some(link) => Ok(ShareOutcome::Saved(link)),
        None => {
            // Saved by someone else between the check and the insert.
            let existing = service
                .find_by_url(&url)?
                .ok_or_else(|| anyhow::anyhow!("link {url} vanished after duplicate check"))?;
            Ok(ShareOutcome::AlreadySaved(existing))
        }
    }
}
