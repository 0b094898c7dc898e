//! Third-party Instagram viewer sites.
//!
//! Each mirror is a separate scrape with its own markup pattern. Some services
//! answer with the image itself instead of a page; those are `Direct` mirrors.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::extract::unescape_url;
use super::traits::{Metadata, RetrievalMethod, Retrieved};
use crate::account::AccountId;
use crate::constants::HTML_ACCEPT;
use crate::error::FetchError;
use crate::http::{fetch_bytes, fetch_text};

enum MirrorKind {
    /// Fetch an HTML page and pull the avatar URL out with a regex (capture group 1).
    Scrape(Regex),
    /// The URL itself serves the image bytes.
    Direct,
}

/// A mirror service addressed through a `{username}` URL template.
pub struct MirrorMethod {
    id: &'static str,
    url_template: String,
    kind: MirrorKind,
}

impl MirrorMethod {
    /// Mirror whose page contains the avatar URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regex.
    pub fn scrape(
        id: &'static str,
        url_template: &str,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            id,
            url_template: url_template.to_string(),
            kind: MirrorKind::Scrape(Regex::new(pattern)?),
        })
    }

    /// Mirror that serves the picture directly.
    #[must_use]
    pub fn direct(id: &'static str, url_template: &str) -> Self {
        Self {
            id,
            url_template: url_template.to_string(),
            kind: MirrorKind::Direct,
        }
    }

    fn url_for(&self, account: &AccountId) -> String {
        self.url_template
            .replace("{username}", &urlencoding::encode(account.as_str()))
    }
}

/// The built-in mirror list, in the order they are tried.
#[must_use]
pub fn default_mirrors() -> Vec<MirrorMethod> {
    let mut mirrors = Vec::new();
    let scraped = [
        (
            "mirror_picuki",
            "https://www.picuki.com/profile/{username}",
            r#"(?s)<div class="profile-avatar">\s*<img[^>]+src="([^"]+)""#,
        ),
        (
            "mirror_imginn",
            "https://imginn.com/{username}/",
            r#"(?s)<div class="img">\s*<img[^>]+src="([^"]+)""#,
        ),
    ];
    for (id, template, pattern) in scraped {
        match MirrorMethod::scrape(id, template, pattern) {
            Ok(mirror) => mirrors.push(mirror),
            Err(e) => tracing::error!(mirror = id, error = %e, "Invalid built-in mirror pattern"),
        }
    }
    mirrors.push(MirrorMethod::direct(
        "mirror_unavatar",
        "https://unavatar.io/instagram/{username}?fallback=false",
    ));
    mirrors
}

#[async_trait]
impl RetrievalMethod for MirrorMethod {
    fn method_id(&self) -> &'static str {
        self.id
    }

    async fn retrieve(&self, http: &Client, account: &AccountId) -> Result<Retrieved, FetchError> {
        let page_url = self.url_for(account);
        let mut metadata = Metadata::new();
        metadata.insert("mirror_url".to_string(), json!(page_url));

        match &self.kind {
            MirrorKind::Direct => {
                let (bytes, final_url) = fetch_bytes(http.get(&page_url)).await?;
                Ok(Retrieved::Bytes {
                    bytes,
                    source_url: final_url,
                    metadata,
                })
            }
            MirrorKind::Scrape(pattern) => {
                let html = fetch_text(http.get(&page_url).header("Accept", HTML_ACCEPT)).await?;
                let raw = pattern
                    .captures(&html)
                    .and_then(|caps| caps.get(1))
                    .map(|m| unescape_url(m.as_str()))
                    .ok_or_else(|| FetchError::parse("avatar pattern not found on mirror page"))?;
                let url = absolutize(&page_url, &raw)?;
                debug!(mirror = self.id, url = %url, "Extracted profile picture from mirror");
                Ok(Retrieved::SourceUrl { url, metadata })
            }
        }
    }
}

/// Resolve a possibly relative (or protocol-relative) URL against the page it came from.
fn absolutize(page_url: &str, found: &str) -> Result<String, FetchError> {
    let base = Url::parse(page_url)
        .map_err(|e| FetchError::parse(format!("invalid mirror URL {page_url}: {e}")))?;
    base.join(found)
        .map(|u| u.to_string())
        .map_err(|e| FetchError::parse(format!("invalid avatar URL {found}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_template() {
        let mirror = MirrorMethod::direct("m", "https://mirror.example/{username}/avatar");
        let account = AccountId::parse("some.user").unwrap();
        assert_eq!(mirror.url_for(&account), "https://mirror.example/some.user/avatar");
    }

    #[test]
    fn test_default_patterns_compile_and_match() {
        let mirrors = default_mirrors();
        assert_eq!(mirrors.len(), 3);

        let picuki_html = r#"<div class="profile-avatar">
            <img src="https://cdn.picuki.example/avatar.jpg" alt="someone">
        </div>"#;
        let MirrorKind::Scrape(ref pattern) = mirrors[0].kind else {
            panic!("picuki should be a scraped mirror");
        };
        assert_eq!(
            &pattern.captures(picuki_html).unwrap()[1],
            "https://cdn.picuki.example/avatar.jpg"
        );
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("https://mirror.example/profile/x", "/img/a.jpg").unwrap(),
            "https://mirror.example/img/a.jpg"
        );
        assert_eq!(
            absolutize("https://mirror.example/profile/x", "//cdn.example/a.jpg").unwrap(),
            "https://cdn.example/a.jpg"
        );
        assert_eq!(
            absolutize("https://mirror.example/", "https://cdn.example/a.jpg").unwrap(),
            "https://cdn.example/a.jpg"
        );
    }
}
