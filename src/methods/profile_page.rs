use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::extract::extract_profile_pic;
use super::traits::{Metadata, RetrievalMethod, Retrieved};
use crate::account::AccountId;
use crate::constants::HTML_ACCEPT;
use crate::error::FetchError;
use crate::http::fetch_text;

/// Scrape the public profile page and pull the avatar out of its markup.
pub struct ProfilePageMethod {
    base_url: String,
}

impl ProfilePageMethod {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RetrievalMethod for ProfilePageMethod {
    fn method_id(&self) -> &'static str {
        "profile_page"
    }

    async fn retrieve(&self, http: &Client, account: &AccountId) -> Result<Retrieved, FetchError> {
        let page_url = format!("{}/{}/", self.base_url, account);
        let html = fetch_text(http.get(&page_url).header("Accept", HTML_ACCEPT)).await?;

        let (url, pattern) = extract_profile_pic(&html)
            .ok_or_else(|| FetchError::parse("no profile picture pattern matched the page"))?;
        debug!(pattern = pattern.as_str(), url = %url, "Extracted profile picture from page");

        let mut metadata = Metadata::new();
        metadata.insert("page_url".to_string(), json!(page_url));
        metadata.insert("pattern".to_string(), json!(pattern.as_str()));

        Ok(Retrieved::SourceUrl { url, metadata })
    }
}
