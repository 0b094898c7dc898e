use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::extract::unescape_url;
use super::traits::{Metadata, RetrievalMethod, Retrieved};
use crate::account::AccountId;
use crate::constants::INSTAGRAM_WEB_APP_ID;
use crate::error::FetchError;
use crate::http::fetch_text;

/// Instagram's `web_profile_info` endpoint, as used by the web client.
pub struct PublicApiMethod {
    base_url: String,
}

impl PublicApiMethod {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebProfileResponse {
    data: Option<WebProfileData>,
}

#[derive(Debug, Deserialize)]
struct WebProfileData {
    user: Option<WebProfileUser>,
}

#[derive(Debug, Deserialize)]
struct WebProfileUser {
    id: Option<String>,
    username: Option<String>,
    full_name: Option<String>,
    is_private: Option<bool>,
    is_verified: Option<bool>,
    profile_pic_url: Option<String>,
    profile_pic_url_hd: Option<String>,
}

#[async_trait]
impl RetrievalMethod for PublicApiMethod {
    fn method_id(&self) -> &'static str {
        "public_api"
    }

    async fn retrieve(&self, http: &Client, account: &AccountId) -> Result<Retrieved, FetchError> {
        let url = format!(
            "{}/api/v1/users/web_profile_info/?username={}",
            self.base_url,
            urlencoding::encode(account.as_str())
        );
        debug!(url = %url, "Querying web_profile_info");

        let body = fetch_text(
            http.get(&url)
                .header("x-ig-app-id", INSTAGRAM_WEB_APP_ID)
                .header("Accept", "application/json"),
        )
        .await?;

        let response: WebProfileResponse = serde_json::from_str(&body)?;
        let user = response
            .data
            .and_then(|d| d.user)
            .ok_or_else(|| FetchError::parse("response has no data.user object"))?;

        let pic = user
            .profile_pic_url_hd
            .as_deref()
            .or(user.profile_pic_url.as_deref())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| FetchError::parse("user has no profile_pic_url"))?;

        let mut metadata = Metadata::new();
        if let Some(id) = user.id {
            metadata.insert("id".to_string(), json!(id));
        }
        if let Some(username) = user.username {
            metadata.insert("username".to_string(), json!(username));
        }
        if let Some(full_name) = user.full_name.filter(|n| !n.is_empty()) {
            metadata.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(is_private) = user.is_private {
            metadata.insert("is_private".to_string(), json!(is_private));
        }
        if let Some(is_verified) = user.is_verified {
            metadata.insert("is_verified".to_string(), json!(is_verified));
        }

        Ok(Retrieved::SourceUrl {
            url: unescape_url(pic),
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web_profile_response() {
        let body = r#"{"data":{"user":{"id":"25025320","username":"instagram","full_name":"Instagram","is_private":false,"is_verified":true,"profile_pic_url":"https://cdn.example.com/s.jpg","profile_pic_url_hd":"https://cdn.example.com/hd.jpg"}},"status":"ok"}"#;
        let response: WebProfileResponse = serde_json::from_str(body).unwrap();
        let user = response.data.unwrap().user.unwrap();
        assert_eq!(user.profile_pic_url_hd.as_deref(), Some("https://cdn.example.com/hd.jpg"));
        assert_eq!(user.is_verified, Some(true));
    }

    #[test]
    fn test_parse_missing_user() {
        let response: WebProfileResponse =
            serde_json::from_str(r#"{"data":{"user":null},"status":"ok"}"#).unwrap();
        assert!(response.data.unwrap().user.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let method = PublicApiMethod::new("https://www.instagram.com/");
        assert_eq!(method.base_url, "https://www.instagram.com");
    }
}
