use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::traits::{Metadata, RetrievalMethod, Retrieved};
use crate::account::AccountId;
use crate::error::FetchError;

/// Facebook Graph API business discovery, the only method that needs a credential.
///
/// Business discovery looks up another account through a business account the
/// token belongs to, so both the token and that account's id are required.
pub struct GraphApiMethod {
    base_url: String,
    user_id: Option<String>,
    token: String,
}

impl GraphApiMethod {
    #[must_use]
    pub fn new(base_url: &str, user_id: Option<String>, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id,
            token,
        }
    }

    fn request_url(&self, user_id: &str, account: &AccountId) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, user_id))
            .map_err(|e| FetchError::parse(format!("invalid Graph API URL: {e}")))?;
        url.query_pairs_mut().append_pair(
            "fields",
            &format!("business_discovery.username({account}){{username,name,profile_picture_url}}"),
        );
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct BusinessDiscoveryResponse {
    business_discovery: Option<BusinessDiscovery>,
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct BusinessDiscovery {
    id: Option<String>,
    username: Option<String>,
    name: Option<String>,
    profile_picture_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

#[async_trait]
impl RetrievalMethod for GraphApiMethod {
    fn method_id(&self) -> &'static str {
        "graph_api"
    }

    async fn retrieve(&self, http: &Client, account: &AccountId) -> Result<Retrieved, FetchError> {
        let user_id = self
            .user_id
            .as_deref()
            .ok_or_else(|| FetchError::parse("GRAPH_API_USER_ID is not configured"))?;

        let url = self.request_url(user_id, account)?;
        debug!(account = %account, "Querying Graph API business discovery");

        let response = http.get(url).bearer_auth(&self.token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Graph errors come back as JSON with a non-2xx status; keep the message.
        let parsed: BusinessDiscoveryResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(FetchError::UpstreamRejected {
                    url: format!("{}/{}", self.base_url, user_id),
                    status: status.as_u16(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(error) = parsed.error {
            return Err(FetchError::parse(format!("Graph API error: {}", error.message)));
        }
        if !status.is_success() {
            return Err(FetchError::UpstreamRejected {
                url: format!("{}/{}", self.base_url, user_id),
                status: status.as_u16(),
            });
        }

        let discovery = parsed
            .business_discovery
            .ok_or_else(|| FetchError::parse("response has no business_discovery"))?;
        let pic = discovery
            .profile_picture_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| FetchError::parse("business_discovery has no profile_picture_url"))?;

        let mut metadata = Metadata::new();
        if let Some(id) = discovery.id {
            metadata.insert("id".to_string(), json!(id));
        }
        if let Some(username) = discovery.username {
            metadata.insert("username".to_string(), json!(username));
        }
        if let Some(name) = discovery.name {
            metadata.insert("full_name".to_string(), json!(name));
        }

        Ok(Retrieved::SourceUrl { url: pic, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_encodes_fields() {
        let method = GraphApiMethod::new(
            "https://graph.facebook.com/v19.0/",
            Some("1784".to_string()),
            "tok en".to_string(),
        );
        let account = AccountId::parse("someone").unwrap();
        let url = method.request_url("1784", &account).unwrap();

        assert_eq!(url.path(), "/v19.0/1784");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs[0],
            (
                "fields".to_string(),
                "business_discovery.username(someone){username,name,profile_picture_url}"
                    .to_string()
            )
        );
        assert_eq!(pairs.len(), 1);
        assert!(!url.as_str().contains("tok"));
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        let parsed: BusinessDiscoveryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.unwrap().message, "Invalid OAuth access token.");
    }
}
