//! Nifty Images render client.
//!
//! Renders a Nifty Images template with a profile picture supplied as a raw
//! base64 payload (no `data:` prefix).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::INLINE_MIME_PREFIX;
use crate::error::FetchError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    template_id: &'a str,
    data: RenderData<'a>,
}

#[derive(Debug, Serialize)]
struct RenderData<'a> {
    instagram_profile_pic: &'a str,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    url: Option<String>,
}

#[derive(Clone)]
pub struct NiftyClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl NiftyClient {
    #[must_use]
    pub fn new(http: Client, api_url: &str, api_key: String) -> Self {
        Self {
            http,
            api_url: api_url.to_string(),
            api_key,
        }
    }

    /// Render `template_id` with the given picture and return the rendered image URL.
    ///
    /// Accepts either a bare base64 payload or a `data:image/jpeg;base64,` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, is rejected, or the response has no URL.
    pub async fn render(&self, template_id: &str, picture: &str) -> Result<String, FetchError> {
        let payload = picture.strip_prefix(INLINE_MIME_PREFIX).unwrap_or(picture);

        let request = RenderRequest {
            template_id,
            data: RenderData {
                instagram_profile_pic: payload,
            },
        };

        let response: RenderResponse = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let url = response
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| FetchError::parse("Nifty Images response has no url"))?;

        info!(template_id = %template_id, url = %url, "Rendered Nifty Image");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_render_strips_data_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer key123"))
            .and(body_json(serde_json::json!({
                "templateId": "tpl",
                "data": {"instagram_profile_pic": "QUJD"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"url": "https://img.nifty.example/r.png"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = NiftyClient::new(Client::new(), &server.uri(), "key123".to_string());
        let url = client
            .render("tpl", "data:image/jpeg;base64,QUJD")
            .await
            .unwrap();
        assert_eq!(url, "https://img.nifty.example/r.png");
    }

    #[tokio::test]
    async fn test_render_missing_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = NiftyClient::new(Client::new(), &server.uri(), "k".to_string());
        assert!(client.render("tpl", "QUJD").await.is_err());
    }
}
