//! ImgBB client for re-hosting fetched pictures.
//!
//! Instagram CDN URLs are signed and expire, so the resolver uploads the bytes
//! to ImgBB and hands out its stable direct URL instead.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::FetchError;

/// URLs ImgBB returns for an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedImage {
    pub direct_url: String,
    pub display_url: String,
    pub delete_url: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
    error: Option<UploadError>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
    url_viewer: String,
    delete_url: String,
    thumb: Option<UploadThumb>,
}

#[derive(Debug, Deserialize)]
struct UploadThumb {
    url: String,
}

#[derive(Debug, Deserialize)]
struct UploadError {
    message: Option<String>,
}

/// ImgBB upload client.
#[derive(Clone)]
pub struct ImgbbClient {
    http: Client,
    upload_url: String,
    api_key: String,
}

impl ImgbbClient {
    #[must_use]
    pub fn new(http: Client, upload_url: &str, api_key: String) -> Self {
        Self {
            http,
            upload_url: upload_url.to_string(),
            api_key,
        }
    }

    /// Upload image bytes under `name`.
    ///
    /// # Errors
    ///
    /// Returns `UploadRejected` when ImgBB reports a failure, or a network/parse
    /// error if the request itself fails.
    pub async fn upload(&self, bytes: &[u8], name: &str) -> Result<HostedImage, FetchError> {
        let encoded = STANDARD.encode(bytes);
        debug!(name = %name, size = bytes.len(), "Uploading image to ImgBB");

        let response = self
            .http
            .post(&self.upload_url)
            .form(&[
                ("key", self.api_key.as_str()),
                ("image", encoded.as_str()),
                ("name", name),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let parsed: UploadResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(FetchError::UpstreamRejected {
                    url: self.upload_url.clone(),
                    status: status.as_u16(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let data = match parsed.data {
            Some(data) if status.is_success() && parsed.success => data,
            _ => {
                let message = parsed
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| format!("unknown error (status {status})"));
                return Err(FetchError::UploadRejected { message });
            }
        };

        info!(name = %name, url = %data.url, "Uploaded image to ImgBB");

        Ok(HostedImage {
            direct_url: data.url,
            display_url: data.url_viewer,
            delete_url: data.delete_url,
            thumbnail: data.thumb.map(|t| t.url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_upload_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/upload"))
            .and(body_string_contains("key=secret"))
            .and(body_string_contains("name=someone_profile_pic"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "url": "https://i.ibb.co/abc/someone.jpg",
                    "url_viewer": "https://ibb.co/abc",
                    "delete_url": "https://ibb.co/abc/delete",
                    "thumb": {"url": "https://i.ibb.co/abc/thumb.jpg"}
                },
                "success": true,
                "status": 200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ImgbbClient::new(
            Client::new(),
            &format!("{}/1/upload", server.uri()),
            "secret".to_string(),
        );
        let hosted = client.upload(b"bytes", "someone_profile_pic").await.unwrap();

        assert_eq!(hosted.direct_url, "https://i.ibb.co/abc/someone.jpg");
        assert_eq!(hosted.display_url, "https://ibb.co/abc");
        assert_eq!(hosted.thumbnail.as_deref(), Some("https://i.ibb.co/abc/thumb.jpg"));
    }

    #[tokio::test]
    async fn test_upload_rejected_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "status_code": 400,
                "error": {"message": "Invalid API v1 key.", "code": 100},
                "status_txt": "Bad Request"
            })))
            .mount(&server)
            .await;

        let client = ImgbbClient::new(Client::new(), &server.uri(), "bad".to_string());
        let err = client.upload(b"bytes", "x").await.unwrap_err();

        assert!(matches!(err, FetchError::UploadRejected { .. }));
        assert!(err.to_string().contains("Invalid API v1 key."));
    }
}
