//! Thin helpers around `reqwest` shared by retrieval methods, the resolver and
//! the upload clients.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};

use crate::constants::BROWSER_USER_AGENT;
use crate::error::FetchError;

/// Build the HTTP client used for every upstream call.
///
/// # Errors
///
/// Returns `FetchError::Network` if the TLS backend cannot be initialized.
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(BROWSER_USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| FetchError::Network {
            message: format!("failed to build HTTP client: {e}"),
        })
}

/// Send a request and return the body as text, rejecting non-2xx responses.
pub async fn fetch_text(request: RequestBuilder) -> Result<String, FetchError> {
    let response = request.send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Send a request and return the body bytes together with the final URL.
pub async fn fetch_bytes(request: RequestBuilder) -> Result<(Vec<u8>, String), FetchError> {
    let response = request.send().await?.error_for_status()?;
    let final_url = response.url().to_string();
    let bytes = response.bytes().await?;
    Ok((bytes.to_vec(), final_url))
}

/// Check that a downloaded payload is a non-empty image and return its MIME type.
///
/// Upstreams routinely answer 200 with an HTML login wall, so a successful
/// status alone does not mean we got a picture.
pub fn sniff_image(bytes: &[u8]) -> Result<&'static str, FetchError> {
    if bytes.is_empty() {
        return Err(FetchError::parse("empty payload"));
    }
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .map_err(|_| FetchError::parse("payload is not a recognizable image"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_sniff_image_formats() {
        assert_eq!(sniff_image(JPEG_HEADER).unwrap(), "image/jpeg");
        assert_eq!(sniff_image(PNG_HEADER).unwrap(), "image/png");
    }

    #[test]
    fn test_sniff_rejects_html_and_empty() {
        assert!(sniff_image(b"<!DOCTYPE html><html></html>").is_err());
        assert!(sniff_image(&[]).is_err());
    }
}
