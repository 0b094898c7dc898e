//! Fallback-chain resolution of profile pictures.
//!
//! The resolver walks the configured retrieval methods one at a time, keeps the
//! first image it gets, and then applies re-hosting and the requested output
//! mode. Per-method failures only matter when every method fails.

mod canonical;
mod output;

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

pub use canonical::canonicalize_url;
pub use output::{OutputMode, ProfileMetadata, ResolveOutput};

use crate::account::AccountId;
use crate::config::Config;
use crate::constants::{INLINE_MIME_PREFIX, PROFILE_PIC_SUFFIX};
use crate::error::{FetchError, MethodFailure};
use crate::fs_utils::write_into_dir;
use crate::http::{build_client, fetch_bytes, sniff_image};
use crate::methods::{GraphApiMethod, Metadata, MethodChain, RetrievalMethod, Retrieved};
use crate::upload::ImgbbClient;

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Graph API token for this request; overrides the configured one.
    pub graph_token: Option<String>,
    /// Target directory for `PersistedFile`; the working directory when unset.
    pub save_dir: Option<PathBuf>,
}

/// Picture bytes from the one method that succeeded.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub bytes: Vec<u8>,
    pub source_url: String,
    pub method: String,
    pub metadata: Metadata,
}

/// What a result is about, and how its files are named.
struct Subject {
    username: Option<String>,
    stem: String,
}

impl Subject {
    fn account(account: &AccountId) -> Self {
        Self {
            username: Some(account.to_string()),
            stem: account.to_string(),
        }
    }

    fn url(url: &str) -> Self {
        let digest = hex::encode(Sha256::digest(url.as_bytes()));
        Self {
            username: None,
            stem: format!("converted_{}", &digest[..16]),
        }
    }

    fn file_name(&self) -> String {
        format!("{}{PROFILE_PIC_SUFFIX}", self.stem)
    }

    fn upload_name(&self) -> String {
        format!("{}_profile_pic", self.stem)
    }
}

pub struct Resolver {
    http: Client,
    chain: MethodChain,
    graph_base_url: String,
    graph_user_id: Option<String>,
    graph_token: Option<String>,
    host: Option<ImgbbClient>,
}

impl Resolver {
    /// Build a resolver with the default method chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Self::with_chain(config, MethodChain::from_config(config))
    }

    /// Build a resolver around a custom method chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_chain(config: &Config, chain: MethodChain) -> Result<Self, FetchError> {
        let http = build_client(config.request_timeout)?;
        let host = config
            .imgbb_api_key
            .clone()
            .map(|key| ImgbbClient::new(http.clone(), &config.imgbb_upload_url, key));

        Ok(Self {
            http,
            chain,
            graph_base_url: config.graph_api_base_url.clone(),
            graph_user_id: config.graph_api_user_id.clone(),
            graph_token: config.graph_api_token.clone(),
            host,
        })
    }

    /// The shared HTTP client.
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.http
    }

    #[must_use]
    pub fn hosting_enabled(&self) -> bool {
        self.host.is_some()
    }

    /// Resolve an account's profile picture into the requested output.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccount` for unusable input, `NoMethodSucceeded` when
    /// every method fails, or the re-hosting / storage error that stopped
    /// post-processing.
    pub async fn resolve(
        &self,
        account: &str,
        mode: OutputMode,
        options: &ResolveOptions,
    ) -> Result<ResolveOutput, FetchError> {
        let account = AccountId::parse(account)?;
        let fetched = self.fetch(&account, options).await?;
        self.finish(&Subject::account(&account), fetched, mode, options)
            .await
    }

    /// Re-host a picture given by URL, skipping the method search.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` for non-HTTP input, or the download, re-hosting or
    /// storage error that stopped the conversion.
    pub async fn convert(
        &self,
        url: &str,
        mode: OutputMode,
        options: &ResolveOptions,
    ) -> Result<ResolveOutput, FetchError> {
        let url = url.trim();
        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(FetchError::InvalidUrl {
                    input: url.to_string(),
                    reason: format!("unsupported scheme '{}'", parsed.scheme()),
                })
            }
            Err(e) => {
                return Err(FetchError::InvalidUrl {
                    input: url.to_string(),
                    reason: e.to_string(),
                })
            }
        }

        let bytes = self.download(url).await?;
        let fetched = FetchResult {
            bytes,
            source_url: url.to_string(),
            method: "direct".to_string(),
            metadata: Metadata::new(),
        };
        self.finish(&Subject::url(url), fetched, mode, options).await
    }

    /// Run the method chain for `account` and return the first picture found.
    ///
    /// # Errors
    ///
    /// Returns `NoMethodSucceeded` listing every attempted method's failure.
    pub async fn fetch(
        &self,
        account: &AccountId,
        options: &ResolveOptions,
    ) -> Result<FetchResult, FetchError> {
        let mut failures = Vec::new();

        let token = options
            .graph_token
            .clone()
            .or_else(|| self.graph_token.clone());
        if let Some(token) = token {
            let graph = GraphApiMethod::new(&self.graph_base_url, self.graph_user_id.clone(), token);
            match self.attempt(&graph, account).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if !e.is_recoverable() => return Err(e),
                Err(e) => {
                    warn!(account = %account, error = %e, "Authenticated method failed, falling back to public methods");
                    failures.push(MethodFailure {
                        method: graph.method_id().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        for method in self.chain.methods() {
            match self.attempt(method.as_ref(), account).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if !e.is_recoverable() => return Err(e),
                Err(e) => {
                    warn!(account = %account, method = method.method_id(), error = %e, "Retrieval method failed");
                    failures.push(MethodFailure {
                        method: method.method_id().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(FetchError::NoMethodSucceeded {
            account: account.to_string(),
            failures,
        })
    }

    /// Download an image URL, rejecting empty and non-image payloads.
    ///
    /// # Errors
    ///
    /// Returns a network, upstream or parse error.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let (bytes, _) = fetch_bytes(self.http.get(url)).await?;
        sniff_image(&bytes)?;
        Ok(bytes)
    }

    async fn attempt(
        &self,
        method: &dyn RetrievalMethod,
        account: &AccountId,
    ) -> Result<FetchResult, FetchError> {
        debug!(account = %account, method = method.method_id(), "Trying retrieval method");

        let fetched = match method.retrieve(&self.http, account).await? {
            Retrieved::SourceUrl { url, metadata } => {
                let bytes = self.download(&url).await?;
                FetchResult {
                    bytes,
                    source_url: url,
                    method: method.method_id().to_string(),
                    metadata,
                }
            }
            Retrieved::Bytes {
                bytes,
                source_url,
                metadata,
            } => {
                sniff_image(&bytes)?;
                FetchResult {
                    bytes,
                    source_url,
                    method: method.method_id().to_string(),
                    metadata,
                }
            }
        };

        info!(
            account = %account,
            method = %fetched.method,
            size = fetched.bytes.len(),
            "Fetched profile picture"
        );
        Ok(fetched)
    }

    async fn finish(
        &self,
        subject: &Subject,
        fetched: FetchResult,
        mode: OutputMode,
        options: &ResolveOptions,
    ) -> Result<ResolveOutput, FetchError> {
        if !mode.wants_hosting() {
            return Ok(ResolveOutput::EncodedInline(encode_inline(&fetched.bytes)));
        }

        let hosted = match &self.host {
            Some(host) => Some(host.upload(&fetched.bytes, &subject.upload_name()).await?),
            None => None,
        };
        let canonical_url = canonicalize_url(
            hosted
                .as_ref()
                .map_or(fetched.source_url.as_str(), |h| h.direct_url.as_str()),
        );

        if mode == OutputMode::DirectUrl {
            return Ok(ResolveOutput::DirectUrl(canonical_url));
        }

        let file_path = if mode == OutputMode::PersistedFile {
            let dir = options
                .save_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));
            Some(write_into_dir(&dir, &subject.file_name(), &fetched.bytes).await?)
        } else {
            None
        };

        let metadata = ProfileMetadata {
            username: subject.username.clone(),
            canonical_url,
            source_url: fetched.source_url,
            method: fetched.method,
            metadata: fetched.metadata,
            hosted,
            file_path,
            fetched_at: chrono::Utc::now(),
        };

        Ok(if mode == OutputMode::PersistedFile {
            ResolveOutput::PersistedFile(metadata)
        } else {
            ResolveOutput::StructuredMetadata(metadata)
        })
    }
}

/// Encode bytes as a `data:image/jpeg;base64,` string.
#[must_use]
pub fn encode_inline(bytes: &[u8]) -> String {
    format!("{INLINE_MIME_PREFIX}{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_file_names() {
        let account = AccountId::parse("Some.User").unwrap();
        let subject = Subject::account(&account);
        assert_eq!(subject.file_name(), "some.user_profile_pic.jpg");
        assert_eq!(subject.upload_name(), "some.user_profile_pic");
    }

    #[test]
    fn test_url_subject_is_deterministic() {
        let a = Subject::url("https://example.com/a.jpg");
        let b = Subject::url("https://example.com/a.jpg");
        let c = Subject::url("https://example.com/b.jpg");
        assert_eq!(a.stem, b.stem);
        assert_ne!(a.stem, c.stem);
        assert!(a.stem.starts_with("converted_"));
        assert!(a.username.is_none());
    }

    #[test]
    fn test_encode_inline_prefix() {
        assert_eq!(encode_inline(b"abc"), "data:image/jpeg;base64,YWJj");
    }
}
