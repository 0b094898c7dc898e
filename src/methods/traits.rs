use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;

use crate::account::AccountId;
use crate::error::FetchError;

/// Free-form details a method learned about the account (display name, ids, ...).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// What a retrieval method found.
#[derive(Debug, Clone)]
pub enum Retrieved {
    /// A picture URL the resolver still has to download.
    SourceUrl { url: String, metadata: Metadata },
    /// The picture itself, for services that serve image bytes directly.
    Bytes {
        bytes: Vec<u8>,
        source_url: String,
        metadata: Metadata,
    },
}

/// One strategy for locating an account's profile picture.
#[async_trait]
pub trait RetrievalMethod: Send + Sync {
    /// Label used in logs and aggregated error messages.
    fn method_id(&self) -> &'static str;

    /// Try to locate the profile picture for `account`.
    ///
    /// # Errors
    ///
    /// Returns `Network`, `Parse` or `UpstreamRejected` when this method cannot
    /// produce a picture; the resolver moves on to the next method.
    async fn retrieve(&self, http: &Client, account: &AccountId) -> Result<Retrieved, FetchError>;
}
