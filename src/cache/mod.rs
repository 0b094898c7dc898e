//! Flat-file profile picture cache.
//!
//! One image and one info JSON per account id, considered fresh while the
//! image file is younger than the TTL. There is no eviction and no locking:
//! two concurrent misses for the same account both fetch and the last write wins.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::account::AccountId;
use crate::constants::{PROFILE_INFO_SUFFIX, PROFILE_PIC_SUFFIX};
use crate::error::FetchError;
use crate::fs_utils::write_into_dir;
use crate::resolver::{OutputMode, ProfileMetadata, ResolveOptions, Resolver};

/// A fresh cache hit.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub image_path: PathBuf,
    /// Parsed info file; `None` if it could not be read back.
    pub info: Option<ProfileMetadata>,
    pub modified: SystemTime,
}

#[derive(Debug, Clone)]
pub struct ProfileCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ProfileCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn image_path(&self, account: &AccountId) -> PathBuf {
        self.dir.join(format!("{account}{PROFILE_PIC_SUFFIX}"))
    }

    #[must_use]
    pub fn info_path(&self, account: &AccountId) -> PathBuf {
        self.dir.join(format!("{account}{PROFILE_INFO_SUFFIX}"))
    }

    /// Return the cached entry for `account` if both files exist and the image is fresh.
    pub async fn lookup(&self, account: &AccountId) -> Option<CacheEntry> {
        let image_path = self.image_path(account);
        let info_path = self.info_path(account);

        let modified = match tokio::fs::metadata(&image_path).await {
            Ok(meta) => meta.modified().ok()?,
            Err(_) => {
                debug!(account = %account, "Cache miss");
                return None;
            }
        };

        if !is_fresh(modified, SystemTime::now(), self.ttl) {
            debug!(account = %account, "Cache entry expired");
            return None;
        }

        let info = match tokio::fs::read(&info_path).await {
            Ok(raw) => match serde_json::from_slice(&raw) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!(path = %info_path.display(), error = %e, "Unreadable cache info, serving image only");
                    None
                }
            },
            Err(_) => {
                debug!(account = %account, "Cache info missing, treating as miss");
                return None;
            }
        };

        debug!(account = %account, "Cache hit");
        Some(CacheEntry {
            image_path,
            info,
            modified,
        })
    }

    /// Record the info file for a freshly persisted image.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be written.
    pub async fn store_info(
        &self,
        account: &AccountId,
        info: &ProfileMetadata,
    ) -> Result<PathBuf, FetchError> {
        let json = serde_json::to_vec_pretty(info)?;
        write_into_dir(&self.dir, &format!("{account}{PROFILE_INFO_SUFFIX}"), &json).await
    }

    /// Return the fresh entry for `account`, resolving and persisting it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the resolver's error on a miss that cannot be filled, or a
    /// storage error if the info file cannot be written.
    pub async fn get_or_fetch(
        &self,
        resolver: &Resolver,
        account: &AccountId,
    ) -> Result<CacheEntry, FetchError> {
        if let Some(entry) = self.lookup(account).await {
            return Ok(entry);
        }

        let options = ResolveOptions {
            graph_token: None,
            save_dir: Some(self.dir.clone()),
        };
        let info = resolver
            .resolve(account.as_str(), OutputMode::PersistedFile, &options)
            .await?
            .into_metadata()
            .ok_or_else(|| FetchError::parse("persisted output carried no metadata"))?;
        self.store_info(account, &info).await?;

        Ok(CacheEntry {
            image_path: self.image_path(account),
            info: Some(info),
            modified: SystemTime::now(),
        })
    }
}

/// An entry is fresh while its age is below the TTL. Timestamps in the future count as
/// fresh; a zero TTL disables caching.
fn is_fresh(modified: SystemTime, now: SystemTime, ttl: Duration) -> bool {
    !ttl.is_zero() && now.duration_since(modified).map_or(true, |age| age < ttl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_info() -> ProfileMetadata {
        ProfileMetadata {
            username: Some("someone".to_string()),
            canonical_url: "https://cdn.example.com/p.jpg".to_string(),
            source_url: "https://cdn.example.com/p.jpg?sig=1".to_string(),
            method: "public_api".to_string(),
            metadata: crate::methods::Metadata::new(),
            hosted: None,
            file_path: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_fresh() {
        let now = SystemTime::now();
        let ttl = Duration::from_secs(86_400);
        assert!(is_fresh(now - Duration::from_secs(60), now, ttl));
        assert!(!is_fresh(now - Duration::from_secs(86_400), now, ttl));
        assert!(!is_fresh(now - Duration::from_secs(90_000), now, ttl));
        assert!(is_fresh(now + Duration::from_secs(5), now, ttl));
        assert!(!is_fresh(now, now, Duration::ZERO));
    }

    #[tokio::test]
    async fn test_lookup_requires_both_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let cache = ProfileCache::new(temp.path(), Duration::from_secs(60));
        let account = AccountId::parse("someone").unwrap();

        assert!(cache.lookup(&account).await.is_none());

        tokio::fs::write(cache.image_path(&account), b"img").await.unwrap();
        assert!(cache.lookup(&account).await.is_none());

        cache.store_info(&account, &sample_info()).await.unwrap();
        let entry = cache.lookup(&account).await.unwrap();
        assert_eq!(entry.image_path, temp.path().join("someone_profile_pic.jpg"));
        assert_eq!(entry.info.unwrap().method, "public_api");
    }

    #[tokio::test]
    async fn test_zero_ttl_is_always_stale() {
        let temp = tempfile::TempDir::new().unwrap();
        let cache = ProfileCache::new(temp.path(), Duration::ZERO);
        let account = AccountId::parse("someone").unwrap();

        tokio::fs::write(cache.image_path(&account), b"img").await.unwrap();
        cache.store_info(&account, &sample_info()).await.unwrap();

        assert!(cache.lookup(&account).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_info_still_serves_image() {
        let temp = tempfile::TempDir::new().unwrap();
        let cache = ProfileCache::new(temp.path(), Duration::from_secs(60));
        let account = AccountId::parse("someone").unwrap();

        tokio::fs::write(cache.image_path(&account), b"img").await.unwrap();
        tokio::fs::write(cache.info_path(&account), b"{broken").await.unwrap();

        let entry = cache.lookup(&account).await.unwrap();
        assert!(entry.info.is_none());
    }
}
