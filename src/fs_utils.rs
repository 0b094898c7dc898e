use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::FetchError;

/// Write `bytes` to `dir/file_name`, creating `dir` first if needed.
///
/// Returns the full path written.
pub async fn write_into_dir(
    dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, FetchError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| FetchError::Storage {
            path: dir.to_path_buf(),
            source,
        })?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| FetchError::Storage {
            path: path.clone(),
            source,
        })?;

    debug!(path = %path.display(), size = bytes.len(), "Wrote file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_missing_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");

        let path = write_into_dir(&nested, "x.jpg", b"data").await.unwrap();

        assert_eq!(path, nested.join("x.jpg"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"data");
    }
}
