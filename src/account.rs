use std::fmt;

use crate::error::FetchError;

/// Longest handle Instagram accepts.
const MAX_LEN: usize = 30;

/// Normalized account identifier.
///
/// Trimmed, lowercased, without a leading `@`, and restricted to the characters
/// Instagram allows in handles so it can be used safely in file names and URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    /// Normalize and validate raw user input.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidAccount` if the normalized id is empty, too long,
    /// or contains characters outside `[a-z0-9._]`.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let normalized = input.trim().trim_start_matches('@').to_lowercase();

        let invalid = |reason: &str| FetchError::InvalidAccount {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if normalized.is_empty() {
            return Err(invalid("cannot be empty"));
        }
        if normalized.len() > MAX_LEN {
            return Err(invalid("longer than 30 characters"));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_')
        {
            return Err(invalid("only letters, digits, '.' and '_' are allowed"));
        }

        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
