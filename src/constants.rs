//! Shared constants used across the application.

/// User agent string used for profile and mirror page requests.
///
/// Instagram serves a login wall to obvious bots, so this mirrors a desktop browser.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Accept header sent with HTML page requests.
pub const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// App id the Instagram web client sends with `web_profile_info` requests.
pub const INSTAGRAM_WEB_APP_ID: &str = "936619743392459";

/// MIME prefix for inline-encoded payloads.
pub const INLINE_MIME_PREFIX: &str = "data:image/jpeg;base64,";

/// Default cache time-to-live (24 hours).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Suffix of persisted image files, after the account id.
pub const PROFILE_PIC_SUFFIX: &str = "_profile_pic.jpg";

/// Suffix of the cache info file, after the account id.
pub const PROFILE_INFO_SUFFIX: &str = "_profile_pic_info.json";
