use url::Url;

/// Canonicalize a discovered image URL.
///
/// Drops the query string and fragment, and appends `.jpg` to the path when it
/// does not already end with it.
#[must_use]
pub fn canonicalize_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return canonicalize_raw(url);
    };

    // Skip non-HTTP URLs
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return canonicalize_raw(url);
    }

    parsed.set_query(None);
    parsed.set_fragment(None);

    if !has_jpg_suffix(parsed.path()) {
        let path = format!("{}.jpg", parsed.path());
        parsed.set_path(&path);
    }

    parsed.to_string()
}

/// String-level fallback for inputs `Url` cannot parse.
fn canonicalize_raw(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let base = &url[..end];
    if has_jpg_suffix(base) {
        base.to_string()
    } else {
        format!("{base}.jpg")
    }
}

fn has_jpg_suffix(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".jpg")
}
