//! Profile picture extraction from Instagram profile HTML.
//!
//! Instagram has shipped the avatar URL in several places over the years. Each
//! extractor targets one of them and returns the first URL it finds, already
//! unescaped. These patterns track the site's markup and break when it changes.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

/// Which extraction pattern produced a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// `"profile_pic_url_hd"` / `"profile_pic_url"` in an embedded JSON blob.
    EmbeddedJson,
    /// `image` inside a `<script type="application/ld+json">` block.
    LinkedData,
    /// `<meta property="og:image">`.
    OpenGraph,
    /// An avatar `<img>` tag matched by class, test id or alt text.
    AvatarImg,
}

impl Pattern {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmbeddedJson => "embedded_json",
            Self::LinkedData => "linked_data",
            Self::OpenGraph => "og_image",
            Self::AvatarImg => "avatar_img",
        }
    }
}

static EMBEDDED_JSON_PATTERNS: std::sync::LazyLock<Vec<Regex>> =
    std::sync::LazyLock::new(|| {
        vec![
            Regex::new(r#""profile_pic_url_hd"\s*:\s*"([^"]+)""#).unwrap(),
            Regex::new(r#""profile_pic_url"\s*:\s*"([^"]+)""#).unwrap(),
        ]
    });

static AVATAR_IMG_PATTERNS: std::sync::LazyLock<Vec<Regex>> = std::sync::LazyLock::new(|| {
    vec![
        Regex::new(r#"<img[^>]+class="[^"]*(?:profile-pic|_aa8j)[^"]*"[^>]+src="([^"]+)""#)
            .unwrap(),
        Regex::new(
            r#"<img[^>]+(?:data-testid="user-avatar"|alt="[^"]* profile picture")[^>]+src="([^"]+)""#,
        )
        .unwrap(),
    ]
});

/// Run every extractor in priority order and return the first hit.
#[must_use]
pub fn extract_profile_pic(html: &str) -> Option<(String, Pattern)> {
    extract_embedded_json(html)
        .map(|url| (url, Pattern::EmbeddedJson))
        .or_else(|| extract_linked_data(html).map(|url| (url, Pattern::LinkedData)))
        .or_else(|| extract_og_image(html).map(|url| (url, Pattern::OpenGraph)))
        .or_else(|| extract_avatar_img(html).map(|url| (url, Pattern::AvatarImg)))
}

/// Find `profile_pic_url_hd`, falling back to `profile_pic_url`, in inline JSON.
#[must_use]
pub fn extract_embedded_json(html: &str) -> Option<String> {
    EMBEDDED_JSON_PATTERNS
        .iter()
        .find_map(|re| re.captures(html))
        .map(|caps| unescape_url(&caps[1]))
        .filter(|url| !url.is_empty())
}

/// Find an image URL in schema.org linked data.
#[must_use]
pub fn extract_linked_data(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    document.select(&selector).find_map(|element| {
        let text: String = element.text().collect();
        let value: Value = serde_json::from_str(text.trim()).ok()?;
        find_linked_data_image(&value)
    })
}

/// Find the `og:image` meta tag.
#[must_use]
pub fn extract_og_image(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[property="og:image"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(ToString::to_string)
}

/// Match the avatar `<img>` tag directly.
#[must_use]
pub fn extract_avatar_img(html: &str) -> Option<String> {
    AVATAR_IMG_PATTERNS
        .iter()
        .find_map(|re| re.captures(html))
        .map(|caps| unescape_url(&caps[1]))
}

/// Undo the escaping URLs pick up inside inline JSON and raw attributes.
#[must_use]
pub fn unescape_url(raw: &str) -> String {
    raw.replace("\\u0026", "&")
        .replace("\\/", "/")
        .replace("&amp;", "&")
}

fn find_linked_data_image(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(find_linked_data_image),
        Value::Object(map) => {
            if let Some(url) = map.get("image").and_then(image_url) {
                return Some(url);
            }
            ["author", "mainEntity", "mainEntityofPage", "@graph"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(find_linked_data_image)
        }
        _ => None,
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(image_url),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_json_prefers_hd() {
        let html = r#"<script>{"profile_pic_url":"https://cdn.example.com/small.jpg","profile_pic_url_hd":"https://cdn.example.com/hd.jpg?a=1&b=2"}</script>"#;
        assert_eq!(
            extract_embedded_json(html),
            Some("https://cdn.example.com/hd.jpg?a=1&b=2".to_string())
        );
    }

    #[test]
    fn test_embedded_json_falls_back_to_standard() {
        let html = r#"{"profile_pic_url":"https:\/\/cdn.example.com\/small.jpg"}"#;
        assert_eq!(
            extract_embedded_json(html),
            Some("https://cdn.example.com/small.jpg".to_string())
        );
    }

    #[test]
    fn test_linked_data_author_image() {
        let html = r#"
            <html><head>
              <script type="application/ld+json">
                {"@context":"https://schema.org","@type":"ProfilePage",
                 "author":{"@type":"Person","name":"Someone","image":"https://cdn.example.com/ld.jpg"}}
              </script>
            </head></html>
        "#;
        assert_eq!(
            extract_linked_data(html),
            Some("https://cdn.example.com/ld.jpg".to_string())
        );
    }

    #[test]
    fn test_linked_data_image_object() {
        let html = r#"<script type="application/ld+json">[{"image":{"url":"https://cdn.example.com/obj.jpg"}}]</script>"#;
        assert_eq!(
            extract_linked_data(html),
            Some("https://cdn.example.com/obj.jpg".to_string())
        );
    }

    #[test]
    fn test_linked_data_ignores_invalid_json() {
        let html = r#"<script type="application/ld+json">{not json</script>"#;
        assert_eq!(extract_linked_data(html), None);
    }

    #[test]
    fn test_og_image() {
        let html = r#"
            <html><head>
              <meta property="og:title" content="Someone">
              <meta property="og:image" content="https://cdn.example.com/og.jpg?x=1&amp;y=2">
            </head></html>
        "#;
        assert_eq!(
            extract_og_image(html),
            Some("https://cdn.example.com/og.jpg?x=1&y=2".to_string())
        );
    }

    #[test]
    fn test_avatar_img_by_class() {
        let html = r#"<div><img alt="x" class="xpdipgo _aa8j" src="https://cdn.example.com/img.jpg"></div>"#;
        assert_eq!(
            extract_avatar_img(html),
            Some("https://cdn.example.com/img.jpg".to_string())
        );
    }

    #[test]
    fn test_avatar_img_by_alt() {
        let html = r#"<img crossorigin="anonymous" alt="someone's profile picture" src="https://cdn.example.com/alt.jpg">"#;
        assert_eq!(
            extract_avatar_img(html),
            Some("https://cdn.example.com/alt.jpg".to_string())
        );
    }

    #[test]
    fn test_priority_order() {
        let html = r#"
            <html><head>
              <meta property="og:image" content="https://cdn.example.com/og.jpg">
              <script>{"profile_pic_url":"https://cdn.example.com/json.jpg"}</script>
            </head></html>
        "#;
        let (url, pattern) = extract_profile_pic(html).unwrap();
        assert_eq!(url, "https://cdn.example.com/json.jpg");
        assert_eq!(pattern, Pattern::EmbeddedJson);
    }

    #[test]
    fn test_nothing_found() {
        let html = "<html><head><title>Login • Instagram</title></head></html>";
        assert_eq!(extract_profile_pic(html), None);
    }
}
