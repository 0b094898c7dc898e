//! Maud templates for the HTML front end.

use maud::{html, Markup, PreEscaped, DOCTYPE};

/// Page styles, inlined so the page works without a static directory.
const PAGE_STYLE: &str = r"
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; background-color: #fafafa; }
h1 { color: #e1306c; text-align: center; margin-bottom: 30px; }
.container { background-color: white; border-radius: 8px; padding: 30px; box-shadow: 0 2px 10px rgba(0, 0, 0, 0.1); }
.form-group { margin-bottom: 20px; }
label { display: block; margin-bottom: 8px; font-weight: 600; }
input[type=text] { width: 100%; padding: 10px; border: 1px solid #ddd; border-radius: 4px; font-size: 16px; box-sizing: border-box; }
button { background-color: #e1306c; color: white; border: none; padding: 12px 20px; border-radius: 4px; cursor: pointer; font-size: 16px; font-weight: 600; }
button:hover { background-color: #c13584; }
.result { margin-top: 30px; }
.error { color: #c0392b; text-align: center; margin: 20px 0; }
.profile-pic { display: block; max-width: 150px; border-radius: 50%; margin: 0 auto 20px; border: 3px solid #e1306c; }
.url-box { background-color: #f8f9fa; border: 1px solid #ddd; border-radius: 4px; padding: 15px; margin-bottom: 15px; position: relative; }
.url-box button { position: absolute; top: 10px; right: 10px; background-color: #0095f6; padding: 5px 10px; font-size: 12px; }
.url-title { font-weight: 600; margin-bottom: 10px; color: #555; }
.url-content { word-break: break-all; font-family: monospace; margin-right: 60px; }
footer { margin-top: 40px; text-align: center; color: #999; font-size: 14px; }
";

const COPY_SCRIPT: &str = r"
function copyToClipboard(id) {
    const element = document.getElementById(id);
    navigator.clipboard.writeText(element.innerText).then(() => {
        const button = element.nextElementSibling;
        const original = button.innerText;
        button.innerText = 'Copied!';
        setTimeout(() => { button.innerText = original; }, 2000);
    });
}
";

/// What the index page shows below the form.
#[derive(Debug, Clone)]
pub enum IndexResult<'a> {
    /// Nothing was requested yet.
    Empty,
    /// The picture was resolved to `image_url`.
    Found { username: &'a str, image_url: &'a str },
    /// Resolution failed.
    Failed { username: &'a str, error: &'a str },
}

fn base_layout(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(PAGE_STYLE)) }
            }
            body {
                div class="container" {
                    (content)
                }
                footer {
                    p { "Extracts direct Instagram profile picture URLs and re-hosts them." }
                }
                script { (PreEscaped(COPY_SCRIPT)) }
            }
        }
    }
}

/// A labeled, copyable value.
fn copy_box(id: &str, title: &str, value: &str) -> Markup {
    html! {
        div class="url-box" {
            div class="url-title" { (title) }
            div class="url-content" id=(id) { (value) }
            button type="button" onclick=(format!("copyToClipboard('{id}')")) { "Copy" }
        }
    }
}

/// Render the index page.
///
/// `url_root` is the externally visible base URL ending in `/`, used to build
/// the API link.
#[must_use]
pub fn render_index(result: &IndexResult<'_>, url_root: &str) -> Markup {
    let current = match result {
        IndexResult::Empty => "",
        IndexResult::Found { username, .. } | IndexResult::Failed { username, .. } => *username,
    };

    let content = html! {
        h1 { "Instagram Profile Picture" }

        form action="/" method="get" {
            div class="form-group" {
                label for="username" { "Instagram username:" }
                input type="text" id="username" name="username" placeholder="e.g. instagram"
                    value=(current) required;
            }
            button type="submit" { "Get URLs" }
        }

        @match result {
            IndexResult::Empty => {}
            IndexResult::Failed { username, error } => {
                div class="result" {
                    h2 style="text-align: center;" { "Results for @" (username) }
                    div class="error" { (error) }
                }
            }
            IndexResult::Found { username, image_url } => {
                div class="result" {
                    h2 style="text-align: center;" { "Results for @" (username) }
                    img src=(image_url) class="profile-pic" alt=(format!("{username} profile picture"));
                    (copy_box("url1", "Direct image URL:", image_url))
                    (copy_box("url2", "API URL (JSON):", &format!("{url_root}api/profile-pic/{username}")))
                    (copy_box("url3", "HTML image tag:", &format!(r#"<img src="{image_url}" alt="{username} profile picture">"#)))
                }
            }
        }
    };

    base_layout("Instagram Profile Picture", &content)
}
