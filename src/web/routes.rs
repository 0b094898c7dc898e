use axum::extract::{Host, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::templates::{self, IndexResult};
use super::AppState;
use crate::account::AccountId;
use crate::error::FetchError;
use crate::http::sniff_image;
use crate::resolver::{OutputMode, ResolveOptions, ResolveOutput};

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/image/:file", get(image))
        .route("/api/profile-pic/:username", get(api_profile_pic))
        .route("/convert", post(convert))
        .route("/convert-url", get(convert_url))
        .route("/healthz", get(health))
}

/// JSON error body with a status chosen from the error kind.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %self.message, "Request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Parse a `format` parameter. The web surface never writes files, so `file`
/// is rejected along with unknown names.
fn parse_web_format(raw: Option<&str>) -> Result<OutputMode, ApiError> {
    let raw = raw.unwrap_or("url");
    match raw.parse::<OutputMode>() {
        Ok(OutputMode::PersistedFile) | Err(_) => Err(ApiError::bad_request(format!(
            "invalid format '{raw}': use \"url\", \"json\" or \"base64\""
        ))),
        Ok(mode) => Ok(mode),
    }
}

/// Build `{<subject_key>: subject, format, url|data|base64}`.
fn output_body(subject_key: &str, subject: &str, output: ResolveOutput) -> Result<Value, ApiError> {
    let mode = output.mode();
    let (key, value) = match output {
        ResolveOutput::DirectUrl(url) => ("url", Value::String(url)),
        ResolveOutput::EncodedInline(data) => ("base64", Value::String(data)),
        ResolveOutput::StructuredMetadata(meta) | ResolveOutput::PersistedFile(meta) => (
            "data",
            serde_json::to_value(meta).map_err(FetchError::from)?,
        ),
    };

    let mut body = Map::new();
    body.insert(subject_key.to_string(), Value::String(subject.to_string()));
    body.insert("format".to_string(), Value::String(mode.as_str().to_string()));
    body.insert(key.to_string(), value);
    Ok(Value::Object(body))
}

// ========== HTML Routes ==========

#[derive(Debug, Deserialize)]
pub struct IndexParams {
    username: Option<String>,
}

async fn index(
    State(state): State<AppState>,
    Host(host): Host,
    Query(params): Query<IndexParams>,
) -> Response {
    let url_root = format!("http://{host}/");
    let input = params.username.unwrap_or_default();
    let input = input.trim();

    if input.is_empty() {
        return Html(templates::render_index(&IndexResult::Empty, &url_root).into_string())
            .into_response();
    }

    let outcome = match AccountId::parse(input) {
        Ok(account) => state
            .cache
            .get_or_fetch(&state.resolver, &account)
            .await
            .map(|entry| {
                let image_url = entry
                    .info
                    .and_then(|info| info.hosted)
                    .map_or_else(|| format!("{url_root}image/{account}.jpg"), |h| h.direct_url);
                (account, image_url)
            }),
        Err(e) => Err(e),
    };

    let markup = match &outcome {
        Ok((account, image_url)) => templates::render_index(
            &IndexResult::Found {
                username: account.as_str(),
                image_url,
            },
            &url_root,
        ),
        Err(e) => {
            tracing::warn!(input = %input, error = %e, "Index lookup failed");
            let error = e.to_string();
            templates::render_index(
                &IndexResult::Failed {
                    username: input,
                    error: &error,
                },
                &url_root,
            )
        }
    };

    Html(markup.into_string()).into_response()
}

// ========== Image Route ==========

async fn image(State(state): State<AppState>, Path(file): Path<String>) -> Result<Response, ApiError> {
    let name = file
        .strip_suffix(".jpg")
        .or_else(|| file.strip_suffix(".png"))
        .unwrap_or(&file);
    let account = AccountId::parse(name)?;

    let entry = state.cache.get_or_fetch(&state.resolver, &account).await?;

    if let Some(hosted) = entry.info.and_then(|info| info.hosted) {
        return Ok(Redirect::temporary(&hosted.direct_url).into_response());
    }

    let bytes = tokio::fs::read(&entry.image_path)
        .await
        .map_err(|source| FetchError::Storage {
            path: entry.image_path.clone(),
            source,
        })?;
    let content_type = sniff_image(&bytes).unwrap_or("image/jpeg");

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

// ========== API Routes ==========

#[derive(Debug, Deserialize)]
pub struct FormatParams {
    format: Option<String>,
}

async fn api_profile_pic(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<FormatParams>,
) -> Result<Json<Value>, ApiError> {
    let mode = parse_web_format(params.format.as_deref())?;
    let account = AccountId::parse(&username)?;

    let output = state
        .resolver
        .resolve(account.as_str(), mode, &ResolveOptions::default())
        .await?;

    Ok(Json(output_body("username", account.as_str(), output)?))
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    url: String,
    format: Option<String>,
}

async fn convert(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> Result<Json<Value>, ApiError> {
    convert_response(&state, request).await
}

async fn convert_url(
    State(state): State<AppState>,
    Query(request): Query<ConvertRequest>,
) -> Result<Json<Value>, ApiError> {
    convert_response(&state, request).await
}

async fn convert_response(
    state: &AppState,
    request: ConvertRequest,
) -> Result<Json<Value>, ApiError> {
    let mode = parse_web_format(request.format.as_deref())?;
    let url = request.url.trim();

    let output = state
        .resolver
        .convert(url, mode, &ResolveOptions::default())
        .await?;

    Ok(Json(output_body("source_url", url, output)?))
}

async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web_format() {
        assert_eq!(parse_web_format(None).unwrap(), OutputMode::DirectUrl);
        assert_eq!(
            parse_web_format(Some("base64")).unwrap(),
            OutputMode::EncodedInline
        );
        assert_eq!(
            parse_web_format(Some("file")).unwrap_err().status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            parse_web_format(Some("xml")).unwrap_err().status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_output_body_keys() {
        let body = output_body(
            "username",
            "someone",
            ResolveOutput::DirectUrl("https://i.example.com/p.jpg".to_string()),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({"username": "someone", "format": "url", "url": "https://i.example.com/p.jpg"})
        );

        let body = output_body(
            "source_url",
            "https://x.example.com/a",
            ResolveOutput::EncodedInline("data:image/jpeg;base64,YQ==".to_string()),
        )
        .unwrap();
        assert_eq!(body["format"], "base64");
        assert_eq!(body["base64"], "data:image/jpeg;base64,YQ==");
        assert_eq!(body["source_url"], "https://x.example.com/a");
    }

    #[test]
    fn test_error_status_from_kind() {
        let invalid = FetchError::InvalidAccount {
            input: "???".to_string(),
            reason: "bad".to_string(),
        };
        assert_eq!(ApiError::from(invalid).status, StatusCode::BAD_REQUEST);

        let failed = FetchError::NoMethodSucceeded {
            account: "someone".to_string(),
            failures: Vec::new(),
        };
        assert_eq!(
            ApiError::from(failed).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
