pub mod model;
pub mod parsing;
pub mod templates;
pub mod units;

use axum::{
    Json, Router,
    extract::Multipart,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use parsing::{ParseError, ParseErrorKind, ParserInfo, Registry};
use templates::{render_exercise, render_landing_page};
use tracing::{info, warn};
use units::UnitSystem;

pub fn build_app() -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/parsers", get(list_parsers))
        .route("/upload", post(handle_upload))
        .route("/api/parse", post(handle_api_parse))
}

async fn landing_page() -> Html<String> {
    Html(render_landing_page())
}

async fn list_parsers() -> Json<Vec<&'static ParserInfo>> {
    Json(Registry::builtin().infos())
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
    units: UnitSystem,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, Response> {
    let mut uploaded: Option<(String, Vec<u8>)> = None;
    let mut units = UnitSystem::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        uploaded = Some((filename, bytes.to_vec()));
                    }
                    Err(err) => {
                        return Err((
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read uploaded file: {err}"),
                        )
                            .into_response());
                    }
                }
            }
            Some("units") => {
                if let Ok(value) = field.text().await {
                    units = UnitSystem::from_form_value(&value);
                }
            }
            _ => {}
        }
    }

    match uploaded {
        Some((filename, bytes)) => Ok(Upload {
            filename,
            bytes,
            units,
        }),
        None => Err((StatusCode::BAD_REQUEST, "No file provided").into_response()),
    }
}

async fn handle_upload(multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    match Registry::builtin().parse_bytes(&upload.filename, &upload.bytes) {
        Ok(exercise) => {
            info!(filename = %upload.filename, samples = exercise.samples.len(), "rendered exercise");
            Html(render_exercise(&exercise, &upload.filename, upload.units)).into_response()
        }
        Err(err) => render_parse_error(err, &upload.filename),
    }
}

async fn handle_api_parse(multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    match Registry::builtin().parse_bytes(&upload.filename, &upload.bytes) {
        Ok(exercise) => Json(exercise).into_response(),
        Err(err) => render_parse_error(err, &upload.filename),
    }
}

fn render_parse_error(error: ParseError, filename: &str) -> Response {
    warn!(filename, error = %error, "failed to parse upload");
    let status = match error.kind {
        ParseErrorKind::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, format!("{error} ({filename})")).into_response()
}
