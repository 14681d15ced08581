use axum::{body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use rustytrack::build_app;
use tower::ServiceExt;

const BOUNDARY: &str = "exercise-boundary";

fn multipart_body(filename: &str, content: &[u8], units: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    if let Some(units) = units {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"units\"\r\n\r\n{units}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(format!("tests/fixtures/{name}")).expect("fixture should be present")
}

#[tokio::test]
async fn landing_page_responds() {
    let app = build_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("RustyTrack"));
}

#[tokio::test]
async fn lists_all_parsers() {
    let app = build_app();
    let response = app
        .oneshot(Request::builder().uri("/parsers").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsers: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    let parsers = parsers.as_array().unwrap();
    assert_eq!(parsers.len(), 7);
    assert!(parsers.iter().any(|p| p["name"] == "Garmin FIT" && p["suffixes"][0] == "fit"));
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = build_app();
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", "multipart/form-data; boundary=--boundary")
        .body(Body::from("----boundary--"))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_renders_exercise_summary() {
    let app = build_app();
    let body = multipart_body("heart-rate.csv", &fixture("heart-rate.csv"), None);

    let response = app.oneshot(upload_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Exercise Overview"));
    assert!(html.contains("Oregon Scientific Smartsync"));
    assert!(html.contains("124 bpm"));
}

#[tokio::test]
async fn upload_renders_imperial_units() {
    let app = build_app();
    let body = multipart_body("ride.hrm", &fixture("cycling-metric.hrm"), Some("imperial"));

    let response = app.oneshot(upload_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains(" mi<"));
    assert!(html.contains(" mph"));
    assert!(!html.contains(" km/h"));
}

#[tokio::test]
async fn unsupported_suffix_is_415() {
    let app = build_app();
    let body = multipart_body("notes.pdf", b"%PDF-1.4", None);

    let response = app.oneshot(upload_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body_text(response).await.contains("notes.pdf"));
}

#[tokio::test]
async fn malformed_content_is_400() {
    let app = build_app();
    let body = multipart_body("broken.tcx", b"<TrainingCenterDatabase>", None);

    let response = app.oneshot(upload_request("/api/parse", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("broken.tcx"));
}

#[tokio::test]
async fn api_returns_exercise_json() {
    let app = build_app();
    let body = multipart_body("run.gpx", &fixture("with-heart-rate.gpx"), None);

    let response = app.oneshot(upload_request("/api/parse", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let exercise: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(exercise["file_type"], "TopoGrafixGpx");
    assert_eq!(exercise["device_name"], "Garmin Oregon 450");
    assert_eq!(exercise["heart_rate_max"], 122);
    assert_eq!(exercise["samples"].as_array().map(Vec::len), Some(4));
}
