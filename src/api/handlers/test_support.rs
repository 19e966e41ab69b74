// In-process router harness for handler tests
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::api::build_router;
use crate::config::AppConfig;
use crate::state::AppState;

const BOUNDARY: &str = "docscribe-test-boundary";

pub struct TestApp {
    _dir: TempDir,
    pub state: AppState,
}

impl TestApp {
    /// Fresh data directory, placeholder transcription
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::for_data_dir(dir.path());
        let state = AppState::initialize(config).unwrap();
        Self { _dir: dir, state }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn create_project(&self, name: &str) -> String {
        let (status, body) = send(self, Method::POST, "/api/projects", Some(json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    /// POST a multipart upload with an optional `file` part and optional `name` part
    pub async fn upload(&self, project_id: &str, file: Option<(&str, &str)>, name: Option<&str>) -> (StatusCode, Value) {
        let mut body: Vec<u8> = Vec::new();
        if let Some((file_name, contents)) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                    BOUNDARY, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(contents.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        if let Some(name) = name {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{}\r\n",
                    BOUNDARY, name
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/projects/{}/documents", project_id))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        into_parts(self.router().oneshot(request).await.unwrap()).await
    }
}

/// Send a request with an optional JSON body and decode the JSON response
pub async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    into_parts(app.router().oneshot(request).await.unwrap()).await
}

async fn into_parts(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_healthz() {
    let app = TestApp::new();
    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
