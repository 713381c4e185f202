//! HTTP API for the visualizer
//!
//! One session controller per server process, shared by every client.

use anyhow::Result;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::{self, SelectionKey, SpaceVariant, StyleVariant};
use crate::config::Config;
use crate::export::{self, ExportError};
use crate::generation::GeminiClient;
use crate::session::{GenerationOutcome, SessionController, SessionSnapshot};

pub struct Server {
    bind: String,
    port: u16,
    state: Arc<AppState>,
}

struct AppState {
    controller: Arc<SessionController>,
    advisor: Arc<GeminiClient>,
    export_dir: PathBuf,
}

impl Server {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Arc::new(GeminiClient::from_config(config)?);
        let controller = Arc::new(SessionController::new(client.clone()));
        Ok(Self::with_parts(
            config,
            controller,
            client,
            config.export_dir(),
        ))
    }

    pub fn with_parts(
        config: &Config,
        controller: Arc<SessionController>,
        advisor: Arc<GeminiClient>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            bind: config.server.bind.clone(),
            port: config.server.port,
            state: Arc::new(AppState {
                controller,
                advisor,
                export_dir,
            }),
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/health", get(health_check))
            .route("/api/catalog", get(get_catalog))
            .route("/api/session", get(get_session))
            .route("/api/session/space", post(select_space))
            .route("/api/session/style", post(select_style))
            .route("/api/generate", post(generate))
            .route("/api/image", get(current_image))
            .route("/api/image/data-uri", get(current_image_uri))
            .route("/api/export", post(export_image))
            .route("/api/advice", post(advice))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.bind, self.port).parse()?;

        info!("Starting HTTP server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

// Error response type
struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

async fn health_check() -> &'static str {
    "OK"
}

#[derive(Serialize)]
struct CatalogResponse {
    spaces: &'static [SpaceVariant],
    styles: &'static [StyleVariant],
}

async fn get_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        spaces: catalog::SPACES,
        styles: catalog::STYLES,
    })
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.controller.snapshot())
}

#[derive(Deserialize)]
struct SelectRequest {
    id: String,
}

async fn select_space(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Response {
    match state.controller.select_space(&request.id) {
        Ok(()) => Json(state.controller.snapshot()).into_response(),
        Err(e) => AppError(StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn select_style(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Response {
    match state.controller.select_style(&request.id) {
        Ok(()) => Json(state.controller.snapshot()).into_response(),
        Err(e) => AppError(StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

#[derive(Serialize)]
struct GenerateResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<SelectionKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    session: SessionSnapshot,
}

async fn generate(State(state): State<Arc<AppState>>) -> Response {
    // Detached so the request completes even if the client goes away.
    let controller = state.controller.clone();
    let outcome = match tokio::spawn(async move { controller.trigger_generation().await }).await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            return AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };
    let session = state.controller.snapshot();

    let (code, body) = match outcome {
        GenerationOutcome::Ignored => (
            StatusCode::CONFLICT,
            GenerateResponse {
                status: "ignored",
                key: None,
                message: Some("A rendering is already in progress".to_string()),
                session,
            },
        ),
        GenerationOutcome::Resolved { key } => (
            StatusCode::OK,
            GenerateResponse {
                status: "resolved",
                key: Some(key),
                message: None,
                session,
            },
        ),
        GenerationOutcome::Failed { key, message, .. } => (
            StatusCode::OK,
            GenerateResponse {
                status: "failed",
                key: Some(key),
                message: Some(message),
                session,
            },
        ),
    };

    (code, Json(body)).into_response()
}

async fn current_image(State(state): State<Arc<AppState>>) -> Response {
    let Some(image) = state.controller.current_image() else {
        return AppError(StatusCode::NOT_FOUND, "No rendering for this selection".to_string())
            .into_response();
    };

    match image.decode() {
        Ok(bytes) => ([(header::CONTENT_TYPE, image.mime_type)], bytes).into_response(),
        Err(e) => AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn current_image_uri(State(state): State<Arc<AppState>>) -> Response {
    let key = state.controller.snapshot().key;
    match state.controller.image_for(&key) {
        Some(image) => Json(json!({ "key": key, "data_uri": image.data_uri() })).into_response(),
        None => AppError(StatusCode::NOT_FOUND, "No rendering for this selection".to_string())
            .into_response(),
    }
}

async fn export_image(State(state): State<Arc<AppState>>) -> Response {
    let controller = state.controller.clone();
    let dir = state.export_dir.clone();

    let result =
        tokio::task::spawn_blocking(move || export::export_current(&controller, &dir, Utc::now()))
            .await;

    match result {
        Ok(Ok(path)) => Json(json!({ "path": path })).into_response(),
        Ok(Err(e @ ExportError::NothingToExport(_))) => {
            AppError(StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Ok(Err(e)) => AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        Err(e) => AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[derive(Deserialize)]
struct AdviceRequest {
    prompt: String,
}

async fn advice(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdviceRequest>,
) -> Response {
    if request.prompt.trim().is_empty() {
        return AppError(StatusCode::BAD_REQUEST, "prompt must not be empty".to_string())
            .into_response();
    }
    let advice = state.advisor.advise(&request.prompt).await;
    Json(json!({ "advice": advice })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{
        ClientError, GeminiSettings, GeneratedImage, ImageGenerator, MockImageGenerator,
    };
    use async_trait::async_trait;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde_json::Value;
    use std::io::Cursor;
    use std::time::Duration;

    fn offline_advisor() -> Arc<GeminiClient> {
        Arc::new(
            GeminiClient::new(GeminiSettings {
                api_key: None,
                base_url: "http://127.0.0.1:9".to_string(),
                image_model: "gemini-2.5-flash-image".to_string(),
                advice_model: "gemini-2.5-flash".to_string(),
                aspect_ratio: "1:1".to_string(),
                timeout: Duration::from_secs(1),
            })
            .unwrap(),
        )
    }

    /// Serve the API on an ephemeral port; returns its base URL.
    async fn spawn_api(mock: MockImageGenerator, export_dir: PathBuf) -> String {
        spawn_api_with(Arc::new(mock), export_dir).await
    }

    async fn spawn_api_with(generator: Arc<dyn ImageGenerator>, export_dir: PathBuf) -> String {
        let controller = Arc::new(SessionController::new(generator));
        let server = Server::with_parts(
            &Config::default(),
            controller,
            offline_advisor(),
            export_dir,
        );
        let app = server.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn catalog_lists_spaces_and_styles() {
        let tmp = tempfile::tempdir().unwrap();
        let url = spawn_api(MockImageGenerator::new(), tmp.path().to_path_buf()).await;

        let body: Value = reqwest::get(format!("{}/api/catalog", url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["spaces"].as_array().unwrap().len(), catalog::SPACES.len());
        assert_eq!(body["styles"][0]["id"], "japandi");
    }

    #[tokio::test]
    async fn select_generate_and_fetch_image() {
        let mut mock = MockImageGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Ok(Some(GeneratedImage::new("image/png", "aGVsbG8="))));
        let tmp = tempfile::tempdir().unwrap();
        let url = spawn_api(mock, tmp.path().to_path_buf()).await;
        let http = reqwest::Client::new();

        let resp = http
            .post(format!("{}/api/session/space", url))
            .json(&json!({ "id": "dining" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let missing = http.get(format!("{}/api/image", url)).send().await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let resp = http
            .post(format!("{}/api/generate", url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "resolved");
        assert_eq!(body["key"], "dining-japandi");
        assert_eq!(body["session"]["is_busy"], false);

        let image = http.get(format!("{}/api/image", url)).send().await.unwrap();
        assert_eq!(image.status(), StatusCode::OK);
        assert_eq!(
            image.headers()[header::CONTENT_TYPE.as_str()],
            "image/png"
        );
        assert_eq!(image.bytes().await.unwrap().as_ref(), b"hello");

        let embedded: Value = http
            .get(format!("{}/api/image/data-uri", url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(embedded["key"], "dining-japandi");
        assert_eq!(embedded["data_uri"], "data:image/png;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn unknown_style_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let url = spawn_api(MockImageGenerator::new(), tmp.path().to_path_buf()).await;

        let resp = reqwest::Client::new()
            .post(format!("{}/api/session/style", url))
            .json(&json!({ "id": "gothic" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "unknown style: gothic");
    }

    #[tokio::test]
    async fn failed_generation_reports_message() {
        let mut mock = MockImageGenerator::new();
        mock.expect_generate().times(1).returning(|_| Ok(None));
        let tmp = tempfile::tempdir().unwrap();
        let url = spawn_api(mock, tmp.path().to_path_buf()).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{}/api/generate", url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "failed");
        assert_eq!(body["session"]["phase"], "failed");
        assert_eq!(body["session"]["last_failure"], "empty_result");
    }

    #[tokio::test]
    async fn export_without_rendering_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let url = spawn_api(MockImageGenerator::new(), tmp.path().to_path_buf()).await;

        let resp = reqwest::Client::new()
            .post(format!("{}/api/export", url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn advice_without_key_returns_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let url = spawn_api(MockImageGenerator::new(), tmp.path().to_path_buf()).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{}/api/advice", url))
            .json(&json!({ "prompt": "Which floor suits a small bathroom?" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["advice"], crate::generation::ADVICE_ERROR_FALLBACK);
    }

    fn png_payload() -> String {
        let img = image::RgbImage::from_pixel(2, 3, image::Rgb([90, 90, 90]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        STANDARD.encode(buf.into_inner())
    }

    #[tokio::test]
    async fn export_after_generate_writes_png() {
        let payload = png_payload();
        let mut mock = MockImageGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(move |_| Ok(Some(GeneratedImage::new("image/png", payload.clone()))));
        let tmp = tempfile::tempdir().unwrap();
        let url = spawn_api(mock, tmp.path().to_path_buf()).await;
        let http = reqwest::Client::new();

        let generated: Value = http
            .post(format!("{}/api/generate", url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(generated["status"], "resolved");

        let resp = http
            .post(format!("{}/api/export", url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        let path = PathBuf::from(body["path"].as_str().unwrap());

        assert!(path.starts_with(tmp.path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("MSpace_客廳_日式侘寂_"));
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 3));
    }

    /// Answers after a fixed delay.
    struct SlowGenerator(Duration);

    #[async_trait]
    impl ImageGenerator for SlowGenerator {
        async fn generate(&self, _prompt: &str) -> Result<Option<GeneratedImage>, ClientError> {
            tokio::time::sleep(self.0).await;
            Ok(Some(GeneratedImage::new("image/png", "aGVsbG8=")))
        }
    }

    #[tokio::test]
    async fn generation_completes_after_client_disconnects() {
        let tmp = tempfile::tempdir().unwrap();
        let url = spawn_api_with(
            Arc::new(SlowGenerator(Duration::from_millis(300))),
            tmp.path().to_path_buf(),
        )
        .await;

        let impatient = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        assert!(
            impatient
                .post(format!("{}/api/generate", url))
                .send()
                .await
                .is_err()
        );

        let http = reqwest::Client::new();
        let mut session = Value::Null;
        for _ in 0..40 {
            session = http
                .get(format!("{}/api/session", url))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if session["phase"] == "resolved" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(session["is_busy"], false);
        assert_eq!(session["phase"], "resolved");
        assert_eq!(session["has_image"], true);

        let next = http
            .post(format!("{}/api/generate", url))
            .send()
            .await
            .unwrap();
        assert_eq!(next.status(), StatusCode::OK);
    }
}
