//! Common test utilities for E2E testing with a mocked download pipeline.
//!
//! Provides a test fixture that creates an in-process server with a
//! scripted downloader injected, so the full HTTP surface can be exercised
//! without yt-dlp or network access.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tubetap_core::testing::MockDownloader;
use tubetap_core::{Config, DownloadsConfig, MemoryJobStore};
use tubetap_server::api::create_router;
use tubetap_server::state::AppState;

/// Test fixture: an in-process server wired to a scripted downloader.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock downloader - script outcomes, stall/release pipelines
    pub downloader: Arc<MockDownloader>,
    /// Temporary directory backing the download and staging paths
    pub temp_dir: TempDir,
    /// Download directory configured for this fixture
    pub download_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with the default concurrency ceiling (3).
    pub async fn new() -> Self {
        Self::with_max_concurrent(3).await
    }

    /// Create a fixture with a custom concurrency ceiling.
    pub async fn with_max_concurrent(max_concurrent: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let download_dir = temp_dir.path().join("downloads");

        let mut config = Config::default();
        config.downloads = DownloadsConfig {
            download_path: download_dir.clone(),
            max_concurrent_downloads: max_concurrent,
            organize_by_date: false,
        };
        config.downloader.temp_dir = temp_dir.path().join("staging");

        let store = Arc::new(MemoryJobStore::new(max_concurrent));
        let downloader = Arc::new(MockDownloader::new());

        let state = Arc::new(AppState::new(config, store, downloader.clone()));
        let router = create_router(state);

        Self {
            router,
            downloader,
            temp_dir,
            download_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw response (for binary bodies
    /// and header assertions).
    pub async fn get_raw(&self, path: &str) -> Response<axum::body::Body> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Poll a job until it reports the given status.
    pub async fn wait_for_status(&self, id: &str, status: &str) -> Value {
        for _ in 0..500 {
            let response = self.get(&format!("/downloads/{}", id)).await;
            if response.status == StatusCode::OK && response.body["status"] == status {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not reach status {:?}", id, status);
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
