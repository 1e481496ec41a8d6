//! End-to-end tests with a mocked download pipeline.
//!
//! These run the full server stack in-process: real router, real state,
//! real store and orchestrator, scripted downloader.

mod common;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::json;
use std::time::Duration;

use common::TestFixture;
use tubetap_core::testing::ScriptedOutcome;
use tubetap_core::DownloaderError;

// =============================================================================
// Health and configuration
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

#[tokio::test]
async fn test_get_config_reflects_fixture_settings() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["downloads"]["max_concurrent_downloads"], 3);
    assert_eq!(
        response.body["downloads"]["download_path"],
        fixture.download_dir.to_string_lossy().as_ref()
    );
    assert_eq!(response.body["downloader"]["audio_format"], "mp3");
}

#[tokio::test]
async fn test_update_config_applies_partial_changes() {
    let fixture = TestFixture::new().await;
    let new_dir = fixture.temp_dir.path().join("elsewhere");

    let response = fixture
        .post(
            "/config",
            json!({
                "download_path": new_dir.to_string_lossy(),
                "max_concurrent_downloads": 5
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["downloads"]["max_concurrent_downloads"], 5);
    assert_eq!(
        response.body["downloads"]["download_path"],
        new_dir.to_string_lossy().as_ref()
    );

    // The change is visible on subsequent reads.
    let response = fixture.get("/config").await;
    assert_eq!(response.body["downloads"]["max_concurrent_downloads"], 5);
}

#[tokio::test]
async fn test_update_config_rejects_zero_concurrency() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/config", json!({ "max_concurrent_downloads": 0 }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("at least 1"));
}

// =============================================================================
// Submission and polling
// =============================================================================

#[tokio::test]
async fn test_submit_and_poll_to_completion() {
    let fixture = TestFixture::new().await;
    fixture.downloader.push_outcome(ScriptedOutcome::Success {
        title: "Never Gonna Give You Up".to_string(),
        steps: vec![20.0, 60.0, 95.0],
    });

    let response = fixture
        .post(
            "/download",
            json!({ "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "queued");
    let job_id = response.body["job_id"].as_str().unwrap().to_string();

    let job = fixture.wait_for_status(&job_id, "completed").await;
    assert_eq!(job["progress"], 100);
    assert_eq!(job["title"], "Never Gonna Give You Up");
    let output_path = job["output_path"].as_str().unwrap();
    assert!(output_path.starts_with(fixture.download_dir.to_string_lossy().as_ref()));

    // The artifact shows up in the library listing.
    let files = fixture.get("/files").await;
    assert_eq!(files.status, StatusCode::OK);
    let listed = files.body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "Never Gonna Give You Up.mp3");
    assert!(listed[0]["size"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_submit_with_custom_name() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/download",
            json!({
                "url": "https://youtu.be/abc123",
                "custom_name": "Road Mix"
            }),
        )
        .await;
    let job_id = response.body["job_id"].as_str().unwrap().to_string();

    let job = fixture.wait_for_status(&job_id, "completed").await;
    assert!(job["output_path"]
        .as_str()
        .unwrap()
        .ends_with("Road Mix.mp3"));
}

#[tokio::test]
async fn test_submit_malformed_url_is_rejected_synchronously() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/download", json!({ "url": "not a url" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.body["error"].as_str().unwrap().is_empty());

    // No job record was left behind.
    let listing = fixture.get("/downloads").await;
    assert_eq!(listing.body, json!({}));
}

#[tokio::test]
async fn test_submission_rejected_at_capacity() {
    let fixture = TestFixture::with_max_concurrent(3).await;

    let mut ids = Vec::new();
    for i in 0..3 {
        fixture.downloader.push_outcome(ScriptedOutcome::Stall {
            title: format!("Held {}", i),
            steps: vec![10.0],
        });
        let response = fixture
            .post(
                "/download",
                json!({ "url": format!("https://youtu.be/vid{}", i) }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        ids.push(response.body["job_id"].as_str().unwrap().to_string());
    }

    for id in &ids {
        fixture.wait_for_status(id, "downloading").await;
    }

    // The 4th submission is rejected and no job appears for it.
    let response = fixture
        .post("/download", json!({ "url": "https://youtu.be/vid3" }))
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("maximum concurrent downloads"));

    let listing = fixture.get("/downloads").await;
    assert_eq!(listing.body.as_object().unwrap().len(), 3);

    fixture.downloader.release_all();
    for id in &ids {
        fixture.wait_for_status(id, "completed").await;
    }
}

#[tokio::test]
async fn test_failing_pipeline_surfaces_error_via_polling() {
    let fixture = TestFixture::new().await;
    fixture.downloader.push_outcome(ScriptedOutcome::Failure {
        error: DownloaderError::Unavailable {
            reason: "Private video".to_string(),
        },
        steps: vec![40.0],
    });

    let response = fixture
        .post("/download", json!({ "url": "https://youtu.be/private1" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let job_id = response.body["job_id"].as_str().unwrap().to_string();

    let job = fixture.wait_for_status(&job_id, "error").await;
    assert_eq!(job["error"], "content unavailable: Private video");
    assert_eq!(job["progress"], 40);
    assert!(job.get("output_path").is_none());
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_mid_download_discards_stale_pipeline() {
    let fixture = TestFixture::new().await;
    fixture.downloader.push_outcome(ScriptedOutcome::Stall {
        title: "Held".to_string(),
        steps: vec![25.0],
    });

    let response = fixture
        .post("/download", json!({ "url": "https://youtu.be/held1" }))
        .await;
    let job_id = response.body["job_id"].as_str().unwrap().to_string();
    fixture.wait_for_status(&job_id, "downloading").await;

    let response = fixture.delete(&format!("/downloads/{}", job_id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["deleted"], job_id);

    let response = fixture.get(&format!("/downloads/{}", job_id)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // A late pipeline event must not resurrect the record.
    fixture.downloader.release_all();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let response = fixture.get(&format!("/downloads/{}", job_id)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(fixture.get("/downloads").await.body, json!({}));
}

#[tokio::test]
async fn test_delete_twice_returns_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/download", json!({ "url": "https://youtu.be/once1" }))
        .await;
    let job_id = response.body["job_id"].as_str().unwrap().to_string();
    fixture.wait_for_status(&job_id, "completed").await;

    let first = fixture.delete(&format!("/downloads/{}", job_id)).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = fixture.delete(&format!("/downloads/{}", job_id)).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert!(!second.body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_unknown_job_returns_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/downloads/no-such-id").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Output library
// =============================================================================

#[tokio::test]
async fn test_files_listing_empty_before_any_download() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/files").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn test_play_streams_completed_artifact() {
    let fixture = TestFixture::new().await;
    fixture.downloader.push_outcome(ScriptedOutcome::Success {
        title: "Streamable".to_string(),
        steps: vec![50.0],
    });

    let response = fixture
        .post("/download", json!({ "url": "https://youtu.be/stream1" }))
        .await;
    let job_id = response.body["job_id"].as_str().unwrap().to_string();
    fixture.wait_for_status(&job_id, "completed").await;

    let response = fixture.get_raw("/play/Streamable.mp3").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "audio/mpeg"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"mock audio data");
}

#[tokio::test]
async fn test_download_file_sets_attachment_disposition() {
    let fixture = TestFixture::new().await;
    fixture.downloader.push_outcome(ScriptedOutcome::Success {
        title: "Fetchable".to_string(),
        steps: vec![50.0],
    });

    let response = fixture
        .post("/download", json!({ "url": "https://youtu.be/fetch1" }))
        .await;
    let job_id = response.body["job_id"].as_str().unwrap().to_string();
    fixture.wait_for_status(&job_id, "completed").await;

    let response = fixture.get_raw("/download-file/Fetchable.mp3").await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("Fetchable.mp3"));
}

#[tokio::test]
async fn test_play_missing_file_returns_not_found() {
    let fixture = TestFixture::new().await;
    let response = fixture.get_raw("/play/nope.mp3").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint_exposes_counters() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/download", json!({ "url": "https://youtu.be/metric1" }))
        .await;
    let job_id = response.body["job_id"].as_str().unwrap().to_string();
    fixture.wait_for_status(&job_id, "completed").await;

    let response = fixture.get_raw("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("tubetap_downloads_submitted_total"));
}
