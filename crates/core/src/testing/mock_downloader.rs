//! Mock downloader for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

use crate::downloader::{
    sanitize_file_name, DownloadEvent, DownloadOutcome, DownloadRequest, Downloader,
    DownloaderError,
};

/// Scripted behavior for one `download` call.
#[derive(Debug)]
pub enum ScriptedOutcome {
    /// Emit the steps, write an artifact into the output directory, succeed.
    Success { title: String, steps: Vec<f32> },

    /// Emit the steps, then fail with the given error.
    Failure {
        error: DownloaderError,
        steps: Vec<f32>,
    },

    /// Emit the steps, then hold the pipeline open until
    /// [`MockDownloader::release_all`] is called; succeeds afterwards.
    Stall { title: String, steps: Vec<f32> },
}

/// Mock implementation of the [`Downloader`] trait.
///
/// Provides controllable behavior for testing:
/// - Script per-call outcomes (success, failure, stall-until-released)
/// - Record download requests for assertions
/// - Write a real artifact file so library listings can be exercised
///
/// With an empty script, every call succeeds with a default title and a
/// short progress sequence.
pub struct MockDownloader {
    requests: Mutex<Vec<DownloadRequest>>,
    script: Mutex<VecDeque<ScriptedOutcome>>,
    release_tx: watch::Sender<bool>,
}

impl Default for MockDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownloader {
    /// Create a new mock downloader with an empty script.
    pub fn new() -> Self {
        let (release_tx, _) = watch::channel(false);
        Self {
            requests: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            release_tx,
        }
    }

    /// Queue a scripted outcome for the next unscripted `download` call.
    pub fn push_outcome(&self, outcome: ScriptedOutcome) {
        self.lock_script().push_back(outcome);
    }

    /// All recorded download requests, in call order.
    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Release every stalled pipeline.
    pub fn release_all(&self) {
        self.release_tx.send_replace(true);
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedOutcome>> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn emit_steps(
        events: &mpsc::Sender<DownloadEvent>,
        title: Option<&str>,
        steps: &[f32],
    ) {
        let _ = events
            .send(DownloadEvent {
                percent: 0.0,
                title: title.map(|t| t.to_string()),
            })
            .await;
        for percent in steps {
            let _ = events
                .send(DownloadEvent {
                    percent: *percent,
                    title: None,
                })
                .await;
        }
    }

    async fn write_artifact(
        request: &DownloadRequest,
        title: &str,
    ) -> Result<DownloadOutcome, DownloaderError> {
        tokio::fs::create_dir_all(&request.output_dir).await?;

        let stem = match &request.custom_name {
            Some(name) => sanitize_file_name(name),
            None => sanitize_file_name(title),
        };
        let path = request.output_dir.join(format!("{}.mp3", stem));
        let data = b"mock audio data";
        tokio::fs::write(&path, data).await?;

        Ok(DownloadOutcome {
            output_path: path,
            title: title.to_string(),
            size_bytes: data.len() as u64,
        })
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(
        &self,
        request: DownloadRequest,
        events: mpsc::Sender<DownloadEvent>,
    ) -> Result<DownloadOutcome, DownloaderError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let outcome = self
            .lock_script()
            .pop_front()
            .unwrap_or_else(|| ScriptedOutcome::Success {
                title: "Mock Title".to_string(),
                steps: vec![25.0, 50.0, 75.0],
            });

        match outcome {
            ScriptedOutcome::Success { title, steps } => {
                Self::emit_steps(&events, Some(title.as_str()), &steps).await;
                let outcome = Self::write_artifact(&request, &title).await?;
                let _ = events
                    .send(DownloadEvent {
                        percent: 100.0,
                        title: None,
                    })
                    .await;
                Ok(outcome)
            }
            ScriptedOutcome::Failure { error, steps } => {
                Self::emit_steps(&events, None, &steps).await;
                Err(error)
            }
            ScriptedOutcome::Stall { title, steps } => {
                Self::emit_steps(&events, Some(title.as_str()), &steps).await;

                let mut released = self.release_tx.subscribe();
                let _ = released.wait_for(|released| *released).await;

                let outcome = Self::write_artifact(&request, &title).await?;
                let _ = events
                    .send(DownloadEvent {
                        percent: 100.0,
                        title: None,
                    })
                    .await;
                Ok(outcome)
            }
        }
    }

    async fn validate(&self) -> Result<(), DownloaderError> {
        Ok(())
    }
}
