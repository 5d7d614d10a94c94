use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::job::EncodeJob;
use super::runner::{EncodeRunOptions, EncoderRunner};
use crate::ui::prelude::Level;
use crate::video::error::PipelineError;
use crate::video::logging::{log_event, log_event_with};

/// Terminal outcome of one video request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl JobResult {
    pub fn success(output_path: PathBuf) -> Self {
        Self {
            success: true,
            output_path: Some(output_path),
            video_url: None,
            error: None,
            exit_code: 0,
        }
    }

    pub fn failure(error: &PipelineError) -> Self {
        Self {
            success: false,
            output_path: None,
            video_url: None,
            error: Some(format!("Failed to generate video: {error}")),
            exit_code: error.exit_code(),
        }
    }

    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        if self.success {
            self.video_url = Some(url.into());
        }
        self
    }
}

/// Run `job` once. Its temporary files are gone when this returns,
/// whatever the outcome.
pub async fn execute(
    mut job: EncodeJob,
    runner: &dyn EncoderRunner,
    options: EncodeRunOptions,
) -> JobResult {
    let args = job.args();
    log_event_with(
        Level::Debug,
        "video.encode.args",
        format!("Encoder arguments: {}", shell_words::join(&args)),
        serde_json::json!({ "request_id": job.request_id(), "args": args }),
    );

    let outcome = runner.run(&args, options).await;
    job.workspace_mut().cleanup();

    match outcome {
        Ok(()) => {
            log_event(
                Level::Success,
                "video.encode.success",
                format!("Rendered video to {}", job.output_path().display()),
            );
            JobResult::success(job.output_path().to_path_buf())
        }
        Err(err) => {
            remove_partial_output(job.output_path());
            log_event(
                Level::Error,
                "video.encode.failed",
                format!("Encoding failed: {err}"),
            );
            JobResult::failure(&err)
        }
    }
}

fn remove_partial_output(path: &Path) {
    if path.exists() {
        if let Err(err) = fs::remove_file(path) {
            log_event(
                Level::Warn,
                "video.encode.partial_output",
                format!("Failed to remove partial output {}: {}", path.display(), err),
            );
        }
    }
}
