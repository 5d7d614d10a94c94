use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No simplified text available")]
    MissingText,

    #[error("No audio file available")]
    MissingAudio,

    #[error("No images available")]
    NoImages,

    #[error("Encoder '{0}' is not installed or not on PATH")]
    EncoderMissing(String),

    #[error("Encoder {}: {detail}", describe_exit(.code))]
    EncodeFailed { code: Option<i32>, detail: String },

    #[error("Encoder did not finish within {0:?} and was killed")]
    TimedOut(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

impl PipelineError {
    pub fn from_exit_code(code: Option<i32>, stderr: &str) -> Self {
        let detail = stderr.trim();
        PipelineError::EncodeFailed {
            code,
            detail: if detail.is_empty() {
                "no diagnostic output".to_string()
            } else {
                detail.to_string()
            },
        }
    }

    /// Missing-input errors are raised before any pipeline stage runs.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingText | PipelineError::MissingAudio | PipelineError::NoImages
        )
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_missing_input() { 2 } else { 1 }
    }
}
