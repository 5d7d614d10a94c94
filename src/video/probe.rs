use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::process::Command;

use crate::ui::prelude::Level;
use crate::video::logging::log_event;

/// Anything that can report the playback length of a media file.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration_seconds(&self, path: &Path) -> Result<f64>;
}

/// Queries the container-level duration through ffprobe.
#[derive(Debug, Clone)]
pub struct Ffprobe {
    program: String,
}

impl Ffprobe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl DurationProbe for Ffprobe {
    async fn duration_seconds(&self, path: &Path) -> Result<f64> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {} for {}", self.program, path.display()))?;

        if !output.status.success() {
            bail!(
                "{} failed for {}: {}",
                self.program,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_duration(stdout: &str) -> Result<f64> {
    let value = stdout.lines().next().unwrap_or_default().trim();
    let duration: f64 = value
        .parse()
        .with_context(|| format!("Failed to parse probe output '{value}' as seconds"))?;
    if !duration.is_finite() || duration < 0.0 {
        bail!("Probe reported an unusable duration: {value}");
    }
    Ok(duration)
}

/// Probe `path`, substituting `fallback` seconds when probing fails.
///
/// Never fails; a probe error only produces a warning event.
pub async fn probe_duration(probe: &dyn DurationProbe, path: &Path, fallback: f64) -> f64 {
    match probe.duration_seconds(path).await {
        Ok(duration) => {
            log_event(
                Level::Debug,
                "video.probe.duration",
                format!("{} lasts {:.3}s", path.display(), duration),
            );
            duration
        }
        Err(err) => {
            log_event(
                Level::Warn,
                "video.probe.fallback",
                format!(
                    "Could not determine duration of {} ({:#}); assuming {}s",
                    path.display(),
                    err,
                    fallback
                ),
            );
            fallback
        }
    }
}
