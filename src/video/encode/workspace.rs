use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::ui::prelude::Level;
use crate::video::logging::log_event;

/// Per-request scratch files, removed when the workspace is cleaned up or dropped.
///
/// File names carry the request id so concurrent jobs sharing a temp
/// directory never touch each other's concat list or subtitles.
#[derive(Debug)]
pub struct JobWorkspace {
    request_id: String,
    temp_dir: PathBuf,
    artifacts: Vec<PathBuf>,
}

impl JobWorkspace {
    pub fn create(temp_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(temp_dir)?;
        Ok(Self {
            request_id: new_request_id(),
            temp_dir: temp_dir.to_path_buf(),
            artifacts: Vec::new(),
        })
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.temp_dir.join(format!("inputs-{}.txt", self.request_id))
    }

    pub fn subtitle_path(&self) -> PathBuf {
        self.temp_dir.join(format!("subtitles-{}.srt", self.request_id))
    }

    /// Write `contents` to `path` and own the file from now on.
    pub fn write_artifact(&mut self, path: PathBuf, contents: &str) -> io::Result<PathBuf> {
        // Tracked before writing so a partial write is removed as well
        self.artifacts.push(path.clone());
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn cleanup(&mut self) {
        for path in self.artifacts.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => log_event(
                    Level::Debug,
                    "video.workspace.removed",
                    format!("Removed temporary file {}", path.display()),
                ),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => log_event(
                    Level::Warn,
                    "video.workspace.remove_failed",
                    format!("Failed to remove temporary file {}: {}", path.display(), err),
                ),
            }
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// `<unix-millis>-<random u32 hex>`, unique per request.
pub fn new_request_id() -> String {
    let random: u32 = rand::random();
    format!("{}-{:08x}", Utc::now().timestamp_millis(), random)
}
