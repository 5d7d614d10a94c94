use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::video::asset::{MediaAsset, has_extension};
use crate::video::config::DataDirs;
use crate::video::encode::new_request_id;
use crate::video::error::PipelineError;

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov"];

#[derive(Debug, Deserialize)]
struct SimplifiedText {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoEntry {
    pub name: String,
    pub url: String,
    pub modified: DateTime<Utc>,
}

/// Read access to the flat-file store written by the rest of the application.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    dirs: DataDirs,
    url_prefix: String,
}

impl MediaLibrary {
    pub fn new(dirs: DataDirs, url_prefix: impl Into<String>) -> Self {
        Self {
            dirs,
            url_prefix: url_prefix.into(),
        }
    }

    pub fn simplified_text(&self) -> Result<String, PipelineError> {
        let path = self.dirs.simplified_text_path();
        if !path.exists() {
            return Err(PipelineError::MissingText);
        }
        let stored: SimplifiedText = serde_json::from_str(&fs::read_to_string(&path)?)?;
        match stored.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(PipelineError::MissingText),
        }
    }

    /// Most recently modified narration file.
    pub fn latest_audio(&self) -> Result<MediaAsset, PipelineError> {
        list_assets(&self.dirs.audio_dir, AUDIO_EXTENSIONS)?
            .into_iter()
            .max_by_key(|asset| asset.modified)
            .ok_or(PipelineError::MissingAudio)
    }

    /// Images ordered by file name.
    pub fn images(&self) -> Result<Vec<MediaAsset>, PipelineError> {
        let mut images = list_assets(&self.dirs.images_dir, IMAGE_EXTENSIONS)?;
        if images.is_empty() {
            return Err(PipelineError::NoImages);
        }
        images.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(images)
    }

    /// Rendered videos, newest first.
    pub fn videos(&self) -> Result<Vec<VideoEntry>, PipelineError> {
        let mut videos: Vec<VideoEntry> = list_assets(&self.dirs.videos_dir, VIDEO_EXTENSIONS)?
            .into_iter()
            .map(|asset| {
                let name = asset.file_name();
                VideoEntry {
                    url: self.video_url(&name),
                    name,
                    modified: asset.modified,
                }
            })
            .collect();
        videos.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(videos)
    }

    /// A fresh output path; the request-id suffix keeps same-millisecond requests apart.
    pub fn new_video_path(&self) -> PathBuf {
        self.dirs
            .videos_dir
            .join(format!("video-{}.mp4", new_request_id()))
    }

    pub fn video_url(&self, name: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), name)
    }

    /// URL of a rendered file, if it lives in the served videos directory.
    pub fn video_url_for(&self, path: &Path) -> Option<String> {
        if path.parent() != Some(self.dirs.videos_dir.as_path()) {
            return None;
        }
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(self.video_url(&name))
    }
}

fn list_assets(dir: &Path, extensions: &[&str]) -> Result<Vec<MediaAsset>, PipelineError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut assets = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            let modified = fs::metadata(&path)?.modified()?;
            assets.push(MediaAsset::new(path, DateTime::<Utc>::from(modified)));
        }
    }
    Ok(assets)
}
