use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidecastConfig {
    /// Root directory holding simplified text, audio, images and videos
    pub data_dir: PathBuf,
    /// Override for the image directory (defaults to <data_dir>/images)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images_dir: Option<PathBuf>,
    /// Override for the narration directory (defaults to <data_dir>/audio)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_dir: Option<PathBuf>,
    /// Override for the video output directory (defaults to <data_dir>/videos)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos_dir: Option<PathBuf>,
    /// Override for per-job temporary files (defaults to <data_dir>/temp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    /// Encoder executable
    pub ffmpeg: String,
    /// Probe executable
    pub ffprobe: String,
    /// Maximum number of images placed on the timeline
    pub max_images: usize,
    /// Output frame rate
    pub frame_rate: u32,
    /// Output frame size as `WIDTHxHEIGHT`; images are scaled and padded to fit
    pub resolution: String,
    /// x264 speed/quality preset
    pub preset: String,
    /// x264 constant rate factor (0-51, lower is better)
    pub crf: u8,
    /// AAC bitrate, e.g. `192k`
    pub audio_bitrate: String,
    /// Duration assumed when the narration cannot be probed
    pub fallback_duration_secs: f64,
    /// Kill the encoder after this many seconds (0 disables the limit)
    pub encode_timeout_secs: u64,
    /// URL prefix under which rendered videos are served
    pub video_url_prefix: String,
}

impl Default for SlidecastConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            images_dir: None,
            audio_dir: None,
            videos_dir: None,
            temp_dir: None,
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            max_images: Self::DEFAULT_MAX_IMAGES,
            frame_rate: Self::DEFAULT_FRAME_RATE,
            resolution: Self::DEFAULT_RESOLUTION.to_string(),
            preset: Self::DEFAULT_PRESET.to_string(),
            crf: Self::DEFAULT_CRF,
            audio_bitrate: Self::DEFAULT_AUDIO_BITRATE.to_string(),
            fallback_duration_secs: Self::DEFAULT_FALLBACK_DURATION,
            encode_timeout_secs: Self::DEFAULT_ENCODE_TIMEOUT,
            video_url_prefix: "/data/videos".to_string(),
        }
    }
}

impl SlidecastConfig {
    pub const DEFAULT_MAX_IMAGES: usize = 10;
    pub const DEFAULT_FRAME_RATE: u32 = 30;
    pub const DEFAULT_FALLBACK_DURATION: f64 = 60.0;
    pub const DEFAULT_ENCODE_TIMEOUT: u64 = 1800;
    pub const DEFAULT_RESOLUTION: &'static str = "1280x720";
    pub const DEFAULT_PRESET: &'static str = "medium";
    pub const DEFAULT_CRF: u8 = 23;
    pub const DEFAULT_AUDIO_BITRATE: &'static str = "192k";

    pub fn load() -> Result<Self> {
        Self::load_from_path(default_config_path()?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to_path(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading slidecast config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing slidecast config {}", path.display()))?;
        Ok(config.normalized())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(self).context("serializing slidecast config")?;
        fs::write(path, toml)
            .with_context(|| format!("writing slidecast config to {}", path.display()))?;
        Ok(())
    }

    fn normalized(mut self) -> Self {
        if self.max_images == 0 {
            self.max_images = Self::DEFAULT_MAX_IMAGES;
        }
        if self.frame_rate == 0 {
            self.frame_rate = Self::DEFAULT_FRAME_RATE;
        }
        if !self.fallback_duration_secs.is_finite() || self.fallback_duration_secs <= 0.0 {
            self.fallback_duration_secs = Self::DEFAULT_FALLBACK_DURATION;
        }
        if parse_resolution(&self.resolution).is_none() {
            self.resolution = Self::DEFAULT_RESOLUTION.to_string();
        }
        if self.preset.trim().is_empty() {
            self.preset = Self::DEFAULT_PRESET.to_string();
        }
        if self.crf > 51 {
            self.crf = Self::DEFAULT_CRF;
        }
        if self.audio_bitrate.trim().is_empty() {
            self.audio_bitrate = Self::DEFAULT_AUDIO_BITRATE.to_string();
        }
        self
    }

    /// Output width and height; falls back to 1280x720 when unparseable.
    pub fn frame_size(&self) -> (u32, u32) {
        parse_resolution(&self.resolution).unwrap_or((1280, 720))
    }

    pub fn encode_timeout(&self) -> Option<Duration> {
        match self.encode_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn data_dirs(&self) -> DataDirs {
        let data_dir = self.data_dir.clone();
        let under = |custom: &Option<PathBuf>, name: &str| {
            custom.clone().unwrap_or_else(|| data_dir.join(name))
        };
        DataDirs {
            images_dir: under(&self.images_dir, "images"),
            audio_dir: under(&self.audio_dir, "audio"),
            videos_dir: under(&self.videos_dir, "videos"),
            temp_dir: under(&self.temp_dir, "temp"),
            data_dir: data_dir.clone(),
        }
    }
}

/// Parse `WIDTHxHEIGHT`. Both sides must be positive and even for yuv420p.
fn parse_resolution(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.trim().split_once(['x', 'X'])?;
    let width: u32 = width.trim().parse().ok()?;
    let height: u32 = height.trim().parse().ok()?;
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return None;
    }
    Some((width, height))
}

fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()
        .context("Unable to determine config directory")?
        .join("slidecast")
        .join("config.toml"))
}

/// Directories the pipeline reads from and writes to, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDirs {
    pub data_dir: PathBuf,
    pub images_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub videos_dir: PathBuf,
    pub temp_dir: PathBuf,
}

impl DataDirs {
    pub fn all(&self) -> [&Path; 5] {
        [
            &self.data_dir,
            &self.videos_dir,
            &self.images_dir,
            &self.audio_dir,
            &self.temp_dir,
        ]
    }

    /// Idempotent; safe to call before every request.
    pub fn ensure_exists(&self) -> io::Result<()> {
        for dir in self.all() {
            fs::create_dir_all(dir).map_err(|err| {
                io::Error::new(
                    err.kind(),
                    format!("Failed to create directory {}: {}", dir.display(), err),
                )
            })?;
        }
        Ok(())
    }

    pub fn simplified_text_path(&self) -> PathBuf {
        self.data_dir.join("simplified-text.json")
    }
}
