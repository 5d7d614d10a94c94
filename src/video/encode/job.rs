use std::path::{Path, PathBuf};

use serde::Serialize;

use super::workspace::JobWorkspace;
use crate::video::error::PipelineError;
use crate::video::timeline::Timeline;

/// Fixed output parameters of a slideshow encode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeProfile {
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub pixel_format: String,
    pub frame_rate: u32,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for EncodeProfile {
    fn default() -> Self {
        Self::h264_aac(30)
    }
}

impl EncodeProfile {
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 720;

    /// 720p H.264 + AAC in yuv420p, which every mainstream player decodes.
    pub fn h264_aac(frame_rate: u32) -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            pixel_format: "yuv420p".to_string(),
            frame_rate: frame_rate.max(1),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }

    /// Fit every image into the output frame, letterboxed and centred.
    ///
    /// Mixed or odd image sizes would otherwise be rejected by yuv420p.
    pub fn scale_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
            w = self.width,
            h = self.height
        )
    }

    pub fn push_to(&self, args: &mut Vec<String>) {
        args.extend([
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-r".to_string(),
            self.frame_rate.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            // Output ends with whichever input runs out first
            "-shortest".to_string(),
        ]);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncodeInput {
    Image {
        path: PathBuf,
        duration: Option<f64>,
    },
    Audio {
        path: PathBuf,
    },
}

/// A fully described encoder invocation. Built once, consumed by the executor.
#[derive(Debug)]
pub struct EncodeJob {
    inputs: Vec<EncodeInput>,
    concat_list: PathBuf,
    subtitle_file: Option<PathBuf>,
    output_path: PathBuf,
    profile: EncodeProfile,
    expected_duration: f64,
    tail_duration: f64,
    workspace: JobWorkspace,
}

impl EncodeJob {
    pub fn inputs(&self) -> &[EncodeInput] {
        &self.inputs
    }

    pub fn concat_list_path(&self) -> &Path {
        &self.concat_list
    }

    pub fn subtitle_file(&self) -> Option<&Path> {
        self.subtitle_file.as_deref()
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn profile(&self) -> &EncodeProfile {
        &self.profile
    }

    pub fn expected_duration(&self) -> f64 {
        self.expected_duration
    }

    pub fn request_id(&self) -> &str {
        self.workspace.request_id()
    }

    pub(super) fn workspace_mut(&mut self) -> &mut JobWorkspace {
        &mut self.workspace
    }

    pub fn audio_path(&self) -> Option<&Path> {
        self.inputs.iter().find_map(|input| match input {
            EncodeInput::Audio { path } => Some(path.as_path()),
            EncodeInput::Image { .. } => None,
        })
    }

    /// Scale and pad, hold the final image, then burn in subtitles.
    pub fn filter_chain(&self) -> String {
        let mut filters = vec![self.profile.scale_filter()];
        // The concat demuxer shows an image without a duration for a single frame
        if self.tail_duration > 0.0 {
            filters.push(format!(
                "tpad=stop_mode=clone:stop_duration={}",
                format_seconds(self.tail_duration)
            ));
        }
        if let Some(subtitles) = &self.subtitle_file {
            filters.push(format!("subtitles='{}'", escape_filter_path(subtitles)));
        }
        filters.join(",")
    }

    /// Encoder argument vector, without the program name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            // Lets the list reference absolute paths
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            self.concat_list.to_string_lossy().into_owned(),
        ];

        if let Some(audio) = self.audio_path() {
            args.push("-i".to_string());
            args.push(audio.to_string_lossy().into_owned());
        }

        args.push("-vf".to_string());
        args.push(self.filter_chain());

        self.profile.push_to(&mut args);
        args.push(self.output_path.to_string_lossy().into_owned());
        args
    }
}

/// Write the concat list for `timeline` into `workspace` and describe the encode.
///
/// `subtitle_file` is burned into the video when given; the workspace decides
/// whether it is removed afterwards.
pub fn build_encode_job(
    timeline: &Timeline,
    audio_path: &Path,
    output_path: &Path,
    subtitle_file: Option<PathBuf>,
    profile: EncodeProfile,
    mut workspace: JobWorkspace,
) -> Result<EncodeJob, PipelineError> {
    let (last, leading) = timeline.split_last().ok_or(PipelineError::NoImages)?;

    let mut inputs: Vec<EncodeInput> = leading
        .iter()
        .map(|entry| EncodeInput::Image {
            path: entry.asset.path.clone(),
            duration: Some(entry.duration),
        })
        .collect();
    // The concat demuxer derives the final segment's length from its input
    inputs.push(EncodeInput::Image {
        path: last.asset.path.clone(),
        duration: None,
    });
    inputs.push(EncodeInput::Audio {
        path: audio_path.to_path_buf(),
    });

    let concat_list =
        workspace.write_artifact(workspace.concat_list_path(), &render_concat_list(&inputs))?;

    Ok(EncodeJob {
        inputs,
        concat_list,
        subtitle_file,
        output_path: output_path.to_path_buf(),
        profile,
        expected_duration: timeline.total_duration(),
        tail_duration: last.duration,
        workspace,
    })
}

/// `file '<path>'` / `duration <seconds>` lines for every image input.
pub fn render_concat_list(inputs: &[EncodeInput]) -> String {
    let mut lines = Vec::new();
    for input in inputs {
        if let EncodeInput::Image { path, duration } = input {
            lines.push(format!("file '{}'", escape_concat_path(path)));
            if let Some(seconds) = duration {
                lines.push(format!("duration {}", format_seconds(*seconds)));
            }
        }
    }
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

pub fn format_seconds(value: f64) -> String {
    format!("{value:.6}")
}

fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Escape a path for use inside a quoted filter argument (`subtitles='...'`).
///
/// Backslashes and colons are escaped for the option parser. A quote cannot
/// appear inside the graph-level quotes, so it closes them, is written as
/// `\\\'` and reopens them.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "'\\\\\\''")
}
