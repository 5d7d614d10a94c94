//! The video-assembly pipeline: probe → plan → subtitles → job → encode.
//!
//! Every command goes through [`prepare_job`] and [`generate_video`]; the
//! steps run strictly in order and the only suspension points are the probe
//! and encoder child processes.

use std::path::PathBuf;
use std::time::Duration;

use crate::ui::prelude::Level;
use crate::video::asset::MediaAsset;
use crate::video::config::{DataDirs, SlidecastConfig};
use crate::video::encode::{
    EncodeJob, EncodeProfile, EncodeRunOptions, EncoderRunner, JobResult, JobWorkspace,
    build_encode_job, execute,
};
use crate::video::error::PipelineError;
use crate::video::logging::log_event;
use crate::video::probe::{DurationProbe, probe_duration};
use crate::video::srt::{SubtitleCue, synthesize_subtitles, to_srt};
use crate::video::timeline::{Timeline, plan_timeline};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_images: usize,
    pub fallback_duration: f64,
    pub profile: EncodeProfile,
    pub timeout: Option<Duration>,
    pub verbose: bool,
    pub progress: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &SlidecastConfig) -> Self {
        Self {
            max_images: config.max_images,
            fallback_duration: config.fallback_duration_secs,
            profile: profile_from_config(config),
            timeout: config.encode_timeout(),
            verbose: false,
            progress: true,
        }
    }
}

fn profile_from_config(config: &SlidecastConfig) -> EncodeProfile {
    let (width, height) = config.frame_size();
    EncodeProfile {
        width,
        height,
        preset: config.preset.clone(),
        crf: config.crf,
        audio_bitrate: config.audio_bitrate.clone(),
        ..EncodeProfile::h264_aac(config.frame_rate)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&SlidecastConfig::default())
    }
}

/// Already-resolved inputs for one video.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub text: String,
    pub audio: PathBuf,
    pub images: Vec<MediaAsset>,
    pub include_subtitles: bool,
    pub output: PathBuf,
}

#[derive(Debug)]
pub struct PreparedJob {
    pub narration_duration: f64,
    pub timeline: Timeline,
    pub cues: Vec<SubtitleCue>,
    pub job: EncodeJob,
}

fn validate(request: &GenerationRequest) -> Result<(), PipelineError> {
    if request.text.trim().is_empty() {
        return Err(PipelineError::MissingText);
    }
    if !request.audio.is_file() {
        return Err(PipelineError::MissingAudio);
    }
    if request.images.is_empty() {
        return Err(PipelineError::NoImages);
    }
    Ok(())
}

/// Run every stage up to, but not including, the encode.
pub async fn prepare_job(
    dirs: &DataDirs,
    settings: &PipelineSettings,
    request: &GenerationRequest,
    probe: &dyn DurationProbe,
) -> Result<PreparedJob, PipelineError> {
    validate(request)?;
    dirs.ensure_exists()?;

    log_event(
        Level::Info,
        "video.generate.probe",
        format!("Probing narration {}", request.audio.display()),
    );
    let narration_duration = probe_duration(probe, &request.audio, settings.fallback_duration).await;

    let timeline = plan_timeline(narration_duration, &request.images, settings.max_images)?;
    log_event(
        Level::Info,
        "video.generate.timeline",
        format!(
            "Planned {} image(s) over {:.2}s",
            timeline.len(),
            timeline.total_duration()
        ),
    );

    let mut workspace = JobWorkspace::create(&dirs.temp_dir)?;

    let (cues, subtitle_file) = if request.include_subtitles {
        // Cues follow the planned timeline, which floors unusable durations
        let cues = synthesize_subtitles(&request.text, timeline.total_duration());
        log_event(
            Level::Info,
            "video.generate.subtitles",
            format!("Synthesized {} subtitle cue(s)", cues.len()),
        );
        let path = workspace.write_artifact(workspace.subtitle_path(), &to_srt(&cues))?;
        (cues, Some(path))
    } else {
        (Vec::new(), None)
    };

    let job = build_encode_job(
        &timeline,
        &request.audio,
        &request.output,
        subtitle_file,
        settings.profile.clone(),
        workspace,
    )?;

    Ok(PreparedJob {
        narration_duration,
        timeline,
        cues,
        job,
    })
}

/// Produce the video for `request`, reporting failures as a result rather than an error.
pub async fn generate_video(
    dirs: &DataDirs,
    settings: &PipelineSettings,
    request: &GenerationRequest,
    probe: &dyn DurationProbe,
    runner: &dyn EncoderRunner,
) -> JobResult {
    log_event(
        Level::Info,
        "video.generate.start",
        format!("Generating {}", request.output.display()),
    );

    let prepared = match prepare_job(dirs, settings, request, probe).await {
        Ok(prepared) => prepared,
        Err(err) => {
            log_event(Level::Error, "video.generate.rejected", err.to_string());
            return JobResult::failure(&err);
        }
    };

    let total = prepared.job.expected_duration();
    let options = EncodeRunOptions::new(
        settings.progress.then_some(total),
        settings.verbose,
        settings.timeout,
    );
    execute(prepared.job, runner, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::config::SlidecastConfig;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    struct FixedProbe(f64);

    #[async_trait]
    impl DurationProbe for FixedProbe {
        async fn duration_seconds(&self, _path: &Path) -> anyhow::Result<f64> {
            Ok(self.0)
        }
    }

    /// Records the arguments it was given and always succeeds.
    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl EncoderRunner for RecordingRunner {
        async fn run(&self, args: &[String], _options: EncodeRunOptions) -> Result<(), PipelineError> {
            self.calls.lock().unwrap().push(args.to_vec());
            Ok(())
        }
    }

    fn fixture(root: &Path, images: usize) -> (DataDirs, GenerationRequest) {
        let config = SlidecastConfig {
            data_dir: root.join("data"),
            ..SlidecastConfig::default()
        };
        let dirs = config.data_dirs();
        dirs.ensure_exists().unwrap();

        let audio = dirs.audio_dir.join("narration.mp3");
        fs::write(&audio, b"id3").unwrap();
        let images = (1..=images)
            .map(|i| {
                let path = dirs.images_dir.join(format!("image-{i}.png"));
                fs::write(&path, b"png").unwrap();
                MediaAsset::new(path, Utc::now())
            })
            .collect();

        let request = GenerationRequest {
            text: "A cat sat. It slept. It woke up.".to_string(),
            audio,
            images,
            include_subtitles: true,
            output: dirs.videos_dir.join("video-test.mp4"),
        };
        (dirs, request)
    }

    fn quiet_settings() -> PipelineSettings {
        PipelineSettings {
            progress: false,
            ..PipelineSettings::default()
        }
    }

    fn temp_files(dirs: &DataDirs) -> Vec<PathBuf> {
        fs::read_dir(&dirs.temp_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn three_sentences_three_images_nine_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let (dirs, request) = fixture(dir.path(), 3);
        let settings = quiet_settings();

        let prepared = prepare_job(&dirs, &settings, &request, &FixedProbe(9.0))
            .await
            .unwrap();

        assert_eq!(prepared.narration_duration, 9.0);
        let durations: Vec<f64> = prepared.timeline.entries().iter().map(|e| e.duration).collect();
        assert_eq!(durations, vec![3.0, 3.0, 3.0]);

        assert_eq!(prepared.cues.len(), 3);
        for (i, cue) in prepared.cues.iter().enumerate() {
            assert_eq!(cue.start, 3.0 * i as f64);
            assert_eq!(cue.end, 3.0 * (i + 1) as f64);
        }

        let list = fs::read_to_string(prepared.job.concat_list_path()).unwrap();
        assert_eq!(list.lines().count(), 5);
        let subtitles = prepared.job.subtitle_file().unwrap().to_path_buf();
        assert!(fs::read_to_string(&subtitles).unwrap().contains("It woke up."));

        let runner = RecordingRunner::default();
        let result = execute(prepared.job, &runner, EncodeRunOptions::default()).await;

        assert!(result.success);
        assert_eq!(result.output_path, Some(request.output.clone()));
        assert!(temp_files(&dirs).is_empty());

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].iter().any(|arg| arg.starts_with("subtitles='")));
    }

    #[tokio::test]
    async fn zero_length_narration_keeps_cues_visible() {
        let dir = tempfile::tempdir().unwrap();
        let (dirs, mut request) = fixture(dir.path(), 3);
        request.text = "A. B. C.".to_string();

        let prepared = prepare_job(&dirs, &quiet_settings(), &request, &FixedProbe(0.0))
            .await
            .unwrap();

        let total = prepared.timeline.total_duration();
        assert!((total - 0.3).abs() < 1e-9);
        assert_eq!(prepared.cues.len(), 3);
        assert!(prepared.cues.iter().all(|cue| cue.end > cue.start));
        assert!((prepared.cues[2].end - total).abs() < 1e-9);

        let srt = fs::read_to_string(prepared.job.subtitle_file().unwrap()).unwrap();
        assert!(!srt.contains("00:00:00,000 --> 00:00:00,000"));
    }

    #[tokio::test]
    async fn generate_video_without_subtitles_skips_filter() {
        let dir = tempfile::tempdir().unwrap();
        let (dirs, mut request) = fixture(dir.path(), 12);
        request.include_subtitles = false;
        let runner = RecordingRunner::default();

        let result =
            generate_video(&dirs, &quiet_settings(), &request, &FixedProbe(20.0), &runner).await;

        assert!(result.success);
        let calls = runner.calls.lock().unwrap();
        assert!(!calls[0].iter().any(|arg| arg.contains("subtitles=")));
        assert!(temp_files(&dirs).is_empty());
    }

    #[tokio::test]
    async fn missing_inputs_stop_before_any_stage() {
        let dir = tempfile::tempdir().unwrap();
        let (dirs, request) = fixture(dir.path(), 2);
        let runner = RecordingRunner::default();
        let settings = quiet_settings();

        let no_images = GenerationRequest {
            images: Vec::new(),
            ..request.clone()
        };
        let no_audio = GenerationRequest {
            audio: dirs.audio_dir.join("missing.mp3"),
            ..request.clone()
        };
        let no_text = GenerationRequest {
            text: "   ".to_string(),
            ..request.clone()
        };

        for (bad, expected) in [
            (no_images, "No images available"),
            (no_audio, "No audio file available"),
            (no_text, "No simplified text available"),
        ] {
            let result = generate_video(&dirs, &settings, &bad, &FixedProbe(9.0), &runner).await;
            assert!(!result.success);
            assert_eq!(result.exit_code, 2);
            assert!(result.error.unwrap().ends_with(expected));
        }

        assert!(runner.calls.lock().unwrap().is_empty());
        assert!(temp_files(&dirs).is_empty());
    }
}
