use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use super::check::run_checks;
use super::cli::{GenerateArgs, ProbeArgs, SubtitlesArgs, VideoCommands};
use super::config::SlidecastConfig;
use super::encode::{EncodeInput, EncodeProfile, JobResult, SystemEncoderRunner};
use super::error::PipelineError;
use super::library::MediaLibrary;
use super::pipeline::{GenerationRequest, PipelineSettings, generate_video, prepare_job};
use super::probe::{Ffprobe, probe_duration};
use super::srt::{SubtitleCue, synthesize_subtitles, to_srt};
use super::timeline::TimelineEntry;
use crate::ui::prelude::*;

/// Runs one video command and returns the process exit code.
pub async fn handle_video_command(command: VideoCommands, config_path: Option<&Path>) -> Result<i32> {
    let config = match config_path {
        Some(path) => SlidecastConfig::load_from_path(path)?,
        None => SlidecastConfig::load()?,
    };

    match command {
        VideoCommands::Generate(args) => handle_generate(&config, args).await,
        VideoCommands::Videos => handle_videos(&config),
        VideoCommands::Probe(args) => handle_probe(&config, args).await,
        VideoCommands::Subtitles(args) => handle_subtitles(args),
        VideoCommands::Check => handle_check(&config).await,
    }
}

fn settings_for(config: &SlidecastConfig, args: &GenerateArgs) -> PipelineSettings {
    let mut settings = PipelineSettings::from_config(config);
    if let Some(max_images) = args.max_images {
        settings.max_images = max_images;
    }
    if let Some(fps) = args.fps.filter(|fps| *fps > 0) {
        settings.profile.frame_rate = fps;
    }
    if let Some(secs) = args.timeout {
        settings.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    settings.verbose = args.verbose;
    settings
}

fn resolve_request(library: &MediaLibrary, args: &GenerateArgs) -> Result<GenerationRequest, PipelineError> {
    let text = match &args.text_file {
        Some(path) => fs::read_to_string(path)?,
        None => library.simplified_text()?,
    };
    let audio = match &args.audio {
        Some(path) => path.clone(),
        None => library.latest_audio()?.path,
    };
    let images = library.images()?;
    let output = args
        .out_file
        .clone()
        .unwrap_or_else(|| library.new_video_path());

    Ok(GenerationRequest {
        text,
        audio,
        images,
        include_subtitles: args.subtitles,
        output,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DryRunReport<'a> {
    command: Vec<String>,
    inputs: &'a [EncodeInput],
    profile: &'a EncodeProfile,
    timeline: &'a [TimelineEntry],
    cues: &'a [SubtitleCue],
    concat_list: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtitles: Option<String>,
    narration_duration: f64,
}

async fn handle_generate(config: &SlidecastConfig, args: GenerateArgs) -> Result<i32> {
    let settings = settings_for(config, &args);
    let mut dirs = config.data_dirs();
    if let Some(images_dir) = &args.images_dir {
        dirs.images_dir = images_dir.clone();
    }
    let library = MediaLibrary::new(dirs.clone(), config.video_url_prefix.clone());
    let probe = Ffprobe::new(config.ffprobe.clone());

    let request = match resolve_request(&library, &args) {
        Ok(request) => request,
        Err(err) => return Ok(report_result(JobResult::failure(&err))),
    };

    if args.dry_run {
        let prepared = match prepare_job(&dirs, &settings, &request, &probe).await {
            Ok(prepared) => prepared,
            Err(err) => return Ok(report_result(JobResult::failure(&err))),
        };

        let mut command = vec![config.ffmpeg.clone()];
        command.extend(prepared.job.args());
        let concat_list = fs::read_to_string(prepared.job.concat_list_path())
            .with_context(|| format!("reading {}", prepared.job.concat_list_path().display()))?;
        let subtitles = match prepared.job.subtitle_file() {
            Some(path) => Some(
                fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
            ),
            None => None,
        };
        let report = DryRunReport {
            command,
            inputs: prepared.job.inputs(),
            profile: prepared.job.profile(),
            timeline: prepared.timeline.entries(),
            cues: &prepared.cues,
            concat_list,
            subtitles,
            narration_duration: prepared.narration_duration,
        };

        print_result(&report, || {
            let mut text = format!(
                "{}\n\n{}",
                shell_words::join(&report.command),
                report.concat_list.trim_end()
            );
            for entry in report.timeline {
                text.push_str(&format!(
                    "\n# {:>8.3}s +{:.3}s  {}",
                    entry.start_offset,
                    entry.duration,
                    entry.asset.file_name()
                ));
            }
            if !report.cues.is_empty() {
                text.push_str(&format!("\n\n{}", to_srt(report.cues).trim_end()));
            }
            text
        });
        // The job's temporary files go away with `prepared`
        return Ok(0);
    }

    let runner = SystemEncoderRunner::new(config.ffmpeg.clone());
    let result = generate_video(&dirs, &settings, &request, &probe, &runner).await;
    let result = match library.video_url_for(&request.output) {
        Some(url) => result.with_video_url(url),
        None => result,
    };
    Ok(report_result(result))
}

fn report_result(result: JobResult) -> i32 {
    print_result(&result, || match (&result.output_path, &result.error) {
        (Some(path), _) if result.success => match &result.video_url {
            Some(url) => format!("Video written to {} ({})", path.display(), url),
            None => format!("Video written to {}", path.display()),
        },
        (_, Some(error)) => error.clone(),
        _ => "Failed to generate video".to_string(),
    });
    result.exit_code
}

fn handle_videos(config: &SlidecastConfig) -> Result<i32> {
    let library = MediaLibrary::new(config.data_dirs(), config.video_url_prefix.clone());
    let videos = library.videos()?;

    print_result(&videos, || {
        if videos.is_empty() {
            return "No videos found".to_string();
        }
        videos
            .iter()
            .map(|video| {
                format!(
                    "{}  {}  {}",
                    video.modified.format("%Y-%m-%d %H:%M:%S"),
                    video.name,
                    video.url
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    });
    Ok(0)
}

#[derive(Serialize)]
struct ProbeReport<'a> {
    path: &'a Path,
    duration: f64,
}

async fn handle_probe(config: &SlidecastConfig, args: ProbeArgs) -> Result<i32> {
    let probe = Ffprobe::new(config.ffprobe.clone());
    let duration = probe_duration(&probe, &args.audio, config.fallback_duration_secs).await;

    let report = ProbeReport {
        path: &args.audio,
        duration,
    };
    print_result(&report, || format!("{:.3}", duration));
    Ok(0)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubtitlesReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    out_file: Option<PathBuf>,
    cues: Vec<SubtitleCue>,
}

fn handle_subtitles(args: SubtitlesArgs) -> Result<i32> {
    let text = fs::read_to_string(&args.text_file)
        .with_context(|| format!("reading text from {}", args.text_file.display()))?;
    if !args.duration.is_finite() || args.duration < 0.0 {
        bail!("Duration must be a non-negative number of seconds");
    }

    let cues = synthesize_subtitles(&text, args.duration);
    let srt = to_srt(&cues);

    if let Some(out) = &args.out_file {
        fs::write(out, &srt).with_context(|| format!("writing subtitles to {}", out.display()))?;
    }

    let report = SubtitlesReport {
        out_file: args.out_file.clone(),
        cues,
    };
    print_result(&report, || match &report.out_file {
        Some(out) => format!("Wrote {} cue(s) to {}", report.cues.len(), out.display()),
        None => srt.trim_end().to_string(),
    });
    Ok(0)
}

async fn handle_check(config: &SlidecastConfig) -> Result<i32> {
    let results = run_checks(config).await;
    let all_passed = results.iter().all(|r| r.status.is_success());

    print_result(&results, || {
        results
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    });
    Ok(if all_passed { 0 } else { 1 })
}
