mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;
use std::fs;

#[cfg(unix)]
#[test]
fn test_generate_with_stub_encoder() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.install_stub_tools(true)?;
    env.add_inputs("A cat sat. It slept. It woke up.", 3)?;

    let output = utils::run_slidecast_command(&env, &["--output", "json", "generate", "--subtitles"])?;
    assert_eq!(output.exit_code, 0, "generate failed: {}", output.stderr);

    let result = output.json()?;
    assert_eq!(result["success"], true);
    let path = result["outputPath"].as_str().unwrap_or_default().to_string();
    assert!(fs::metadata(&path).is_ok(), "missing output {path}");
    assert!(
        result["videoUrl"]
            .as_str()
            .is_some_and(|url| url.starts_with("/data/videos/video-"))
    );
    assert!(env.temp_files()?.is_empty());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_generate_to_custom_path_has_no_video_url() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.install_stub_tools(true)?;
    env.add_inputs("Short. Story.", 2)?;
    let out = env.path().join("custom.mp4");

    let output = utils::run_slidecast_command(
        &env,
        &["--output", "json", "generate", "-o", out.to_str().unwrap_or_default()],
    )?;
    assert_eq!(output.exit_code, 0, "generate failed: {}", output.stderr);

    let result = output.json()?;
    assert_eq!(result["success"], true);
    assert!(out.exists());
    assert!(result.get("videoUrl").is_none());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_generate_reports_encoder_failure() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.install_stub_tools(false)?;
    env.add_inputs("One sentence only.", 2)?;

    let output = utils::run_slidecast_command(&env, &["--output", "json", "generate"])?;
    assert_eq!(output.exit_code, 1);

    let result = output.json()?;
    assert_eq!(result["success"], false);
    assert!(
        result["error"]
            .as_str()
            .is_some_and(|e| e.contains("Permission denied"))
    );
    assert!(result.get("outputPath").is_none());
    assert!(env.temp_files()?.is_empty());
    assert_eq!(fs::read_dir(env.data_dir().join("videos"))?.count(), 0);
    Ok(())
}

#[test]
fn test_generate_without_images_exits_with_two() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.add_inputs("Nothing to show.", 0)?;

    let output = utils::run_slidecast_command(&env, &["--output", "json", "generate"])?;
    assert_eq!(output.exit_code, 2);
    assert_eq!(
        output.json()?["error"],
        "Failed to generate video: No images available"
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_dry_run_prints_command_and_cleans_up() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.install_stub_tools(true)?;
    env.add_inputs("A cat sat. It slept. It woke up.", 3)?;

    let output = utils::run_slidecast_command(&env, &["generate", "--dry-run", "--subtitles"])?;
    assert_eq!(output.exit_code, 0, "dry run failed: {}", output.stderr);
    assert!(output.stdout.contains("-f concat -safe 0"));
    assert!(output.stdout.contains("subtitles="));
    assert!(output.stdout.contains("scale=1280:720"));
    assert!(output.stdout.contains("-b:a 192k"));
    assert_eq!(output.stdout.matches("duration 3.000000").count(), 2);
    assert_eq!(output.stdout.lines().filter(|l| l.starts_with("# ")).count(), 3);
    assert!(output.stdout.contains("00:00:00,000 --> 00:00:03,000\nA cat sat."));
    assert!(env.temp_files()?.is_empty());
    assert_eq!(fs::read_dir(env.data_dir().join("videos"))?.count(), 0);
    Ok(())
}

#[test]
fn test_probe_falls_back_when_prober_is_missing() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_config("ffmpeg", "slidecast-no-such-ffprobe")?;

    let output = utils::run_slidecast_command(&env, &["probe", "missing.mp3"])?;
    assert_eq!(output.exit_code, 0, "probe failed: {}", output.stderr);
    assert_eq!(output.stdout.trim(), "60.000");
    Ok(())
}

#[test]
fn test_subtitles_command_writes_srt() -> Result<()> {
    let env = TestEnvironment::new()?;
    let text = env.path().join("text.txt");
    fs::write(&text, "Hello there. How are you?")?;

    let output = utils::run_slidecast_command(
        &env,
        &["subtitles", text.to_str().unwrap_or_default(), "--duration", "4"],
    )?;
    assert_eq!(output.exit_code, 0, "subtitles failed: {}", output.stderr);
    assert_eq!(
        output.stdout,
        "1\n00:00:00,000 --> 00:00:02,000\nHello there.\n\n2\n00:00:02,000 --> 00:00:04,000\nHow are you?\n"
    );
    Ok(())
}

#[test]
fn test_videos_lists_rendered_files() -> Result<()> {
    let env = TestEnvironment::new()?;
    fs::write(env.data_dir().join("videos").join("video-1.mp4"), b"mp4")?;
    fs::write(env.data_dir().join("videos").join("notes.txt"), b"txt")?;

    let output = utils::run_slidecast_command(&env, &["--output", "json", "videos"])?;
    assert_eq!(output.exit_code, 0, "videos failed: {}", output.stderr);

    let listed = output.json()?;
    let listed = listed.as_array().cloned().unwrap_or_default();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "video-1.mp4");
    assert_eq!(listed[0]["url"], "/data/videos/video-1.mp4");
    Ok(())
}
