use std::collections::VecDeque;
use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;

use crate::video::error::PipelineError;

const STDERR_TAIL_LINES: usize = 12;

#[async_trait]
pub trait EncoderRunner: Send + Sync {
    async fn run(&self, args: &[String], options: EncodeRunOptions) -> Result<(), PipelineError>;
}

#[derive(Debug, Clone, Default)]
pub struct EncodeRunOptions {
    /// Expected output length, enables the progress bar
    pub total_duration: Option<f64>,
    pub verbose: bool,
    pub timeout: Option<Duration>,
}

impl EncodeRunOptions {
    pub fn new(total_duration: Option<f64>, verbose: bool, timeout: Option<Duration>) -> Self {
        Self {
            total_duration,
            verbose,
            timeout,
        }
    }
}

/// Runs the encoder binary found on PATH (or at an explicit path).
#[derive(Debug, Clone)]
pub struct SystemEncoderRunner {
    program: String,
}

impl SystemEncoderRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemEncoderRunner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl EncoderRunner for SystemEncoderRunner {
    async fn run(&self, args: &[String], options: EncodeRunOptions) -> Result<(), PipelineError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => PipelineError::EncoderMissing(self.program.clone()),
                _ => PipelineError::IoError(err),
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("encoder stderr was not captured"))?;

        let pb = if options.verbose {
            None
        } else {
            options.total_duration.map(progress_bar)
        };

        let reader = {
            let pb = pb.clone();
            let verbose = options.verbose;
            tokio::spawn(async move { read_encoder_stderr(stderr, verbose, pb.as_ref()).await })
        };

        let status = match options.timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    child.kill().await?;
                    reader.abort();
                    if let Some(pb) = &pb {
                        pb.abandon_with_message("timed out");
                    }
                    return Err(PipelineError::TimedOut(limit));
                }
            },
            None => child.wait().await?,
        };

        let capture = match reader.await {
            Ok(result) => result?,
            Err(err) => return Err(PipelineError::IoError(io::Error::other(err))),
        };

        if !status.success() {
            if let Some(pb) = &pb {
                pb.abandon_with_message("failed");
            }
            return Err(PipelineError::from_exit_code(
                status.code(),
                &capture.diagnostic(),
            ));
        }

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        Ok(())
    }
}

fn progress_bar(duration: f64) -> ProgressBar {
    let pb = ProgressBar::new((duration * 1000.0) as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>8}/{len:8} ({eta}) {msg}",
    ) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("encoding".to_string());
    pb
}

/// What the encoder said on stderr, reduced to what a failure report needs.
#[derive(Debug, Default)]
pub(crate) struct StderrCapture {
    tail: VecDeque<String>,
    error_lines: Vec<String>,
}

impl StderrCapture {
    fn record(&mut self, line: &str) {
        if self.tail.len() == STDERR_TAIL_LINES {
            self.tail.pop_front();
        }
        self.tail.push_back(line.to_string());

        if line.contains("error") || line.contains("Error") || line.contains("ERROR") {
            self.error_lines.push(line.to_string());
        }
    }

    pub(crate) fn diagnostic(&self) -> String {
        if !self.error_lines.is_empty() {
            self.error_lines.join("\n")
        } else {
            self.tail.iter().cloned().collect::<Vec<_>>().join("\n")
        }
    }
}

pub(crate) async fn read_encoder_stderr<R: AsyncRead + Unpin>(
    mut stderr: R,
    verbose: bool,
    pb: Option<&ProgressBar>,
) -> io::Result<StderrCapture> {
    let mut capture = StderrCapture::default();
    let mut buffer = [0u8; 4096];
    let mut accumulated = String::new();

    loop {
        let bytes_read = stderr.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }

        accumulated.push_str(&String::from_utf8_lossy(&buffer[..bytes_read]));

        // Progress lines are terminated by \r, log lines by \n
        while let Some(pos) = accumulated.find(['\r', '\n']) {
            let line = accumulated[..pos].to_string();
            accumulated.drain(..=pos);
            handle_line(&line, verbose, pb, &mut capture);
        }
    }

    let rest = accumulated.trim().to_string();
    handle_line(&rest, verbose, pb, &mut capture);

    Ok(capture)
}

fn handle_line(line: &str, verbose: bool, pb: Option<&ProgressBar>, capture: &mut StderrCapture) {
    if line.is_empty() {
        return;
    }

    if verbose {
        eprintln!("{}", line);
    }
    capture.record(line);

    if let Some(pb) = pb {
        if let Some(progress) = parse_encoder_progress(line) {
            pb.set_position((progress * 1000.0) as u64);
            if let Some(speed) = parse_encoder_speed(line) {
                pb.set_message(speed);
            }
        }
    }
}

fn parse_encoder_progress(line: &str) -> Option<f64> {
    let time_start = line.find("time=")?;
    let time_str = &line[time_start + 5..];
    let time_end = time_str.find(' ')?;
    parse_time_to_seconds(&time_str[..time_end])
}

fn parse_time_to_seconds(time_str: &str) -> Option<f64> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_encoder_speed(line: &str) -> Option<String> {
    let speed_start = line.find("speed=")?;
    let speed_str = line[speed_start + 6..].trim_start();
    let speed_end = speed_str.find('x')?;
    Some(speed_str[..=speed_end].to_string())
}
