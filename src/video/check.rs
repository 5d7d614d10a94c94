use std::fmt::Display;
use std::process::Stdio;

use colored::*;
use serde::Serialize;
use tokio::process::Command;

use crate::video::config::{DataDirs, SlidecastConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum CheckStatus {
    Pass(String),
    Fail(String),
}

impl CheckStatus {
    pub fn message(&self) -> &String {
        match self {
            CheckStatus::Pass(msg) => msg,
            CheckStatus::Fail(msg) => msg,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckStatus::Pass(_))
    }

    pub fn color_status(&self) -> impl Display {
        match self {
            CheckStatus::Pass(_) => "PASS".green(),
            CheckStatus::Fail(_) => "FAIL".red(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    #[serde(flatten)]
    pub status: CheckStatus,
}

impl Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} - {}",
            self.name.bold(),
            self.status.color_status(),
            self.status.message()
        )
    }
}

/// Whether `program` resolves and answers `-version` successfully.
pub async fn check_tool(name: &str, program: &str) -> CheckResult {
    let status = match which::which(program) {
        Err(_) => CheckStatus::Fail(format!("'{program}' was not found on PATH")),
        Ok(resolved) => {
            let ran = Command::new(&resolved)
                .arg("-version")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            match ran {
                Ok(exit) if exit.success() => {
                    CheckStatus::Pass(format!("{}", resolved.display()))
                }
                Ok(exit) => CheckStatus::Fail(format!(
                    "{} -version exited with status {:?}",
                    resolved.display(),
                    exit.code()
                )),
                Err(err) => CheckStatus::Fail(format!("Failed to run {}: {err}", resolved.display())),
            }
        }
    };
    CheckResult {
        name: name.to_string(),
        status,
    }
}

/// Create the data directories (idempotent) and report each one.
pub fn check_directories(dirs: &DataDirs) -> Vec<CheckResult> {
    let created = dirs.ensure_exists();
    dirs.all()
        .iter()
        .map(|dir| CheckResult {
            name: format!("directory {}", dir.display()),
            status: if dir.is_dir() {
                CheckStatus::Pass("present".to_string())
            } else {
                CheckStatus::Fail(match &created {
                    Err(err) => err.to_string(),
                    Ok(()) => "missing".to_string(),
                })
            },
        })
        .collect()
}

pub async fn run_checks(config: &SlidecastConfig) -> Vec<CheckResult> {
    let (encoder, prober) = tokio::join!(
        check_tool("encoder", &config.ffmpeg),
        check_tool("probe", &config.ffprobe)
    );
    let mut results = vec![encoder, prober];
    results.extend(check_directories(&config.data_dirs()));
    results
}
