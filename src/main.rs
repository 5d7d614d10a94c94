mod ui;
mod video;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;

use crate::ui::prelude::*;
use crate::video::{VideoCommands, handle_video_command};

/// Slidecast: narrated slideshow videos from text, audio and images
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for results and events
    #[arg(long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Video(VideoCommands),

    /// Print shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub(crate) fn cli_command() -> clap::Command {
    Cli::command()
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Video(command) => handle_video_command(command, cli.config.as_deref()).await,
        Commands::Completions { shell } => {
            let mut command = cli_command();
            clap_complete::generate(shell, &mut command, "slidecast", &mut io::stdout());
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    ui::init(cli.output, !cli.no_color);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            emit(Level::Error, "slidecast.error", &format!("Error: {err:#}"), None);
            1
        }
    };

    std::process::exit(code);
}
