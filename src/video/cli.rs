use clap::{Args, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum VideoCommands {
    /// Assemble a slideshow video from the stored text, narration and images
    Generate(GenerateArgs),
    /// List rendered videos, newest first
    Videos,
    /// Print the duration of an audio file in seconds
    Probe(ProbeArgs),
    /// Build SRT subtitles from a text file spread over a duration
    Subtitles(SubtitlesArgs),
    /// Check that the encoder tools and data directories are usable
    Check,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Burn sentence subtitles into the video
    #[arg(long)]
    pub subtitles: bool,

    /// Maximum number of images to place on the timeline
    #[arg(long, value_name = "N")]
    pub max_images: Option<usize>,

    /// Output frame rate
    #[arg(long, value_name = "N")]
    pub fps: Option<u32>,

    /// Kill the encoder after this many seconds (0 disables the limit)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Plain text file to use instead of the stored simplified text
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub text_file: Option<PathBuf>,

    /// Narration file to use instead of the newest stored audio
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub audio: Option<PathBuf>,

    /// Directory to take images from instead of the configured one
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub images_dir: Option<PathBuf>,

    /// Output path; defaults to video-<request-id>.mp4 in the videos directory
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    /// Show the ffmpeg command, concat list, timeline and cues without encoding
    #[arg(long)]
    pub dry_run: bool,

    /// Show raw encoder output instead of a progress bar
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Audio file to measure
    #[arg(value_hint = ValueHint::FilePath)]
    pub audio: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SubtitlesArgs {
    /// Plain text file holding the narration text
    #[arg(value_hint = ValueHint::FilePath)]
    pub text_file: PathBuf,

    /// Total duration in seconds to spread the cues over
    #[arg(long, value_name = "SECONDS")]
    pub duration: f64,

    /// Write the SRT here instead of printing it
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,
}
