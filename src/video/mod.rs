pub mod cli;
pub mod commands;
mod asset;
mod check;
mod config;
mod encode;
mod error;
mod library;
mod logging;
mod pipeline;
mod probe;
mod srt;
mod timeline;

pub use cli::VideoCommands;
pub use commands::handle_video_command;
