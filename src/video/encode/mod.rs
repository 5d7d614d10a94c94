//! Encoder invocation: job construction, per-request scratch files and process execution.

mod executor;
mod job;
mod runner;
mod workspace;

pub use executor::{JobResult, execute};
pub use job::{EncodeInput, EncodeJob, EncodeProfile, build_encode_job};
pub use runner::{EncodeRunOptions, EncoderRunner, SystemEncoderRunner};
pub use workspace::{JobWorkspace, new_request_id};
