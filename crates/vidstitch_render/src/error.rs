use std::path::PathBuf;
use thiserror::Error;
use vidstitch_core::RequestError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("ffmpeg not found at: {0}")]
    FfmpegNotFound(PathBuf),

    #[error("ffmpeg at {0} does not have execute permissions")]
    FfmpegNotExecutable(PathBuf),

    #[error(transparent)]
    InvalidRequest(#[from] RequestError),

    #[error("output directory does not exist: {0}")]
    OutputDirMissing(PathBuf),

    #[error("failed to start ffmpeg: {0}")]
    Spawn(String),

    #[error("ffmpeg exited with code {code}: {stderr}")]
    FfmpegFailed { code: i32, stderr: String },

    #[error("render cancelled")]
    Cancelled { stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
