use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request contains no video files")]
    NoVideoFiles,

    #[error("expected {videos} time ranges for {videos} video files, got {ranges}")]
    RangeCountMismatch { videos: usize, ranges: usize },

    #[error("output dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, RequestError>;
