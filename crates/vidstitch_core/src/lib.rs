pub mod error;
pub mod types;

pub use error::{RequestError, Result};
pub use types::{AudioTracks, OutputSize, RenderRequest, TimeRange};
