use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{RequestError, Result};

// ---------------------------------------------------------------------------
// TimeRange
// ---------------------------------------------------------------------------

/// A `[start, end)` span in seconds within a source clip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Span length in seconds. Inverted ranges count as zero; they are kept
    /// in the request so the encoder rejects them rather than being skipped.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// OutputSize
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// AudioTracks
// ---------------------------------------------------------------------------

/// Audio sources for a render. A missing voice track falls back to the
/// externally supplied temporary voice file; background music is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AudioTracks {
    pub voice: Option<PathBuf>,
    pub bgm: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// RenderRequest
// ---------------------------------------------------------------------------

/// One render job: clips to concatenate, their trim ranges, audio tracks,
/// subtitles, and output parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderRequest {
    /// Source clips, in playback order. Input index `i` in the generated
    /// command belongs to `video_files[i]`.
    pub video_files: Vec<PathBuf>,

    /// One trim range per video file, same order and length.
    pub time_ranges: Vec<TimeRange>,

    #[serde(default)]
    pub audio: AudioTracks,

    /// Subtitle file to burn in. Defaults to a sibling of the voice track
    /// with an `.srt` extension.
    #[serde(default)]
    pub subtitle_file: Option<PathBuf>,

    pub output_size: OutputSize,

    pub output_path: PathBuf,

    /// Hard cap on the output duration in seconds (`-t`).
    #[serde(default)]
    pub output_duration: Option<f64>,
}

impl RenderRequest {
    /// Structural validation. Deliberately does not look at range contents:
    /// an empty trim (`start >= end`) must reach the encoder and fail there.
    pub fn validate(&self) -> Result<()> {
        if self.video_files.is_empty() {
            return Err(RequestError::NoVideoFiles);
        }
        if self.video_files.len() != self.time_ranges.len() {
            return Err(RequestError::RangeCountMismatch {
                videos: self.video_files.len(),
                ranges: self.time_ranges.len(),
            });
        }
        if self.output_size.width == 0 || self.output_size.height == 0 {
            return Err(RequestError::InvalidDimensions {
                width: self.output_size.width,
                height: self.output_size.height,
            });
        }
        Ok(())
    }

    /// Expected output length in seconds: the summed trim spans, capped by
    /// `output_duration` when set.
    pub fn expected_duration(&self) -> f64 {
        let total: f64 = self.time_ranges.iter().map(TimeRange::duration).sum();
        match self.output_duration {
            Some(cap) if cap >= 0.0 => total.min(cap),
            _ => total,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
