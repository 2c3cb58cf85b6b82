//! Construction of the ffmpeg argument list for one render.
//!
//! Argument order is load-bearing: ffmpeg binds filter-graph input indices
//! positionally, so video inputs come first (index `i` = `video_files[i]`),
//! then the voice track at index `N`, then background music at `N + 1`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use vidstitch_core::{OutputSize, RequestError, TimeRange};

use crate::error::Result;

/// A render request with every optional source already resolved to a path.
/// The orchestrator produces this from a `RenderRequest` plus the external
/// defaults (temporary voice track, derived subtitle sibling).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedRender {
    pub video_files: Vec<PathBuf>,
    pub time_ranges: Vec<TimeRange>,
    pub voice: PathBuf,
    pub bgm: Option<PathBuf>,
    pub subtitle: PathBuf,
    pub output_size: OutputSize,
    pub output_path: PathBuf,
    pub output_duration: Option<f64>,
}

/// The full argument list for one ffmpeg invocation. Built once per render,
/// consumed by value by the supervisor, never reused: trim offsets, stream
/// labels and input indices are all request-specific.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandPlan {
    args: Vec<String>,
}

impl CommandPlan {
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}

/// Compile a resolved render into an ffmpeg argument list.
///
/// Pure and deterministic: no I/O, and identical input yields a byte-identical
/// plan. Structurally invalid input (mismatched list lengths, zero dimensions)
/// is rejected here rather than truncated. An empty trim range is NOT rejected:
/// it must surface as an encoder failure, not be silently dropped.
pub fn build_render_args(render: &ResolvedRender) -> Result<CommandPlan> {
    validate(render)?;

    let n = render.video_files.len();
    let OutputSize { width, height } = render.output_size;

    let mut args: Vec<String> = Vec::new();

    // Inputs. Video files first, then voice, then optional bgm.
    for file in &render.video_files {
        args.push("-i".into());
        args.push(file.to_string_lossy().into_owned());
    }
    args.push("-i".into());
    args.push(render.voice.to_string_lossy().into_owned());
    if let Some(bgm) = &render.bgm {
        args.push("-i".into());
        args.push(bgm.to_string_lossy().into_owned());
    }

    // Filter graph, kept as a list of chains until the final join so escaping
    // happens in exactly one place.
    let mut filters: Vec<String> = Vec::new();
    let mut video_labels = String::new();

    for (i, range) in render.time_ranges.iter().enumerate() {
        let TimeRange { start, end } = range;
        filters.push(format!(
            "[{i}:v]trim=start={start}:end={end},setpts=PTS-STARTPTS,\
             scale={width}:{height}:force_original_aspect_ratio=decrease,\
             pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,\
             fps=30,format=yuv420p,setsar=1[v{i}]"
        ));
        video_labels.push_str(&format!("[v{i}]"));
    }

    // Concatenate, then re-normalize: concat can leave inconsistent timing
    // metadata behind.
    filters.push(format!("{video_labels}concat=n={n}:v=1:a=0[vcat]"));
    filters.push("[vcat]fps=30,format=yuv420p,setpts=PTS-STARTPTS[vout]".into());

    filters.push(format!(
        "[vout]subtitles={}[vsub]",
        escape_filter_path(&render.subtitle)
    ));

    // Voice boosted, bgm attenuated, mixed with longest-duration semantics.
    filters.push(format!("[{n}:a]volume=2[voice]"));
    if render.bgm.is_some() {
        filters.push(format!("[{}:a]volume=0.5[bgm]", n + 1));
        filters.push("[voice][bgm]amix=inputs=2:duration=longest[aout]".into());
    } else {
        filters.push("[voice]amix=inputs=1:duration=longest[aout]".into());
    }

    args.push("-filter_complex".into());
    args.push(filters.join(";"));

    args.push("-map".into());
    args.push("[vsub]".into());
    args.push("-map".into());
    args.push("[aout]".into());

    // Encoding parameters, fixed order.
    let size = format!("{width}x{height}");
    for flag in [
        "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-r", "30", "-c:a", "aac", "-b:a",
        "128k", "-fps_mode", "cfr", "-s", size.as_str(), "-progress", "pipe:1",
    ] {
        args.push(flag.into());
    }
    if let Some(duration) = render.output_duration {
        args.push("-t".into());
        args.push(duration.to_string());
    }
    args.push("-stats".into());
    args.push(render.output_path.to_string_lossy().into_owned());

    Ok(CommandPlan::new(args))
}

fn validate(render: &ResolvedRender) -> std::result::Result<(), RequestError> {
    if render.video_files.is_empty() {
        return Err(RequestError::NoVideoFiles);
    }
    if render.video_files.len() != render.time_ranges.len() {
        return Err(RequestError::RangeCountMismatch {
            videos: render.video_files.len(),
            ranges: render.time_ranges.len(),
        });
    }
    if render.output_size.width == 0 || render.output_size.height == 0 {
        return Err(RequestError::InvalidDimensions {
            width: render.output_size.width,
            height: render.output_size.height,
        });
    }
    Ok(())
}

/// Escape a path for use inside a filter expression. Colons delimit filter
/// options, so each one must become `\\:` or the graph is corrupted for any
/// path containing one (a Windows drive letter, for instance).
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace(':', "\\\\:")
}
