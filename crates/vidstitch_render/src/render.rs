//! Top-level render pipeline: default resolution, validation, command
//! construction, supervised execution, and cleanup of transient inputs.

use std::path::{Path, PathBuf};

use uuid::Uuid;
use vidstitch_core::RenderRequest;

use crate::command::{build_render_args, ResolvedRender};
use crate::error::{RenderError, Result};
use crate::exec::{execute_ffmpeg, CancelToken, ExecOptions, ExecOutcome, ProgressFn};

/// The two external collaborators reduced to resolved values: where the
/// encoder binary lives, and where the pre-synthesized voice track is written
/// when a request does not bring its own.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub ffmpeg_path: PathBuf,
    pub temp_voice_path: PathBuf,
}

/// Per-render execution options.
#[derive(Default)]
pub struct RenderOptions {
    pub cwd: Option<PathBuf>,
    pub progress: Option<ProgressFn>,
    pub cancel: Option<CancelToken>,
}

/// Run one render end to end.
///
/// Voice and subtitle fall back to the context's temporary voice track and
/// its `.srt` sibling; whatever was defaulted is deleted best-effort after
/// the run, on success and failure alike. Deletion problems are logged and
/// never replace the primary result.
pub async fn render_video(
    req: RenderRequest,
    ctx: &RenderContext,
    opts: RenderOptions,
) -> Result<ExecOutcome> {
    req.validate()?;

    let (voice, voice_is_transient) = match req.audio.voice.clone() {
        Some(voice) => (voice, false),
        None => (ctx.temp_voice_path.clone(), true),
    };
    let (subtitle, subtitle_is_transient) = match req.subtitle_file.clone() {
        Some(subtitle) => (subtitle, false),
        None => (voice.with_extension("srt"), true),
    };

    let output_dir = output_directory(&req.output_path);
    if !output_dir.is_dir() {
        return Err(RenderError::OutputDirMissing(output_dir.to_path_buf()));
    }
    let output_path = unique_output_path(&req.output_path);
    let total_secs = req.expected_duration();

    let resolved = ResolvedRender {
        video_files: req.video_files,
        time_ranges: req.time_ranges,
        voice: voice.clone(),
        bgm: req.audio.bgm,
        subtitle: subtitle.clone(),
        output_size: req.output_size,
        output_path: output_path.clone(),
        output_duration: req.output_duration,
    };
    let plan = build_render_args(&resolved)?;

    let job = Uuid::new_v4();
    let span = tracing::info_span!("render", %job, output = %output_path.display());
    let _enter = span.enter();
    tracing::info!(
        clips = resolved.video_files.len(),
        bgm = resolved.bgm.is_some(),
        expected_secs = total_secs,
        "starting render"
    );

    let result = execute_ffmpeg(
        &ctx.ffmpeg_path,
        plan,
        ExecOptions {
            cwd: opts.cwd,
            total_secs,
            progress: opts.progress,
            cancel: opts.cancel,
        },
    )
    .await;

    if voice_is_transient {
        remove_transient(&voice);
    }
    if subtitle_is_transient {
        remove_transient(&subtitle);
    }

    match &result {
        Ok(outcome) => tracing::info!(code = outcome.code, "render finished"),
        Err(err) => tracing::warn!(error = %err, "render failed"),
    }
    result
}

/// Directory the output file will land in. A bare file name renders into the
/// current directory.
fn output_directory(output_path: &Path) -> &Path {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// First non-existing variant of the requested output path: the path itself,
/// then `name (1).ext`, `name (2).ext`, ...
fn unique_output_path(requested: &Path) -> PathBuf {
    if !requested.exists() {
        return requested.to_path_buf();
    }

    let stem = requested
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = requested.extension().map(|e| e.to_string_lossy().into_owned());

    for n in 1.. {
        let name = match &extension {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        let candidate = requested.with_file_name(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("exhausted output path candidates")
}

/// Best-effort removal of a defaulted voice/subtitle file. A file that is
/// already gone or protected must not mask the render result.
fn remove_transient(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        tracing::debug!(path = %path.display(), error = %err, "could not remove transient file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidstitch_core::{AudioTracks, OutputSize, TimeRange};

    fn request(output: PathBuf) -> RenderRequest {
        RenderRequest {
            video_files: vec![PathBuf::from("/tmp/a.mp4")],
            time_ranges: vec![TimeRange::new(0.0, 2.0)],
            audio: AudioTracks::default(),
            subtitle_file: None,
            output_size: OutputSize::new(640, 360),
            output_path: output,
            output_duration: None,
        }
    }

    #[test]
    fn output_directory_of_bare_file_name_is_cwd() {
        assert_eq!(output_directory(Path::new("out.mp4")), Path::new("."));
        assert_eq!(output_directory(Path::new("/tmp/out.mp4")), Path::new("/tmp"));
    }

    #[test]
    fn unique_output_path_keeps_free_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        assert_eq!(unique_output_path(&path), path);
    }

    #[test]
    fn unique_output_path_numbers_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        std::fs::write(&path, b"").unwrap();
        std::fs::write(dir.path().join("out (1).mp4"), b"").unwrap();

        assert_eq!(unique_output_path(&path), dir.path().join("out (2).mp4"));
    }

    #[tokio::test]
    async fn missing_output_directory_fails_before_launch() {
        let ctx = RenderContext {
            ffmpeg_path: PathBuf::from("/bin/sh"),
            temp_voice_path: PathBuf::from("/tmp/voice.wav"),
        };
        let req = request(PathBuf::from("/no/such/dir/out.mp4"));

        let err = render_video(req, &ctx, RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::OutputDirMissing(p) if p == Path::new("/no/such/dir")));
    }

    #[tokio::test]
    async fn invalid_request_fails_before_launch() {
        let ctx = RenderContext {
            ffmpeg_path: PathBuf::from("/bin/sh"),
            temp_voice_path: PathBuf::from("/tmp/voice.wav"),
        };
        let mut req = request(PathBuf::from("/tmp/out.mp4"));
        req.time_ranges.clear();

        let err = render_video(req, &ctx, RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidRequest(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn transient_defaults_are_removed_after_a_failed_render() {
        let dir = tempfile::tempdir().unwrap();
        let voice = dir.path().join("voice.wav");
        let subtitle = dir.path().join("voice.srt");
        std::fs::write(&voice, b"wav").unwrap();
        std::fs::write(&subtitle, b"1").unwrap();

        // /bin/false ignores its arguments and exits 1, standing in for an
        // encoder that rejects the graph.
        let ctx = RenderContext {
            ffmpeg_path: PathBuf::from("/bin/false"),
            temp_voice_path: voice.clone(),
        };
        let req = request(dir.path().join("out.mp4"));

        let err = render_video(req, &ctx, RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::FfmpegFailed { code: 1, .. }));
        assert!(!voice.exists());
        assert!(!subtitle.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn caller_supplied_inputs_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let voice = dir.path().join("narration.wav");
        let subtitle = dir.path().join("subs.srt");
        std::fs::write(&voice, b"wav").unwrap();
        std::fs::write(&subtitle, b"1").unwrap();

        let ctx = RenderContext {
            ffmpeg_path: PathBuf::from("/bin/false"),
            temp_voice_path: dir.path().join("unused.wav"),
        };
        let mut req = request(dir.path().join("out.mp4"));
        req.audio.voice = Some(voice.clone());
        req.subtitle_file = Some(subtitle.clone());

        let _ = render_video(req, &ctx, RenderOptions::default()).await;
        assert!(voice.exists());
        assert!(subtitle.exists());
    }
}
