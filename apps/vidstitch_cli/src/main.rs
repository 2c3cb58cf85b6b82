//! Command-line front end: `vidstitch <request.json>` renders one job
//! described by a JSON `RenderRequest`.

use anyhow::{bail, Context, Result};
use vidstitch_core::RenderRequest;
use vidstitch_render::{cancel_pair, FfmpegLocator, RenderContext, RenderOptions, SystemFfmpeg};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let Some(request_path) = std::env::args().nth(1) else {
        bail!("usage: vidstitch <request.json>");
    };

    let raw = std::fs::read_to_string(&request_path)
        .with_context(|| format!("reading {request_path}"))?;
    let request: RenderRequest =
        serde_json::from_str(&raw).with_context(|| format!("parsing {request_path}"))?;

    let ffmpeg_path = SystemFfmpeg.locate()?;
    tracing::info!(ffmpeg = %ffmpeg_path.display(), "using encoder");

    let ctx = RenderContext {
        ffmpeg_path,
        temp_voice_path: std::env::temp_dir().join("vidstitch-voice.wav"),
    };

    // Ctrl-C requests graceful termination of the encoder.
    let (cancel_handle, cancel_token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling render");
            cancel_handle.cancel();
        }
    });

    let opts = RenderOptions {
        cwd: None,
        progress: Some(Box::new(|percent| {
            tracing::info!("progress: {percent:.0}%");
        })),
        cancel: Some(cancel_token),
    };

    let outcome = vidstitch_render::render_video(request, &ctx, opts).await?;
    tracing::info!(code = outcome.code, "done");
    Ok(())
}
