//! ffmpeg orchestration: command construction, process supervision,
//! progress parsing, and the top-level render pipeline.

pub mod command;
pub mod error;
pub mod exec;
pub mod locate;
pub mod progress;
pub mod render;

pub use command::{build_render_args, CommandPlan, ResolvedRender};
pub use error::{RenderError, Result};
pub use exec::{cancel_pair, CancelHandle, CancelToken, ExecOptions, ExecOutcome, ProgressFn};
pub use locate::{FfmpegLocator, SystemFfmpeg};
pub use render::{render_video, RenderContext, RenderOptions};
