//! Resolution and validation of the ffmpeg executable.
//!
//! The builder/supervisor/orchestrator only ever see a resolved path, so they
//! stay unit-testable without a real binary. Discovery lives behind
//! [`FfmpegLocator`].

use std::path::{Path, PathBuf};

use crate::error::{RenderError, Result};

/// Resolves a platform-specific path to the encoder executable.
pub trait FfmpegLocator {
    fn locate(&self) -> Result<PathBuf>;
}

/// Locates a system-installed ffmpeg via `$PATH`, then well-known install
/// locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFfmpeg;

#[cfg(windows)]
const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_BINARY: &str = "ffmpeg";

const WELL_KNOWN_DIRS: &[&str] = &[
    "/usr/local/bin",
    "/usr/bin",
    "/opt/homebrew/bin",
    "/opt/local/bin",
];

impl FfmpegLocator for SystemFfmpeg {
    fn locate(&self) -> Result<PathBuf> {
        if let Some(paths) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&paths) {
                let candidate = dir.join(FFMPEG_BINARY);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
        for dir in WELL_KNOWN_DIRS {
            let candidate = Path::new(dir).join(FFMPEG_BINARY);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(RenderError::FfmpegNotFound(PathBuf::from(FFMPEG_BINARY)))
    }
}

/// Fail fast if the resolved binary is missing or not executable, rather than
/// deferring to an opaque spawn failure. The execute-bit check only means
/// something on unix.
pub fn ensure_executable(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(RenderError::FfmpegNotFound(path.to_path_buf()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path)?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(RenderError::FfmpegNotExecutable(path.to_path_buf()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_reported_as_not_found() {
        let err = ensure_executable(Path::new("/no/such/ffmpeg")).unwrap_err();
        assert!(matches!(err, RenderError::FfmpegNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn plain_file_without_execute_bit_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffmpeg");
        std::fs::write(&path, b"not a binary").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let err = ensure_executable(&path).unwrap_err();
        assert!(matches!(err, RenderError::FfmpegNotExecutable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn executable_file_passes() {
        assert!(ensure_executable(Path::new("/bin/sh")).is_ok());
    }
}
