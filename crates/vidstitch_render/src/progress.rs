//! Per-line extraction of ffmpeg's elapsed-time reports.
//!
//! ffmpeg interleaves `-stats` lines on stderr
//! (`frame=  123 fps= 45 ... time=00:01:05.50 ...`) with `-progress pipe:1`
//! key-value lines on stdout (`out_time=00:01:05.500000`). Both carry a
//! `time=` marker followed by an `HH:MM:SS.ss` timestamp, which is all this
//! parser looks for.

/// Extract elapsed seconds from one line of ffmpeg output.
///
/// Returns `None` when the line carries no timestamp — that means "no update
/// this line", not a reset to zero. Values are not bounds-checked; ffmpeg can
/// legitimately report past the nominal output duration.
pub fn parse_progress(line: &str) -> Option<f64> {
    let start = line.find("time=")? + "time=".len();
    let token = line[start..]
        .split_whitespace()
        .next()
        .unwrap_or("");
    parse_timestamp(token)
}

/// Parse `HH:MM:SS.ss` into total seconds. Hours and minutes are integers,
/// seconds fractional.
fn parse_timestamp(s: &str) -> Option<f64> {
    let mut parts = s.splitn(3, ':');
    let hours: u32 = parts.next()?.parse().ok()?;
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stats_line() {
        let line = "frame=123 fps=45 q=25.0 size=1024kB time=00:01:05.50 bitrate=1677.7kbits/s speed=1.5x";
        assert_eq!(parse_progress(line), Some(65.5));
    }

    #[test]
    fn parses_progress_pipe_line() {
        // `out_time=` contains the `time=` marker.
        assert_eq!(parse_progress("out_time=00:00:12.250000"), Some(12.25));
    }

    #[test]
    fn returns_none_without_marker() {
        assert!(parse_progress("frame=10 fps=30 speed=1.0x").is_none());
        assert!(parse_progress("Input #0, mov,mp4...").is_none());
        assert!(parse_progress("").is_none());
    }

    #[test]
    fn returns_none_for_unparseable_timestamp() {
        assert!(parse_progress("out_time=N/A").is_none());
        assert!(parse_progress("time=garbage").is_none());
        assert!(parse_progress("time=00:05").is_none());
    }

    #[test]
    fn parses_hours_and_minutes_as_integers() {
        assert_eq!(parse_progress("time=02:30:00.00 ..."), Some(9000.0));
    }

    #[test]
    fn values_beyond_nominal_duration_are_passed_through() {
        assert_eq!(parse_progress("time=99:00:00.00"), Some(356_400.0));
    }
}
