// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Parser for the `-progress` key/value stream.
//!
//! ffmpeg writes blocks like
//!
//! ```text
//! frame=120
//! out_time_us=4000000
//! out_time=00:00:04.000000
//! progress=continue
//! ```
//!
//! and ends with `progress=end`. `out_time_ms` is in microseconds despite
//! its name.

/// One meaningful line of the progress stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressLine {
    /// Seconds of output written so far.
    OutTime(f64),
    End,
}

pub fn parse_line(line: &str) -> Option<ProgressLine> {
    let (key, value) = line.trim().split_once('=')?;
    let value = value.trim();
    match key.trim() {
        "out_time_us" | "out_time_ms" => value
            .parse::<i64>()
            .ok()
            .filter(|micros| *micros >= 0)
            .map(|micros| ProgressLine::OutTime(micros as f64 / 1_000_000.0)),
        "out_time" => parse_timestamp(value).map(ProgressLine::OutTime),
        "progress" if value == "end" => Some(ProgressLine::End),
        _ => None,
    }
}

/// `HH:MM:SS.micros` to seconds.
fn parse_timestamp(value: &str) -> Option<f64> {
    let mut parts = value.splitn(3, ':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    (total >= 0.0).then_some(total)
}

/// Turns progress lines into a completion fraction for a render of known
/// length. Fractions never decrease.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_secs: f64,
    last: f64,
}

impl ProgressTracker {
    pub fn new(total_secs: f64) -> Self {
        Self {
            total_secs,
            last: 0.0,
        }
    }

    /// The new fraction, when `line` moves it forward.
    pub fn observe(&mut self, line: &str) -> Option<f64> {
        let fraction = match parse_line(line)? {
            ProgressLine::End => 1.0,
            ProgressLine::OutTime(_) if !(self.total_secs > 0.0) => return None,
            ProgressLine::OutTime(secs) => (secs / self.total_secs).clamp(0.0, 1.0),
        };
        if fraction > self.last {
            self.last = fraction;
            Some(fraction)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_variants() {
        assert_eq!(parse_line("out_time_us=2500000"), Some(ProgressLine::OutTime(2.5)));
        assert_eq!(parse_line("out_time_ms=1000000"), Some(ProgressLine::OutTime(1.0)));
        assert_eq!(
            parse_line("out_time=00:01:02.500000"),
            Some(ProgressLine::OutTime(62.5))
        );
        assert_eq!(parse_line("progress=end"), Some(ProgressLine::End));
        assert_eq!(parse_line("progress=continue"), None);
        assert_eq!(parse_line("out_time_us=N/A"), None);
        assert_eq!(parse_line("out_time_us=-9223372036854775807"), None);
        assert_eq!(parse_line("garbage"), None);
    }

    #[test]
    fn test_tracker_is_monotonic() {
        let mut tracker = ProgressTracker::new(10.0);
        assert_eq!(tracker.observe("out_time_us=2500000"), Some(0.25));
        assert_eq!(tracker.observe("out_time=00:00:02.000000"), None);
        assert_eq!(tracker.observe("frame=200"), None);
        assert_eq!(tracker.observe("out_time_us=30000000"), Some(1.0));
        assert_eq!(tracker.observe("progress=end"), None);
    }

    #[test]
    fn test_tracker_without_duration_only_reports_end() {
        let mut tracker = ProgressTracker::new(0.0);
        assert_eq!(tracker.observe("out_time_us=1000000"), None);
        assert_eq!(tracker.observe("progress=end"), Some(1.0));
    }
}
