//! Editor diagnostics: per-pass timings and skipped-operation records.
//!
//! Permanent instrumentation rather than a global logger: every
//! expensive pass records its duration and output size, and every
//! operation the editor turns into a no-op (missing source, missing
//! font, unresolvable asset) leaves a record of why. The whole
//! structure serializes for display or submission alongside an order.
//!
//! Timestamps come from the `web-time` crate (`performance.now()` on
//! WASM, `std::time::Instant` on native). Durations serialize as
//! fractional seconds since `std::time::Duration` has no serde
//! support.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Dimensions;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A timed editor pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    /// Image decode on load.
    Decode,
    /// Named filter application.
    Filter,
    /// Adjustment replay.
    Adjust,
    /// Mask composite on apply.
    MaskApply,
    /// Geometric crop apply.
    CropApply,
    /// Background removal.
    BackgroundRemove,
    /// Full composition flatten.
    Flatten,
    /// PNG encode of the flattened result.
    Encode,
}

impl PassKind {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Filter => "filter",
            Self::Adjust => "adjust",
            Self::MaskApply => "mask apply",
            Self::CropApply => "crop apply",
            Self::BackgroundRemove => "background remove",
            Self::Flatten => "flatten",
            Self::Encode => "encode",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recorded pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassTiming {
    /// Which pass ran.
    pub pass: PassKind,
    /// Wall-clock duration of the pass.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Dimensions of the pass's output buffer.
    pub output: Dimensions,
}

/// An operation the editor turned into a no-op instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedOp {
    /// The operation that was requested.
    pub operation: String,
    /// Why it did nothing.
    pub reason: String,
}

/// Accumulated diagnostics for one editor session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorDiagnostics {
    /// Timed passes in execution order.
    pub passes: Vec<PassTiming>,
    /// No-op records in occurrence order.
    pub skipped: Vec<SkippedOp>,
}

impl EditorDiagnostics {
    /// Record a timed pass.
    pub fn record(&mut self, pass: PassKind, duration: Duration, output: Dimensions) {
        self.passes.push(PassTiming {
            pass,
            duration,
            output,
        });
    }

    /// Record a skipped operation.
    pub fn record_skip(&mut self, operation: &str, reason: &str) {
        self.skipped.push(SkippedOp {
            operation: operation.to_owned(),
            reason: reason.to_owned(),
        });
    }

    /// Total wall-clock time across all recorded passes.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.passes.iter().map(|p| p.duration).sum()
    }

    /// Most recent timing for a pass kind.
    #[must_use]
    pub fn last(&self, pass: PassKind) -> Option<&PassTiming> {
        self.passes.iter().rev().find(|p| p.pass == pass)
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.passes.clear();
        self.skipped.clear();
    }
}

/// Wall-clock stopwatch over the platform clock.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: web_time::Instant,
}

impl Stopwatch {
    /// Start timing now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: web_time::Instant::now(),
        }
    }

    /// Time elapsed since [`start`](Self::start).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims() -> Dimensions {
        Dimensions {
            width: 10,
            height: 10,
        }
    }

    #[test]
    fn record_accumulates_in_order() {
        let mut diag = EditorDiagnostics::default();
        diag.record(PassKind::Decode, Duration::from_millis(5), dims());
        diag.record(PassKind::Filter, Duration::from_millis(7), dims());
        assert_eq!(diag.passes.len(), 2);
        assert_eq!(diag.passes[0].pass, PassKind::Decode);
        assert_eq!(diag.total_duration(), Duration::from_millis(12));
    }

    #[test]
    fn last_finds_most_recent_of_kind() {
        let mut diag = EditorDiagnostics::default();
        diag.record(PassKind::Filter, Duration::from_millis(1), dims());
        diag.record(PassKind::Flatten, Duration::from_millis(2), dims());
        diag.record(PassKind::Filter, Duration::from_millis(3), dims());
        let last = diag.last(PassKind::Filter).unwrap();
        assert_eq!(last.duration, Duration::from_millis(3));
        assert!(diag.last(PassKind::Encode).is_none());
    }

    #[test]
    fn skip_records_operation_and_reason() {
        let mut diag = EditorDiagnostics::default();
        diag.record_skip("filter", "no source image");
        assert_eq!(diag.skipped.len(), 1);
        assert_eq!(diag.skipped[0].operation, "filter");
        assert_eq!(diag.skipped[0].reason, "no source image");
    }

    #[test]
    fn clear_drops_everything() {
        let mut diag = EditorDiagnostics::default();
        diag.record(PassKind::Encode, Duration::from_millis(1), dims());
        diag.record_skip("x", "y");
        diag.clear();
        assert!(diag.passes.is_empty());
        assert!(diag.skipped.is_empty());
    }

    #[test]
    fn serde_round_trip_preserves_durations() {
        let mut diag = EditorDiagnostics::default();
        diag.record(PassKind::Flatten, Duration::from_micros(12_345), dims());
        let json = serde_json::to_string(&diag).unwrap();
        let back: EditorDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.passes.len(), 1);
        let secs = back.passes[0].duration.as_secs_f64();
        assert!((secs - 0.012_345).abs() < 1e-9, "duration survived serde, got {secs}");
    }

    #[test]
    fn negative_duration_seconds_fail_to_deserialize() {
        let result: Result<PassTiming, _> = serde_json::from_str(
            r#"{"pass":"decode","duration":-1.0,"output":{"width":1,"height":1}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn stopwatch_measures_nonnegative_time() {
        let sw = Stopwatch::start();
        assert!(sw.elapsed() >= Duration::ZERO);
    }
}
