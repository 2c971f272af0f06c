//! Execution points — positions in a recorded program execution.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A position in the recorded execution of the target program.
///
/// The `point` token is an opaque decimal string assigned by the target.
/// Points are totally ordered by their numeric value; the string is kept
/// verbatim because it can exceed `u64` range on long recordings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPoint {
    /// Opaque ordered token identifying the position.
    pub point: String,
    /// Time offset into the recording, in milliseconds.
    pub time: f64,
    /// Whether the target has stack frames at this point.
    #[serde(default)]
    pub has_frames: bool,
}

impl ExecutionPoint {
    pub fn new(point: impl Into<String>, time: f64, has_frames: bool) -> Self {
        Self {
            point: point.into(),
            time,
            has_frames,
        }
    }

    /// Numeric comparison of two point tokens.
    ///
    /// Tokens are decimal strings without leading zeros, so a shorter
    /// token is always numerically smaller and equal-length tokens
    /// compare lexicographically.
    pub fn compare_points(a: &str, b: &str) -> Ordering {
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }

    /// Return `true` if this point precedes `other` in the recording.
    pub fn is_before(&self, other: &ExecutionPoint) -> bool {
        Self::compare_points(&self.point, &other.point) == Ordering::Less
    }
}
