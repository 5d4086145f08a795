use thiserror::Error;

/// Fatal precondition failures. The operation that returns one of these has
/// not committed any mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("track has no curves")]
    NoCurves,
    #[error("curve range {start}..{end} is outside 0..{count}")]
    InvalidRange { start: usize, end: usize, count: usize },
    #[error("curve index {index} is out of bounds (curve count {count})")]
    CurveOutOfBounds { index: usize, count: usize },
    #[error("segment length must be a positive finite number, got {0}")]
    InvalidSegmentLength(f32),
}
