//! Curve list to segment path: bank interpolation, Bezier arc-length tables,
//! segmentation and index lookup with overrun handling.

mod bezier;
mod curve1d;
mod locator;
mod segment;
mod segmenter;

pub use bezier::{ArcLengthTable, CubicBezier};
pub use curve1d::{BankInterpolation, Curve1D};
pub use locator::{OverrunPolicy, SegmentLocator};
pub use segment::{euler_rotation, forward_vector, Segment};
pub use segmenter::{build_segments, CurveExtent, SegmentPath, SegmenterSettings};
