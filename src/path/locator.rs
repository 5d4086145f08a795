use super::segment::Segment;
use super::segmenter::SegmentPath;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// What a lookup past the last segment resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrunPolicy {
    /// Continue straight along the last segment's forward axis.
    #[default]
    Extrapolate,
    /// Wrap to the start of the path, lowered by the seam offset.
    Loop,
}

/// Total index → segment lookup over a [`SegmentPath`].
#[derive(Debug, Clone, Copy)]
pub struct SegmentLocator<'a> {
    path: &'a SegmentPath,
    policy: OverrunPolicy,
    seam_offset: f32,
}

impl<'a> SegmentLocator<'a> {
    pub fn new(path: &'a SegmentPath, policy: OverrunPolicy, seam_offset: f32) -> Self {
        Self { path, policy, seam_offset }
    }

    pub fn path(&self) -> &'a SegmentPath {
        self.path
    }

    /// Segment at `index`. Negative indices clamp to the first segment; indices
    /// past the end yield a virtual segment per the overrun policy.
    pub fn get(&self, index: i64) -> Segment {
        let segments = self.path.segments();
        let count = segments.len() as i64;
        if count == 0 {
            return *self.path.terminal();
        }
        if index < 0 {
            return segments[0];
        }
        if index < count {
            return segments[index as usize];
        }
        let terminal = self.path.terminal();
        match self.policy {
            OverrunPolicy::Extrapolate => {
                let steps = (index - count) as f32;
                Segment {
                    position: terminal.position + terminal.forward() * (steps * terminal.length),
                    direction_delta: Vec3::ZERO,
                    ..*terminal
                }
            }
            OverrunPolicy::Loop => {
                let mut segment = segments[(index % count) as usize];
                segment.position.y -= self.seam_offset;
                segment.curve = terminal.curve;
                segment
            }
        }
    }

    /// Segment containing path distance `z` and the distance into it.
    pub fn locate(&self, z: f32) -> (Segment, f32) {
        let index = self.path.segment_index_at(z);
        let start = index.max(0) as f32 * self.path.segment_length();
        (self.get(index), z - start)
    }

    /// Track-space transform of the path at distance `z`, bank interpolated.
    pub fn transform_at(&self, z: f32) -> Mat4 {
        let (segment, local_z) = self.locate(z);
        segment.transform_at(local_z)
    }

    /// Direction (pitch, yaw, bank) at distance `z`.
    pub fn direction_at(&self, z: f32) -> Vec3 {
        let (segment, local_z) = self.locate(z);
        let fraction = if segment.length > 0.0 { local_z / segment.length } else { 0.0 };
        segment.direction_at(fraction)
    }
}
