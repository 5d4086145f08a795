use super::bezier::{ArcLengthTable, CubicBezier};
use super::curve1d::{BankInterpolation, Curve1D};
use super::segment::{forward_vector, Segment};
use crate::curve::{Curve, CurveKind};
use crate::wrap_degrees;
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmenterSettings {
    pub segment_length: f32,
    pub bank: BankInterpolation,
    pub bezier_tolerance: f32,
}

/// Where a curve landed in the segment path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveExtent {
    pub first_segment: usize,
    pub segment_count: usize,
    /// Path distance at which the curve starts.
    pub start_z: f32,
    /// Authored length for arcs. Bezier curves snap to their segment grid:
    /// incoming carry plus one segment length per resampled entry.
    pub length: f32,
    pub end_position: Vec3,
    pub end_direction: Vec3,
}

/// Ordered segments for a whole curve list. Segment `k` starts at path
/// distance `k * segment_length`.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPath {
    segments: Vec<Segment>,
    terminal: Segment,
    extents: Vec<CurveExtent>,
    segment_length: f32,
    length: f32,
}

impl SegmentPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Zero-delta segment closing the path, owned by the last curve.
    pub fn terminal(&self) -> &Segment {
        &self.terminal
    }

    pub fn segment_length(&self) -> f32 {
        self.segment_length
    }

    /// Total path distance (sum of curve lengths).
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn extents(&self) -> &[CurveExtent] {
        &self.extents
    }

    pub fn extent(&self, curve: usize) -> Option<&CurveExtent> {
        self.extents.get(curve)
    }

    pub fn curve_segments(&self, curve: usize) -> &[Segment] {
        match self.extents.get(curve) {
            Some(extent) => &self.segments[extent.first_segment..extent.first_segment + extent.segment_count],
            None => &[],
        }
    }

    /// Index of the segment containing path distance `z`. May be negative or
    /// past the end; see [`super::SegmentLocator`].
    pub fn segment_index_at(&self, z: f32) -> i64 {
        (z / self.segment_length).floor() as i64
    }

    /// Curve owning the segment at `z`, clamped to the generated range.
    pub fn curve_at(&self, z: f32) -> Option<usize> {
        let last = self.segments.len().checked_sub(1)?;
        let index = self.segment_index_at(z).clamp(0, last as i64) as usize;
        Some(self.segments[index].curve)
    }

    /// Path distance where the segments after `curve` begin.
    pub fn next_curve_start_z(&self, curve: usize) -> f32 {
        let Some(extent) = self.extents.get(curve) else {
            return self.length;
        };
        let next = extent.first_segment + extent.segment_count;
        if next >= self.segments.len() {
            self.length.max(next as f32 * self.segment_length)
        } else {
            next as f32 * self.segment_length
        }
    }
}

fn bank_window(curves: &[Curve], index: usize) -> [f32; 4] {
    let bank_at = |offset: isize| -> f32 {
        let i = index as isize + offset;
        if i < 0 {
            return 0.0;
        }
        curves.get(i as usize).map(Curve::bank).unwrap_or(0.0)
    };
    [bank_at(-2), bank_at(-1), bank_at(0), bank_at(1)]
}

fn tangent_direction(tangent: Vec3, previous_yaw: f32) -> (f32, f32) {
    let horizontal = (tangent.x * tangent.x + tangent.z * tangent.z).sqrt();
    let pitch = -tangent.y.atan2(horizontal).to_degrees();
    let yaw = if horizontal > 1e-6 {
        let raw = tangent.x.atan2(tangent.z).to_degrees();
        previous_yaw + wrap_degrees(raw - previous_yaw)
    } else {
        previous_yaw
    };
    (pitch, yaw)
}

struct Walker<'a> {
    settings: &'a SegmenterSettings,
    segments: Vec<Segment>,
    /// Start of the next segment.
    position: Vec3,
    /// True start point of the current curve.
    curve_start: Vec3,
    direction: Vec3,
    /// Distance into the current curve at which its first segment starts.
    carry: f32,
}

impl Walker<'_> {
    fn push(&mut self, position: Vec3, direction: Vec3, direction_delta: Vec3, curve: usize) {
        self.segments.push(Segment {
            position,
            direction,
            direction_delta,
            length: self.settings.segment_length,
            curve,
        });
    }

    /// Returns (length, end position).
    fn arc(&mut self, index: usize, curve: &Curve, bank: Curve1D) -> (f32, Vec3) {
        let seg_len = self.settings.segment_length;
        let length = curve.length.max(0.0);
        let start = self.direction;
        let end = curve.end_direction(start);
        if length <= 0.0 {
            self.direction = end;
            return (0.0, self.curve_start);
        }

        let rate = (end - start) / length;
        let mut last_forward = forward_vector(start.x, start.y);
        let mut k = 0usize;
        loop {
            let z = self.carry + k as f32 * seg_len;
            if z >= length {
                break;
            }
            let bank_here = bank.evaluate(z / length);
            let bank_next = bank.evaluate((z + seg_len) / length);
            let direction = Vec3::new(start.x + rate.x * z, start.y + rate.y * z, bank_here);
            let delta = Vec3::new(rate.x * seg_len, rate.y * seg_len, bank_next - bank_here);
            self.push(self.position, direction, delta, index);
            last_forward = forward_vector(direction.x, direction.y);
            self.position += last_forward * seg_len;
            k += 1;
        }

        let consumed = self.carry + k as f32 * seg_len;
        let end_position = if k == 0 {
            self.curve_start + last_forward * length
        } else {
            self.position - last_forward * (consumed - length)
        };
        self.carry = consumed - length;
        self.direction = end;
        self.curve_start = end_position;
        (length, end_position)
    }

    /// Returns (grid length, end position). The next curve starts on a
    /// segment boundary at `to`.
    fn bezier(&mut self, index: usize, curve: &Curve, bank: Curve1D) -> (f32, Vec3) {
        let seg_len = self.settings.segment_length;
        let start = self.direction;
        let end = curve.end_direction(start);
        let from = self.curve_start;
        let to = curve.end_position;
        let reach = from.distance(to);
        let bezier = CubicBezier::new(
            from,
            from + forward_vector(start.x, start.y) * reach * curve.start_control_distance,
            to - forward_vector(end.x, end.y) * reach * curve.end_control_distance,
            to,
        );
        let table = ArcLengthTable::build(&bezier, self.settings.bezier_tolerance);
        let measured = table.length();
        let samples = table.resample(self.carry, seg_len);

        let mut previous_yaw = start.y;
        let mut directions = Vec::with_capacity(samples.len());
        for (i, &(s, t)) in samples.iter().enumerate() {
            let bank_here = bank.evaluate(s / measured);
            // The last segment takes the target orientation exactly.
            let (pitch, yaw) = if i + 1 == samples.len() {
                (end.x, end.y)
            } else {
                tangent_direction(bezier.direction(t), previous_yaw)
            };
            previous_yaw = yaw;
            directions.push(Vec3::new(pitch, yaw, bank_here));
        }

        for (i, &(s, t)) in samples.iter().enumerate() {
            let direction = directions[i];
            let next = directions.get(i + 1).copied().unwrap_or(end);
            let bank_next = bank.evaluate(((s + seg_len) / measured).min(1.0));
            let delta = Vec3::new(next.x - direction.x, next.y - direction.y, bank_next - direction.z);
            self.push(bezier.position(t), direction, delta, index);
        }

        let length = if samples.is_empty() {
            self.carry -= measured;
            self.position = to + forward_vector(end.x, end.y) * self.carry;
            measured
        } else {
            let length = self.carry + samples.len() as f32 * seg_len;
            self.carry = 0.0;
            self.position = to;
            length
        };
        self.direction = end;
        self.curve_start = to;
        (length, to)
    }
}

/// Walks the curve list and produces the segment path. Deterministic for a
/// given curve list and settings.
pub fn build_segments(curves: &[Curve], settings: &SegmenterSettings) -> SegmentPath {
    let mut walker = Walker {
        settings,
        segments: Vec::new(),
        position: Vec3::ZERO,
        curve_start: Vec3::ZERO,
        direction: Vec3::ZERO,
        carry: 0.0,
    };
    let mut extents = Vec::with_capacity(curves.len());
    let mut start_z = 0.0;

    for (index, curve) in curves.iter().enumerate() {
        let bank = settings.bank.curve(bank_window(curves, index));
        let first_segment = walker.segments.len();
        let (length, end_position) = match curve.kind {
            CurveKind::Arc => walker.arc(index, curve, bank),
            CurveKind::Bezier => walker.bezier(index, curve, bank),
        };
        extents.push(CurveExtent {
            first_segment,
            segment_count: walker.segments.len() - first_segment,
            start_z,
            length,
            end_position,
            end_direction: walker.direction,
        });
        start_z += length;
    }

    let owner = curves.len().saturating_sub(1);
    let terminal = match walker.segments.last() {
        Some(last) => Segment {
            position: last.position + last.forward() * settings.segment_length,
            direction: last.direction,
            direction_delta: Vec3::ZERO,
            length: settings.segment_length,
            curve: owner,
        },
        None => Segment {
            position: walker.position,
            direction: walker.direction,
            direction_delta: Vec3::ZERO,
            length: settings.segment_length,
            curve: owner,
        },
    };

    log::debug!("segmented {} curves into {} segments ({start_z:.2} units)", curves.len(), walker.segments.len());
    SegmentPath {
        segments: walker.segments,
        terminal,
        extents,
        segment_length: settings.segment_length,
        length: start_z,
    }
}
