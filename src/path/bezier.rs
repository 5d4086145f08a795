use glam::Vec3;

const MIN_SUBDIVISION_DEPTH: u32 = 3;
const MAX_SUBDIVISION_DEPTH: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Vec3,
    pub p1: Vec3,
    pub p2: Vec3,
    pub p3: Vec3,
}

impl CubicBezier {
    pub fn new(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        Self { p0, p1, p2, p3 }
    }

    pub fn position(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        self.p0 * (u * u * u) + self.p1 * (3.0 * u * u * t) + self.p2 * (3.0 * u * t * t) + self.p3 * (t * t * t)
    }

    /// First derivative with respect to `t`.
    pub fn tangent(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * u * u) + (self.p2 - self.p1) * (6.0 * u * t) + (self.p3 - self.p2) * (3.0 * t * t)
    }

    /// Tangent direction at `t`, falling back to the chord at cusps.
    pub fn direction(&self, t: f32) -> Vec3 {
        let tangent = self.tangent(t);
        if tangent.length_squared() > 1e-12 {
            tangent.normalize()
        } else {
            (self.p3 - self.p0).normalize_or_zero()
        }
    }
}

/// Monotonic (t, distance) table built by adaptive subdivision.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcLengthTable {
    entries: Vec<(f32, f32)>,
}

impl ArcLengthTable {
    /// Subdivides until a span's two half-chords exceed its chord by no more
    /// than `tolerance`.
    pub fn build(curve: &CubicBezier, tolerance: f32) -> Self {
        let mut entries = vec![(0.0, 0.0)];
        subdivide(curve, (0.0, curve.p0), (1.0, curve.p3), tolerance.max(1e-7), 0, &mut entries);
        Self { entries }
    }

    pub fn length(&self) -> f32 {
        self.entries.last().map(|&(_, s)| s).unwrap_or(0.0)
    }

    pub fn entries(&self) -> &[(f32, f32)] {
        &self.entries
    }

    /// Parameter `t` at path distance `distance`, clamped to the curve.
    pub fn t_at(&self, distance: f32) -> f32 {
        let Some(&(_, total)) = self.entries.last() else {
            return 0.0;
        };
        if distance <= 0.0 {
            return 0.0;
        }
        if distance >= total {
            return 1.0;
        }
        let upper = self.entries.partition_point(|&(_, s)| s < distance).max(1);
        let (t0, s0) = self.entries[upper - 1];
        let (t1, s1) = self.entries[upper];
        let span = s1 - s0;
        if span <= 0.0 {
            return t1;
        }
        t0 + (t1 - t0) * ((distance - s0) / span)
    }

    /// Resamples the table at `start`, `start + step`, ... while the distance
    /// stays below the curve length. Returns (distance, t) pairs.
    pub fn resample(&self, start: f32, step: f32) -> Vec<(f32, f32)> {
        let total = self.length();
        if step <= 0.0 || start >= total {
            return Vec::new();
        }
        let count = ((total - start) / step).ceil() as usize;
        (0..count)
            .map(|k| start + k as f32 * step)
            .take_while(|&s| s < total)
            .map(|s| (s, self.t_at(s)))
            .collect()
    }
}

fn subdivide(
    curve: &CubicBezier,
    (t0, p0): (f32, Vec3),
    (t1, p1): (f32, Vec3),
    tolerance: f32,
    depth: u32,
    entries: &mut Vec<(f32, f32)>,
) {
    let tm = (t0 + t1) * 0.5;
    let pm = curve.position(tm);
    let chord = p0.distance(p1);
    let split = p0.distance(pm) + pm.distance(p1);
    let settled = depth >= MIN_SUBDIVISION_DEPTH && split - chord <= tolerance;
    if settled || depth >= MAX_SUBDIVISION_DEPTH {
        let start = entries.last().map(|&(_, s)| s).unwrap_or(0.0);
        entries.push((tm, start + p0.distance(pm)));
        entries.push((t1, start + split));
        return;
    }
    subdivide(curve, (t0, p0), (tm, pm), tolerance, depth + 1, entries);
    subdivide(curve, (tm, pm), (t1, p1), tolerance, depth + 1, entries);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight() -> CubicBezier {
        CubicBezier::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 20.0), Vec3::new(0.0, 0.0, 30.0))
    }

    #[test]
    fn straight_curve_length_matches_chord() {
        let table = ArcLengthTable::build(&straight(), 1e-4);
        assert!((table.length() - 30.0).abs() < 1e-3);
        let t = table.t_at(15.0);
        assert!((straight().position(t).z - 15.0).abs() < 1e-3);
    }

    #[test]
    fn table_is_monotonic() {
        let curve = CubicBezier::new(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 20.0),
            Vec3::new(30.0, 5.0, 10.0),
            Vec3::new(30.0, 5.0, 40.0),
        );
        let table = ArcLengthTable::build(&curve, 1e-4);
        for pair in table.entries().windows(2) {
            assert!(pair[1].0 > pair[0].0);
            assert!(pair[1].1 >= pair[0].1);
        }
        let chord = curve.p0.distance(curve.p3);
        assert!(table.length() > chord);
    }

    #[test]
    fn resample_stays_below_length() {
        let table = ArcLengthTable::build(&straight(), 1e-4);
        let samples = table.resample(0.1, 1.0);
        assert_eq!(samples.len(), 30);
        assert!((samples[0].0 - 0.1).abs() < 1e-6);
        assert!(samples.iter().all(|&(s, _)| s < table.length()));
        assert!(table.resample(31.0, 1.0).is_empty());
    }

    #[test]
    fn tangent_matches_endpoint_handles() {
        let curve = straight();
        assert_eq!(curve.direction(0.0), Vec3::Z);
        assert_eq!(curve.tangent(1.0), Vec3::new(0.0, 0.0, 30.0));
    }
}
