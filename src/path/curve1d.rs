use serde::{Deserialize, Serialize};

/// How bank angles are blended from one curve to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankInterpolation {
    Linear,
    #[default]
    Bezier,
}

impl BankInterpolation {
    /// Builds the interpolator for the span between `values[1]` and
    /// `values[2]`; the outer values only shape the cubic variant.
    pub fn curve(self, values: [f32; 4]) -> Curve1D {
        match self {
            BankInterpolation::Linear => Curve1D::Linear { start: values[1], end: values[2] },
            BankInterpolation::Bezier => {
                let [v0, v1, v2, v3] = values;
                Curve1D::Cubic { p0: v1, p1: v1 + (v2 - v0) / 6.0, p2: v2 - (v3 - v1) / 6.0, p3: v2 }
            }
        }
    }
}

/// Scalar interpolator over `t` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve1D {
    Linear { start: f32, end: f32 },
    /// Cubic Bezier in Bernstein form, equivalent to a Catmull-Rom span.
    Cubic { p0: f32, p1: f32, p2: f32, p3: f32 },
}

impl Curve1D {
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Curve1D::Linear { start, end } => start + (end - start) * t,
            Curve1D::Cubic { p0, p1, p2, p3 } => {
                let u = 1.0 - t;
                u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
            }
        }
    }
}
