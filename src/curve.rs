use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    #[default]
    Arc,
    Bezier,
}

/// One authored shape unit of the track.
///
/// `angles` holds (pitch, yaw, bank) in degrees. Pitch and bank are the
/// absolute orientation reached at the end of the curve, yaw is the turn made
/// over the curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    /// Position in the track's curve list. Maintained by the track.
    pub index: usize,
    pub kind: CurveKind,
    /// Authored for arcs; derived from the arc-length table for Bezier curves.
    pub length: f32,
    pub angles: Vec3,
    /// Bezier start handle length, as a fraction of the endpoint separation.
    pub start_control_distance: f32,
    /// Bezier end handle length, as a fraction of the endpoint separation.
    pub end_control_distance: f32,
    /// Bezier target point in track space.
    pub end_position: Vec3,
    /// Template name. `None` keeps whichever template was last in effect.
    pub template: Option<String>,
    pub is_jump: bool,
    pub can_respawn: bool,
}

impl Curve {
    pub const DEFAULT_CONTROL_DISTANCE: f32 = 0.5;

    pub fn arc(length: f32, angles: Vec3) -> Self {
        Self { kind: CurveKind::Arc, length, angles, ..Self::default() }
    }

    pub fn bezier(end_position: Vec3, angles: Vec3) -> Self {
        Self { kind: CurveKind::Bezier, end_position, angles, ..Self::default() }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_jump(mut self, is_jump: bool) -> Self {
        self.is_jump = is_jump;
        self
    }

    pub fn pitch(&self) -> f32 {
        self.angles.x
    }

    pub fn yaw(&self) -> f32 {
        self.angles.y
    }

    pub fn bank(&self) -> f32 {
        self.angles.z
    }

    /// Direction (pitch, yaw, bank) reached at the end of this curve when it
    /// starts out facing `start`.
    pub fn end_direction(&self, start: Vec3) -> Vec3 {
        Vec3::new(self.pitch(), start.y + self.yaw(), self.bank())
    }
}

impl Default for Curve {
    fn default() -> Self {
        Self {
            index: 0,
            kind: CurveKind::Arc,
            length: 25.0,
            angles: Vec3::ZERO,
            start_control_distance: Self::DEFAULT_CONTROL_DISTANCE,
            end_control_distance: Self::DEFAULT_CONTROL_DISTANCE,
            end_position: Vec3::ZERO,
            template: None,
            is_jump: false,
            can_respawn: true,
        }
    }
}

/// Per-curve data derived from the segment path, read by progress tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveRuntimeInfo {
    /// Surface up vector at the middle of the curve.
    pub normal: Vec3,
    pub respawn_position: Vec3,
    pub respawn_rotation: Quat,
    pub is_jump: bool,
    pub can_respawn: bool,
    /// Path distance at which the curve starts.
    pub z_offset: f32,
}
