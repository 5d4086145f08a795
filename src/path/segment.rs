use glam::{EulerRot, Mat4, Quat, Vec3};

/// Rotation for a (pitch, yaw, bank) triple in degrees: yaw about +y, then
/// pitch about +x, then bank about +z.
pub fn euler_rotation(degrees: Vec3) -> Quat {
    Quat::from_euler(EulerRot::YXZ, degrees.y.to_radians(), degrees.x.to_radians(), degrees.z.to_radians())
}

/// Forward (+z) axis after applying pitch and yaw in degrees. Bank does not
/// change the forward axis.
pub fn forward_vector(pitch: f32, yaw: f32) -> Vec3 {
    let (sin_p, cos_p) = pitch.to_radians().sin_cos();
    let (sin_y, cos_y) = yaw.to_radians().sin_cos();
    Vec3::new(cos_p * sin_y, -sin_p, cos_p * cos_y)
}

/// Fixed-length piece of the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub position: Vec3,
    /// (pitch, yaw, bank) in degrees at the start of the segment.
    pub direction: Vec3,
    /// Change of direction across the segment. Only bank is interpolated
    /// within a segment.
    pub direction_delta: Vec3,
    pub length: f32,
    /// Index of the owning curve.
    pub curve: usize,
}

impl Segment {
    pub fn forward(&self) -> Vec3 {
        forward_vector(self.direction.x, self.direction.y)
    }

    /// Direction at `fraction` of the way through the segment.
    pub fn direction_at(&self, fraction: f32) -> Vec3 {
        self.direction + self.direction_delta * fraction.clamp(0.0, 1.0)
    }

    pub fn rotation_at(&self, fraction: f32) -> Quat {
        let bank = self.direction.z + self.direction_delta.z * fraction.clamp(0.0, 1.0);
        euler_rotation(Vec3::new(self.direction.x, self.direction.y, bank))
    }

    fn fraction(&self, local_z: f32) -> f32 {
        if self.length > 0.0 {
            local_z / self.length
        } else {
            0.0
        }
    }

    /// Segment-to-track transform for a point `local_z` along the segment.
    pub fn transform_at(&self, local_z: f32) -> Mat4 {
        let rotation = self.rotation_at(self.fraction(local_z));
        Mat4::from_rotation_translation(rotation, self.position + rotation * Vec3::new(0.0, 0.0, local_z))
    }

    /// Maps a segment-local point (x, y, distance into segment) to track space.
    pub fn to_track(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation_at(self.fraction(local.z)) * local
    }

    /// Maps a segment-local vector to track space.
    pub fn vector_to_track(&self, local_z: f32, vector: Vec3) -> Vec3 {
        self.rotation_at(self.fraction(local_z)) * vector
    }
}
