use crate::config::TrackConfig;
use crate::curve::{Curve, CurveKind};
use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Serialized track: configuration plus the ordered curve list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackDocument {
    #[serde(default)]
    pub config: TrackConfig,
    #[serde(default)]
    pub curves: Vec<CurveData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveData {
    #[serde(default)]
    pub kind: CurveKind,
    #[serde(default = "default_curve_length")]
    pub length: f32,
    /// (pitch, yaw, bank) in degrees.
    #[serde(default)]
    pub angles: Vec3Data,
    #[serde(default = "default_control_distance")]
    pub start_control_distance: f32,
    #[serde(default = "default_control_distance")]
    pub end_control_distance: f32,
    #[serde(default)]
    pub end_position: Vec3Data,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub is_jump: bool,
    #[serde(default = "default_can_respawn")]
    pub can_respawn: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Translation, Euler rotation in degrees (pitch, yaw, bank) and scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformData {
    #[serde(default)]
    pub translation: Vec3Data,
    #[serde(default)]
    pub rotation: Vec3Data,
    #[serde(default = "default_scale")]
    pub scale: Vec3Data,
}

fn default_curve_length() -> f32 {
    Curve::default().length
}

const fn default_control_distance() -> f32 {
    Curve::DEFAULT_CONTROL_DISTANCE
}

const fn default_can_respawn() -> bool {
    true
}

fn default_scale() -> Vec3Data {
    Vec3Data { x: 1.0, y: 1.0, z: 1.0 }
}

impl From<Vec3> for Vec3Data {
    fn from(value: Vec3) -> Self {
        Self { x: value.x, y: value.y, z: value.z }
    }
}

impl From<Vec3Data> for Vec3 {
    fn from(value: Vec3Data) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

impl Default for TransformData {
    fn default() -> Self {
        Self { translation: Vec3Data::default(), rotation: Vec3Data::default(), scale: default_scale() }
    }
}

impl TransformData {
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.into(),
            crate::path::euler_rotation(self.rotation.into()),
            self.translation.into(),
        )
    }
}

impl From<&Curve> for CurveData {
    fn from(curve: &Curve) -> Self {
        Self {
            kind: curve.kind,
            length: curve.length,
            angles: curve.angles.into(),
            start_control_distance: curve.start_control_distance,
            end_control_distance: curve.end_control_distance,
            end_position: curve.end_position.into(),
            template: curve.template.clone(),
            is_jump: curve.is_jump,
            can_respawn: curve.can_respawn,
        }
    }
}

impl CurveData {
    pub fn to_curve(&self, index: usize) -> Curve {
        Curve {
            index,
            kind: self.kind,
            length: self.length,
            angles: self.angles.into(),
            start_control_distance: self.start_control_distance,
            end_control_distance: self.end_control_distance,
            end_position: self.end_position.into(),
            template: self.template.clone(),
            is_jump: self.is_jump,
            can_respawn: self.can_respawn,
        }
    }
}

impl TrackDocument {
    pub fn from_curves(config: TrackConfig, curves: &[Curve]) -> Self {
        Self { config, curves: curves.iter().map(CurveData::from).collect() }
    }

    pub fn to_curves(&self) -> Vec<Curve> {
        self.curves.iter().enumerate().map(|(index, data)| data.to_curve(index)).collect()
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Failed to read track {}", path.display()))?;
        let document: TrackDocument =
            serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse track {}", path.display()))?;
        Ok(document)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write track {}", path.display()))?;
        Ok(())
    }
}
