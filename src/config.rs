use crate::error::TrackError;
use crate::path::{BankInterpolation, OverrunPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespawnConfig {
    /// Distance above the track surface, along the surface normal.
    #[serde(default = "RespawnConfig::default_height")]
    pub height: f32,
    /// Distance along the path from the middle of the curve.
    #[serde(default)]
    pub z_offset: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    #[serde(default = "TrackConfig::default_segment_length")]
    pub segment_length: f32,
    #[serde(default)]
    pub bank_interpolation: BankInterpolation,
    #[serde(default)]
    pub overrun: OverrunPolicy,
    #[serde(default = "TrackConfig::default_loop_seam_offset")]
    pub loop_seam_offset: f32,
    #[serde(default = "TrackConfig::default_bezier_tolerance")]
    pub bezier_tolerance: f32,
    #[serde(default)]
    pub respawn: RespawnConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackConfigOverrides {
    pub segment_length: Option<f32>,
    pub overrun: Option<OverrunPolicy>,
    pub bank_interpolation: Option<BankInterpolation>,
}

impl RespawnConfig {
    const fn default_height() -> f32 {
        1.0
    }
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self { height: Self::default_height(), z_offset: 0.0 }
    }
}

impl TrackConfig {
    const fn default_segment_length() -> f32 {
        0.25
    }

    const fn default_loop_seam_offset() -> f32 {
        0.001
    }

    const fn default_bezier_tolerance() -> f32 {
        1e-4
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read track config {}", path.display()))?;
        let cfg: TrackConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse track config {}", path.display()))?;
        cfg.validate().with_context(|| format!("Invalid track config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Track config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        if !self.segment_length.is_finite() || self.segment_length <= 0.0 {
            return Err(TrackError::InvalidSegmentLength(self.segment_length));
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &TrackConfigOverrides) {
        if let Some(segment_length) = overrides.segment_length {
            self.segment_length = segment_length;
        }
        if let Some(overrun) = overrides.overrun {
            self.overrun = overrun;
        }
        if let Some(bank) = overrides.bank_interpolation {
            self.bank_interpolation = bank;
        }
    }
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            segment_length: Self::default_segment_length(),
            bank_interpolation: BankInterpolation::default(),
            overrun: OverrunPolicy::default(),
            loop_seam_offset: Self::default_loop_seam_offset(),
            bezier_tolerance: Self::default_bezier_tolerance(),
            respawn: RespawnConfig::default(),
        }
    }
}

impl TrackConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.segment_length.is_none() && self.overrun.is_none() && self.bank_interpolation.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.segment_length.is_some() {
            fields.push("segment_length");
        }
        if self.overrun.is_some() {
            fields.push("overrun");
        }
        if self.bank_interpolation.is_some() {
            fields.push("bank_interpolation");
        }
        fields
    }
}
