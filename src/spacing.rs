use crate::path::SegmentLocator;
use crate::template::{SpacedObject, Template};
use crate::wrap_degrees;
use glam::{Mat4, Vec3};
use thiserror::Error;

pub const MAX_SPACING_GROUPS: usize = 16;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpacingError {
    #[error("spacing group {group} exceeds the group capacity of {capacity}")]
    GroupOutOfRange { group: usize, capacity: usize },
    #[error("spacing group {group} is not defined by template '{template}'")]
    UnknownGroup { group: usize, template: String },
    #[error("spacing {spacing} of group {group} is smaller than the segment length {segment_length}")]
    SpacingTooSmall { group: usize, spacing: f32, segment_length: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpacingGroupState {
    pub is_active: bool,
    /// Phase anchor: placements fall at `z_offset + spacing_before + k * spacing`.
    pub z_offset: f32,
    active_this_template: bool,
    working_z_offset: f32,
}

/// Path range covered by one template copy, `[start_z, end_z)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateSpan {
    pub start_z: f32,
    pub end_z: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpacedPlacement {
    pub name: String,
    pub group: usize,
    pub z: f32,
    /// Object space → track space.
    pub transform: Mat4,
}

/// State of every spacing group, carried from template to template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpacingGroups {
    states: [SpacingGroupState; MAX_SPACING_GROUPS],
}

impl SpacingGroups {
    pub fn state(&self, group: usize) -> Option<&SpacingGroupState> {
        self.states.get(group)
    }

    /// Starts a template pass: every group is inactive until one of the
    /// template's objects asks for it.
    pub fn begin_template(&mut self) {
        for state in &mut self.states {
            state.active_this_template = false;
            state.working_z_offset = state.z_offset;
        }
    }

    /// Placements of `object` within `span`. Group state is only touched when
    /// the request is valid.
    pub fn place(
        &mut self,
        object: &SpacedObject,
        template: &Template,
        span: TemplateSpan,
        locator: &SegmentLocator<'_>,
    ) -> Result<Vec<SpacedPlacement>, SpacingError> {
        let group = object.group;
        if group >= MAX_SPACING_GROUPS {
            return Err(SpacingError::GroupOutOfRange { group, capacity: MAX_SPACING_GROUPS });
        }
        let settings = template
            .spacing_groups
            .get(&group)
            .ok_or_else(|| SpacingError::UnknownGroup { group, template: template.name.clone() })?;
        let segment_length = locator.path().segment_length();
        if settings.spacing.is_nan() || settings.spacing < segment_length {
            return Err(SpacingError::SpacingTooSmall { group, spacing: settings.spacing, segment_length });
        }

        let state = &mut self.states[group];
        if !state.active_this_template {
            state.active_this_template = true;
            if !state.is_active {
                state.working_z_offset = span.start_z;
            }
        }

        let spacing = settings.spacing;
        let base = state.working_z_offset + settings.spacing_before;
        let mut k = ((span.start_z - base) / spacing).ceil().max(0.0);
        while base + k * spacing < span.start_z {
            k += 1.0;
        }

        let mut placements = Vec::new();
        loop {
            let z = base + k * spacing;
            if z >= span.end_z {
                break;
            }
            k += 1.0;
            let direction = locator.direction_at(z);
            if wrap_degrees(direction.x).abs() > object.max_pitch || wrap_degrees(direction.z).abs() > object.max_bank {
                continue;
            }
            placements.push(SpacedPlacement {
                name: object.name.clone(),
                group,
                z,
                transform: placement_transform(locator.transform_at(z), object),
            });
        }
        Ok(placements)
    }

    /// Ends a template pass, carrying activity and phase into the next one.
    pub fn end_template(&mut self) {
        for state in &mut self.states {
            state.is_active = state.active_this_template;
            state.z_offset = state.working_z_offset;
        }
    }
}

fn placement_transform(path: Mat4, object: &SpacedObject) -> Mat4 {
    let mut local = object.transform;
    local.w_axis.z = 0.0;
    let transform = path * local;
    if object.vertical {
        align_up(transform)
    } else {
        transform
    }
}

/// Re-orthogonalizes the basis so +y points to world up, keeping each axis'
/// scale and the translation.
fn align_up(transform: Mat4) -> Mat4 {
    let x = transform.x_axis.truncate();
    let y = transform.y_axis.truncate();
    let z = transform.z_axis.truncate();
    let (scale_x, scale_y, scale_z) = (x.length(), y.length(), z.length());

    let forward = if scale_z > 0.0 { z / scale_z } else { Vec3::Z };
    let mut right = Vec3::Y.cross(forward);
    if right.length_squared() < 1e-8 {
        right = if scale_x > 0.0 { x / scale_x } else { Vec3::X };
    } else {
        right = right.normalize();
    }
    let forward = right.cross(Vec3::Y);

    Mat4::from_cols(
        (right * scale_x).extend(0.0),
        (Vec3::Y * scale_y).extend(0.0),
        (forward * scale_z).extend(0.0),
        transform.w_axis,
    )
}
