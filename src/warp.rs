use crate::mesh::Mesh;
use crate::path::SegmentLocator;
use glam::{Mat4, Vec3};

/// Where a template copy sits on the path and how its mesh maps in and out of
/// template space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpParams {
    /// Path distance at which the template copy begins.
    pub z_offset: f32,
    /// Smallest template-space z of the template's main span.
    pub template_min_z: f32,
    /// Mesh space → template space.
    pub mesh_to_template: Mat4,
    /// Track space → output mesh space.
    pub track_to_mesh: Mat4,
}

/// Bends `source` along the path. Tangents and bounds of the result are
/// recomputed from the warped geometry. Returns the warped mesh and the
/// source's template-space length (max z − min z).
pub fn warp_mesh(source: &Mesh, locator: &SegmentLocator<'_>, params: &WarpParams) -> (Mesh, f32) {
    let mut mesh = source.clone();
    let mut min_z = f32::INFINITY;
    let mut max_z = f32::NEG_INFINITY;

    for vertex in &mut mesh.vertices {
        let template_point = params.mesh_to_template.transform_point3(vertex.position());
        min_z = min_z.min(template_point.z);
        max_z = max_z.max(template_point.z);

        let path_z = template_point.z - params.template_min_z + params.z_offset;
        let (segment, local_z) = locator.locate(path_z);
        let track_point = segment.to_track(Vec3::new(template_point.x, template_point.y, local_z));
        vertex.position = params.track_to_mesh.transform_point3(track_point).to_array();

        let template_normal = params.mesh_to_template.transform_vector3(vertex.normal());
        let track_normal = segment.vector_to_track(local_z, template_normal);
        vertex.normal = params.track_to_mesh.transform_vector3(track_normal).normalize_or_zero().to_array();
    }

    mesh.recalculate();
    let length = if mesh.vertices.is_empty() { 0.0 } else { max_z - min_z };
    (mesh, length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use crate::path::{build_segments, BankInterpolation, OverrunPolicy, SegmenterSettings};

    fn settings() -> SegmenterSettings {
        SegmenterSettings { segment_length: 0.25, bank: BankInterpolation::Linear, bezier_tolerance: 1e-4 }
    }

    #[test]
    fn straight_path_translates_along_z() {
        let path = build_segments(&[Curve::arc(50.0, Vec3::ZERO)], &settings());
        let locator = SegmentLocator::new(&path, OverrunPolicy::Extrapolate, 0.0);
        let source = Mesh::strip(4.0, 10.0, 8);
        let params = WarpParams {
            z_offset: 20.0,
            template_min_z: 0.0,
            mesh_to_template: Mat4::IDENTITY,
            track_to_mesh: Mat4::IDENTITY,
        };
        let (warped, length) = warp_mesh(&source, &locator, &params);
        assert_eq!(length, 10.0);
        for (before, after) in source.vertices.iter().zip(&warped.vertices) {
            let expected = before.position() + Vec3::new(0.0, 0.0, 20.0);
            assert!((after.position() - expected).length() < 1e-4);
            assert!((after.normal() - Vec3::Y).length() < 1e-5);
        }
        assert!((warped.bounds.min.z - 20.0).abs() < 1e-4);
        assert!((warped.bounds.max.z - 30.0).abs() < 1e-4);
    }

    #[test]
    fn track_to_mesh_is_applied_last() {
        let path = build_segments(&[Curve::arc(20.0, Vec3::ZERO)], &settings());
        let locator = SegmentLocator::new(&path, OverrunPolicy::Extrapolate, 0.0);
        let lift = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let params =
            WarpParams { z_offset: 0.0, template_min_z: 0.0, mesh_to_template: lift, track_to_mesh: lift.inverse() };
        let source = Mesh::strip(2.0, 5.0, 2);
        let (warped, _) = warp_mesh(&source, &locator, &params);
        for (before, after) in source.vertices.iter().zip(&warped.vertices) {
            assert!((after.position() - before.position()).length() < 1e-4);
        }
    }
}
