pub mod build;
pub mod cli;
pub mod config;
pub mod curve;
pub mod document;
pub mod error;
pub mod host;
pub mod mesh;
pub mod path;
pub mod spacing;
pub mod template;
pub mod track;
pub mod warp;

pub use build::{BuildReport, BuildState, CurveGeometry, Diagnostic, GeneratedSurface, Placement};
pub use config::TrackConfig;
pub use curve::{Curve, CurveKind, CurveRuntimeInfo};
pub use error::TrackError;
pub use host::{HostServices, NoopHost, ObjectId, ObjectRef, UndoJournal};
pub use mesh::Mesh;
pub use path::{OverrunPolicy, Segment, SegmentLocator, SegmentPath};
pub use template::{Template, TemplateLibrary};
pub use track::Track;

/// Wraps an angle in degrees into `(-180, 180]`.
pub fn wrap_degrees(mut degrees: f32) -> f32 {
    while degrees > 180.0 {
        degrees -= 360.0;
    }
    while degrees <= -180.0 {
        degrees += 360.0;
    }
    degrees
}

#[cfg(test)]
mod tests {
    use super::wrap_degrees;

    #[test]
    fn wraps_into_half_open_range() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(720.0), 0.0);
        assert_eq!(wrap_degrees(45.0), 45.0);
    }
}
