use glam::{Quat, Vec3};
use track_forge::config::RespawnConfig;
use track_forge::{Curve, CurveKind, OverrunPolicy, Track, TrackConfig};

fn assert_vec3_near(a: Vec3, b: Vec3, eps: f32) {
    assert!((a - b).length() < eps, "{a:?} vs {b:?}");
}

#[test]
fn runtime_info_follows_the_path() {
    let mut track = Track::new(TrackConfig::default());
    track.add_curve(Curve::arc(10.0, Vec3::ZERO));
    track.add_curve(Curve::arc(20.0, Vec3::ZERO).with_jump(true));
    assert!(track.runtime_info().is_empty());
    track.update_segments().expect("segments");

    let info = track.runtime_info();
    assert_eq!(info.len(), 2);
    assert_vec3_near(info[0].normal, Vec3::Y, 1e-5);
    assert_vec3_near(info[0].respawn_position, Vec3::new(0.0, 1.0, 5.0), 1e-4);
    assert!(info[0].respawn_rotation.angle_between(Quat::IDENTITY) < 1e-4);
    assert_eq!(info[0].z_offset, 0.0);
    assert_eq!(info[1].z_offset, 10.0);
    assert!(info[1].is_jump);
    assert_vec3_near(info[1].respawn_position, Vec3::new(0.0, 1.0, 20.0), 1e-4);
}

#[test]
fn respawn_offset_moves_along_the_path() {
    let config = TrackConfig { respawn: RespawnConfig { height: 2.0, z_offset: -3.0 }, ..TrackConfig::default() };
    let mut track = Track::new(config);
    track.add_curve(Curve::arc(10.0, Vec3::ZERO));
    track.update_segments().expect("segments");
    assert_vec3_near(track.runtime_info()[0].respawn_position, Vec3::new(0.0, 2.0, 2.0), 1e-4);
}

#[test]
fn update_segments_writes_derived_curve_data() {
    let mut track = Track::new(TrackConfig::default());
    track.add_curve(Curve::arc(10.0, Vec3::ZERO));
    track.add_curve(Curve::bezier(Vec3::new(5.0, 0.0, 30.0), Vec3::ZERO));
    track.update_segments().expect("segments");

    let arc = track.curve(0).expect("arc");
    assert_vec3_near(arc.end_position, Vec3::new(0.0, 0.0, 10.0), 1e-4);
    let bezier = track.curve(1).expect("bezier");
    assert_eq!(bezier.kind, CurveKind::Bezier);
    let chord = Vec3::new(5.0, 0.0, 20.0).length();
    assert!(bezier.length > chord && bezier.length < chord * 1.2, "{}", bezier.length);
    let extent = *track.segment_path().extent(1).expect("bezier extent");
    assert_eq!(extent.length, bezier.length);
    let segment_length = track.config().segment_length;
    let grid = extent.segment_count as f32 * segment_length;
    assert!((bezier.length - grid).abs() < 1e-4, "{} vs {grid}", bezier.length);
    assert!((track.segment_path().length() - (10.0 + grid)).abs() < 1e-3);
}

#[test]
fn close_circuit_returns_to_origin() {
    let mut track = Track::new(TrackConfig::default());
    track.add_curve(Curve::arc(20.0, Vec3::ZERO));
    track.add_curve(Curve::arc(20.0, Vec3::new(0.0, 90.0, 0.0)));
    track.add_curve(Curve::arc(20.0, Vec3::new(0.0, 90.0, 0.0)));

    let index = track.close_circuit().expect("close");
    assert_eq!(index, 3);
    assert_eq!(track.config().overrun, OverrunPolicy::Loop);
    assert!(track.is_dirty());
    track.update_segments().expect("segments");

    let closing = track.segment_path().extent(3).expect("closing extent");
    assert_eq!(closing.end_position, Vec3::ZERO);
    let yaw = track_forge::wrap_degrees(closing.end_direction.y);
    assert!(yaw.abs() < 1e-3, "{yaw}");

    let seam = track.locator().get(track.segment_path().len() as i64);
    assert_vec3_near(seam.position, Vec3::new(0.0, -0.001, 0.0), 1e-4);
}
