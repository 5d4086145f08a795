use glam::Vec3;
use tempfile::tempdir;
use track_forge::document::TrackDocument;
use track_forge::template::TemplateLibrary;
use track_forge::{Curve, OverrunPolicy, Track, TrackConfig};

#[test]
fn document_roundtrip_preserves_curves_and_config() {
    let config = TrackConfig { segment_length: 0.5, overrun: OverrunPolicy::Loop, ..TrackConfig::default() };
    let mut track = Track::new(config);
    track.add_curve(Curve::arc(30.0, Vec3::new(0.0, 45.0, 12.0)).with_template("road"));
    track.add_curve(Curve::bezier(Vec3::new(20.0, 2.0, 60.0), Vec3::new(-4.0, 10.0, 0.0)).with_jump(true));

    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("tracks").join("oval.json");
    track.to_document().save_to_path(&path).expect("save track");

    let loaded = TrackDocument::load_from_path(&path).expect("load track");
    assert_eq!(loaded.config, *track.config());
    let restored = Track::from_document(&loaded);
    assert_eq!(restored.curves(), track.curves());
    assert_eq!(restored.curve(1).map(|c| c.index), Some(1));

    let text = std::fs::read_to_string(&path).expect("read back");
    assert!(text.contains("\"overrun\": \"loop\""));
    assert!(text.contains("\"kind\": \"bezier\""));
}

#[test]
fn load_reports_missing_files_with_context() {
    let dir = tempdir().expect("temp dir");
    let missing = dir.path().join("missing.json");
    let err = TrackDocument::load_from_path(&missing).expect_err("missing file");
    assert!(format!("{err:#}").contains("Failed to read track"));
}

#[test]
fn template_manifest_loads_from_disk() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("templates.json");
    std::fs::write(
        &path,
        r#"{ "templates": [
            { "name": "road",
              "surfaces": [{
                  "name": "deck",
                  "mesh": { "kind": "strip", "width": 8.0, "length": 12.0 },
                  "main": true
              }],
              "spacing_groups": { "0": { "spacing": 4.0, "spacing_before": 1.0 } } },
            { "name": "crate",
              "surfaces": [{ "name": "box", "mesh": { "kind": "box", "size": { "x": 1.0, "y": 1.0, "z": 2.0 } } }] }
        ] }"#,
    )
    .expect("write manifest");

    let library = TemplateLibrary::load_manifest(&path).expect("load manifest");
    assert_eq!(library.len(), 2);
    assert_eq!(library.get("road").map(|t| t.length()), Some(12.0));
    assert_eq!(library.get("crate").map(|t| t.length()), Some(2.0));

    let missing_mesh = r#"{ "templates": [{
        "name": "bad",
        "surfaces": [{ "name": "s", "mesh": { "kind": "gltf", "path": "nope.gltf" } }]
    }] }"#;
    std::fs::write(&path, missing_mesh).expect("write manifest");
    assert!(TemplateLibrary::load_manifest(&path).is_err());
}
