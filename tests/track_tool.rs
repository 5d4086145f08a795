use glam::Vec3;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::tempdir;
use track_forge::{Curve, Track, TrackConfig};

fn locate_binary(name: &str) -> PathBuf {
    if let Ok(path) = std::env::var(format!("CARGO_BIN_EXE_{name}")) {
        return PathBuf::from(path);
    }
    let mut path = std::env::current_exe().expect("current exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push(name);
    if cfg!(windows) {
        path.set_extension("exe");
    }
    assert!(path.exists(), "expected binary '{}' at {}, but it does not exist", name, path.display());
    path
}

fn run_tool(args: &[&str]) -> Output {
    Command::new(locate_binary("track_tool")).args(args).output().expect("run track_tool")
}

fn write_track(dir: &Path, curves: Vec<Curve>) -> String {
    let mut track = Track::new(TrackConfig::default());
    for curve in curves {
        track.add_curve(curve);
    }
    let path = dir.join("track.json");
    track.to_document().save_to_path(&path).expect("save track");
    path.to_string_lossy().into_owned()
}

#[test]
fn info_and_validate_report_on_a_saved_track() {
    let dir = tempdir().expect("temp dir");
    let track = write_track(
        dir.path(),
        vec![Curve::arc(10.0, Vec3::ZERO).with_template("road"), Curve::arc(5.0, Vec3::new(0.0, 90.0, 0.0))],
    );

    let validate = run_tool(&["validate", &track]);
    assert!(validate.status.success(), "stderr: {}", String::from_utf8_lossy(&validate.stderr));
    let stdout = String::from_utf8_lossy(&validate.stdout);
    assert!(stdout.contains("2 curves OK"), "{stdout}");

    let info = run_tool(&["info", &track, "--segment-length", "0.5"]);
    assert!(info.status.success(), "stderr: {}", String::from_utf8_lossy(&info.stderr));
    let stdout = String::from_utf8_lossy(&info.stdout);
    assert!(stdout.contains("curves: 2"), "{stdout}");
    assert!(stdout.contains("segments: 30 (0.5 units each)"), "{stdout}");
    assert!(stdout.contains("curve 1: z 10.000"), "{stdout}");
}

#[test]
fn build_reports_generated_geometry() {
    let dir = tempdir().expect("temp dir");
    let track = write_track(dir.path(), vec![Curve::arc(20.0, Vec3::ZERO).with_template("road")]);
    let manifest = dir.path().join("templates.json");
    std::fs::write(
        &manifest,
        r#"{ "templates": [{
            "name": "road",
            "surfaces": [{ "name": "deck", "mesh": { "kind": "strip", "width": 8.0, "length": 10.0 }, "main": true }]
        }] }"#,
    )
    .expect("write manifest");

    let output = run_tool(&["build", &track, &manifest.to_string_lossy()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("curve 0: 2 surfaces"), "{stdout}");
    assert!(stdout.contains("Build OK"), "{stdout}");
}

#[test]
fn validate_fails_on_negative_lengths() {
    let dir = tempdir().expect("temp dir");
    let track = write_track(dir.path(), vec![Curve::arc(10.0, Vec3::ZERO), Curve::arc(-4.0, Vec3::ZERO)]);

    let output = run_tool(&["validate", &track]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("curve 1 has negative length -4"), "{stderr}");
    assert!(stderr.contains("1 problems found"), "{stderr}");

    let unknown = run_tool(&["frobnicate"]);
    assert!(!unknown.status.success());
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("unknown command 'frobnicate'"));
}
