use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

fn write_camera(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("camera.json");
    let camera = json!({
        "image_size": { "width": 64, "height": 48 },
        "intrinsics": { "fx": 60.0, "fy": 60.0, "cx": 32.0, "cy": 24.0 }
    });
    fs::write(&path, camera.to_string()).expect("write camera");
    path
}

fn marker(id: i32, cx: f32, tx: f64) -> Value {
    json!({
        "id": id,
        "corners": [[cx - 2.0, 22.0], [cx + 2.0, 22.0], [cx + 2.0, 26.0], [cx - 2.0, 26.0]],
        "rvec": [0.0, 0.0, 0.0],
        "tvec": [tx, 0.0, 1.0]
    })
}

fn write_session(dir: &Path, frames: usize) -> std::path::PathBuf {
    let camera = write_camera(dir);
    let mut frame_paths = Vec::new();
    for i in 0..frames {
        let p = dir.join(format!("frame_{i}.png"));
        image::RgbImage::new(64, 48).save(&p).expect("save frame");
        frame_paths.push(p);
    }

    let system = json!([marker(141, 36.0, 0.05), marker(217, 32.0, 0.0), marker(144, 50.0, 0.2)]);
    let detections = dir.join("detections.json");
    fs::write(&detections, json!({ "frames": vec![system; frames] }).to_string())
        .expect("write detections");

    let config = dir.join("session.json");
    let body = json!({
        "camera_path": camera,
        "frames": frame_paths,
        "detections_path": detections,
        "texture_root": dir.join("missing-textures"),
        "marker_size": 0.04
    });
    fs::write(&config, body.to_string()).expect("write config");
    config
}

#[test]
fn run_writes_report_with_orbiting_planets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_session(dir.path(), 2);
    let report_path = dir.path().join("out.json");

    Command::cargo_bin("orrery")
        .expect("binary")
        .args(["run", "--config"])
        .arg(&config)
        .arg("--output")
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 frames, final angle 6.0"));

    let report: Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("report")).expect("json");
    let frames = report["frames"].as_array().expect("frames");
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["summary"]["consistent"], true);
    assert_eq!(frames[0]["summary"]["sun_present"], true);
    assert_eq!(frames[0]["commands"][0]["kind"], "background");
    // Textures are missing: every sphere is drawn untextured.
    let spheres: Vec<&Value> = frames[0]["commands"]
        .as_array()
        .expect("commands")
        .iter()
        .filter(|c| c["kind"] == "sphere")
        .collect();
    assert_eq!(spheres.len(), 3);
    assert!(spheres.iter().all(|s| s["texture"].is_null()));
}

#[test]
fn run_reports_missing_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::cargo_bin("orrery")
        .expect("binary")
        .args(["run", "--config"])
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn planets_prints_builtin_table() {
    let out = Command::cargo_bin("orrery")
        .expect("binary")
        .arg("planets")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let entries: Value = serde_json::from_slice(&out).expect("json");
    let names: Vec<&str> = entries
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|e| e["name"].as_str())
        .collect();
    // Sorted by marker id.
    assert_eq!(names, vec!["Earth", "Jupiter", "Sun"]);
}

#[test]
fn project_prints_gl_matrix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let camera = write_camera(dir.path());
    let out = Command::cargo_bin("orrery")
        .expect("binary")
        .args(["project", "--camera"])
        .arg(&camera)
        .args(["--width", "128", "--height", "96"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let rows: Vec<[f64; 4]> = serde_json::from_slice(&out).expect("rows");
    assert!((rows[0][0] - 2.0 * 60.0 / 64.0).abs() < 1e-9);
    assert!(rows[0][2].abs() < 1e-9);
    assert_eq!(rows[3], [0.0, 0.0, -1.0, 0.0]);
}

#[test]
fn project_rejects_empty_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let camera = write_camera(dir.path());
    Command::cargo_bin("orrery")
        .expect("binary")
        .args(["project", "--camera"])
        .arg(&camera)
        .args(["--width", "0", "--height", "96"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-zero"));
}
