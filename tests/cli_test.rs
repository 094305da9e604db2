//! Tests for the command-line front end, run against the built binary

mod test_helpers;

use nalgebra::Point3;
use rig_forge::scene::Bone;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use test_helpers::box_scene;

/// Fresh directory holding a scene with a hips bone at 0.7 and a config
/// pointing the session record into it
fn workspace(name: &str, auto_analyze: bool) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rig_forge_cli_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    let scene = box_scene(4000).with_bones(vec![Bone::new("Hips", Point3::new(0.0, 0.7, 0.0))]);
    fs::write(dir.join("hero.json"), serde_json::to_string(&scene).unwrap()).unwrap();

    let config = format!(
        "analysis:\n  auto_analyze: {}\n  stage_delay_ms: 0\nsession:\n  state_path: \"{}\"\n",
        auto_analyze,
        dir.join("session.json").display()
    );
    fs::write(dir.join("config.yaml"), config).unwrap();
    dir
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rig-forge"))
        .arg("--config")
        .arg(dir.join("config.yaml"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute rig-forge")
}

fn export_to(dir: &Path, output: &str, extra: &[&str]) -> String {
    let scene = dir.join("hero.json");
    let out = dir.join(output);
    let mut args = vec!["export", scene.to_str().unwrap(), "--output", out.to_str().unwrap()];
    args.extend_from_slice(extra);
    let result = run(dir, &args);
    assert!(
        result.status.success(),
        "export failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    fs::read_to_string(out).unwrap()
}

fn root_offset(bvh: &str) -> &str {
    bvh.lines().nth(3).unwrap().trim()
}

#[test]
fn test_export_writes_analysed_bvh() {
    let dir = workspace("bvh", true);
    let bvh = export_to(&dir, "plain.bvh", &[]);
    assert!(bvh.starts_with("HIERARCHY\nROOT hips\n"));
    assert_eq!(root_offset(&bvh), "OFFSET 0.0000 70.0000 0.0000");
    assert!(dir.join("session.json").exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_export_pose_changes_written_rig() {
    let dir = workspace("pose", true);
    let plain = export_to(&dir, "plain.bvh", &[]);
    let walking = export_to(&dir, "walk.bvh", &["--pose", "walk"]);
    assert_ne!(plain, walking);
    assert_ne!(root_offset(&walking), root_offset(&plain));

    // The rest pose puts the hips back at the catalog default
    let rest = export_to(&dir, "rest.bvh", &["--pose", "rest"]);
    assert_eq!(root_offset(&rest), "OFFSET 0.0000 102.0000 0.0000");
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_mesh_formats_are_rejected() {
    let dir = workspace("glb", true);
    let scene = dir.join("hero.json");
    for format in ["glb", "gltf"] {
        let result = run(&dir, &["export", scene.to_str().unwrap(), "--format", format]);
        assert!(!result.status.success());
        let stderr = String::from_utf8_lossy(&result.stderr);
        assert!(stderr.contains(format), "unexpected error: {stderr}");
        assert!(!dir.join(format!("hero_rigged.{format}")).exists());
    }
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_conversion_format_writes_rig_data() {
    let dir = workspace("fbx", true);
    let scene = dir.join("hero.json");
    let result = run(&dir, &["export", scene.to_str().unwrap(), "--format", "fbx"]);
    assert!(result.status.success());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("hero_rig_data_for_fbx.json")).unwrap()).unwrap();
    assert_eq!(json["target_format"], "fbx");
    assert_eq!(json["options"]["include_animations"], true);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_auto_analyze_off_exports_defaults() {
    let dir = workspace("manual", false);
    let bvh = export_to(&dir, "manual.bvh", &[]);
    assert_eq!(root_offset(&bvh), "OFFSET 0.0000 102.0000 0.0000");
    fs::remove_dir_all(&dir).unwrap();
}
