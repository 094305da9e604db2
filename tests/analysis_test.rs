//! Analysis pipeline tests through the public API

mod test_helpers;

use nalgebra::Point3;
use rig_forge::analysis::{analyze, ProportionEntry, ProportionTable};
use rig_forge::catalog::JointCatalog;
use rig_forge::scene::{Bone, SceneSource};
use test_helpers::{assert_close, box_scene, session_with, skinned_scene, transformed_scene};

#[test]
fn test_box_only_model_uses_proportions() {
    let scene = box_scene(800);
    let catalog = JointCatalog::body();
    let result = analyze(&scene, &catalog, ProportionTable::default(), |_| {});

    assert!(!result.has_skeleton);
    assert_eq!(result.skeleton_bone_count, 0);
    assert_eq!(result.estimated_joints.count_in(&catalog), catalog.len());

    // 1 x 2 box centered on x = 0 with feet at y = 0
    assert_close(result.estimated_joints.get("hips").unwrap(), Point3::new(0.0, 1.02, 0.0), 1e-5);
    assert_close(result.estimated_joints.get("l_shoulder").unwrap(), Point3::new(-0.21, 1.6, 0.0), 1e-5);
    assert_close(result.estimated_joints.get("r_ankle").unwrap(), Point3::new(0.075, 0.12, 0.0), 1e-5);
}

#[test]
fn test_l_elbow_bone_maps_exactly() {
    let elbow = Point3::new(-0.47, 1.33, 0.05);
    let scene = box_scene(800).with_bones(vec![Bone::new("L_Elbow", elbow)]);
    let result = analyze(&scene, &JointCatalog::body(), ProportionTable::default(), |_| {});
    assert_eq!(result.estimated_joints.get("l_elbow"), Some(elbow));
}

#[test]
fn test_combined_bone_name_fills_every_joint() {
    let at = Point3::new(0.0, 1.3, 0.0);
    let mut session = session_with(box_scene(800).with_bones(vec![Bone::new("Spine_Chest", at)]), "fused.glb");
    session.run_analysis(|_| {}).unwrap();
    assert_eq!(session.joint_positions().get("spine1"), Some(at));
    assert_eq!(session.joint_positions().get("chest"), Some(at));
    // spine2 has no bone and comes from the box
    assert_close(session.joint_positions().get("spine2").unwrap(), Point3::new(0.0, 1.37, 0.0), 1e-5);
}

#[test]
fn test_bones_are_converted_to_local_space() {
    let mut scene = transformed_scene();
    scene.bones = vec![Bone::new("Head", Point3::new(0.0, 4.6, 0.0))];
    let result = analyze(&scene, &JointCatalog::body(), ProportionTable::default(), |_| {});
    assert_close(result.estimated_joints.get("head").unwrap(), Point3::new(0.0, 1.8, 0.0), 1e-5);
    assert_close(scene.local_to_world(Point3::new(0.0, 1.8, 0.0)), Point3::new(0.0, 4.6, 0.0), 1e-5);
}

#[test]
fn test_mixamo_skeleton() {
    let scene = skinned_scene();
    let result = analyze(&scene, &JointCatalog::body(), ProportionTable::default(), |_| {});
    assert!(result.has_skeleton);
    assert!(result.has_symmetry);
    assert_eq!(result.bone_pairing.paired_count(), 2);
    assert_eq!(result.estimated_joints.get("hips"), Some(Point3::new(0.0, 1.0, 0.0)));
    assert_eq!(result.estimated_joints.get("head"), Some(Point3::new(0.0, 1.85, 0.02)));
}

#[test]
fn test_custom_proportion_table() {
    let table = ProportionTable::new(vec![ProportionEntry {
        joint: "head".to_string(),
        height: 0.5,
        width: 0.0,
    }]);
    let result = analyze(&box_scene(100), &JointCatalog::body(), table, |_| {});
    assert_close(result.estimated_joints.get("head").unwrap(), Point3::new(0.0, 1.0, 0.0), 1e-6);
}

#[test]
fn test_session_analysis_reports_every_stage() {
    let mut session = session_with(box_scene(100), "crate.obj");
    let mut labels = Vec::new();
    session.run_analysis(|p| labels.push(p.label)).unwrap();
    assert_eq!(labels.len(), 7);
    assert_eq!(labels.first(), Some(&"Reading model bounding box"));
    assert_eq!(labels.last(), Some(&"Analysis complete"));
    assert!(session.steps().check);
}

#[test]
fn test_reload_discards_previous_model() {
    let mut session = session_with(skinned_scene(), "knight.glb");
    session.run_analysis(|_| {}).unwrap();
    assert!(session.using_real_bones());

    session.load_scene(Box::new(box_scene(100)), "crate.obj", 10);
    assert!(session.joint_positions().is_empty());
    assert!(session.analysis_result().is_none());
    assert!(!session.using_real_bones());
    assert!(!session.can_undo());
}
