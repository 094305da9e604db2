//! Camera and projector behaviour seen from a session

mod test_helpers;

use nalgebra::Point3;
use rig_forge::camera::{NamedView, OrbitCamera, Viewport};
use rig_forge::config::Config;
use rig_forge::projector::Projector;
use rig_forge::scene::BoundingBox;
use rig_forge::session::RigSession;
use test_helpers::{analysed_session, assert_close, box_scene};

#[test]
fn test_target_projects_to_center() {
    let mut camera = OrbitCamera::new();
    camera.frame(&BoundingBox::new(Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 3.0, 1.0)));
    let viewport = Viewport::new(1280.0, 720.0);
    let p = camera.project(&camera.target(), &viewport).unwrap();
    assert!((p.x - 640.0).abs() < 1e-2);
    assert!((p.y - 360.0).abs() < 1e-2);
    assert!(p.opacity > 0.0 && p.opacity <= 1.0);
}

#[test]
fn test_point_behind_camera_is_not_projected() {
    let camera = OrbitCamera::new();
    let viewport = Viewport::default();
    let behind = camera.position() + (camera.position() - camera.target());
    assert!(camera.project(&behind, &viewport).is_none());
}

#[test]
fn test_unproject_inverts_project() {
    let mut camera = OrbitCamera::new();
    camera.orbit(0.4, -0.2);
    let viewport = Viewport::new(800.0, 600.0);
    let world = Point3::new(0.3, 1.2, -0.1);
    let p = camera.project(&world, &viewport).unwrap();
    assert_close(camera.unproject(p.x, p.y, p.depth, &viewport), world, 5e-3);
}

#[test]
fn test_low_tier_projects_every_other_frame() {
    let mut projector = Projector::new(30);
    projector.track(vec![("hips".to_string(), Point3::new(0.0, 1.0, 0.0))]);
    assert!(projector.frame_tick());
    let passes: Vec<bool> = (0..6).map(|_| projector.frame_tick()).collect();
    assert_eq!(passes.iter().filter(|p| **p).count(), 3);
}

#[test]
fn test_camera_move_forces_pass() {
    let mut session = analysed_session();
    session.frame_tick();
    let before = *session.projector().screen_point("head").unwrap();

    session.camera_mut().set_named_view(NamedView::Left);
    assert!(session.projector().is_dirty());
    assert!(session.frame_tick());
    let after = *session.projector().screen_point("head").unwrap();
    assert!((after.x - before.x).abs() > 1e-3 || (after.depth - before.depth).abs() > 1e-6);
}

#[test]
fn test_pose_frames_move_markers() {
    let mut session = analysed_session();
    session.frame_tick();
    let rest = *session.projector().screen_point("l_knee").unwrap();

    session.apply_pose("walk");
    session.tick(std::time::Duration::from_millis(33 * 20));
    session.frame_tick();
    let walking = *session.projector().screen_point("l_knee").unwrap();
    assert_ne!(rest, walking);
}

#[test]
fn test_pick_nearest_joint() {
    let mut session = analysed_session();
    session.frame_tick();
    let head = *session.projector().screen_point("head").unwrap();
    assert_eq!(session.projector().pick(head.x + 1.0, head.y - 1.0, 4.0), Some("head"));
}

fn head_marker(joint_opacity: u32) -> rig_forge::camera::ScreenPoint {
    let mut config = Config::default();
    config.editor.joint_opacity = joint_opacity;
    let mut session = RigSession::new(&config);
    session.load_scene(Box::new(box_scene(2000)), "hero.glb", 0);
    session.run_analysis(|_| {}).unwrap();
    session.frame_tick();
    *session.projector().screen_point("head").unwrap()
}

#[test]
fn test_joint_opacity_scales_markers() {
    let full = head_marker(100);
    let half = head_marker(50);
    assert!((half.opacity - full.opacity * 0.5).abs() < 1e-6);
    assert_eq!((half.x, half.y), (full.x, full.y));
    assert_eq!(head_marker(0).opacity, 0.0);
}

#[test]
fn test_pick_radius_follows_joint_size() {
    let mut session = analysed_session();
    session.frame_tick();
    let head = *session.projector().screen_point("head").unwrap();
    // default joint size 50 gives an 18 px marker
    assert_eq!(session.projector().marker_style().size, 18.0);
    assert_eq!(session.projector().pick_marker(head.x + 8.0, head.y), Some("head"));
    assert_eq!(session.projector().pick_marker(head.x + 30.0, head.y), None);
}
