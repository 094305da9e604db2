//! Helper functions and utilities for tests

use nalgebra::{Matrix4, Point3, Vector3};
use rig_forge::config::Config;
use rig_forge::scene::{Bone, BoundingBox, MeshStats, StaticScene};
use rig_forge::session::RigSession;

/// A 1 x 2 x 0.4 box standing on the origin, no skeleton
pub fn box_scene(vertices: usize) -> StaticScene {
    StaticScene::with_bounds(
        BoundingBox::new(Point3::new(-0.5, 0.0, -0.2), Point3::new(0.5, 2.0, 0.2)),
        MeshStats {
            vertex_count: vertices,
            triangle_count: vertices * 2,
            mesh_count: 1,
            material_count: 1,
            ..MeshStats::default()
        },
    )
}

/// Box scene with a small Mixamo-style skeleton
pub fn skinned_scene() -> StaticScene {
    box_scene(12_000).with_bones(vec![
        Bone::new("mixamorig:Hips", Point3::new(0.0, 1.0, 0.0)),
        Bone::new("mixamorig:Head", Point3::new(0.0, 1.85, 0.02)),
        Bone::new("mixamorig:LeftForeArm", Point3::new(-0.5, 1.38, 0.0)),
        Bone::new("mixamorig:RightForeArm", Point3::new(0.5, 1.38, 0.0)),
    ])
}

/// Scene whose model matrix scales by 2 and lifts by 1 on Y
pub fn transformed_scene() -> StaticScene {
    let mut scene = box_scene(3000);
    scene.model_matrix = Matrix4::new_translation(&Vector3::new(0.0, 1.0, 0.0)) * Matrix4::new_scaling(2.0);
    scene
}

/// Session with `scene` loaded under default configuration
pub fn session_with(scene: StaticScene, file_name: &str) -> RigSession {
    let mut session = RigSession::new(&Config::default());
    session.load_scene(Box::new(scene), file_name, 4096);
    session
}

/// Session with the box scene loaded and analysed
pub fn analysed_session() -> RigSession {
    let mut session = session_with(box_scene(8000), "hero.glb");
    session
        .run_analysis(|_| {})
        .expect("analysis of a loaded scene succeeds");
    session
}

pub fn assert_close(a: Point3<f32>, b: Point3<f32>, eps: f32) {
    assert!((a - b).norm() <= eps, "{a:?} != {b:?} (eps {eps})");
}
