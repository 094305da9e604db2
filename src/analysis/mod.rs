//! Heuristic rig analysis.
//!
//! Estimates joint positions for a loaded model from whatever the scene
//! offers: embedded skeleton bones when present, the bounding box
//! otherwise. The work is split into stages run one at a time through
//! [`AnalysisJob::step`] so a host can render progress between them.

/// Bone-name to joint-id table
pub mod bone_map;

/// Bounding-box proportion table
pub mod proportions;

/// Left/right detection and bone pairing
pub mod symmetry;

use crate::catalog::JointCatalog;
use crate::constants::{
    ANALYSIS_BASE_SCORE, ANALYSIS_DENSE_VERTEX_COUNT, ANALYSIS_MAX_SCORE, ANALYSIS_SKELETON_BONUS,
    ANALYSIS_SYMMETRY_BONUS, ANALYSIS_VERTEX_BONUS,
};
use crate::scene::{BoundingBox, SceneSource};
use crate::store::JointPositions;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use proportions::{ProportionEntry, ProportionTable};
pub use symmetry::BonePairing;

/// Progress checkpoint reported by a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub label: &'static str,
    pub percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    BoundingBox,
    Geometry,
    Symmetry,
    Bones,
    BoxFill,
    Score,
    Complete,
}

const STAGES: [(Stage, &str, u8); 7] = [
    (Stage::BoundingBox, "Reading model bounding box", 10),
    (Stage::Geometry, "Counting geometry", 22),
    (Stage::Symmetry, "Detecting symmetry axis", 38),
    (Stage::Bones, "Mapping anatomical landmarks", 52),
    (Stage::BoxFill, "Estimating joints from geometry", 68),
    (Stage::Score, "Computing quality score", 84),
    (Stage::Complete, "Analysis complete", 100),
];

/// Outcome of analysing one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub bounding_box: BoundingBox,
    pub mesh_count: usize,
    pub vertex_count: usize,
    pub has_skeleton: bool,
    pub skeleton_bone_count: usize,
    pub has_symmetry: bool,
    pub estimated_joints: JointPositions,
    pub quality_score: u32,
    /// Mirror pairing of the skeleton's bones, by bone index
    pub bone_pairing: BonePairing,
}

/// Analyzer quality estimate, capped at [`ANALYSIS_MAX_SCORE`]
pub fn analysis_quality(has_skeleton: bool, vertex_count: usize, has_symmetry: bool) -> u32 {
    let mut score = ANALYSIS_BASE_SCORE;
    if has_skeleton {
        score += ANALYSIS_SKELETON_BONUS;
    }
    if vertex_count > ANALYSIS_DENSE_VERTEX_COUNT {
        score += ANALYSIS_VERTEX_BONUS;
    }
    if has_symmetry {
        score += ANALYSIS_SYMMETRY_BONUS;
    }
    score.min(ANALYSIS_MAX_SCORE)
}

/// A staged analysis of one scene.
///
/// Each call to [`step`](Self::step) runs one stage and returns its progress
/// checkpoint; `None` means the job has finished. Dropping the job abandons
/// the analysis.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    next_stage: usize,
    proportions: ProportionTable,
    result: AnalysisResult,
}

impl AnalysisJob {
    #[must_use]
    pub fn new(proportions: ProportionTable) -> Self {
        Self {
            next_stage: 0,
            proportions,
            result: AnalysisResult::default(),
        }
    }

    /// Run the next stage against `scene`
    pub fn step(&mut self, scene: &dyn SceneSource, catalog: &JointCatalog) -> Option<Progress> {
        let &(stage, label, percent) = STAGES.get(self.next_stage)?;
        self.next_stage += 1;
        debug!("Analysis stage {:?} ({}%)", stage, percent);

        match stage {
            Stage::BoundingBox => {
                self.result.bounding_box = scene.bounding_box().unwrap_or_default();
            }
            Stage::Geometry => {
                let stats = scene.mesh_stats();
                self.result.mesh_count = stats.mesh_count;
                self.result.vertex_count = stats.vertex_count;
            }
            Stage::Symmetry => {
                let bones = scene.bones();
                self.result.has_skeleton = scene.has_skeleton();
                self.result.skeleton_bone_count = bones.len();
                self.result.has_symmetry = symmetry::detect_symmetry(bones.iter().map(|b| b.name.as_str()));
                self.result.bone_pairing = BonePairing::from_names(bones.iter().map(|b| b.name.as_str()));
            }
            Stage::Bones => {
                let joints = &mut self.result.estimated_joints;
                for bone in scene.bones() {
                    let local = scene.world_to_local(bone.world_position);
                    for joint in bone_map::match_bone(&bone.name, |id| joints.contains(id)) {
                        if catalog.contains(joint) {
                            joints.set(joint, local);
                        }
                    }
                }
                debug!("Mapped {} joints from {} bones", joints.len(), scene.bones().len());
            }
            Stage::BoxFill => {
                let filled =
                    self.proportions
                        .fill(catalog, &self.result.bounding_box, &mut self.result.estimated_joints);
                debug!("Filled {} joints from bounding box proportions", filled);
            }
            Stage::Score => {
                self.result.quality_score = analysis_quality(
                    self.result.has_skeleton,
                    self.result.vertex_count,
                    self.result.has_symmetry,
                );
            }
            Stage::Complete => {
                info!(
                    "Analysis complete: {} joints, skeleton={}, symmetry={}, score={}",
                    self.result.estimated_joints.len(),
                    self.result.has_skeleton,
                    self.result.has_symmetry,
                    self.result.quality_score
                );
            }
        }

        Some(Progress { label, percent })
    }

    pub fn is_finished(&self) -> bool {
        self.next_stage >= STAGES.len()
    }

    /// Percent of the last completed stage
    pub fn percent(&self) -> u8 {
        self.next_stage.checked_sub(1).map_or(0, |i| STAGES[i].2)
    }

    /// The result so far; complete once [`is_finished`](Self::is_finished)
    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    pub fn into_result(self) -> AnalysisResult {
        self.result
    }
}

/// Run every stage back to back, reporting each checkpoint to `on_progress`
pub fn analyze<F>(
    scene: &dyn SceneSource,
    catalog: &JointCatalog,
    proportions: ProportionTable,
    mut on_progress: F,
) -> AnalysisResult
where
    F: FnMut(Progress),
{
    let mut job = AnalysisJob::new(proportions);
    while let Some(progress) = job.step(scene, catalog) {
        on_progress(progress);
    }
    job.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Bone, MeshStats, StaticScene};
    use nalgebra::Point3;

    fn box_scene(vertex_count: usize) -> StaticScene {
        StaticScene::with_bounds(
            BoundingBox::new(Point3::new(-0.5, 0.0, -0.2), Point3::new(0.5, 2.0, 0.2)),
            MeshStats {
                vertex_count,
                mesh_count: 1,
                ..MeshStats::default()
            },
        )
    }

    #[test]
    fn test_progress_checkpoints() {
        let scene = box_scene(100);
        let mut seen = Vec::new();
        analyze(&scene, &JointCatalog::body(), ProportionTable::default(), |p| seen.push(p.percent));
        assert_eq!(seen, vec![10, 22, 38, 52, 68, 84, 100]);
    }

    #[test]
    fn test_step_runs_one_stage_at_a_time() {
        let scene = box_scene(100);
        let catalog = JointCatalog::body();
        let mut job = AnalysisJob::new(ProportionTable::default());
        assert_eq!(job.percent(), 0);
        job.step(&scene, &catalog);
        assert_eq!(job.result().bounding_box.max.y, 2.0);
        assert_eq!(job.result().vertex_count, 0);
        job.step(&scene, &catalog);
        assert_eq!(job.result().vertex_count, 100);
        while job.step(&scene, &catalog).is_some() {}
        assert!(job.is_finished());
        assert_eq!(job.percent(), 100);
        assert!(job.step(&scene, &catalog).is_none());
    }

    #[test]
    fn test_box_only_proportions() {
        let scene = box_scene(100);
        let result = analyze(&scene, &JointCatalog::body(), ProportionTable::default(), |_| {});
        let hips = result.estimated_joints.get("hips").unwrap();
        let head = result.estimated_joints.get("head").unwrap();
        assert!((hips.y - 0.51 * 2.0).abs() < 1e-6);
        assert!((head.y - 0.95 * 2.0).abs() < 1e-6);
        assert_eq!(hips.x, 0.0);
        assert_eq!(head.x, 0.0);
        assert!(!result.has_skeleton);
        assert!(result.has_symmetry);
        assert_eq!(result.quality_score, 65);
    }

    #[test]
    fn test_bone_maps_exactly_under_identity() {
        let elbow = Point3::new(-0.55, 1.4, 0.03);
        let scene = box_scene(6000).with_bones(vec![
            Bone::new("L_Elbow", elbow),
            Bone::new("R_Elbow", Point3::new(0.55, 1.4, 0.03)),
        ]);
        let result = analyze(&scene, &JointCatalog::body(), ProportionTable::default(), |_| {});
        assert_eq!(result.estimated_joints.get("l_elbow"), Some(elbow));
        assert!(result.has_skeleton);
        assert_eq!(result.skeleton_bone_count, 2);
        assert!(result.has_symmetry);
        assert_eq!(result.bone_pairing.mirror_of(0), Some(1));
        assert_eq!(result.quality_score, ANALYSIS_MAX_SCORE);
    }

    #[test]
    fn test_first_bone_wins() {
        let scene = box_scene(100).with_bones(vec![
            Bone::new("Hips", Point3::new(0.0, 1.0, 0.0)),
            Bone::new("Pelvis", Point3::new(0.0, 0.9, 0.0)),
        ]);
        let result = analyze(&scene, &JointCatalog::body(), ProportionTable::default(), |_| {});
        assert_eq!(result.estimated_joints.get("hips"), Some(Point3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_combined_bone_fills_both_joints() {
        let at = Point3::new(0.0, 1.3, 0.0);
        let scene = box_scene(100).with_bones(vec![Bone::new("Spine_Chest", at)]);
        let result = analyze(&scene, &JointCatalog::body(), ProportionTable::default(), |_| {});
        assert_eq!(result.estimated_joints.get("spine1"), Some(at));
        assert_eq!(result.estimated_joints.get("chest"), Some(at));
    }

    #[test]
    fn test_one_sided_skeleton_is_asymmetric() {
        let scene = box_scene(100).with_bones(vec![Bone::new("L_Arm", Point3::new(-0.3, 1.5, 0.0))]);
        let result = analyze(&scene, &JointCatalog::body(), ProportionTable::default(), |_| {});
        assert!(!result.has_symmetry);
        assert_eq!(result.quality_score, 80);
    }

    #[test]
    fn test_empty_scene_degrades_to_zeroed_output() {
        let scene = StaticScene::default();
        let catalog = JointCatalog::body();
        let result = analyze(&scene, &catalog, ProportionTable::default(), |_| {});
        assert_eq!(result.bounding_box, BoundingBox::zero());
        assert_eq!(result.estimated_joints.count_in(&catalog), catalog.len());
        assert!(result.estimated_joints.iter().all(|(_, p)| p.x == 0.0 && p.y == 0.0));
    }

    #[test]
    fn test_quality_terms() {
        assert_eq!(analysis_quality(false, 0, false), 60);
        assert_eq!(analysis_quality(true, 0, false), 80);
        assert_eq!(analysis_quality(false, 5001, false), 70);
        assert_eq!(analysis_quality(true, 10_000, true), 95);
    }
}
