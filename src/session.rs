//! Per-file rigging session.
//!
//! [`RigSession`] owns everything that belongs to one loaded model: the
//! scene handle, joint stores, undo history, camera and projector, the
//! running pose animation and the in-flight analysis. All writes go through
//! `&mut RigSession`.

use crate::analysis::{AnalysisJob, AnalysisResult, Progress, ProportionTable};
use crate::camera::{OrbitCamera, Viewport};
use crate::catalog::{hand_joint_defs, JointCatalog, JointId, Side};
use crate::config::Config;
use crate::export::{self, ExportFormat, ExportOptions, RigData, RigDataExport};
use crate::history::History;
use crate::persistence::{SessionRecord, WorkflowSteps};
use crate::poses::{self, PoseKind, PoseTask};
use crate::projector::Projector;
use crate::quality::{self, ModelStats, QualityReport, RigState};
use crate::scene::{BoundingBox, SceneSource};
use crate::store::{mirror_x, JointPositions};
use crate::{Error, Result};
use log::{debug, info, warn};
use nalgebra::Point3;
use std::time::Duration;

#[derive(Debug, Clone)]
struct DragState {
    joint: JointId,
    depth: f32,
}

/// Undo entry covering the body and both hands
#[derive(Debug, Clone, PartialEq)]
struct RigSnapshot {
    body: JointPositions,
    left_hand: JointPositions,
    right_hand: JointPositions,
}

/// A procedural pose shown instead of the edited rig
#[derive(Debug, Clone)]
struct ActivePose {
    kind: PoseKind,
    positions: JointPositions,
    task: Option<PoseTask>,
}

/// Rigging state for one loaded model
pub struct RigSession {
    body_catalog: JointCatalog,
    left_hand_catalog: JointCatalog,
    right_hand_catalog: JointCatalog,

    scene: Option<Box<dyn SceneSource>>,
    file_name: String,
    file_size: u64,

    body: JointPositions,
    left_hand: JointPositions,
    right_hand: JointPositions,
    active_hand: Side,
    symmetry: bool,
    using_real_bones: bool,

    history: History<RigSnapshot>,
    projector: Projector,
    drag: Option<DragState>,
    pose: Option<ActivePose>,

    analysis: Option<AnalysisJob>,
    analysis_result: Option<AnalysisResult>,
    proportions: ProportionTable,
    analysis_delay: Duration,

    steps: WorkflowSteps,
    export_format: ExportFormat,
    export_options: ExportOptions,
}

impl RigSession {
    /// Empty session configured from `config`
    pub fn new(config: &Config) -> Self {
        let mut projector = Projector::new(config.projection.fps());
        projector.set_marker_style(config.editor.marker_style());
        Self {
            body_catalog: JointCatalog::body(),
            left_hand_catalog: JointCatalog::from_defs(hand_joint_defs(Side::Left)),
            right_hand_catalog: JointCatalog::from_defs(hand_joint_defs(Side::Right)),
            scene: None,
            file_name: String::new(),
            file_size: 0,
            body: JointPositions::new(),
            left_hand: JointPositions::new(),
            right_hand: JointPositions::new(),
            active_hand: Side::Left,
            symmetry: config.editor.default_symmetry,
            using_real_bones: false,
            history: History::new(),
            projector,
            drag: None,
            pose: None,
            analysis: None,
            analysis_result: None,
            proportions: config.analysis.proportions.clone(),
            analysis_delay: config.analysis_delay(),
            steps: WorkflowSteps::default(),
            export_format: config.export.default_format,
            export_options: config.export.options(),
        }
    }

    /// Attach a newly loaded model, discarding all state of the previous one
    pub fn load_scene(&mut self, scene: Box<dyn SceneSource>, file_name: &str, file_size: u64) {
        self.stop_pose();
        if self.analysis.take().is_some() {
            debug!("Abandoning analysis of {}", self.file_name);
        }
        self.drag = None;
        self.analysis_result = None;
        self.body.clear();
        self.left_hand.clear();
        self.right_hand.clear();
        self.history.clear();
        self.using_real_bones = scene.has_skeleton();
        self.steps = WorkflowSteps {
            load: true,
            ..WorkflowSteps::default()
        };

        if let Some(bbox) = world_bounds(scene.as_ref()) {
            self.projector.camera_mut().frame(&bbox);
        } else {
            self.projector.camera_mut().reset();
        }

        info!("Loaded {} ({} bytes)", file_name, file_size);
        self.file_name = file_name.to_string();
        self.file_size = file_size;
        self.scene = Some(scene);
        self.refresh_projection();
    }

    pub fn has_model(&self) -> bool {
        self.scene.is_some()
    }

    pub fn scene(&self) -> Option<&dyn SceneSource> {
        self.scene.as_deref()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn body_catalog(&self) -> &JointCatalog {
        &self.body_catalog
    }

    pub fn hand_catalog(&self, side: Side) -> &JointCatalog {
        match side {
            Side::Left => &self.left_hand_catalog,
            Side::Right => &self.right_hand_catalog,
        }
    }

    /// Edited body positions
    pub fn joint_positions(&self) -> &JointPositions {
        &self.body
    }

    /// Positions currently on screen: the active pose if one is shown, else the edited rig
    pub fn displayed_positions(&self) -> &JointPositions {
        self.pose.as_ref().map_or(&self.body, |p| &p.positions)
    }

    pub fn steps(&self) -> WorkflowSteps {
        self.steps
    }

    pub fn steps_mut(&mut self) -> &mut WorkflowSteps {
        &mut self.steps
    }

    pub fn using_real_bones(&self) -> bool {
        self.using_real_bones
    }

    // ── Analysis ─────────────────────────────────────────────────

    /// Start analysing the loaded model
    ///
    /// # Errors
    ///
    /// Returns `NoModel` without a scene and `AnalysisInFlight` while a
    /// previous analysis has not finished.
    pub fn begin_analysis(&mut self) -> Result<()> {
        if self.scene.is_none() {
            return Err(Error::NoModel);
        }
        if self.analysis.is_some() {
            return Err(Error::AnalysisInFlight);
        }
        info!("Starting analysis of {}", self.file_name);
        self.analysis = Some(AnalysisJob::new(self.proportions.clone()));
        Ok(())
    }

    /// Run one analysis stage. Returns its checkpoint, or `None` when no
    /// analysis is running. The final stage seeds the joint store.
    pub fn step_analysis(&mut self) -> Option<Progress> {
        let scene = self.scene.as_deref()?;
        let job = self.analysis.as_mut()?;
        let progress = job.step(scene, &self.body_catalog);
        if job.is_finished() {
            if let Some(job) = self.analysis.take() {
                self.finish_analysis(job.into_result());
            }
        }
        progress
    }

    /// Run a whole analysis, reporting each checkpoint
    ///
    /// # Errors
    ///
    /// Same as [`begin_analysis`](Self::begin_analysis)
    pub fn run_analysis<F>(&mut self, mut on_progress: F) -> Result<&AnalysisResult>
    where
        F: FnMut(Progress),
    {
        self.begin_analysis()?;
        while let Some(progress) = self.step_analysis() {
            on_progress(progress);
        }
        self.analysis_result.as_ref().ok_or(Error::NoModel)
    }

    pub fn is_analyzing(&self) -> bool {
        self.analysis.is_some()
    }

    pub fn analysis_result(&self) -> Option<&AnalysisResult> {
        self.analysis_result.as_ref()
    }

    /// Pause a host should leave between analysis stages
    pub fn analysis_delay(&self) -> Duration {
        self.analysis_delay
    }

    fn finish_analysis(&mut self, result: AnalysisResult) {
        let filled = self.body.fill_from(&result.estimated_joints);
        debug!("Seeded {} joints from analysis", filled);
        self.using_real_bones = result.has_skeleton;
        self.steps.check = true;
        self.analysis_result = Some(result);
        self.seed_history();
        self.refresh_projection();
    }

    // ── Editing ──────────────────────────────────────────────────

    pub fn symmetry(&self) -> bool {
        self.symmetry
    }

    pub fn set_symmetry(&mut self, symmetry: bool) {
        self.symmetry = symmetry;
    }

    fn check_body_joint(&self, id: &str) -> Result<()> {
        if self.body_catalog.contains(id) {
            Ok(())
        } else {
            Err(Error::UnknownJoint(id.to_string()))
        }
    }

    /// Place a body joint (and its mirror under symmetry) and record the edit
    ///
    /// # Errors
    ///
    /// Returns `UnknownJoint` if `id` is not a body joint
    pub fn set_joint(&mut self, id: &str, position: Point3<f32>) -> Result<()> {
        self.check_body_joint(id)?;
        self.stop_pose();
        self.body.set_mirrored(&self.body_catalog, id, position, self.symmetry);
        self.push_history();
        self.refresh_projection();
        Ok(())
    }

    /// Start dragging a body joint on the overlay
    ///
    /// # Errors
    ///
    /// Returns `NoModel` without a scene and `UnknownJoint` for an id outside
    /// the body catalog
    pub fn begin_drag(&mut self, id: &str) -> Result<()> {
        self.check_body_joint(id)?;
        if self.scene.is_none() {
            return Err(Error::NoModel);
        }
        self.stop_pose();

        let scene = self.scene.as_deref().ok_or(Error::NoModel)?;
        let def = self.body_catalog.get(id).ok_or_else(|| Error::UnknownJoint(id.to_string()))?;
        let world = scene.local_to_world(self.body.resolve(def));
        let depth = self
            .projector
            .camera()
            .to_ndc(&world, &self.projector.viewport())
            .z;
        self.drag = Some(DragState {
            joint: id.to_string(),
            depth,
        });
        Ok(())
    }

    /// Move the dragged joint under overlay pixel `(x, y)`, keeping its depth.
    /// Returns the new model-local position, or `None` when nothing is dragged.
    pub fn drag_to(&mut self, x: f32, y: f32) -> Option<Point3<f32>> {
        let drag = self.drag.as_ref()?;
        let scene = self.scene.as_deref()?;
        let viewport = self.projector.viewport();
        if viewport.is_empty() {
            return None;
        }
        let world = self.projector.camera().unproject(x, y, drag.depth, &viewport);
        let local = scene.world_to_local(world);
        let joint = drag.joint.clone();
        self.body.set_mirrored(&self.body_catalog, &joint, local, self.symmetry);
        self.refresh_projection();
        Some(local)
    }

    /// Finish a drag and record it. Returns whether a drag was active.
    pub fn end_drag(&mut self) -> bool {
        if self.drag.take().is_none() {
            return false;
        }
        self.push_history();
        true
    }

    pub fn dragging(&self) -> Option<&str> {
        self.drag.as_ref().map(|d| d.joint.as_str())
    }

    /// Put every body joint back to its default as one undoable edit
    pub fn reset_joints(&mut self) {
        self.stop_pose();
        self.drag = None;
        self.body = JointPositions::from_defaults(&self.body_catalog);
        self.push_history();
        self.refresh_projection();
    }

    // ── History ──────────────────────────────────────────────────

    /// Record the current body and hand positions
    pub fn push_history(&mut self) {
        self.history.push(RigSnapshot {
            body: self.body.snapshot(),
            left_hand: self.left_hand.snapshot(),
            right_hand: self.right_hand.snapshot(),
        });
    }

    fn seed_history(&mut self) {
        self.history.clear();
        self.push_history();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one edit. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Step forward one edit. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    fn apply_snapshot(&mut self, snapshot: RigSnapshot) {
        self.stop_pose();
        self.drag = None;
        self.body.replace(snapshot.body);
        self.left_hand.replace(snapshot.left_hand);
        self.right_hand.replace(snapshot.right_hand);
        self.refresh_projection();
    }

    // ── Hands ────────────────────────────────────────────────────

    pub fn active_hand(&self) -> Side {
        self.active_hand
    }

    pub fn set_active_hand(&mut self, side: Side) {
        if self.active_hand != side {
            self.active_hand = side;
            self.refresh_projection();
        }
    }

    pub fn hand_positions(&self, side: Side) -> &JointPositions {
        match side {
            Side::Left => &self.left_hand,
            Side::Right => &self.right_hand,
        }
    }

    /// Place a hand joint and record the edit; under symmetry the other hand
    /// gets the mirrored position
    ///
    /// # Errors
    ///
    /// Returns `UnknownJoint` if `id` is not a joint of that hand
    pub fn set_hand_joint(&mut self, side: Side, id: &str, position: Point3<f32>) -> Result<()> {
        let mirror = self
            .hand_catalog(side)
            .get(id)
            .ok_or_else(|| Error::UnknownJoint(id.to_string()))?
            .mirror
            .clone();
        self.stop_pose();
        let (this, other) = match side {
            Side::Left => (&mut self.left_hand, &mut self.right_hand),
            Side::Right => (&mut self.right_hand, &mut self.left_hand),
        };
        this.set(id, position);
        if self.symmetry {
            if let Some(mirror) = mirror {
                other.set(&mirror, mirror_x(position));
            }
        }
        self.push_history();
        self.refresh_projection();
        Ok(())
    }

    /// Put one hand back to its defaults as one undoable edit
    pub fn reset_hand(&mut self, side: Side) {
        self.stop_pose();
        let defaults = JointPositions::from_defaults(self.hand_catalog(side));
        match side {
            Side::Left => self.left_hand = defaults,
            Side::Right => self.right_hand = defaults,
        }
        self.push_history();
        self.refresh_projection();
    }

    // ── Poses ────────────────────────────────────────────────────

    /// Show a procedural pose by name; unknown names show the rest pose.
    /// Returns `false` only when no model is loaded.
    pub fn apply_pose(&mut self, name: &str) -> bool {
        if self.scene.is_none() {
            return false;
        }
        self.stop_pose();
        let kind = PoseKind::parse(name);
        info!("Applying pose {}", kind);
        self.pose = Some(ActivePose {
            kind,
            positions: poses::initial_pose(kind, &self.body_catalog),
            task: PoseTask::start(kind),
        });
        self.refresh_projection();
        true
    }

    /// Stop any shown pose and go back to the edited rig
    pub fn stop_pose(&mut self) {
        if let Some(pose) = self.pose.take() {
            debug!("Stopped pose {}", pose.kind);
            self.projector.mark_dirty();
        }
    }

    /// Write the shown pose frame into the edited rig as one undoable edit.
    /// Returns `false` when no pose is shown.
    pub fn commit_pose(&mut self) -> bool {
        let Some(pose) = self.pose.take() else {
            return false;
        };
        info!("Committed pose {} to the rig", pose.kind);
        for (id, position) in pose.positions.iter() {
            self.body.set(id, position);
        }
        self.push_history();
        self.refresh_projection();
        true
    }

    pub fn active_pose(&self) -> Option<PoseKind> {
        self.pose.as_ref().map(|p| p.kind)
    }

    /// Whether an animated pose is running
    pub fn is_animating(&self) -> bool {
        self.pose.as_ref().is_some_and(|p| p.task.is_some())
    }

    /// Advance host time: steps the pose animation. Returns the number of
    /// animation frames produced.
    pub fn tick(&mut self, elapsed: Duration) -> u32 {
        let Some(pose) = self.pose.as_mut() else {
            return 0;
        };
        let Some(task) = pose.task.as_mut() else {
            return 0;
        };
        let frames = task.advance(elapsed, &mut pose.positions);
        if frames > 0 {
            self.refresh_projection();
        }
        frames
    }

    // ── Projection ───────────────────────────────────────────────

    pub fn camera(&self) -> &OrbitCamera {
        self.projector.camera()
    }

    /// Camera access; mutations mark the overlay dirty
    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        self.projector.camera_mut()
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.projector.set_viewport(viewport);
    }

    /// Host frame callback. Returns whether the overlay was re-projected.
    pub fn frame_tick(&mut self) -> bool {
        self.projector.frame_tick()
    }

    /// Recenter the camera on the model
    pub fn reset_view(&mut self) {
        match self.scene.as_deref().and_then(|scene| world_bounds(scene)) {
            Some(bbox) => self.projector.camera_mut().frame(&bbox),
            None => self.projector.camera_mut().reset(),
        }
    }

    fn refresh_projection(&mut self) {
        let Some(scene) = self.scene.as_deref() else {
            self.projector.track(Vec::new());
            return;
        };
        let shown = self.pose.as_ref().map_or(&self.body, |p| &p.positions);
        let (hand_catalog, hand) = match self.active_hand {
            Side::Left => (&self.left_hand_catalog, &self.left_hand),
            Side::Right => (&self.right_hand_catalog, &self.right_hand),
        };
        let body_points = self
            .body_catalog
            .iter()
            .map(|def| (def.id.clone(), scene.local_to_world(shown.resolve(def))));
        let hand_points = hand_catalog
            .iter()
            .filter(|def| hand.contains(&def.id))
            .map(|def| (def.id.clone(), scene.local_to_world(hand.resolve(def))));
        let points: Vec<_> = body_points.chain(hand_points).collect();
        self.projector.track(points);
    }

    // ── Quality & export ─────────────────────────────────────────

    fn model_stats(&self) -> ModelStats {
        self.scene.as_deref().map_or_else(ModelStats::default, |scene| {
            ModelStats::from_mesh(&scene.mesh_stats(), scene.bones().len())
        })
    }

    /// Quality report for the current rig
    pub fn quality_report(&self, file_name: &str) -> QualityReport {
        let rig = RigState {
            touched_joints: self.body.count_in(&self.body_catalog),
            catalog_joints: self.body_catalog.len(),
        };
        quality::score(&self.model_stats(), &rig, file_name)
    }

    /// BVH document for the edited body rig
    ///
    /// # Errors
    ///
    /// Returns `MalformedCatalog` if the body catalog is invalid
    pub fn export_hierarchy(&self) -> Result<String> {
        export::export_bvh(&self.body_catalog, &self.body)
    }

    pub fn export_format(&self) -> ExportFormat {
        self.export_format
    }

    pub fn set_export_format(&mut self, format: ExportFormat) {
        self.export_format = format;
    }

    /// `<stem>_rigged.<ext>` for the loaded file
    pub fn export_file_name(&self) -> String {
        export::export_file_name(&self.file_name, self.export_format)
    }

    /// Rig data document for formats that need external conversion
    pub fn rig_data_export(&self, export_time: u64) -> RigDataExport {
        RigDataExport::new(
            &self.file_name,
            self.export_format,
            self.export_options,
            self.model_stats(),
            RigData {
                body_joints: self.body.clone(),
                using_real_bones: self.using_real_bones,
                hand_left: self.left_hand.clone(),
                hand_right: self.right_hand.clone(),
                analysis_data: self.analysis_result.clone(),
            },
            self.quality_report(&self.file_name),
            export_time,
        )
    }

    pub fn export_options(&self) -> ExportOptions {
        self.export_options
    }

    /// File name and contents written for the current export format: the BVH
    /// hierarchy, or the JSON rig data document for formats that need
    /// conversion
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for glb and gltf, `MalformedCatalog` if the body
    /// catalog is invalid and `Serialization` if the document cannot be encoded
    pub fn export_document(&self, export_time: u64) -> Result<(String, String)> {
        let format = self.export_format;
        if format.is_mesh_container() {
            return Err(Error::InvalidInput(format!(
                "{format} export needs the mesh; choose bvh, fbx or usd"
            )));
        }
        if format.needs_conversion() {
            let doc = self.rig_data_export(export_time);
            return Ok((
                export::rig_data_file_name(&self.file_name, format),
                export::rig_data_json(&doc)?,
            ));
        }
        Ok((self.export_file_name(), self.export_hierarchy()?))
    }

    // ── Persistence ──────────────────────────────────────────────

    /// Checkpoint of the session; `saved_at` is stamped by the store
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            file_name: self.file_name.clone(),
            file_size: self.file_size,
            completed_steps: self.steps,
            joint_positions: self.body.clone(),
            symmetry: self.symmetry,
            using_real_bones: self.using_real_bones,
            active_hand: self.active_hand,
            left_hand_positions: self.left_hand.clone(),
            right_hand_positions: self.right_hand.clone(),
            export_format: self.export_format,
            saved_at: 0,
        }
    }

    /// Apply a saved record. Joint ids unknown to the catalogs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SessionExpired` if the record is older than `ttl` at `now_ms`
    pub fn restore(&mut self, record: &SessionRecord, now_ms: u64, ttl: Duration) -> Result<()> {
        if record.is_expired(now_ms, ttl) {
            return Err(Error::SessionExpired);
        }
        if !self.file_name.is_empty() && record.file_name != self.file_name {
            warn!(
                "Restoring session saved for {} onto {}",
                record.file_name, self.file_name
            );
        }

        self.stop_pose();
        self.drag = None;
        self.body = known_joints(&record.joint_positions, &self.body_catalog);
        self.left_hand = known_joints(&record.left_hand_positions, &self.left_hand_catalog);
        self.right_hand = known_joints(&record.right_hand_positions, &self.right_hand_catalog);
        self.symmetry = record.symmetry;
        self.using_real_bones = record.using_real_bones;
        self.active_hand = record.active_hand;
        self.export_format = record.export_format;
        self.steps = record.completed_steps;
        if self.file_name.is_empty() {
            self.file_name = record.file_name.clone();
            self.file_size = record.file_size;
        }

        info!("Restored session for {} ({} joints)", record.file_name, self.body.len());
        self.seed_history();
        self.refresh_projection();
        Ok(())
    }
}

fn known_joints(positions: &JointPositions, catalog: &JointCatalog) -> JointPositions {
    let mut skipped = 0;
    let kept = positions
        .iter()
        .filter(|(id, _)| {
            let known = catalog.contains(id);
            if !known {
                skipped += 1;
            }
            known
        })
        .map(|(id, p)| (id.to_string(), p))
        .collect();
    if skipped > 0 {
        warn!("Skipped {} unknown joints from saved session", skipped);
    }
    kept
}

/// World-space bounds of the scene's local bounding box
fn world_bounds(scene: &dyn SceneSource) -> Option<BoundingBox> {
    let local = scene.bounding_box()?;
    let corners: Vec<Point3<f32>> = (0..8)
        .map(|i| {
            Point3::new(
                if i & 1 == 0 { local.min.x } else { local.max.x },
                if i & 2 == 0 { local.min.y } else { local.max.y },
                if i & 4 == 0 { local.min.z } else { local.max.z },
            )
        })
        .map(|p| scene.local_to_world(p))
        .collect();
    BoundingBox::from_points(&corners)
}
