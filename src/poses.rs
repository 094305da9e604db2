//! Procedural test poses.
//!
//! Static poses write a full set of body positions once. Animated poses are
//! driven by a [`PoseTask`] that the owner advances with elapsed time; each
//! frame is a pure function of the task's phase.

use crate::catalog::JointCatalog;
use crate::constants::{WALK_PHASE_STEP, WALK_TICK_MS, WAVE_PHASE_STEP, WAVE_TICK_MS};
use crate::store::{mirror_x, JointPositions};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::time::Duration;

/// Available procedural poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoseKind {
    /// Every joint at its catalog default (arms straight out)
    Rest,
    /// Rest with both arms lowered
    RelaxedRest,
    /// Right arm raised, hand waving
    Wave,
    /// Looping walk cycle
    Walk,
}

impl PoseKind {
    /// Parse a pose name; unknown names fall back to [`PoseKind::Rest`]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "rest" | "tpose" | "t-pose" => PoseKind::Rest,
            "relaxed-rest" | "relaxed_rest" | "apose" | "a-pose" => PoseKind::RelaxedRest,
            "wave" => PoseKind::Wave,
            "walk" => PoseKind::Walk,
            _ => PoseKind::Rest,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PoseKind::Rest => "rest",
            PoseKind::RelaxedRest => "relaxed-rest",
            PoseKind::Wave => "wave",
            PoseKind::Walk => "walk",
        }
    }

    pub fn is_animated(self) -> bool {
        matches!(self, PoseKind::Wave | PoseKind::Walk)
    }
}

impl fmt::Display for PoseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowered left-arm chain; the right arm mirrors it
#[rustfmt::skip]
const RELAXED_LEFT_ARM: [(&str, &str, [f32; 3]); 4] = [
    ("l_upper_arm", "r_upper_arm", [-0.38, 1.46, 0.00]),
    ("l_elbow",     "r_elbow",     [-0.52, 1.28, 0.04]),
    ("l_forearm",   "r_forearm",   [-0.60, 1.12, 0.03]),
    ("l_wrist",     "r_wrist",     [-0.68, 0.95, 0.02]),
];

#[rustfmt::skip]
const WAVE_RAISED_ARM: [(&str, [f32; 3]); 3] = [
    ("r_shoulder",  [0.21, 1.65, 0.0]),
    ("r_upper_arm", [0.30, 1.72, 0.0]),
    ("r_elbow",     [0.22, 1.85, 0.0]),
];

/// Every catalog joint at its default position
pub fn rest_pose(catalog: &JointCatalog) -> JointPositions {
    JointPositions::from_defaults(catalog)
}

/// Rest pose with both arm chains lowered
pub fn relaxed_rest_pose(catalog: &JointCatalog) -> JointPositions {
    let mut pose = rest_pose(catalog);
    for (left, right, [x, y, z]) in RELAXED_LEFT_ARM {
        let p = Point3::new(x, y, z);
        pose.set(left, p);
        pose.set(right, mirror_x(p));
    }
    pose
}

/// Rest pose with the right arm raised, before the first wave frame
pub fn wave_start_pose(catalog: &JointCatalog) -> JointPositions {
    let mut pose = rest_pose(catalog);
    for (id, [x, y, z]) in WAVE_RAISED_ARM {
        pose.set(id, Point3::new(x, y, z));
    }
    pose
}

/// Hand positions of the wave at phase `t`
pub fn wave_frame(t: f32) -> [(&'static str, Point3<f32>); 2] {
    let wave_x = 0.20 + t.sin() * 0.08;
    let wave_y = 1.92 + (t * 2.0).cos() * 0.04;
    [
        ("r_forearm", Point3::new(wave_x, 1.90, 0.0)),
        ("r_wrist", Point3::new(wave_x * 1.05, wave_y, 0.0)),
    ]
}

/// Leg, arm and hip positions of the walk cycle at phase `t`
pub fn walk_frame(t: f32) -> [(&'static str, Point3<f32>); 7] {
    let sw = t.sin() * 0.12;
    let sw2 = (t + PI).sin() * 0.12;
    [
        ("l_thigh", Point3::new(-0.14 + sw * 0.3, 0.78 - sw.abs() * 0.05, sw * 0.5)),
        ("r_thigh", Point3::new(0.14 + sw2 * 0.3, 0.78 - sw2.abs() * 0.05, sw2 * 0.5)),
        ("l_knee", Point3::new(-0.15, 0.55 + sw.max(0.0) * 0.15, sw * 0.3)),
        ("r_knee", Point3::new(0.15, 0.55 + sw2.max(0.0) * 0.15, sw2 * 0.3)),
        ("l_upper_arm", Point3::new(-0.38 + sw2 * 0.1, 1.54, sw2 * 0.08)),
        ("r_upper_arm", Point3::new(0.38 + sw * 0.1, 1.54, sw * 0.08)),
        ("hips", Point3::new(sw * 0.015, 1.02 + sw.abs() * 0.02, 0.0)),
    ]
}

/// Starting positions for a pose; animated poses start from their base frame
pub fn initial_pose(kind: PoseKind, catalog: &JointCatalog) -> JointPositions {
    match kind {
        PoseKind::Rest | PoseKind::Walk => rest_pose(catalog),
        PoseKind::RelaxedRest => relaxed_rest_pose(catalog),
        PoseKind::Wave => wave_start_pose(catalog),
    }
}

/// A running animated pose
#[derive(Debug, Clone, PartialEq)]
pub struct PoseTask {
    kind: PoseKind,
    phase: f32,
    phase_step: f32,
    interval: Duration,
    pending: Duration,
    frames: u64,
}

impl PoseTask {
    /// Task for an animated pose; `None` for static poses
    pub fn start(kind: PoseKind) -> Option<Self> {
        let (phase_step, interval_ms) = match kind {
            PoseKind::Wave => (WAVE_PHASE_STEP, WAVE_TICK_MS),
            PoseKind::Walk => (WALK_PHASE_STEP, WALK_TICK_MS),
            PoseKind::Rest | PoseKind::RelaxedRest => return None,
        };
        Some(Self {
            kind,
            phase: 0.0,
            phase_step,
            interval: Duration::from_millis(interval_ms),
            pending: Duration::ZERO,
            frames: 0,
        })
    }

    pub fn kind(&self) -> PoseKind {
        self.kind
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Frames produced so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Produce the next frame immediately
    pub fn step(&mut self, store: &mut JointPositions) {
        self.phase += self.phase_step;
        self.frames += 1;
        match self.kind {
            PoseKind::Wave => wave_frame(self.phase).into_iter().for_each(|(id, p)| store.set(id, p)),
            PoseKind::Walk => walk_frame(self.phase).into_iter().for_each(|(id, p)| store.set(id, p)),
            PoseKind::Rest | PoseKind::RelaxedRest => {}
        }
    }

    /// Advance by elapsed host time, producing one frame per whole interval.
    /// Returns the number of frames produced.
    pub fn advance(&mut self, elapsed: Duration, store: &mut JointPositions) -> u32 {
        self.pending += elapsed;
        let mut produced = 0;
        while self.pending >= self.interval {
            self.pending -= self.interval;
            self.step(store);
            produced += 1;
        }
        produced
    }
}

/// Named motion clips offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionPreset {
    Idle,
    Walk,
    Run,
    Wave,
    Jump,
    Crouch,
    Sit,
    Dance,
    FightIdle,
    Attack,
}

impl MotionPreset {
    pub const ALL: [MotionPreset; 10] = [
        MotionPreset::Idle,
        MotionPreset::Walk,
        MotionPreset::Run,
        MotionPreset::Wave,
        MotionPreset::Jump,
        MotionPreset::Crouch,
        MotionPreset::Sit,
        MotionPreset::Dance,
        MotionPreset::FightIdle,
        MotionPreset::Attack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MotionPreset::Idle => "Idle",
            MotionPreset::Walk => "Walk",
            MotionPreset::Run => "Run",
            MotionPreset::Wave => "Wave",
            MotionPreset::Jump => "Jump",
            MotionPreset::Crouch => "Crouch",
            MotionPreset::Sit => "Sit",
            MotionPreset::Dance => "Dance",
            MotionPreset::FightIdle => "Fight Idle",
            MotionPreset::Attack => "Attack",
        }
    }

    /// Nominal clip length in seconds
    pub fn duration_secs(self) -> u32 {
        match self {
            MotionPreset::Idle | MotionPreset::FightIdle => 4,
            MotionPreset::Walk => 6,
            MotionPreset::Run | MotionPreset::Crouch => 3,
            MotionPreset::Wave => 5,
            MotionPreset::Jump | MotionPreset::Attack => 2,
            MotionPreset::Sit => 8,
            MotionPreset::Dance => 12,
        }
    }

    /// Procedural pose that previews this clip, if there is one
    pub fn procedural_pose(self) -> Option<PoseKind> {
        match self {
            MotionPreset::Wave => Some(PoseKind::Wave),
            MotionPreset::Walk | MotionPreset::Run => Some(PoseKind::Walk),
            MotionPreset::Idle => Some(PoseKind::Rest),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.label().eq_ignore_ascii_case(label.trim()))
    }
}
