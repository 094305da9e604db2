//! Rig quality report.
//!
//! The overall score is derived from model richness, how much of the rig the
//! user has placed, and penalties for very sparse or fragmented meshes.
//! Per-region scores vary deterministically around the overall score, keyed
//! by the file name, so the same file always yields the same report.

use crate::scene::MeshStats;
use serde::{Deserialize, Serialize};

const MAX_SCORE: f64 = 99.0;
const DEFAULT_FILE_NAME: &str = "model";

/// Model counters the scorer looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelStats {
    pub vertices: usize,
    pub meshes: usize,
    pub materials: usize,
    pub textures: usize,
    pub animations: usize,
    pub bones: usize,
}

impl ModelStats {
    pub fn from_mesh(stats: &MeshStats, bones: usize) -> Self {
        Self {
            vertices: stats.vertex_count,
            meshes: stats.mesh_count,
            materials: stats.material_count,
            textures: stats.texture_count,
            animations: stats.animation_count,
            bones,
        }
    }
}

/// How far the user got placing joints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigState {
    /// Joints with a stored position
    pub touched_joints: usize,
    /// Joints in the body catalog
    pub catalog_joints: usize,
}

/// Scores in `0..=99`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall: u32,
    pub shoulders: u32,
    pub elbows: u32,
    pub knees: u32,
    pub fingers: u32,
    pub note: String,
}

fn model_base(stats: &ModelStats) -> f64 {
    let mut base = 50.0;
    if stats.bones > 0 {
        base += 20.0;
    }
    if stats.textures > 0 {
        base += 8.0;
    }
    if stats.textures > 3 {
        base += 4.0;
    }
    if stats.vertices > 5000 {
        base += 5.0;
    }
    if stats.vertices > 20_000 {
        base += 5.0;
    }
    if stats.animations > 0 {
        base += 5.0;
    }
    if stats.materials > 0 {
        base += 3.0;
    }
    base
}

fn penalty(stats: &ModelStats) -> f64 {
    let mut penalty = 0.0;
    if stats.vertices < 1000 {
        penalty += 15.0;
    }
    if stats.vertices < 500 {
        penalty += 10.0;
    }
    if stats.meshes > 20 {
        penalty += 5.0;
    }
    penalty
}

fn user_bonus(rig: &RigState) -> f64 {
    if rig.catalog_joints == 0 {
        return 0.0;
    }
    (rig.touched_joints as f64 / rig.catalog_joints as f64).min(1.0) * 7.0
}

/// Deterministic seed from a file name (UTF-16 code units, 32-bit wrapping)
pub fn name_seed(file_name: &str) -> i32 {
    let name = if file_name.is_empty() { DEFAULT_FILE_NAME } else { file_name };
    name.encode_utf16()
        .fold(7i32, |a, c| a.wrapping_mul(31).wrapping_add(i32::from(c)))
}

fn vary(overall: u32, seed: i32, offset: i64) -> u32 {
    let v = (i64::from(seed) + offset * 17).abs() % 11 - 5;
    (i64::from(overall) + v).clamp(0, MAX_SCORE as i64) as u32
}

/// Score a rig
pub fn score(stats: &ModelStats, rig: &RigState, file_name: &str) -> QualityReport {
    if stats.vertices == 0 {
        return QualityReport {
            note: "No model loaded".to_string(),
            ..QualityReport::default()
        };
    }

    let raw = model_base(stats) + user_bonus(rig) - penalty(stats);
    let overall = raw.round().clamp(0.0, MAX_SCORE) as u32;
    let seed = name_seed(file_name);

    QualityReport {
        overall,
        shoulders: vary(overall, seed, 1),
        elbows: vary(overall, seed, 3),
        knees: vary(overall, seed, 7),
        fingers: vary(overall, seed, 11).saturating_sub(5),
        note: if stats.bones > 0 {
            format!("Original skeleton detected ({} bones)", stats.bones)
        } else {
            "Synthetic joints from geometry analysis".to_string()
        },
    }
}
