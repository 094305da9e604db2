//! Bounding-box proportion table used when no skeleton is available.
//!
//! Each entry places a joint at a fraction of the model's height above the
//! box floor and a signed fraction of its width away from the box's
//! vertical center line. The defaults are fixed humanoid proportions and can
//! be replaced through the `analysis.proportions` config section.

use crate::catalog::JointCatalog;
use crate::scene::BoundingBox;
use crate::store::JointPositions;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Placement of one joint relative to the bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionEntry {
    pub joint: String,
    /// Fraction of the box height above `min.y`
    pub height: f32,
    /// Signed fraction of the box width from the center line; left is negative
    #[serde(default)]
    pub width: f32,
}

impl ProportionEntry {
    pub fn new(joint: &str, height: f32, width: f32) -> Self {
        Self {
            joint: joint.to_string(),
            height,
            width,
        }
    }

    /// Position of this joint inside `bbox`
    pub fn place(&self, bbox: &BoundingBox) -> Point3<f32> {
        let size = bbox.size();
        let mid_x = (bbox.min.x + bbox.max.x) / 2.0;
        Point3::new(mid_x + self.width * size.x, bbox.min.y + self.height * size.y, 0.0)
    }
}

#[rustfmt::skip]
const DEFAULT_PROPORTIONS: &[(&str, f32, f32)] = &[
    ("hips",       0.51,   0.0),
    ("spine1",     0.60,   0.0),
    ("spine2",     0.685,  0.0),
    ("chest",      0.775,  0.0),
    ("neck",       0.865,  0.0),
    ("head",       0.95,   0.0),
    ("l_shoulder", 0.80,  -0.21),
    ("r_shoulder", 0.80,   0.21),
    ("l_elbow",    0.685, -0.28),
    ("r_elbow",    0.685,  0.28),
    ("l_wrist",    0.51,  -0.365),
    ("r_wrist",    0.51,   0.365),
    ("l_hip",      0.50,  -0.06),
    ("r_hip",      0.50,   0.06),
    ("l_knee",     0.275, -0.075),
    ("r_knee",     0.275,  0.075),
    ("l_ankle",    0.06,  -0.075),
    ("r_ankle",    0.06,   0.075),
];

/// Ordered set of proportion entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProportionTable {
    entries: Vec<ProportionEntry>,
}

impl Default for ProportionTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_PROPORTIONS
                .iter()
                .map(|&(joint, height, width)| ProportionEntry::new(joint, height, width))
                .collect(),
        }
    }
}

impl ProportionTable {
    pub fn new(entries: Vec<ProportionEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ProportionEntry] {
        &self.entries
    }

    pub fn get(&self, joint: &str) -> Option<&ProportionEntry> {
        self.entries.iter().find(|e| e.joint == joint)
    }

    /// Fill every unfilled catalog joint from the box.
    ///
    /// Joints listed in the table use their entry; any other catalog joint is
    /// placed by scaling its default position (authored for a 2-unit tall,
    /// 2-unit wide figure) into the box around its center, so every catalog id ends up with a
    /// value. Returns the number of joints written.
    pub fn fill(&self, catalog: &JointCatalog, bbox: &BoundingBox, store: &mut JointPositions) -> usize {
        let size = bbox.size();
        let center = bbox.center();
        let mut filled = 0;

        for entry in &self.entries {
            if catalog.contains(&entry.joint) && store.fill(&entry.joint, entry.place(bbox)) {
                filled += 1;
            }
        }

        for def in catalog.iter() {
            let d = def.default_local;
            let scaled = Point3::new(
                center.x + d.x / 2.0 * size.x,
                bbox.min.y + d.y / 2.0 * size.y,
                center.z + d.z / 2.0 * size.z,
            );
            if store.fill(&def.id, scaled) {
                filled += 1;
            }
        }

        filled
    }

    /// Check that every fraction is finite and heights lie within `[0, 1]`
    pub fn is_valid(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.height.is_finite() && e.width.is_finite() && (0.0..=1.0).contains(&e.height))
    }
}
