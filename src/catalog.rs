//! Joint hierarchy catalog.
//!
//! The catalog is the skeleton template every rig is edited against: a body
//! tree rooted at `hips` plus a generated hand tree per side. Coordinates are
//! model-local in a normalized space where the character is about two units
//! tall, feet rest on `y = 0`, the character's left is `-X` and forward is
//! `+Z`.

use crate::{Error, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Identifier of a catalog joint (`"hips"`, `"l_elbow"`, `"r_index_pip"`, ...)
pub type JointId = String;

/// Visual/semantic class of a joint marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    /// Main articulation (yellow marker)
    Primary,
    /// In-between helper joint (cyan marker)
    Secondary,
    /// Spine chain (green marker)
    Spine,
}

/// Body region a joint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointGroup {
    Spine,
    ArmLeft,
    ArmRight,
    LegLeft,
    LegRight,
    HandLeft,
    HandRight,
}

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    /// Id prefix used by joints on this side
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Left => "l_",
            Side::Right => "r_",
        }
    }

    /// The other side
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

/// Static definition of one skeleton-template node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointDef {
    pub id: JointId,
    pub label: String,
    pub group: JointGroup,
    pub kind: JointKind,
    pub parent: Option<JointId>,
    pub mirror: Option<JointId>,
    pub default_local: Point3<f32>,
}

impl JointDef {
    /// Create a parentless, unmirrored joint at `default_local`
    pub fn new(id: &str, label: &str, group: JointGroup, kind: JointKind, default_local: Point3<f32>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            group,
            kind,
            parent: None,
            mirror: None,
            default_local,
        }
    }

    /// Set the parent joint
    #[must_use]
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// Set the mirror joint
    #[must_use]
    pub fn with_mirror(mut self, mirror: &str) -> Self {
        self.mirror = Some(mirror.to_string());
        self
    }
}

type BodyRow = (&'static str, &'static str, JointKind, JointGroup, [f32; 3], Option<&'static str>, Option<&'static str>);

use JointGroup::{ArmLeft, ArmRight, LegLeft, LegRight};
use JointKind::{Primary, Secondary};

#[rustfmt::skip]
const BODY_JOINTS: &[BodyRow] = &[
    ("hips",        "Hips",        Primary,         JointGroup::Spine, [ 0.00, 1.02, 0.00], None,                None),
    ("spine1",      "Spine 1",     JointKind::Spine, JointGroup::Spine, [ 0.00, 1.20, 0.00], Some("hips"),       None),
    ("spine2",      "Spine 2",     JointKind::Spine, JointGroup::Spine, [ 0.00, 1.37, 0.00], Some("spine1"),     None),
    ("chest",       "Chest",       JointKind::Spine, JointGroup::Spine, [ 0.00, 1.55, 0.00], Some("spine2"),     None),
    ("neck",        "Neck",        JointKind::Spine, JointGroup::Spine, [ 0.00, 1.73, 0.00], Some("chest"),      None),
    ("head",        "Head",        Primary,         JointGroup::Spine, [ 0.00, 1.90, 0.00], Some("neck"),        None),

    ("l_shoulder",  "L Shoulder",  Primary,   ArmLeft,  [-0.21, 1.60, 0.00], Some("chest"),       Some("r_shoulder")),
    ("l_upper_arm", "L Upper Arm", Secondary, ArmLeft,  [-0.38, 1.54, 0.00], Some("l_shoulder"),  Some("r_upper_arm")),
    ("l_elbow",     "L Elbow",     Primary,   ArmLeft,  [-0.56, 1.37, 0.00], Some("l_upper_arm"), Some("r_elbow")),
    ("l_forearm",   "L Forearm",   Secondary, ArmLeft,  [-0.64, 1.20, 0.00], Some("l_elbow"),     Some("r_forearm")),
    ("l_wrist",     "L Wrist",     Primary,   ArmLeft,  [-0.73, 1.02, 0.00], Some("l_forearm"),   Some("r_wrist")),

    ("r_shoulder",  "R Shoulder",  Primary,   ArmRight, [ 0.21, 1.60, 0.00], Some("chest"),       Some("l_shoulder")),
    ("r_upper_arm", "R Upper Arm", Secondary, ArmRight, [ 0.38, 1.54, 0.00], Some("r_shoulder"),  Some("l_upper_arm")),
    ("r_elbow",     "R Elbow",     Primary,   ArmRight, [ 0.56, 1.37, 0.00], Some("r_upper_arm"), Some("l_elbow")),
    ("r_forearm",   "R Forearm",   Secondary, ArmRight, [ 0.64, 1.20, 0.00], Some("r_elbow"),     Some("l_forearm")),
    ("r_wrist",     "R Wrist",     Primary,   ArmRight, [ 0.73, 1.02, 0.00], Some("r_forearm"),   Some("l_wrist")),

    ("l_hip",       "L Hip",       Primary,   LegLeft,  [-0.12, 1.00, 0.00], Some("hips"),        Some("r_hip")),
    ("l_thigh",     "L Thigh",     Secondary, LegLeft,  [-0.14, 0.78, 0.00], Some("l_hip"),       Some("r_thigh")),
    ("l_knee",      "L Knee",      Primary,   LegLeft,  [-0.15, 0.55, 0.00], Some("l_thigh"),     Some("r_knee")),
    ("l_shin",      "L Shin",      Secondary, LegLeft,  [-0.15, 0.35, 0.00], Some("l_knee"),      Some("r_shin")),
    ("l_ankle",     "L Ankle",     Primary,   LegLeft,  [-0.15, 0.12, 0.00], Some("l_shin"),      Some("r_ankle")),
    ("l_foot",      "L Foot",      Secondary, LegLeft,  [-0.14, 0.05, 0.07], Some("l_ankle"),     Some("r_foot")),
    ("l_toe",       "L Toe",       Secondary, LegLeft,  [-0.13, 0.02, 0.14], Some("l_foot"),      Some("r_toe")),

    ("r_hip",       "R Hip",       Primary,   LegRight, [ 0.12, 1.00, 0.00], Some("hips"),        Some("l_hip")),
    ("r_thigh",     "R Thigh",     Secondary, LegRight, [ 0.14, 0.78, 0.00], Some("r_hip"),       Some("l_thigh")),
    ("r_knee",      "R Knee",      Primary,   LegRight, [ 0.15, 0.55, 0.00], Some("r_thigh"),     Some("l_knee")),
    ("r_shin",      "R Shin",      Secondary, LegRight, [ 0.15, 0.35, 0.00], Some("r_knee"),      Some("l_shin")),
    ("r_ankle",     "R Ankle",     Primary,   LegRight, [ 0.15, 0.12, 0.00], Some("r_shin"),      Some("l_ankle")),
    ("r_foot",      "R Foot",      Secondary, LegRight, [ 0.14, 0.05, 0.07], Some("r_ankle"),     Some("l_foot")),
    ("r_toe",       "R Toe",       Secondary, LegRight, [ 0.13, 0.02, 0.14], Some("r_foot"),      Some("l_toe")),
];

/// Finger name, knuckle X offset from the body center, and per-joint (dy, z) offsets
#[rustfmt::skip]
const FINGERS: &[(&str, f32, [[f32; 2]; 3])] = &[
    ("thumb",  0.77, [[ 0.04, 0.05], [ 0.04, 0.09], [ 0.03, 0.12]]),
    ("index",  0.84, [[-0.03, 0.06], [-0.03, 0.10], [-0.02, 0.13]]),
    ("middle", 0.86, [[-0.01, 0.06], [-0.01, 0.11], [-0.01, 0.14]]),
    ("ring",   0.84, [[ 0.01, 0.06], [ 0.01, 0.10], [ 0.01, 0.13]]),
    ("pinky",  0.80, [[ 0.03, 0.05], [ 0.03, 0.08], [ 0.03, 0.11]]),
];

const FINGER_SEGMENTS: [&str; 3] = ["mcp", "pip", "dip"];

const WRIST_X: f32 = 0.73;
const WRIST_Y: f32 = 1.02;
const PALM_Z: f32 = 0.02;

/// Generate the 16 hand joints (palm + 5 fingers x 3) for one side.
///
/// The palm hangs off the same-side wrist so that every hand chain stays
/// inside its own hand.
pub fn hand_joint_defs(side: Side) -> Vec<JointDef> {
    let s = side.sign();
    let prefix = side.prefix();
    let mirror_prefix = side.opposite().prefix();
    let group = match side {
        Side::Left => JointGroup::HandLeft,
        Side::Right => JointGroup::HandRight,
    };

    let palm_id = format!("{prefix}palm");
    let mut joints = vec![JointDef::new(
        &palm_id,
        &format!("{} Palm", side.label()),
        group,
        Primary,
        Point3::new(s * WRIST_X, WRIST_Y, PALM_Z),
    )
    .with_parent(&format!("{prefix}wrist"))
    .with_mirror(&format!("{mirror_prefix}palm"))];

    for &(finger, knuckle_x, offsets) in FINGERS {
        for (i, [dy, z]) in offsets.iter().enumerate() {
            let segment = FINGER_SEGMENTS[i];
            let id = format!("{prefix}{finger}_{segment}");
            let parent = if i == 0 {
                palm_id.clone()
            } else {
                format!("{prefix}{finger}_{}", FINGER_SEGMENTS[i - 1])
            };
            let mut name = finger.to_string();
            name[..1].make_ascii_uppercase();
            let label = format!("{} {} {}", side.label(), name, segment.to_uppercase());
            joints.push(
                JointDef::new(&id, &label, group, Secondary, Point3::new(s * knuckle_x, WRIST_Y + dy, *z))
                    .with_parent(&parent)
                    .with_mirror(&format!("{mirror_prefix}{finger}_{segment}")),
            );
        }
    }

    joints
}

fn body_joint_defs() -> Vec<JointDef> {
    BODY_JOINTS
        .iter()
        .map(|&(id, label, kind, group, [x, y, z], parent, mirror)| JointDef {
            id: id.to_string(),
            label: label.to_string(),
            group,
            kind,
            parent: parent.map(str::to_string),
            mirror: mirror.map(str::to_string),
            default_local: Point3::new(x, y, z),
        })
        .collect()
}

/// Ordered collection of joint definitions with id lookup
#[derive(Debug, Clone)]
pub struct JointCatalog {
    joints: Vec<JointDef>,
    index: HashMap<JointId, usize>,
}

impl JointCatalog {
    /// Build a catalog from definitions in declaration order.
    ///
    /// No structural checks are made here; call [`JointCatalog::validate`]
    /// or rely on operations such as [`JointCatalog::root`] reporting
    /// problems as they meet them.
    pub fn from_defs(joints: Vec<JointDef>) -> Self {
        let index = joints.iter().enumerate().map(|(i, j)| (j.id.clone(), i)).collect();
        Self { joints, index }
    }

    /// The 29-joint body skeleton
    #[must_use]
    pub fn body() -> Self {
        Self::from_defs(body_joint_defs())
    }

    /// Body skeleton plus both hands (61 joints)
    #[must_use]
    pub fn humanoid() -> Self {
        let mut joints = body_joint_defs();
        joints.extend(hand_joint_defs(Side::Left));
        joints.extend(hand_joint_defs(Side::Right));
        Self::from_defs(joints)
    }

    /// Number of joints
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// True when the catalog has no joints
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Joints in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &JointDef> {
        self.joints.iter()
    }

    /// Look up a joint by id
    pub fn get(&self, id: &str) -> Option<&JointDef> {
        self.index.get(id).map(|&i| &self.joints[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Mirror id of `id`, if any
    pub fn mirror_of(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|j| j.mirror.as_deref())
    }

    /// Direct children of `id` in declaration order
    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a JointDef> + 'a {
        self.joints.iter().filter(move |j| j.parent.as_deref() == Some(id))
    }

    /// True when nothing is parented to `id`
    pub fn is_leaf(&self, id: &str) -> bool {
        self.children(id).next().is_none()
    }

    /// The unique parentless joint
    ///
    /// # Errors
    ///
    /// Returns `MalformedCatalog` when there are zero or several roots.
    pub fn root(&self) -> Result<&JointDef> {
        let mut roots = self.joints.iter().filter(|j| j.parent.is_none());
        match (roots.next(), roots.next()) {
            (Some(root), None) => Ok(root),
            (None, _) => Err(Error::MalformedCatalog("no root joint".to_string())),
            (Some(a), Some(b)) => Err(Error::MalformedCatalog(format!(
                "multiple root joints: {} and {}",
                a.id, b.id
            ))),
        }
    }

    /// Check the structural invariants: unique ids, a single root, every
    /// joint reachable from it, and symmetric mirror links.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCatalog` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.index.len() != self.joints.len() {
            return Err(Error::MalformedCatalog("duplicate joint ids".to_string()));
        }

        let root = self.root()?;

        for joint in &self.joints {
            if let Some(parent) = &joint.parent {
                if !self.contains(parent) {
                    return Err(Error::MalformedCatalog(format!(
                        "{} has unknown parent {parent}",
                        joint.id
                    )));
                }
            }
            if let Some(mirror) = &joint.mirror {
                if self.mirror_of(mirror) != Some(joint.id.as_str()) {
                    return Err(Error::MalformedCatalog(format!(
                        "mirror link {} -> {mirror} is not symmetric",
                        joint.id
                    )));
                }
            }
        }

        // Breadth-first walk from the root; anything on a cycle is never reached
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([root.id.as_str()]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            queue.extend(self.children(id).map(|c| c.id.as_str()));
        }
        if seen.len() != self.joints.len() {
            let orphan = self
                .joints
                .iter()
                .find(|j| !seen.contains(j.id.as_str()))
                .map_or_else(String::new, |j| j.id.clone());
            return Err(Error::MalformedCatalog(format!("{orphan} is not reachable from the root")));
        }

        Ok(())
    }
}

impl Default for JointCatalog {
    fn default() -> Self {
        Self::humanoid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_catalog_is_valid() {
        let catalog = JointCatalog::body();
        assert_eq!(catalog.len(), 29);
        catalog.validate().unwrap();
        assert_eq!(catalog.root().unwrap().id, "hips");
    }

    #[test]
    fn test_humanoid_catalog_is_valid() {
        let catalog = JointCatalog::humanoid();
        assert_eq!(catalog.len(), 29 + 16 + 16);
        catalog.validate().unwrap();
    }

    #[test]
    fn test_hand_chains_stay_on_one_side() {
        let catalog = JointCatalog::humanoid();
        for side in [Side::Left, Side::Right] {
            for joint in hand_joint_defs(side) {
                let parent = joint.parent.unwrap();
                assert!(parent.starts_with(side.prefix()), "{} -> {parent}", joint.id);
                assert!(catalog.contains(&parent));
            }
        }
    }

    #[test]
    fn test_hand_labels() {
        let left = hand_joint_defs(Side::Left);
        assert_eq!(left[0].label, "L Palm");
        assert_eq!(left[1].id, "l_thumb_mcp");
        assert_eq!(left[1].label, "L Thumb MCP");
        assert_eq!(left[1].parent.as_deref(), Some("l_palm"));
        assert_eq!(left[2].parent.as_deref(), Some("l_thumb_mcp"));
    }

    #[test]
    fn test_mirror_defaults_are_reflected() {
        let catalog = JointCatalog::humanoid();
        for joint in catalog.iter() {
            if let Some(mirror) = catalog.mirror_of(&joint.id) {
                let other = catalog.get(mirror).unwrap();
                assert!((joint.default_local.x + other.default_local.x).abs() < 1e-6);
                assert!((joint.default_local.y - other.default_local.y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_validate_rejects_two_roots() {
        let catalog = JointCatalog::from_defs(vec![
            JointDef::new("a", "A", JointGroup::Spine, Primary, Point3::origin()),
            JointDef::new("b", "B", JointGroup::Spine, Primary, Point3::origin()),
        ]);
        assert!(matches!(catalog.validate(), Err(Error::MalformedCatalog(_))));
    }

    #[test]
    fn test_validate_rejects_cycle() {
        let catalog = JointCatalog::from_defs(vec![
            JointDef::new("root", "Root", JointGroup::Spine, Primary, Point3::origin()),
            JointDef::new("a", "A", JointGroup::Spine, Primary, Point3::origin()).with_parent("b"),
            JointDef::new("b", "B", JointGroup::Spine, Primary, Point3::origin()).with_parent("a"),
        ]);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_one_way_mirror() {
        let catalog = JointCatalog::from_defs(vec![
            JointDef::new("root", "Root", JointGroup::Spine, Primary, Point3::origin()),
            JointDef::new("a", "A", JointGroup::ArmLeft, Primary, Point3::origin())
                .with_parent("root")
                .with_mirror("b"),
            JointDef::new("b", "B", JointGroup::ArmRight, Primary, Point3::origin()).with_parent("root"),
        ]);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_children_in_declaration_order() {
        let catalog = JointCatalog::body();
        let children: Vec<_> = catalog.children("chest").map(|j| j.id.as_str()).collect();
        assert_eq!(children, vec!["neck", "l_shoulder", "r_shoulder"]);
        assert!(catalog.is_leaf("head"));
        assert!(!catalog.is_leaf("hips"));
    }
}
