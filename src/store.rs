//! Editable joint-position store and its snapshots.

use crate::catalog::{JointCatalog, JointDef, JointId};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Live mapping of joint id to model-local position.
///
/// Ordered by id so two stores with the same content compare and serialize
/// identically; a snapshot is simply a clone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointPositions {
    positions: BTreeMap<JointId, Point3<f32>>,
}

/// Immutable copy of a store used by the undo history
pub type Snapshot = JointPositions;

impl JointPositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding every catalog default
    pub fn from_defaults(catalog: &JointCatalog) -> Self {
        Self::from_defs(catalog.iter())
    }

    /// A store holding the defaults of the given definitions
    pub fn from_defs<'a>(defs: impl IntoIterator<Item = &'a JointDef>) -> Self {
        Self {
            positions: defs.into_iter().map(|d| (d.id.clone(), d.default_local)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<Point3<f32>> {
        self.positions.get(id).copied()
    }

    /// Stored position, or the catalog default when the joint was never set
    pub fn resolve(&self, def: &JointDef) -> Point3<f32> {
        self.get(&def.id).unwrap_or(def.default_local)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Overwrite a single joint
    pub fn set(&mut self, id: &str, position: Point3<f32>) {
        self.positions.insert(id.to_string(), position);
    }

    /// Overwrite a joint and, when `symmetric`, its catalog mirror with X negated.
    ///
    /// Returns the mirror id that was written, if any.
    pub fn set_mirrored<'c>(
        &mut self,
        catalog: &'c JointCatalog,
        id: &str,
        position: Point3<f32>,
        symmetric: bool,
    ) -> Option<&'c str> {
        self.set(id, position);
        if !symmetric {
            return None;
        }
        let mirror = catalog.mirror_of(id)?;
        self.set(mirror, mirror_x(position));
        Some(mirror)
    }

    /// Insert `position` only if `id` has no value yet. Returns whether it was inserted.
    pub fn fill(&mut self, id: &str, position: Point3<f32>) -> bool {
        if self.contains(id) {
            return false;
        }
        self.set(id, position);
        true
    }

    /// Copy in every entry of `other` whose id is still unfilled here
    pub fn fill_from(&mut self, other: &JointPositions) -> usize {
        let mut filled = 0;
        for (id, p) in other.iter() {
            if self.fill(id, p) {
                filled += 1;
            }
        }
        filled
    }

    /// Replace the whole content
    pub fn replace(&mut self, snapshot: Snapshot) {
        *self = snapshot;
    }

    pub fn remove(&mut self, id: &str) -> Option<Point3<f32>> {
        self.positions.remove(id)
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Entries in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Point3<f32>)> {
        self.positions.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of entries that belong to `catalog`
    pub fn count_in(&self, catalog: &JointCatalog) -> usize {
        self.positions.keys().filter(|id| catalog.contains(id)).count()
    }

    /// Immutable copy for the history stack
    pub fn snapshot(&self) -> Snapshot {
        self.clone()
    }
}

impl FromIterator<(JointId, Point3<f32>)> for JointPositions {
    fn from_iter<I: IntoIterator<Item = (JointId, Point3<f32>)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

/// Reflect a point across the character's sagittal plane
#[must_use]
pub fn mirror_x(p: Point3<f32>) -> Point3<f32> {
    Point3::new(-p.x, p.y, p.z)
}
