//! Scene queries the rig engine needs from the host that loaded the mesh.

use crate::constants::MODEL_NORMALIZED_HEIGHT;
use crate::{Error, Result};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Degenerate box at the origin, used when there is no geometry
    pub fn zero() -> Self {
        Self::new(Point3::origin(), Point3::origin())
    }

    /// Smallest box containing all points; `None` for an empty input
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |b, p| Self {
            min: b.min.inf(p),
            max: b.max.sup(p),
        }))
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn is_empty(&self) -> bool {
        self.size().iter().all(|&s| s <= 0.0)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

/// A node of the mesh's embedded skeleton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    pub world_position: Point3<f32>,
}

impl Bone {
    pub fn new(name: &str, world_position: Point3<f32>) -> Self {
        Self {
            name: name.to_string(),
            world_position,
        }
    }
}

/// Geometry counters for the loaded model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshStats {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub mesh_count: usize,
    pub material_count: usize,
    pub texture_count: usize,
    pub animation_count: usize,
}

/// Host-provided view of a loaded scene
pub trait SceneSource {
    /// Bounds of all meshes in model-local space, `None` without geometry
    fn bounding_box(&self) -> Option<BoundingBox>;

    /// Embedded skeleton bones, empty when the model has none
    fn bones(&self) -> &[Bone];

    fn mesh_stats(&self) -> MeshStats;

    /// Convert a world-space point into the model's local space
    fn world_to_local(&self, point: Point3<f32>) -> Point3<f32>;

    /// Convert a model-local point into world space
    fn local_to_world(&self, point: Point3<f32>) -> Point3<f32>;

    fn has_skeleton(&self) -> bool {
        !self.bones().is_empty()
    }
}

/// Uniform scale + translation that brings a raw model into rig space:
/// largest extent 2 units, centered on X and Z, feet on `y = 0`.
pub fn normalization_transform(raw: &BoundingBox) -> Matrix4<f32> {
    let size = raw.size();
    let extent = size.x.max(size.y).max(size.z);
    let scale = if extent > 0.0 { MODEL_NORMALIZED_HEIGHT / extent } else { 1.0 };
    let center = raw.center();
    let offset = Vector3::new(-center.x * scale, -raw.min.y * scale, -center.z * scale);
    Matrix4::new_translation(&offset) * Matrix4::new_scaling(scale)
}

/// Scene description that can be loaded from JSON, for tools and tests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticScene {
    /// Model-local bounds; absent when the file has no mesh
    pub bounding_box: Option<BoundingBox>,
    pub bones: Vec<Bone>,
    pub stats: MeshStats,
    /// Model matrix (local → world), column-major
    pub model_matrix: Matrix4<f32>,
}

impl Default for StaticScene {
    fn default() -> Self {
        Self {
            bounding_box: None,
            bones: Vec::new(),
            stats: MeshStats::default(),
            model_matrix: Matrix4::identity(),
        }
    }
}

impl StaticScene {
    /// A mesh-only scene with the given bounds
    pub fn with_bounds(bounding_box: BoundingBox, stats: MeshStats) -> Self {
        Self {
            bounding_box: Some(bounding_box),
            stats,
            ..Self::default()
        }
    }

    /// Replace the model matrix with the normalizing transform of the bounds
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if let Some(bbox) = &self.bounding_box {
            self.model_matrix = normalization_transform(bbox);
        }
        self
    }

    #[must_use]
    pub fn with_bones(mut self, bones: Vec<Bone>) -> Self {
        self.bones = bones;
        self
    }

    /// Load a scene description from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let scene: Self = serde_json::from_str(&content)?;
        if scene.model_matrix.try_inverse().is_none() {
            return Err(Error::InvalidInput(format!(
                "model matrix in {} is not invertible",
                path.as_ref().display()
            )));
        }
        Ok(scene)
    }
}

impl SceneSource for StaticScene {
    fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    fn bones(&self) -> &[Bone] {
        &self.bones
    }

    fn mesh_stats(&self) -> MeshStats {
        self.stats
    }

    fn world_to_local(&self, point: Point3<f32>) -> Point3<f32> {
        match self.model_matrix.try_inverse() {
            Some(inv) => inv.transform_point(&point),
            None => point,
        }
    }

    fn local_to_world(&self, point: Point3<f32>) -> Point3<f32> {
        self.model_matrix.transform_point(&point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_from_points() {
        let points = [Point3::new(1.0, -2.0, 0.0), Point3::new(-1.0, 3.0, 2.0)];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bbox.max, Point3::new(1.0, 3.0, 2.0));
        assert_eq!(bbox.center(), Point3::new(0.0, 0.5, 1.0));
        assert!(BoundingBox::from_points(&[] as &[Point3<f32>]).is_none());
    }

    #[test]
    fn test_normalization_puts_feet_on_ground() {
        let raw = BoundingBox::new(Point3::new(10.0, 5.0, -2.0), Point3::new(14.0, 25.0, 2.0));
        let m = normalization_transform(&raw);
        let feet = m.transform_point(&Point3::new(12.0, 5.0, 0.0));
        let top = m.transform_point(&Point3::new(12.0, 25.0, 0.0));
        assert!(feet.coords.norm() < 1e-5);
        assert!((top.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_world_to_local_inverts_model_matrix() {
        let scene = StaticScene {
            model_matrix: Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0)) * Matrix4::new_scaling(2.0),
            ..StaticScene::default()
        };
        let local = Point3::new(0.5, 1.0, -0.25);
        let world = scene.local_to_world(local);
        assert_eq!(world, Point3::new(2.0, 2.0, -0.5));
        let back = scene.world_to_local(world);
        assert!((back - local).norm() < 1e-6);
    }

    #[test]
    fn test_scene_defaults_tolerate_missing_fields() {
        let scene: StaticScene = serde_json::from_str("{}").unwrap();
        assert!(scene.bounding_box.is_none());
        assert!(!scene.has_skeleton());
        assert_eq!(scene.model_matrix, Matrix4::identity());
    }
}
