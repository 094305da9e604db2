//! Spherical orbit camera and its screen projection.

use crate::constants::{
    CAMERA_DEFAULT_PHI, CAMERA_DEFAULT_RADIUS, CAMERA_DEFAULT_TARGET_Y, CAMERA_FAR, CAMERA_FOV_DEG,
    CAMERA_FRAME_MARGIN, CAMERA_MAX_RADIUS, CAMERA_MIN_RADIUS, CAMERA_NEAR, CAMERA_PAN_FACTOR,
    CAMERA_PHI_EPSILON, CAMERA_POLE_VIEW_PHI, DEPTH_FADE_FACTOR, MIN_MARKER_OPACITY,
};
use crate::scene::BoundingBox;
use crate::{Error, Result};
use nalgebra::{Isometry3, Perspective3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use std::str::FromStr;

/// Size of the overlay surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// A projected point on the overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Pixels from the left edge
    pub x: f32,
    /// Pixels from the top edge
    pub y: f32,
    /// Normalized device depth in `[-1, 1)`
    pub depth: f32,
    /// Marker opacity from depth fade
    pub opacity: f32,
}

/// Canonical camera orientations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedView {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

impl FromStr for NamedView {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "front" => Ok(NamedView::Front),
            "back" => Ok(NamedView::Back),
            "left" => Ok(NamedView::Left),
            "right" => Ok(NamedView::Right),
            "top" => Ok(NamedView::Top),
            "bottom" => Ok(NamedView::Bottom),
            _ => Err(Error::InvalidInput(format!("Unknown view: {s}"))),
        }
    }
}

/// Camera orbiting `target` at spherical coordinates `(theta, phi, radius)`
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    theta: f32,
    phi: f32,
    radius: f32,
    target: Point3<f32>,
    dirty: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            theta: 0.0,
            phi: CAMERA_DEFAULT_PHI,
            radius: CAMERA_DEFAULT_RADIUS,
            target: Point3::new(0.0, CAMERA_DEFAULT_TARGET_Y, 0.0),
            dirty: true,
        }
    }
}

fn clamp_phi(phi: f32) -> f32 {
    phi.clamp(CAMERA_PHI_EPSILON, PI - CAMERA_PHI_EPSILON)
}

fn clamp_radius(radius: f32) -> f32 {
    radius.clamp(CAMERA_MIN_RADIUS, CAMERA_MAX_RADIUS)
}

impl OrbitCamera {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn phi(&self) -> f32 {
        self.phi
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    /// Eye position in world space
    pub fn position(&self) -> Point3<f32> {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.target + self.radius * Vector3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }

    /// Rotate around the target
    pub fn orbit(&mut self, d_theta: f32, d_phi: f32) {
        self.theta += d_theta;
        self.phi = clamp_phi(self.phi + d_phi);
        self.dirty = true;
    }

    /// Scale the orbit radius
    pub fn dolly(&mut self, factor: f32) {
        self.radius = clamp_radius(self.radius * factor);
        self.dirty = true;
    }

    /// Slide the target along the camera's right and world-up axes by screen pixels
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let up = Vector3::y();
        let forward = (self.position() - self.target).normalize();
        let right = forward.cross(&up).normalize();
        let scale = self.radius * CAMERA_PAN_FACTOR;
        self.target += right * (dx * scale) + up * (dy * scale);
        self.dirty = true;
    }

    /// Center on `bbox` from the default angles
    pub fn frame(&mut self, bbox: &BoundingBox) {
        self.target = bbox.center();
        self.radius = clamp_radius(bbox.size().norm() * CAMERA_FRAME_MARGIN);
        self.theta = 0.0;
        self.phi = CAMERA_DEFAULT_PHI;
        self.dirty = true;
    }

    /// Back to the initial state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_named_view(&mut self, view: NamedView) {
        match view {
            NamedView::Front => (self.theta, self.phi) = (0.0, FRAC_PI_2),
            NamedView::Back => (self.theta, self.phi) = (PI, FRAC_PI_2),
            NamedView::Left => (self.theta, self.phi) = (-FRAC_PI_2, FRAC_PI_2),
            NamedView::Right => (self.theta, self.phi) = (FRAC_PI_2, FRAC_PI_2),
            NamedView::Top => self.phi = CAMERA_POLE_VIEW_PHI,
            NamedView::Bottom => self.phi = PI - CAMERA_POLE_VIEW_PHI,
        }
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the overlay for re-projection without moving the camera
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Read and clear the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// World to camera transform
    pub fn view(&self) -> Isometry3<f32> {
        Isometry3::look_at_rh(&self.position(), &self.target, &Vector3::y())
    }

    pub fn perspective(&self, viewport: &Viewport) -> Perspective3<f32> {
        Perspective3::new(viewport.aspect(), CAMERA_FOV_DEG.to_radians(), CAMERA_NEAR, CAMERA_FAR)
    }

    /// Normalized device coordinates of a world point
    pub fn to_ndc(&self, world: &Point3<f32>, viewport: &Viewport) -> Point3<f32> {
        let eye_space = self.view().transform_point(world);
        self.perspective(viewport).project_point(&eye_space)
    }

    /// Project a world point onto the overlay; `None` behind the camera or past the far plane
    pub fn project(&self, world: &Point3<f32>, viewport: &Viewport) -> Option<ScreenPoint> {
        let ndc = self.to_ndc(world, viewport);
        if !ndc.z.is_finite() || ndc.z >= 1.0 {
            return None;
        }
        Some(ScreenPoint {
            x: (ndc.x * 0.5 + 0.5) * viewport.width,
            y: (1.0 - (ndc.y * 0.5 + 0.5)) * viewport.height,
            depth: ndc.z,
            opacity: (1.0 - ndc.z * DEPTH_FADE_FACTOR).max(MIN_MARKER_OPACITY),
        })
    }

    /// World point under overlay pixel `(x, y)` at normalized depth `depth`
    pub fn unproject(&self, x: f32, y: f32, depth: f32, viewport: &Viewport) -> Point3<f32> {
        let ndc = Point3::new(
            x / viewport.width * 2.0 - 1.0,
            1.0 - y / viewport.height * 2.0,
            depth,
        );
        let eye_space = self.perspective(viewport).unproject_point(&ndc);
        self.view().inverse_transform_point(&eye_space)
    }
}
