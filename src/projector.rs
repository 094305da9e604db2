//! Per-frame projection of tracked joints onto the 2D overlay.
//!
//! Projection runs on the host's frame loop. A pass happens whenever the
//! camera or the tracked points changed since the last pass, and otherwise
//! every `round(60 / projection_fps)` frames.

use crate::camera::{OrbitCamera, ScreenPoint, Viewport};
use crate::catalog::JointId;
use crate::constants::{MARKER_BASE_SIZE, MARKER_SIZE_RANGE, REFERENCE_FPS};
use log::debug;
use nalgebra::Point3;
use std::collections::BTreeMap;

/// Number of frames between unconditional passes for a projection rate
pub fn cadence_for(projection_fps: u32) -> u64 {
    if projection_fps == 0 {
        return u64::from(REFERENCE_FPS);
    }
    let frames = (REFERENCE_FPS as f32 / projection_fps as f32).round() as u64;
    frames.max(1)
}

/// Size and base opacity of joint markers on the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    /// Marker diameter in pixels
    pub size: f32,
    /// Multiplier applied to the depth-faded opacity, in `[0, 1]`
    pub opacity: f32,
}

impl MarkerStyle {
    /// Style from the editor's percentage settings
    pub fn from_percent(joint_size: u32, joint_opacity: u32) -> Self {
        let size = joint_size.min(100) as f32 / 100.0;
        Self {
            size: MARKER_BASE_SIZE + size * MARKER_SIZE_RANGE,
            opacity: joint_opacity.min(100) as f32 / 100.0,
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            size: MARKER_BASE_SIZE + MARKER_SIZE_RANGE / 2.0,
            opacity: 1.0,
        }
    }
}

/// Dirty-gated projector owning the orbit camera
#[derive(Debug, Clone)]
pub struct Projector {
    camera: OrbitCamera,
    viewport: Viewport,
    cadence: u64,
    frame: u64,
    passes: u64,
    style: MarkerStyle,
    tracked: Vec<(JointId, Point3<f32>)>,
    screen: BTreeMap<JointId, ScreenPoint>,
}

impl Projector {
    #[must_use]
    pub fn new(projection_fps: u32) -> Self {
        Self {
            camera: OrbitCamera::new(),
            viewport: Viewport::default(),
            cadence: cadence_for(projection_fps),
            frame: 0,
            passes: 0,
            style: MarkerStyle::default(),
            tracked: Vec::new(),
            screen: BTreeMap::new(),
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Mutable camera access; every camera mutation marks the projector dirty
    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.mark_dirty();
    }

    pub fn cadence(&self) -> u64 {
        self.cadence
    }

    pub fn set_projection_fps(&mut self, projection_fps: u32) {
        self.cadence = cadence_for(projection_fps);
    }

    pub fn marker_style(&self) -> MarkerStyle {
        self.style
    }

    pub fn set_marker_style(&mut self, style: MarkerStyle) {
        self.style = style;
        self.camera.mark_dirty();
    }

    /// Replace the set of tracked world-space points
    pub fn track<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = (JointId, Point3<f32>)>,
    {
        self.tracked = points.into_iter().collect();
        self.camera.mark_dirty();
    }

    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.camera.is_dirty()
    }

    pub fn mark_dirty(&mut self) {
        self.camera.mark_dirty();
    }

    /// Advance one host frame. Returns whether a projection pass ran.
    pub fn frame_tick(&mut self) -> bool {
        self.frame = self.frame.wrapping_add(1);
        let due = self.camera.is_dirty() || self.frame % self.cadence == 0;
        if !due || self.viewport.is_empty() {
            return false;
        }
        self.project_all();
        true
    }

    /// Re-project every tracked point now and clear the dirty flag
    pub fn project_all(&mut self) {
        self.screen.clear();
        for (id, world) in &self.tracked {
            if let Some(mut point) = self.camera.project(world, &self.viewport) {
                point.opacity *= self.style.opacity;
                self.screen.insert(id.clone(), point);
            }
        }
        self.camera.take_dirty();
        self.passes += 1;
        debug!("Projected {}/{} joints", self.screen.len(), self.tracked.len());
    }

    /// Last projected position of a joint; `None` if hidden or never projected
    pub fn screen_point(&self, id: &str) -> Option<&ScreenPoint> {
        self.screen.get(id)
    }

    /// Visible joints in id order
    pub fn screen_points(&self) -> impl Iterator<Item = (&str, &ScreenPoint)> {
        self.screen.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Total projection passes so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Visible joint closest to `(x, y)` within `radius` pixels
    pub fn pick(&self, x: f32, y: f32, radius: f32) -> Option<&str> {
        self.screen
            .iter()
            .map(|(id, p)| (id, (p.x - x).hypot(p.y - y)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.as_str())
    }

    /// Joint whose marker covers `(x, y)`
    pub fn pick_marker(&self, x: f32, y: f32) -> Option<&str> {
        self.pick(x, y, self.style.size / 2.0)
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(REFERENCE_FPS)
    }
}
