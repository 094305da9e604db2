//! Constants used throughout the library

/// Maximum number of snapshots kept by the history stack
pub const HISTORY_MAX_SIZE: usize = 30;

/// Polar angle margin keeping the camera off the poles
pub const CAMERA_PHI_EPSILON: f32 = 0.04;

/// Radius limits for the orbit camera
pub const CAMERA_MIN_RADIUS: f32 = 0.1;
pub const CAMERA_MAX_RADIUS: f32 = 60.0;

/// Initial orbit camera state
pub const CAMERA_DEFAULT_PHI: f32 = 1.05;
pub const CAMERA_DEFAULT_RADIUS: f32 = 4.0;
pub const CAMERA_DEFAULT_TARGET_Y: f32 = 1.0;

/// Polar angle used by the top and bottom named views
pub const CAMERA_POLE_VIEW_PHI: f32 = 0.06;

/// Pan distance per pixel, relative to the orbit radius
pub const CAMERA_PAN_FACTOR: f32 = 0.0012;

/// `frame()` places the camera at this multiple of the box diagonal
pub const CAMERA_FRAME_MARGIN: f32 = 1.5;

/// Perspective parameters
pub const CAMERA_FOV_DEG: f32 = 42.0;
pub const CAMERA_NEAR: f32 = 0.005;
pub const CAMERA_FAR: f32 = 500.0;

/// Depth fade for projected joint markers
pub const MIN_MARKER_OPACITY: f32 = 0.35;
pub const DEPTH_FADE_FACTOR: f32 = 0.4;

/// Marker diameter in pixels is `MARKER_BASE_SIZE + joint_size / 100 * MARKER_SIZE_RANGE`
pub const MARKER_BASE_SIZE: f32 = 10.0;
pub const MARKER_SIZE_RANGE: f32 = 16.0;

/// Frame rate the projector cadence is expressed against
pub const REFERENCE_FPS: u32 = 60;

/// Normalized model height in local units
pub const MODEL_NORMALIZED_HEIGHT: f32 = 2.0;

/// Analyzer quality score terms
pub const ANALYSIS_BASE_SCORE: u32 = 60;
pub const ANALYSIS_SKELETON_BONUS: u32 = 20;
pub const ANALYSIS_VERTEX_BONUS: u32 = 10;
pub const ANALYSIS_SYMMETRY_BONUS: u32 = 5;
pub const ANALYSIS_MAX_SCORE: u32 = 95;
pub const ANALYSIS_DENSE_VERTEX_COUNT: usize = 5000;

/// Pose animation tick intervals in milliseconds
pub const WAVE_TICK_MS: u64 = 50;
pub const WALK_TICK_MS: u64 = 33;

/// Phase advance per pose animation tick
pub const WAVE_PHASE_STEP: f32 = 0.12;
pub const WALK_PHASE_STEP: f32 = 0.07;

/// BVH offsets are written in centimeters
pub const BVH_UNITS_PER_METER: f32 = 100.0;
pub const BVH_FRAME_TIME: f32 = 0.033_333;
pub const BVH_END_SITE_LENGTH: f32 = 10.0;

/// Saved sessions expire after this many hours
pub const SESSION_TTL_HOURS: u64 = 24;
