//! Character rigging library: joint estimation, editing and export.
//!
//! This library turns a loaded 3D character into an editable skeleton:
//! - Geometry and skeleton analysis to estimate joint positions
//! - A symmetric joint editor with undo/redo
//! - An orbit camera and a throttled screen-space joint projector
//! - Procedural poses for previewing the rig
//! - Quality scoring, BVH export and JSON rig data export
//! - Session checkpoints that survive restarts
//!
//! The host owns rendering and model loading; it describes the loaded model
//! through [`scene::SceneSource`] and drives time through
//! [`session::RigSession::tick`] and [`session::RigSession::frame_tick`].
//!
//! # Examples
//!
//! ```no_run
//! use rig_forge::{config::Config, scene::StaticScene, session::RigSession};
//! use nalgebra::Point3;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let scene = StaticScene::from_file("hero.scene.json")?;
//!
//! let mut session = RigSession::new(&config);
//! session.load_scene(Box::new(scene), "hero.glb", 0);
//! session.run_analysis(|p| println!("{:>3}% {}", p.percent, p.label))?;
//!
//! session.set_joint("l_elbow", Point3::new(-0.45, 1.3, 0.0))?;
//! session.undo();
//!
//! let bvh = session.export_hierarchy()?;
//! println!("{bvh}");
//! # Ok(())
//! # }
//! ```

/// Model analysis: bounding box, symmetry, bone mapping and joint estimation
pub mod analysis;

/// Orbit camera and screen-space projection
pub mod camera;

/// Joint catalogs for the body and hands
pub mod catalog;

/// Configuration management
pub mod config;

/// Constants used throughout the library
pub mod constants;

/// Error types and result handling
pub mod error;

/// BVH and rig data export
pub mod export;

/// Bounded undo/redo history
pub mod history;

/// Saved editing sessions
pub mod persistence;

/// Procedural poses and motion presets
pub mod poses;

/// Throttled joint projection for the overlay
pub mod projector;

/// Rig quality report
pub mod quality;

/// Host scene abstraction
pub mod scene;

/// Per-file rigging session
pub mod session;

/// Editable joint-position store
pub mod store;

pub use error::{Error, Result};
