//! Configuration management for the rigging tool

use crate::analysis::ProportionTable;
use crate::constants::SESSION_TTL_HOURS;
use crate::export::{ExportFormat, ExportOptions};
use crate::projector::MarkerStyle;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Device performance class, used to pick frame-rate sensitive defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Low,
    Mid,
    #[default]
    High,
}

impl PerformanceTier {
    /// Default joint projection rate
    pub fn projection_fps(self) -> u32 {
        match self {
            PerformanceTier::Low => 30,
            PerformanceTier::Mid | PerformanceTier::High => 60,
        }
    }

    /// Default pause between analysis stages in milliseconds
    pub fn analysis_delay_ms(self) -> u64 {
        match self {
            PerformanceTier::Low => 60,
            PerformanceTier::Mid | PerformanceTier::High => 35,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overlay projection settings
    pub projection: ProjectionConfig,

    /// Joint editor settings
    pub editor: EditorConfig,

    /// Analyzer settings
    pub analysis: AnalysisConfig,

    /// Export settings
    pub export: ExportConfig,

    /// Session persistence settings
    pub session: SessionConfig,
}

/// Overlay projection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Device performance tier
    pub tier: PerformanceTier,

    /// Joint projection rate; the tier default when unset
    pub projection_fps: Option<u32>,
}

/// Joint editor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Mirror edits across the body by default
    pub default_symmetry: bool,

    /// Joint marker size (0-100)
    pub joint_size: u32,

    /// Joint marker opacity (0-100)
    pub joint_opacity: u32,
}

/// Analyzer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Run analysis as soon as a model is loaded
    pub auto_analyze: bool,

    /// Pause between stages in milliseconds; the tier default when unset
    pub stage_delay_ms: Option<u64>,

    /// Bounding-box proportion table
    pub proportions: ProportionTable,
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Preselected export format
    pub default_format: ExportFormat,

    /// Ask the converting tool to embed textures
    pub embed_textures: bool,

    /// Ask the converting tool to keep model animations
    pub include_animations: bool,
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Hours before a saved session expires
    pub ttl_hours: u64,

    /// Where the session record is written
    pub state_path: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_symmetry: true,
            joint_size: 50,
            joint_opacity: 80,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            auto_analyze: true,
            stage_delay_ms: None,
            proportions: ProportionTable::default(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: ExportFormat::Bvh,
            embed_textures: true,
            include_animations: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: SESSION_TTL_HOURS,
            state_path: PathBuf::from("rig_session.json"),
        }
    }
}

impl ProjectionConfig {
    /// Effective projection rate
    pub fn fps(&self) -> u32 {
        self.projection_fps.unwrap_or_else(|| self.tier.projection_fps())
    }
}

impl EditorConfig {
    pub fn marker_style(&self) -> MarkerStyle {
        MarkerStyle::from_percent(self.joint_size, self.joint_opacity)
    }
}

impl ExportConfig {
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            embed_textures: self.embed_textures,
            include_animations: self.include_animations,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Effective pause between analysis stages
    pub fn analysis_delay(&self) -> Duration {
        Duration::from_millis(
            self.analysis
                .stage_delay_ms
                .unwrap_or_else(|| self.projection.tier.analysis_delay_ms()),
        )
    }

    /// Session time-to-live
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_hours.saturating_mul(3600))
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.projection.fps() == 0 {
            return Err(Error::ConfigError("Projection FPS must be greater than 0".to_string()));
        }

        if self.editor.joint_size > 100 {
            return Err(Error::ConfigError("Joint size must be between 0 and 100".to_string()));
        }
        if self.editor.joint_opacity > 100 {
            return Err(Error::ConfigError(
                "Joint opacity must be between 0 and 100".to_string(),
            ));
        }

        if self.analysis.proportions.entries().is_empty() {
            return Err(Error::ConfigError("Proportion table must not be empty".to_string()));
        }
        if !self.analysis.proportions.is_valid() {
            return Err(Error::ConfigError(
                "Proportion heights must be finite and between 0.0 and 1.0".to_string(),
            ));
        }

        if self.export.default_format.is_mesh_container() {
            return Err(Error::ConfigError(format!(
                "Default export format must be bvh, fbx or usd, not {}",
                self.export.default_format
            )));
        }

        if self.session.ttl_hours == 0 {
            return Err(Error::ConfigError("Session TTL must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Rig Forge Configuration

# Joint overlay projection
projection:
  tier: high            # low | mid | high
  # projection_fps: 60  # defaults to 30 on low, 60 otherwise

# Joint editor
editor:
  default_symmetry: true
  joint_size: 50
  joint_opacity: 80

# Analyzer
analysis:
  auto_analyze: true
  # stage_delay_ms: 35  # defaults to 60 on low, 35 otherwise
  proportions:
    - { joint: hips,       height: 0.51 }
    - { joint: spine1,     height: 0.60 }
    - { joint: spine2,     height: 0.685 }
    - { joint: chest,      height: 0.775 }
    - { joint: neck,       height: 0.865 }
    - { joint: head,       height: 0.95 }
    - { joint: l_shoulder, height: 0.80,  width: -0.21 }
    - { joint: r_shoulder, height: 0.80,  width: 0.21 }
    - { joint: l_elbow,    height: 0.685, width: -0.28 }
    - { joint: r_elbow,    height: 0.685, width: 0.28 }
    - { joint: l_wrist,    height: 0.51,  width: -0.365 }
    - { joint: r_wrist,    height: 0.51,  width: 0.365 }
    - { joint: l_hip,      height: 0.50,  width: -0.06 }
    - { joint: r_hip,      height: 0.50,  width: 0.06 }
    - { joint: l_knee,     height: 0.275, width: -0.075 }
    - { joint: r_knee,     height: 0.275, width: 0.075 }
    - { joint: l_ankle,    height: 0.06,  width: -0.075 }
    - { joint: r_ankle,    height: 0.06,  width: 0.075 }

# Export
export:
  default_format: bvh   # bvh | fbx | usd
  embed_textures: true
  include_animations: true

# Session persistence
session:
  ttl_hours: 24
  state_path: "rig_session.json"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.projection.fps(), 60);
        assert_eq!(config.analysis_delay(), Duration::from_millis(35));
        assert_eq!(config.session_ttl(), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.analysis.proportions, ProportionTable::default());
        assert_eq!(config.export.default_format, ExportFormat::Bvh);
        assert_eq!(config.session.state_path, PathBuf::from("rig_session.json"));
    }

    #[test]
    fn test_low_tier_defaults() {
        let config: Config = serde_yaml::from_str("projection:\n  tier: low\n").unwrap();
        assert_eq!(config.projection.fps(), 30);
        assert_eq!(config.analysis_delay(), Duration::from_millis(60));
        assert!(config.editor.default_symmetry);
    }

    #[test]
    fn test_explicit_fps_overrides_tier() {
        let config: Config = serde_yaml::from_str("projection:\n  tier: low\n  projection_fps: 45\n").unwrap();
        assert_eq!(config.projection.fps(), 45);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.projection.projection_fps = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.editor.joint_opacity = 150;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.proportions = ProportionTable::new(Vec::new());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.export.default_format = ExportFormat::Glb;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_editor_and_export_settings() {
        let yaml = "editor:\n  joint_size: 100\n  joint_opacity: 40\nexport:\n  embed_textures: false\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let style = config.editor.marker_style();
        assert_eq!(style.size, 26.0);
        assert!((style.opacity - 0.4).abs() < 1e-6);
        let options = config.export.options();
        assert!(!options.embed_textures);
        assert!(options.include_animations);
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("rig_forge_config_{}.yaml", std::process::id()));
        let mut config = Config::default();
        config.editor.joint_size = 70;
        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.editor.joint_size, 70);
        std::fs::remove_file(&path).unwrap();
    }
}
