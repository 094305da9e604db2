//! Rig export: BVH motion hierarchy and JSON rig data.

use crate::analysis::AnalysisResult;
use crate::catalog::{JointCatalog, JointDef};
use crate::constants::{BVH_END_SITE_LENGTH, BVH_FRAME_TIME, BVH_UNITS_PER_METER};
use crate::quality::{ModelStats, QualityReport};
use crate::store::JointPositions;
use crate::{Error, Result};
use log::info;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const ROOT_CHANNELS: &str = "CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation";
const LEAF_CHANNELS: &str = "CHANNELS 3 Zrotation Xrotation Yrotation";
const INDENT: &str = "  ";

/// Export target formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Glb,
    Gltf,
    #[default]
    Bvh,
    Fbx,
    Usd,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Glb => "glb",
            ExportFormat::Gltf => "gltf",
            ExportFormat::Bvh => "bvh",
            ExportFormat::Fbx => "fbx",
            ExportFormat::Usd => "usd",
        }
    }

    /// Formats that need an external tool; the rig is shipped as JSON data
    pub fn needs_conversion(self) -> bool {
        matches!(self, ExportFormat::Fbx | ExportFormat::Usd)
    }

    /// glTF containers carry the mesh, which is never written here
    pub fn is_mesh_container(self) -> bool {
        matches!(self, ExportFormat::Glb | ExportFormat::Gltf)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "glb" => Ok(ExportFormat::Glb),
            "gltf" => Ok(ExportFormat::Gltf),
            "bvh" => Ok(ExportFormat::Bvh),
            "fbx" => Ok(ExportFormat::Fbx),
            "usd" => Ok(ExportFormat::Usd),
            _ => Err(Error::InvalidInput(format!("Unknown export format: {s}"))),
        }
    }
}

/// File name without its last extension; `character` when empty
pub fn file_stem(file_name: &str) -> &str {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };
    if stem.is_empty() {
        "character"
    } else {
        stem
    }
}

/// `<stem>_rigged.<ext>`
pub fn export_file_name(file_name: &str, format: ExportFormat) -> String {
    format!("{}_rigged.{}", file_stem(file_name), format.extension())
}

/// `<stem>_rig_data_for_<ext>.json`
pub fn rig_data_file_name(file_name: &str, format: ExportFormat) -> String {
    format!("{}_rig_data_for_{}.json", file_stem(file_name), format.extension())
}

/// Meters to centimeters; adding zero folds `-0.0` into `0.0`
fn to_cm(v: f32) -> f32 {
    v * BVH_UNITS_PER_METER + 0.0
}

fn offset_line(p: Point3<f32>) -> String {
    format!("OFFSET {:.4} {:.4} {:.4}", to_cm(p.x), to_cm(p.y), to_cm(p.z))
}

struct BvhWriter<'a> {
    catalog: &'a JointCatalog,
    positions: &'a JointPositions,
    written: HashSet<&'a str>,
    lines: Vec<String>,
}

impl<'a> BvhWriter<'a> {
    fn line(&mut self, depth: usize, text: &str) {
        self.lines.push(format!("{}{text}", INDENT.repeat(depth)));
    }

    fn joint(&mut self, def: &'a JointDef, depth: usize) {
        if !self.written.insert(def.id.as_str()) {
            return;
        }
        let offset = offset_line(self.positions.resolve(def));
        self.line(depth, &format!("JOINT {}", def.id));
        self.line(depth, "{");
        self.line(depth + 1, &offset);
        if self.catalog.is_leaf(&def.id) {
            self.line(depth + 1, LEAF_CHANNELS);
            self.line(depth + 1, "End Site");
            self.line(depth + 1, "{");
            self.line(depth + 2, &format!("OFFSET 0.0000 {BVH_END_SITE_LENGTH:.4} 0.0000"));
            self.line(depth + 1, "}");
        } else {
            self.line(depth + 1, ROOT_CHANNELS);
            let catalog = self.catalog;
            for child in catalog.children(&def.id) {
                self.joint(child, depth + 1);
            }
        }
        self.line(depth, "}");
    }
}

/// Write the catalog hierarchy with the stored positions as a one-frame BVH
/// document. Joints without a stored position use their catalog default.
///
/// # Errors
///
/// Returns `MalformedCatalog` if the catalog has no unique root or is
/// otherwise structurally invalid; nothing is written in that case.
pub fn export_bvh(catalog: &JointCatalog, positions: &JointPositions) -> Result<String> {
    catalog.validate()?;
    let root = catalog.root()?;

    let mut writer = BvhWriter {
        catalog,
        positions,
        written: HashSet::new(),
        lines: vec!["HIERARCHY".to_string()],
    };

    writer.written.insert(root.id.as_str());
    writer.line(0, &format!("ROOT {}", root.id));
    writer.line(0, "{");
    writer.line(1, &offset_line(positions.resolve(root)));
    writer.line(1, ROOT_CHANNELS);
    for child in catalog.children(&root.id) {
        writer.joint(child, 1);
    }
    writer.line(0, "}");

    let channel_count = catalog.len() * 3 + 3;
    writer.lines.push("MOTION".to_string());
    writer.lines.push("Frames: 1".to_string());
    writer.lines.push(format!("Frame Time: {BVH_FRAME_TIME:.6}"));
    writer.lines.push(vec!["0.000000"; channel_count].join(" "));

    info!("Exported BVH hierarchy with {} joints", catalog.len());
    Ok(writer.lines.join("\n"))
}

/// Joint positions carried by a rig data document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RigData {
    pub body_joints: JointPositions,
    pub using_real_bones: bool,
    pub hand_left: JointPositions,
    pub hand_right: JointPositions,
    pub analysis_data: Option<AnalysisResult>,
}

/// Options the converting tool should honor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub embed_textures: bool,
    pub include_animations: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            embed_textures: true,
            include_animations: true,
        }
    }
}

/// Rig data document for formats that need external conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigDataExport {
    pub exported_by: String,
    pub original_file: String,
    pub target_format: ExportFormat,
    pub options: ExportOptions,
    pub stats: ModelStats,
    pub rig_data: RigData,
    pub quality: QualityReport,
    /// Seconds since the Unix epoch
    pub export_time: u64,
    pub note: String,
}

impl RigDataExport {
    pub fn new(
        original_file: &str,
        target_format: ExportFormat,
        options: ExportOptions,
        stats: ModelStats,
        rig_data: RigData,
        quality: QualityReport,
        export_time: u64,
    ) -> Self {
        Self {
            exported_by: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            original_file: original_file.to_string(),
            target_format,
            options,
            stats,
            rig_data,
            quality,
            export_time,
            note: format!(
                "{} needs a DCC tool such as Blender or Maya for final conversion; use this rig data as reference.",
                target_format.extension().to_uppercase()
            ),
        }
    }
}

/// Pretty JSON rig data document
///
/// # Errors
///
/// Returns a serialization error if encoding fails
pub fn rig_data_json(export: &RigDataExport) -> Result<String> {
    Ok(serde_json::to_string_pretty(export)?)
}
