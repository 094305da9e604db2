//! Command-line front end for analysing, scoring and exporting character rigs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use rig_forge::config::{Config, EXAMPLE_CONFIG};
use rig_forge::export::ExportFormat;
use rig_forge::persistence::{now_millis, SessionStore};
use rig_forge::scene::StaticScene;
use rig_forge::session::RigSession;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Rescale scenes to the standard rig height before working on them
    #[arg(long, global = true)]
    normalize: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a scene and print the estimated joints
    Analyze {
        /// Scene description (JSON)
        scene: PathBuf,
    },

    /// Write the rig of a scene
    Export {
        /// Scene description (JSON)
        scene: PathBuf,

        /// Output file; defaults to `<stem>_rigged.<ext>` next to the scene
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Procedural pose whose frame is written into the rig before exporting
        #[arg(short, long)]
        pose: Option<String>,

        /// Pose animation time in milliseconds before the frame is taken
        #[arg(long, default_value = "1000")]
        pose_ms: u64,

        /// Export format (bvh, fbx, usd); defaults to the configured format
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Restore joints from the saved session before exporting
        #[arg(long)]
        resume: bool,
    },

    /// Print the quality report for a scene
    Score {
        /// Scene description (JSON)
        scene: PathBuf,
    },

    /// Run a procedural pose and print the resulting joints
    Pose {
        /// Scene description (JSON)
        scene: PathBuf,

        /// Pose name (rest, tpose, apose, relaxed-rest, wave, walk)
        name: String,

        /// Host ticks of 16 ms to advance animated poses
        #[arg(short, long, default_value = "30")]
        ticks: u32,
    },

    /// Print the active or example configuration
    Config {
        /// Print the documented example configuration
        #[arg(long)]
        example: bool,
    },
}

fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    info!("Loading configuration from: {}", path.display());
    match Config::from_file(path).and_then(|c| c.validate().map(|()| c)) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config file: {}. Using defaults.", e);
            Config::default()
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn open_session(config: &Config, path: &Path, normalize: bool) -> Result<RigSession> {
    let mut scene = StaticScene::from_file(path).with_context(|| format!("loading scene {}", path.display()))?;
    if normalize {
        scene = scene.normalized();
    }
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let mut session = RigSession::new(config);
    session.load_scene(Box::new(scene), &file_name_of(path), size);
    if config.analysis.auto_analyze {
        analyze(&mut session)?;
    }
    Ok(session)
}

fn ensure_analysed(session: &mut RigSession) -> Result<()> {
    if session.analysis_result().is_none() {
        analyze(session)?;
    }
    Ok(())
}

fn analyze(session: &mut RigSession) -> Result<()> {
    let delay = session.analysis_delay();
    session.begin_analysis()?;
    while let Some(progress) = session.step_analysis() {
        info!("[{:>3}%] {}", progress.percent, progress.label);
        if session.is_analyzing() {
            std::thread::sleep(delay);
        }
    }
    Ok(())
}

fn print_joints(session: &RigSession) {
    for (id, p) in session.displayed_positions().iter() {
        println!("{:<14} {:>8.4} {:>8.4} {:>8.4}", id, p.x, p.y, p.z);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = load_config(args.config.as_deref());

    match args.command {
        Command::Analyze { scene } => {
            let mut session = open_session(&config, &scene, args.normalize)?;
            ensure_analysed(&mut session)?;
            if let Some(result) = session.analysis_result() {
                println!(
                    "meshes={} vertices={} skeleton={} ({} bones) symmetry={} score={}",
                    result.mesh_count,
                    result.vertex_count,
                    result.has_skeleton,
                    result.skeleton_bone_count,
                    result.has_symmetry,
                    result.quality_score
                );
            }
            print_joints(&session);
        }

        Command::Export {
            scene,
            output,
            pose,
            pose_ms,
            format,
            resume,
        } => {
            let mut session = open_session(&config, &scene, args.normalize)?;

            let store = SessionStore::with_ttl(&config.session.state_path, config.session_ttl());
            if resume {
                match store.load()? {
                    Some(record) => session.restore(&record, now_millis(), store.ttl())?,
                    None => warn!("No saved session to resume"),
                }
            }

            if let Some(format) = format {
                session.set_export_format(format);
            }

            if let Some(name) = pose {
                if !session.apply_pose(&name) {
                    anyhow::bail!("no model loaded");
                }
                session.tick(Duration::from_millis(pose_ms));
                session.commit_pose();
            }

            let dir = scene.parent().unwrap_or_else(|| Path::new(""));
            let (default_name, content) = session.export_document(now_millis() / 1000)?;
            let output = output.unwrap_or_else(|| dir.join(default_name));
            std::fs::write(&output, content).with_context(|| format!("writing {}", output.display()))?;
            info!("Wrote {}", output.display());

            session.steps_mut().body_rig = true;
            store.save(&session.to_record())?;
        }

        Command::Score { scene } => {
            let mut session = open_session(&config, &scene, args.normalize)?;
            ensure_analysed(&mut session)?;
            let report = session.quality_report(session.file_name());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Pose { scene, name, ticks } => {
            let mut session = open_session(&config, &scene, args.normalize)?;
            if !session.apply_pose(&name) {
                anyhow::bail!("no model loaded");
            }
            let mut frames = 0;
            for _ in 0..ticks {
                frames += session.tick(Duration::from_millis(16));
            }
            info!("Advanced {} animation frames", frames);
            print_joints(&session);
        }

        Command::Config { example } => {
            if example {
                print!("{EXAMPLE_CONFIG}");
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
        }
    }

    Ok(())
}
