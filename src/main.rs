// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! scaleplan command line front end.
//!
//! Every editing command opens the saved project, applies one change and
//! saves it again.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scaleplan::app::PlannerApp;
use scaleplan::config::Config;
use scaleplan::io::media::load_image;
use scaleplan::io::serialization::{export_file, import_file};
use scaleplan::io::storage::FileStore;
use scaleplan::{ObjectId, Point};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scaleplan", about = "Scale diagram planner")]
struct Cli {
    /// YAML settings file.
    #[arg(long, env = "SCALEPLAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite a project file of any version as the current version.
    Migrate { input: PathBuf, output: PathBuf },
    /// Print the display scales of an image on the configured canvas.
    Fit { path: PathBuf },
    #[command(flatten)]
    Edit(EditCommand),
}

/// Commands that work on the saved project.
#[derive(Subcommand, Debug)]
enum EditCommand {
    /// Show the saved project.
    Info,
    /// Set the scale from a reference line of known length.
    Calibrate {
        #[arg(long)]
        pixels: f64,
        #[arg(long)]
        meters: f64,
    },
    /// Add a rectangle measured in meters.
    AddShape {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Add a line; the end point snaps to 45°.
    AddLine {
        #[arg(long, value_parser = parse_point)]
        from: Point,
        #[arg(long, value_parser = parse_point)]
        to: Point,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        stroke_width: Option<f64>,
    },
    /// Add a cleanup mask.
    AddMask {
        #[arg(long, value_parser = parse_point)]
        at: Point,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
    },
    /// Add an overlay image, or a cleanup image with --cleanup.
    AddImage {
        path: PathBuf,
        #[arg(long)]
        cleanup: bool,
    },
    /// Set the background image.
    Background { path: PathBuf },
    /// Delete an object.
    Remove { id: ObjectId },
    /// Move an object one step up in z-order.
    MoveUp { id: ObjectId },
    /// Move an object one step down in z-order.
    MoveDown { id: ObjectId },
    /// Delete all shapes, lines and overlay images.
    ClearAll,
    /// Export the saved project to a .json or .yaml file.
    Export { path: PathBuf },
    /// Replace the saved project with a .json or .yaml file.
    Import { path: PathBuf },
    /// Delete the saved project.
    Clear,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected X,Y, got `{s}`"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x coordinate `{x}`: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y coordinate `{y}`: {e}"))?;
    Ok(Point::new(x, y))
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Migrate { input, output } => {
            let project = import_file(&input)?.into_project();
            export_file(&project, &output)?;
            println!("Wrote version {} project to {}", project.version, output.display());
            Ok(())
        }
        Command::Fit { path } => {
            let image = load_image(&path)?;
            println!("{}x{} px", image.width, image.height);
            println!("background scale: {:.4}", image.fit_scale(config.canvas_width, config.canvas_height));
            println!("overlay scale:    {:.4}", image.overlay_scale(config.canvas_width, config.canvas_height));
            Ok(())
        }
        Command::Edit(command) => edit(config, command),
    }
}

/// Open the saved project, apply one command and save it again.
fn edit(config: Config, command: EditCommand) -> Result<()> {
    let store = FileStore::open(&config.storage_dir)?;
    let mut app = PlannerApp::open(config, store).context("could not load project")?;

    match command {
        EditCommand::Info => {
            let scene = app.scene();
            if scene.is_calibrated() {
                println!("Scale: {:.3} px/m", scene.pixels_per_meter());
            } else {
                println!("Scale: not set");
            }
            println!("Background: {}", if scene.background_image().is_some() { "yes" } else { "none" });
            println!("Objects: {}", scene.objects().len());
            for line in app.describe() {
                println!("  {line}");
            }
            return Ok(());
        }
        EditCommand::Calibrate { pixels, meters } => {
            let ratio = app.calibrate(pixels, meters)?;
            println!("Scale set to {ratio:.3} px/m");
        }
        EditCommand::AddShape {
            name,
            width,
            height,
            color,
        } => {
            let id = app.add_shape(name.as_deref(), width, height, color.as_deref())?;
            println!("Added shape #{id}");
        }
        EditCommand::AddLine {
            from,
            to,
            name,
            color,
            stroke_width,
        } => {
            let id = app.add_line(name.as_deref(), from, to, color.as_deref(), stroke_width)?;
            println!("Added line #{id}");
        }
        EditCommand::AddMask { at, width, height } => {
            let id = app.add_mask(at, width, height)?;
            println!("Added mask #{id}");
        }
        EditCommand::AddImage { path, cleanup } => {
            let id = app.add_image(&path, cleanup)?;
            println!("Added image #{id}");
        }
        EditCommand::Background { path } => {
            let scale = app.set_background(&path)?;
            println!("Background set (display scale {scale:.4})");
        }
        EditCommand::Remove { id } => {
            let removed = app.remove(id)?;
            println!("Removed #{id} ({})", removed.name());
        }
        EditCommand::MoveUp { id } => {
            if !app.move_up(id)? {
                println!("#{id} is already at the top of its layer");
            }
        }
        EditCommand::MoveDown { id } => {
            if !app.move_down(id)? {
                println!("#{id} is already at the bottom of its layer");
            }
        }
        EditCommand::ClearAll => {
            let count = app.clear_all();
            println!("Removed {count} objects");
        }
        EditCommand::Export { path } => {
            app.export(&path)?;
            return Ok(());
        }
        EditCommand::Import { path } => {
            app.import(&path)?;
        }
        EditCommand::Clear => {
            app.clear_storage()?;
            return Ok(());
        }
    }

    app.save()?;
    Ok(())
}
