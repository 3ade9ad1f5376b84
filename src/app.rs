// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing session.
//!
//! This module ties the scene, the saved project and the recorded object
//! placements together. Without a rendering surface the placement of each
//! object is whatever it was saved with; new objects are placed around the
//! middle of the configured canvas.

use crate::config::Config;
use crate::io::media::load_image;
use crate::io::serialization::{export_file, import_file, RecordedStates};
use crate::io::storage::{clear_project, load_project, save_project, ProjectStore};
use crate::models::object::{LiveState, ObjectId, OriginX, OriginY, PlannerObject, Point, Transform};
use crate::models::project::{LoadedProject, Project};
use crate::models::scene::Scene;
use crate::util::geometry::midpoint;
use anyhow::{Context, Result};
use std::path::Path;

/// Side length of a mask drawn without an explicit size, in pixels.
const DEFAULT_MASK_SIZE_PX: f64 = 100.0;

/// Main application state.
pub struct PlannerApp<S: ProjectStore> {
    config: Config,
    store: S,
    scene: Scene,
    layout: RecordedStates,
}

impl<S: ProjectStore> PlannerApp<S> {
    /// Open the saved project, or start with an empty scene.
    pub fn open(config: Config, store: S) -> Result<Self> {
        let mut app = Self {
            config,
            store,
            scene: Scene::new(),
            layout: RecordedStates::new(),
        };
        if let Some(loaded) = load_project(&app.store)? {
            app.replace(&loaded);
        }
        Ok(app)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn layout(&self) -> &RecordedStates {
        &self.layout
    }

    /// Snapshot the scene and write it to the store.
    pub fn save(&self) -> Result<Project> {
        let project = self.scene.snapshot(&self.layout);
        save_project(&self.store, &project)?;
        Ok(project)
    }

    pub fn calibrate(&mut self, pixel_distance: f64, meters: f64) -> Result<f64> {
        Ok(self.scene.calibrate(pixel_distance, meters)?)
    }

    /// Add a shape centered on the canvas. Missing values come from the config.
    pub fn add_shape(
        &mut self,
        name: Option<&str>,
        width_m: Option<f64>,
        height_m: Option<f64>,
        color: Option<&str>,
    ) -> Result<ObjectId> {
        let width_m = width_m.unwrap_or(self.config.default_shape_width_m);
        let height_m = height_m.unwrap_or(self.config.default_shape_height_m);
        let color = color.unwrap_or(self.config.default_shape_color.as_str()).to_string();
        let name = name.map_or_else(|| self.next_name("Shape"), str::to_string);

        let id = self.scene.add_shape(&name, width_m, height_m, &color)?;
        if let Some(PlannerObject::Shape(shape)) = self.scene.get(id) {
            let (width, height) = (shape.base_width_px, shape.base_height_px);
            let center = self.canvas_center();
            self.layout.place(
                id,
                LiveState::Rect {
                    transform: Transform::at(center.x - width / 2.0, center.y - height / 2.0),
                    width,
                    height,
                    base_width_px: Some(width),
                    base_height_px: Some(height),
                },
            );
        }
        log::info!("Added shape {} ({}): {} m x {} m", id, name, width_m, height_m);
        Ok(id)
    }

    /// Draw a line from `start` towards `end`; the end point snaps to 45°.
    pub fn add_line(
        &mut self,
        name: Option<&str>,
        start: Point,
        end: Point,
        color: Option<&str>,
        stroke_width: Option<f64>,
    ) -> Result<ObjectId> {
        let color = color.unwrap_or(self.config.default_line_color.as_str()).to_string();
        let stroke_width = stroke_width.unwrap_or(self.config.default_line_width);
        let name = name.map_or_else(|| self.next_name("Line"), str::to_string);

        let placed = self.scene.add_line(&name, start, end, &color, stroke_width)?;
        self.layout.place(
            placed.id,
            LiveState::Line {
                transform: Transform::at(start.x.min(placed.end.x), start.y.min(placed.end.y)),
                start,
                end: placed.end,
                stroke_width,
            },
        );
        log::info!("Added line {} ({}) ending at ({:.1}, {:.1})", placed.id, name, placed.end.x, placed.end.y);
        Ok(placed.id)
    }

    /// Add a cleanup mask with its top-left corner at `at`.
    pub fn add_mask(&mut self, at: Point, width: Option<f64>, height: Option<f64>) -> Result<ObjectId> {
        let name = self.next_name("Mask");
        let id = self.scene.add_mask(&name)?;
        self.layout.place(
            id,
            LiveState::Rect {
                transform: Transform::at(at.x, at.y),
                width: width.unwrap_or(DEFAULT_MASK_SIZE_PX),
                height: height.unwrap_or(DEFAULT_MASK_SIZE_PX),
                base_width_px: None,
                base_height_px: None,
            },
        );
        Ok(id)
    }

    /// Add an image file as an overlay, or as part of the cleanup band.
    pub fn add_image(&mut self, path: &Path, cleanup: bool) -> Result<ObjectId> {
        let image = load_image(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.next_name("Image"));
        let scale = image.overlay_scale(self.config.canvas_width, self.config.canvas_height);

        let id = if cleanup {
            self.scene.add_cleanup_image(&name, Some(image.data_url))?
        } else {
            self.scene.add_overlay_image(&name, Some(image.data_url))?
        };
        let center = self.canvas_center();
        self.layout.place(
            id,
            LiveState::Image {
                transform: Transform {
                    scale_x: scale,
                    scale_y: scale,
                    ..Transform::at(center.x, center.y)
                },
                origin_x: OriginX::Center,
                origin_y: OriginY::Center,
            },
        );
        Ok(id)
    }

    /// Set the background image. Returns the scale it is displayed at.
    pub fn set_background(&mut self, path: &Path) -> Result<f64> {
        let image = load_image(path)?;
        let scale = image.fit_scale(self.config.canvas_width, self.config.canvas_height);
        self.scene.set_background_image(Some(image.data_url));
        Ok(scale)
    }

    pub fn remove(&mut self, id: ObjectId) -> Result<PlannerObject> {
        let removed = self
            .scene
            .remove(id)
            .with_context(|| format!("no object with id {id}"))?;
        self.layout.forget(id);
        Ok(removed)
    }

    /// Remove every shape, line and overlay image.
    pub fn clear_all(&mut self) -> usize {
        let removed: Vec<ObjectId> = self.scene.visible_objects().map(PlannerObject::id).collect();
        for id in &removed {
            self.layout.forget(*id);
        }
        self.scene.clear_all()
    }

    pub fn move_up(&mut self, id: ObjectId) -> Result<bool> {
        Ok(self.scene.move_up(id)?)
    }

    pub fn move_down(&mut self, id: ObjectId) -> Result<bool> {
        Ok(self.scene.move_down(id)?)
    }

    /// Replace the scene with a project file. On failure nothing changes.
    pub fn import(&mut self, path: &Path) -> Result<()> {
        let loaded = import_file(path)?;
        self.replace(&loaded);
        Ok(())
    }

    /// Export the scene to a JSON or YAML file.
    pub fn export(&self, path: &Path) -> Result<Project> {
        let project = self.scene.snapshot(&self.layout);
        export_file(&project, path)?;
        Ok(project)
    }

    /// Delete the saved project. The open scene is kept.
    pub fn clear_storage(&self) -> Result<()> {
        clear_project(&self.store)
    }

    /// One line per object, bottom to top.
    pub fn describe(&self) -> Vec<String> {
        self.scene
            .objects()
            .iter()
            .map(|object| {
                let detail = match object {
                    PlannerObject::Shape(shape) => Scene::shape_label(shape),
                    PlannerObject::Line(line) => Scene::line_label(line),
                    PlannerObject::Mask(_) => "cleanup mask".to_string(),
                    PlannerObject::OverlayImage(_) => "image".to_string(),
                    PlannerObject::BackgroundImage(_) => "cleanup image".to_string(),
                };
                let position = match self.layout.get(object.id()) {
                    Some(LiveState::Line { start, end, .. }) => {
                        let label = midpoint(*start, *end);
                        format!(" @ ({:.0}, {:.0})", label.x, label.y)
                    }
                    Some(state) => format!(" @ ({:.0}, {:.0})", state.transform().left, state.transform().top),
                    None => String::new(),
                };
                format!("#{} {:<16} {}{}", object.id(), object.name(), detail, position)
            })
            .collect()
    }

    fn replace(&mut self, loaded: &LoadedProject) {
        self.scene = Scene::restore(loaded);
        self.layout = RecordedStates::from_loaded(loaded);
    }

    fn canvas_center(&self) -> Point {
        Point::new(self.config.canvas_width / 2.0, self.config.canvas_height / 2.0)
    }

    fn next_name(&self, prefix: &str) -> String {
        let count = self.scene.objects().len();
        format!("{} {}", prefix, count + 1)
    }
}
