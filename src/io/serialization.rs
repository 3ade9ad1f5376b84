// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project data serialization and deserialization.
//!
//! This module turns the live scene into a versioned [`Project`] document
//! and back. Loading accepts any earlier schema version and migrates it
//! forward one step at a time; documents written by a newer build are
//! refused instead of being read lossily. Exported files use the same
//! document in JSON or YAML.

use crate::error::ProjectError;
use crate::models::object::{LiveState, ObjectId, PlannerObject};
use crate::models::project::{
    LoadedProject, Project, SerializedImage, SerializedLine, SerializedMask, SerializedObject,
    SerializedShape, CURRENT_VERSION,
};
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use time::OffsetDateTime;

/// Stroke width given to version 1 lines, which did not record one.
const V1_DEFAULT_STROKE_WIDTH: f64 = 3.0;

/// Save time given to version 1 documents that did not record one.
const V1_DEFAULT_SAVED_AT: &str = "1970-01-01T00:00:00Z";

/// Source of the live pixel state of rendered objects.
///
/// The rendering surface owns the real transforms; serialization only asks
/// for them by id. Any `Fn(ObjectId) -> Option<LiveState>` is a provider.
pub trait TransformProvider {
    /// Current state of the object, or `None` if it is no longer rendered.
    fn live_state(&self, id: ObjectId) -> Option<LiveState>;
}

impl<F> TransformProvider for F
where
    F: Fn(ObjectId) -> Option<LiveState>,
{
    fn live_state(&self, id: ObjectId) -> Option<LiveState> {
        self(id)
    }
}

/// Live states remembered from a saved document.
///
/// Front ends without a rendering surface of their own use this as the
/// provider: loaded objects keep the transforms they were saved with, new
/// objects get the placement the front end records for them.
#[derive(Debug, Clone, Default)]
pub struct RecordedStates {
    states: HashMap<ObjectId, LiveState>,
}

impl RecordedStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_loaded(loaded: &LoadedProject) -> Self {
        let states = loaded
            .serialized_objects
            .iter()
            .map(|record| (record.id(), LiveState::from(record)))
            .collect();
        Self { states }
    }

    pub fn place(&mut self, id: ObjectId, state: LiveState) {
        self.states.insert(id, state);
    }

    pub fn forget(&mut self, id: ObjectId) -> Option<LiveState> {
        self.states.remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&LiveState> {
        self.states.get(&id)
    }
}

impl TransformProvider for RecordedStates {
    fn live_state(&self, id: ObjectId) -> Option<LiveState> {
        self.states.get(&id).cloned()
    }
}

/// Snapshot the scene into a current-version document stamped with the
/// current time.
///
/// Objects the provider has no live state for are left out of the document
/// rather than written with stale geometry.
pub fn serialize_project<P>(
    pixels_per_meter: f64,
    background_image: Option<&str>,
    objects: &[PlannerObject],
    provider: &P,
) -> Project
where
    P: TransformProvider + ?Sized,
{
    serialize_project_at(pixels_per_meter, background_image, objects, provider, OffsetDateTime::now_utc())
}

/// Same as [`serialize_project`] with an explicit save time.
pub fn serialize_project_at<P>(
    pixels_per_meter: f64,
    background_image: Option<&str>,
    objects: &[PlannerObject],
    provider: &P,
    saved_at: OffsetDateTime,
) -> Project
where
    P: TransformProvider + ?Sized,
{
    let mut records = Vec::with_capacity(objects.len());

    for object in objects {
        let Some(state) = provider.live_state(object.id()) else {
            warn!("Skipping object {} ({}): no live state", object.id(), object.name());
            continue;
        };
        match serialize_object(object, state) {
            Some(record) => records.push(record),
            None => warn!(
                "Skipping object {} ({}): live state does not match a {:?}",
                object.id(),
                object.name(),
                object.kind()
            ),
        }
    }

    debug!("Serialized {} of {} objects", records.len(), objects.len());

    Project {
        version: CURRENT_VERSION,
        pixels_per_meter,
        background_image: background_image.map(str::to_string),
        saved_at,
        objects: records,
        next_id: None,
    }
}

/// Merge the logical fields of an object with its live state.
fn serialize_object(object: &PlannerObject, state: LiveState) -> Option<SerializedObject> {
    let record = match (object, state) {
        (
            PlannerObject::Shape(shape),
            LiveState::Rect {
                transform,
                width,
                height,
                base_width_px,
                base_height_px,
            },
        ) => SerializedObject::Shape(SerializedShape {
            id: shape.id,
            name: shape.name.clone(),
            transform,
            width_m: shape.width_m,
            height_m: shape.height_m,
            color: shape.color.clone(),
            base_width_px: base_width_px.unwrap_or(shape.base_width_px),
            base_height_px: base_height_px.unwrap_or(shape.base_height_px),
            width: Some(width),
            height: Some(height),
        }),
        (
            PlannerObject::Line(line),
            LiveState::Line {
                transform,
                start,
                end,
                stroke_width,
            },
        ) => SerializedObject::Line(SerializedLine {
            id: line.id,
            name: line.name.clone(),
            transform,
            color: line.color.clone(),
            stroke_width,
            x1: start.x,
            y1: start.y,
            x2: end.x,
            y2: end.y,
        }),
        (
            PlannerObject::Mask(mask),
            LiveState::Rect {
                transform,
                width,
                height,
                ..
            },
        ) => SerializedObject::Mask(SerializedMask {
            id: mask.id,
            name: mask.name.clone(),
            transform,
            width,
            height,
        }),
        (
            PlannerObject::OverlayImage(image),
            LiveState::Image {
                transform,
                origin_x,
                origin_y,
            },
        ) => SerializedObject::OverlayImage(SerializedImage {
            id: image.id,
            name: image.name.clone(),
            transform,
            origin_x,
            origin_y,
            image_data: image.image_data.clone(),
        }),
        (
            PlannerObject::BackgroundImage(image),
            LiveState::Image {
                transform,
                origin_x,
                origin_y,
            },
        ) => SerializedObject::BackgroundImage(SerializedImage {
            id: image.id,
            name: image.name.clone(),
            transform,
            origin_x,
            origin_y,
            image_data: image.image_data.clone(),
        }),
        _ => return None,
    };
    Some(record)
}

type Migration = fn(&mut Map<String, Value>) -> Result<(), ProjectError>;

/// Schema migrations, keyed by the version they upgrade from. Kept sorted.
const MIGRATIONS: &[(u64, Migration)] = &[(1, migrate_v1_to_v2)];

/// Rebuild a loadable project from a document of any supported version.
///
/// Older documents are migrated forward, every absent field receiving its
/// documented default. The result is validated (unique ids, positive sizes)
/// and its objects are ordered so the cleanup band sits beneath everything
/// else. A current-version document in that order comes back unchanged.
pub fn deserialize_project(mut document: Value) -> Result<LoadedProject, ProjectError> {
    let Value::Object(root) = &mut document else {
        return Err(ProjectError::InvalidField {
            field: "document",
            reason: "expected an object".to_string(),
        });
    };

    let version = read_version(root)?;
    if version == 0 || version > u64::from(CURRENT_VERSION) {
        return Err(ProjectError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    for &(from, migrate) in MIGRATIONS {
        if from >= version {
            debug!("Migrating project document from version {} to {}", from, from + 1);
            migrate(root)?;
        }
    }
    root.insert("version".to_string(), Value::from(CURRENT_VERSION));

    let project: Project = serde_json::from_value(document)?;
    validate(&project)?;

    let mut objects = project.objects;
    // Stable: relative order inside each band is kept.
    objects.sort_by_key(|object| object.kind().layer());

    Ok(LoadedProject {
        pixels_per_meter: project.pixels_per_meter,
        background_image_data: project.background_image,
        saved_at: project.saved_at,
        serialized_objects: objects,
        next_id: project.next_id,
    })
}

fn read_version(root: &Map<String, Value>) -> Result<u64, ProjectError> {
    let value = root.get("version").ok_or(ProjectError::MissingField("version"))?;
    value.as_u64().ok_or_else(|| ProjectError::InvalidField {
        field: "version",
        reason: format!("expected a non-negative integer, got {value}"),
    })
}

/// Insert `value` under `key` unless a non-null value is already there.
fn fill_absent(object: &mut Map<String, Value>, key: &str, value: Value) {
    if matches!(object.get(key), None | Some(Value::Null)) {
        object.insert(key.to_string(), value);
    }
}

/// Version 1 predates cleanup objects, recorded transforms only when they
/// differed from the identity and left shape base sizes, line widths and
/// image origins implicit.
fn migrate_v1_to_v2(root: &mut Map<String, Value>) -> Result<(), ProjectError> {
    fill_absent(root, "pixelsPerMeter", Value::from(0.0));
    fill_absent(root, "backgroundImage", Value::Null);
    fill_absent(root, "savedAt", Value::from(V1_DEFAULT_SAVED_AT));

    let pixels_per_meter = root.get("pixelsPerMeter").and_then(Value::as_f64).unwrap_or(0.0);

    let Some(Value::Array(objects)) = root.get_mut("objects") else {
        return Ok(());
    };

    for object in objects.iter_mut().filter_map(Value::as_object_mut) {
        let kind = object.get("type").and_then(Value::as_str).unwrap_or_default().to_string();

        if kind == "mask" || kind == "backgroundImage" {
            return Err(ProjectError::UnknownObjectType {
                id: object.get("id").map(Value::to_string).unwrap_or_default(),
                kind,
                version: 1,
            });
        }

        fill_absent(object, "left", Value::from(0.0));
        fill_absent(object, "top", Value::from(0.0));
        fill_absent(object, "scaleX", Value::from(1.0));
        fill_absent(object, "scaleY", Value::from(1.0));
        fill_absent(object, "angle", Value::from(0.0));

        match kind.as_str() {
            "shape" => {
                for (metric, base) in [("widthM", "baseWidthPx"), ("heightM", "baseHeightPx")] {
                    if let Some(meters) = object.get(metric).and_then(Value::as_f64) {
                        fill_absent(object, base, Value::from(meters * pixels_per_meter));
                    }
                }
            }
            "line" => fill_absent(object, "strokeWidth", Value::from(V1_DEFAULT_STROKE_WIDTH)),
            "overlayImage" => {
                fill_absent(object, "originX", Value::from("left"));
                fill_absent(object, "originY", Value::from("top"));
            }
            _ => {}
        }
    }

    Ok(())
}

fn validate(project: &Project) -> Result<(), ProjectError> {
    if !project.pixels_per_meter.is_finite() || project.pixels_per_meter < 0.0 {
        return Err(ProjectError::InvalidField {
            field: "pixelsPerMeter",
            reason: format!("expected zero or a positive number, got {}", project.pixels_per_meter),
        });
    }

    let mut seen = HashSet::with_capacity(project.objects.len());
    for object in &project.objects {
        if !seen.insert(object.id()) {
            return Err(ProjectError::DuplicateId(object.id()));
        }
        if object.id() == ObjectId::MAX {
            return Err(ProjectError::InvalidField {
                field: "id",
                reason: format!("{} is reserved", ObjectId::MAX),
            });
        }
        if let Some(next_id) = project.next_id.filter(|&next| object.id() >= next) {
            return Err(ProjectError::InvalidField {
                field: "nextId",
                reason: format!("object id {} is not below {}", object.id(), next_id),
            });
        }

        match object {
            SerializedObject::Shape(shape) if shape.width_m <= 0.0 || shape.height_m <= 0.0 => {
                return Err(ProjectError::InvalidField {
                    field: "widthM",
                    reason: format!(
                        "shape {} must have a positive size, got {} m x {} m",
                        shape.id, shape.width_m, shape.height_m
                    ),
                });
            }
            SerializedObject::OverlayImage(image) | SerializedObject::BackgroundImage(image)
                if image.transform.scale_x <= 0.0 || image.transform.scale_y <= 0.0 =>
            {
                return Err(ProjectError::InvalidField {
                    field: "scaleX",
                    reason: format!("image {} must have positive scale factors", image.id),
                });
            }
            _ => {}
        }
    }

    Ok(())
}

/// Parse a JSON project document of any supported version.
pub fn parse_json(text: &str) -> Result<LoadedProject, ProjectError> {
    let document: Value = serde_json::from_str(text)?;
    deserialize_project(document)
}

/// Parse a YAML project document of any supported version.
pub fn parse_yaml(text: &str) -> Result<LoadedProject, ProjectError> {
    let document: Value = serde_yaml::from_str(text)?;
    deserialize_project(document)
}

/// Supported project file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Some(FileFormat::Json),
            Some("yaml") | Some("yml") => Some(FileFormat::Yaml),
            _ => None,
        }
    }
}

/// Export project data to YAML format.
pub fn export_yaml(data: &Project, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export project data to JSON format.
pub fn export_json(data: &Project, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import project data from YAML format.
pub fn import_yaml(path: &Path) -> Result<LoadedProject> {
    let yaml = std::fs::read_to_string(path)?;
    let data = parse_yaml(&yaml)?;
    Ok(data)
}

/// Import project data from JSON format.
pub fn import_json(path: &Path) -> Result<LoadedProject> {
    let json = std::fs::read_to_string(path)?;
    let data = parse_json(&json)?;
    Ok(data)
}

/// Export to JSON or YAML depending on the file extension.
pub fn export_file(data: &Project, path: &Path) -> Result<()> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Json) => export_json(data, path),
        Some(FileFormat::Yaml) => export_yaml(data, path),
        None => bail!("Unsupported file extension: {}", path.display()),
    }
    .with_context(|| format!("could not export project to {}", path.display()))?;

    info!("Exported {} objects to {}", data.objects.len(), path.display());
    Ok(())
}

/// Import from JSON or YAML depending on the file extension.
pub fn import_file(path: &Path) -> Result<LoadedProject> {
    let loaded = match FileFormat::from_path(path) {
        Some(FileFormat::Json) => import_json(path),
        Some(FileFormat::Yaml) => import_yaml(path),
        None => bail!("Unsupported file extension: {}", path.display()),
    }
    .with_context(|| format!("could not load project from {}", path.display()))?;

    info!("Imported {} objects from {}", loaded.serialized_objects.len(), path.display());
    Ok(loaded)
}
