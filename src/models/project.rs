// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project document structures.
//!
//! A [`Project`] is the versioned, self-describing snapshot written to
//! storage and to exported files. It is rebuilt on every save and thrown
//! away once persisted; the live scene is never edited through it.

use super::object::{LiveState, ObjectId, ObjectKind, OriginX, OriginY, Point, Transform};
use crate::util::geometry::{distance, pixels_to_meters};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Schema version written by this build.
pub const CURRENT_VERSION: u32 = 2;

/// Complete project document for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub version: u32,
    /// Calibration ratio; zero means the document is uncalibrated.
    pub pixels_per_meter: f64,
    /// Encoded background image (data URL).
    pub background_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
    /// Objects in z-order, bottom to top.
    pub objects: Vec<SerializedObject>,
    /// First id the scene has not handed out yet. Older documents lack it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<ObjectId>,
}

/// Serialized shape: metric size plus its last pixel transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedShape {
    pub id: ObjectId,
    pub name: String,
    #[serde(flatten)]
    pub transform: Transform,
    pub width_m: f64,
    pub height_m: f64,
    pub color: String,
    pub base_width_px: f64,
    pub base_height_px: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Serialized line with its pixel endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedLine {
    pub id: ObjectId,
    pub name: String,
    #[serde(flatten)]
    pub transform: Transform,
    pub color: String,
    pub stroke_width: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl SerializedLine {
    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Length in meters, recomputed from the endpoints. Zero when the
    /// document is uncalibrated.
    pub fn length_m(&self, pixels_per_meter: f64) -> f64 {
        if pixels_per_meter <= 0.0 {
            return 0.0;
        }
        pixels_to_meters(distance(self.start(), self.end()), pixels_per_meter)
    }
}

/// Serialized cleanup rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedMask {
    pub id: ObjectId,
    pub name: String,
    #[serde(flatten)]
    pub transform: Transform,
    pub width: f64,
    pub height: f64,
}

/// Serialized overlay or cleanup image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedImage {
    pub id: ObjectId,
    pub name: String,
    #[serde(flatten)]
    pub transform: Transform,
    pub origin_x: OriginX,
    pub origin_y: OriginY,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

/// One object record of a project document, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SerializedObject {
    Shape(SerializedShape),
    Line(SerializedLine),
    Mask(SerializedMask),
    OverlayImage(SerializedImage),
    BackgroundImage(SerializedImage),
}

impl SerializedObject {
    pub fn id(&self) -> ObjectId {
        match self {
            SerializedObject::Shape(s) => s.id,
            SerializedObject::Line(l) => l.id,
            SerializedObject::Mask(m) => m.id,
            SerializedObject::OverlayImage(i) | SerializedObject::BackgroundImage(i) => i.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SerializedObject::Shape(s) => &s.name,
            SerializedObject::Line(l) => &l.name,
            SerializedObject::Mask(m) => &m.name,
            SerializedObject::OverlayImage(i) | SerializedObject::BackgroundImage(i) => &i.name,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            SerializedObject::Shape(_) => ObjectKind::Shape,
            SerializedObject::Line(_) => ObjectKind::Line,
            SerializedObject::Mask(_) => ObjectKind::Mask,
            SerializedObject::OverlayImage(_) => ObjectKind::OverlayImage,
            SerializedObject::BackgroundImage(_) => ObjectKind::BackgroundImage,
        }
    }
}

impl From<&SerializedObject> for LiveState {
    /// The live state an object had when it was saved.
    fn from(record: &SerializedObject) -> Self {
        match record {
            SerializedObject::Shape(s) => LiveState::Rect {
                transform: s.transform,
                width: s.width.unwrap_or(s.base_width_px),
                height: s.height.unwrap_or(s.base_height_px),
                base_width_px: Some(s.base_width_px),
                base_height_px: Some(s.base_height_px),
            },
            SerializedObject::Line(l) => LiveState::Line {
                transform: l.transform,
                start: l.start(),
                end: l.end(),
                stroke_width: l.stroke_width,
            },
            SerializedObject::Mask(m) => LiveState::Rect {
                transform: m.transform,
                width: m.width,
                height: m.height,
                base_width_px: None,
                base_height_px: None,
            },
            SerializedObject::OverlayImage(i) | SerializedObject::BackgroundImage(i) => LiveState::Image {
                transform: i.transform,
                origin_x: i.origin_x,
                origin_y: i.origin_y,
            },
        }
    }
}

/// A document after migration and validation, ready to be re-materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProject {
    pub pixels_per_meter: f64,
    pub background_image_data: Option<String>,
    pub saved_at: OffsetDateTime,
    pub serialized_objects: Vec<SerializedObject>,
    pub next_id: Option<ObjectId>,
}

impl LoadedProject {
    pub fn is_calibrated(&self) -> bool {
        self.pixels_per_meter > 0.0
    }

    /// Re-stamp as a current-version document, keeping the original save time.
    pub fn into_project(self) -> Project {
        Project {
            version: CURRENT_VERSION,
            pixels_per_meter: self.pixels_per_meter,
            background_image: self.background_image_data,
            saved_at: self.saved_at,
            objects: self.serialized_objects,
            next_id: self.next_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_record_uses_document_field_names() {
        let obj = SerializedObject::Shape(SerializedShape {
            id: 0,
            name: "Test".to_string(),
            transform: Transform::at(100.0, 200.0),
            width_m: 2.0,
            height_m: 3.0,
            color: "red".to_string(),
            base_width_px: 100.0,
            base_height_px: 150.0,
            width: Some(100.0),
            height: Some(150.0),
        });

        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(value["type"], "shape");
        assert_eq!(value["left"], 100.0);
        assert_eq!(value["scaleX"], 1.0);
        assert_eq!(value["widthM"], 2.0);
        assert_eq!(value["baseHeightPx"], 150.0);
        assert!(value.get("transform").is_none());
    }

    #[test]
    fn test_parse_image_record() {
        let value = json!({
            "id": 4,
            "type": "overlayImage",
            "name": "Tree",
            "left": 10,
            "top": 20,
            "scaleX": 0.5,
            "scaleY": 0.5,
            "angle": 90,
            "originX": "center",
            "originY": "center"
        });

        let obj: SerializedObject = serde_json::from_value(value).unwrap();
        let SerializedObject::OverlayImage(image) = obj else {
            panic!("expected an overlay image");
        };
        assert_eq!(image.transform.angle, 90.0);
        assert_eq!(image.origin_x, OriginX::Center);
        assert_eq!(image.image_data, None);
    }

    #[test]
    fn test_line_length_from_endpoints() {
        let line = SerializedLine {
            id: 1,
            name: "Fence".to_string(),
            transform: Transform::default(),
            color: "#333".to_string(),
            stroke_width: 3.0,
            x1: 0.0,
            y1: 0.0,
            x2: 30.0,
            y2: 40.0,
        };
        assert_eq!(line.length_m(10.0), 5.0);
        assert_eq!(line.length_m(0.0), 0.0);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let value = json!({"id": 1, "type": "triangle", "name": "x"});
        assert!(serde_json::from_value::<SerializedObject>(value).is_err());
    }
}
