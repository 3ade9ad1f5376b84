// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene object data structures.
//!
//! This module defines the logical objects a planner scene is made of
//! (shapes, lines, images and cleanup masks) together with the pixel
//! transforms the rendering surface reports for them.

use serde::{Deserialize, Serialize};

/// Stable object identifier, unique for the lifetime of a document.
pub type ObjectId = u32;

/// A 2D point in pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Discriminant of a scene object, matching the `type` tag of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    Shape,
    Line,
    Mask,
    OverlayImage,
    BackgroundImage,
}

/// Rendering band an object belongs to.
///
/// Cleanup objects (masks and cleanup images) always sit beneath the
/// interactive ones. Ordering of the variants is the bottom-to-top order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Mask,
    CleanupImage,
    Interactive,
}

impl ObjectKind {
    pub fn layer(self) -> Layer {
        match self {
            ObjectKind::Mask => Layer::Mask,
            ObjectKind::BackgroundImage => Layer::CleanupImage,
            ObjectKind::Shape | ObjectKind::Line | ObjectKind::OverlayImage => Layer::Interactive,
        }
    }

    /// Whether objects of this kind belong to the cleanup band.
    pub fn is_cleanup(self) -> bool {
        self.layer() != Layer::Interactive
    }
}

/// A rectangle measured in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeObject {
    pub id: ObjectId,
    pub name: String,
    pub width_m: f64,
    pub height_m: f64,
    pub color: String,
    /// Pixel size at creation time (metric size times pixels per meter).
    pub base_width_px: f64,
    pub base_height_px: f64,
}

/// A straight measured line. The length is derived from its endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineObject {
    pub id: ObjectId,
    pub name: String,
    pub length_m: f64,
    pub color: String,
    pub stroke_width: f64,
}

/// A cleanup rectangle painted over the background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskObject {
    pub id: ObjectId,
    pub name: String,
}

/// An image placed on the canvas, either as an overlay or as part of the
/// cleanup band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub id: ObjectId,
    pub name: String,
    pub image_data: Option<String>,
}

/// A logical scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlannerObject {
    Shape(ShapeObject),
    Line(LineObject),
    Mask(MaskObject),
    OverlayImage(ImageObject),
    BackgroundImage(ImageObject),
}

impl PlannerObject {
    pub fn id(&self) -> ObjectId {
        match self {
            PlannerObject::Shape(s) => s.id,
            PlannerObject::Line(l) => l.id,
            PlannerObject::Mask(m) => m.id,
            PlannerObject::OverlayImage(i) | PlannerObject::BackgroundImage(i) => i.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PlannerObject::Shape(s) => &s.name,
            PlannerObject::Line(l) => &l.name,
            PlannerObject::Mask(m) => &m.name,
            PlannerObject::OverlayImage(i) | PlannerObject::BackgroundImage(i) => &i.name,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            PlannerObject::Shape(_) => ObjectKind::Shape,
            PlannerObject::Line(_) => ObjectKind::Line,
            PlannerObject::Mask(_) => ObjectKind::Mask,
            PlannerObject::OverlayImage(_) => ObjectKind::OverlayImage,
            PlannerObject::BackgroundImage(_) => ObjectKind::BackgroundImage,
        }
    }

    pub fn layer(&self) -> Layer {
        self.kind().layer()
    }
}

/// Pixel transform of a rendered object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in degrees.
    pub angle: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
        }
    }
}

impl Transform {
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            ..Self::default()
        }
    }
}

/// Horizontal anchor of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchor of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Live state reported by the rendering surface for one object.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveState {
    /// Shapes and masks.
    Rect {
        transform: Transform,
        width: f64,
        height: f64,
        base_width_px: Option<f64>,
        base_height_px: Option<f64>,
    },
    Line {
        transform: Transform,
        start: Point,
        end: Point,
        stroke_width: f64,
    },
    /// Overlay and cleanup images.
    Image {
        transform: Transform,
        origin_x: OriginX,
        origin_y: OriginY,
    },
}

impl LiveState {
    pub fn transform(&self) -> &Transform {
        match self {
            LiveState::Rect { transform, .. }
            | LiveState::Line { transform, .. }
            | LiveState::Image { transform, .. } => transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_order_cleanup_first() {
        assert!(ObjectKind::Mask.layer() < ObjectKind::BackgroundImage.layer());
        assert!(ObjectKind::BackgroundImage.layer() < ObjectKind::Shape.layer());
        assert_eq!(ObjectKind::Line.layer(), ObjectKind::OverlayImage.layer());
        assert!(ObjectKind::Mask.is_cleanup());
        assert!(!ObjectKind::OverlayImage.is_cleanup());
    }

    #[test]
    fn test_kind_tags_match_document() {
        let json = serde_json::to_string(&ObjectKind::OverlayImage).unwrap();
        assert_eq!(json, "\"overlayImage\"");
        let kind: ObjectKind = serde_json::from_str("\"backgroundImage\"").unwrap();
        assert_eq!(kind, ObjectKind::BackgroundImage);
    }

    #[test]
    fn test_object_accessors() {
        let obj = PlannerObject::Line(LineObject {
            id: 7,
            name: "fence".to_string(),
            length_m: 4.0,
            color: "#e74c3c".to_string(),
            stroke_width: 3.0,
        });
        assert_eq!(obj.id(), 7);
        assert_eq!(obj.name(), "fence");
        assert_eq!(obj.kind(), ObjectKind::Line);
        assert_eq!(obj.layer(), Layer::Interactive);
    }

    #[test]
    fn test_transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.scale_x, 1.0);
        assert_eq!(t.scale_y, 1.0);
        assert_eq!(t.angle, 0.0);
        assert_eq!(Transform::at(5.0, 6.0).left, 5.0);
    }
}
