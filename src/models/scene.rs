// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Live scene state.
//!
//! The scene owns the calibration, the background image and the ordered
//! object list (z-order, bottom to top). Editing front ends mutate it
//! through these methods and hand it to serialization as an immutable
//! borrow.

use super::object::{ImageObject, LineObject, MaskObject, ObjectId, PlannerObject, Point, ShapeObject};
use super::project::{LoadedProject, Project, SerializedObject};
use crate::error::SceneError;
use crate::io::serialization::{serialize_project, TransformProvider};
use crate::util::geometry::{distance, meters_to_pixels, pixels_to_meters, round_to_decimal, snap_to_45_degrees};

/// Decimal places shown in measurement labels.
const LABEL_DECIMALS: i32 = 2;

/// Result of drawing a line: its id and the snapped end point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedLine {
    pub id: ObjectId,
    pub end: Point,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pixels_per_meter: f64,
    background_image: Option<String>,
    objects: Vec<PlannerObject>,
    next_id: ObjectId,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    pub fn is_calibrated(&self) -> bool {
        self.pixels_per_meter > 0.0
    }

    pub fn background_image(&self) -> Option<&str> {
        self.background_image.as_deref()
    }

    pub fn set_background_image(&mut self, data_url: Option<String>) {
        self.background_image = data_url;
    }

    /// Objects in z-order, bottom to top.
    pub fn objects(&self) -> &[PlannerObject] {
        &self.objects
    }

    /// Objects listed to the user: everything above the cleanup band.
    pub fn visible_objects(&self) -> impl Iterator<Item = &PlannerObject> {
        self.objects.iter().filter(|o| !o.kind().is_cleanup())
    }

    pub fn get(&self, id: ObjectId) -> Option<&PlannerObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    /// Set the scale from a reference line of known real length.
    pub fn calibrate(&mut self, pixel_distance: f64, meters: f64) -> Result<f64, SceneError> {
        if !(pixel_distance.is_finite() && pixel_distance > 0.0) {
            return Err(SceneError::InvalidCalibration(format!(
                "reference line must be longer than zero pixels, got {pixel_distance}"
            )));
        }
        if !(meters.is_finite() && meters > 0.0) {
            return Err(SceneError::InvalidCalibration(format!(
                "reference distance must be a positive number of meters, got {meters}"
            )));
        }

        self.pixels_per_meter = pixel_distance / meters;
        log::info!("Calibrated: {:.3} px/m", self.pixels_per_meter);
        Ok(self.pixels_per_meter)
    }

    /// Add a rectangle of the given real-world size.
    pub fn add_shape(&mut self, name: &str, width_m: f64, height_m: f64, color: &str) -> Result<ObjectId, SceneError> {
        if !self.is_calibrated() {
            return Err(SceneError::NotCalibrated);
        }
        if !(width_m > 0.0 && height_m > 0.0) {
            return Err(SceneError::InvalidSize { width_m, height_m });
        }

        let id = self.allocate_id()?;
        self.insert(PlannerObject::Shape(ShapeObject {
            id,
            name: name.to_string(),
            width_m,
            height_m,
            color: color.to_string(),
            base_width_px: meters_to_pixels(width_m, self.pixels_per_meter),
            base_height_px: meters_to_pixels(height_m, self.pixels_per_meter),
        }));
        Ok(id)
    }

    /// Add a line from `start` towards `raw_end`, snapped to 45°.
    pub fn add_line(
        &mut self,
        name: &str,
        start: Point,
        raw_end: Point,
        color: &str,
        stroke_width: f64,
    ) -> Result<PlacedLine, SceneError> {
        if !self.is_calibrated() {
            return Err(SceneError::NotCalibrated);
        }

        let end = snap_to_45_degrees(start.x, start.y, raw_end.x, raw_end.y).point();
        let id = self.allocate_id()?;
        self.insert(PlannerObject::Line(LineObject {
            id,
            name: name.to_string(),
            length_m: pixels_to_meters(distance(start, end), self.pixels_per_meter),
            color: color.to_string(),
            stroke_width,
        }));
        Ok(PlacedLine { id, end })
    }

    pub fn add_mask(&mut self, name: &str) -> Result<ObjectId, SceneError> {
        let id = self.allocate_id()?;
        self.insert(PlannerObject::Mask(MaskObject {
            id,
            name: name.to_string(),
        }));
        Ok(id)
    }

    pub fn add_overlay_image(&mut self, name: &str, image_data: Option<String>) -> Result<ObjectId, SceneError> {
        let id = self.allocate_id()?;
        self.insert(PlannerObject::OverlayImage(ImageObject {
            id,
            name: name.to_string(),
            image_data,
        }));
        Ok(id)
    }

    /// Add an image that becomes part of the cleaned-up background.
    pub fn add_cleanup_image(&mut self, name: &str, image_data: Option<String>) -> Result<ObjectId, SceneError> {
        let id = self.allocate_id()?;
        self.insert(PlannerObject::BackgroundImage(ImageObject {
            id,
            name: name.to_string(),
            image_data,
        }));
        Ok(id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<PlannerObject> {
        let index = self.index_of(id)?;
        Some(self.objects.remove(index))
    }

    /// Remove shapes, lines and overlays. Cleanup objects stay.
    pub fn clear_all(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| o.kind().is_cleanup());
        before - self.objects.len()
    }

    /// Swap the object with the one above it, staying within its band.
    pub fn move_up(&mut self, id: ObjectId) -> Result<bool, SceneError> {
        let index = self.index_of(id).ok_or(SceneError::UnknownObject(id))?;
        let layer = self.objects[index].layer();
        match self.objects.get(index + 1) {
            Some(above) if above.layer() == layer => {
                self.objects.swap(index, index + 1);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Swap the object with the one below it, staying within its band.
    pub fn move_down(&mut self, id: ObjectId) -> Result<bool, SceneError> {
        let index = self.index_of(id).ok_or(SceneError::UnknownObject(id))?;
        if index == 0 {
            return Ok(false);
        }
        let layer = self.objects[index].layer();
        if self.objects[index - 1].layer() != layer {
            return Ok(false);
        }
        self.objects.swap(index, index - 1);
        Ok(true)
    }

    /// Restore band order: masks, then cleanup images, then everything else.
    pub fn reorder(&mut self) {
        self.objects.sort_by_key(PlannerObject::layer);
    }

    pub fn shape_label(shape: &ShapeObject) -> String {
        format!(
            "{} m × {} m",
            round_to_decimal(shape.width_m, LABEL_DECIMALS),
            round_to_decimal(shape.height_m, LABEL_DECIMALS)
        )
    }

    pub fn line_label(line: &LineObject) -> String {
        format!("{} m", round_to_decimal(line.length_m, LABEL_DECIMALS))
    }

    /// Snapshot the scene as a project document.
    pub fn snapshot<P>(&self, provider: &P) -> Project
    where
        P: TransformProvider + ?Sized,
    {
        let mut project = serialize_project(self.pixels_per_meter, self.background_image(), &self.objects, provider);
        project.next_id = Some(self.next_id);
        project
    }

    /// Rebuild a scene from a loaded document.
    pub fn restore(loaded: &LoadedProject) -> Self {
        let ppm = loaded.pixels_per_meter;
        let objects: Vec<PlannerObject> = loaded
            .serialized_objects
            .iter()
            .map(|record| match record {
                SerializedObject::Shape(s) => PlannerObject::Shape(ShapeObject {
                    id: s.id,
                    name: s.name.clone(),
                    width_m: s.width_m,
                    height_m: s.height_m,
                    color: s.color.clone(),
                    base_width_px: s.base_width_px,
                    base_height_px: s.base_height_px,
                }),
                SerializedObject::Line(l) => PlannerObject::Line(LineObject {
                    id: l.id,
                    name: l.name.clone(),
                    length_m: l.length_m(ppm),
                    color: l.color.clone(),
                    stroke_width: l.stroke_width,
                }),
                SerializedObject::Mask(m) => PlannerObject::Mask(MaskObject {
                    id: m.id,
                    name: m.name.clone(),
                }),
                SerializedObject::OverlayImage(i) => PlannerObject::OverlayImage(ImageObject {
                    id: i.id,
                    name: i.name.clone(),
                    image_data: i.image_data.clone(),
                }),
                SerializedObject::BackgroundImage(i) => PlannerObject::BackgroundImage(ImageObject {
                    id: i.id,
                    name: i.name.clone(),
                    image_data: i.image_data.clone(),
                }),
            })
            .collect();

        let above_ids = objects.iter().map(|o| o.id().saturating_add(1)).max().unwrap_or(0);
        let next_id = loaded.next_id.map_or(above_ids, |n| n.max(above_ids));
        let mut scene = Self {
            pixels_per_meter: ppm,
            background_image: loaded.background_image_data.clone(),
            objects,
            next_id,
        };
        scene.reorder();
        log::info!("Restored scene with {} objects", scene.objects.len());
        scene
    }

    /// `ObjectId::MAX` is never handed out, so the counter cannot wrap.
    fn allocate_id(&mut self) -> Result<ObjectId, SceneError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(SceneError::IdsExhausted)?;
        Ok(id)
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    /// Insert at the top of the object's band.
    fn insert(&mut self, object: PlannerObject) {
        let layer = object.layer();
        let index = self.objects.partition_point(|o| o.layer() <= layer);
        self.objects.insert(index, object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::object::{LiveState, ObjectKind, OriginX, OriginY, Transform};
    use crate::io::serialization::deserialize_project;

    fn calibrated() -> Scene {
        let mut scene = Scene::new();
        scene.calibrate(500.0, 10.0).unwrap();
        scene
    }

    fn kinds(scene: &Scene) -> Vec<ObjectKind> {
        scene.objects().iter().map(PlannerObject::kind).collect()
    }

    fn live_state(object: &PlannerObject) -> LiveState {
        match object {
            PlannerObject::Shape(s) => LiveState::Rect {
                transform: Transform::at(10.0, 10.0),
                width: s.base_width_px,
                height: s.base_height_px,
                base_width_px: Some(s.base_width_px),
                base_height_px: Some(s.base_height_px),
            },
            PlannerObject::Mask(_) => LiveState::Rect {
                transform: Transform::default(),
                width: 20.0,
                height: 20.0,
                base_width_px: None,
                base_height_px: None,
            },
            PlannerObject::Line(l) => LiveState::Line {
                transform: Transform::default(),
                start: Point::new(0.0, 0.0),
                end: Point::new(meters_to_pixels(l.length_m, 50.0), 0.0),
                stroke_width: l.stroke_width,
            },
            PlannerObject::OverlayImage(_) | PlannerObject::BackgroundImage(_) => LiveState::Image {
                transform: Transform::default(),
                origin_x: OriginX::Left,
                origin_y: OriginY::Top,
            },
        }
    }

    #[test]
    fn test_calibration() {
        let mut scene = Scene::new();
        assert!(!scene.is_calibrated());
        assert_eq!(scene.calibrate(500.0, 10.0), Ok(50.0));
        assert!(scene.calibrate(0.0, 10.0).is_err());
        assert!(scene.calibrate(100.0, -1.0).is_err());
        assert_eq!(scene.pixels_per_meter(), 50.0);
    }

    #[test]
    fn test_shapes_require_calibration_and_size() {
        let mut scene = Scene::new();
        assert_eq!(scene.add_shape("Bed", 2.0, 1.0, "red"), Err(SceneError::NotCalibrated));

        let mut scene = calibrated();
        assert!(matches!(scene.add_shape("Bed", 0.0, 1.0, "red"), Err(SceneError::InvalidSize { .. })));

        let id = scene.add_shape("Bed", 2.0, 1.5, "red").unwrap();
        let Some(PlannerObject::Shape(shape)) = scene.get(id) else {
            panic!("expected a shape");
        };
        assert_eq!(shape.base_width_px, 100.0);
        assert_eq!(shape.base_height_px, 75.0);
        assert_eq!(Scene::shape_label(shape), "2 m × 1.5 m");
    }

    #[test]
    fn test_line_is_snapped_and_measured() {
        let mut scene = calibrated();
        let placed = scene
            .add_line("Path", Point::new(0.0, 0.0), Point::new(150.0, 4.0), "#333", 3.0)
            .unwrap();
        assert!(placed.end.y.abs() < 1e-9);

        let Some(PlannerObject::Line(line)) = scene.get(placed.id) else {
            panic!("expected a line");
        };
        assert!((line.length_m - distance(Point::new(0.0, 0.0), Point::new(150.0, 4.0)) / 50.0).abs() < 1e-12);
        assert_eq!(Scene::line_label(line), "3 m");
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut scene = calibrated();
        let a = scene.add_shape("A", 1.0, 1.0, "red").unwrap();
        let b = scene.add_mask("Mask").unwrap();
        scene.remove(b).unwrap();
        let c = scene.add_overlay_image("Img", None).unwrap();
        assert_eq!((a, b, c), (0, 1, 2));
        assert!(scene.get(b).is_none());
    }

    #[test]
    fn test_cleanup_objects_stay_beneath() {
        let mut scene = calibrated();
        scene.add_shape("A", 1.0, 1.0, "red").unwrap();
        scene.add_cleanup_image("Patch", None).unwrap();
        scene.add_overlay_image("Tree", None).unwrap();
        scene.add_mask("Mask").unwrap();

        assert_eq!(
            kinds(&scene),
            vec![ObjectKind::Mask, ObjectKind::BackgroundImage, ObjectKind::Shape, ObjectKind::OverlayImage]
        );
        assert_eq!(scene.visible_objects().count(), 2);
    }

    #[test]
    fn test_move_within_band() {
        let mut scene = calibrated();
        let mask = scene.add_mask("Mask").unwrap();
        let a = scene.add_shape("A", 1.0, 1.0, "red").unwrap();
        let b = scene.add_shape("B", 1.0, 1.0, "blue").unwrap();

        assert_eq!(scene.move_down(a), Ok(false));
        assert_eq!(scene.move_up(a), Ok(true));
        assert_eq!(scene.objects()[2].id(), a);
        assert_eq!(scene.move_up(a), Ok(false));
        assert_eq!(scene.move_down(a), Ok(true));
        assert_eq!(scene.objects()[2].id(), b);
        assert_eq!(scene.move_up(mask), Ok(false));
        assert_eq!(scene.move_up(99), Err(SceneError::UnknownObject(99)));
    }

    #[test]
    fn test_clear_all_keeps_cleanup() {
        let mut scene = calibrated();
        scene.add_mask("Mask").unwrap();
        scene.add_shape("A", 1.0, 1.0, "red").unwrap();
        scene.add_cleanup_image("Patch", None).unwrap();
        scene.add_line("L", Point::new(0.0, 0.0), Point::new(10.0, 0.0), "#333", 3.0).unwrap();
        assert_eq!(scene.clear_all(), 2);
        assert_eq!(kinds(&scene), vec![ObjectKind::Mask, ObjectKind::BackgroundImage]);
        assert_eq!(scene.visible_objects().count(), 0);
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut scene = calibrated();
        scene.set_background_image(Some("data:image/png;base64,abc".to_string()));
        scene.add_mask("Mask").unwrap();
        scene.add_shape("Patio", 4.0, 3.0, "rgba(46, 204, 113, 0.6)").unwrap();
        scene.add_line("Fence", Point::new(0.0, 0.0), Point::new(100.0, 100.0), "#e74c3c", 3.0).unwrap();
        let removed = scene
            .add_overlay_image("Tree", Some("data:image/png;base64,def".to_string()))
            .unwrap();
        scene.remove(removed);

        let provider = |id: ObjectId| scene.get(id).map(live_state);
        let project = scene.snapshot(&provider);
        let loaded = deserialize_project(serde_json::to_value(&project).unwrap()).unwrap();
        let restored = Scene::restore(&loaded);

        assert_eq!(restored.pixels_per_meter(), 50.0);
        assert_eq!(restored.background_image(), scene.background_image());
        assert_eq!(restored.objects().len(), 3);
        for (a, b) in restored.objects().iter().zip(scene.objects()) {
            assert_eq!(a.id(), b.id());
            assert_eq!(a.kind(), b.kind());
            assert_eq!(a.name(), b.name());
        }

        let (Some(PlannerObject::Line(before)), Some(PlannerObject::Line(after))) = (scene.get(2), restored.get(2))
        else {
            panic!("expected the line to survive");
        };
        assert!((before.length_m - after.length_m).abs() < 1e-9);

        // The deleted overlay's id stays retired.
        assert_eq!(loaded.next_id, Some(4));
        let mut restored = restored;
        assert_eq!(restored.add_mask("Another"), Ok(4));
    }

    #[test]
    fn test_restore_without_saved_counter() {
        let mut scene = calibrated();
        scene.add_mask("Mask").unwrap();
        scene.add_mask("Mask").unwrap();
        let provider = |id: ObjectId| scene.get(id).map(live_state);
        let mut project = scene.snapshot(&provider);
        project.next_id = None;

        let loaded = deserialize_project(serde_json::to_value(&project).unwrap()).unwrap();
        let mut restored = Scene::restore(&loaded);
        assert_eq!(restored.add_mask("Third"), Ok(2));
    }

    #[test]
    fn test_id_counter_runs_out_without_wrapping() {
        let mut scene = calibrated();
        scene.add_mask("Mask").unwrap();
        let provider = |id: ObjectId| scene.get(id).map(live_state);
        let mut project = scene.snapshot(&provider);
        project.next_id = Some(ObjectId::MAX - 1);

        let loaded = deserialize_project(serde_json::to_value(&project).unwrap()).unwrap();
        let mut restored = Scene::restore(&loaded);
        assert_eq!(restored.add_mask("Last"), Ok(ObjectId::MAX - 1));
        assert_eq!(restored.add_mask("One more"), Err(SceneError::IdsExhausted));
        assert_eq!(restored.add_shape("Bed", 1.0, 1.0, "red"), Err(SceneError::IdsExhausted));
        assert_eq!(restored.objects().len(), 2);
    }

    #[test]
    fn test_restore_with_highest_id_does_not_overflow() {
        let loaded = LoadedProject {
            pixels_per_meter: 50.0,
            background_image_data: None,
            saved_at: time::OffsetDateTime::UNIX_EPOCH,
            serialized_objects: vec![SerializedObject::Mask(crate::models::project::SerializedMask {
                id: ObjectId::MAX,
                name: "Mask".to_string(),
                transform: Transform::default(),
                width: 10.0,
                height: 10.0,
            })],
            next_id: None,
        };

        let mut scene = Scene::restore(&loaded);
        assert_eq!(scene.objects().len(), 1);
        assert_eq!(scene.add_mask("Another"), Err(SceneError::IdsExhausted));
    }
}
