// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Pure conversions between pixel space and metric space, 45° angle
//! snapping for drawn lines and scale factors for fitting images onto the
//! canvas. None of these functions fail: degenerate input (for example a
//! zero calibration ratio) yields `inf`/`NaN` per IEEE-754 and guarding
//! against it is the caller's job.

use crate::models::object::Point;
use std::f64::consts::FRAC_PI_4;

/// Share of the canvas a background image is fitted into.
const BACKGROUND_FIT_RATIO: f64 = 0.9;

/// Share of the smaller canvas side an overlay image may occupy.
const OVERLAY_FIT_RATIO: f64 = 0.5;

/// End point of a line after snapping, with its angle in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnappedPoint {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

impl SnappedPoint {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Snap a dragged end point to the nearest multiple of 45° around the
/// origin, keeping its distance from the origin.
pub fn snap_to_45_degrees(origin_x: f64, origin_y: f64, target_x: f64, target_y: f64) -> SnappedPoint {
    let dx = target_x - origin_x;
    let dy = target_y - origin_y;
    let length = (dx * dx + dy * dy).sqrt();

    // Ties go away from zero, so 22.5° lands on 45°.
    let angle = (dy.atan2(dx) / FRAC_PI_4).round() * FRAC_PI_4;

    SnappedPoint {
        x: origin_x + length * angle.cos(),
        y: origin_y + length * angle.sin(),
        angle,
    }
}

/// Convert a pixel length to meters.
pub fn pixels_to_meters(pixels: f64, pixels_per_meter: f64) -> f64 {
    pixels / pixels_per_meter
}

/// Convert a metric length to pixels.
pub fn meters_to_pixels(meters: f64, pixels_per_meter: f64) -> f64 {
    meters * pixels_per_meter
}

/// Round to a number of decimal places, halves rounding up.
pub fn round_to_decimal(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    round_half_up(value * factor) / factor
}

fn round_half_up(value: f64) -> f64 {
    let rounded = value.round();
    // f64::round sends negative halves away from zero (-2.5 -> -3).
    if rounded - value == -0.5 {
        rounded + 1.0
    } else {
        rounded
    }
}

/// Point halfway between `a` and `b`.
pub fn midpoint(a: Point, b: Point) -> Point {
    Point {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Scale that fits an image into 90% of the canvas, preserving aspect ratio.
/// Small images are scaled up.
pub fn fit_image_scale(image_width: f64, image_height: f64, canvas_width: f64, canvas_height: f64) -> f64 {
    let scale_x = canvas_width * BACKGROUND_FIT_RATIO / image_width;
    let scale_y = canvas_height * BACKGROUND_FIT_RATIO / image_height;
    scale_x.min(scale_y)
}

/// Starting scale for a pasted overlay image: its larger side fits into half
/// of the smaller canvas side, and it is never scaled up.
pub fn overlay_image_scale(image_width: f64, image_height: f64, canvas_width: f64, canvas_height: f64) -> f64 {
    let max_size = canvas_width.min(canvas_height) * OVERLAY_FIT_RATIO;
    (max_size / image_width.max(image_height)).min(1.0)
}
