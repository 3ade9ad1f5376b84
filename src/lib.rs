// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! scaleplan - scale diagram planner
//!
//! Calibrate a pixels-per-meter ratio against a background image, then
//! place shapes, measured lines, overlay images and cleanup masks. The
//! crate provides the geometry (unit conversion, 45° snapping, image
//! fitting), the versioned project document with its migrations, and
//! persistence of the single saved project.

pub mod app;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod util;

pub use error::{ProjectError, SceneError};
pub use io::serialization::{deserialize_project, serialize_project, TransformProvider};
pub use models::object::{LiveState, ObjectId, PlannerObject, Point};
pub use models::project::{LoadedProject, Project, SerializedObject, CURRENT_VERSION};
pub use models::scene::Scene;
