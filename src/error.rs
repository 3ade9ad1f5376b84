// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for documents and scene editing.

use crate::models::object::ObjectId;

/// A project document that cannot be loaded.
///
/// Anything in this class is reported to the user as "could not load
/// project"; the caller keeps its current scene untouched.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("project version {found} is not supported (this build reads versions 1 to {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("object id {0} appears more than once")]
    DuplicateId(ObjectId),
    #[error("object {id}: type `{kind}` does not exist in version {version} documents")]
    UnknownObjectType { id: String, kind: String, version: u64 },
    #[error("malformed project document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("malformed YAML project document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Misuse of the scene editing operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("set the scale first: the scene is not calibrated")]
    NotCalibrated,
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),
    #[error("shape size must be positive, got {width_m} m x {height_m} m")]
    InvalidSize { width_m: f64, height_m: f64 },
    #[error("no object with id {0}")]
    UnknownObject(ObjectId),
    #[error("no object ids left to hand out")]
    IdsExhausted,
}
