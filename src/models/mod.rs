// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: scene objects, the live scene and the project document.

pub mod object;
pub mod project;
pub mod scene;
