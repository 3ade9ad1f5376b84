// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project persistence.
//!
//! There is only ever one saved project: it lives under a single well-known
//! key and every save overwrites it. Loading runs the stored document
//! through the same migration path as a file import.

use crate::io::serialization::parse_json;
use crate::models::project::{LoadedProject, Project};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key the current project is stored under.
pub const STORAGE_KEY: &str = "current-project";

/// A keyed slot store for serialized documents.
pub trait ProjectStore {
    /// Contents stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace whatever is stored under `key`.
    fn write(&self, key: &str, contents: &str) -> Result<()>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as a JSON file inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("could not create storage directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ProjectStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("could not read {}", path.display())),
        }
    }

    fn write(&self, key: &str, contents: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).with_context(|| format!("could not write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("could not replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("could not remove {}", path.display())),
        }
    }
}

/// In-memory store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.slots.lock().map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl ProjectStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots()?.get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<()> {
        self.slots()?.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.slots()?.remove(key);
        Ok(())
    }
}

/// Save the project, replacing any previously saved one.
pub fn save_project<S: ProjectStore + ?Sized>(store: &S, project: &Project) -> Result<()> {
    let json = serde_json::to_string(project)?;
    store.write(STORAGE_KEY, &json)?;
    info!("Saved project with {} objects", project.objects.len());
    Ok(())
}

/// Load the saved project. `Ok(None)` means nothing has been saved.
pub fn load_project<S: ProjectStore + ?Sized>(store: &S) -> Result<Option<LoadedProject>> {
    let Some(json) = store.read(STORAGE_KEY)? else {
        debug!("No saved project found");
        return Ok(None);
    };
    let loaded = parse_json(&json).context("could not load project")?;
    Ok(Some(loaded))
}

/// Delete the saved project.
pub fn clear_project<S: ProjectStore + ?Sized>(store: &S) -> Result<()> {
    store.remove(STORAGE_KEY)?;
    info!("Cleared saved project");
    Ok(())
}

/// The saved project if there is a readable one. Load failures are logged
/// and reported as "nothing saved".
pub fn check_project_exists<S: ProjectStore + ?Sized>(store: &S) -> Option<LoadedProject> {
    load_project(store).unwrap_or_else(|e| {
        warn!("Ignoring unreadable saved project: {:#}", e);
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::{SerializedObject, SerializedShape, CURRENT_VERSION};
    use crate::models::object::Transform;
    use time::OffsetDateTime;

    fn test_project(pixels_per_meter: f64) -> Project {
        Project {
            version: CURRENT_VERSION,
            pixels_per_meter,
            background_image: Some("data:image/png;base64,abc".to_string()),
            saved_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            objects: vec![SerializedObject::Shape(SerializedShape {
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
            })],
            next_id: Some(1),
        }
    }

    fn exercise(store: &dyn ProjectStore) {
        assert!(load_project(store).unwrap().is_none());
        assert!(check_project_exists(store).is_none());

        save_project(store, &test_project(50.0)).unwrap();
        let loaded = load_project(store).unwrap().expect("saved project");
        assert_eq!(loaded.pixels_per_meter, 50.0);
        assert_eq!(loaded.serialized_objects, test_project(50.0).objects);
        assert!(check_project_exists(store).is_some());

        save_project(store, &test_project(100.0)).unwrap();
        let loaded = load_project(store).unwrap().expect("saved project");
        assert_eq!(loaded.pixels_per_meter, 100.0);

        clear_project(store).unwrap();
        assert!(load_project(store).unwrap().is_none());
        clear_project(store).unwrap();
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();
        exercise(&store);
        assert!(!store.dir().join("current-project.json").exists());
    }

    #[test]
    fn test_stored_old_version_is_migrated() {
        let store = MemoryStore::new();
        let v1 = r#"{"version":1,"pixelsPerMeter":20,"objects":[
            {"id":0,"type":"shape","name":"Shed","widthM":3,"heightM":2,"color":"brown"}]}"#;
        store.write(STORAGE_KEY, v1).unwrap();

        let loaded = load_project(&store).unwrap().expect("saved project");
        let SerializedObject::Shape(shape) = &loaded.serialized_objects[0] else {
            panic!("expected a shape");
        };
        assert_eq!(shape.base_width_px, 60.0);
    }

    #[test]
    fn test_unreadable_project() {
        let store = MemoryStore::new();
        store.write(STORAGE_KEY, r#"{"version":9,"objects":[]}"#).unwrap();
        assert!(load_project(&store).is_err());
        assert!(check_project_exists(&store).is_none());

        store.write(STORAGE_KEY, "not json").unwrap();
        assert!(load_project(&store).is_err());
    }
}
