use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::{models::ViewingAngle, tour::registry::DEFAULT_MAX_IMAGE_BYTES};

/// Initial camera for a freshly selected panorama.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewerSettings {
    pub pitch: f64,
    pub yaw: f64,
    pub hfov: f64,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            pitch: 10.0,
            yaw: 180.0,
            hfov: 110.0,
        }
    }
}

impl ViewerSettings {
    pub fn default_view(&self) -> ViewingAngle {
        ViewingAngle::new(self.pitch, self.yaw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadSettings {
    pub max_image_bytes: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    viewer: ViewerSettings,
    uploads: UploadSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn viewer(&self) -> ViewerSettings {
        self.read().viewer.clone()
    }

    pub fn uploads(&self) -> UploadSettings {
        self.read().uploads.clone()
    }

    pub fn update_viewer(&self, settings: ViewerSettings) -> Result<()> {
        let mut guard = self.write();
        guard.viewer = settings;
        self.persist(&guard)
    }

    pub fn update_uploads(&self, settings: UploadSettings) -> Result<()> {
        let mut guard = self.write();
        guard.uploads = settings;
        self.persist(&guard)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, UserSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.viewer(), ViewerSettings::default());
        assert_eq!(store.uploads().max_image_bytes, DEFAULT_MAX_IMAGE_BYTES);
    }

    #[test]
    fn updates_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_viewer(ViewerSettings {
                pitch: 0.0,
                yaw: 90.0,
                hfov: 100.0,
            })
            .unwrap();
        store
            .update_uploads(UploadSettings {
                max_image_bytes: 1024,
            })
            .unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.viewer().yaw, 90.0);
        assert_eq!(reloaded.uploads().max_image_bytes, 1024);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"uploads":{"maxImageBytes":2048}}"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.uploads().max_image_bytes, 2048);
        assert_eq!(store.viewer(), ViewerSettings::default());
    }
}
