use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
};

use crate::{acquisition::camera::FacingMode, inference::StrategyKind};

const ENABLE_LOGS: bool = true;
use crate::log_warn;

pub const PROFILE_KEY: &str = "userProfile";
pub const SETTINGS_KEY: &str = "appSettings";

/// Key/value persistence for small JSON blobs.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Option<Value>;
    fn save(&self, key: &str, value: Value) -> Result<()>;
}

/// Every key lives in one pretty-printed JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read preferences from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("ignoring unreadable preferences file {}: {}", path.display(), err);
                Map::new()
            })
        } else {
            Map::new()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write preferences to {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Option<Value> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn save(&self, key: &str, value: Value) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let previous = guard.insert(key.to_string(), value);
        if let Err(err) = self.persist(&guard) {
            // Keep memory and disk in agreement when the write fails.
            match previous {
                Some(previous) => guard.insert(key.to_string(), previous),
                None => guard.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub company: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "John Doe".into(),
            email: "john.doe@example.com".into(),
            company: "Acme Industries".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ModelVersion {
    #[default]
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,
    #[serde(rename = "gemini-pro")]
    GeminiPro,
}

impl ModelVersion {
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelVersion::Gemini20Flash => "gemini-2.0-flash",
            ModelVersion::GeminiPro => "gemini-pro",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub default_camera: FacingMode,
    pub email_notifications: bool,
    pub model_version: ModelVersion,
    pub inspection_mode: StrategyKind,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_camera: FacingMode::Environment,
            email_notifications: true,
            model_version: ModelVersion::default(),
            inspection_mode: StrategyKind::default(),
        }
    }
}

/// Cached profile and settings, written through to a [`KeyValueStore`].
pub struct Preferences {
    store: Box<dyn KeyValueStore>,
    profile: RwLock<UserProfile>,
    settings: RwLock<AppSettings>,
}

impl Preferences {
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let profile = read_or_default(store.as_ref(), PROFILE_KEY);
        let settings = read_or_default(store.as_ref(), SETTINGS_KEY);
        Self {
            store,
            profile: RwLock::new(profile),
            settings: RwLock::new(settings),
        }
    }

    pub fn profile(&self) -> UserProfile {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn settings(&self) -> AppSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn save_profile(&self, profile: UserProfile) -> Result<()> {
        let mut guard = self.profile.write().unwrap_or_else(PoisonError::into_inner);
        self.store.save(PROFILE_KEY, serde_json::to_value(&profile)?)?;
        *guard = profile;
        Ok(())
    }

    pub fn save_settings(&self, settings: AppSettings) -> Result<()> {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        self.store.save(SETTINGS_KEY, serde_json::to_value(&settings)?)?;
        *guard = settings;
        Ok(())
    }
}

fn read_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    let Some(value) = store.load(key) else {
        return T::default();
    };
    serde_json::from_value(value).unwrap_or_else(|err| {
        log_warn!("stored {} is unreadable, using defaults: {}", key, err);
        T::default()
    })
}
