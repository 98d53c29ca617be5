use anyhow::{bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

pub const DATA_DIR_ENV: &str = "CAREBOARD_DATA_DIR";
pub const DEBUG_ENV: &str = "CAREBOARD_DEBUG";

const MIN_POLL_INTERVAL_MS: u64 = 100;
const DEBUG_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// How often the staff dashboard re-reads the page store.
    pub poll_interval_ms: u64,
    /// Identity used by the patient console until a name is set.
    pub default_patient_name: String,
    /// SQLite file name, relative to the data directory.
    pub database_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            default_patient_name: "Karan S.".into(),
            database_file: "careboard.sqlite3".into(),
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

pub fn debug_mode() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Explicit flag, then `CAREBOARD_DATA_DIR`, then the platform data directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|base| base.join("careboard"))
        .context("no data directory available; pass --data-dir or set CAREBOARD_DATA_DIR")
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "ignoring malformed settings in {}, using defaults: {err}",
                    path.display()
                );
                Settings::default()
            })
        } else if debug_mode() {
            Settings {
                poll_interval_ms: DEBUG_POLL_INTERVAL_MS,
                ..Settings::default()
            }
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> Settings {
        self.read().clone()
    }

    pub fn poll_interval(&self) -> Duration {
        self.read().poll_interval()
    }

    pub fn default_patient_name(&self) -> String {
        self.read().default_patient_name.clone()
    }

    pub fn update_poll_interval(&self, poll_interval_ms: u64) -> Result<()> {
        if poll_interval_ms < MIN_POLL_INTERVAL_MS {
            bail!("poll interval must be at least {MIN_POLL_INTERVAL_MS} ms");
        }
        let mut guard = self.write();
        guard.poll_interval_ms = poll_interval_ms;
        self.persist(&guard)
    }

    pub fn update_default_patient_name(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("default patient name cannot be empty");
        }
        let mut guard = self.write();
        guard.default_patient_name = name.to_string();
        self.persist(&guard)
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
