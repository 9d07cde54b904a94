use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::models::{Category, ConfigError};

pub const SETTINGS_FILE_NAME: &str = "collector_settings.json";

/// Sample-count goals for the whole project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Targets {
    pub per_category: u32,
    pub per_contributor: u32,
    pub project: u32,
    pub single: u32,
    pub validation: u32,
    pub debug: u32,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            per_category: 500,
            per_contributor: 5000,
            project: 25000,
            single: 100,
            validation: 20,
            debug: 50,
        }
    }
}

/// Where frames and landmarks come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeedSpec {
    /// Random detections; exercises the pipeline without a camera.
    Synthetic {
        /// Per-group presence probability: pose, face, left hand, right hand.
        presence: [f64; 4],
        seed: Option<u64>,
    },
    /// JSON-lines detection records read from a file.
    File { path: PathBuf },
    /// JSON-lines detection records read from an external landmarker's stdout.
    Command { program: String, args: Vec<String> },
}

impl Default for FeedSpec {
    fn default() -> Self {
        FeedSpec::Synthetic {
            presence: [0.95, 0.9, 0.6, 0.6],
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectorSettings {
    pub targets: Targets,
    /// Minimum quality score (0-100) for a frame to be persisted.
    pub quality_threshold: u8,
    /// Relaxed threshold used by debug sessions.
    pub debug_quality_threshold: u8,
    pub debug_category: Category,
    /// Print a low-quality diagnostic every N rejected frames.
    pub low_quality_report_every: u64,
    /// Pause between frames for feeds that are not paced by hardware.
    pub frame_interval_ms: u64,
    pub feed: FeedSpec,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            targets: Targets::default(),
            quality_threshold: 50,
            debug_quality_threshold: 25,
            debug_category: Category::GoodPosture,
            low_quality_report_every: 60,
            frame_interval_ms: 33,
            feed: FeedSpec::default(),
        }
    }
}

impl CollectorSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality_threshold > 100 || self.debug_quality_threshold > 100 {
            return Err(ConfigError::InvalidSetting(
                "quality thresholds must be within 0-100".into(),
            ));
        }
        if self.debug_quality_threshold >= self.quality_threshold {
            return Err(ConfigError::InvalidSetting(
                "debug quality threshold must be below the regular threshold".into(),
            ));
        }
        let t = &self.targets;
        if [t.per_category, t.per_contributor, t.project, t.single, t.validation, t.debug]
            .contains(&0)
        {
            return Err(ConfigError::InvalidSetting(
                "all sample targets must be greater than zero".into(),
            ));
        }
        if let FeedSpec::Synthetic { presence, .. } = &self.feed {
            if presence.iter().any(|p| !(0.0..=1.0).contains(p)) {
                return Err(ConfigError::InvalidSetting(
                    "synthetic presence probabilities must be within 0-1".into(),
                ));
            }
        }
        Ok(())
    }

    /// Switch to random detections, keeping a synthetic feed that is already
    /// configured.
    pub fn use_synthetic_feed(&mut self) {
        if !matches!(self.feed, FeedSpec::Synthetic { .. }) {
            self.feed = FeedSpec::default();
        }
    }
}

/// JSON-backed settings file.
pub struct SettingsStore {
    path: PathBuf,
    data: CollectorSettings,
}

impl SettingsStore {
    /// Load from `path`, falling back to defaults when the file is absent or
    /// cannot be parsed.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unparseable settings in {}: {err}; using defaults",
                    path.display()
                );
                CollectorSettings::default()
            })
        } else {
            CollectorSettings::default()
        };

        data.validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        Ok(Self { path, data })
    }

    pub fn default_path(dataset_dir: &Path) -> PathBuf {
        dataset_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.data
    }

    pub fn settings_mut(&mut self) -> &mut CollectorSettings {
        &mut self.data
    }

    pub fn into_settings(self) -> CollectorSettings {
        self.data
    }

    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
