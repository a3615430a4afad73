use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{InterpretationMode, Theme};

pub const DEFAULT_ROSTER: &str = "samples.json";
pub const DEFAULT_PREFS: &str = ".grade-signal-prefs.json";

/// Settings read once from the environment; CLI flags take precedence.
#[derive(Debug, Clone)]
pub struct Config {
    pub roster: PathBuf,
    pub mode: InterpretationMode,
    pub prefs: PathBuf,
    pub seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let roster = lookup("GRADE_SIGNAL_ROSTER")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROSTER));
        let mode = lookup("GRADE_SIGNAL_MODE")
            .map(|value| InterpretationMode::parse_lenient(&value))
            .unwrap_or_default();
        let prefs = lookup("GRADE_SIGNAL_PREFS")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS));
        let seed = lookup("GRADE_SIGNAL_SEED")
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("GRADE_SIGNAL_SEED must be an unsigned integer, got '{value}'"))
            })
            .transpose()?;

        Ok(Self {
            roster,
            mode,
            prefs,
            seed,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
}

impl Preferences {
    /// A missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no saved preferences");
                return Self::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "ignoring malformed preferences");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write preferences to {}", path.display()))?;
        Ok(())
    }
}
