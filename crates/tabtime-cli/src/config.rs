//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tabtime_core::VerifyConfig;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the exported study tables.
    pub data_dir: PathBuf,
    /// Directory reports and merge tables are written to.
    pub output_dir: PathBuf,
    /// Gap tolerance between adjacent segments, milliseconds.
    pub gap_tolerance_ms: f64,
    /// Allowed mismatch against the recorded session duration, milliseconds.
    pub duration_tolerance_ms: f64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("output_dir", &self.output_dir)
            .field("gap_tolerance_ms", &self.gap_tolerance_ms)
            .field("duration_tolerance_ms", &self.duration_tolerance_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let defaults = VerifyConfig::default();
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            gap_tolerance_ms: defaults.gap_tolerance_ms,
            duration_tolerance_ms: defaults.duration_tolerance_ms,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TABTIME_*)
        figment = figment.merge(Env::prefixed("TABTIME_"));

        figment.extract()
    }

    /// Verifier tolerances as the core expects them.
    #[must_use]
    pub const fn verify_config(&self) -> VerifyConfig {
        VerifyConfig {
            gap_tolerance_ms: self.gap_tolerance_ms,
            duration_tolerance_ms: self.duration_tolerance_ms,
        }
    }

    /// Path to the exported event log table.
    #[must_use]
    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join("reading_events.csv")
    }

    /// Path to the exported session summary table.
    #[must_use]
    pub fn summary_path(&self) -> PathBuf {
        self.data_dir.join("reading_summary.csv")
    }

    /// Path to the participant condition table.
    #[must_use]
    pub fn experiments_path(&self) -> PathBuf {
        self.data_dir.join("experiments.csv")
    }
}

/// Returns the platform-specific config directory for tabtime.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tabtime"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tolerances_match_verifier_defaults() {
        let config = Config::default();
        let verify = config.verify_config();
        assert!((verify.gap_tolerance_ms - 1.0).abs() < f64::EPSILON);
        assert!((verify.duration_tolerance_ms - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn table_paths_join_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/study/processed"),
            ..Config::default()
        };
        assert_eq!(
            config.events_path(),
            PathBuf::from("/study/processed/reading_events.csv")
        );
        assert_eq!(
            config.summary_path(),
            PathBuf::from("/study/processed/reading_summary.csv")
        );
        assert_eq!(
            config.experiments_path(),
            PathBuf::from("/study/processed/experiments.csv")
        );
    }

    #[test]
    fn dirs_config_path_ends_with_tabtime() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "tabtime");
    }
}
