//! Optional `.course-dashboard.toml` configuration.
//!
//! Every section may be omitted. Command-line flags take precedence over
//! values read from the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::RosterCounts;

pub const DEFAULT_CONFIG_FILE: &str = ".course-dashboard.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the course and enrollment exports live.
    #[serde(default)]
    pub input: InputConfig,

    /// Sizes of the teacher, participant and room collections.
    #[serde(default)]
    pub counts: RosterCounts,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub courses: Option<PathBuf>,

    #[serde(default)]
    pub enrollments: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON document (default)
    #[default]
    Json,
    /// Markdown summary
    Markdown,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Returns `Ok(None)` if there is no config file in the working directory.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to render default config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
        assert_eq!(config.counts, RosterCounts::default());
        assert!(config.input.courses.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[input]
courses = "exports/kurse.json"
enrollments = "exports/anmeldungen.csv"

[counts]
teachers = 7
rooms = 3

[output]
format = "markdown"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(
            config.input.courses.as_deref(),
            Some(Path::new("exports/kurse.json"))
        );
        assert_eq!(config.counts.teachers, 7);
        assert_eq!(config.counts.participants, 0);
        assert_eq!(config.counts.rooms, 3);
        assert_eq!(config.output.format, OutputFormat::Markdown);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = Config::default_toml().unwrap();
        assert!(toml_str.contains("[counts]"));
        assert!(toml_str.contains("[output]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[counts]\nparticipants = 12\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.counts.participants, 12);
    }
}
