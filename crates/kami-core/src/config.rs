//! Configuration for model building and export.
//!
//! Load order: `kami.toml` in the project root → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "kami.toml";

/// Top-level KAMI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KamiConfig {
    pub model: ModelConfig,
    pub export: ExportConfig,
    pub facts: FactsConfig,
}

/// Where a phosphorylation with a known position is anchored on its substrate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidueContainer {
    #[default]
    KeyResidue,
    Site,
}

/// Model-building configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub residue_container: ResidueContainer,
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Base name of the written files, and the name of the DOT graph.
    pub graph_name: String,
    /// Directory the exports are written to, relative to the project root.
    pub output_dir: PathBuf,
}

/// Fact ingestion policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactsConfig {
    /// Skip rejected facts with a warning instead of halting the run.
    pub skip_invalid: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            graph_name: "example_graph".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl KamiConfig {
    /// Load config from `kami.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override("KAMI_GRAPH_NAME", &mut config.export.graph_name);
        env_override("KAMI_OUTPUT_DIR", &mut config.export.output_dir);
        env_override("KAMI_SKIP_INVALID", &mut config.facts.skip_invalid);

        config.validate()?;
        Ok(config)
    }

    /// The graph name becomes a file name, so it must be a single path component.
    pub fn validate(&self) -> Result<()> {
        let name = &self.export.graph_name;
        if name.trim().is_empty() {
            anyhow::bail!("graph_name must not be empty");
        }
        if name.contains(['/', '\\']) {
            anyhow::bail!("graph_name `{}` must not contain a path separator", name);
        }
        Ok(())
    }
}
