use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, GenerationConfig};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "synth-grid",
    version,
    about = "Synthetic building electricity-consumption dataset generator"
)]
pub struct CliArgs {
    /// Load configuration from a TOML file
    #[arg(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, capital_week, small_towns)
    #[arg(long)]
    pub preset: Option<String>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the number of buildings
    #[arg(long)]
    pub buildings: Option<u64>,

    /// Reference catalog TOML replacing the built-in one
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Number of readings printed in the report
    #[arg(long)]
    pub sample: Option<usize>,
}

impl CliArgs {
    /// Resolves the configuration: `--scenario`, then `--preset`, then the
    /// baseline, with overrides applied on top.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file or preset cannot be loaded.
    pub fn load_config(&self) -> Result<GenerationConfig, ConfigError> {
        let mut config = match (&self.scenario, &self.preset) {
            (Some(path), _) => GenerationConfig::from_toml_file(path)?,
            (None, Some(name)) => GenerationConfig::from_preset(name)?,
            (None, None) => GenerationConfig::baseline(),
        };
        if let Some(seed) = self.seed {
            config.request.seed = seed;
        }
        if let Some(buildings) = self.buildings {
            config.request.total_buildings = buildings;
        }
        if let Some(catalog) = &self.catalog {
            config.reference.catalog = Some(catalog.clone());
        }
        if let Some(sample) = self.sample {
            config.output.sample_size = sample;
        }
        Ok(config)
    }
}
