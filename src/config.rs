//! Runtime configuration for tardis.

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

use crate::signals::montecarlo::SamplerConfig;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root folder for input tables.
    pub data_dir: PathBuf,
    /// Root folder for produced tables.
    pub outputs_dir: PathBuf,
    /// Monte Carlo seed.
    pub seed: u64,
    /// Gaussian samples drawn per drug for the null distribution.
    pub mc_samples: usize,
    /// Lower-tail percentile used as the per-drug threshold.
    pub mc_percentile: f64,
    /// Worker threads for row-parallel stages; 0 means one per core.
    pub workers: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = SamplerConfig::default();
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let outputs_dir = env::var("OUTPUTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./outputs"));

        std::fs::create_dir_all(&outputs_dir).context("creating outputs dir")?;

        Ok(Self {
            data_dir,
            outputs_dir,
            seed: env_or("TARDIS_SEED", defaults.seed),
            mc_samples: env_or("TARDIS_MC_SAMPLES", defaults.samples),
            mc_percentile: env_or("TARDIS_MC_PERCENTILE", defaults.percentile),
            workers: env_or("TARDIS_WORKERS", 0),
        })
    }

    /// Sampler parameters, with optional per-run overrides.
    pub fn sampler(&self, seed: Option<u64>, samples: Option<usize>) -> SamplerConfig {
        SamplerConfig {
            seed: seed.unwrap_or(self.seed),
            samples: samples.unwrap_or(self.mc_samples),
            percentile: self.mc_percentile,
        }
    }

    /// Resolve an input path relative to the data directory unless absolute
    /// or already present.
    pub fn resolve_input<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Convenience helper for derived output path segments.
    pub fn join_output<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.outputs_dir.join(path)
    }
}
