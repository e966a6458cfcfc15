//! Solver and logging configuration.
//!
//! Loaded from an optional TOML file. Every section and field has a default,
//! so an empty file (or no file) yields a working configuration.
//!
//! ```toml
//! [solver]
//! backend = "simplex"
//! time_limit_secs = 60.0
//! tolerance = 1e-6
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use alloyblend_solver::{BackendKind, SolveOptions};
use serde::{Deserialize, Serialize};

use crate::error::{BlendError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub solver: SolverConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub backend: BackendKind,
    /// Wall-clock budget per solve; unlimited when absent
    pub time_limit_secs: Option<f64>,
    /// Relative to the target weight, used for satisfaction flags and
    /// sensitivity thresholds
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Branch-and-bound node budget
    pub max_nodes: usize,
    /// Run the sensitivity analyzer on optimal LP results
    pub sensitivity: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let limits = SolveOptions::default();
        Self {
            backend: BackendKind::default(),
            time_limit_secs: None,
            tolerance: 1e-6,
            max_iterations: limits.max_iterations,
            max_nodes: limits.max_nodes,
            sensitivity: true,
        }
    }
}

/// Logging settings; the binary installs the subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl Config {
    /// Read and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            BlendError::Config(msg) => BlendError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| BlendError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let solver = &self.solver;
        if !(solver.tolerance.is_finite() && solver.tolerance > 0.0) {
            return Err(BlendError::Config(format!(
                "solver.tolerance must be positive, got {}",
                solver.tolerance
            )));
        }
        if let Some(limit) = solver.time_limit_secs {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(BlendError::Config(format!(
                    "solver.time_limit_secs must be positive, got {}",
                    limit
                )));
            }
        }
        if solver.max_iterations == 0 {
            return Err(BlendError::Config("solver.max_iterations must be at least 1".into()));
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(BlendError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                other
            ))),
        }
    }
}

impl SolverConfig {
    /// Solver limits for one solve
    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            time_limit: self.time_limit_secs.map(Duration::from_secs_f64),
            max_iterations: self.max_iterations,
            max_nodes: self.max_nodes,
            interrupt: None,
        }
    }
}
