//! TOML configuration for a simulation run.
//!
//! Every field has a default, so an empty file describes the standard
//! 101 × 101 run over [-10, 10]² with `ħ = m = 1` and the forward scheme:
//! ```toml
//! [solver]
//! hbar = 1.0
//! mass = 1.0
//! scheme = "ftcs"
//! # dt = 2.5e-5         # defaults to Scheme::default_dt
//!
//! [grid]
//! x_min = -10.0
//! x_max = 10.0
//! y_min = -10.0
//! y_max = 10.0
//! n = 101
//!
//! [run]
//! t_max = 10.0
//! span = 100
//! # steps = 1000        # overrides t_max
//! ```

use std::{ path::Path, str::FromStr };
use ndarray as nd;
use serde::Deserialize;
use crate::{
    error::ConfigError,
    scheme::Scheme,
    timedep::Params,
};

/// Top-level run configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RunConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub run: RunParams,
}

/// Physical constants and the finite-difference scheme.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SolverConfig {
    /// Reduced Planck constant
    #[serde(default = "default_one")]
    pub hbar: f64,
    /// Particle mass
    #[serde(default = "default_one")]
    pub mass: f64,
    /// Scheme identifier; see [`Scheme`]'s `FromStr` impl for accepted names
    #[serde(default)]
    pub scheme: Scheme,
    /// Time step; defaults to [`Scheme::default_dt`]
    pub dt: Option<f64>,
}

fn default_one() -> f64 { 1.0 }

impl Default for SolverConfig {
    fn default() -> Self {
        Self { hbar: 1.0, mass: 1.0, scheme: Scheme::default(), dt: None }
    }
}

impl SolverConfig {
    /// The configured time step, or the scheme's default.
    pub fn dt(&self) -> f64 { self.dt.unwrap_or_else(|| self.scheme.default_dt()) }

    /// Collect step parameters for the given grid spacings.
    pub fn params(&self, dx: f64, dy: f64) -> Params {
        Params { hbar: self.hbar, mass: self.mass, dx, dy, dt: self.dt() }
    }
}

/// Extent and resolution of the (square) spatial grid.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GridConfig {
    #[serde(default = "default_min")]
    pub x_min: f64,
    #[serde(default = "default_max")]
    pub x_max: f64,
    #[serde(default = "default_min")]
    pub y_min: f64,
    #[serde(default = "default_max")]
    pub y_max: f64,
    /// Number of cells per axis
    #[serde(default = "default_n")]
    pub n: usize,
}

fn default_min() -> f64 { -10.0 }
fn default_max() -> f64 { 10.0 }
fn default_n() -> usize { 101 }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            x_min: default_min(),
            x_max: default_max(),
            y_min: default_min(),
            y_max: default_max(),
            n: default_n(),
        }
    }
}

impl GridConfig {
    /// Cell width along x, `(x_max - x_min) / n`.
    pub fn dx(&self) -> f64 { (self.x_max - self.x_min) / self.n as f64 }

    /// Cell width along y, `(y_max - y_min) / n`.
    pub fn dy(&self) -> f64 { (self.y_max - self.y_min) / self.n as f64 }

    /// `n` evenly spaced x coordinates spanning `[x_min, x_max]`.
    pub fn x(&self) -> nd::Array1<f64> {
        nd::Array1::linspace(self.x_min, self.x_max, self.n)
    }

    /// `n` evenly spaced y coordinates spanning `[y_min, y_max]`.
    pub fn y(&self) -> nd::Array1<f64> {
        nd::Array1::linspace(self.y_min, self.y_max, self.n)
    }
}

/// Length of the run and reporting cadence.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RunParams {
    /// Final simulation time
    #[serde(default = "default_t_max")]
    pub t_max: f64,
    /// Number of steps between reports
    #[serde(default = "default_span")]
    pub span: usize,
    /// Fixed number of steps, overriding `t_max`
    pub steps: Option<usize>,
}

fn default_t_max() -> f64 { 10.0 }
fn default_span() -> usize { 100 }

impl Default for RunParams {
    fn default() -> Self {
        Self { t_max: default_t_max(), span: default_span(), steps: None }
    }
}

impl RunParams {
    /// Check that `t_max` is finite and non-negative.
    pub fn check(&self) -> Result<(), ConfigError> {
        (self.t_max.is_finite() && self.t_max >= 0.0).then_some(())
            .ok_or(ConfigError::BadTMax(self.t_max))
    }

    /// Number of steps to take with time step `dt`: either `steps`, or enough
    /// to cover every `t = k dt ≤ t_max`.
    ///
    /// Saturates at `usize::MAX`; gives zero for a zero or non-finite `dt` and
    /// for a `t_max` rejected by [`Self::check`].
    pub fn num_steps(&self, dt: f64) -> usize {
        self.steps.unwrap_or_else(|| {
            if dt == 0.0 || !dt.is_finite() || self.check().is_err() {
                0
            } else {
                ((self.t_max / dt.abs()).floor() as usize).saturating_add(1)
            }
        })
    }
}

impl FromStr for RunConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.run.check()?;
        Ok(config)
    }
}

/// Read a [`RunConfig`] from a TOML file.
pub fn read_toml<P>(path: P) -> Result<RunConfig, ConfigError>
where P: AsRef<Path>
{
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    contents.parse()
}
