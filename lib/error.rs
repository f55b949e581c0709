//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow].
//!
//! [anyhow]: https://crates.io/crates/anyhow

use std::{ io, path::PathBuf };
use ndarray as nd;
use thiserror::Error;
use crate::scheme::Scheme;

/// Returned when an operation requiring equal-shape grids encounters grids with
/// unequal shapes.
#[derive(Debug, Error)]
#[error("encountered grids with incompatible shapes; got {0:?} and {1:?}")]
pub struct ShapeError(pub (usize, usize), pub (usize, usize));

impl ShapeError {
    pub(crate) fn check<S, A, T, B>(
        a: &nd::ArrayBase<S, nd::Ix2>,
        b: &nd::ArrayBase<T, nd::Ix2>,
    ) -> Result<(), Self>
    where
        S: nd::Data<Elem = A>,
        T: nd::Data<Elem = B>,
    {
        let na = a.dim();
        let nb = b.dim();
        (na == nb).then_some(()).ok_or(Self(na, nb))
    }
}

/// Returned when a grid is required to be square but isn't.
#[derive(Debug, Error)]
#[error("grids must be square; got {0} rows and {1} columns")]
pub struct SquareError(pub usize, pub usize);

impl SquareError {
    pub(crate) fn check<S, A>(a: &nd::ArrayBase<S, nd::Ix2>) -> Result<(), Self>
    where S: nd::Data<Elem = A>
    {
        let (nr, nc) = a.dim();
        (nr == nc).then_some(()).ok_or(Self(nr, nc))
    }
}

/// Returned when a scheme identifier names none of the known
/// [`Scheme`]s.
#[derive(Debug, Error)]
#[error("unknown scheme {0:?}; expected one of forward (ftcs), backward (btcs), or centered (ctcs)")]
pub struct UnknownScheme(pub String);

/// Returned when constructing a solver or reading its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when a non-positive `hbar` value is encountered.
    #[error("hbar must be greater than 0; got {0}")]
    BadHbar(f64),

    /// Returned when a non-positive `mass` value is encountered.
    #[error("mass must be greater than 0; got {0}")]
    BadMass(f64),

    /// Returned when a non-positive `dx` value is encountered.
    #[error("dx must be greater than 0; got {0}")]
    BadDx(f64),

    /// Returned when a non-positive `dy` value is encountered.
    #[error("dy must be greater than 0; got {0}")]
    BadDy(f64),

    /// Returned when a run length is negative or non-finite.
    #[error("t_max must be finite and non-negative; got {0}")]
    BadTMax(f64),

    /// Returned when the initial grids have no cells.
    #[error("grids must contain at least one cell")]
    EmptyGrid,

    /// [`ShapeError`]
    #[error("grid shape error: {0}")]
    Shape(#[from] ShapeError),

    /// [`SquareError`]
    #[error("grid shape error: {0}")]
    Square(#[from] SquareError),

    /// [`UnknownScheme`]
    #[error("scheme error: {0}")]
    Scheme(#[from] UnknownScheme),

    /// Returned when a configuration file can't be read.
    #[error("unable to read config file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// Returned when a configuration file can't be parsed.
    #[error("unable to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub(crate) fn check_hbar(hbar: f64) -> Result<(), Self> {
        (hbar > 0.0).then_some(()).ok_or(Self::BadHbar(hbar))
    }

    pub(crate) fn check_mass(mass: f64) -> Result<(), Self> {
        (mass > 0.0).then_some(()).ok_or(Self::BadMass(mass))
    }

    pub(crate) fn check_dx(dx: f64) -> Result<(), Self> {
        (dx > 0.0).then_some(()).ok_or(Self::BadDx(dx))
    }

    pub(crate) fn check_dy(dy: f64) -> Result<(), Self> {
        (dy > 0.0).then_some(()).ok_or(Self::BadDy(dy))
    }
}

/// Returned from [`Device`][crate::backend::Device] implementations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Returned when a device is used before its memory was initialized, or
    /// after it was cleaned up.
    #[error("device memory has not been initialized")]
    NotInitialized,

    /// Returned when a host buffer doesn't match the device's linear size.
    #[error("buffer length mismatch; expected {expected} elements, got {got}")]
    BufferLength { expected: usize, got: usize },

    /// Returned when a linear dimension is too small to hold any interior
    /// cells.
    #[error("padded grids need a linear dimension of at least 3; got {0}")]
    BadDimension(usize),

    /// Returned when a host grid isn't stored as one contiguous, row-major
    /// buffer.
    #[error("host buffer is not contiguous")]
    Layout,

    /// Returned when a device can't be acquired or allocated.
    #[error("device unavailable: {0}")]
    Unavailable(String),
}

impl DeviceError {
    pub(crate) fn check_len(expected: usize, got: usize) -> Result<(), Self> {
        (expected == got).then_some(())
            .ok_or(Self::BufferLength { expected, got })
    }
}

/// Returned from time-stepping functions.
#[derive(Debug, Error)]
pub enum TError {
    /// Returned when stepping with a scheme whose numerics don't exist yet.
    #[error("the {0} scheme is not implemented")]
    Unimplemented(Scheme),

    /// [`ShapeError`]
    #[error("grid shape error: {0}")]
    Shape(#[from] ShapeError),

    /// [`DeviceError`]
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}
