//! Provides single-step updates for the 2+1-dimensional (time-dependent)
//! Schrödinger equation (TDSE) in a static potential, with ψ split into real
//! and imaginary parts on zero-padded grids.
//!
//! Every routine here reads the previous step from one set of grids and writes
//! the next step into a second, distinct set; no grid is both read and written
//! during a step. Only the interiors of the output grids are written.
//!
//! In all 2D arrays, the first (or zero-th) axis indexes y and the second
//! indexes x.

use ndarray as nd;
use crate::{
    error::{ ConfigError, ShapeError, TError },
    grid::Padded,
    scheme::Scheme,
};

pub type TResult<T> = Result<T, TError>;

/// Physical and numerical constants for a time step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Params {
    /// Reduced Planck constant
    pub hbar: f64,
    /// Particle mass
    pub mass: f64,
    /// Grid spacing along x (columns)
    pub dx: f64,
    /// Grid spacing along y (rows)
    pub dy: f64,
    /// Time step; may be negative
    pub dt: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self { hbar: 1.0, mass: 1.0, dx: 1.0, dy: 1.0, dt: 1.0 }
    }
}

impl Params {
    /// Create a new set of parameters with `hbar = mass = 1`.
    pub fn new(dx: f64, dy: f64, dt: f64) -> Self {
        Self { dx, dy, dt, ..Self::default() }
    }

    /// Builder-style setter for `hbar`.
    pub fn with_hbar(mut self, hbar: f64) -> Self {
        self.hbar = hbar;
        self
    }

    /// Builder-style setter for `mass`.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Check that `hbar`, `mass`, `dx`, and `dy` are strictly positive.
    ///
    /// `dt` is left unchecked; a negative value steps backward in time.
    pub fn check(&self) -> Result<(), ConfigError> {
        ConfigError::check_hbar(self.hbar)?;
        ConfigError::check_mass(self.mass)?;
        ConfigError::check_dx(self.dx)?;
        ConfigError::check_dy(self.dy)?;
        Ok(())
    }

    /// Coupling to the neighbors along x, `ħ / (2 m δx²)`.
    pub fn const_dx(&self) -> f64 {
        self.hbar / (2.0 * self.mass * self.dx * self.dx)
    }

    /// Coupling to the neighbors along y, `ħ / (2 m δy²)`.
    pub fn const_dy(&self) -> f64 {
        self.hbar / (2.0 * self.mass * self.dy * self.dy)
    }

    /// Rough upper bound on `|dt|` for the forward scheme to stay well-behaved
    /// over many steps, `1 / (2 (cx + cy))`.
    ///
    /// This is a diagnostic only; nothing in this crate enforces it.
    pub fn ftcs_dt_limit(&self) -> f64 {
        (2.0 * (self.const_dx() + self.const_dy())).recip()
    }
}

fn check_shapes(grids: [&Padded; 5]) -> Result<(), ShapeError> {
    let first = grids[0].as_array();
    grids.iter().skip(1)
        .try_for_each(|g| ShapeError::check(&first, &g.as_array()))
}

/// Take a single forward-time, centered-space step.
///
/// With `cx = ħ / (2 m δx²)`, `cy = ħ / (2 m δy²)`, and
/// `P = -V / ħ - 2 cx - 2 cy`, every interior cell is updated as
/// ```text
/// R' = R - δt (P I + cx (I[i, j+1] + I[i, j-1]) + cy (I[i-1, j] + I[i+1, j]))
/// I' = I + δt (P R + cx (R[i, j+1] + R[i, j-1]) + cy (R[i-1, j] + R[i+1, j]))
/// ```
/// where `R`, `I` are the real and imaginary parts of ψ. Neighbors on the ring
/// read as zero.
///
/// The scheme is explicit and only conditionally stable: `dt` has to be small
/// compared to `m δx² / ħ` and `m δy² / ħ` (see [`Params::ftcs_dt_limit`]).
pub fn ftcs(
    params: &Params,
    v0: &Padded,
    re: &Padded,
    im: &Padded,
    re_next: &mut Padded,
    im_next: &mut Padded,
) -> TResult<()>
{
    check_shapes([v0, re, im, &*re_next, &*im_next])?;

    let dt = params.dt;
    let cdx = params.const_dx();
    let cdy = params.const_dy();
    let neg_inv_hbar = -1.0 / params.hbar;
    let rp = re.as_array();
    let ip = im.as_array();

    // (i, j) indexes the interior, so the same cell sits at (i + 1, j + 1) in
    // the padded arrays
    let kernel = |
        (i, j): (usize, usize),
        re_new: &mut f64,
        im_new: &mut f64,
        &v: &f64,
        &re_cur: &f64,
        &im_cur: &f64,
    | {
        let pot = neg_inv_hbar * v - 2.0 * cdx - 2.0 * cdy;
        *re_new = re_cur - dt * (
            pot * im_cur
            + cdx * (ip[[i + 1, j + 2]] + ip[[i + 1, j]])
            + cdy * (ip[[i, j + 1]] + ip[[i + 2, j + 1]])
        );
        *im_new = im_cur + dt * (
            pot * re_cur
            + cdx * (rp[[i + 1, j + 2]] + rp[[i + 1, j]])
            + cdy * (rp[[i, j + 1]] + rp[[i + 2, j + 1]])
        );
    };
    let zip = nd::Zip::indexed(re_next.interior_mut())
        .and(im_next.interior_mut())
        .and(v0.interior())
        .and(re.interior())
        .and(im.interior());

    #[cfg(feature = "parallel")]
    zip.par_for_each(kernel);
    #[cfg(not(feature = "parallel"))]
    zip.for_each(kernel);

    Ok(())
}

/// Take a single backward-time, centered-space step.
///
/// Not implemented: always returns [`TError::Unimplemented`] and leaves every
/// grid untouched.
pub fn btcs(
    _params: &Params,
    _v0: &Padded,
    _re: &Padded,
    _im: &Padded,
    _re_next: &mut Padded,
    _im_next: &mut Padded,
) -> TResult<()>
{
    Err(TError::Unimplemented(Scheme::Backward))
}

/// Take a single Crank-Nicolson-style centered step.
///
/// Not implemented: always returns [`TError::Unimplemented`] and leaves every
/// grid untouched.
pub fn ctcs(
    _params: &Params,
    _v0: &Padded,
    _re: &Padded,
    _im: &Padded,
    _re_next: &mut Padded,
    _im_next: &mut Padded,
) -> TResult<()>
{
    Err(TError::Unimplemented(Scheme::Centered))
}

/// Take a single step with the routine selected by `scheme`.
///
/// On error, `re_next` and `im_next` hold no meaningful data and should be
/// discarded.
pub fn step(
    scheme: Scheme,
    params: &Params,
    v0: &Padded,
    re: &Padded,
    im: &Padded,
    re_next: &mut Padded,
    im_next: &mut Padded,
) -> TResult<()>
{
    match scheme {
        Scheme::Forward => ftcs(params, v0, re, im, re_next, im_next),
        Scheme::Backward => btcs(params, v0, re, im, re_next, im_next),
        Scheme::Centered => ctcs(params, v0, re, im, re_next, im_next),
    }
}
