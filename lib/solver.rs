//! A simulation state that advances ψ one time step at a time.
//!
//! ```
//! use ndarray as nd;
//! use tdse2d::{ scheme::Scheme, solver::Solver, timedep::Params };
//!
//! let v0: nd::Array2<f64> = nd::Array2::ones((2, 2));
//! let re: nd::Array2<f64> = nd::Array2::zeros((2, 2));
//! let im: nd::Array2<f64> = nd::Array2::ones((2, 2));
//! let mut solver = Solver::new(&v0, &re, &im, Params::default(), Scheme::Forward)
//!     .unwrap();
//! solver.step().unwrap();
//! assert_eq!(solver.re_part(), nd::Array2::from_elem((2, 2), 2.0));
//! assert_eq!(solver.im_part(), nd::Array2::from_elem((2, 2), 1.0));
//! ```

use log::{ debug, info, warn };
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    Arr2,
    config::SolverConfig,
    error::{ ConfigError, ShapeError, SquareError },
    grid::{ Padded, pad, unpad },
    scheme::Scheme,
    timedep::{ self, Params, TResult },
    utils,
};

/// Owns the potential and the current ψ, and steps ψ forward under a fixed
/// [`Scheme`].
///
/// All grids are stored padded. ψ is replaced as a pair after each successful
/// step and left untouched by a failed one.
#[derive(Clone, Debug)]
pub struct Solver {
    v0: Padded,
    re: Padded,
    im: Padded,
    // scratch space for the next step; swapped with `re`/`im` on success
    re_next: Padded,
    im_next: Padded,
    params: Params,
    scheme: Scheme,
    steps: usize,
}

impl Solver {
    /// Create a new solver from an initial potential, the real and imaginary
    /// parts of ψ at `t = 0`, step parameters, and a scheme.
    ///
    /// All three grids must be square, non-empty, and of equal shape, and
    /// `hbar`, `mass`, `dx`, `dy` must be positive.
    pub fn new<S, T, U>(
        v0: &Arr2<S>,
        re: &Arr2<T>,
        im: &Arr2<U>,
        params: Params,
        scheme: Scheme,
    ) -> Result<Self, ConfigError>
    where
        S: nd::Data<Elem = f64>,
        T: nd::Data<Elem = f64>,
        U: nd::Data<Elem = f64>,
    {
        params.check()?;
        if v0.is_empty() { return Err(ConfigError::EmptyGrid); }
        SquareError::check(v0)?;
        ShapeError::check(v0, re)?;
        ShapeError::check(v0, im)?;

        let (n, _) = v0.dim();
        info!(
            "solver: {n}×{n} grid, {scheme} scheme, hbar = {}, mass = {}, dx = {}, dy = {}, dt = {}",
            params.hbar, params.mass, params.dx, params.dy, params.dt,
        );
        if !scheme.is_implemented() {
            warn!("solver: the {scheme} scheme is not implemented; stepping will fail");
        }
        if scheme == Scheme::Forward && params.dt.abs() > params.ftcs_dt_limit() {
            warn!(
                "solver: |dt| = {} exceeds the forward-scheme limit {}; expect growth",
                params.dt.abs(), params.ftcs_dt_limit(),
            );
        }
        #[cfg(feature = "parallel")]
        debug!("solver: stepping on {} threads", rayon::current_num_threads());

        Ok(Self {
            v0: pad(v0),
            re: pad(re),
            im: pad(im),
            re_next: Padded::zeros((n, n)),
            im_next: Padded::zeros((n, n)),
            params,
            scheme,
            steps: 0,
        })
    }

    /// Like [`Self::new`], but with `hbar = mass = 1` and the forward scheme.
    pub fn with_defaults<S, T, U>(
        v0: &Arr2<S>,
        re: &Arr2<T>,
        im: &Arr2<U>,
        dx: f64,
        dy: f64,
        dt: f64,
    ) -> Result<Self, ConfigError>
    where
        S: nd::Data<Elem = f64>,
        T: nd::Data<Elem = f64>,
        U: nd::Data<Elem = f64>,
    {
        Self::new(v0, re, im, Params::new(dx, dy, dt), Scheme::default())
    }

    /// Like [`Self::new`], taking constants, time step, and scheme from a
    /// [`SolverConfig`].
    pub fn from_config<S, T, U>(
        v0: &Arr2<S>,
        re: &Arr2<T>,
        im: &Arr2<U>,
        dx: f64,
        dy: f64,
        config: &SolverConfig,
    ) -> Result<Self, ConfigError>
    where
        S: nd::Data<Elem = f64>,
        T: nd::Data<Elem = f64>,
        U: nd::Data<Elem = f64>,
    {
        Self::new(v0, re, im, config.params(dx, dy), config.scheme)
    }

    /// Advance ψ by one time step.
    ///
    /// On error, ψ is left exactly as it was.
    pub fn step(&mut self) -> TResult<()> {
        timedep::step(
            self.scheme,
            &self.params,
            &self.v0,
            &self.re,
            &self.im,
            &mut self.re_next,
            &mut self.im_next,
        )?;
        std::mem::swap(&mut self.re, &mut self.re_next);
        std::mem::swap(&mut self.im, &mut self.im_next);
        self.steps += 1;
        debug!("solver: step {} (t = {})", self.steps, self.time());
        Ok(())
    }

    /// Advance ψ by `n` time steps, stopping at the first error.
    pub fn step_n(&mut self, n: usize) -> TResult<()> {
        (0..n).try_for_each(|_| self.step())
    }

    /// Owned copy of the real part of ψ, without padding.
    pub fn re_part(&self) -> nd::Array2<f64> { unpad(&self.re) }

    /// Owned copy of the imaginary part of ψ, without padding.
    pub fn im_part(&self) -> nd::Array2<f64> { unpad(&self.im) }

    /// Borrow the real part of ψ, without padding.
    pub fn re_view(&self) -> nd::ArrayView2<'_, f64> { self.re.interior() }

    /// Borrow the imaginary part of ψ, without padding.
    pub fn im_view(&self) -> nd::ArrayView2<'_, f64> { self.im.interior() }

    /// Borrow the potential, without padding.
    pub fn potential(&self) -> nd::ArrayView2<'_, f64> { self.v0.interior() }

    /// ψ as a single complex-valued grid, without padding.
    pub fn psi(&self) -> nd::Array2<C64> {
        utils::to_complex(&self.re.interior(), &self.im.interior())
    }

    /// Frobenius norm of ψ; see [`utils::norm`].
    pub fn norm(&self) -> f64 {
        utils::norm(&self.re.interior(), &self.im.interior())
    }

    /// Step parameters.
    pub fn params(&self) -> &Params { &self.params }

    /// The scheme used for every step.
    pub fn scheme(&self) -> Scheme { self.scheme }

    /// Number of successful steps taken so far.
    pub fn steps(&self) -> usize { self.steps }

    /// Simulation time, `steps × dt`.
    pub fn time(&self) -> f64 { self.steps as f64 * self.params.dt }

    /// Number of cells along either axis.
    pub fn size(&self) -> usize { self.v0.inner_dim().0 }

    pub(crate) fn padded(&self) -> (&Padded, &Padded, &Padded) {
        (&self.v0, &self.re, &self.im)
    }

    // accept ψ computed elsewhere (i.e. on a device) as the result of one step;
    // `f` may write the whole padded buffers, so the scratch ring is cleared
    // whether or not it succeeds
    pub(crate) fn commit_with<F, E>(&mut self, f: F) -> Result<(), E>
    where F: FnOnce(&mut Padded, &mut Padded) -> Result<(), E>
    {
        let res = f(&mut self.re_next, &mut self.im_next);
        self.re_next.zero_ring();
        self.im_next.zero_ring();
        res?;
        std::mem::swap(&mut self.re, &mut self.re_next);
        std::mem::swap(&mut self.im, &mut self.im_next);
        self.steps += 1;
        Ok(())
    }
}
