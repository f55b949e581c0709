//! Zero-bordered ("padded") grids for stencil evaluation near the domain edge.
//!
//! A [`Padded`] grid carries a one-cell ring of zeros around an `N × M`
//! interior, so every interior cell has four in-bounds axis-aligned neighbors.
//! The ring is the discrete form of a Dirichlet (ψ = 0) boundary condition: it
//! is created zero and never written afterward.
//!
//! ```
//! use ndarray as nd;
//! use tdse2d::grid::{ pad, unpad };
//!
//! let g: nd::Array2<f64> = nd::Array2::ones((3, 3));
//! let p = pad(&g);
//! assert_eq!(p.as_array().dim(), (5, 5));
//! assert_eq!(p.as_array()[[0, 0]], 0.0);
//! assert_eq!(p.as_array()[[1, 1]], 1.0);
//! assert_eq!(unpad(&p), g);
//! ```

use ndarray as nd;
use num_traits::Zero;
use crate::Arr2;

/// Width of the zero ring around a [`Padded`] grid.
pub const HALO: usize = 1;

/// A grid wrapped in a one-cell ring of zeros.
///
/// The interior can be overwritten (see [`Self::assign_interior`] and
/// [`Self::interior_mut`]), but the ring can't be reached mutably from outside
/// this module.
#[derive(Clone, Debug, PartialEq)]
pub struct Padded<A = f64> {
    data: nd::Array2<A>,
}

impl<A> Padded<A>
where A: Clone + Zero
{
    /// Create a padded grid of zeros with an interior of shape `dim`.
    pub fn zeros(dim: (usize, usize)) -> Self {
        let data = nd::Array2::zeros((dim.0 + 2 * HALO, dim.1 + 2 * HALO));
        Self { data }
    }

    // restore the ring after a whole-buffer write from outside the crate
    pub(crate) fn zero_ring(&mut self) {
        let (nr, nc) = self.data.dim();
        self.data.slice_mut(nd::s![..HALO, ..]).fill(A::zero());
        self.data.slice_mut(nd::s![nr - HALO.., ..]).fill(A::zero());
        self.data.slice_mut(nd::s![.., ..HALO]).fill(A::zero());
        self.data.slice_mut(nd::s![.., nc - HALO..]).fill(A::zero());
    }
}

impl<A> Padded<A> {
    /// Shape of the interior.
    pub fn inner_dim(&self) -> (usize, usize) {
        let (nr, nc) = self.data.dim();
        (nr - 2 * HALO, nc - 2 * HALO)
    }

    /// Shape of the whole padded array, ring included.
    pub fn dim(&self) -> (usize, usize) { self.data.dim() }

    /// Borrow the whole padded array, ring included.
    pub fn as_array(&self) -> nd::ArrayView2<'_, A> { self.data.view() }

    /// Borrow the interior.
    pub fn interior(&self) -> nd::ArrayView2<'_, A> {
        let (nr, nc) = self.inner_dim();
        self.data.slice(nd::s![HALO..HALO + nr, HALO..HALO + nc])
    }

    /// Mutably borrow the interior.
    pub fn interior_mut(&mut self) -> nd::ArrayViewMut2<'_, A> {
        let (nr, nc) = self.inner_dim();
        self.data.slice_mut(nd::s![HALO..HALO + nr, HALO..HALO + nc])
    }

    /// Return the padded data as a flat row-major slice, if it's stored
    /// contiguously (always true for grids built by this module).
    pub fn as_slice(&self) -> Option<&[A]> { self.data.as_slice() }

    /// Mutable counterpart to [`Self::as_slice`].
    ///
    /// Only used to receive whole-buffer transfers, whose source is itself a
    /// padded grid with a zero ring.
    pub(crate) fn as_slice_mut(&mut self) -> Option<&mut [A]> {
        self.data.as_slice_mut()
    }
}

impl<A> Padded<A>
where A: Clone
{
    /// Overwrite the interior with the contents of `grid`, leaving the ring
    /// untouched.
    ///
    /// *Panics if `grid` doesn't match [`Self::inner_dim`]*.
    pub fn assign_interior<S>(&mut self, grid: &Arr2<S>)
    where S: nd::Data<Elem = A>
    {
        self.interior_mut().assign(grid);
    }
}

/// Wrap `grid` in a one-cell ring of zeros.
///
/// Cell `(i + 1, j + 1)` of the result equals cell `(i, j)` of `grid`; every
/// cell in the first and last rows and columns is zero. `grid` is not
/// modified.
pub fn pad<S, A>(grid: &Arr2<S>) -> Padded<A>
where
    S: nd::Data<Elem = A>,
    A: Clone + Zero,
{
    let mut padded = Padded::zeros(grid.dim());
    padded.assign_interior(grid);
    padded
}

/// Extract an owned copy of the interior of a padded grid, undoing [`pad`].
pub fn unpad<A>(padded: &Padded<A>) -> nd::Array2<A>
where A: Clone
{
    padded.interior().to_owned()
}
