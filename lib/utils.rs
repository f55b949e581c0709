//! Miscellaneous tools for wavefunctions stored as separate real and imaginary
//! grids.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::Arr2;

/// Combine real and imaginary parts into a single complex-valued grid.
///
/// *Panics if the two grids have different shapes*.
pub fn to_complex<S, T>(re: &Arr2<S>, im: &Arr2<T>) -> nd::Array2<C64>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    nd::Zip::from(re).and(im)
        .map_collect(|&r, &i| C64::new(r, i))
}

/// Split a complex-valued grid into its real and imaginary parts.
pub fn from_complex<S>(psi: &Arr2<S>) -> (nd::Array2<f64>, nd::Array2<f64>)
where S: nd::Data<Elem = C64>
{
    (psi.mapv(|z| z.re), psi.mapv(|z| z.im))
}

/// Sum of `|ψ|²` over all cells.
///
/// *Panics if the two grids have different shapes*.
pub fn norm_sqr<S, T>(re: &Arr2<S>, im: &Arr2<T>) -> f64
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    nd::Zip::from(re).and(im)
        .fold(0.0, |acc, &r, &i| acc + r * r + i * i)
}

/// Frobenius norm of ψ, `sqrt(Σ |ψ|²)`, with no grid-spacing factor.
///
/// *Panics if the two grids have different shapes*.
pub fn norm<S, T>(re: &Arr2<S>, im: &Arr2<T>) -> f64
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    norm_sqr(re, im).sqrt()
}

/// Total probability `Σ |ψ|² δx δy`, i.e. the squared L² norm of ψ as a
/// function over the plane.
///
/// *Panics if the two grids have different shapes*.
pub fn wf_norm<S, T>(re: &Arr2<S>, im: &Arr2<T>, dx: f64, dy: f64) -> f64
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    norm_sqr(re, im) * dx * dy
}

/// Return `true` if no cell of either grid is NaN or infinite.
pub fn all_finite<S, T>(re: &Arr2<S>, im: &Arr2<T>) -> bool
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    re.iter().chain(im.iter()).all(|x| x.is_finite())
}
