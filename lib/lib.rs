//! Provides functions and higher-level constructs for stepping the
//! two-dimensional, time-dependent Schrödinger equation through time on a
//! uniform square grid, in a static potential, via finite differences.
//!
//! ψ is stored as two real-valued grids (real and imaginary parts), each
//! wrapped in a one-cell ring of zeros that imposes ψ = 0 at the edge of the
//! domain.
//!
//! Provides the following schemes:
//! - Forward-time, centered-space (FTCS, explicit)
//! - Backward-time, centered-space (BTCS, implicit; not yet implemented)
//! - Crank-Nicolson-style centered (CTCS, semi-implicit; not yet implemented)
//!
//! Steps can be taken on the host via [`solver::Solver`] or offloaded to a
//! separate device via [`backend::OffloadSolver`]. With the `parallel` feature,
//! the forward kernel runs across threads via `rayon`.
//!
//! See [`docs`] for theoretical background.

pub mod backend;
pub mod config;
pub mod error;
pub mod grid;
pub mod scheme;
pub mod solver;
pub mod timedep;
pub mod utils;

pub mod docs;

pub type Arr2<S> = ndarray::ArrayBase<S, ndarray::Ix2>;
