//! Theoretical background.
//!
//! # Contents
//! - [Background](#background)
//! - [Discretization](#discretization)
//! - [Boundary conditions](#boundary-conditions)
//! - [Stability](#stability)
//! - [Implicit schemes](#implicit-schemes)
//!
//! # Background
//! The time-dependent Schrödinger equation (TDSE) for a particle of mass *m*
//! moving in a static, two-dimensional potential *V*(*x*, *y*) reads
//! ```text
//!   ∂ψ     ħ²  ∂²ψ   ∂²ψ
//! iħ -- = - --- (--- + ---) + V ψ
//!   ∂t     2 m  ∂x²   ∂y²
//! ```
//! Writing ψ = *R* + *i* *I* and separating real and imaginary parts gives a
//! pair of coupled, real-valued equations,
//! ```text
//! ∂R      ħ          V
//! -- = - --- ∇² I + --- I
//! ∂t     2 m         ħ
//!
//! ∂I      ħ          V
//! -- = + --- ∇² R - --- R
//! ∂t     2 m         ħ
//! ```
//! so that each part is driven only by the other. This is the form used
//! throughout this crate: *R* and *I* are kept as two separate `f64` grids
//! rather than a single complex one.
//!
//! # Discretization
//! On a uniform grid with spacings *δx* (along columns) and *δy* (along rows),
//! the Laplacian is replaced by the usual five-point stencil,
//! ```text
//!          f[i, j+1] - 2 f[i, j] + f[i, j-1]   f[i+1, j] - 2 f[i, j] + f[i-1, j]
//! ∇² f  ≈  --------------------------------- + ---------------------------------
//!                        δx²                                 δy²
//! ```
//! which has an *O*(*δx*², *δy*²) error term. Collecting the diagonal terms
//! with the potential, define
//! ```text
//!        ħ              ħ                V
//! cx = -------   cy = -------   P = - --- - 2 cx - 2 cy
//!      2 m δx²        2 m δy²          ħ
//! ```
//! The forward (FTCS) scheme then takes a single Euler step in time:
//! ```text
//! R' = R - δt (P I + cx (I[i, j+1] + I[i, j-1]) + cy (I[i-1, j] + I[i+1, j]))
//! I' = I + δt (P R + cx (R[i, j+1] + R[i, j-1]) + cy (R[i-1, j] + R[i+1, j]))
//! ```
//! Every cell's update depends only on the previous step, so all cells can be
//! computed independently (and in parallel), as long as the previous step is
//! never overwritten while it's still being read.
//!
//! # Boundary conditions
//! Rather than branching on whether a neighbor lies outside the domain, every
//! grid is stored inside a one-cell ring of zeros (see [`grid`][crate::grid]).
//! Stencil reads that fall off the domain land on the ring and read zero,
//! which is exactly the discrete form of a Dirichlet condition ψ = 0 just
//! outside the grid: the particle sits in an infinitely deep box whose walls
//! enclose the computational domain. The ring is never written, so the
//! condition holds at every step.
//!
//! # Stability
//! The forward scheme is explicit, which makes it cheap (no linear solve) but
//! only conditionally well-behaved: the amplification of each Fourier mode
//! grows with δt relative to *m* *δx*² / ħ, and for too-large steps ψ blows up
//! within a handful of iterations. A convenient rule of thumb is
//! ```text
//!              1
//! |δt| ≲ ------------
//!        2 (cx + cy)
//! ```
//! available as [`Params::ftcs_dt_limit`][crate::timedep::Params::ftcs_dt_limit].
//! Even below this limit the scheme doesn't conserve the norm of ψ exactly,
//! so long runs should be checked with [`utils::norm`][crate::utils::norm].
//!
//! # Implicit schemes
//! The backward (BTCS) scheme evaluates the right-hand side at the new time
//! instead,
//! ```text
//! (1 + i δt H) ψ' = ψ
//! ```
//! and the centered (Crank-Nicolson-style, CTCS) scheme averages the two,
//! ```text
//! (1 + i δt H / 2) ψ' = (1 - i δt H / 2) ψ
//! ```
//! Both require a sparse linear solve over the whole grid per step, in
//! exchange for unconditional stability (and, for CTCS, exact unitarity).
//! They are declared in [`Scheme`][crate::scheme::Scheme] and routed by
//! [`timedep::step`][crate::timedep::step], but stepping with them currently
//! returns [`TError::Unimplemented`][crate::error::TError::Unimplemented].
