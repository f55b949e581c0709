//! Finite-difference schemes available for a time step.

use std::{ fmt, str::FromStr };
use serde::{ Deserialize, Deserializer };
use crate::error::UnknownScheme;

/// Selects the update routine used for every step of a
/// [`Solver`][crate::solver::Solver].
///
/// Identifiers are resolved once, at construction; stepping never re-parses
/// them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Forward-time, centered-space (FTCS); explicit.
    #[default]
    Forward,
    /// Backward-time, centered-space (BTCS); implicit.
    Backward,
    /// Crank-Nicolson-style average of the two (CTCS); semi-implicit.
    Centered,
}

impl Scheme {
    /// Single-character tag used by [`Device`][crate::backend::Device]
    /// implementations.
    pub fn as_char(self) -> char {
        match self {
            Self::Forward => 'f',
            Self::Backward => 'b',
            Self::Centered => 'c',
        }
    }

    /// Inverse of [`Self::as_char`].
    pub fn from_char(c: char) -> Result<Self, UnknownScheme> {
        match c.to_ascii_lowercase() {
            'f' => Ok(Self::Forward),
            'b' => Ok(Self::Backward),
            'c' => Ok(Self::Centered),
            _ => Err(UnknownScheme(c.to_string())),
        }
    }

    /// Conventional time step for each scheme on the default 101 × 101 grid
    /// spanning [-10, 10]².
    ///
    /// The implicit schemes tolerate much larger steps than the explicit one.
    pub fn default_dt(self) -> f64 {
        match self {
            Self::Forward => 0.02 / 800.0,
            Self::Backward => 0.02 / 40.0,
            Self::Centered => 0.02 / 4.0,
        }
    }

    /// Whether numerics for this scheme exist.
    pub fn is_implemented(self) -> bool { matches!(self, Self::Forward) }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
            Self::Centered => write!(f, "centered"),
        }
    }
}

impl FromStr for Scheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "ftcs" | "f" => Ok(Self::Forward),
            "backward" | "btcs" | "b" => Ok(Self::Backward),
            "centered" | "ctcs" | "c" => Ok(Self::Centered),
            _ => Err(UnknownScheme(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Scheme {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de>
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
