//! Major-loop branch functions.
//!
//! Each switching direction has a saturating S-curve centred at the coercive
//! voltage of that direction:
//!
//! ```text
//! F(V, dir)  = Qs * tanh(a * (V - dir * Vc))
//! F'(V, dir) = Qs * a * sech²(a * (V - dir * Vc))
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::ParameterSet;

/// Direction of voltage travel, and therefore of polarization switching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increasing voltage (ascending branch, centred at +Vc).
    Up,
    /// Decreasing voltage (descending branch, centred at -Vc).
    Down,
}

impl Direction {
    /// +1.0 for `Up`, -1.0 for `Down`.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Direction of travel from `from` to `to`, or `None` if they are equal.
    pub fn between(from: f64, to: f64) -> Option<Self> {
        if to > from {
            Some(Direction::Up)
        } else if to < from {
            Some(Direction::Down)
        } else {
            None
        }
    }

    /// True if `v` lies at or beyond `limit` when travelling in this direction.
    pub fn reaches(self, v: f64, limit: f64) -> bool {
        match self {
            Direction::Up => v >= limit,
            Direction::Down => v <= limit,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// The canonical branch curve of one parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    saturation_charge: f64,
    slope_factor: f64,
    coercive_voltage: f64,
}

impl Branch {
    pub fn new(params: &ParameterSet) -> Self {
        Self {
            saturation_charge: params.saturation_charge,
            slope_factor: params.slope_factor,
            coercive_voltage: params.coercive_voltage(),
        }
    }

    /// Saturation charge Qs (C/m²).
    pub fn saturation_charge(&self) -> f64 {
        self.saturation_charge
    }

    /// Coercive voltage Vc (V).
    pub fn coercive_voltage(&self) -> f64 {
        self.coercive_voltage
    }

    /// Limit of the branch as the voltage runs off in `dir`: `dir * Qs`.
    pub fn saturation(&self, dir: Direction) -> f64 {
        dir.sign() * self.saturation_charge
    }

    #[inline]
    fn argument(&self, v: f64, dir: Direction) -> f64 {
        self.slope_factor * (v - dir.sign() * self.coercive_voltage)
    }

    /// Branch value F(V, dir).
    #[inline]
    pub fn value(&self, v: f64, dir: Direction) -> f64 {
        self.saturation_charge * self.argument(v, dir).tanh()
    }

    /// Branch slope F'(V, dir).
    ///
    /// `sech²` is evaluated as `1 - tanh²`, which saturates to zero instead of
    /// overflowing `cosh` for large arguments.
    #[inline]
    pub fn derivative(&self, v: f64, dir: Direction) -> f64 {
        let t = self.argument(v, dir).tanh();
        self.saturation_charge * self.slope_factor * (1.0 - t * t)
    }

    /// Branch value and slope together.
    #[inline]
    pub fn evaluate(&self, v: f64, dir: Direction) -> (f64, f64) {
        let t = self.argument(v, dir).tanh();
        (
            self.saturation_charge * t,
            self.saturation_charge * self.slope_factor * (1.0 - t * t),
        )
    }
}
