//! Linear maps from the canonical branch onto minor-loop segments.

use crate::error::{Error, Result};

/// A turning point in segment coordinates: the polarization reached there and
/// the value of the active branch function at its voltage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPoint {
    /// Voltage of the turning point (V). Only used for diagnostics.
    pub voltage: f64,
    /// Polarization at the turning point.
    pub polarization: f64,
    /// Branch function value F(voltage, dir) for the active direction.
    pub branch: f64,
}

/// Scale and offset that place the branch curve through two turning points:
/// `P(V) = scale * F(V) + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub scale: f64,
    pub offset: f64,
}

impl Segment {
    /// The outer major loop.
    pub const MAJOR: Segment = Segment {
        scale: 1.0,
        offset: 0.0,
    };

    /// A segment with no switching: polarization held at `polarization`.
    pub fn flat(polarization: f64) -> Self {
        Self {
            scale: 0.0,
            offset: polarization,
        }
    }

    /// Solve for the segment through `a` and `b`:
    ///
    /// ```text
    /// m = (aP - bP) / (aF - bF)
    /// b = (bP * aF - aP * bF) / (aF - bF)
    /// ```
    ///
    /// `tolerance` is the smallest branch-value separation accepted; closer
    /// points are reported as [`Error::DegenerateSegment`].
    pub fn between(a: SegmentPoint, b: SegmentPoint, tolerance: f64) -> Result<Self> {
        let df = a.branch - b.branch;
        if df.abs() <= tolerance || !df.is_finite() {
            return Err(Error::DegenerateSegment {
                branch: a.branch,
                voltage_a: a.voltage,
                voltage_b: b.voltage,
            });
        }

        Ok(Self {
            scale: (a.polarization - b.polarization) / df,
            offset: (b.polarization * a.branch - a.polarization * b.branch) / df,
        })
    }

    /// Map a branch value onto this segment.
    #[inline]
    pub fn apply(&self, branch: f64) -> f64 {
        self.scale * branch + self.offset
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::MAJOR
    }
}
