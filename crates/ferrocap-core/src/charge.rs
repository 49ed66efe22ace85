//! Polarization and total charge on the active hysteresis segment.

use crate::branch::{Branch, Direction};
use crate::params::ParameterSet;
use crate::segment::Segment;

/// The active branch: switching direction plus the segment map for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchContext {
    pub direction: Direction,
    pub scale: f64,
    pub offset: f64,
}

impl BranchContext {
    /// Major loop travelled in `direction`.
    pub fn major(direction: Direction) -> Self {
        Self::on_segment(direction, Segment::MAJOR)
    }

    pub fn on_segment(direction: Direction, segment: Segment) -> Self {
        Self {
            direction,
            scale: segment.scale,
            offset: segment.offset,
        }
    }

    pub fn segment(&self) -> Segment {
        Segment {
            scale: self.scale,
            offset: self.offset,
        }
    }

    pub fn is_major(&self) -> bool {
        self.segment() == Segment::MAJOR
    }
}

/// Charge response of one parameter set.
///
/// `Q` and `dQ` are built on top of `P` and `dP`, which in turn only scale the
/// branch function, so every derivative stays consistent with its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeModel {
    branch: Branch,
    linear_capacitance: f64,
}

impl ChargeModel {
    pub fn new(params: &ParameterSet) -> Self {
        Self {
            branch: Branch::new(params),
            linear_capacitance: params.linear_capacitance(),
        }
    }

    pub fn branch(&self) -> &Branch {
        &self.branch
    }

    /// Linear dielectric capacitance εr * ε₀ / tFE.
    pub fn linear_capacitance(&self) -> f64 {
        self.linear_capacitance
    }

    /// Polarization P(V) on the given segment.
    #[inline]
    pub fn polarization(&self, v: f64, ctx: &BranchContext) -> f64 {
        ctx.scale * self.branch.value(v, ctx.direction) + ctx.offset
    }

    /// dP/dV on the given segment.
    #[inline]
    pub fn d_polarization(&self, v: f64, ctx: &BranchContext) -> f64 {
        ctx.scale * self.branch.derivative(v, ctx.direction)
    }

    /// Total charge Q(V) = P(V) + εr * ε₀ * V / tFE.
    #[inline]
    pub fn charge(&self, v: f64, ctx: &BranchContext) -> f64 {
        self.polarization(v, ctx) + self.linear_capacitance * v
    }

    /// dQ/dV = dP/dV + εr * ε₀ / tFE. Strictly positive for valid parameters.
    #[inline]
    pub fn d_charge(&self, v: f64, ctx: &BranchContext) -> f64 {
        self.d_polarization(v, ctx) + self.linear_capacitance
    }

    /// Charge and its slope together, sharing one `tanh`.
    #[inline]
    pub fn evaluate(&self, v: f64, ctx: &BranchContext) -> (f64, f64) {
        let (f, df) = self.branch.evaluate(v, ctx.direction);
        let p = ctx.scale * f + ctx.offset;
        let dp = ctx.scale * df;
        (p + self.linear_capacitance * v, dp + self.linear_capacitance)
    }

    /// Dielectric (linear) part of the charge at `v`.
    pub fn dielectric_charge(&self, v: f64) -> f64 {
        self.linear_capacitance * v
    }
}
