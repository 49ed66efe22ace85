//! Monotone charge curves the solvers operate on.

use ferrocap_core::{BranchContext, ChargeModel};

/// A charge-voltage relation `V -> (Q, dQ/dV)` with `dQ/dV > 0`.
pub trait ChargeCurve {
    /// Charge and its slope at voltage `v`.
    fn evaluate(&self, v: f64) -> (f64, f64);
}

impl<F> ChargeCurve for F
where
    F: Fn(f64) -> (f64, f64),
{
    fn evaluate(&self, v: f64) -> (f64, f64) {
        self(v)
    }
}

/// The charge curve of one hysteresis segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentCurve<'a> {
    model: &'a ChargeModel,
    ctx: BranchContext,
}

impl<'a> SegmentCurve<'a> {
    pub fn new(model: &'a ChargeModel, ctx: BranchContext) -> Self {
        Self { model, ctx }
    }

    pub fn context(&self) -> &BranchContext {
        &self.ctx
    }
}

impl ChargeCurve for SegmentCurve<'_> {
    #[inline]
    fn evaluate(&self, v: f64) -> (f64, f64) {
        self.model.evaluate(v, &self.ctx)
    }
}
