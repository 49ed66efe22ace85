//! Ferroelectric capacitor device instance.

use ferrocap_core::{Direction, HistoryManager, ParameterSet};
use ferrocap_solver::{ConvergenceCriteria, SegmentCurve, solve_charge};
use log::{debug, warn};

use crate::checkpoint::HistoryCheckpoint;
use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::relaxation::{NoRelaxation, RelaxationHook};

/// Outcome of one device evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationResult {
    /// Voltage across the capacitor (V).
    pub voltage: f64,
    /// Total charge per area Q = P + εr * ε₀ * V / tFE (C/m²).
    pub charge: f64,
    /// Small-signal capacitance dQ/dV (F/m²).
    pub capacitance: f64,
    /// Solver iterations spent (0 for direct voltage evaluation).
    pub iterations: usize,
    pub converged: bool,
}

impl EvaluationResult {
    /// Polarization part of the charge, given the device's linear capacitance.
    pub fn polarization(&self, linear_capacitance: f64) -> f64 {
        self.charge - linear_capacitance * self.voltage
    }
}

/// A ferroelectric capacitor with Preisach switching history.
///
/// Each instance owns its parameters and history; instances share nothing.
#[derive(Debug)]
pub struct FerroCapacitor {
    /// Device name (e.g., "CFE1").
    pub name: String,
    params: ParameterSet,
    criteria: ConvergenceCriteria,
    history: HistoryManager,
    relaxation: Box<dyn RelaxationHook>,
}

impl FerroCapacitor {
    /// Create a device with default solver settings and an upward initial
    /// polarity.
    pub fn new(name: impl Into<String>, params: ParameterSet) -> Result<Self> {
        Self::with_config(
            name,
            DeviceConfig {
                params,
                ..DeviceConfig::default()
            },
        )
    }

    pub fn with_config(name: impl Into<String>, config: DeviceConfig) -> Result<Self> {
        config.params.validate()?;
        Ok(Self {
            name: name.into(),
            params: config.params,
            criteria: config.criteria,
            history: HistoryManager::new(&config.params, config.initial_polarity),
            relaxation: Box::new(NoRelaxation),
        })
    }

    /// Replace the relaxation hook.
    pub fn with_relaxation(mut self, hook: impl RelaxationHook + 'static) -> Self {
        self.relaxation = Box::new(hook);
        self
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn criteria(&self) -> &ConvergenceCriteria {
        &self.criteria
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn polarity(&self) -> Direction {
        self.history.polarity()
    }

    /// Charge and capacitance at applied voltage `v`.
    ///
    /// The sample is accepted into the history: a change of direction
    /// records a turning point and passing a stored extremum wipes it out.
    /// Evaluating the same voltage twice in a row returns the same result.
    pub fn evaluate_at_voltage(&mut self, v: f64) -> Result<EvaluationResult> {
        let v = self
            .relaxation
            .effective_voltage(v, self.params.delay_constant);
        self.history.observe(v)?;

        let ctx = self.history.active_context()?;
        let (charge, capacitance) = self.history.model().evaluate(v, &ctx);
        Ok(EvaluationResult {
            voltage: v,
            charge,
            capacitance,
            iterations: 0,
            converged: true,
        })
    }

    /// Voltage at which the device holds charge `q`.
    ///
    /// The leg is chosen by comparing `q` with the charge at the last
    /// accepted voltage, and stored extrema whose charge `q` passes are wiped
    /// before the solve. A converged voltage is then accepted into the
    /// history exactly as [`evaluate_at_voltage`](Self::evaluate_at_voltage)
    /// would. A result with `converged = false` leaves the history untouched.
    pub fn solve_for_charge(&mut self, q: f64) -> Result<EvaluationResult> {
        let q = self
            .relaxation
            .effective_charge(q, self.params.delay_constant);
        if self.history.last_voltage().is_none() {
            self.history.observe(0.0)?;
        }

        let (ctx, start) = self.history.context_for_charge(q)?;
        let model = *self.history.model();
        let curve = SegmentCurve::new(&model, ctx);
        let max_step = self.criteria.damping_fraction * self.params.coercive_voltage();
        let result = solve_charge(&curve, q, start, max_step, &self.criteria)?;

        if !result.converged {
            warn!(
                "{}: no convergence for Q = {:e} after {} iterations (last V = {}, residual {:e})",
                self.name,
                q,
                result.iterations,
                result.voltage,
                result.charge - q
            );
            return Ok(EvaluationResult {
                voltage: result.voltage,
                charge: result.charge,
                capacitance: result.derivative,
                iterations: result.iterations,
                converged: false,
            });
        }

        let update = self.history.observe(result.voltage)?;
        let ctx = self.history.active_context()?;
        let (charge, capacitance) = model.evaluate(result.voltage, &ctx);
        if update.reversed || update.wiped > 0 {
            debug!(
                "{}: Q = {:e} solved at {} V in {} iterations (depth {})",
                self.name,
                q,
                result.voltage,
                result.iterations,
                self.history.stack().len()
            );
        }
        Ok(EvaluationResult {
            voltage: result.voltage,
            charge,
            capacitance,
            iterations: result.iterations,
            converged: true,
        })
    }

    /// Like [`solve_for_charge`](Self::solve_for_charge), but a
    /// non-convergent solve is an error.
    pub fn solve_for_charge_strict(&mut self, q: f64) -> Result<EvaluationResult> {
        self.solve_for_charge(q)?.into_converged(&self.name, q)
    }

    /// Accept the current time point in the relaxation hook.
    pub fn advance(&mut self, dt: f64) {
        self.relaxation.advance(dt);
    }

    /// Forget all history, as at the start of a new analysis.
    pub fn reset(&mut self) {
        self.history.reset();
        self.relaxation.reset();
    }

    pub fn checkpoint(&self) -> HistoryCheckpoint {
        HistoryCheckpoint::capture(&self.history)
    }

    /// Replace the history with a checkpoint. On error the current history
    /// is kept.
    pub fn restore(&mut self, checkpoint: HistoryCheckpoint) -> Result<()> {
        match checkpoint.into_history(&self.params) {
            Ok(history) => {
                self.history = history;
                Ok(())
            }
            Err(e) => {
                warn!("{}: rejected checkpoint: {}", self.name, e);
                Err(e)
            }
        }
    }
}

impl EvaluationResult {
    /// Turn a non-convergent result into [`Error::NonConvergent`].
    pub fn into_converged(self, name: &str, target: f64) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(Error::NonConvergent {
                name: name.to_string(),
                target,
                voltage: self.voltage,
                iterations: self.iterations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moderate() -> ParameterSet {
        ParameterSet {
            slope_factor: 4.0,
            thickness: 1e-8,
            saturation_charge: 0.2,
            relative_permittivity: 30.0,
            ..ParameterSet::default()
        }
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let params = ParameterSet {
            saturation_charge: 0.0,
            ..ParameterSet::default()
        };
        assert!(matches!(
            FerroCapacitor::new("CFE1", params),
            Err(Error::Core(ferrocap_core::Error::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn test_rejects_non_finite_samples() {
        let mut cap = FerroCapacitor::new("CFE1", moderate()).unwrap();
        assert!(cap.evaluate_at_voltage(f64::NAN).is_err());
        assert!(cap.solve_for_charge(f64::INFINITY).is_err());
    }

    #[test]
    fn test_repeated_evaluation_is_idempotent() {
        let mut cap = FerroCapacitor::new("CFE1", moderate()).unwrap();
        for v in [0.0, 1.5, -0.4, 0.9] {
            cap.evaluate_at_voltage(v).unwrap();
        }
        let depth = cap.history().stack().len();
        let first = cap.evaluate_at_voltage(0.9).unwrap();
        let second = cap.evaluate_at_voltage(0.9).unwrap();
        assert_eq!(first, second);
        assert_eq!(cap.history().stack().len(), depth);
    }

    #[test]
    fn test_capacitance_is_positive() {
        let mut cap = FerroCapacitor::new("CFE1", ParameterSet::default()).unwrap();
        for i in 0..=60 {
            let r = cap.evaluate_at_voltage(-3.0 + 0.1 * i as f64).unwrap();
            assert!(r.capacitance > 0.0, "C = {} at {} V", r.capacitance, r.voltage);
        }
    }

    #[test]
    fn test_solve_inverts_evaluate() {
        let mut driven = FerroCapacitor::new("CFE1", moderate()).unwrap();
        let mut solved = FerroCapacitor::new("CFE2", moderate()).unwrap();
        for v in [0.0, 0.5, 1.0, 2.0, 1.2, 0.4, -0.3, 0.6] {
            let q = driven.evaluate_at_voltage(v).unwrap().charge;
            let r = solved.solve_for_charge(q).unwrap();
            assert!(r.converged);
            assert!((r.voltage - v).abs() < 1e-6, "{} V recovered as {}", v, r.voltage);
        }
        assert_eq!(
            driven.history().stack().len(),
            solved.history().stack().len()
        );
    }

    #[test]
    fn test_strict_solve_reports_non_convergence() {
        let params = ParameterSet {
            slope_factor: 1e12,
            relative_permittivity: 1e-20,
            ..ParameterSet::default()
        };
        let mut cap = FerroCapacitor::new("CFE1", params).unwrap();
        let err = cap
            .solve_for_charge_strict(10.0 * params.saturation_charge)
            .unwrap_err();
        assert!(matches!(err, Error::NonConvergent { .. }), "{}", err);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut cap = FerroCapacitor::new("CFE1", moderate()).unwrap();
        for v in [0.0, 2.0, -1.0] {
            cap.evaluate_at_voltage(v).unwrap();
        }
        assert!(cap.history().reversals() > 0);
        cap.reset();
        assert!(cap.history().stack().is_empty());
        assert_eq!(cap.history().last_voltage(), None);
    }
}
