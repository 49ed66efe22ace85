//! Physical parameters of a ferroelectric capacitor.

use serde::{Deserialize, Serialize};

use crate::constants::EPSILON_0;
use crate::error::{Error, Result};

/// Ferroelectric capacitor model parameters.
///
/// Charges are per unit area (C/m²), so the linear dielectric term
/// `εr * ε₀ * V / tFE` shares the same units as the polarization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    /// Ferroelectric film thickness tFE (m). Default: 5e-9.
    pub thickness: f64,
    /// Coercive field Ec (V/m). Default: 1e8.
    pub coercive_field: f64,
    /// Relative permittivity of the ferroelectric. Default: 300.
    pub relative_permittivity: f64,
    /// Saturation charge Qs (C/m²). Default: 5e-6.
    pub saturation_charge: f64,
    /// Branch steepness a (1/V). Default: 1e6.
    pub slope_factor: f64,
    /// Relaxation delay constant (s). Default: 0 (instantaneous switching).
    pub delay_constant: f64,
    /// Vacuum permittivity (F/m). Default: ε₀.
    pub vacuum_permittivity: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            thickness: 5e-9,
            coercive_field: 1e8,
            relative_permittivity: 300.0,
            saturation_charge: 5e-6,
            slope_factor: 1e6,
            delay_constant: 0.0,
            vacuum_permittivity: EPSILON_0,
        }
    }
}

impl ParameterSet {
    /// Build a parameter set and validate it.
    pub fn new(
        thickness: f64,
        coercive_field: f64,
        relative_permittivity: f64,
        saturation_charge: f64,
        slope_factor: f64,
    ) -> Result<Self> {
        let params = Self {
            thickness,
            coercive_field,
            relative_permittivity,
            saturation_charge,
            slope_factor,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Return a copy with the given relaxation delay constant.
    pub fn with_delay_constant(mut self, delay_constant: f64) -> Self {
        self.delay_constant = delay_constant;
        self
    }

    /// Check every field against its physical domain.
    pub fn validate(&self) -> Result<()> {
        let strictly_positive = [
            ("thickness", self.thickness),
            ("coercive_field", self.coercive_field),
            ("relative_permittivity", self.relative_permittivity),
            ("saturation_charge", self.saturation_charge),
            ("slope_factor", self.slope_factor),
            ("vacuum_permittivity", self.vacuum_permittivity),
        ];
        for (name, value) in strictly_positive {
            if !value.is_finite() {
                return Err(Error::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite",
                });
            }
            if value <= 0.0 {
                return Err(Error::InvalidParameter {
                    name,
                    value,
                    reason: "must be strictly positive",
                });
            }
        }

        if !self.delay_constant.is_finite() || self.delay_constant < 0.0 {
            return Err(Error::InvalidParameter {
                name: "delay_constant",
                value: self.delay_constant,
                reason: "must be finite and non-negative",
            });
        }

        Ok(())
    }

    /// Coercive voltage Vc = Ec * tFE (V), the centre of each major branch.
    pub fn coercive_voltage(&self) -> f64 {
        self.coercive_field * self.thickness
    }

    /// Linear dielectric capacitance per area εr * ε₀ / tFE (F/m²).
    pub fn linear_capacitance(&self) -> f64 {
        self.relative_permittivity * self.vacuum_permittivity / self.thickness
    }
}
