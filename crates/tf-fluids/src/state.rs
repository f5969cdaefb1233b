//! Thermodynamic state definitions.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use tf_core::units::{Pressure, Temperature};

/// Specific heat capacity [J/(kg·K)].
pub type SpecHeatCapacity = f64;

/// Thermodynamic state: pressure, temperature, and composition.
///
/// This is the minimal set of independent properties the `FluidProperties`
/// trait needs; derived properties (density, viscosity, cp) are computed on
/// demand from a state.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermoState {
    p: Pressure,
    t: Temperature,
    comp: Composition,
}

impl ThermoState {
    /// Create a state from pressure, temperature, and composition.
    ///
    /// Validates that pressure and temperature are positive and finite.
    pub fn new(p: Pressure, t: Temperature, comp: Composition) -> FluidResult<Self> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        if !t.value.is_finite() || t.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }

        Ok(Self { p, t, comp })
    }

    /// Get pressure.
    pub fn pressure(&self) -> Pressure {
        self.p
    }

    /// Get temperature.
    pub fn temperature(&self) -> Temperature {
        self.t
    }

    /// Get composition.
    pub fn composition(&self) -> &Composition {
        &self.comp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;
    use tf_core::units::{k, pa};

    #[test]
    fn create_valid_state() {
        let comp = Composition::pure(Species::N2);
        let p = pa(101325.0);
        let t = k(300.0);

        let state = ThermoState::new(p, t, comp).unwrap();
        assert_eq!(state.pressure().value, 101325.0);
        assert_eq!(state.temperature().value, 300.0);
    }

    #[test]
    fn reject_negative_pressure() {
        let comp = Composition::pure(Species::N2);
        let p = pa(-100.0);
        let t = k(300.0);

        let result = ThermoState::new(p, t, comp);
        assert!(result.is_err());
    }

    #[test]
    fn reject_zero_temperature() {
        let comp = Composition::pure(Species::N2);
        let p = pa(101325.0);
        let t = k(0.0);

        let result = ThermoState::new(p, t, comp);
        assert!(result.is_err());
    }

    #[test]
    fn reject_non_finite() {
        let comp = Composition::pure(Species::N2);
        let p = pa(f64::NAN);
        let t = k(300.0);

        let result = ThermoState::new(p, t, comp);
        assert!(result.is_err());
    }
}
