//! Fluid property trait and validation helpers.
//!
//! This crate deliberately stays narrow: the pipe-flow solver core consumes
//! fluid properties exclusively through the four methods on `FluidProperties`
//! below. Real-fluid backends (CoolProp, NIST REFPROP, …) are an external
//! collaborator concern and are not implemented here — callers supply their
//! own `FluidProperties` impl, or use one of the two reference
//! implementations (`ConstantFluid`, `IdealGas`) this crate ships for testing.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::state::{SpecHeatCapacity, ThermoState};
use tf_core::units::{Density, DynVisc, Pressure, Temperature};

/// Trait for fluid property models consumed by the solver core.
///
/// Implementations must be thread-safe (`Send + Sync`) since per-branch
/// derivative evaluation may run in parallel (SPEC_FULL §5).
pub trait FluidProperties: Send + Sync {
    /// Model name, for logging/diagnostics.
    fn name(&self) -> &str;

    /// Density [kg/m³] at the given state.
    fn rho(&self, state: &ThermoState) -> FluidResult<Density>;

    /// Dynamic viscosity [Pa·s] at the given state.
    fn mu(&self, state: &ThermoState) -> FluidResult<DynVisc>;

    /// Specific heat capacity at constant pressure [J/(kg·K)] at the given state.
    fn cp(&self, state: &ThermoState) -> FluidResult<SpecHeatCapacity>;

    /// Construct a state from pressure, temperature, and composition.
    fn state(
        &self,
        p: Pressure,
        t: Temperature,
        comp: Composition,
    ) -> FluidResult<ThermoState> {
        ThermoState::new(p, t, comp)
    }
}

/// Incompressible, temperature-independent fluid (e.g. water at a fixed
/// reference state). Density, viscosity, and cp are constant.
///
/// In bidirectional coupling mode this makes the thermal phase a no-op
/// coupling on the hydraulic phase (SPEC_FULL §4.6): the outer loop converges
/// in one iteration since `rho` never depends on `T`.
#[derive(Debug, Clone, Copy)]
pub struct ConstantFluid {
    rho_kg_m3: f64,
    mu_pa_s: f64,
    cp_j_kg_k: f64,
}

impl ConstantFluid {
    /// Reference properties for liquid water near 20 °C / 1 atm.
    pub fn water() -> Self {
        Self {
            rho_kg_m3: 998.2,
            mu_pa_s: 1.002e-3,
            cp_j_kg_k: 4182.0,
        }
    }

    pub fn new(rho_kg_m3: f64, mu_pa_s: f64, cp_j_kg_k: f64) -> FluidResult<Self> {
        if rho_kg_m3 <= 0.0 || !rho_kg_m3.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "density must be positive and finite",
            });
        }
        if mu_pa_s <= 0.0 || !mu_pa_s.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "viscosity must be positive and finite",
            });
        }
        if cp_j_kg_k <= 0.0 || !cp_j_kg_k.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "cp must be positive and finite",
            });
        }
        Ok(Self {
            rho_kg_m3,
            mu_pa_s,
            cp_j_kg_k,
        })
    }
}

impl FluidProperties for ConstantFluid {
    fn name(&self) -> &str {
        "constant"
    }

    fn rho(&self, _state: &ThermoState) -> FluidResult<Density> {
        use uom::si::mass_density::kilogram_per_cubic_meter;
        Ok(Density::new::<kilogram_per_cubic_meter>(self.rho_kg_m3))
    }

    fn mu(&self, _state: &ThermoState) -> FluidResult<DynVisc> {
        use uom::si::dynamic_viscosity::pascal_second;
        Ok(DynVisc::new::<pascal_second>(self.mu_pa_s))
    }

    fn cp(&self, _state: &ThermoState) -> FluidResult<SpecHeatCapacity> {
        Ok(self.cp_j_kg_k)
    }
}

/// Ideal-gas fluid: density follows `p = rho R T / M`, viscosity and cp are
/// held constant (a common simplification for gas-distribution-grid studies
/// where compressibility matters far more than viscosity/cp variation).
#[derive(Debug, Clone, Copy)]
pub struct IdealGas {
    molar_mass_kg_kmol: f64,
    mu_pa_s: f64,
    cp_j_kg_k: f64,
}

const GAS_CONSTANT_J_PER_KMOL_K: f64 = 8314.462_618;

impl IdealGas {
    /// Natural gas (approximated as pure methane).
    pub fn natural_gas() -> Self {
        Self {
            molar_mass_kg_kmol: 16.043,
            mu_pa_s: 1.1e-5,
            cp_j_kg_k: 2220.0,
        }
    }

    pub fn new(molar_mass_kg_kmol: f64, mu_pa_s: f64, cp_j_kg_k: f64) -> FluidResult<Self> {
        if molar_mass_kg_kmol <= 0.0 || !molar_mass_kg_kmol.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "molar mass must be positive and finite",
            });
        }
        if mu_pa_s <= 0.0 || !mu_pa_s.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "viscosity must be positive and finite",
            });
        }
        if cp_j_kg_k <= 0.0 || !cp_j_kg_k.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "cp must be positive and finite",
            });
        }
        Ok(Self {
            molar_mass_kg_kmol,
            mu_pa_s,
            cp_j_kg_k,
        })
    }
}

impl FluidProperties for IdealGas {
    fn name(&self) -> &str {
        "ideal-gas"
    }

    fn rho(&self, state: &ThermoState) -> FluidResult<Density> {
        use uom::si::mass_density::kilogram_per_cubic_meter;
        let specific_r = GAS_CONSTANT_J_PER_KMOL_K / self.molar_mass_kg_kmol;
        let rho_val = state.pressure().value / (specific_r * state.temperature().value);
        validation::validate_density_value(rho_val)?;
        Ok(Density::new::<kilogram_per_cubic_meter>(rho_val))
    }

    fn mu(&self, _state: &ThermoState) -> FluidResult<DynVisc> {
        use uom::si::dynamic_viscosity::pascal_second;
        Ok(DynVisc::new::<pascal_second>(self.mu_pa_s))
    }

    fn cp(&self, _state: &ThermoState) -> FluidResult<SpecHeatCapacity> {
        Ok(self.cp_j_kg_k)
    }
}

/// Validation helpers for fluid properties.
pub(crate) mod validation {
    use super::*;

    pub fn validate_density_value(rho: f64) -> FluidResult<()> {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "density must be positive and finite",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;
    use tf_core::units::{k, pa};

    #[test]
    fn constant_fluid_water_properties() {
        let fluid = ConstantFluid::water();
        let comp = Composition::pure(Species::H2O);
        let state = fluid.state(pa(500_000.0), k(300.0), comp).unwrap();

        assert!((fluid.rho(&state).unwrap().value - 998.2).abs() < 1e-9);
        assert!(fluid.mu(&state).unwrap().value > 0.0);
        assert!(fluid.cp(&state).unwrap() > 0.0);
    }

    #[test]
    fn ideal_gas_density_scales_with_pressure() {
        let fluid = IdealGas::natural_gas();
        let comp = Composition::pure(Species::CH4);
        let low = fluid.state(pa(100_000.0), k(300.0), comp.clone()).unwrap();
        let high = fluid.state(pa(500_000.0), k(300.0), comp).unwrap();

        let rho_low = fluid.rho(&low).unwrap().value;
        let rho_high = fluid.rho(&high).unwrap().value;
        assert!(rho_high > rho_low * 4.0);
    }

    #[test]
    fn ideal_gas_density_scales_inversely_with_temperature() {
        let fluid = IdealGas::natural_gas();
        let comp = Composition::pure(Species::CH4);
        let cold = fluid.state(pa(200_000.0), k(250.0), comp.clone()).unwrap();
        let hot = fluid.state(pa(200_000.0), k(500.0), comp).unwrap();

        let rho_cold = fluid.rho(&cold).unwrap().value;
        let rho_hot = fluid.rho(&hot).unwrap().value;
        assert!(rho_cold > rho_hot);
    }

    #[test]
    fn reject_invalid_constant_fluid() {
        assert!(ConstantFluid::new(-1.0, 1e-3, 4000.0).is_err());
        assert!(ConstantFluid::new(1000.0, -1e-3, 4000.0).is_err());
        assert!(ConstantFluid::new(1000.0, 1e-3, -4000.0).is_err());
    }
}
