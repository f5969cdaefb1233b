//! tf-fluids: the narrow fluid-property boundary consumed by the pipe-flow
//! solver core.
//!
//! Provides:
//! - Chemical species definitions for water/gas/district-heating grids
//! - Composition handling (pure fluids and mixtures)
//! - Thermodynamic state representation
//! - `FluidProperties` trait for property calculations (rho, mu, cp)
//!
//! # Architecture
//!
//! Fluid property evaluation (density, viscosity, heat capacity as functions
//! of pressure and temperature) is an external-collaborator concern: this
//! crate defines the stable, narrow `FluidProperties` trait the solver core
//! consumes and ships two reference implementations for testing. A real-fluid
//! backend (CoolProp, REFPROP, …) is something a caller plugs in; it is not
//! part of this crate.
//!
//! # Example
//!
//! ```
//! use tf_fluids::{Composition, ConstantFluid, FluidProperties, Species};
//! use tf_core::units::{pa, k};
//!
//! let fluid = ConstantFluid::water();
//! let comp = Composition::pure(Species::H2O);
//! let state = fluid.state(pa(500_000.0), k(300.0), comp).unwrap();
//! let rho = fluid.rho(&state).unwrap();
//! println!("Density: {} kg/m³", rho.value);
//! ```

pub mod composition;
pub mod error;
pub mod model;
pub mod species;
pub mod state;

pub use composition::Composition;
pub use error::{FluidError, FluidResult};
pub use model::{ConstantFluid, FluidProperties, IdealGas};
pub use species::Species;
pub use state::{SpecHeatCapacity, ThermoState};
