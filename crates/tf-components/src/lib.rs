//! tf-components: branch component library for pipe network solving.
//!
//! Each component implements [`BranchComponent`], the six-hook protocol the
//! solver drives once per Newton iteration:
//! - Pipes (generic friction loss, straight Darcy-Weisbach/advection rows)
//! - Pumps (pressure-rise characteristics)
//! - Valves (open/closed, loss scaled by opening)
//! - Flow controllers (prescribed mass flow, Lagrange-style row)
//! - Heat exchangers / heat sources / heat sinks (thermal setpoints, with
//!   heat sinks composing thermal control with flow control)
//!
//! Components operate directly on `tf_core::pit` columns rather than owning
//! state: all component state lives in the `BranchPit`/`NodePit` the solver
//! assembles, and a component instance is just the read-only parameters and
//! behavior used to fill and update its row.
//!
//! # Example
//!
//! ```no_run
//! use tf_components::{BranchComponent, Pipe};
//! use tf_core::pit::{BranchPit, NodePit};
//!
//! let pipe = Pipe::new("p1", 0.1, 50.0, 0.1, 5.0, 283.15).unwrap();
//! let mut branch = BranchPit::default();
//! branch.push(tf_core::ids::CompId::from_index(0), 0, 1, 0.1, 50.0, 0.1);
//! pipe.create_pit_branch_entries(&mut branch, 0);
//! ```

pub mod common;
pub mod derivatives;
pub mod error;
pub mod flow_controller;
pub mod friction;
pub mod heat_exchanger;
pub mod pipe;
pub mod pump;
pub mod traits;
pub mod valve;

// Re-exports
pub use error::{ComponentError, ComponentResult};
pub use flow_controller::FlowController;
pub use friction::FrictionModel;
pub use heat_exchanger::{HeatExchanger, HeatSink, ThermalSetpoint};
pub use pipe::Pipe;
pub use pump::{Pump, PumpCurve};
pub use traits::{BranchComponent, BranchFluidContext};
pub use valve::Valve;
