//! Component hook protocol (SPEC_FULL §4.3).
//!
//! Each component kind implements a subset of six hooks, called in a fixed
//! order per Newton iteration by the solver's assembly loop. A component
//! reads and writes only its own branch row (`row`) and the two endpoint
//! rows in the `NodePit`; cross-component coupling happens exclusively
//! through node rows.
//!
//! Components that the donor models via multiple inheritance (a heat sink
//! composing heat-exchanger and flow-controller behavior) are expressed
//! here as one component whose hook bodies call into the constituent
//! behaviors in sequence, rather than as a trait hierarchy.

use tf_core::pit::{BranchPit, NodePit};

/// Fluid properties at a branch's current local state, as evaluated by the
/// solver from its `FluidProperties` implementation before calling the
/// hook. Components never construct this themselves; it is threaded
/// through by the caller running the Newton iteration.
#[derive(Debug, Clone, Copy)]
pub struct BranchFluidContext {
    pub rho_kg_m3: f64,
    pub mu_pa_s: f64,
    pub cp_j_kg_k: f64,
}

/// One row's worth of component behavior in the branch PIT.
pub trait BranchComponent: Send + Sync {
    /// Human-readable kind, for logging/diagnostics.
    fn kind(&self) -> &'static str;

    /// Fill this component's row in the branch PIT with its static
    /// parameters (geometry, setpoints, control flags). Called once per
    /// component when the network is built.
    fn create_pit_branch_entries(&self, branch: &mut BranchPit, row: usize);

    /// Mutate setpoint-driven state before the hydraulic derivative kernel
    /// runs (e.g. a flow controller clamping `v_init` to its controlled
    /// flow). Default: no-op.
    fn adaption_before_derivatives_hydraulic(
        &self,
        _branch: &mut BranchPit,
        _nodes: &NodePit,
        _row: usize,
        _fluid: BranchFluidContext,
    ) {
    }

    /// Post-process hydraulic derivatives after the generic friction kernel
    /// has run (pump characteristic, closed valve, flow-controller Lagrange
    /// row). Default: no-op, meaning the row keeps the generic derivatives.
    fn adaption_after_derivatives_hydraulic(
        &self,
        _branch: &mut BranchPit,
        _nodes: &NodePit,
        _row: usize,
        _fluid: BranchFluidContext,
    ) {
    }

    /// Mutate setpoint-driven state before the thermal derivative kernel
    /// runs. Default: no-op.
    fn adaption_before_derivatives_thermal(
        &self,
        _branch: &mut BranchPit,
        _nodes: &NodePit,
        _row: usize,
        _fluid: BranchFluidContext,
    ) {
    }

    /// Post-process thermal derivatives after the generic advection kernel
    /// has run (heat exchanger / heat sink / heat source control).
    /// Default: no-op.
    fn adaption_after_derivatives_thermal(
        &self,
        _branch: &mut BranchPit,
        _nodes: &NodePit,
        _row: usize,
        _fluid: BranchFluidContext,
    ) {
    }
}
