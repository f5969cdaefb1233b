//! Heat exchanger, heat source, and heat sink components (SPEC_FULL §4.3.5).
//!
//! A heat exchanger is thermal-only: one of `QEXT` (prescribed heat load),
//! `DELTAT` (prescribed outlet-vs-inlet delta), or `TRETURN` (prescribed
//! outlet temperature) controls the row. `QEXT` needs no special handling
//! beyond the generic thermal kernel (which already reads `qext_w`);
//! `DELTAT`/`TRETURN` snap `TINIT_OUT` to the prescribed value and zero the
//! downstream-temperature Jacobian entry so the node-T equation alone
//! determines the upstream temperature.
//!
//! A heat sink composes heat-exchanger thermal semantics with
//! flow-controller hydraulic semantics (capability-set composition,
//! SPEC_FULL §4.3) — its `create_pit_branch_entries` runs the heat
//! exchanger's initializer, then layers the flow controller's on top,
//! mirroring the two-call composition in the donor's heat sink model.

use crate::derivatives::calculate_derivatives_thermal;
use crate::error::{ComponentError, ComponentResult};
use crate::flow_controller::FlowController;
use crate::traits::{BranchComponent, BranchFluidContext};
use tf_core::pit::{BranchPit, NodePit};

/// A heat exchanger's thermal control setpoint. Exactly one variant is ever
/// active on a given row (SPEC_FULL §3.4 invariant).
#[derive(Debug, Clone, Copy)]
pub enum ThermalSetpoint {
    /// Prescribed heat load [W], positive = heat added to the fluid.
    Qext(f64),
    /// Prescribed outlet-vs-inlet temperature drop [K].
    DeltaT(f64),
    /// Prescribed outlet temperature [K].
    TReturn(f64),
}

#[derive(Debug, Clone)]
pub struct HeatExchanger {
    name: String,
    kind: &'static str,
    diameter_m: f64,
    length_m: f64,
    alpha_w_m2k: f64,
    t_ext_k: f64,
    setpoint: ThermalSetpoint,
}

impl HeatExchanger {
    pub fn new(
        name: impl Into<String>,
        diameter_m: f64,
        length_m: f64,
        alpha_w_m2k: f64,
        t_ext_k: f64,
        setpoint: ThermalSetpoint,
    ) -> ComponentResult<Self> {
        Self::with_kind(name, "heat_exchanger", diameter_m, length_m, alpha_w_m2k, t_ext_k, setpoint)
    }

    /// A heat source: same mechanics as a heat exchanger, logged under a
    /// distinct kind so diagnostics read naturally for a pure heat-input
    /// device (typically `ThermalSetpoint::Qext` with a positive load).
    pub fn heat_source(
        name: impl Into<String>,
        diameter_m: f64,
        length_m: f64,
        setpoint: ThermalSetpoint,
    ) -> ComponentResult<Self> {
        Self::with_kind(name, "heat_source", diameter_m, length_m, 0.0, 293.15, setpoint)
    }

    #[allow(clippy::too_many_arguments)]
    fn with_kind(
        name: impl Into<String>,
        kind: &'static str,
        diameter_m: f64,
        length_m: f64,
        alpha_w_m2k: f64,
        t_ext_k: f64,
        setpoint: ThermalSetpoint,
    ) -> ComponentResult<Self> {
        if diameter_m <= 0.0 || !diameter_m.is_finite() {
            return Err(ComponentError::InvalidArg {
                what: "heat exchanger diameter must be positive and finite",
            });
        }
        if length_m <= 0.0 || !length_m.is_finite() {
            return Err(ComponentError::InvalidArg {
                what: "heat exchanger length must be positive and finite",
            });
        }
        Ok(Self {
            name: name.into(),
            kind,
            diameter_m,
            length_m,
            alpha_w_m2k,
            t_ext_k,
            setpoint,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snap `t_init_out_k` to this setpoint and re-derive the thermal
    /// residual, then zero the downstream-temperature Jacobian entries.
    /// Shared by [`HeatExchanger`] and [`HeatSink`]'s thermal hook.
    fn apply_setpoint(&self, branch: &mut BranchPit, nodes: &NodePit, row: usize, fluid: BranchFluidContext) {
        let t_in = nodes.t_init_k[branch.from_node_t[row]];
        match self.setpoint {
            ThermalSetpoint::Qext(_) => return,
            ThermalSetpoint::DeltaT(deltat) => {
                branch.t_init_out_k[row] = t_in - deltat;
            }
            ThermalSetpoint::TReturn(treturn) => {
                branch.t_init_out_k[row] = treturn;
            }
        }
        calculate_derivatives_thermal(branch, nodes, row, fluid.cp_j_kg_k, fluid.rho_kg_m3);
        branch.jac_deriv_dt1[row] = 0.0;
        branch.jac_deriv_dt_out[row] = 0.0;
    }
}

impl BranchComponent for HeatExchanger {
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn create_pit_branch_entries(&self, branch: &mut BranchPit, row: usize) {
        branch.diameter_m[row] = self.diameter_m;
        branch.area_m2[row] = std::f64::consts::PI * self.diameter_m * self.diameter_m / 4.0;
        branch.length_m[row] = self.length_m;
        branch.alpha_w_m2k[row] = self.alpha_w_m2k;
        branch.t_ext_k[row] = self.t_ext_k;
        match self.setpoint {
            ThermalSetpoint::Qext(q) => branch.qext_w[row] = Some(q),
            ThermalSetpoint::DeltaT(dt) => branch.deltat_k[row] = Some(dt),
            ThermalSetpoint::TReturn(t) => branch.treturn_k[row] = Some(t),
        }
    }

    fn adaption_after_derivatives_thermal(
        &self,
        branch: &mut BranchPit,
        nodes: &NodePit,
        row: usize,
        fluid: BranchFluidContext,
    ) {
        self.apply_setpoint(branch, nodes, row, fluid);
    }
}

/// Heat sink: heat-exchanger thermal control composed with flow-controller
/// hydraulic control (SPEC_FULL §4.3, §4.3.5).
#[derive(Debug, Clone)]
pub struct HeatSink {
    heat_exchanger: HeatExchanger,
    flow_controller: FlowController,
}

impl HeatSink {
    pub fn new(
        name: impl Into<String>,
        diameter_m: f64,
        length_m: f64,
        controlled_mdot_kg_s: f64,
        control_active: bool,
        setpoint: ThermalSetpoint,
    ) -> ComponentResult<Self> {
        let name = name.into();
        let heat_exchanger = HeatExchanger::with_kind(
            name.clone(),
            "heat_sink",
            diameter_m,
            length_m,
            0.0,
            293.15,
            setpoint,
        )?;
        let flow_controller =
            FlowController::new(name, diameter_m, controlled_mdot_kg_s, control_active)?;
        Ok(Self {
            heat_exchanger,
            flow_controller,
        })
    }

    pub fn name(&self) -> &str {
        self.heat_exchanger.name()
    }
}

impl BranchComponent for HeatSink {
    fn kind(&self) -> &'static str {
        "heat_sink"
    }

    fn create_pit_branch_entries(&self, branch: &mut BranchPit, row: usize) {
        self.heat_exchanger.create_pit_branch_entries(branch, row);
        self.flow_controller.create_pit_branch_entries(branch, row);
    }

    fn adaption_before_derivatives_hydraulic(
        &self,
        branch: &mut BranchPit,
        nodes: &NodePit,
        row: usize,
        fluid: BranchFluidContext,
    ) {
        self.flow_controller
            .adaption_before_derivatives_hydraulic(branch, nodes, row, fluid);
    }

    fn adaption_after_derivatives_hydraulic(
        &self,
        branch: &mut BranchPit,
        nodes: &NodePit,
        row: usize,
        fluid: BranchFluidContext,
    ) {
        self.flow_controller
            .adaption_after_derivatives_hydraulic(branch, nodes, row, fluid);
    }

    fn adaption_after_derivatives_thermal(
        &self,
        branch: &mut BranchPit,
        nodes: &NodePit,
        row: usize,
        fluid: BranchFluidContext,
    ) {
        // When TRETURN is set, TINIT_OUT is adjusted by the implied DELTAT
        // before the derivative-zeroing step; `apply_setpoint` already
        // performs that snap directly from TRETURN, matching the donor's
        // `adaption_before_derivatives_thermal`.
        self.heat_exchanger
            .apply_setpoint(branch, nodes, row, fluid);
    }
}
