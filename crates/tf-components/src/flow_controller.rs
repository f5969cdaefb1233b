//! Flow controller component (SPEC_FULL §4.3.4).
//!
//! When `control_active`, forces `v` to a controlled mass flow: the branch
//! row becomes `v - v_set = 0`, and the hydraulic pressure drop is relaxed
//! to a Lagrange-style entry that lets the upstream pressure float (the
//! pressure-drop equation is dropped from this row entirely; continuity at
//! the endpoint nodes is what ties the upstream pressure down).

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{BranchComponent, BranchFluidContext};
use tf_core::pit::{BranchPit, NodePit};

#[derive(Debug, Clone)]
pub struct FlowController {
    name: String,
    diameter_m: f64,
    controlled_mdot_kg_s: f64,
    control_active: bool,
}

impl FlowController {
    pub fn new(
        name: impl Into<String>,
        diameter_m: f64,
        controlled_mdot_kg_s: f64,
        control_active: bool,
    ) -> ComponentResult<Self> {
        if diameter_m <= 0.0 || !diameter_m.is_finite() {
            return Err(ComponentError::InvalidArg {
                what: "flow controller diameter must be positive and finite",
            });
        }
        if !controlled_mdot_kg_s.is_finite() {
            return Err(ComponentError::InvalidArg {
                what: "controlled mass flow must be finite",
            });
        }
        Ok(Self {
            name: name.into(),
            diameter_m,
            controlled_mdot_kg_s,
            control_active,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controlled_mdot_kg_s(&self) -> f64 {
        self.controlled_mdot_kg_s
    }

    pub fn set_control_active(&mut self, active: bool) {
        self.control_active = active;
    }

    fn controlled_velocity(&self, area_m2: f64, rho: f64) -> f64 {
        self.controlled_mdot_kg_s / (rho * area_m2)
    }
}

impl BranchComponent for FlowController {
    fn kind(&self) -> &'static str {
        "flow_controller"
    }

    fn create_pit_branch_entries(&self, branch: &mut BranchPit, row: usize) {
        branch.diameter_m[row] = self.diameter_m;
        branch.area_m2[row] = std::f64::consts::PI * self.diameter_m * self.diameter_m / 4.0;
        branch.mass_kg_s[row] = Some(self.controlled_mdot_kg_s);
        branch.control_active[row] = self.control_active;
    }

    fn adaption_before_derivatives_hydraulic(
        &self,
        branch: &mut BranchPit,
        _nodes: &NodePit,
        row: usize,
        fluid: BranchFluidContext,
    ) {
        if self.control_active {
            branch.v_init_m_s[row] =
                self.controlled_velocity(branch.area_m2[row], fluid.rho_kg_m3);
        }
    }

    fn adaption_after_derivatives_hydraulic(
        &self,
        branch: &mut BranchPit,
        _nodes: &NodePit,
        row: usize,
        fluid: BranchFluidContext,
    ) {
        if !self.control_active {
            return;
        }
        let v_set = self.controlled_velocity(branch.area_m2[row], fluid.rho_kg_m3);
        branch.jac_deriv_dv[row] = 1.0;
        branch.jac_deriv_dp[row] = 0.0;
        branch.jac_deriv_dp1[row] = 0.0;
        branch.load_vec_branch[row] = -(branch.v_init_m_s[row] - v_set);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::ids::{CompId, Id};
    use tf_core::pit::BoundaryKind;

    fn test_fluid_ctx() -> BranchFluidContext {
        BranchFluidContext {
            rho_kg_m3: 998.2,
            mu_pa_s: 1.002e-3,
            cp_j_kg_k: 4182.0,
        }
    }

    fn network() -> (NodePit, BranchPit) {
        let mut nodes = NodePit::default();
        nodes.push(
            Id::from_index(0),
            5.0,
            300.0,
            0.0,
            1.0,
            293.15,
            0.0,
            0.0,
            BoundaryKind::DirichletPressure,
            BoundaryKind::Free,
        );
        nodes.push(
            Id::from_index(1),
            4.0,
            300.0,
            0.0,
            1.0,
            293.15,
            0.0,
            0.0,
            BoundaryKind::Free,
            BoundaryKind::Free,
        );
        let mut branch = BranchPit::default();
        branch.push(CompId::from_index(0), 0, 1, 0.1, 1.0, 0.0);
        (nodes, branch)
    }

    #[test]
    fn rejects_bad_diameter() {
        assert!(FlowController::new("fc", -1.0, 1.0, true).is_err());
    }

    #[test]
    fn inactive_controller_leaves_row_untouched() {
        let fc = FlowController::new("fc", 0.1, 2.0, false).unwrap();
        let (nodes, mut branch) = network();
        fc.create_pit_branch_entries(&mut branch, 0);
        branch.v_init_m_s[0] = 0.5;
        fc.adaption_before_derivatives_hydraulic(&mut branch, &nodes, 0, test_fluid_ctx());
        assert_eq!(branch.v_init_m_s[0], 0.5);
    }

    #[test]
    fn active_controller_clamps_velocity_and_sets_lagrange_row() {
        let fc = FlowController::new("fc", 0.1, 5.0, true).unwrap();
        let (nodes, mut branch) = network();
        fc.create_pit_branch_entries(&mut branch, 0);
        fc.adaption_before_derivatives_hydraulic(&mut branch, &nodes, 0, test_fluid_ctx());
        let expected_v = 5.0 / (998.2 * branch.area_m2[0]);
        assert!((branch.v_init_m_s[0] - expected_v).abs() < 1e-9);

        fc.adaption_after_derivatives_hydraulic(&mut branch, &nodes, 0, test_fluid_ctx());
        assert_eq!(branch.jac_deriv_dv[0], 1.0);
        assert_eq!(branch.jac_deriv_dp[0], 0.0);
        assert_eq!(branch.jac_deriv_dp1[0], 0.0);
        assert!(branch.load_vec_branch[0].abs() < 1e-9);
    }
}
