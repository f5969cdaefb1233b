//! Valve component (SPEC_FULL §4.3.3): two modes, open (friction scaled by
//! an opening factor) or closed (identity equation `v = 0`).

use crate::derivatives::calculate_derivatives_hydraulic;
use crate::error::{ComponentError, ComponentResult};
use crate::friction::FrictionModel;
use crate::traits::{BranchComponent, BranchFluidContext};
use tf_core::pit::{BranchPit, NodePit};

#[derive(Debug, Clone)]
pub struct Valve {
    name: String,
    diameter_m: f64,
    length_m: f64,
    /// Fractional opening in `[0, 1]`. `0.0` forces the closed branch.
    opening: f64,
}

impl Valve {
    pub fn new(
        name: impl Into<String>,
        diameter_m: f64,
        length_m: f64,
        opening: f64,
    ) -> ComponentResult<Self> {
        if diameter_m <= 0.0 || !diameter_m.is_finite() {
            return Err(ComponentError::InvalidArg {
                what: "valve diameter must be positive and finite",
            });
        }
        if !(0.0..=1.0).contains(&opening) {
            return Err(ComponentError::InvalidArg {
                what: "valve opening must be within [0, 1]",
            });
        }
        Ok(Self {
            name: name.into(),
            diameter_m,
            length_m: length_m.max(1e-6),
            opening,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.opening <= 0.0
    }

    pub fn set_opening(&mut self, opening: f64) -> ComponentResult<()> {
        if !(0.0..=1.0).contains(&opening) {
            return Err(ComponentError::InvalidArg {
                what: "valve opening must be within [0, 1]",
            });
        }
        self.opening = opening;
        Ok(())
    }
}

impl BranchComponent for Valve {
    fn kind(&self) -> &'static str {
        "valve"
    }

    fn create_pit_branch_entries(&self, branch: &mut BranchPit, row: usize) {
        branch.diameter_m[row] = self.diameter_m;
        branch.area_m2[row] = std::f64::consts::PI * self.diameter_m * self.diameter_m / 4.0;
        branch.length_m[row] = self.length_m;
        branch.closed[row] = self.is_closed();
    }

    fn adaption_after_derivatives_hydraulic(
        &self,
        branch: &mut BranchPit,
        nodes: &NodePit,
        row: usize,
        fluid: BranchFluidContext,
    ) {
        if self.is_closed() {
            // Identity equation v = 0, decoupling the endpoints.
            branch.jac_deriv_dv[row] = 1.0;
            branch.jac_deriv_dp[row] = 0.0;
            branch.jac_deriv_dp1[row] = 0.0;
            branch.load_vec_branch[row] = -branch.v_init_m_s[row];
            return;
        }

        // Open: re-run the generic kernel, then scale the effective loss by
        // the opening factor (a half-open valve presents roughly four times
        // the loss of a fully open one).
        calculate_derivatives_hydraulic(
            branch,
            nodes,
            row,
            fluid.rho_kg_m3,
            fluid.mu_pa_s,
            FrictionModel::Nikuradse,
        );
        let factor = 1.0 / (self.opening * self.opening).max(1e-9);
        branch.lambda[row] *= factor;
        branch.jac_deriv_dv[row] *= factor;
        branch.load_vec_branch[row] *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::ids::{CompId, Id};
    use tf_core::pit::BoundaryKind;

    fn test_fluid_ctx() -> BranchFluidContext {
        BranchFluidContext {
            rho_kg_m3: 1000.0,
            mu_pa_s: 1.0e-3,
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
    fn rejects_out_of_range_opening() {
        assert!(Valve::new("v", 0.1, 1.0, 1.5).is_err());
        assert!(Valve::new("v", 0.1, 1.0, -0.1).is_err());
    }

    #[test]
    fn closed_valve_forces_zero_flow_equation() {
        let valve = Valve::new("v", 0.1, 1.0, 0.0).unwrap();
        let (nodes, mut branch) = network();
        valve.create_pit_branch_entries(&mut branch, 0);
        branch.v_init_m_s[0] = 0.3;
        valve.adaption_after_derivatives_hydraulic(&mut branch, &nodes, 0, test_fluid_ctx());
        assert_eq!(branch.jac_deriv_dv[0], 1.0);
        assert_eq!(branch.jac_deriv_dp[0], 0.0);
        assert_eq!(branch.jac_deriv_dp1[0], 0.0);
        assert!((branch.load_vec_branch[0] + 0.3).abs() < 1e-12);
    }

    #[test]
    fn smaller_opening_increases_effective_loss() {
        let (nodes, mut branch) = network();
        branch.v_init_m_s[0] = 1.0;

        let full = Valve::new("v", 0.1, 1.0, 1.0).unwrap();
        full.create_pit_branch_entries(&mut branch, 0);
        full.adaption_after_derivatives_hydraulic(&mut branch, &nodes, 0, test_fluid_ctx());
        let lambda_full = branch.lambda[0];

        let half = Valve::new("v", 0.1, 1.0, 0.5).unwrap();
        half.create_pit_branch_entries(&mut branch, 0);
        half.adaption_after_derivatives_hydraulic(&mut branch, &nodes, 0, test_fluid_ctx());
        let lambda_half = branch.lambda[0];

        assert!(lambda_half > lambda_full);
    }
}
