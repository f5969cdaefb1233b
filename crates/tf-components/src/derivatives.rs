//! The generic branch derivative kernel (SPEC_FULL §4.3, §4.4).
//!
//! `calculate_derivatives_hydraulic`/`calculate_derivatives_thermal` apply
//! the Darcy-Weisbach / advection-with-loss equation to every branch row,
//! regardless of component kind. Non-pipe components (pump, valve, flow
//! controller) then overwrite some or all of the resulting columns in
//! their `adaption_after_derivatives_*` hook — the kernel always runs
//! first so those components only need to express their *difference* from
//! the generic pipe physics.

use crate::common::EPSILON_MDOT;
use crate::friction::{self, FrictionModel};
use tf_core::pit::{BranchPit, NodePit};

const GRAVITY: f64 = 9.80665;

/// Fill `JAC_DERIV_DV`, `JAC_DERIV_DP`, `JAC_DERIV_DP1`, `LOAD_VEC_BRANCH`,
/// and `LAMBDA` for one active branch row from the Darcy-Weisbach residual
///
/// `r = rho*A*v*|v|*(lambda*L/D)/2 - (p_from - p_to) - rho*g*(h_to - h_from)`
///
/// with partials in `v`, `p_from`, `p_to`.
pub fn calculate_derivatives_hydraulic(
    branch: &mut BranchPit,
    nodes: &NodePit,
    row: usize,
    rho: f64,
    mu: f64,
    friction_model: FrictionModel,
) {
    let from = branch.from_node[row];
    let to = branch.to_node[row];
    let v = branch.v_init_m_s[row];
    let d = branch.diameter_m[row];
    let area = branch.area_m2[row];
    let length = branch.length_m[row];

    let reynolds = if mu.abs() < f64::EPSILON {
        0.0
    } else {
        rho * v.abs() * d / mu
    };
    let relative_roughness = branch.roughness_mm[row] / 1000.0 / d;
    let lam = friction::lambda(friction_model, reynolds, relative_roughness);
    branch.lambda[row] = lam;

    let k = lam * length / d;
    let p_from = nodes.p_init_bar[from] * 1e5;
    let p_to = nodes.p_init_bar[to] * 1e5;
    let height_term = rho * GRAVITY * (nodes.height_m[to] - nodes.height_m[from]);

    let residual =
        rho * area * v * v.abs() * k / 2.0 - (p_from - p_to) - height_term;

    branch.jac_deriv_dv[row] = rho * area * k * v.abs();
    branch.jac_deriv_dp[row] = -1.0;
    branch.jac_deriv_dp1[row] = 1.0;
    branch.load_vec_branch[row] = -residual;
}

/// Fill `JAC_DERIV_DT`, `JAC_DERIV_DT1`, `JAC_DERIV_DT_OUT`, and
/// `LOAD_VEC_BRANCH_T` for one active branch row from the advection-with-loss
/// residual
///
/// `r_T = rho*A*cp*v*(T_in - T_out - TL) - alpha*(T_amb - T_mean)*L + Q_ext`
///
/// with `T_mean = (T_in + T_out)/2`, partials in `T_in` (node-T at
/// `FROM_NODE_T`) and `T_out` (`TINIT_OUT`).
pub fn calculate_derivatives_thermal(branch: &mut BranchPit, nodes: &NodePit, row: usize, cp: f64, rho: f64) {
    let from_t = branch.from_node_t[row];
    let v = branch.v_init_t_m_s[row];
    let area = branch.area_m2[row];
    let length = branch.length_m[row];
    let alpha = branch.alpha_w_m2k[row];
    let t_amb = branch.t_ext_k[row];

    let t_in = nodes.t_init_k[from_t];
    let t_out = branch.t_init_out_k[row];
    let tl = branch.tl_k[row].unwrap_or(0.0);
    let qext = branch.qext_w[row].unwrap_or(0.0);
    let t_mean = (t_in + t_out) / 2.0;

    let advective = rho * area * cp * v;
    let residual = advective * (t_in - t_out - tl) - alpha * (t_amb - t_mean) * length + qext;

    branch.jac_deriv_dt[row] = advective + alpha * length / 2.0;
    branch.jac_deriv_dt1[row] = -advective + alpha * length / 2.0;
    branch.jac_deriv_dt_out[row] = branch.jac_deriv_dt1[row];
    branch.load_vec_branch_t[row] = -residual;
}

/// `true` when the row's flow is below the numerical noise floor and should
/// be treated as stalled for friction-factor purposes.
pub fn is_stalled(v: f64) -> bool {
    v.abs() < EPSILON_MDOT
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::ids::{CompId, Id};
    use tf_core::pit::{BoundaryKind, NodePit};

    fn two_node_branch() -> (NodePit, BranchPit) {
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
            295.0,
            0.0,
            1.0,
            293.15,
            0.0,
            0.0,
            BoundaryKind::Free,
            BoundaryKind::Free,
        );
        let mut branch = BranchPit::default();
        branch.push(CompId::from_index(0), 0, 1, 0.1, 100.0, 0.05);
        branch.v_init_m_s[0] = 1.5;
        (nodes, branch)
    }

    #[test]
    fn hydraulic_kernel_fills_all_columns() {
        let (nodes, mut branch) = two_node_branch();
        calculate_derivatives_hydraulic(&mut branch, &nodes, 0, 998.2, 1.002e-3, FrictionModel::Nikuradse);
        assert!(branch.lambda[0] > 0.0);
        assert!(branch.jac_deriv_dv[0] > 0.0);
        assert_eq!(branch.jac_deriv_dp[0], -1.0);
        assert_eq!(branch.jac_deriv_dp1[0], 1.0);
        assert!(branch.load_vec_branch[0].is_finite());
    }

    #[test]
    fn thermal_kernel_fills_all_columns() {
        let (nodes, mut branch) = two_node_branch();
        branch.v_init_t_m_s[0] = 1.5;
        branch.from_node_t[0] = 0;
        branch.t_init_out_k[0] = 298.0;
        calculate_derivatives_thermal(&mut branch, &nodes, 0, 4182.0, 998.2);
        assert!(branch.jac_deriv_dt[0] != 0.0);
        assert!(branch.jac_deriv_dt1[0] != 0.0);
        assert_eq!(branch.jac_deriv_dt_out[0], branch.jac_deriv_dt1[0]);
        assert!(branch.load_vec_branch_t[0].is_finite());
    }

    #[test]
    fn zero_velocity_gives_zero_hydraulic_residual_when_pressures_match() {
        let (mut nodes, mut branch) = two_node_branch();
        nodes.p_init_bar[1] = nodes.p_init_bar[0];
        nodes.height_m[1] = nodes.height_m[0];
        branch.v_init_m_s[0] = 0.0;
        calculate_derivatives_hydraulic(&mut branch, &nodes, 0, 998.2, 1.002e-3, FrictionModel::Nikuradse);
        assert!(branch.load_vec_branch[0].abs() < 1e-9);
    }

    /// A branch rising from node 0 to a node 10 m higher, at matched
    /// pressures and zero velocity, must carry a nonzero residual from the
    /// elevation term alone (`r = ... - (p_from - p_to) - rho*g*(h_to -
    /// h_from)`); with `h_to > h_from` the elevation term is subtracted,
    /// leaving `load_vec_branch = rho*g*(h_to - h_from) > 0`.
    #[test]
    fn elevation_rise_biases_residual_against_uphill_flow() {
        let (mut nodes, mut branch) = two_node_branch();
        nodes.p_init_bar[1] = nodes.p_init_bar[0];
        nodes.height_m[0] = 0.0;
        nodes.height_m[1] = 10.0;
        branch.v_init_m_s[0] = 0.0;
        calculate_derivatives_hydraulic(&mut branch, &nodes, 0, 998.2, 1.002e-3, FrictionModel::Nikuradse);
        let expected = 998.2 * GRAVITY * 10.0;
        assert!((branch.load_vec_branch[0] - expected).abs() < 1e-6);
        assert!(branch.load_vec_branch[0] > 0.0);
    }
}
