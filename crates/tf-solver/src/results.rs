//! Result extraction (SPEC_FULL §6.3).
//!
//! Runs once, after a solve has converged — never on a failed call, per the
//! resolved Open Question in SPEC_FULL §9 (`extract_results_active_pit`
//! ordering).

use crate::error::SolveResult;
use tf_core::pit::{BranchPit, NodePit};
use tf_core::units::{k, pa};
use tf_fluids::{Composition, FluidProperties};

/// Standard reference conditions for "norm" volumetric flow (0 °C, 1.01325 bar).
const NORM_T_K: f64 = 273.15;
const NORM_P_BAR: f64 = 1.01325;

#[derive(Debug, Clone, Copy)]
pub struct BranchResult {
    pub v_mean_m_per_s: f64,
    pub p_from_bar: f64,
    pub p_to_bar: f64,
    pub t_from_k: f64,
    pub t_to_k: f64,
    pub mdot_from_kg_per_s: f64,
    pub mdot_to_kg_per_s: f64,
    pub vdot_norm_m3_per_s: f64,
    pub reynolds: f64,
    pub lambda: f64,
    pub v_from_m_per_s: Option<f64>,
    pub v_to_m_per_s: Option<f64>,
    pub normfactor_from: Option<f64>,
    pub normfactor_to: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct NodeResult {
    pub p_bar: f64,
    pub t_k: f64,
    pub mdot_kg_per_s: f64,
}

/// `branch_results` must have already been computed by
/// [`extract_branch_results`] over the same PIT so per-node mass balance can
/// reuse its `mdot_from_kg_per_s` values rather than recomputing density.
pub fn extract_node_results(nodes: &NodePit, branches: &BranchPit, branch_results: &[BranchResult]) -> Vec<NodeResult> {
    let mut net_inflow = vec![0.0_f64; nodes.len()];
    for (row, result) in branch_results.iter().enumerate() {
        let from = branches.from_node[row];
        let to = branches.to_node[row];
        net_inflow[to] += result.mdot_from_kg_per_s;
        net_inflow[from] -= result.mdot_from_kg_per_s;
    }

    (0..nodes.len())
        .map(|i| NodeResult {
            p_bar: nodes.p_init_bar[i],
            t_k: nodes.t_init_k[i],
            // For free nodes this is ~0 (continuity, invariant 1); for a
            // Dirichlet-pressure node it's the implied external-grid supply.
            mdot_kg_per_s: net_inflow[i] + nodes.load_kg_s[i],
        })
        .collect()
}

pub fn extract_branch_results(
    nodes: &NodePit,
    branches: &BranchPit,
    fluid: &dyn FluidProperties,
    composition: &Composition,
) -> SolveResult<Vec<BranchResult>> {
    let mut out = Vec::with_capacity(branches.len());
    for row in 0..branches.len() {
        out.push(branch_result(nodes, branches, row, fluid, composition)?);
    }
    Ok(out)
}

fn branch_result(
    nodes: &NodePit,
    branches: &BranchPit,
    row: usize,
    fluid: &dyn FluidProperties,
    composition: &Composition,
) -> SolveResult<BranchResult> {
    let from = branches.from_node[row];
    let to = branches.to_node[row];
    let v = branches.v_init_m_s[row];
    let area = branches.area_m2[row];

    let state_from = fluid.state(pa(nodes.p_init_bar[from] * 1e5), k(nodes.t_init_k[from]), composition.clone())?;
    let rho_from = fluid.rho(&state_from)?.value;
    let mu_from = fluid.mu(&state_from)?.value;

    let mdot = rho_from * area * v;
    let reynolds = if mu_from.abs() < f64::EPSILON {
        0.0
    } else {
        rho_from * v.abs() * branches.diameter_m[row] / mu_from
    };

    // Thermal upstream/downstream may be swapped from hydraulic from/to
    // depending on the sign of v (SPEC_FULL §3.2); map back to the
    // hydraulic-oriented from/to pair the result frame reports.
    let (t_from_k, t_to_k) = if branches.from_node_t[row] == from {
        (nodes.t_init_k[branches.from_node_t[row]], branches.t_init_out_k[row])
    } else {
        (branches.t_init_out_k[row], nodes.t_init_k[branches.from_node_t[row]])
    };

    let is_gas = composition.is_gas();
    let (vdot_norm_m3_per_s, v_from_m_per_s, v_to_m_per_s, normfactor_from, normfactor_to) = if is_gas {
        let state_norm = fluid.state(pa(NORM_P_BAR * 1e5), k(NORM_T_K), composition.clone())?;
        let rho_norm = fluid.rho(&state_norm)?.value;
        let state_to = fluid.state(pa(nodes.p_init_bar[to] * 1e5), k(nodes.t_init_k[to]), composition.clone())?;
        let rho_to = fluid.rho(&state_to)?.value;

        let vdot_norm = mdot / rho_norm;
        let v_from = mdot / (rho_from * area);
        let v_to = mdot / (rho_to * area);
        (vdot_norm, Some(v_from), Some(v_to), Some(rho_from / rho_norm), Some(rho_to / rho_norm))
    } else {
        (v * area, None, None, None, None)
    };

    Ok(BranchResult {
        v_mean_m_per_s: v,
        p_from_bar: nodes.p_init_bar[from],
        p_to_bar: nodes.p_init_bar[to],
        t_from_k,
        t_to_k,
        mdot_from_kg_per_s: mdot,
        mdot_to_kg_per_s: mdot,
        vdot_norm_m3_per_s,
        reynolds,
        lambda: branches.lambda[row],
        v_from_m_per_s,
        v_to_m_per_s,
        normfactor_from,
        normfactor_to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::ids::{CompId, Id};
    use tf_core::pit::BoundaryKind;
    use tf_fluids::ConstantFluid;

    fn single_branch() -> (NodePit, BranchPit) {
        let mut nodes = NodePit::default();
        nodes.push(Id::from_index(0), 5.0, 363.15, 0.0, 1.0, 293.15, 0.0, 0.0, BoundaryKind::DirichletPressure, BoundaryKind::DirichletTemperature);
        nodes.push(Id::from_index(1), 4.893, 362.35, 0.0, 1.0, 293.15, 0.0, 0.0, BoundaryKind::Free, BoundaryKind::Free);
        let mut branches = BranchPit::default();
        branches.push(CompId::from_index(0), 0, 1, 0.1, 1000.0, 0.01);
        branches.v_init_m_s[0] = 1.273;
        branches.t_init_out_k[0] = 362.35;
        branches.normalize_thermal_direction();
        (nodes, branches)
    }

    #[test]
    fn liquid_branch_result_has_no_gas_extras() {
        let (nodes, branches) = single_branch();
        let fluid = ConstantFluid::water();
        let composition = tf_fluids::Composition::pure(tf_fluids::Species::H2O);
        let result = extract_branch_results(&nodes, &branches, &fluid, &composition).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].v_from_m_per_s.is_none());
        assert!((result[0].v_mean_m_per_s - 1.273).abs() < 1e-9);
        assert!((result[0].p_from_bar - 5.0).abs() < 1e-9);
    }

    #[test]
    fn node_results_carry_pressure_and_temperature() {
        let (nodes, branches) = single_branch();
        let fluid = ConstantFluid::water();
        let composition = tf_fluids::Composition::pure(tf_fluids::Species::H2O);
        let branch_results = extract_branch_results(&nodes, &branches, &fluid, &composition).unwrap();
        let results = extract_node_results(&nodes, &branches, &branch_results);
        assert_eq!(results.len(), 2);
        assert!((results[0].p_bar - 5.0).abs() < 1e-9);
    }
}
