//! Jacobian/residual assembly and linear solve (SPEC_FULL §4.4).
//!
//! Node rows `[0, n_nodes)` hold continuity (mass or energy) balances;
//! branch rows `[n_nodes, n_nodes+n_branches)` hold the per-branch
//! momentum/advection equation from the component hook sequence. The
//! Jacobian is built densely and solved with `faer`'s partial-pivot LU —
//! the same triplet-then-dense-LU path used elsewhere in this crate's
//! pedigree for small-to-medium Newton systems.
//!
//! Fluid density/viscosity/cp are evaluated once per branch at the start of
//! each outer call and held fixed through the linear solve (their
//! dependence on the *unknowns* re-enters only through the next Newton
//! iteration's re-evaluation) — a frozen-coefficient simplification of the
//! fully analytic `∂ρ/∂p` term, standard for pipe-flow Newton cores since
//! density itself is only mildly nonlinear in pressure.

use crate::connectivity::Phase;
use crate::error::{SolveError, SolveResult};
use faer::prelude::SpSolver;
use faer::Mat;
use rayon::prelude::*;
use tf_components::derivatives::{calculate_derivatives_hydraulic, calculate_derivatives_thermal};
use tf_components::{BranchComponent, BranchFluidContext, FrictionModel};
use tf_core::pit::{BoundaryKind, BranchPit, NodePit};
use tf_core::units::{k, pa};
use tf_fluids::{Composition, FluidProperties};

/// A linearized system ready for the Newton driver: `jacobian * dx = rhs`
/// solves for the Newton step directly (signs already folded in).
pub struct AssembledSystem {
    pub jacobian: Mat<f64>,
    pub rhs: Vec<f64>,
    pub n_nodes: usize,
    pub n_branches: usize,
}

impl AssembledSystem {
    pub fn len(&self) -> usize {
        self.n_nodes + self.n_branches
    }

    /// Mean-L2 residual norm, `‖ε‖₂ / len(ε)` (SPEC_FULL §4.5, §9 — matches
    /// the donor's mean-L2 convention rather than plain L2).
    pub fn residual_norm(&self) -> f64 {
        let sum_sq: f64 = self.rhs.iter().map(|r| r * r).sum();
        sum_sq.sqrt() / self.rhs.len() as f64
    }

    /// Solve `jacobian * dx = rhs` via dense partial-pivot LU.
    pub fn solve_step(&self) -> SolveResult<Vec<f64>> {
        let n = self.len();
        let mut rhs_mat: Mat<f64> = Mat::zeros(n, 1);
        for i in 0..n {
            rhs_mat.write(i, 0, self.rhs[i]);
        }
        let lu = self.jacobian.partial_piv_lu();
        let solution = lu.solve(&rhs_mat);
        let dx: Vec<f64> = (0..n).map(|i| solution.read(i, 0)).collect();
        if dx.iter().any(|v| !v.is_finite()) {
            return Err(SolveError::SingularJacobian {
                what: "LU solve produced a non-finite step".to_string(),
            });
        }
        Ok(dx)
    }
}

fn fluid_context(
    nodes: &NodePit,
    branches: &BranchPit,
    row: usize,
    fluid: &dyn FluidProperties,
    composition: &Composition,
    phase: Phase,
) -> SolveResult<BranchFluidContext> {
    let node = match phase {
        Phase::Hydraulic => branches.from_node[row],
        Phase::Thermal => branches.from_node_t[row],
    };
    let state = fluid.state(
        pa(nodes.p_init_bar[node] * 1e5),
        k(nodes.t_init_k[node]),
        composition.clone(),
    )?;
    Ok(BranchFluidContext {
        rho_kg_m3: fluid.rho(&state)?.value,
        mu_pa_s: fluid.mu(&state)?.value,
        cp_j_kg_k: fluid.cp(&state)?,
    })
}

/// Run the component hook sequence and generic hydraulic derivative kernel
/// for every active branch row, then assemble `(J, rhs)` for the hydraulic
/// unknowns `(p_free, v_branch)`.
pub fn assemble_hydraulic(
    nodes: &NodePit,
    branches: &mut BranchPit,
    components: &[Box<dyn BranchComponent>],
    branch_owner: &[usize],
    fluid: &dyn FluidProperties,
    composition: &Composition,
    friction_model: FrictionModel,
) -> SolveResult<AssembledSystem> {
    let n_nodes = nodes.len();
    let n_branches = branches.len();
    let n = n_nodes + n_branches;

    // Fluid state is read-only per branch row and independent across rows,
    // so it is evaluated in parallel before the sequential hook/derivative
    // pass that mutates `branches`.
    let contexts: Vec<BranchFluidContext> = (0..n_branches)
        .into_par_iter()
        .map(|row| fluid_context(nodes, branches, row, fluid, composition, Phase::Hydraulic))
        .collect::<SolveResult<Vec<_>>>()?;

    let mut rho_per_branch = vec![0.0_f64; n_branches];
    for row in 0..n_branches {
        let component = &components[branch_owner[row]];
        let ctx = contexts[row];
        component.adaption_before_derivatives_hydraulic(branches, nodes, row, ctx);
        calculate_derivatives_hydraulic(branches, nodes, row, ctx.rho_kg_m3, ctx.mu_pa_s, friction_model);
        component.adaption_after_derivatives_hydraulic(branches, nodes, row, ctx);
        rho_per_branch[row] = ctx.rho_kg_m3;
    }

    let mut jac: Mat<f64> = Mat::zeros(n, n);
    let mut rhs = vec![0.0_f64; n];

    for i in 0..n_nodes {
        if matches!(nodes.node_type[i], BoundaryKind::DirichletPressure) {
            jac.write(i, i, 1.0);
            rhs[i] = 0.0;
        }
    }

    for row in 0..n_branches {
        let from = branches.from_node[row];
        let to = branches.to_node[row];
        let mass_per_v = rho_per_branch[row] * branches.area_m2[row];

        if !matches!(nodes.node_type[from], BoundaryKind::DirichletPressure) {
            let prev = jac.read(from, n_nodes + row);
            jac.write(from, n_nodes + row, prev - mass_per_v);
        }
        if !matches!(nodes.node_type[to], BoundaryKind::DirichletPressure) {
            let prev = jac.read(to, n_nodes + row);
            jac.write(to, n_nodes + row, prev + mass_per_v);
        }

        jac.write(n_nodes + row, n_nodes + row, branches.jac_deriv_dv[row]);
        jac.write(n_nodes + row, from, branches.jac_deriv_dp[row]);
        jac.write(n_nodes + row, to, branches.jac_deriv_dp1[row]);
        rhs[n_nodes + row] = branches.load_vec_branch[row];
    }

    for i in 0..n_nodes {
        if matches!(nodes.node_type[i], BoundaryKind::DirichletPressure) {
            continue;
        }
        let mut inflow = nodes.load_kg_s[i];
        for row in 0..n_branches {
            let mass = rho_per_branch[row] * branches.area_m2[row] * branches.v_init_m_s[row];
            if branches.to_node[row] == i {
                inflow += mass;
            }
            if branches.from_node[row] == i {
                inflow -= mass;
            }
        }
        rhs[i] = -inflow;
    }

    Ok(AssembledSystem {
        jacobian: jac,
        rhs,
        n_nodes,
        n_branches,
    })
}

/// Analogous thermal assembly: unknowns are free node temperatures and
/// branch outlet temperatures; branch velocities are held fixed at their
/// converged hydraulic values.
pub fn assemble_thermal(
    nodes: &NodePit,
    branches: &mut BranchPit,
    components: &[Box<dyn BranchComponent>],
    branch_owner: &[usize],
    fluid: &dyn FluidProperties,
    composition: &Composition,
) -> SolveResult<AssembledSystem> {
    let n_nodes = nodes.len();
    let n_branches = branches.len();
    let n = n_nodes + n_branches;

    let contexts: Vec<BranchFluidContext> = (0..n_branches)
        .into_par_iter()
        .map(|row| fluid_context(nodes, branches, row, fluid, composition, Phase::Thermal))
        .collect::<SolveResult<Vec<_>>>()?;

    let mut rho_cp_per_branch = vec![0.0_f64; n_branches];
    for row in 0..n_branches {
        let component = &components[branch_owner[row]];
        let ctx = contexts[row];
        component.adaption_before_derivatives_thermal(branches, nodes, row, ctx);
        calculate_derivatives_thermal(branches, nodes, row, ctx.cp_j_kg_k, ctx.rho_kg_m3);
        component.adaption_after_derivatives_thermal(branches, nodes, row, ctx);
        rho_cp_per_branch[row] = ctx.rho_kg_m3 * ctx.cp_j_kg_k;
    }

    let mut jac: Mat<f64> = Mat::zeros(n, n);
    let mut rhs = vec![0.0_f64; n];

    for i in 0..n_nodes {
        if matches!(nodes.node_type_t[i], BoundaryKind::DirichletTemperature) {
            jac.write(i, i, 1.0);
            rhs[i] = 0.0;
        }
    }

    for row in 0..n_branches {
        let from_t = branches.from_node_t[row];
        jac.write(n_nodes + row, n_nodes + row, branches.jac_deriv_dt_out[row]);
        if !matches!(nodes.node_type_t[from_t], BoundaryKind::DirichletTemperature) {
            jac.write(n_nodes + row, from_t, branches.jac_deriv_dt[row]);
        }
        rhs[n_nodes + row] = branches.load_vec_branch_t[row];
    }

    for i in 0..n_nodes {
        if matches!(nodes.node_type_t[i], BoundaryKind::DirichletTemperature) {
            continue;
        }
        let mut advective = nodes.load_w[i];
        let mut outflow_coeff = 0.0;
        for row in 0..n_branches {
            let advective_capacity = rho_cp_per_branch[row] * branches.area_m2[row] * branches.v_init_t_m_s[row];
            if branches.to_node_t[row] == i {
                advective += advective_capacity * branches.t_init_out_k[row];
            }
            if branches.from_node_t[row] == i {
                outflow_coeff += advective_capacity;
            }
        }
        advective -= outflow_coeff * nodes.t_init_k[i];
        rhs[i] = -advective;
        let prev_diag = jac.read(i, i);
        jac.write(i, i, prev_diag - outflow_coeff);
        for row in 0..n_branches {
            let advective_capacity = rho_cp_per_branch[row] * branches.area_m2[row] * branches.v_init_t_m_s[row];
            if branches.to_node_t[row] == i {
                let prev = jac.read(i, n_nodes + row);
                jac.write(i, n_nodes + row, prev + advective_capacity);
            }
        }
    }

    Ok(AssembledSystem {
        jacobian: jac,
        rhs,
        n_nodes,
        n_branches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{identify_active_nodes_branches, reduce_pit};
    use crate::network::NetworkBuilder;
    use crate::pit_init::initialize_pit;
    use tf_components::Pipe;

    fn single_pipe_network() -> crate::network::PipeNetwork {
        let mut builder = NetworkBuilder::new();
        let n0 = builder.add_node("in");
        let n1 = builder.add_node("out");
        builder.set_pressure_boundary(n0, 5.0);
        builder.add_branch(
            "p1",
            n0,
            n1,
            Pipe::new("p1", 0.1, 1000.0, 0.01, 0.0, 293.15).unwrap(),
        );
        builder.build().unwrap()
    }

    #[test]
    fn hydraulic_assembly_produces_square_system() {
        let net = single_pipe_network();
        let (mut nodes, mut branches) = initialize_pit(&net);
        branches.v_init_m_s[0] = 1.0;
        identify_active_nodes_branches(&mut nodes, &mut branches, Phase::Hydraulic).unwrap();
        let active = reduce_pit(&nodes, &branches, Phase::Hydraulic);
        let mut active_branches = active.branches;
        let branch_owner: Vec<usize> = active.branch_perm.clone();

        let system = assemble_hydraulic(
            &active.nodes,
            &mut active_branches,
            &net.components,
            &branch_owner,
            net.fluid(),
            net.composition(),
            FrictionModel::Nikuradse,
        )
        .unwrap();

        assert_eq!(system.len(), active.nodes.len() + active_branches.len());
        assert!(system.residual_norm().is_finite());
    }

    #[test]
    fn dirichlet_pressure_row_is_identity() {
        let net = single_pipe_network();
        let (mut nodes, mut branches) = initialize_pit(&net);
        identify_active_nodes_branches(&mut nodes, &mut branches, Phase::Hydraulic).unwrap();
        let active = reduce_pit(&nodes, &branches, Phase::Hydraulic);
        let mut active_branches = active.branches;
        let branch_owner: Vec<usize> = active.branch_perm.clone();

        let system = assemble_hydraulic(
            &active.nodes,
            &mut active_branches,
            &net.components,
            &branch_owner,
            net.fluid(),
            net.composition(),
            FrictionModel::Nikuradse,
        )
        .unwrap();

        let boundary_row = (0..active.nodes.len())
            .find(|&i| matches!(active.nodes.node_type[i], BoundaryKind::DirichletPressure))
            .unwrap();
        assert_eq!(system.jacobian.read(boundary_row, boundary_row), 1.0);
        assert_eq!(system.rhs[boundary_row], 0.0);
    }
}
