//! Coupling modes and the public `pipeflow` entry point (SPEC_FULL §4.6,
//! §6.1, §6.4).

use crate::assembly::{assemble_hydraulic, assemble_thermal, AssembledSystem};
use crate::connectivity::{expand_pit, identify_active_nodes_branches, identity_active_pit, reduce_pit, ActivePit, Phase};
use crate::error::{SolveError, SolveResult};
use crate::newton::{self, NewtonProblem, NewtonResult};
use crate::options::{Mode, SolveOptions};
use crate::pit_init::initialize_pit;
use crate::{network::PipeNetwork, results};
use tf_components::{BranchComponent, FrictionModel};
use tf_core::pit::{BranchPit, NodePit};
use tf_fluids::{Composition, FluidProperties};

/// Result of a successful `pipeflow` call.
pub struct SolveOutcome {
    pub node_results: Vec<results::NodeResult>,
    pub branch_results: Vec<results::BranchResult>,
    pub hydraulic_iterations: Option<usize>,
    pub thermal_iterations: Option<usize>,
    pub outer_iterations: Option<usize>,
}

struct HydraulicProblem<'a> {
    nodes: NodePit,
    branches: BranchPit,
    components: &'a [Box<dyn BranchComponent>],
    branch_owner: Vec<usize>,
    fluid: &'a dyn FluidProperties,
    composition: &'a Composition,
    friction_model: FrictionModel,
    tol_p: f64,
    tol_v: f64,
}

impl NewtonProblem for HydraulicProblem<'_> {
    fn iterate(&self) -> Vec<f64> {
        let mut x = self.nodes.p_init_bar.clone();
        x.extend_from_slice(&self.branches.v_init_m_s);
        x
    }

    fn set_iterate(&mut self, x: &[f64]) {
        let n = self.nodes.len();
        self.nodes.p_init_bar.copy_from_slice(&x[..n]);
        self.branches.v_init_m_s.copy_from_slice(&x[n..]);
    }

    fn assemble(&mut self) -> SolveResult<AssembledSystem> {
        assemble_hydraulic(
            &self.nodes,
            &mut self.branches,
            self.components,
            &self.branch_owner,
            self.fluid,
            self.composition,
            self.friction_model,
        )
    }

    fn variable_groups(&self) -> Vec<std::ops::Range<usize>> {
        vec![0..self.nodes.len(), self.nodes.len()..self.nodes.len() + self.branches.len()]
    }

    fn tolerances(&self) -> Vec<f64> {
        vec![self.tol_p, self.tol_v]
    }
}

struct ThermalProblem<'a> {
    nodes: NodePit,
    branches: BranchPit,
    components: &'a [Box<dyn BranchComponent>],
    branch_owner: Vec<usize>,
    fluid: &'a dyn FluidProperties,
    composition: &'a Composition,
    tol_t: f64,
}

impl NewtonProblem for ThermalProblem<'_> {
    fn iterate(&self) -> Vec<f64> {
        let mut x = self.nodes.t_init_k.clone();
        x.extend_from_slice(&self.branches.t_init_out_k);
        x
    }

    fn set_iterate(&mut self, x: &[f64]) {
        let n = self.nodes.len();
        self.nodes.t_init_k.copy_from_slice(&x[..n]);
        self.branches.t_init_out_k.copy_from_slice(&x[n..]);
    }

    fn assemble(&mut self) -> SolveResult<AssembledSystem> {
        assemble_thermal(
            &self.nodes,
            &mut self.branches,
            self.components,
            &self.branch_owner,
            self.fluid,
            self.composition,
        )
    }

    fn variable_groups(&self) -> Vec<std::ops::Range<usize>> {
        vec![0..self.nodes.len(), self.nodes.len()..self.nodes.len() + self.branches.len()]
    }

    fn tolerances(&self) -> Vec<f64> {
        vec![self.tol_t, self.tol_t]
    }
}

/// Run the hydraulic Newton loop to convergence against the full PIT,
/// writing the converged iterate back in place.
fn run_hydraulic_phase(
    net: &PipeNetwork,
    nodes: &mut NodePit,
    branches: &mut BranchPit,
    opts: &SolveOptions,
) -> SolveResult<NewtonResult> {
    let ActivePit {
        nodes: active_nodes,
        branches: active_branches,
        node_perm,
        branch_perm,
    } = if opts.check_connectivity {
        identify_active_nodes_branches(nodes, branches, Phase::Hydraulic)?;
        reduce_pit(nodes, branches, Phase::Hydraulic)
    } else {
        identity_active_pit(nodes, branches)
    };

    let mut problem = HydraulicProblem {
        nodes: active_nodes,
        branches: active_branches,
        components: &net.components,
        branch_owner: branch_perm.clone(),
        fluid: net.fluid(),
        composition: net.composition(),
        friction_model: opts.friction_model,
        tol_p: opts.tol_p,
        tol_v: opts.tol_v,
    };

    let result = newton::solve(&mut problem, opts)?;

    let active = ActivePit {
        nodes: problem.nodes,
        branches: problem.branches,
        node_perm,
        branch_perm,
    };
    expand_pit(nodes, branches, &active, Phase::Hydraulic);
    branches.normalize_thermal_direction();

    tracing::info!(iterations = result.iterations, residual_norm = result.residual_norm, "hydraulic phase converged");
    Ok(result)
}

/// Run the thermal Newton loop to convergence against the full PIT. When
/// `opts.check_connectivity` is set (the default), re-runs connectivity first
/// (SPEC_FULL §9, resolved Open Question): stalled branches drop out of the
/// thermal topology between calls.
fn run_thermal_phase(
    net: &PipeNetwork,
    nodes: &mut NodePit,
    branches: &mut BranchPit,
    opts: &SolveOptions,
) -> SolveResult<NewtonResult> {
    let ActivePit {
        nodes: active_nodes,
        branches: active_branches,
        node_perm,
        branch_perm,
    } = if opts.check_connectivity {
        identify_active_nodes_branches(nodes, branches, Phase::Thermal)?;
        reduce_pit(nodes, branches, Phase::Thermal)
    } else {
        identity_active_pit(nodes, branches)
    };

    let mut problem = ThermalProblem {
        nodes: active_nodes,
        branches: active_branches,
        components: &net.components,
        branch_owner: branch_perm.clone(),
        fluid: net.fluid(),
        composition: net.composition(),
        tol_t: opts.tol_t,
    };

    let result = newton::solve(&mut problem, opts)?;

    let active = ActivePit {
        nodes: problem.nodes,
        branches: problem.branches,
        node_perm,
        branch_perm,
    };
    expand_pit(nodes, branches, &active, Phase::Thermal);

    tracing::info!(iterations = result.iterations, residual_norm = result.residual_norm, "thermal phase converged");
    Ok(result)
}

fn extract(nodes: &NodePit, branches: &BranchPit, net: &PipeNetwork) -> SolveResult<(Vec<results::NodeResult>, Vec<results::BranchResult>)> {
    let branch_results = results::extract_branch_results(nodes, branches, net.fluid(), net.composition())?;
    let node_results = results::extract_node_results(nodes, branches, &branch_results);
    Ok((node_results, branch_results))
}

/// Maximum absolute difference between two equal-length slices.
fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

/// Run a steady-state solve over `net` in the given `mode`, mutating `net`'s
/// persisted state (`hyd_flag`/`converged`/last-solved PIT) only on success
/// (SPEC_FULL §9, Open Question 1).
pub fn pipeflow(net: &mut PipeNetwork, mode: Mode, opts: &SolveOptions) -> SolveResult<SolveOutcome> {
    opts.validate()?;

    match mode {
        Mode::Hydraulics => {
            let (mut nodes, mut branches) = initialize_pit(net);
            let result = run_hydraulic_phase(net, &mut nodes, &mut branches, opts)?;
            let (node_results, branch_results) = extract(&nodes, &branches, net)?;
            net.last_nodes = Some(nodes);
            net.last_branches = Some(branches);
            net.hyd_flag = true;
            net.converged = true;
            Ok(SolveOutcome {
                node_results,
                branch_results,
                hydraulic_iterations: Some(result.iterations),
                thermal_iterations: None,
                outer_iterations: None,
            })
        }

        Mode::Heat => {
            if !net.hyd_flag || net.last_nodes.is_none() {
                return Err(SolveError::MissingHydraulicPrerequisite);
            }
            let mut nodes = net.last_nodes.clone().expect("checked above");
            let mut branches = net.last_branches.clone().expect("checked above");
            let result = run_thermal_phase(net, &mut nodes, &mut branches, opts)?;
            let (node_results, branch_results) = extract(&nodes, &branches, net)?;
            net.last_nodes = Some(nodes);
            net.last_branches = Some(branches);
            net.converged = true;
            Ok(SolveOutcome {
                node_results,
                branch_results,
                hydraulic_iterations: None,
                thermal_iterations: Some(result.iterations),
                outer_iterations: None,
            })
        }

        Mode::All => {
            let (mut nodes, mut branches) = initialize_pit(net);
            let hyd = run_hydraulic_phase(net, &mut nodes, &mut branches, opts)?;
            let therm = run_thermal_phase(net, &mut nodes, &mut branches, opts)?;
            let (node_results, branch_results) = extract(&nodes, &branches, net)?;
            net.last_nodes = Some(nodes);
            net.last_branches = Some(branches);
            net.hyd_flag = true;
            net.converged = true;
            Ok(SolveOutcome {
                node_results,
                branch_results,
                hydraulic_iterations: Some(hyd.iterations),
                thermal_iterations: Some(therm.iterations),
                outer_iterations: None,
            })
        }

        Mode::Bidirectional => {
            let (mut nodes, mut branches) = initialize_pit(net);
            let mut prev_p = nodes.p_init_bar.clone();
            let mut prev_v = branches.v_init_m_s.clone();
            let mut prev_t = nodes.t_init_k.clone();
            let mut last_hyd_iters = 0;
            let mut last_therm_iters = 0;

            for outer in 0..opts.iter_bidirect {
                let hyd = run_hydraulic_phase(net, &mut nodes, &mut branches, opts)?;
                let therm = run_thermal_phase(net, &mut nodes, &mut branches, opts)?;
                last_hyd_iters = hyd.iterations;
                last_therm_iters = therm.iterations;

                let dp = max_abs_diff(&nodes.p_init_bar, &prev_p);
                let dv = max_abs_diff(&branches.v_init_m_s, &prev_v);
                let dt = max_abs_diff(&nodes.t_init_k, &prev_t);
                tracing::debug!(outer, dp, dv, dt, "bidirectional outer iteration");

                if dp <= opts.tol_p && dv <= opts.tol_v && dt <= opts.tol_t {
                    let (node_results, branch_results) = extract(&nodes, &branches, net)?;
                    net.last_nodes = Some(nodes);
                    net.last_branches = Some(branches);
                    net.hyd_flag = true;
                    net.converged = true;
                    return Ok(SolveOutcome {
                        node_results,
                        branch_results,
                        hydraulic_iterations: Some(last_hyd_iters),
                        thermal_iterations: Some(last_therm_iters),
                        outer_iterations: Some(outer + 1),
                    });
                }

                prev_p = nodes.p_init_bar.clone();
                prev_v = branches.v_init_m_s.clone();
                prev_t = nodes.t_init_k.clone();
            }

            Err(SolveError::NotConverged {
                iterations: opts.iter_bidirect,
                residual_norm: f64::max(max_abs_diff(&nodes.p_init_bar, &prev_p), max_abs_diff(&nodes.t_init_k, &prev_t)),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;
    use tf_components::Pipe;

    fn single_pipe_network() -> PipeNetwork {
        let mut builder = NetworkBuilder::new();
        let n0 = builder.add_node("in");
        let n1 = builder.add_node("out");
        builder.set_pressure_boundary(n0, 5.0);
        builder.set_temperature_boundary(n0, 363.15);
        builder.set_load(n1, -1.273 * 998.2 * std::f64::consts::PI * 0.01 / 4.0, 0.0);
        builder.add_branch(
            "p1",
            n0,
            n1,
            Pipe::new("p1", 0.1, 1000.0, 0.01, 0.5, 10.0).unwrap(),
        );
        builder.build().unwrap()
    }

    #[test]
    fn hydraulics_only_solve_converges_and_persists_flags() {
        let mut net = single_pipe_network();
        let opts = SolveOptions::default();
        let outcome = pipeflow(&mut net, Mode::Hydraulics, &opts).unwrap();
        assert!(net.hyd_flag);
        assert!(net.converged);
        assert_eq!(outcome.node_results.len(), 2);
        assert_eq!(outcome.branch_results.len(), 1);
        assert!(outcome.hydraulic_iterations.is_some());
    }

    #[test]
    fn heat_mode_without_prior_hydraulics_fails() {
        let mut net = single_pipe_network();
        let opts = SolveOptions::default();
        let err = pipeflow(&mut net, Mode::Heat, &opts).unwrap_err();
        assert!(matches!(err, SolveError::MissingHydraulicPrerequisite));
    }

    #[test]
    fn heat_mode_after_hydraulics_solves_thermal_phase() {
        let mut net = single_pipe_network();
        let opts = SolveOptions::default();
        pipeflow(&mut net, Mode::Hydraulics, &opts).unwrap();
        let outcome = pipeflow(&mut net, Mode::Heat, &opts).unwrap();
        assert!(outcome.thermal_iterations.is_some());
    }

    #[test]
    fn all_mode_runs_both_phases_in_one_call() {
        let mut net = single_pipe_network();
        let opts = SolveOptions::default();
        let outcome = pipeflow(&mut net, Mode::All, &opts).unwrap();
        assert!(outcome.hydraulic_iterations.is_some());
        assert!(outcome.thermal_iterations.is_some());
    }

    #[test]
    fn disabling_connectivity_check_still_solves_a_fully_connected_network() {
        let mut net = single_pipe_network();
        let mut opts = SolveOptions::default();
        opts.check_connectivity = false;
        let outcome = pipeflow(&mut net, Mode::Hydraulics, &opts).unwrap();
        assert!(outcome.hydraulic_iterations.is_some());
        assert_eq!(outcome.node_results.len(), 2);
    }

    #[test]
    fn bidirectional_mode_converges_in_one_outer_iteration_for_water() {
        // Water is incompressible and temperature-independent, so the outer
        // fixed-point loop is a no-op coupling (SPEC_FULL §4.6, invariant 4).
        let mut net = single_pipe_network();
        let opts = SolveOptions::default();
        let outcome = pipeflow(&mut net, Mode::Bidirectional, &opts).unwrap();
        assert_eq!(outcome.outer_iterations, Some(1));
    }
}
