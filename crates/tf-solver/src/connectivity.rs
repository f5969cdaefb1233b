//! Connectivity analysis and PIT reduction (SPEC_FULL §4.2).
//!
//! A node is hydraulically active iff it is reachable, through the branch
//! graph, from a Dirichlet-pressure boundary. A node is thermally active iff
//! it is additionally reachable through branches carrying non-zero flow from
//! a Dirichlet-temperature boundary — closed valves and stalled flow
//! controllers (`v ≈ 0`) drop out of the thermal topology even though they
//! remain hydraulically active.

use crate::error::{SolveError, SolveResult};
use std::collections::HashSet;
use tf_core::pit::{BoundaryKind, BranchPit, NodePit};

/// Which topology/boundary-kind pair connectivity analysis runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Hydraulic,
    Thermal,
}

/// Velocities below this magnitude are treated as "no flow" for thermal
/// connectivity purposes (matches `tf_components::derivatives::is_stalled`
/// conceptually, duplicated here to avoid a dependency cycle on the exact
/// threshold constant).
const STALLED_VELOCITY_M_S: f64 = 1e-9;

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Flag `ACTIVE`/`ACTIVE_T` columns on nodes and branches in place (SPEC_FULL
/// §4.2's `identify_active_nodes_branches`).
pub fn identify_active_nodes_branches(
    nodes: &mut NodePit,
    branches: &mut BranchPit,
    phase: Phase,
) -> SolveResult<()> {
    let n = nodes.len();
    if !nodes
        .node_type
        .iter()
        .any(|t| matches!(t, BoundaryKind::DirichletPressure))
    {
        return Err(SolveError::NoBoundary);
    }

    let mut dsu = DisjointSet::new(n);
    for i in 0..branches.len() {
        match phase {
            Phase::Hydraulic => dsu.union(branches.from_node[i], branches.to_node[i]),
            Phase::Thermal => {
                if branches.v_init_m_s[i].abs() > STALLED_VELOCITY_M_S {
                    dsu.union(branches.from_node_t[i], branches.to_node_t[i]);
                }
            }
        }
    }

    let mut boundary_roots = HashSet::new();
    for i in 0..n {
        let is_boundary = match phase {
            Phase::Hydraulic => matches!(nodes.node_type[i], BoundaryKind::DirichletPressure),
            Phase::Thermal => matches!(nodes.node_type_t[i], BoundaryKind::DirichletTemperature),
        };
        if is_boundary {
            boundary_roots.insert(dsu.find(i));
        }
    }

    for i in 0..n {
        let active = boundary_roots.contains(&dsu.find(i));
        match phase {
            Phase::Hydraulic => nodes.active[i] = active,
            Phase::Thermal => nodes.active_t[i] = active,
        }
    }

    for i in 0..branches.len() {
        let (a, b) = match phase {
            Phase::Hydraulic => (branches.from_node[i], branches.to_node[i]),
            Phase::Thermal => (branches.from_node_t[i], branches.to_node_t[i]),
        };
        let active = match phase {
            Phase::Hydraulic => nodes.active[a] && nodes.active[b],
            Phase::Thermal => nodes.active_t[a] && nodes.active_t[b],
        };
        match phase {
            Phase::Hydraulic => branches.active[i] = active,
            Phase::Thermal => branches.active_t[i] = active,
        }
    }

    Ok(())
}

/// A compacted, phase-specific view produced by `reduce_pit`. `node_perm` and
/// `branch_perm` record, for each row of the reduced table, which row of the
/// full table it came from — used by `extract_results_active_pit` to scatter
/// the solution back.
pub struct ActivePit {
    pub nodes: NodePit,
    pub branches: BranchPit,
    pub node_perm: Vec<usize>,
    pub branch_perm: Vec<usize>,
}

/// Gather active rows into a compacted `ActivePit` (SPEC_FULL §4.2's
/// `reduce_pit`). `identify_active_nodes_branches` must have been run for
/// the same `phase` first.
pub fn reduce_pit(full_nodes: &NodePit, full_branches: &BranchPit, phase: Phase) -> ActivePit {
    let node_active = |i: usize| match phase {
        Phase::Hydraulic => full_nodes.active[i],
        Phase::Thermal => full_nodes.active_t[i],
    };
    let branch_active = |i: usize| match phase {
        Phase::Hydraulic => full_branches.active[i],
        Phase::Thermal => full_branches.active_t[i],
    };

    let node_perm: Vec<usize> = (0..full_nodes.len()).filter(|&i| node_active(i)).collect();
    let mut full_to_reduced = vec![usize::MAX; full_nodes.len()];
    for (r, &f) in node_perm.iter().enumerate() {
        full_to_reduced[f] = r;
    }

    let mut nodes = NodePit::default();
    for &f in &node_perm {
        nodes.push(
            full_nodes.id[f],
            full_nodes.p_init_bar[f],
            full_nodes.t_init_k[f],
            full_nodes.height_m[f],
            full_nodes.p_amb_bar[f],
            full_nodes.t_amb_k[f],
            full_nodes.load_kg_s[f],
            full_nodes.load_w[f],
            full_nodes.node_type[f],
            full_nodes.node_type_t[f],
        );
    }

    let branch_perm: Vec<usize> = (0..full_branches.len())
        .filter(|&i| branch_active(i))
        .collect();
    let mut branches = BranchPit::default();
    for &f in &branch_perm {
        let from = full_to_reduced[full_branches.from_node[f]];
        let to = full_to_reduced[full_branches.to_node[f]];
        debug_assert!(from != usize::MAX && to != usize::MAX, "active branch with inactive endpoint");
        branches.push(
            full_branches.id[f],
            from,
            to,
            full_branches.diameter_m[f],
            full_branches.length_m[f],
            full_branches.roughness_mm[f],
        );
        let r = branches.len() - 1;
        branches.area_m2[r] = full_branches.area_m2[f];
        branches.lambda[r] = full_branches.lambda[f];
        branches.alpha_w_m2k[r] = full_branches.alpha_w_m2k[f];
        branches.t_ext_k[r] = full_branches.t_ext_k[f];
        branches.v_init_m_s[r] = full_branches.v_init_m_s[f];
        branches.v_init_t_m_s[r] = full_branches.v_init_t_m_s[f];
        branches.t_init_out_k[r] = full_branches.t_init_out_k[f];
        branches.qext_w[r] = full_branches.qext_w[f];
        branches.tl_k[r] = full_branches.tl_k[f];
        branches.deltat_k[r] = full_branches.deltat_k[f];
        branches.treturn_k[r] = full_branches.treturn_k[f];
        branches.mass_kg_s[r] = full_branches.mass_kg_s[f];
        branches.control_active[r] = full_branches.control_active[f];
        branches.closed[r] = full_branches.closed[f];
        branches.from_node_t[r] = full_to_reduced[full_branches.from_node_t[f]];
        branches.to_node_t[r] = full_to_reduced[full_branches.to_node_t[f]];
    }

    ActivePit {
        nodes,
        branches,
        node_perm,
        branch_perm,
    }
}

/// Build an `ActivePit` covering every row unchanged, for callers that skip
/// connectivity analysis (`SolveOptions::check_connectivity == false`) and
/// solve the full PIT directly.
pub fn identity_active_pit(nodes: &NodePit, branches: &BranchPit) -> ActivePit {
    ActivePit {
        nodes: nodes.clone(),
        branches: branches.clone(),
        node_perm: (0..nodes.len()).collect(),
        branch_perm: (0..branches.len()).collect(),
    }
}

/// Scatter the active PIT's current iterate back into the full PIT
/// (`extract_results_active_pit`).
pub fn expand_pit(full_nodes: &mut NodePit, full_branches: &mut BranchPit, active: &ActivePit, phase: Phase) {
    for (r, &f) in active.node_perm.iter().enumerate() {
        full_nodes.p_init_bar[f] = active.nodes.p_init_bar[r];
        full_nodes.t_init_k[f] = active.nodes.t_init_k[r];
    }
    for (r, &f) in active.branch_perm.iter().enumerate() {
        match phase {
            Phase::Hydraulic => full_branches.v_init_m_s[f] = active.branches.v_init_m_s[r],
            Phase::Thermal => {
                full_branches.v_init_t_m_s[f] = active.branches.v_init_t_m_s[r];
                full_branches.t_init_out_k[f] = active.branches.t_init_out_k[r];
            }
        }
    }
}
