//! The pipe-internal-table (PIT): flattened, column-typed state for nodes
//! and branches.
//!
//! Both node and branch tables are stored as parallel columns (struct of
//! arrays) rather than a vector of row structs, so the derivative and
//! assembly stage can stride over one column at a time. Row index *is* the
//! identity within a PIT: `NodePit`/`BranchPit` don't carry a separate
//! row-number field, only the stable `NodeId`/`CompId` used to trace a row
//! back to its owning graph node/component.
//!
//! Setpoint columns (`qext_w`, `deltat_k`, `treturn_k`, `mass_kg_s`) use
//! `Option<f64>` rather than `NaN` to mean "not configured" (Design Notes,
//! `SPEC_FULL.md` §9) — `None` is never confused with a valid zero setpoint.

use crate::ids::{CompId, NodeId};

/// Boundary-condition kind for a node, hydraulic or thermal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    /// Free (unknown) variable, solved for by the Newton iteration.
    Free,
    /// Externally fixed pressure (ext-grid).
    DirichletPressure,
    /// Externally fixed temperature (source boundary).
    DirichletTemperature,
}

impl BoundaryKind {
    pub fn is_dirichlet(self) -> bool {
        !matches!(self, BoundaryKind::Free)
    }
}

/// Node table: one row per junction / internal segment node.
#[derive(Debug, Clone, Default)]
pub struct NodePit {
    pub id: Vec<NodeId>,
    pub active: Vec<bool>,
    pub active_t: Vec<bool>,
    /// Current pressure iterate [bar].
    pub p_init_bar: Vec<f64>,
    /// Current temperature iterate [K].
    pub t_init_k: Vec<f64>,
    /// Elevation [m], used in the hydrostatic term of the pipe residual.
    pub height_m: Vec<f64>,
    pub p_amb_bar: Vec<f64>,
    pub t_amb_k: Vec<f64>,
    /// External mass injection [kg/s] (positive = into the node).
    pub load_kg_s: Vec<f64>,
    /// External heat injection [W] (positive = into the node).
    pub load_w: Vec<f64>,
    pub node_type: Vec<BoundaryKind>,
    pub node_type_t: Vec<BoundaryKind>,
}

impl NodePit {
    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        id: NodeId,
        p_init_bar: f64,
        t_init_k: f64,
        height_m: f64,
        p_amb_bar: f64,
        t_amb_k: f64,
        load_kg_s: f64,
        load_w: f64,
        node_type: BoundaryKind,
        node_type_t: BoundaryKind,
    ) {
        self.id.push(id);
        self.active.push(true);
        self.active_t.push(true);
        self.p_init_bar.push(p_init_bar);
        self.t_init_k.push(t_init_k);
        self.height_m.push(height_m);
        self.p_amb_bar.push(p_amb_bar);
        self.t_amb_k.push(t_amb_k);
        self.load_kg_s.push(load_kg_s);
        self.load_w.push(load_w);
        self.node_type.push(node_type);
        self.node_type_t.push(node_type_t);
    }
}

/// Branch table: one row per pipe/valve/pump/heat-exchanger segment.
#[derive(Debug, Clone, Default)]
pub struct BranchPit {
    pub id: Vec<CompId>,
    /// Hydraulic endpoints (row indices into the owning `NodePit`).
    pub from_node: Vec<usize>,
    pub to_node: Vec<usize>,
    /// Thermal endpoints — swapped from `from_node`/`to_node` when `v < 0`
    /// at the start of the thermal solve (SPEC_FULL §3.2).
    pub from_node_t: Vec<usize>,
    pub to_node_t: Vec<usize>,
    pub active: Vec<bool>,
    pub active_t: Vec<bool>,
    pub diameter_m: Vec<f64>,
    pub area_m2: Vec<f64>,
    pub length_m: Vec<f64>,
    /// Roughness [mm].
    pub roughness_mm: Vec<f64>,
    pub lambda: Vec<f64>,
    pub alpha_w_m2k: Vec<f64>,
    pub t_ext_k: Vec<f64>,
    pub v_init_m_s: Vec<f64>,
    pub v_init_t_m_s: Vec<f64>,
    pub t_init_out_k: Vec<f64>,
    /// Prescribed heat load [W] setpoint, if configured.
    pub qext_w: Vec<Option<f64>>,
    /// Prescribed in-line temperature loss [K], if configured.
    pub tl_k: Vec<Option<f64>>,
    /// Prescribed outlet-vs-inlet delta [K], if configured.
    pub deltat_k: Vec<Option<f64>>,
    /// Prescribed outlet temperature [K], if configured.
    pub treturn_k: Vec<Option<f64>>,
    /// Prescribed mass flow [kg/s], if configured (flow controllers, heat sinks).
    pub mass_kg_s: Vec<Option<f64>>,
    /// Whether a flow controller on this row is actively clamping flow.
    pub control_active: Vec<bool>,
    /// Whether this branch is a closed valve (identity equation `v = 0`).
    pub closed: Vec<bool>,

    // Scratch columns written by the derivative stage, read by the assembler.
    pub jac_deriv_dv: Vec<f64>,
    pub jac_deriv_dp: Vec<f64>,
    pub jac_deriv_dp1: Vec<f64>,
    pub jac_deriv_dt: Vec<f64>,
    pub jac_deriv_dt1: Vec<f64>,
    pub jac_deriv_dt_out: Vec<f64>,
    pub load_vec_branch: Vec<f64>,
    pub load_vec_branch_t: Vec<f64>,
}

impl BranchPit {
    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        id: CompId,
        from_node: usize,
        to_node: usize,
        diameter_m: f64,
        length_m: f64,
        roughness_mm: f64,
    ) {
        self.id.push(id);
        self.from_node.push(from_node);
        self.to_node.push(to_node);
        self.from_node_t.push(from_node);
        self.to_node_t.push(to_node);
        self.active.push(true);
        self.active_t.push(true);
        let area_m2 = std::f64::consts::PI * diameter_m * diameter_m / 4.0;
        self.diameter_m.push(diameter_m);
        self.area_m2.push(area_m2);
        self.length_m.push(length_m);
        self.roughness_mm.push(roughness_mm);
        self.lambda.push(0.02);
        self.alpha_w_m2k.push(0.0);
        self.t_ext_k.push(293.15);
        self.v_init_m_s.push(0.0);
        self.v_init_t_m_s.push(0.0);
        self.t_init_out_k.push(293.15);
        self.qext_w.push(None);
        self.tl_k.push(None);
        self.deltat_k.push(None);
        self.treturn_k.push(None);
        self.mass_kg_s.push(None);
        self.control_active.push(false);
        self.closed.push(false);
        self.jac_deriv_dv.push(0.0);
        self.jac_deriv_dp.push(0.0);
        self.jac_deriv_dp1.push(0.0);
        self.jac_deriv_dt.push(0.0);
        self.jac_deriv_dt1.push(0.0);
        self.jac_deriv_dt_out.push(0.0);
        self.load_vec_branch.push(0.0);
        self.load_vec_branch_t.push(0.0);
    }

    /// Swap thermal endpoints to the physical upstream/downstream nodes
    /// based on the sign of `v_init_m_s`, and normalize `v_init_t_m_s` to be
    /// non-negative (SPEC_FULL §3.4 invariant).
    pub fn normalize_thermal_direction(&mut self) {
        for i in 0..self.len() {
            if self.v_init_m_s[i] < 0.0 {
                self.from_node_t[i] = self.to_node[i];
                self.to_node_t[i] = self.from_node[i];
            } else {
                self.from_node_t[i] = self.from_node[i];
                self.to_node_t[i] = self.to_node[i];
            }
            self.v_init_t_m_s[i] = self.v_init_m_s[i].abs();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_push_fills_defaults() {
        let mut pit = BranchPit::default();
        pit.push(CompId::from_index(0), 0, 1, 0.1, 100.0, 0.01);
        assert_eq!(pit.len(), 1);
        assert!(pit.qext_w[0].is_none());
        assert!((pit.area_m2[0] - std::f64::consts::PI * 0.01 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_thermal_direction_swaps_on_negative_v() {
        let mut pit = BranchPit::default();
        pit.push(CompId::from_index(0), 0, 1, 0.1, 100.0, 0.01);
        pit.v_init_m_s[0] = -2.0;
        pit.normalize_thermal_direction();
        assert_eq!(pit.from_node_t[0], 1);
        assert_eq!(pit.to_node_t[0], 0);
        assert!((pit.v_init_t_m_s[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_thermal_direction_keeps_order_on_positive_v() {
        let mut pit = BranchPit::default();
        pit.push(CompId::from_index(0), 0, 1, 0.1, 100.0, 0.01);
        pit.v_init_m_s[0] = 3.0;
        pit.normalize_thermal_direction();
        assert_eq!(pit.from_node_t[0], 0);
        assert_eq!(pit.to_node_t[0], 1);
    }
}
