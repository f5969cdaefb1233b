//! Network construction (SPEC_FULL §6.2): an incremental builder over
//! `tf_graph::GraphBuilder`, attaching per-node boundary/environment config
//! and per-branch component behavior before handing off to `initialize_pit`.

use tf_components::BranchComponent;
use tf_core::{CompId, NodeId, TfResult};
use tf_fluids::{Composition, ConstantFluid, FluidProperties};
use tf_graph::{Graph, GraphBuilder};

/// Static, per-node configuration that feeds the node PIT row.
#[derive(Debug, Clone)]
pub(crate) struct NodeSpec {
    pub p_init_bar: f64,
    pub t_init_k: f64,
    pub height_m: f64,
    pub p_amb_bar: f64,
    pub t_amb_k: f64,
    pub load_kg_s: f64,
    pub load_w: f64,
    pub fixed_pressure_bar: Option<f64>,
    pub fixed_temperature_k: Option<f64>,
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self {
            p_init_bar: 1.0,
            t_init_k: 293.15,
            height_m: 0.0,
            p_amb_bar: 1.0,
            t_amb_k: 293.15,
            load_kg_s: 0.0,
            load_w: 0.0,
            fixed_pressure_bar: None,
            fixed_temperature_k: None,
        }
    }
}

/// A validated pipe network: topology plus per-node/per-branch configuration,
/// ready for `initialize_pit`.
pub struct PipeNetwork {
    pub(crate) graph: Graph,
    pub(crate) nodes: Vec<NodeSpec>,
    pub(crate) components: Vec<Box<dyn BranchComponent>>,
    pub(crate) fluid: Box<dyn FluidProperties>,
    pub(crate) composition: Composition,
    /// Persisted state between `pipeflow` calls (SPEC_FULL §6.4): set only on
    /// a successful solve, never on a failed one.
    pub(crate) hyd_flag: bool,
    pub(crate) converged: bool,
    pub(crate) last_nodes: Option<tf_core::pit::NodePit>,
    pub(crate) last_branches: Option<tf_core::pit::BranchPit>,
}

impl PipeNetwork {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn branch_count(&self) -> usize {
        self.components.len()
    }

    pub fn fluid(&self) -> &dyn FluidProperties {
        self.fluid.as_ref()
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Whether a hydraulic solve has converged at least once for this
    /// network (`mode=heat` requires this).
    pub fn hyd_flag(&self) -> bool {
        self.hyd_flag
    }

    /// Whether the most recent `pipeflow` call converged.
    pub fn converged(&self) -> bool {
        self.converged
    }
}

/// Builder for a [`PipeNetwork`]. Nodes are added first (returning stable
/// `NodeId`s), then branches are added referencing those node pairs.
pub struct NetworkBuilder {
    graph: GraphBuilder,
    nodes: Vec<NodeSpec>,
    components: Vec<Box<dyn BranchComponent>>,
    fluid: Box<dyn FluidProperties>,
    composition: Composition,
}

impl Default for NetworkBuilder {
    /// Defaults to liquid water, matching the donor's water-grid default.
    fn default() -> Self {
        Self {
            graph: GraphBuilder::default(),
            nodes: Vec::new(),
            components: Vec::new(),
            fluid: Box::new(ConstantFluid::water()),
            composition: Composition::pure(tf_fluids::Species::H2O),
        }
    }
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the fluid model and composition (defaults to liquid water).
    pub fn set_fluid(&mut self, fluid: impl FluidProperties + 'static, composition: Composition) {
        self.fluid = Box::new(fluid);
        self.composition = composition;
    }

    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.graph.add_node(name);
        self.nodes.push(NodeSpec::default());
        id
    }

    fn node_spec_mut(&mut self, node: NodeId) -> &mut NodeSpec {
        &mut self.nodes[node.index() as usize]
    }

    /// Mark a node as a Dirichlet-pressure boundary (an external grid
    /// connection).
    pub fn set_pressure_boundary(&mut self, node: NodeId, p_bar: f64) {
        let spec = self.node_spec_mut(node);
        spec.fixed_pressure_bar = Some(p_bar);
        spec.p_init_bar = p_bar;
    }

    /// Mark a node as a Dirichlet-temperature boundary (a heat source).
    pub fn set_temperature_boundary(&mut self, node: NodeId, t_k: f64) {
        let spec = self.node_spec_mut(node);
        spec.fixed_temperature_k = Some(t_k);
        spec.t_init_k = t_k;
    }

    /// Override the starting iterate for a free node (Dirichlet nodes start
    /// from their boundary value regardless).
    pub fn set_initial_guess(&mut self, node: NodeId, p_bar: f64, t_k: f64) {
        let spec = self.node_spec_mut(node);
        spec.p_init_bar = p_bar;
        spec.t_init_k = t_k;
    }

    pub fn set_height(&mut self, node: NodeId, height_m: f64) {
        self.node_spec_mut(node).height_m = height_m;
    }

    pub fn set_ambient(&mut self, node: NodeId, p_amb_bar: f64, t_amb_k: f64) {
        let spec = self.node_spec_mut(node);
        spec.p_amb_bar = p_amb_bar;
        spec.t_amb_k = t_amb_k;
    }

    /// External mass/heat injection at a node (positive = into the node).
    pub fn set_load(&mut self, node: NodeId, load_kg_s: f64, load_w: f64) {
        let spec = self.node_spec_mut(node);
        spec.load_kg_s = load_kg_s;
        spec.load_w = load_w;
    }

    pub fn add_branch(
        &mut self,
        name: impl Into<String>,
        from: NodeId,
        to: NodeId,
        component: impl BranchComponent + 'static,
    ) -> CompId {
        let id = self.graph.add_component(name, from, to);
        self.components.push(Box::new(component));
        id
    }

    pub fn build(self) -> TfResult<PipeNetwork> {
        let graph = self.graph.build()?;
        Ok(PipeNetwork {
            graph,
            nodes: self.nodes,
            components: self.components,
            fluid: self.fluid,
            composition: self.composition,
            hyd_flag: false,
            converged: false,
            last_nodes: None,
            last_branches: None,
        })
    }
}
