//! PIT construction (SPEC_FULL §4.1): `initialize_pit` allocates the node
//! and branch matrices sized to the network and lets each component fill its
//! own slice.

use crate::network::PipeNetwork;
use tf_core::pit::{BoundaryKind, BranchPit, NodePit};

/// Allocate and fill the full PIT from a built network. Called once per
/// `pipeflow` invocation; the full PIT lives for the duration of that call.
pub fn initialize_pit(net: &PipeNetwork) -> (NodePit, BranchPit) {
    let mut nodes = NodePit::default();
    for (i, spec) in net.nodes.iter().enumerate() {
        let node_type = match spec.fixed_pressure_bar {
            Some(_) => BoundaryKind::DirichletPressure,
            None => BoundaryKind::Free,
        };
        let node_type_t = match spec.fixed_temperature_k {
            Some(_) => BoundaryKind::DirichletTemperature,
            None => BoundaryKind::Free,
        };
        nodes.push(
            tf_core::NodeId::from_index(i as u32),
            spec.p_init_bar,
            spec.t_init_k,
            spec.height_m,
            spec.p_amb_bar,
            spec.t_amb_k,
            spec.load_kg_s,
            spec.load_w,
            node_type,
            node_type_t,
        );
    }

    let mut branches = BranchPit::default();
    for comp in net.graph.components() {
        let from = net.graph.comp_inlet_node(comp.id).expect("built graph");
        let to = net.graph.comp_outlet_node(comp.id).expect("built graph");
        // Geometry defaults are component-specific; components overwrite
        // their own slice in `create_pit_branch_entries` below. Push a
        // placeholder row sized 1 m / 1 m / 0 mm that every component
        // overwrites immediately.
        branches.push(comp.id, from.index() as usize, to.index() as usize, 1.0, 1.0, 0.0);
    }
    branches.normalize_thermal_direction();

    for (row, component) in net.components.iter().enumerate() {
        component.create_pit_branch_entries(&mut branches, row);
    }

    (nodes, branches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;
    use tf_components::Pipe;

    #[test]
    fn initializes_rows_for_every_node_and_branch() {
        let mut builder = NetworkBuilder::new();
        let n0 = builder.add_node("a");
        let n1 = builder.add_node("b");
        builder.set_pressure_boundary(n0, 5.0);
        builder.add_branch(
            "p1",
            n0,
            n1,
            Pipe::new("p1", 0.1, 100.0, 0.01, 0.0, 293.15).unwrap(),
        );
        let net = builder.build().unwrap();
        let (nodes, branches) = initialize_pit(&net);

        assert_eq!(nodes.len(), 2);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches.diameter_m[0], 0.1);
        assert_eq!(branches.length_m[0], 100.0);
        assert!(nodes.node_type[0].is_dirichlet());
        assert!(!nodes.node_type[1].is_dirichlet());
    }
}
