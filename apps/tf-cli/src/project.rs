//! Minimal YAML project format: nodes and branches for a pipe network,
//! deserialized into a [`tf_solver::NetworkBuilder`].

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tf_components::{FlowController, HeatExchanger, HeatSink, Pipe, Pump, PumpCurve, ThermalSetpoint, Valve};
use tf_fluids::{Composition, IdealGas, Species};
use tf_solver::{NetworkBuilder, PipeNetwork, SolveOptionsConfig};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("failed to read project file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse project file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("branch {name}: unknown component kind {kind:?}")]
    UnknownKind { name: String, kind: String },
    #[error("branch {name}: references unknown node {node:?}")]
    UnknownNode { name: String, node: String },
    #[error("component error in branch {name}: {source}")]
    Component {
        name: String,
        #[source]
        source: tf_components::ComponentError,
    },
    #[error("network build error: {0}")]
    Build(#[from] tf_core::TfError),
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct ProjectFile {
    pub fluid: String,
    #[serde(default)]
    pub options: Option<SolveOptionsConfig>,
    pub nodes: Vec<NodeFile>,
    pub branches: Vec<BranchFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct NodeFile {
    pub name: String,
    pub pressure_boundary_bar: Option<f64>,
    pub temperature_boundary_k: Option<f64>,
    pub load_kg_s: f64,
    pub load_w: f64,
    pub height_m: f64,
    pub p_amb_bar: f64,
    pub t_amb_k: f64,
    pub init_p_bar: Option<f64>,
    pub init_t_k: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct BranchFile {
    pub name: String,
    pub from: String,
    pub to: String,
    pub kind: String,
    pub diameter_m: f64,
    pub length_m: f64,
    pub roughness_mm: f64,
    pub alpha_w_m2k: f64,
    pub t_ext_k: f64,
    pub opening: f64,
    pub pump_dp_bar: f64,
    pub controlled_mdot_kg_s: f64,
    pub control_active: bool,
    pub qext_w: Option<f64>,
    pub deltat_k: Option<f64>,
    pub treturn_k: Option<f64>,
}

pub fn load(path: &Path) -> Result<ProjectFile, ProjectError> {
    let text = std::fs::read_to_string(path).map_err(|source| ProjectError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_yaml::from_str(&text)?)
}

/// Build a [`PipeNetwork`] from a parsed project file.
pub fn build_network(project: &ProjectFile) -> Result<PipeNetwork, ProjectError> {
    let mut builder = NetworkBuilder::new();
    if project.fluid == "natural_gas" {
        builder.set_fluid(IdealGas::natural_gas(), Composition::pure(Species::CH4));
    }

    let mut ids = HashMap::new();
    for node in &project.nodes {
        let id = builder.add_node(node.name.clone());
        ids.insert(node.name.clone(), id);
        if let Some(p) = node.pressure_boundary_bar {
            builder.set_pressure_boundary(id, p);
        }
        if let Some(t) = node.temperature_boundary_k {
            builder.set_temperature_boundary(id, t);
        }
        builder.set_height(id, node.height_m);
        builder.set_ambient(id, node.p_amb_bar, node.t_amb_k);
        builder.set_load(id, node.load_kg_s, node.load_w);
        if node.init_p_bar.is_some() || node.init_t_k.is_some() {
            let p = node.init_p_bar.unwrap_or(1.0);
            let t = node.init_t_k.unwrap_or(293.15);
            builder.set_initial_guess(id, p, t);
        }
    }

    for branch in &project.branches {
        let from = *ids.get(&branch.from).ok_or_else(|| ProjectError::UnknownNode {
            name: branch.name.clone(),
            node: branch.from.clone(),
        })?;
        let to = *ids.get(&branch.to).ok_or_else(|| ProjectError::UnknownNode {
            name: branch.name.clone(),
            node: branch.to.clone(),
        })?;
        add_branch(&mut builder, branch, from, to)?;
    }

    Ok(builder.build()?)
}

fn add_branch(
    builder: &mut NetworkBuilder,
    branch: &BranchFile,
    from: tf_core::NodeId,
    to: tf_core::NodeId,
) -> Result<(), ProjectError> {
    let component_error = |source| ProjectError::Component {
        name: branch.name.clone(),
        source,
    };

    match branch.kind.as_str() {
        "pipe" => {
            let pipe = Pipe::new(
                branch.name.clone(),
                branch.diameter_m,
                branch.length_m,
                branch.roughness_mm,
                branch.alpha_w_m2k,
                branch.t_ext_k,
            )
            .map_err(component_error)?;
            builder.add_branch(branch.name.clone(), from, to, pipe);
        }
        "valve" => {
            let valve =
                Valve::new(branch.name.clone(), branch.diameter_m, branch.length_m, branch.opening)
                    .map_err(component_error)?;
            builder.add_branch(branch.name.clone(), from, to, valve);
        }
        "pump" => {
            let pump = Pump::new(branch.name.clone(), PumpCurve::Fixed(branch.pump_dp_bar * 1e5))
                .map_err(component_error)?;
            builder.add_branch(branch.name.clone(), from, to, pump);
        }
        "flow_controller" => {
            let controller = FlowController::new(
                branch.name.clone(),
                branch.diameter_m,
                branch.controlled_mdot_kg_s,
                branch.control_active,
            )
            .map_err(component_error)?;
            builder.add_branch(branch.name.clone(), from, to, controller);
        }
        "heat_exchanger" => {
            let setpoint = thermal_setpoint(branch);
            let exchanger = HeatExchanger::new(
                branch.name.clone(),
                branch.diameter_m,
                branch.length_m,
                branch.alpha_w_m2k,
                branch.t_ext_k,
                setpoint,
            )
            .map_err(component_error)?;
            builder.add_branch(branch.name.clone(), from, to, exchanger);
        }
        "heat_sink" => {
            let setpoint = thermal_setpoint(branch);
            let sink = HeatSink::new(
                branch.name.clone(),
                branch.diameter_m,
                branch.length_m,
                branch.controlled_mdot_kg_s,
                branch.control_active,
                setpoint,
            )
            .map_err(component_error)?;
            builder.add_branch(branch.name.clone(), from, to, sink);
        }
        other => {
            return Err(ProjectError::UnknownKind {
                name: branch.name.clone(),
                kind: other.to_string(),
            });
        }
    }
    Ok(())
}

fn thermal_setpoint(branch: &BranchFile) -> ThermalSetpoint {
    if let Some(treturn) = branch.treturn_k {
        ThermalSetpoint::TReturn(treturn)
    } else if let Some(deltat) = branch.deltat_k {
        ThermalSetpoint::DeltaT(deltat)
    } else {
        ThermalSetpoint::Qext(branch.qext_w.unwrap_or(0.0))
    }
}
