//! Error types for solver operations (SPEC_FULL §7).

use tf_components::ComponentError;
use tf_core::error::TfError;
use tf_fluids::FluidError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("Newton solve did not converge after {iterations} iterations (residual norm {residual_norm})")]
    NotConverged {
        iterations: usize,
        residual_norm: f64,
    },

    #[error("mode=heat requires a prior converged hydraulic solution")]
    MissingHydraulicPrerequisite,

    #[error("unrecognized coupling mode: {what}")]
    BadMode { what: String },

    #[error("no Dirichlet-pressure boundary node: system is underdetermined")]
    NoBoundary,

    #[error("sparse Jacobian solve failed: {what}")]
    SingularJacobian { what: String },

    #[error("invalid option: {what}")]
    InvalidOption { what: &'static str },

    #[error("component error: {0}")]
    Component(#[from] ComponentError),

    #[error("fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("graph error: {0}")]
    Graph(#[from] tf_graph::GraphError),
}

pub type SolveResult<T> = Result<T, SolveError>;

impl From<SolveError> for TfError {
    fn from(e: SolveError) -> Self {
        match e {
            SolveError::NotConverged { .. } => TfError::Invariant {
                what: "newton did not converge",
            },
            SolveError::MissingHydraulicPrerequisite => TfError::InvalidArg {
                what: "missing hydraulic prerequisite",
            },
            SolveError::BadMode { .. } => TfError::InvalidArg { what: "mode" },
            SolveError::NoBoundary => TfError::InvalidArg {
                what: "no pressure boundary",
            },
            SolveError::SingularJacobian { .. } => TfError::Invariant {
                what: "singular jacobian",
            },
            SolveError::InvalidOption { what } => TfError::InvalidArg { what },
            SolveError::Component(_) => TfError::InvalidArg { what: "component" },
            SolveError::Fluid(_) => TfError::InvalidArg { what: "fluid" },
            SolveError::Graph(_) => TfError::InvalidArg { what: "graph" },
        }
    }
}
