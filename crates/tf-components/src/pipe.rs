//! Pipe component (SPEC_FULL §4.3.1): Darcy-Weisbach friction with
//! advection-with-loss thermal coupling.
//!
//! A pipe contributes no overrides over the generic derivative kernel in
//! [`crate::derivatives`] — its hooks below only perform the one-time row
//! initialization. It exists as a distinct type (rather than bare rows with
//! no owning component) so the network builder has something to attach
//! geometry and friction configuration to.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::BranchComponent;
use tf_core::pit::BranchPit;

/// A straight pipe segment with Darcy-Weisbach friction and optional heat
/// loss to the surroundings.
#[derive(Debug, Clone)]
pub struct Pipe {
    name: String,
    diameter_m: f64,
    length_m: f64,
    roughness_mm: f64,
    alpha_w_m2k: f64,
    t_ext_k: f64,
}

impl Pipe {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        diameter_m: f64,
        length_m: f64,
        roughness_mm: f64,
        alpha_w_m2k: f64,
        t_ext_k: f64,
    ) -> ComponentResult<Self> {
        if diameter_m <= 0.0 || !diameter_m.is_finite() {
            return Err(ComponentError::InvalidArg {
                what: "pipe diameter must be positive and finite",
            });
        }
        if length_m <= 0.0 || !length_m.is_finite() {
            return Err(ComponentError::InvalidArg {
                what: "pipe length must be positive and finite",
            });
        }
        if roughness_mm < 0.0 || !roughness_mm.is_finite() {
            return Err(ComponentError::InvalidArg {
                what: "pipe roughness must be non-negative and finite",
            });
        }
        Ok(Self {
            name: name.into(),
            diameter_m,
            length_m,
            roughness_mm,
            alpha_w_m2k,
            t_ext_k,
        })
    }
}

impl BranchComponent for Pipe {
    fn kind(&self) -> &'static str {
        "pipe"
    }

    fn create_pit_branch_entries(&self, branch: &mut BranchPit, row: usize) {
        branch.diameter_m[row] = self.diameter_m;
        branch.area_m2[row] = std::f64::consts::PI * self.diameter_m * self.diameter_m / 4.0;
        branch.length_m[row] = self.length_m;
        branch.roughness_mm[row] = self.roughness_mm;
        branch.alpha_w_m2k[row] = self.alpha_w_m2k;
        branch.t_ext_k[row] = self.t_ext_k;
    }
}

impl Pipe {
    pub fn name(&self) -> &str {
        &self.name
    }
}
