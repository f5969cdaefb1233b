//! Typed solve options (SPEC_FULL §6.1).
//!
//! Mirrors the donor's dynamic `**kwargs` option dictionary as a typed struct
//! with `Default` and constructor validation; unknown keys in a deserialized
//! form are a hard error via `#[serde(deny_unknown_fields)]` rather than a
//! silent drop.

use crate::error::{SolveError, SolveResult};
use tf_components::FrictionModel;

/// Which phase(s) of the solve to run (SPEC_FULL §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Hydraulics,
    Heat,
    All,
    Bidirectional,
}

impl std::str::FromStr for Mode {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hydraulics" => Ok(Mode::Hydraulics),
            "heat" => Ok(Mode::Heat),
            "all" => Ok(Mode::All),
            "bidirectional" => Ok(Mode::Bidirectional),
            other => Err(SolveError::BadMode {
                what: other.to_string(),
            }),
        }
    }
}

/// Damping strategy for the Newton driver (SPEC_FULL §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonlinearMethod {
    #[default]
    Automatic,
    Constant,
}

#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    pub friction_model: FrictionModel,
    /// Max Newton iterations per subproblem.
    pub iter: usize,
    /// Max outer bidirectional-coupling iterations.
    pub iter_bidirect: usize,
    /// Pressure convergence tolerance [bar].
    pub tol_p: f64,
    /// Velocity convergence tolerance [m/s].
    pub tol_v: f64,
    /// Temperature convergence tolerance [K].
    pub tol_t: f64,
    /// Residual-norm convergence tolerance.
    pub tol_res: f64,
    pub nonlinear_method: NonlinearMethod,
    /// Initial damping factor, `(0, 1]`.
    pub alpha: f64,
    /// Whether to run connectivity analysis and PIT reduction before each
    /// subproblem. When `false`, the Newton solve runs directly over the
    /// full, unreduced PIT.
    pub check_connectivity: bool,
    /// Keep solver scratch data across calls (not yet wired to a cache; the
    /// option exists so callers can opt in ahead of that cache landing).
    pub reuse_internal_data: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            friction_model: FrictionModel::default(),
            iter: 50,
            iter_bidirect: 10,
            tol_p: 1e-4,
            tol_v: 1e-4,
            tol_t: 1e-3,
            tol_res: 1e-6,
            nonlinear_method: NonlinearMethod::default(),
            alpha: 1.0,
            check_connectivity: true,
            reuse_internal_data: false,
        }
    }
}

impl SolveOptions {
    /// Validate at construction time rather than deep inside the Newton loop.
    pub fn validate(&self) -> SolveResult<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(SolveError::InvalidOption {
                what: "alpha must be in (0, 1]",
            });
        }
        if self.iter == 0 {
            return Err(SolveError::InvalidOption {
                what: "iter must be greater than zero",
            });
        }
        if self.iter_bidirect == 0 {
            return Err(SolveError::InvalidOption {
                what: "iter_bidirect must be greater than zero",
            });
        }
        for (tol, what) in [
            (self.tol_p, "tol_p must be positive"),
            (self.tol_v, "tol_v must be positive"),
            (self.tol_t, "tol_t must be positive"),
            (self.tol_res, "tol_res must be positive"),
        ] {
            if !(tol > 0.0) {
                return Err(SolveError::InvalidOption { what });
            }
        }
        Ok(())
    }
}

/// Wire format for loading options from a project file: plain scalar types
/// only, so it can be deserialized without depending on the runtime enums'
/// own `serde` support. Unknown keys are a hard error, never a silent drop.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SolveOptionsConfig {
    pub mode: String,
    pub friction_model: String,
    pub iter: usize,
    pub iter_bidirect: usize,
    pub tol_p: f64,
    pub tol_v: f64,
    pub tol_t: f64,
    pub tol_res: f64,
    pub nonlinear_method: String,
    pub alpha: f64,
    pub check_connectivity: bool,
    pub reuse_internal_data: bool,
}

impl Default for SolveOptionsConfig {
    fn default() -> Self {
        let defaults = SolveOptions::default();
        Self {
            mode: "hydraulics".to_string(),
            friction_model: "nikuradse".to_string(),
            iter: defaults.iter,
            iter_bidirect: defaults.iter_bidirect,
            tol_p: defaults.tol_p,
            tol_v: defaults.tol_v,
            tol_t: defaults.tol_t,
            tol_res: defaults.tol_res,
            nonlinear_method: "automatic".to_string(),
            alpha: defaults.alpha,
            check_connectivity: defaults.check_connectivity,
            reuse_internal_data: defaults.reuse_internal_data,
        }
    }
}

impl SolveOptionsConfig {
    pub fn parse(&self) -> SolveResult<(Mode, SolveOptions)> {
        let mode = self.mode.parse()?;
        let friction_model = self.friction_model.parse().unwrap_or_default();
        let nonlinear_method = match self.nonlinear_method.as_str() {
            "automatic" => NonlinearMethod::Automatic,
            "constant" => NonlinearMethod::Constant,
            _ => {
                return Err(SolveError::InvalidOption {
                    what: "nonlinear_method must be \"automatic\" or \"constant\"",
                });
            }
        };
        let opts = SolveOptions {
            friction_model,
            iter: self.iter,
            iter_bidirect: self.iter_bidirect,
            tol_p: self.tol_p,
            tol_v: self.tol_v,
            tol_t: self.tol_t,
            tol_res: self.tol_res,
            nonlinear_method,
            alpha: self.alpha,
            check_connectivity: self.check_connectivity,
            reuse_internal_data: self.reuse_internal_data,
        };
        opts.validate()?;
        Ok((mode, opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SolveOptions::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        let mut opts = SolveOptions::default();
        opts.alpha = 0.0;
        assert!(opts.validate().is_err());
        opts.alpha = 1.5;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn rejects_zero_iter() {
        let mut opts = SolveOptions::default();
        opts.iter = 0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn mode_parses_known_strings() {
        assert_eq!("hydraulics".parse::<Mode>().unwrap(), Mode::Hydraulics);
        assert_eq!("bidirectional".parse::<Mode>().unwrap(), Mode::Bidirectional);
        assert!("nonsense".parse::<Mode>().is_err());
    }

    #[test]
    fn config_defaults_parse_to_defaults() {
        let (mode, opts) = SolveOptionsConfig::default().parse().unwrap();
        assert_eq!(mode, Mode::Hydraulics);
        assert_eq!(opts.friction_model, FrictionModel::Nikuradse);
    }

    #[test]
    fn config_rejects_bad_mode() {
        let mut cfg = SolveOptionsConfig::default();
        cfg.mode = "sideways".to_string();
        assert!(cfg.parse().is_err());
    }
}
