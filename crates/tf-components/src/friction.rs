//! Friction-factor correlations (SPEC_FULL §4.3.1).

use std::str::FromStr;

/// Darcy friction factor model, selected by the `friction_model` solve option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrictionModel {
    /// Fully-rough (Nikuradse) correlation. Used as the fallback when a
    /// friction-model string fails to parse.
    #[default]
    Nikuradse,
    /// Iterative implicit Colebrook-White / Prandtl-Colebrook correlation.
    PrandtlColebrook,
    /// Explicit Swamee-Jain approximation to Colebrook-White.
    SwameeJain,
}

impl FromStr for FrictionModel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nikuradse" => Ok(FrictionModel::Nikuradse),
            "prandtl-colebrook" | "colebrook" => Ok(FrictionModel::PrandtlColebrook),
            "swamee-jain" | "swamee" | "jain" => Ok(FrictionModel::SwameeJain),
            _ => Err(()),
        }
    }
}

/// Compute the Darcy friction factor `lambda` for a pipe segment.
///
/// `reynolds` may be zero or tiny (stalled flow); callers must not divide by
/// `reynolds` downstream without checking for this.
pub fn lambda(model: FrictionModel, reynolds: f64, relative_roughness: f64) -> f64 {
    if reynolds.abs() < 1.0 {
        return 64.0;
    }
    if reynolds.abs() < 2300.0 {
        return 64.0 / reynolds.abs();
    }
    match model {
        FrictionModel::Nikuradse => nikuradse(relative_roughness),
        FrictionModel::PrandtlColebrook => prandtl_colebrook(reynolds.abs(), relative_roughness),
        FrictionModel::SwameeJain => swamee_jain(reynolds.abs(), relative_roughness),
    }
}

fn nikuradse(relative_roughness: f64) -> f64 {
    let arg = relative_roughness / 3.71;
    1.0 / (-2.0 * arg.log10()).powi(2)
}

fn swamee_jain(reynolds: f64, relative_roughness: f64) -> f64 {
    let a = relative_roughness / 3.7;
    let b = 5.74 / reynolds.powf(0.9);
    0.25 / (a + b).log10().powi(2)
}

/// Iterative Colebrook-White solve (fixed-point on `1/sqrt(lambda)`), seeded
/// from the Swamee-Jain explicit approximation.
fn prandtl_colebrook(reynolds: f64, relative_roughness: f64) -> f64 {
    const MAX_ITER: usize = 20;
    const TOL: f64 = 1e-10;

    let mut f = swamee_jain(reynolds, relative_roughness);
    for _ in 0..MAX_ITER {
        let rhs = -2.0 * (relative_roughness / 3.71 + 2.51 / (reynolds * f.sqrt())).log10();
        let f_next = 1.0 / rhs.powi(2);
        if (f_next - f).abs() < TOL {
            return f_next;
        }
        f = f_next;
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!(
            "nikuradse".parse::<FrictionModel>(),
            Ok(FrictionModel::Nikuradse)
        );
        assert_eq!(
            "prandtl-colebrook".parse::<FrictionModel>(),
            Ok(FrictionModel::PrandtlColebrook)
        );
        assert_eq!(
            "swamee-jain".parse::<FrictionModel>(),
            Ok(FrictionModel::SwameeJain)
        );
    }

    #[test]
    fn rejects_unknown_name() {
        assert!("unknown-model".parse::<FrictionModel>().is_err());
    }

    #[test]
    fn laminar_uses_64_over_re() {
        let f = lambda(FrictionModel::Nikuradse, 1000.0, 0.001);
        assert!((f - 0.064).abs() < 1e-12);
    }

    #[test]
    fn turbulent_models_agree_within_tolerance() {
        let re = 50_000.0;
        let rr = 0.0005;
        let f_sj = lambda(FrictionModel::SwameeJain, re, rr);
        let f_cb = lambda(FrictionModel::PrandtlColebrook, re, rr);
        assert!((f_sj - f_cb).abs() < 0.002, "sj={f_sj} cb={f_cb}");
    }

    #[test]
    fn friction_factor_decreases_with_reynolds() {
        let rr = 0.001;
        let f_low = lambda(FrictionModel::SwameeJain, 10_000.0, rr);
        let f_high = lambda(FrictionModel::SwameeJain, 200_000.0, rr);
        assert!(f_high < f_low);
    }
}
