//! Pump / circulation pump component (SPEC_FULL §4.3.2).
//!
//! Replaces the generic friction residual with a pressure-rise
//! characteristic. The branch row keeps the generic kernel's
//! `adaption_before_derivatives_hydraulic` no-op, then overwrites the
//! hydraulic derivatives in `adaption_after_derivatives_hydraulic`:
//! residual `r = (p_from + dp(v)) - p_to`, so `dr/dp_from = +1`,
//! `dr/dp_to = -1`, `dr/dv = dp'(v)`.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::{BranchComponent, BranchFluidContext};
use tf_core::pit::{BranchPit, NodePit};

/// Pressure-rise characteristic as a function of volumetric flow `q = v * area`.
#[derive(Debug, Clone)]
pub enum PumpCurve {
    /// Constant pressure rise regardless of flow.
    Fixed(f64),
    /// `dp(q) = sum(coeffs[i] * q^i)`, lowest order first.
    Polynomial(Vec<f64>),
    /// Piecewise-linear interpolation over `(q, dp)` points, sorted by `q`.
    /// Flow outside the table range is clamped to the nearest endpoint's
    /// slope.
    Interpolated(Vec<(f64, f64)>),
}

impl PumpCurve {
    fn evaluate(&self, q: f64) -> (f64, f64) {
        match self {
            PumpCurve::Fixed(dp) => (*dp, 0.0),
            PumpCurve::Polynomial(coeffs) => {
                let mut dp = 0.0;
                let mut q_pow = 1.0;
                for c in coeffs.iter() {
                    dp += c * q_pow;
                    q_pow *= q;
                }
                let mut slope = 0.0;
                let mut q_pow = 1.0;
                for (i, c) in coeffs.iter().enumerate().skip(1) {
                    slope += (i as f64) * c * q_pow;
                    q_pow *= q;
                }
                (dp, slope)
            }
            PumpCurve::Interpolated(points) => interpolate(points, q),
        }
    }
}

fn interpolate(points: &[(f64, f64)], q: f64) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    if points.len() == 1 {
        return (points[0].1, 0.0);
    }
    if q <= points[0].0 {
        let (q0, dp0) = points[0];
        let (q1, dp1) = points[1];
        let slope = (dp1 - dp0) / (q1 - q0);
        return (dp0 + slope * (q - q0), slope);
    }
    let last = points.len() - 1;
    if q >= points[last].0 {
        let (q0, dp0) = points[last - 1];
        let (q1, dp1) = points[last];
        let slope = (dp1 - dp0) / (q1 - q0);
        return (dp1 + slope * (q - q1), slope);
    }
    for w in points.windows(2) {
        let (q0, dp0) = w[0];
        let (q1, dp1) = w[1];
        if q >= q0 && q <= q1 {
            let slope = (dp1 - dp0) / (q1 - q0);
            return (dp0 + slope * (q - q0), slope);
        }
    }
    (points[last].1, 0.0)
}

#[derive(Debug, Clone)]
pub struct Pump {
    name: String,
    curve: PumpCurve,
}

impl Pump {
    pub fn new(name: impl Into<String>, curve: PumpCurve) -> ComponentResult<Self> {
        if let PumpCurve::Fixed(dp) = &curve {
            if !dp.is_finite() {
                return Err(ComponentError::InvalidArg {
                    what: "pump pressure rise must be finite",
                });
            }
        }
        Ok(Self {
            name: name.into(),
            curve,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl BranchComponent for Pump {
    fn kind(&self) -> &'static str {
        "pump"
    }

    fn create_pit_branch_entries(&self, branch: &mut BranchPit, row: usize) {
        // Pumps carry no friction loss of their own; diameter/length are set
        // by the network builder to whatever cross-section feeds the curve.
        let _ = row;
        let _ = branch;
    }

    fn adaption_after_derivatives_hydraulic(
        &self,
        branch: &mut BranchPit,
        nodes: &NodePit,
        row: usize,
        _fluid: BranchFluidContext,
    ) {
        let from = branch.from_node[row];
        let to = branch.to_node[row];
        let v = branch.v_init_m_s[row];
        let q = v * branch.area_m2[row];

        let (dp_bar, slope_per_m3s) = self.curve.evaluate(q);
        let dp_pa = dp_bar;

        let p_from = nodes.p_init_bar[from] * 1e5;
        let p_to = nodes.p_init_bar[to] * 1e5;
        let residual = (p_from + dp_pa) - p_to;

        branch.jac_deriv_dv[row] = slope_per_m3s * branch.area_m2[row];
        branch.jac_deriv_dp[row] = 1.0;
        branch.jac_deriv_dp1[row] = -1.0;
        branch.load_vec_branch[row] = -residual;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::ids::{CompId, Id};
    use tf_core::pit::BoundaryKind;

    fn test_fluid_ctx() -> BranchFluidContext {
        BranchFluidContext {
            rho_kg_m3: 998.2,
            mu_pa_s: 1.002e-3,
            cp_j_kg_k: 4182.0,
        }
    }

    fn network() -> (NodePit, BranchPit) {
        let mut nodes = NodePit::default();
        nodes.push(
            Id::from_index(0),
            2.0,
            300.0,
            0.0,
            1.0,
            293.15,
            0.0,
            0.0,
            BoundaryKind::Free,
            BoundaryKind::Free,
        );
        nodes.push(
            Id::from_index(1),
            5.0,
            300.0,
            0.0,
            1.0,
            293.15,
            0.0,
            0.0,
            BoundaryKind::DirichletPressure,
            BoundaryKind::Free,
        );
        let mut branch = BranchPit::default();
        branch.push(CompId::from_index(0), 0, 1, 0.1, 1.0, 0.0);
        (nodes, branch)
    }

    #[test]
    fn fixed_curve_residual_zero_at_matching_rise() {
        let pump = Pump::new("p1", PumpCurve::Fixed(3.0e5)).unwrap();
        let (nodes, mut branch) = network();
        branch.v_init_m_s[0] = 0.1;
        pump.adaption_after_derivatives_hydraulic(&mut branch, &nodes, 0, test_fluid_ctx());
        assert!((branch.load_vec_branch[0]).abs() < 1e-6);
        assert_eq!(branch.jac_deriv_dp[0], 1.0);
        assert_eq!(branch.jac_deriv_dp1[0], -1.0);
    }

    #[test]
    fn polynomial_curve_slope_is_nonzero() {
        let pump = Pump::new("p1", PumpCurve::Polynomial(vec![4.0e5, -1.0e5, -2.0e4])).unwrap();
        let (nodes, mut branch) = network();
        branch.v_init_m_s[0] = 0.2;
        pump.adaption_after_derivatives_hydraulic(&mut branch, &nodes, 0, test_fluid_ctx());
        assert!(branch.jac_deriv_dv[0] != 0.0);
    }

    #[test]
    fn interpolated_curve_matches_endpoints() {
        let pump = Pump::new(
            "p1",
            PumpCurve::Interpolated(vec![(0.0, 5.0e5), (0.01, 4.0e5), (0.02, 2.0e5)]),
        )
        .unwrap();
        let (dp, _slope) = pump.curve.evaluate(0.01);
        assert!((dp - 4.0e5).abs() < 1e-6);
    }
}
