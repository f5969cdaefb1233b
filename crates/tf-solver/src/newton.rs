//! Damped Newton-Raphson driver (SPEC_FULL §4.5).
//!
//! `NewtonConfig` from the donor collapses into `SolveOptions` here: once
//! the P,h-specific trust-region fields (enthalpy step limits, line-search
//! backtracking) are dropped along with the P,h formulation itself, the
//! remaining fields (`iter`, `tol_*`, `alpha`, `nonlinear_method`) are
//! exactly `SolveOptions`'s fields, so this driver takes `&SolveOptions`
//! directly rather than duplicating a parallel config struct.

use crate::error::{SolveError, SolveResult};
use crate::options::{NonlinearMethod, SolveOptions};
use std::ops::Range;

/// Bridges the Newton driver to a concrete problem (hydraulic or thermal
/// phase): packing/unpacking the flat iterate and re-running the component
/// hooks + derivative kernel + assembly at the current PIT state.
pub trait NewtonProblem {
    /// Current iterate as a flat vector, ordered `[node unknowns, branch
    /// unknowns]` to match `assembly::AssembledSystem`'s row layout.
    fn iterate(&self) -> Vec<f64>;

    /// Write a trial iterate back into the underlying PIT state so the next
    /// `assemble` call sees it.
    fn set_iterate(&mut self, x: &[f64]);

    /// Re-run hooks, derivative kernel, and assembly at the current PIT
    /// state, returning the linearized system for this iteration.
    fn assemble(&mut self) -> SolveResult<crate::assembly::AssembledSystem>;

    /// Slices of `iterate()` naming each variable group (e.g. pressure,
    /// velocity), in the same order as `tolerances()`. Per-variable errors
    /// (SPEC_FULL §4.5) are the mean-L2 norm over each such group, not over
    /// individual rows.
    fn variable_groups(&self) -> Vec<Range<usize>>;

    /// One convergence tolerance per named variable group, same length and
    /// order as `variable_groups()`.
    fn tolerances(&self) -> Vec<f64>;
}

/// Mean-L2 norm of the difference between two equal-length slices,
/// `‖x_new − x_old‖₂ / n` (SPEC_FULL §4.5), matching
/// `AssembledSystem::residual_norm`'s convention.
fn mean_l2_diff(new: &[f64], old: &[f64]) -> f64 {
    let sum_sq: f64 = new.iter().zip(old.iter()).map(|(n, o)| (n - o).powi(2)).sum();
    sum_sq.sqrt() / new.len() as f64
}

/// Outcome of a converged Newton solve.
#[derive(Debug, Clone, Copy)]
pub struct NewtonResult {
    pub iterations: usize,
    pub residual_norm: f64,
}

const MIN_ALPHA: f64 = 1e-6;

/// Run the damped Newton-Raphson loop described in SPEC_FULL §4.5 to
/// convergence, or fail with `NotConverged` after `opts.iter` iterations.
pub fn solve<P: NewtonProblem>(problem: &mut P, opts: &SolveOptions) -> SolveResult<NewtonResult> {
    let mut alpha = opts.alpha;
    let mut prev_errs: Option<Vec<f64>> = None;
    let mut last_residual_norm = f64::INFINITY;
    let groups = problem.variable_groups();
    let tol = problem.tolerances();

    for iteration in 0..opts.iter {
        let x_old = problem.iterate();

        let system = problem.assemble()?;
        last_residual_norm = system.residual_norm();
        let dx = system.solve_step()?;

        let x_new: Vec<f64> = x_old
            .iter()
            .zip(dx.iter())
            .map(|(x, d)| x + alpha * d)
            .collect();
        let errs: Vec<f64> = groups
            .iter()
            .map(|range| mean_l2_diff(&x_new[range.clone()], &x_old[range.clone()]))
            .collect();

        let damped = match opts.nonlinear_method {
            NonlinearMethod::Constant => false,
            NonlinearMethod::Automatic => match &prev_errs {
                None => false,
                Some(prev) => {
                    let all_grew = errs.iter().zip(prev.iter()).all(|(e, p)| e > p);
                    if all_grew {
                        alpha = (alpha / 2.0).max(MIN_ALPHA);
                        true
                    } else {
                        let any_shrank = errs.iter().zip(prev.iter()).any(|(e, p)| e < p);
                        if any_shrank {
                            alpha = (alpha * 10.0).min(1.0);
                        }
                        false
                    }
                }
            },
        };

        if damped {
            // Bit-for-bit rollback: the PIT was never mutated with `x_new`,
            // so the previous iterate is already in place. Retry with the
            // reduced alpha next loop turn.
            continue;
        }

        problem.set_iterate(&x_new);
        prev_errs = Some(errs.clone());

        let converged = errs.iter().zip(tol.iter()).all(|(e, t)| *e <= *t)
            && last_residual_norm <= opts.tol_res;
        if converged {
            return Ok(NewtonResult {
                iterations: iteration + 1,
                residual_norm: last_residual_norm,
            });
        }
    }

    Err(SolveError::NotConverged {
        iterations: opts.iter,
        residual_norm: last_residual_norm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::AssembledSystem;
    use faer::Mat;

    /// 1-D Newton problem solving `x^2 - target = 0`, decoupled from the
    /// PIT machinery so the damping rule can be tested in isolation.
    struct SquareRoot {
        x: f64,
        target: f64,
    }

    impl NewtonProblem for SquareRoot {
        fn iterate(&self) -> Vec<f64> {
            vec![self.x]
        }

        fn set_iterate(&mut self, x: &[f64]) {
            self.x = x[0];
        }

        fn assemble(&mut self) -> SolveResult<AssembledSystem> {
            let residual = self.x * self.x - self.target;
            let mut jac: Mat<f64> = Mat::zeros(1, 1);
            jac.write(0, 0, 2.0 * self.x);
            Ok(AssembledSystem {
                jacobian: jac,
                rhs: vec![-residual],
                n_nodes: 1,
                n_branches: 0,
            })
        }

        fn variable_groups(&self) -> Vec<Range<usize>> {
            vec![0..1]
        }

        fn tolerances(&self) -> Vec<f64> {
            vec![1e-9]
        }
    }

    #[test]
    fn converges_to_square_root() {
        let mut problem = SquareRoot { x: 1.0, target: 4.0 };
        let opts = SolveOptions {
            iter: 50,
            tol_res: 1e-10,
            ..SolveOptions::default()
        };
        let result = solve(&mut problem, &opts).unwrap();
        assert!((problem.x - 2.0).abs() < 1e-6);
        assert!(result.iterations < 50);
    }

    #[test]
    fn reports_not_converged_within_iter_budget() {
        let mut problem = SquareRoot { x: 1.0, target: 4.0 };
        let opts = SolveOptions {
            iter: 1,
            tol_res: 1e-15,
            ..SolveOptions::default()
        };
        let err = solve(&mut problem, &opts).unwrap_err();
        assert!(matches!(err, SolveError::NotConverged { iterations: 1, .. }));
    }

    #[test]
    fn constant_method_never_adjusts_alpha() {
        let mut problem = SquareRoot { x: 1.0, target: 4.0 };
        let opts = SolveOptions {
            iter: 50,
            tol_res: 1e-10,
            nonlinear_method: NonlinearMethod::Constant,
            ..SolveOptions::default()
        };
        let result = solve(&mut problem, &opts).unwrap();
        assert!((problem.x - 2.0).abs() < 1e-6);
        assert!(result.iterations >= 1);
    }
}
