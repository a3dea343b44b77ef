//! Derivative-free minimization (Nelder–Mead simplex).
//!
//! The solver is generic over the cost function and the dimension. It never
//! fails: after `max_iterations` (or once the simplex has collapsed in cost)
//! it returns the best vertex seen, and the caller judges the quality.
//!
//! Coefficients follow the canonical choice:
//! reflection 1.0, expansion 2.0, contraction 0.5, shrink 0.5.

use nalgebra::DVector;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Relative perturbation used to build the initial simplex.
const INIT_SCALE: f64 = 1.05;
/// Absolute offset used when a starting coordinate is (almost) zero.
const INIT_ZERO_OFFSET: f64 = 0.00025;

/// Stop when `|cost(worst) - cost(best)|` falls below this.
pub const COST_SPREAD_TOL: f64 = 1e-6;

/// Iteration cap used by the FOPDT optimizer.
pub const DEFAULT_MAX_ITERATIONS: usize = 200;

/// Result of a minimization run.
#[derive(Debug, Clone)]
pub struct SimplexOutcome {
    pub best: DVector<f64>,
    pub cost: f64,
    pub iterations: usize,
    /// `true` when the cost spread criterion fired before the iteration cap.
    pub converged: bool,
}

#[derive(Debug, Clone)]
struct Vertex {
    x: DVector<f64>,
    cost: f64,
}

/// Minimize `cost` starting from `x0`.
pub fn minimize<F>(cost: F, x0: &DVector<f64>, max_iterations: usize) -> SimplexOutcome
where
    F: Fn(&DVector<f64>) -> f64,
{
    let n = x0.len();
    let eval = |x: DVector<f64>| Vertex { cost: cost(&x), x };

    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(eval(x0.clone()));
    for i in 0..n {
        let mut p = x0.clone();
        if p[i].abs() > 1e-9 {
            p[i] *= INIT_SCALE;
        } else {
            p[i] = INIT_ZERO_OFFSET;
        }
        simplex.push(eval(p));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        sort_by_cost(&mut simplex);
        let best_cost = simplex[0].cost;
        let worst_cost = simplex[n].cost;
        let second_worst_cost = simplex[n.saturating_sub(1)].cost;

        if (worst_cost - best_cost).abs() < COST_SPREAD_TOL {
            converged = true;
            break;
        }
        iterations += 1;

        // Centroid of every vertex except the worst.
        let mut centroid = DVector::<f64>::zeros(n);
        for v in &simplex[..n] {
            centroid += &v.x;
        }
        centroid /= n as f64;

        let worst = simplex[n].x.clone();
        let reflected = eval(&centroid + (&centroid - &worst) * REFLECTION);

        if best_cost <= reflected.cost && reflected.cost < second_worst_cost {
            simplex[n] = reflected;
            continue;
        }

        if reflected.cost < best_cost {
            let expanded = eval(&centroid + (&reflected.x - &centroid) * EXPANSION);
            simplex[n] = if expanded.cost < reflected.cost { expanded } else { reflected };
            continue;
        }

        if reflected.cost < worst_cost {
            // Outside contraction (towards the reflected point).
            let contracted = eval(&centroid + (&reflected.x - &centroid) * CONTRACTION);
            if contracted.cost <= reflected.cost {
                simplex[n] = contracted;
                continue;
            }
        } else {
            // Inside contraction (towards the worst point).
            let contracted = eval(&centroid + (&worst - &centroid) * CONTRACTION);
            if contracted.cost < worst_cost {
                simplex[n] = contracted;
                continue;
            }
        }

        // Shrink everything towards the best vertex.
        let best = simplex[0].x.clone();
        for v in simplex.iter_mut().skip(1) {
            *v = eval(&best + (&v.x - &best) * SHRINK);
        }
    }

    sort_by_cost(&mut simplex);
    let Vertex { x, cost } = simplex.swap_remove(0);
    SimplexOutcome {
        best: x,
        cost,
        iterations,
        converged,
    }
}

fn sort_by_cost(simplex: &mut [Vertex]) {
    simplex.sort_by(|a, b| a.cost.total_cmp(&b.cost));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_shifted_quadratic() {
        let cost = |x: &DVector<f64>| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2) + 2.0;
        let out = minimize(cost, &DVector::from_vec(vec![0.0, 0.0]), 500);
        assert!((out.best[0] - 3.0).abs() < 1e-2, "x0 = {}", out.best[0]);
        assert!((out.best[1] + 1.0).abs() < 1e-2, "x1 = {}", out.best[1]);
        assert!((out.cost - 2.0).abs() < 1e-3);
        assert!(out.converged);
    }

    #[test]
    fn minimizes_rosenbrock_reasonably() {
        let cost = |x: &DVector<f64>| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let start = DVector::from_vec(vec![-1.2, 1.0]);
        let out = minimize(cost, &start, 2000);
        assert!(out.cost < cost(&start));
        assert!(out.cost < 1e-1, "cost = {}", out.cost);
    }

    #[test]
    fn respects_iteration_cap() {
        let cost = |x: &DVector<f64>| x.norm_squared();
        let out = minimize(cost, &DVector::from_vec(vec![10.0, -7.0, 4.0]), 3);
        assert!(out.iterations <= 3);
        assert!(!out.converged);
    }

    #[test]
    fn zero_start_coordinates_get_absolute_offset() {
        // With a zero start the simplex must still move; a multiplicative
        // perturbation would leave every vertex at the origin.
        let cost = |x: &DVector<f64>| (x[0] - 1.0).powi(2);
        let out = minimize(cost, &DVector::from_vec(vec![0.0]), 200);
        assert!((out.best[0] - 1.0).abs() < 1e-2);
    }
}
