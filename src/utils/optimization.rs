//! Nelder-Mead simplex minimization for smoothing-parameter estimation.

/// Result of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point.
    pub optimal_value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the simplex converged within tolerance.
    pub converged: bool,
}

/// Configuration for Nelder-Mead.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the objective spread.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step size.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Minimize `objective` starting from `initial`, keeping every vertex inside
/// the optional per-dimension `bounds`.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    // Initial simplex: the starting point plus one perturbed vertex per axis.
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(apply_bounds(initial, bounds));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        simplex.push(apply_bounds(&vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if values[worst] - values[best] < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_excluding(&simplex, worst);

        // Reflection.
        let reflected = blend(&centroid, &simplex[worst], 1.0 + config.alpha, -config.alpha);
        let reflected = apply_bounds(&reflected, bounds);
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            // Expansion.
            let expanded = blend(&centroid, &reflected, 1.0 - config.gamma, config.gamma);
            let expanded = apply_bounds(&expanded, bounds);
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        // Contraction, outside or inside depending on the reflected value.
        let toward = if reflected_value < values[worst] {
            &reflected
        } else {
            &simplex[worst]
        };
        let contracted = blend(&centroid, toward, 1.0 - config.rho, config.rho);
        let contracted = apply_bounds(&contracted, bounds);
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink toward the best vertex.
        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                for j in 0..n {
                    simplex[i][j] = anchor[j] + config.sigma * (simplex[i][j] - anchor[j]);
                }
                simplex[i] = apply_bounds(&simplex[i], bounds);
                values[i] = objective(&simplex[i]);
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}

/// `a * wa + b * wb`, element-wise.
fn blend(a: &[f64], b: &[f64], wa: f64, wb: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| wa * x + wb * y).collect()
}

fn centroid_excluding(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];
    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude {
            for j in 0..n {
                centroid[j] += vertex[j];
            }
        }
    }
    for c in &mut centroid {
        *c /= count;
    }
    centroid
}

fn apply_bounds(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        Some(bounds) => point
            .iter()
            .zip(bounds)
            .map(|(&v, &(lo, hi))| v.clamp(lo, hi))
            .collect(),
        None => point.to_vec(),
    }
}
