//! trilateration: robust non-linear least squares against ranging
//! peers. No `scipy.optimize.least_squares` equivalent is in the dependency
//! stack, so this is a small hand-rolled Gauss-Newton solver with box
//! constraints — the problem is low-dimensional (2 or 3 unknowns) and the
//! residual count is small, so a from-scratch solver is cheap enough and
//! keeps the numeric behavior auditable.

const ITERATIONS: usize = 50;
const STEP_EPSILON: f64 = 1e-3;

#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    pub xyz: (f64, f64, f64),
    pub range: f64,
}

/// Residuals under 3 m are scaled down, larger ones pass through linearly,
/// so a single bad range doesn't dominate the fit.
fn robust_cost(residual: f64) -> f64 {
    if residual.abs() < 3.0 {
        residual / 3.0 + 2.0 * residual.signum()
    } else {
        residual
    }
}

fn residuals(guess: &[f64], anchors: &[Anchor], dims: usize) -> Vec<f64> {
    anchors
        .iter()
        .map(|anchor| {
            let (ax, ay, az) = anchor.xyz;
            let dx = guess[0] - ax;
            let dy = guess[1] - ay;
            let dist = if dims == 3 {
                let dz = guess[2] - az;
                (dx * dx + dy * dy + dz * dz).sqrt()
            } else {
                (dx * dx + dy * dy).sqrt()
            };
            robust_cost(dist - anchor.range)
    })
        .collect()
}

/// Numeric Jacobian of `residuals` via central differences.
fn jacobian(guess: &[f64], anchors: &[Anchor], dims: usize) -> Vec<Vec<f64>> {
    let h = 1e-3;
    let base = residuals(guess, anchors, dims);
    let mut columns = Vec::with_capacity(dims);
    for d in 0..dims {
        let mut plus = guess.to_vec();
        plus[d] += h;
        let r_plus = residuals(&plus, anchors, dims);
        columns.push(
            r_plus.iter().zip(&base).map(|(p, b)| (p - b) / h).collect::<Vec<f64>>(),
        );
    }
    columns
}

fn clamp(guess: &mut [f64], lower: &[f64], upper: &[f64]) {
    for i in 0..guess.len() {
        guess[i] = guess[i].clamp(lower[i], upper[i]);
    }
}

/// Solves for the position minimizing the robust least-squares cost,
/// starting from `initial_guess` and staying within `[lower, upper]`.
pub fn solve(anchors: &[Anchor], dims: usize, initial_guess: &[f64], lower: &[f64], upper: &[f64]) -> Vec<f64> {
    let mut guess = initial_guess.to_vec();

    for _ in 0..ITERATIONS {
        let jac = jacobian(&guess, anchors, dims);
        let res = residuals(&guess, anchors, dims);

        // Normal equations J^T J step = -J^T r, solved for a `dims`-sized
        // (2 or 3) system directly rather than pulling in a linear-algebra
        // crate for a problem this small.
        let mut jtj = vec![vec![0.0; dims]; dims];
        let mut jtr = vec![0.0; dims];
        for a in 0..dims {
            for b in 0..dims {
                jtj[a][b] = jac[a].iter().zip(&jac[b]).map(|(x, y)| x * y).sum::<f64>();
            }
            jtr[a] = jac[a].iter().zip(&res).map(|(x, r)| x * r).sum::<f64>();
        }
        // Levenberg-Marquardt damping keeps the step well-conditioned even
        // when anchors are near-collinear.
        for a in 0..dims {
            jtj[a][a] += 1e-6 * jtj[a][a].max(1.0);
        }

        let Some(step) = solve_linear_system(&jtj, &jtr) else { break };
        let mut candidate = guess.clone();
        for i in 0..dims {
            candidate[i] -= step[i];
        }
        clamp(&mut candidate, lower, upper);

        let delta: f64 = candidate.iter().zip(&guess).map(|(a, b)| (a - b).abs()).sum();
        guess = candidate;
        if delta < STEP_EPSILON {
            break;
        }
    }
    guess
}

/// Gaussian elimination with partial pivoting for a small dense system.
fn solve_linear_system(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut m: Vec<Vec<f64>> = a.iter().cloned().collect();
    let mut rhs = b.to_vec();

    for col in 0..n {
        let pivot = (col..n).max_by(|&r1, &r2| m[r1][col].abs().total_cmp(&m[r2][col].abs()))?;
        if m[pivot][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);
        for row in (col + 1)..n {
            let factor = m[row][col] / m[col][col];
            for k in col..n {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let sum: f64 = (row + 1..n).map(|k| m[row][k] * x[k]).sum();
        x[row] = (rhs[row] - sum) / m[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_2d_anchors_on_a_square_recover_the_center() {
        let anchors = vec![
            Anchor { xyz: (0.0, 0.0, 0.0), range: (5000f64).sqrt() },
            Anchor { xyz: (100.0, 0.0, 0.0), range: (5000f64).sqrt() },
            Anchor { xyz: (0.0, 100.0, 0.0), range: (5000f64).sqrt() },
        ];
        let result = solve(&anchors, 2, &[50.0, 50.0], &[-200.0, -200.0], &[300.0, 300.0]);
        assert!((result[0] - 50.0).abs() < 2.0, "x={}", result[0]);
        assert!((result[1] - 50.0).abs() < 2.0, "y={}", result[1]);
    }

    #[test]
    fn solve_respects_bounds() {
        let anchors = vec![
            Anchor { xyz: (0.0, 0.0, 0.0), range: 1.0 },
            Anchor { xyz: (1.0, 0.0, 0.0), range: 1.0 },
            Anchor { xyz: (0.0, 1.0, 0.0), range: 1.0 },
        ];
        let result = solve(&anchors, 2, &[0.5, 0.5], &[-1.0, -1.0], &[1.0, 1.0]);
        assert!(result[0] >= -1.0 && result[0] <= 1.0);
        assert!(result[1] >= -1.0 && result[1] <= 1.0);
    }
}
