//! Small dense helpers shared by the linear models.

use ndarray::{Array1, Array2, Axis};

/// Pivots smaller than this (relative to the largest diagonal entry) mark a
/// linearly dependent column.
const RANK_TOL: f64 = 1e-10;

/// Column means of `x`; empty for a matrix without columns, zeros for one
/// without rows.
pub fn column_means(x: &Array2<f64>) -> Array1<f64> {
    x.mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()))
}

/// Population standard deviation per column; constant columns report 1.0 so
/// they can be divided by safely.
pub fn column_scales(x: &Array2<f64>, means: &Array1<f64>) -> Array1<f64> {
    let n = x.nrows().max(1) as f64;
    let mut scales = Array1::zeros(x.ncols());
    for (j, col) in x.axis_iter(Axis(1)).enumerate() {
        let var = col.iter().map(|v| (v - means[j]).powi(2)).sum::<f64>() / n;
        scales[j] = if var > 0.0 { var.sqrt() } else { 1.0 };
    }
    scales
}

/// Solve the symmetric system `a · w = b` with Gauss-Jordan elimination and
/// partial pivoting. Linearly dependent columns get a zero coefficient, so a
/// rank-deficient normal-equation system still yields a least-squares fit.
pub fn solve_symmetric(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut m = a.clone();
    let mut rhs = b.clone();
    let scale = (0..n).map(|i| m[[i, i]].abs()).fold(0.0, f64::max).max(1.0);

    let mut pivot_row_of = vec![None; n];
    let mut rank = 0;

    for col in 0..n {
        let (best, best_abs) = (rank..n)
            .map(|r| (r, m[[r, col]].abs()))
            .fold((rank, -1.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

        if rank >= n || best_abs <= RANK_TOL * scale {
            continue;
        }

        if best != rank {
            for k in 0..n {
                m.swap([best, k], [rank, k]);
            }
            rhs.swap(best, rank);
        }

        let pivot = m[[rank, col]];
        for r in 0..n {
            if r == rank {
                continue;
            }
            let factor = m[[r, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[[r, k]] -= factor * m[[rank, k]];
            }
            rhs[r] -= factor * rhs[rank];
        }

        pivot_row_of[col] = Some(rank);
        rank += 1;
    }

    let mut w = Array1::zeros(n);
    for col in 0..n {
        if let Some(row) = pivot_row_of[col] {
            w[col] = rhs[row] / m[[row, col]];
        }
    }
    w
}
