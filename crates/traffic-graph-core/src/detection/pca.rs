//! Principal component analysis, fixed at two components.
//!
//! Projects the standardized embedding matrix onto its top-2 principal
//! components so that Euclidean density clustering and 2-D plotting are
//! both meaningful and fast.
//!
//! The eigenvectors are found by power iteration with deflation over the
//! scatter matrix, switching to the Gram matrix when the batch has fewer
//! points than dimensions (the common case: small batches of wide
//! embeddings). No randomized initialization: the start vector is derived
//! from the matrix diagonal, so the projection is deterministic for a
//! fixed input.

use ndarray::{Array1, Array2, Axis};

const MAX_ITERATIONS: usize = 500;
const CONVERGENCE_TOL: f64 = 1e-12;
const ZERO_TOL: f64 = 1e-12;

/// Project `x` (N×d) onto its top-2 principal components, returning N×2.
///
/// Degenerate inputs are handled without error:
/// - a zero-variance batch (all identical points) projects every point
///   to the origin;
/// - d == 1 uses the single centered column as the first component and
///   pads the second with zeros.
pub fn project_2d(x: &Array2<f64>) -> Array2<f64> {
    let (n, d) = x.dim();
    let mut coords = Array2::<f64>::zeros((n, 2));
    if n == 0 || d == 0 {
        return coords;
    }

    let centered = center_columns(x);

    if d == 1 {
        coords.column_mut(0).assign(&centered.column(0));
        return coords;
    }

    if d <= n {
        // Scatter matrix route: d×d eigenproblem.
        let scatter = centered.t().dot(&centered);
        let (v1, lambda1) = dominant_eigenvector(&scatter);
        let deflated = &scatter - &outer(&v1, &v1).mapv(|v| v * lambda1);
        let (v2, _) = dominant_eigenvector(&deflated);

        coords.column_mut(0).assign(&centered.dot(&v1));
        coords.column_mut(1).assign(&centered.dot(&v2));
    } else {
        // Gram matrix route: n×n eigenproblem, then map left singular
        // vectors back through the data to get component scores.
        let gram = centered.dot(&centered.t());
        let (u1, lambda1) = dominant_eigenvector(&gram);
        let deflated = &gram - &outer(&u1, &u1).mapv(|v| v * lambda1);
        let (u2, _) = dominant_eigenvector(&deflated);

        coords.column_mut(0).assign(&component_scores(&centered, &u1));
        coords.column_mut(1).assign(&component_scores(&centered, &u2));
    }

    coords
}

/// Subtract each column's mean.
fn center_columns(x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows() as f64;
    let mut centered = x.clone();
    for mut column in centered.axis_iter_mut(Axis(1)) {
        let mean = column.sum() / n;
        column.mapv_inplace(|v| v - mean);
    }
    centered
}

/// Outer product a·bᵀ.
fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    let col = a.view().insert_axis(Axis(1));
    let row = b.view().insert_axis(Axis(0));
    col.dot(&row)
}

/// Scores of one component via the Gram route: v = Xᵀu / ‖Xᵀu‖, score = X·v.
fn component_scores(centered: &Array2<f64>, u: &Array1<f64>) -> Array1<f64> {
    let direction = centered.t().dot(u);
    let norm = direction.dot(&direction).sqrt();
    if norm < ZERO_TOL {
        return Array1::zeros(centered.nrows());
    }
    centered.dot(&direction.mapv(|v| v / norm))
}

/// Dominant eigenpair of a symmetric positive semi-definite matrix.
///
/// Returns a zero vector and eigenvalue 0 when the matrix is numerically
/// zero. The eigenvector's sign is fixed so its largest-magnitude
/// component is positive, keeping the projection reproducible run to run.
fn dominant_eigenvector(a: &Array2<f64>) -> (Array1<f64>, f64) {
    let m = a.nrows();
    let frobenius = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    if frobenius < ZERO_TOL {
        return (Array1::zeros(m), 0.0);
    }

    let mut x = initial_vector(a);
    for _ in 0..MAX_ITERATIONS {
        let w = a.dot(&x);
        let norm = w.dot(&w).sqrt();
        if norm < ZERO_TOL {
            // The start vector sat in the null space; perturb once with
            // a uniform vector and continue.
            x = Array1::from_elem(m, 1.0 / (m as f64).sqrt());
            continue;
        }
        let next = w.mapv(|v| v / norm);
        let delta = (&next - &x).mapv(f64::abs).sum();
        let delta_flipped = (&next + &x).mapv(f64::abs).sum();
        x = next;
        if delta < CONVERGENCE_TOL || delta_flipped < CONVERGENCE_TOL {
            break;
        }
    }

    let eigenvalue = x.dot(&a.dot(&x));
    (fix_sign(x), eigenvalue.max(0.0))
}

/// Deterministic start vector: the unit basis vector at the largest
/// diagonal entry, or a uniform vector when the diagonal is flat zero.
fn initial_vector(a: &Array2<f64>) -> Array1<f64> {
    let m = a.nrows();
    let mut best = 0usize;
    let mut best_value = f64::NEG_INFINITY;
    for i in 0..m {
        if a[(i, i)] > best_value {
            best_value = a[(i, i)];
            best = i;
        }
    }

    if best_value > ZERO_TOL {
        let mut e = Array1::zeros(m);
        e[best] = 1.0;
        e
    } else {
        Array1::from_elem(m, 1.0 / (m as f64).sqrt())
    }
}

/// Negate the vector if its largest-magnitude component is negative.
fn fix_sign(v: Array1<f64>) -> Array1<f64> {
    let mut pivot = 0.0f64;
    for &value in v.iter() {
        if value.abs() > pivot.abs() {
            pivot = value;
        }
    }
    if pivot < 0.0 {
        v.mapv(|x| -x)
    } else {
        v
    }
}
