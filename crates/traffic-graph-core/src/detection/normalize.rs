//! Column-wise standardization of the embedding matrix.
//!
//! Each dimension is standardized independently against the batch's own
//! mean and standard deviation (no external reference distribution):
//! `x' = (x - mean) / stddev`.

use ndarray::{Array2, Axis};

/// Standardize every column of `matrix` to zero mean and unit variance.
///
/// Uses the population standard deviation (ddof = 0), matching the
/// upstream scaler the embeddings were tuned against. A zero-variance
/// column substitutes a stddev of 1, leaving it constant zero after
/// centering rather than dividing by zero.
pub fn standardize(matrix: &Array2<f64>) -> Array2<f64> {
    let n = matrix.nrows();
    if n == 0 {
        return matrix.clone();
    }

    let mut out = matrix.clone();
    for mut column in out.axis_iter_mut(Axis(1)) {
        let mean = column.sum() / n as f64;
        let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let stddev = if variance > 0.0 { variance.sqrt() } else { 1.0 };
        column.mapv_inplace(|v| (v - mean) / stddev);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const EPS: f64 = 1e-10;

    #[test]
    fn test_standardized_columns_have_zero_mean_unit_variance() {
        let matrix = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let scaled = standardize(&matrix);

        for column in scaled.axis_iter(Axis(1)) {
            let n = column.len() as f64;
            let mean = column.sum() / n;
            let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < EPS, "mean was {mean}");
            assert!((variance - 1.0).abs() < EPS, "variance was {variance}");
        }
    }

    #[test]
    fn test_zero_variance_column_becomes_constant_zero() {
        let matrix = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let scaled = standardize(&matrix);

        for v in scaled.column(0) {
            assert!(v.abs() < EPS, "constant column should center to zero, got {v}");
        }
        // The varying column is still standardized normally.
        assert!(scaled.column(1).iter().any(|v| v.abs() > EPS));
    }

    #[test]
    fn test_single_row_is_centered_not_divided() {
        let matrix = array![[3.0, -7.0]];
        let scaled = standardize(&matrix);
        assert!(scaled.iter().all(|v| v.abs() < EPS));
    }

    #[test]
    fn test_preserves_shape() {
        let matrix = Array2::<f64>::zeros((6, 4));
        let scaled = standardize(&matrix);
        assert_eq!(scaled.dim(), (6, 4));
    }
}
