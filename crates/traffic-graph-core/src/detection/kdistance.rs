//! k-distance density profiling.
//!
//! For every projected point, the distance to its k-th nearest neighbor
//! (the point itself counts as the first) is a proxy for local density.
//! Sorted ascending, these distances form the density profile curve the
//! epsilon selector reads its knee from.
//!
//! k is always the clustering `min_samples` — the two parameters must
//! stay coupled, so callers pass a single value for both.

use ndarray::Array2;

use super::error::{DetectionError, DetectionResult};

/// Compute the sorted k-distance profile of the N×2 projection.
///
/// The neighbor count includes the point itself, so `k = 2` measures the
/// distance to the nearest *other* point and a batch of exactly two
/// points is well-defined.
///
/// # Errors
///
/// - `DataUnavailable` when the projection is empty.
/// - `InsufficientData` when N < k.
pub fn density_profile(coords: &Array2<f64>, k: usize) -> DetectionResult<Vec<f64>> {
    let n = coords.nrows();
    if n == 0 {
        return Err(DetectionError::DataUnavailable);
    }
    if n < k {
        return Err(DetectionError::InsufficientData {
            required: k,
            actual: n,
        });
    }

    let mut profile = Vec::with_capacity(n);
    let mut distances = Vec::with_capacity(n);
    for i in 0..n {
        distances.clear();
        for j in 0..n {
            distances.push(euclidean(coords, i, j));
        }
        // Index 0 is the self-distance (0.0); index k-1 is the k-th
        // neighbor under the self-inclusive convention.
        distances.sort_by(|a, b| a.total_cmp(b));
        profile.push(distances[k - 1]);
    }

    profile.sort_by(|a, b| a.total_cmp(b));
    Ok(profile)
}

#[inline]
fn euclidean(coords: &Array2<f64>, i: usize, j: usize) -> f64 {
    let dx = coords[(i, 0)] - coords[(j, 0)];
    let dy = coords[(i, 1)] - coords[(j, 1)];
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_profile_length_equals_batch_size() {
        let coords = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let profile = density_profile(&coords, 2).unwrap();
        assert_eq!(profile.len(), 4);
    }

    #[test]
    fn test_profile_is_non_decreasing() {
        let coords = array![[0.0, 0.0], [0.5, 0.5], [4.0, 1.0], [9.0, 9.0], [0.2, 0.1]];
        let profile = density_profile(&coords, 2).unwrap();
        for pair in profile.windows(2) {
            assert!(pair[0] <= pair[1], "profile must be sorted ascending");
        }
    }

    #[test]
    fn test_known_nearest_neighbor_distances() {
        // Points on a line at 0, 1, 3: nearest-other distances are 1, 1, 2.
        let coords = array![[0.0, 0.0], [1.0, 0.0], [3.0, 0.0]];
        let profile = density_profile(&coords, 2).unwrap();
        assert_eq!(profile, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_batch_of_exactly_two_points_works() {
        let coords = array![[0.0, 0.0], [3.0, 4.0]];
        let profile = density_profile(&coords, 2).unwrap();
        assert_eq!(profile, vec![5.0, 5.0]);
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let coords = array![[0.0, 0.0]];
        match density_profile(&coords, 2) {
            Err(DetectionError::InsufficientData { required, actual }) => {
                assert_eq!(required, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_batch_is_data_unavailable() {
        let coords = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            density_profile(&coords, 2),
            Err(DetectionError::DataUnavailable)
        ));
    }

    #[test]
    fn test_identical_points_yield_zero_profile() {
        let coords = Array2::<f64>::zeros((10, 2));
        let profile = density_profile(&coords, 2).unwrap();
        assert!(profile.iter().all(|d| *d == 0.0));
    }
}
