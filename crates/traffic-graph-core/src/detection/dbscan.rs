//! Density-based clustering over the 2-D projection.
//!
//! DBSCAN semantics: a point is a core point if at least `min_samples`
//! points (itself included) lie within `eps`; clusters are formed by
//! core-point reachability chains; anything not reachable from a core
//! point is noise. Labels are assigned in input order with no randomized
//! initialization, so the result is deterministic for fixed input and
//! parameters.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::error::{DetectionError, DetectionResult};

/// Label reserved for noise points. All other labels are non-negative
/// cluster ids, meaningful only up to equality.
pub const NOISE_LABEL: i32 = -1;

/// Parameters for DBSCAN clustering.
///
/// # Example
///
/// ```
/// use traffic_graph_core::detection::dbscan::DbscanParams;
///
/// let params = DbscanParams::new(0.5, 2);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbscanParams {
    /// Neighborhood radius. Membership is inclusive (`dist <= eps`), so
    /// an epsilon of zero still clusters coincident points.
    pub eps: f64,
    /// Minimum neighborhood size for a core point, itself included.
    pub min_samples: usize,
}

impl DbscanParams {
    /// Create parameters. Values are not clamped; call [`validate`](Self::validate).
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Validate parameters, failing fast with descriptive messages.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::InvalidParameter` if:
    /// - `eps` is negative or non-finite
    /// - `min_samples` < 2
    pub fn validate(&self) -> DetectionResult<()> {
        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(DetectionError::InvalidParameter(format!(
                "eps must be finite and non-negative, got {}",
                self.eps
            )));
        }
        if self.min_samples < 2 {
            return Err(DetectionError::InvalidParameter(format!(
                "min_samples must be >= 2, got {}; a single point is always its own neighborhood",
                self.min_samples
            )));
        }
        Ok(())
    }
}

/// Cluster the N×2 projection, returning one label per point.
///
/// # Errors
///
/// Returns `DetectionError::InvalidParameter` when `params` fail
/// validation.
pub fn cluster(coords: &Array2<f64>, params: &DbscanParams) -> DetectionResult<Vec<i32>> {
    params.validate()?;

    let n = coords.nrows();
    let mut labels = vec![NOISE_LABEL; n];
    let mut visited = vec![false; n];
    let mut next_cluster: i32 = 0;

    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let neighbors = region_query(coords, seed, params.eps);
        if neighbors.len() < params.min_samples {
            continue; // stays noise unless later claimed as a border point
        }

        let cluster_id = next_cluster;
        next_cluster += 1;
        labels[seed] = cluster_id;

        // Expand the cluster through core-point reachability. The frontier
        // is processed in discovery order to keep assignment deterministic.
        let mut frontier = neighbors;
        let mut cursor = 0;
        while cursor < frontier.len() {
            let point = frontier[cursor];
            cursor += 1;

            if labels[point] == NOISE_LABEL {
                labels[point] = cluster_id; // border or core, claimed either way
            }
            if visited[point] {
                continue;
            }
            visited[point] = true;

            let point_neighbors = region_query(coords, point, params.eps);
            if point_neighbors.len() >= params.min_samples {
                // Core point: its neighborhood joins the frontier.
                frontier.extend(point_neighbors);
            }
        }
    }

    Ok(labels)
}

/// Indices of all points within `eps` of `center`, itself included.
fn region_query(coords: &Array2<f64>, center: usize, eps: f64) -> Vec<usize> {
    let n = coords.nrows();
    let cx = coords[(center, 0)];
    let cy = coords[(center, 1)];
    let mut neighbors = Vec::new();
    for i in 0..n {
        let dx = coords[(i, 0)] - cx;
        let dy = coords[(i, 1)] - cy;
        if (dx * dx + dy * dy).sqrt() <= eps {
            neighbors.push(i);
        }
    }
    neighbors
}
