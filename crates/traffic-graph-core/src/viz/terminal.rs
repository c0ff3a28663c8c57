//! Character-grid rendering for non-graphical terminals.
//!
//! Reduced-fidelity equivalents of the raster artifacts, built from the
//! same coordinates. Each view is returned as a `String` so the grids
//! are testable without capturing stdout.

use super::{FinderRenderer, FinderScene, VizError};
use crate::detection::dbscan::NOISE_LABEL;

/// Marker for clustered points.
const CLUSTER_MARKER: char = '^';
/// Marker for outlier points.
const OUTLIER_MARKER: char = 'o';

/// Terminal scatter renderer with a fixed character-grid size.
#[derive(Debug, Clone, Copy)]
pub struct TerminalRenderer {
    /// Grid width in characters.
    pub width: usize,
    /// Grid height in characters.
    pub height: usize,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self {
            width: 80,
            height: 20,
        }
    }
}

impl TerminalRenderer {
    /// Create a renderer with an explicit grid size. Values below 2 are
    /// raised to 2 so a grid always has two distinct cells per axis.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(2),
            height: height.max(2),
        }
    }

    /// Size-over-port view of the fetched batch (input QA, independent
    /// of clustering).
    pub fn port_size_view(&self, scene: &FinderScene<'_>) -> String {
        let points: Vec<(f64, f64, char)> = scene
            .records
            .iter()
            .map(|r| {
                (
                    r.attributes.total_size as f64,
                    f64::from(r.id.port),
                    CLUSTER_MARKER,
                )
            })
            .collect();
        self.grid("SIZE", "PORT", &points)
    }

    /// Sorted k-distance curve.
    pub fn profile_view(&self, scene: &FinderScene<'_>) -> String {
        let points: Vec<(f64, f64, char)> = scene
            .profile
            .iter()
            .enumerate()
            .map(|(i, d)| (i as f64, *d, OUTLIER_MARKER))
            .collect();
        self.grid("INDEX", "K-DISTANCE", &points)
    }

    /// PCA/DBSCAN scatter: clusters and outliers with distinct markers,
    /// followed by the annotation line of every outlier.
    pub fn projection_view(&self, scene: &FinderScene<'_>) -> String {
        let points: Vec<(f64, f64, char)> = scene
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let marker = if *label == NOISE_LABEL {
                    OUTLIER_MARKER
                } else {
                    CLUSTER_MARKER
                };
                (scene.coords[(i, 0)], scene.coords[(i, 1)], marker)
            })
            .collect();

        let mut out = self.grid("PC1", "PC2", &points);
        for index in scene.outlier_indices() {
            let record = &scene.records[index];
            out.push_str(&format!(
                "  [OUTLIER] {}\n",
                record.attributes.annotation(&record.id)
            ));
        }
        out
    }

    /// Plot points onto a bordered character grid.
    fn grid(&self, x_label: &str, y_label: &str, points: &[(f64, f64, char)]) -> String {
        let mut cells = vec![vec![' '; self.width]; self.height];

        if !points.is_empty() {
            let (x_min, x_max) = axis_bounds(points.iter().map(|p| p.0));
            let (y_min, y_max) = axis_bounds(points.iter().map(|p| p.1));

            for (x, y, marker) in points {
                let col = scale(*x, x_min, x_max, self.width - 1);
                let row = scale(*y, y_min, y_max, self.height - 1);
                // Row 0 is the top of the grid; larger y plots higher.
                cells[self.height - 1 - row][col] = *marker;
            }
        }

        let mut out = String::with_capacity((self.width + 4) * (self.height + 3));
        out.push_str(&format!("{y_label}\n"));
        for row in &cells {
            out.push('|');
            out.extend(row.iter());
            out.push('\n');
        }
        out.push('+');
        out.extend(std::iter::repeat('-').take(self.width));
        out.push_str(&format!("\n {x_label}\n"));
        out
    }
}

impl FinderRenderer for TerminalRenderer {
    fn render(&self, scene: &FinderScene<'_>) -> Result<(), VizError> {
        println!("{}", self.port_size_view(scene));
        println!("{}", self.profile_view(scene));
        println!("{}", self.projection_view(scene));
        Ok(())
    }
}

/// Min/max of an axis, padded when every value coincides so scaling
/// never divides by zero.
fn axis_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min >= max {
        (min - 0.5, min + 0.5)
    } else {
        (min, max)
    }
}

/// Map a value into a cell index in 0..=last.
fn scale(value: f64, min: f64, max: f64, last: usize) -> usize {
    let t = (value - min) / (max - min);
    ((t * last as f64).round() as usize).min(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EndpointAttributes, EndpointId, EndpointRecord};
    use ndarray::array;

    fn scene_fixture() -> (Vec<EndpointRecord>, ndarray::Array2<f64>, Vec<i32>, Vec<f64>) {
        let mut outlier = EndpointRecord::new(
            EndpointId::new("203.0.113.9", 4444),
            vec![0.0],
            EndpointAttributes::default(),
        );
        outlier.attributes.organization = Some("Shady Hosting".to_string());
        outlier.attributes.total_size = 999_999;

        let records = vec![
            EndpointRecord::new(
                EndpointId::new("10.0.0.1", 443),
                vec![0.0],
                EndpointAttributes::default(),
            ),
            EndpointRecord::new(
                EndpointId::new("10.0.0.2", 443),
                vec![0.0],
                EndpointAttributes::default(),
            ),
            outlier,
        ];
        let coords = array![[0.0, 0.0], [1.0, 0.5], [40.0, 40.0]];
        let labels = vec![0, 0, NOISE_LABEL];
        let profile = vec![1.1, 1.1, 55.0];
        (records, coords, labels, profile)
    }

    #[test]
    fn test_grid_has_configured_dimensions() {
        let (records, coords, labels, profile) = scene_fixture();
        let scene = FinderScene {
            records: &records,
            coords: &coords,
            labels: &labels,
            profile: &profile,
            epsilon: 1.1,
        };

        let renderer = TerminalRenderer::new(40, 10);
        let view = renderer.profile_view(&scene);
        let grid_rows: Vec<&str> = view
            .lines()
            .filter(|line| line.starts_with('|'))
            .collect();
        assert_eq!(grid_rows.len(), 10);
        for row in grid_rows {
            assert_eq!(row.chars().count(), 41); // border + width cells
        }
    }

    #[test]
    fn test_projection_view_uses_distinct_markers() {
        let (records, coords, labels, profile) = scene_fixture();
        let scene = FinderScene {
            records: &records,
            coords: &coords,
            labels: &labels,
            profile: &profile,
            epsilon: 1.1,
        };

        let view = TerminalRenderer::default().projection_view(&scene);
        assert!(view.contains(CLUSTER_MARKER));
        assert!(view.contains(OUTLIER_MARKER));
    }

    #[test]
    fn test_projection_view_annotates_outliers() {
        let (records, coords, labels, profile) = scene_fixture();
        let scene = FinderScene {
            records: &records,
            coords: &coords,
            labels: &labels,
            profile: &profile,
            epsilon: 1.1,
        };

        let view = TerminalRenderer::default().projection_view(&scene);
        assert!(view.contains("203.0.113.9:4444"));
        assert!(view.contains("Shady Hosting"));
        assert!(!view.contains("10.0.0.1:443"), "clustered points are not annotated");
    }

    #[test]
    fn test_empty_scene_renders_blank_grid() {
        let records: Vec<EndpointRecord> = vec![];
        let coords = ndarray::Array2::<f64>::zeros((0, 2));
        let labels: Vec<i32> = vec![];
        let profile: Vec<f64> = vec![];
        let scene = FinderScene {
            records: &records,
            coords: &coords,
            labels: &labels,
            profile: &profile,
            epsilon: 0.0,
        };

        let view = TerminalRenderer::new(10, 4).projection_view(&scene);
        assert!(view.lines().filter(|l| l.starts_with('|')).count() == 4);
    }

    #[test]
    fn test_identical_points_do_not_panic() {
        // Degenerate bounds exercise the padded-axis path.
        let (records, _, labels, profile) = scene_fixture();
        let coords = ndarray::Array2::<f64>::zeros((3, 2));
        let scene = FinderScene {
            records: &records,
            coords: &coords,
            labels: &labels,
            profile: &profile,
            epsilon: 0.0,
        };
        let view = TerminalRenderer::default().projection_view(&scene);
        assert!(view.contains(CLUSTER_MARKER) || view.contains(OUTLIER_MARKER));
    }
}
