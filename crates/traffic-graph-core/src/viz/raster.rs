//! Raster artifacts via plotters' bitmap backend.
//!
//! Three PNGs per run, written to the configured output directory and
//! overwritten each time (not versioned): the size-over-port input
//! distribution, the sorted k-distance curve, and the PCA/DBSCAN
//! scatter with outliers highlighted and annotated.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use super::{FinderRenderer, FinderScene, VizError};
use crate::detection::dbscan::NOISE_LABEL;

/// Artifact dimensions, matched to the terminal views' aspect ratios.
const SCATTER_SIZE: (u32, u32) = (800, 700);
const CURVE_SIZE: (u32, u32) = (640, 300);
const DISTRIBUTION_SIZE: (u32, u32) = (640, 480);

/// PNG renderer writing to a fixed output directory.
#[derive(Debug, Clone)]
pub struct RasterRenderer {
    output_dir: PathBuf,
}

impl RasterRenderer {
    /// File name of the size-over-port distribution plot.
    pub const PORT_SIZE_FILE: &'static str = "size_over_port.png";
    /// File name of the sorted k-distance curve plot.
    pub const PROFILE_FILE: &'static str = "sorted_k_distance.png";
    /// File name of the PCA/DBSCAN outlier scatter.
    pub const PROJECTION_FILE: &'static str = "pca_dbscan_outliers.png";

    /// Create a renderer targeting `output_dir`. The directory is
    /// created on first render if missing.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory the artifacts land in.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    fn render_port_size(&self, scene: &FinderScene<'_>) -> Result<(), VizError> {
        let path = self.artifact_path(Self::PORT_SIZE_FILE);
        let root = BitMapBackend::new(&path, DISTRIBUTION_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(to_viz_error)?;

        let points: Vec<(f64, f64)> = scene
            .records
            .iter()
            .map(|r| (r.attributes.total_size as f64, f64::from(r.id.port)))
            .collect();
        let (x_range, y_range) = ranges(points.iter().copied());

        let mut chart = ChartBuilder::on(&root)
            .caption("Packet Size over Ports", ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(36)
            .y_label_area_size(56)
            .build_cartesian_2d(x_range, y_range)
            .map_err(to_viz_error)?;
        chart
            .configure_mesh()
            .x_desc("SIZE")
            .y_desc("PORT")
            .draw()
            .map_err(to_viz_error)?;

        chart
            .draw_series(
                points
                    .iter()
                    .map(|(x, y)| TriangleMarker::new((*x, *y), 5, BLUE.mix(0.4))),
            )
            .map_err(to_viz_error)?;

        root.present().map_err(to_viz_error)
    }

    fn render_profile(&self, scene: &FinderScene<'_>) -> Result<(), VizError> {
        let path = self.artifact_path(Self::PROFILE_FILE);
        let root = BitMapBackend::new(&path, CURVE_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(to_viz_error)?;

        let points: Vec<(f64, f64)> = scene
            .profile
            .iter()
            .enumerate()
            .map(|(i, d)| (i as f64, *d))
            .collect();
        let (x_range, y_range) = ranges(points.iter().copied());

        let mut chart = ChartBuilder::on(&root)
            .caption("Sorted K-Distance", ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(36)
            .y_label_area_size(56)
            .build_cartesian_2d(x_range, y_range)
            .map_err(to_viz_error)?;
        chart
            .configure_mesh()
            .x_desc("INDEX")
            .y_desc("K-DISTANCE")
            .draw()
            .map_err(to_viz_error)?;

        chart
            .draw_series(LineSeries::new(points.iter().copied(), &GREEN))
            .map_err(to_viz_error)?;
        chart
            .draw_series(
                points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 2, GREEN.filled())),
            )
            .map_err(to_viz_error)?;

        root.present().map_err(to_viz_error)
    }

    fn render_projection(&self, scene: &FinderScene<'_>) -> Result<(), VizError> {
        let path = self.artifact_path(Self::PROJECTION_FILE);
        let root = BitMapBackend::new(&path, SCATTER_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(to_viz_error)?;

        let all: Vec<(f64, f64)> = (0..scene.coords.nrows())
            .map(|i| (scene.coords[(i, 0)], scene.coords[(i, 1)]))
            .collect();
        let (x_range, y_range) = ranges(all.iter().copied());

        let caption = format!(
            "PCA/DBSCAN Outliers from Embeddings | eps: {:.4}",
            scene.epsilon
        );
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(36)
            .y_label_area_size(56)
            .build_cartesian_2d(x_range, y_range)
            .map_err(to_viz_error)?;
        chart.configure_mesh().draw().map_err(to_viz_error)?;

        chart
            .draw_series(
                scene
                    .clustered_indices()
                    .into_iter()
                    .map(|i| TriangleMarker::new(all[i], 6, BLUE.mix(0.4))),
            )
            .map_err(to_viz_error)?;
        chart
            .draw_series(
                scene
                    .outlier_indices()
                    .into_iter()
                    .map(|i| Circle::new(all[i], 6, RED.filled())),
            )
            .map_err(to_viz_error)?
            .label("Outliers")
            .legend(|(x, y)| Circle::new((x, y), 4, RED.filled()));

        // Annotate every point with its attributes; outliers darker.
        chart
            .draw_series(scene.records.iter().enumerate().map(|(i, record)| {
                let opacity = if scene.labels[i] == NOISE_LABEL {
                    0.9
                } else {
                    0.4
                };
                Text::new(
                    record.attributes.annotation(&record.id),
                    all[i],
                    ("sans-serif", 10)
                        .into_font()
                        .color(&BLACK.mix(opacity)),
                )
            }))
            .map_err(to_viz_error)?;

        chart
            .configure_series_labels()
            .border_style(BLACK.mix(0.3))
            .draw()
            .map_err(to_viz_error)?;

        root.present().map_err(to_viz_error)
    }
}

impl FinderRenderer for RasterRenderer {
    fn render(&self, scene: &FinderScene<'_>) -> Result<(), VizError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| VizError::RenderFailed(format!("create output dir: {e}")))?;

        self.render_port_size(scene)?;
        self.render_profile(scene)?;
        self.render_projection(scene)
    }
}

fn to_viz_error<E: std::fmt::Display>(e: E) -> VizError {
    VizError::RenderFailed(e.to_string())
}

/// Plot ranges with padding; degenerate extents widen to a unit span so
/// chart construction never sees an empty range.
fn ranges(
    points: impl Iterator<Item = (f64, f64)>,
) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    let mut any = false;
    for (x, y) in points {
        any = true;
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !any {
        return (0.0..1.0, 0.0..1.0);
    }
    (pad(x_min, x_max), pad(y_min, y_max))
}

fn pad(min: f64, max: f64) -> std::ops::Range<f64> {
    if min >= max {
        (min - 0.5)..(min + 0.5)
    } else {
        let margin = (max - min) * 0.05;
        (min - margin)..(max + margin)
    }
}
