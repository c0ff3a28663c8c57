//! Diagnostic views of a finder run.
//!
//! Two renderer implementations sit behind one [`FinderRenderer`]
//! capability, both driven by the same coordinates and labels:
//!
//! - [`RasterRenderer`] writes PNG artifacts (size-over-port
//!   distribution, sorted k-distance curve, PCA/DBSCAN scatter) to a
//!   configured directory, overwriting them each run;
//! - [`TerminalRenderer`] produces the same three views as character
//!   grids for non-graphical terminals.
//!
//! Visualization is best-effort, never load-bearing: the pipeline
//! downgrades any renderer failure to a warning after persistence has
//! already completed.

mod raster;
mod terminal;

pub use raster::RasterRenderer;
pub use terminal::TerminalRenderer;

use ndarray::Array2;
use thiserror::Error;

use crate::detection::dbscan::NOISE_LABEL;
use crate::types::EndpointRecord;

/// Rendering failure. Always recovered at the pipeline boundary.
#[derive(Debug, Error)]
pub enum VizError {
    /// Backend could not produce the artifact (missing output path,
    /// encoder failure, I/O error).
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Everything a renderer needs from one finder run.
#[derive(Debug, Clone, Copy)]
pub struct FinderScene<'a> {
    /// The fetched batch, index-aligned with `coords` and `labels`.
    pub records: &'a [EndpointRecord],
    /// N×2 principal-component projection.
    pub coords: &'a Array2<f64>,
    /// Cluster labels, `NOISE_LABEL` for outliers.
    pub labels: &'a [i32],
    /// Sorted k-distance profile.
    pub profile: &'a [f64],
    /// Final clustering radius.
    pub epsilon: f64,
}

impl<'a> FinderScene<'a> {
    /// Indices of noise-labeled points.
    pub fn outlier_indices(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == NOISE_LABEL)
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of clustered (non-noise) points.
    pub fn clustered_indices(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l != NOISE_LABEL)
            .map(|(i, _)| i)
            .collect()
    }
}

/// One rendering backend for finder runs.
pub trait FinderRenderer: Send + Sync {
    /// Render every view of the scene this backend supports.
    fn render(&self, scene: &FinderScene<'_>) -> Result<(), VizError>;
}
