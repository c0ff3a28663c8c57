//! Density-based anomaly detection over endpoint embeddings.
//!
//! The pipeline in [`pipeline`] chains the stages in this module:
//! column standardization, 2-D PCA projection, the sorted k-distance
//! profile, knee-based epsilon selection, and DBSCAN labeling.

pub mod dbscan;
pub mod epsilon;
pub mod error;
pub mod kdistance;
pub mod normalize;
pub mod pca;
pub mod pipeline;

pub use dbscan::{cluster, DbscanParams, NOISE_LABEL};
pub use epsilon::{
    apply_override, recommend, AcceptRecommended, EpsilonConfirmer, EpsilonSelection,
    EpsilonSource, InteractiveConfirmer,
};
pub use error::{DetectionError, DetectionResult};
pub use kdistance::density_profile;
pub use normalize::standardize;
pub use pca::project_2d;
pub use pipeline::{DetectionParams, FinderPipeline, RunSummary};
