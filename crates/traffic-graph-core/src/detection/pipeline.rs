//! End-to-end finder pipeline.
//!
//! One invocation is one batch: fetch, standardize, project, profile,
//! select epsilon, cluster, persist flags, render. The store and the
//! epsilon confirmer are injected, so the same pipeline runs headless
//! against the in-memory stub in tests and interactively against the
//! persistent store in the CLI.

use std::sync::Arc;

use ndarray::Array2;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::detection::dbscan::{cluster, DbscanParams, NOISE_LABEL};
use crate::detection::epsilon::{recommend, AcceptRecommended, EpsilonConfirmer, EpsilonSource};
use crate::detection::error::{DetectionError, DetectionResult};
use crate::detection::kdistance::density_profile;
use crate::detection::normalize::standardize;
use crate::detection::pca::project_2d;
use crate::traits::{BatchSelector, EndpointStore, PersistOutcome};
use crate::types::EndpointId;
use crate::viz::{FinderRenderer, FinderScene};

/// Tunable parameters for one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct DetectionParams {
    /// Neighborhood size for both the k-distance profile and DBSCAN.
    pub min_samples: usize,
    /// Epsilon supplied up front, bypassing selection and confirmation.
    pub epsilon_override: Option<f64>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_samples: 2,
            epsilon_override: None,
        }
    }
}

impl DetectionParams {
    /// Set the neighborhood size.
    #[must_use]
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Set an explicit epsilon, skipping selection entirely.
    #[must_use]
    pub fn with_epsilon_override(mut self, epsilon: f64) -> Self {
        self.epsilon_override = Some(epsilon);
        self
    }

    /// Validate parameters before a run.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::InvalidParameter` if `min_samples < 2`
    /// or the override epsilon is negative or non-finite.
    pub fn validate(&self) -> DetectionResult<()> {
        if self.min_samples < 2 {
            return Err(DetectionError::InvalidParameter(format!(
                "min_samples must be at least 2, got {}",
                self.min_samples
            )));
        }
        if let Some(eps) = self.epsilon_override {
            if !eps.is_finite() || eps < 0.0 {
                return Err(DetectionError::InvalidParameter(format!(
                    "override epsilon must be finite and non-negative, got {eps}"
                )));
            }
        }
        Ok(())
    }
}

/// What one pipeline run computed and persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Records fetched for the batch.
    pub batch_size: usize,
    /// Embedding dimensionality of the batch.
    pub dimension: usize,
    /// Epsilon the selector recommended (equals `epsilon` unless a
    /// confirmer or override changed it).
    pub epsilon_recommended: f64,
    /// Epsilon the clustering actually used.
    pub epsilon: f64,
    /// Provenance of the epsilon: "knee", "median-fallback", "explicit".
    pub epsilon_source: String,
    /// Profile index of the knee, when one was found.
    pub knee_index: Option<usize>,
    /// Distinct clusters found (noise excluded).
    pub cluster_count: usize,
    /// Identities labeled as outliers, in batch order.
    pub outliers: Vec<EndpointId>,
    /// Flags written to the store.
    pub flags_written: usize,
    /// Flag identities that no longer matched a stored entity.
    pub flags_stale: usize,
}

/// The finder pipeline. Construct with a store handle, then configure
/// the confirmation seam and renderers before calling [`run`](Self::run).
pub struct FinderPipeline {
    store: Arc<dyn EndpointStore>,
    params: DetectionParams,
    confirmer: Box<dyn EpsilonConfirmer>,
    renderers: Vec<Box<dyn FinderRenderer>>,
}

impl FinderPipeline {
    /// Create a pipeline with default parameters, the non-blocking
    /// confirmer, and no renderers.
    pub fn new(store: Arc<dyn EndpointStore>) -> Self {
        Self {
            store,
            params: DetectionParams::default(),
            confirmer: Box::new(AcceptRecommended),
            renderers: Vec::new(),
        }
    }

    /// Replace the run parameters.
    #[must_use]
    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    /// Replace the epsilon confirmation seam.
    #[must_use]
    pub fn with_confirmer(mut self, confirmer: Box<dyn EpsilonConfirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    /// Add a renderer. Renderers run after persistence; a failing
    /// renderer is a warning, never a run failure.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn FinderRenderer>) -> Self {
        self.renderers.push(renderer);
        self
    }

    /// Run the pipeline over one batch.
    ///
    /// # Errors
    ///
    /// - `DataUnavailable` when the selected batch is empty;
    /// - `InsufficientData` when the batch is smaller than `min_samples`;
    /// - `DimensionMismatch` when any embedding length differs from the
    ///   first record's;
    /// - `InvalidParameter` for bad run parameters;
    /// - `Store` for fetch or persistence failures (the run aborts with
    ///   no partial writes).
    pub async fn run(&self, selector: &BatchSelector) -> DetectionResult<RunSummary> {
        self.params.validate()?;

        let records = self.store.fetch_batch(selector).await?;
        if records.is_empty() {
            return Err(DetectionError::DataUnavailable);
        }
        let n = records.len();
        if n < self.params.min_samples {
            return Err(DetectionError::InsufficientData {
                required: self.params.min_samples,
                actual: n,
            });
        }

        let dimension = records[0].embedding.len();
        for record in &records {
            if record.embedding.len() != dimension {
                return Err(DetectionError::DimensionMismatch {
                    expected: dimension,
                    actual: record.embedding.len(),
                    identity: record.id.clone(),
                });
            }
        }
        info!(batch_size = n, dimension, "fetched endpoint batch");

        let mut matrix = Array2::<f64>::zeros((n, dimension));
        for (i, record) in records.iter().enumerate() {
            for (j, &v) in record.embedding.iter().enumerate() {
                matrix[(i, j)] = f64::from(v);
            }
        }

        let standardized = standardize(&matrix);
        let coords = project_2d(&standardized);
        let profile = density_profile(&coords, self.params.min_samples)?;

        let (epsilon_recommended, epsilon, source) = match self.params.epsilon_override {
            Some(eps) => {
                info!(epsilon = eps, "using explicit epsilon, skipping selection");
                (eps, eps, EpsilonSource::Explicit)
            }
            None => {
                let selection = recommend(&profile);
                let confirmed = self.confirmer.confirm(selection.recommended);
                (selection.recommended, confirmed, selection.source)
            }
        };
        let knee_index = match source {
            EpsilonSource::Knee(index) => Some(index),
            _ => None,
        };

        let labels = cluster(&coords, &DbscanParams::new(epsilon, self.params.min_samples))?;

        let cluster_count = labels
            .iter()
            .filter(|l| **l != NOISE_LABEL)
            .collect::<std::collections::HashSet<_>>()
            .len();
        let flags: Vec<(EndpointId, bool)> = records
            .iter()
            .zip(&labels)
            .map(|(record, label)| (record.id.clone(), *label == NOISE_LABEL))
            .collect();
        let outliers: Vec<EndpointId> = flags
            .iter()
            .filter(|(_, is_outlier)| *is_outlier)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &outliers {
            debug!(endpoint = %id, "flagging outlier");
        }

        // Persist before any visualization, so a renderer failure can
        // never cost the flags.
        let PersistOutcome { written, stale } = self.store.set_outlier_flags(&flags).await?;
        if stale > 0 {
            warn!(stale, "some endpoints vanished between fetch and flag write");
        }
        info!(
            written,
            outliers = outliers.len(),
            clusters = cluster_count,
            epsilon,
            "outlier flags persisted"
        );

        let scene = FinderScene {
            records: &records,
            coords: &coords,
            labels: &labels,
            profile: &profile,
            epsilon,
        };
        for renderer in &self.renderers {
            if let Err(e) = renderer.render(&scene) {
                warn!(error = %e, "renderer failed, continuing");
            }
        }

        Ok(RunSummary {
            batch_size: n,
            dimension,
            epsilon_recommended,
            epsilon,
            epsilon_source: source_name(source).to_string(),
            knee_index,
            cluster_count,
            outliers,
            flags_written: written,
            flags_stale: stale,
        })
    }
}

fn source_name(source: EpsilonSource) -> &'static str {
    match source {
        EpsilonSource::Knee(_) => "knee",
        EpsilonSource::MedianFallback => "median-fallback",
        EpsilonSource::Explicit => "explicit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stubs::InMemoryEndpointStore;
    use crate::types::{EndpointAttributes, EndpointId, EndpointRecord};

    fn record(address: &str, port: u16, embedding: Vec<f32>) -> EndpointRecord {
        EndpointRecord::new(
            EndpointId::new(address, port),
            embedding,
            EndpointAttributes::default(),
        )
    }

    async fn seed(store: &InMemoryEndpointStore, records: Vec<EndpointRecord>) {
        for r in records {
            store.put_endpoint(&r).await.unwrap();
        }
    }

    /// A confirmer that always replaces the recommendation, for
    /// exercising the override path without a terminal.
    struct FixedConfirmer(f64);

    impl EpsilonConfirmer for FixedConfirmer {
        fn confirm(&self, _recommended: f64) -> f64 {
            self.0
        }
    }

    #[tokio::test]
    async fn test_dense_cluster_plus_far_point_flags_one_outlier() {
        let store = Arc::new(InMemoryEndpointStore::new());
        seed(
            &store,
            vec![
                record("10.0.0.1", 443, vec![0.0, 0.0, 0.0]),
                record("10.0.0.2", 443, vec![0.1, 0.0, 0.0]),
                record("10.0.0.3", 443, vec![0.0, 0.1, 0.0]),
                record("10.0.0.4", 443, vec![0.1, 0.1, 0.0]),
                record("203.0.113.9", 31337, vec![50.0, 50.0, 50.0]),
            ],
        )
        .await;

        let pipeline = FinderPipeline::new(store.clone());
        let summary = pipeline.run(&BatchSelector::All).await.unwrap();

        println!(
            "[PIPELINE] eps={} source={} outliers={}",
            summary.epsilon, summary.epsilon_source, summary.outliers.len()
        );
        assert_eq!(summary.batch_size, 5);
        assert_eq!(summary.dimension, 3);
        assert_eq!(summary.outliers, vec![EndpointId::new("203.0.113.9", 31337)]);
        assert_eq!(summary.cluster_count, 1);
        assert_eq!(summary.flags_written, 5);
        assert_eq!(summary.flags_stale, 0);
        assert_eq!(summary.epsilon_source, "knee");

        // Every record carries an explicit flag; only the far point is true.
        let far = store.get(&EndpointId::new("203.0.113.9", 31337)).unwrap();
        assert_eq!(far.outlier, Some(true));
        for i in 1..=4 {
            let near = store
                .get(&EndpointId::new(format!("10.0.0.{i}"), 443))
                .unwrap();
            assert_eq!(near.outlier, Some(false), "10.0.0.{i} should be normal");
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_data_unavailable() {
        let store = Arc::new(InMemoryEndpointStore::new());
        let pipeline = FinderPipeline::new(store);
        let err = pipeline.run(&BatchSelector::All).await.unwrap_err();
        assert!(matches!(err, DetectionError::DataUnavailable));
    }

    #[tokio::test]
    async fn test_single_record_is_insufficient() {
        let store = Arc::new(InMemoryEndpointStore::new());
        seed(&store, vec![record("10.0.0.1", 80, vec![1.0, 2.0])]).await;

        let pipeline = FinderPipeline::new(store);
        let err = pipeline.run(&BatchSelector::All).await.unwrap_err();
        assert!(matches!(
            err,
            DetectionError::InsufficientData {
                required: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_smallest_viable_batch_runs() {
        // Two identical points: one cluster, no outliers, no crash.
        let store = Arc::new(InMemoryEndpointStore::new());
        seed(
            &store,
            vec![
                record("10.0.0.1", 80, vec![1.0, 2.0]),
                record("10.0.0.2", 80, vec![1.0, 2.0]),
            ],
        )
        .await;

        let pipeline = FinderPipeline::new(store.clone());
        let summary = pipeline.run(&BatchSelector::All).await.unwrap();
        assert_eq!(summary.batch_size, 2);
        assert_eq!(summary.outliers.len(), 0);
        assert_eq!(summary.cluster_count, 1);
        assert_eq!(
            store.get(&EndpointId::new("10.0.0.1", 80)).unwrap().outlier,
            Some(false)
        );
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_fatal_and_writes_nothing() {
        let store = Arc::new(InMemoryEndpointStore::new());
        seed(
            &store,
            vec![
                record("10.0.0.1", 80, vec![1.0, 2.0]),
                record("10.0.0.2", 80, vec![1.0, 2.0, 3.0]),
            ],
        )
        .await;

        let pipeline = FinderPipeline::new(store.clone());
        let err = pipeline.run(&BatchSelector::All).await.unwrap_err();
        assert!(matches!(err, DetectionError::DimensionMismatch { .. }));

        // Nothing was evaluated, so nothing was flagged.
        assert_eq!(
            store.get(&EndpointId::new("10.0.0.1", 80)).unwrap().outlier,
            None
        );
    }

    #[tokio::test]
    async fn test_explicit_epsilon_bypasses_selection() {
        let store = Arc::new(InMemoryEndpointStore::new());
        seed(
            &store,
            vec![
                record("10.0.0.1", 443, vec![0.0, 0.0]),
                record("10.0.0.2", 443, vec![0.1, 0.0]),
                record("10.0.0.3", 443, vec![0.0, 0.1]),
                record("203.0.113.9", 31337, vec![50.0, 50.0]),
            ],
        )
        .await;

        let pipeline = FinderPipeline::new(store)
            .with_params(DetectionParams::default().with_epsilon_override(0.5));
        let summary = pipeline.run(&BatchSelector::All).await.unwrap();
        assert_eq!(summary.epsilon, 0.5);
        assert_eq!(summary.epsilon_source, "explicit");
        assert_eq!(summary.knee_index, None);
    }

    #[tokio::test]
    async fn test_invalid_override_is_rejected_before_fetch() {
        let store = Arc::new(InMemoryEndpointStore::new());
        let pipeline = FinderPipeline::new(store)
            .with_params(DetectionParams::default().with_epsilon_override(f64::NAN));
        let err = pipeline.run(&BatchSelector::All).await.unwrap_err();
        assert!(matches!(err, DetectionError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_min_samples_below_two_is_rejected() {
        let store = Arc::new(InMemoryEndpointStore::new());
        let pipeline =
            FinderPipeline::new(store).with_params(DetectionParams::default().with_min_samples(1));
        let err = pipeline.run(&BatchSelector::All).await.unwrap_err();
        assert!(matches!(err, DetectionError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_confirmer_replacement_takes_effect() {
        let store = Arc::new(InMemoryEndpointStore::new());
        seed(
            &store,
            vec![
                record("10.0.0.1", 443, vec![0.0, 0.0]),
                record("10.0.0.2", 443, vec![0.1, 0.0]),
                record("10.0.0.3", 443, vec![0.0, 0.1]),
                record("203.0.113.9", 31337, vec![50.0, 50.0]),
            ],
        )
        .await;

        // A giant confirmed epsilon swallows the far point into the cluster.
        let pipeline = FinderPipeline::new(store.clone())
            .with_confirmer(Box::new(FixedConfirmer(1000.0)));
        let summary = pipeline.run(&BatchSelector::All).await.unwrap();
        assert_eq!(summary.epsilon, 1000.0);
        assert_ne!(summary.epsilon_recommended, 1000.0);
        assert_eq!(summary.outliers.len(), 0);
    }

    #[tokio::test]
    async fn test_organization_selector_narrows_batch() {
        let store = Arc::new(InMemoryEndpointStore::new());
        let mut tagged: Vec<EndpointRecord> = vec![
            record("10.0.0.1", 443, vec![0.0, 0.0]),
            record("10.0.0.2", 443, vec![0.1, 0.0]),
            record("10.0.0.3", 443, vec![0.0, 0.1]),
        ];
        for r in &mut tagged {
            r.attributes.organization = Some("Example Corp".to_string());
        }
        tagged.push(record("192.0.2.1", 80, vec![9.0, 9.0]));
        seed(&store, tagged).await;

        let pipeline = FinderPipeline::new(store.clone());
        let summary = pipeline
            .run(&BatchSelector::Organization("Example Corp".to_string()))
            .await
            .unwrap();
        assert_eq!(summary.batch_size, 3);

        // The untagged record was outside the batch and stays unevaluated.
        assert_eq!(
            store.get(&EndpointId::new("192.0.2.1", 80)).unwrap().outlier,
            None
        );
    }

    #[tokio::test]
    async fn test_summary_serializes_to_json() {
        let store = Arc::new(InMemoryEndpointStore::new());
        seed(
            &store,
            vec![
                record("10.0.0.1", 80, vec![1.0, 2.0]),
                record("10.0.0.2", 80, vec![1.0, 2.0]),
            ],
        )
        .await;

        let summary = FinderPipeline::new(store)
            .run(&BatchSelector::All)
            .await
            .unwrap();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"batch_size\":2"));
        assert!(json.contains("\"epsilon_source\""));
    }
}
