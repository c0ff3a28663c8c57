//! Epsilon selection from the density profile.
//!
//! Locates the knee (point of maximum curvature) of the sorted k-distance
//! curve under the convex-and-increasing assumption: normalize both axes
//! to [0, 1] and take the index where the curve sits furthest below the
//! diagonal — the bend from "flat" (dense, typical points) to "steep"
//! (sparse, anomalous points). A flat or degenerate curve has no knee;
//! the selector then falls back to the median distance, which never
//! fails, so the pipeline always has a usable epsilon.
//!
//! The recommendation can be confirmed or replaced by a human through the
//! pluggable [`EpsilonConfirmer`] seam. Non-interactive runs install
//! [`AcceptRecommended`] and never block.

use std::io::BufRead;

use tracing::{info, warn};

/// How the final epsilon was arrived at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EpsilonSource {
    /// Knee located at the given profile index.
    Knee(usize),
    /// No knee; median of the profile.
    MedianFallback,
    /// Supplied up front by the caller, bypassing selection entirely.
    Explicit,
}

/// Outcome of epsilon selection for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonSelection {
    /// The value the selector recommended before any override.
    pub recommended: f64,
    /// The value the clustering will actually use.
    pub epsilon: f64,
    /// Where the recommendation came from.
    pub source: EpsilonSource,
}

/// Locate the knee of a sorted, ascending profile.
///
/// Returns `None` for profiles shorter than 3 points or with no spread
/// (the degenerate-curve case, recovered by the caller via median).
pub fn locate_knee(profile: &[f64]) -> Option<usize> {
    let n = profile.len();
    if n < 3 {
        return None;
    }

    let y_min = profile[0];
    let y_max = profile[n - 1];
    let spread = y_max - y_min;
    if spread <= 0.0 {
        return None;
    }

    let mut best_index = 0usize;
    let mut best_difference = 0.0f64;
    for (i, &y) in profile.iter().enumerate() {
        let x_norm = i as f64 / (n - 1) as f64;
        let y_norm = (y - y_min) / spread;
        let difference = x_norm - y_norm;
        if difference > best_difference {
            best_difference = difference;
            best_index = i;
        }
    }

    // A non-positive maximum means the curve never dips below the
    // diagonal: concave or linear, no convex knee to report.
    if best_difference > 0.0 {
        Some(best_index)
    } else {
        None
    }
}

/// Median of a sorted profile. Zero for an empty profile.
pub fn median(profile: &[f64]) -> f64 {
    let n = profile.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        profile[n / 2]
    } else {
        (profile[n / 2 - 1] + profile[n / 2]) / 2.0
    }
}

/// Recommend an epsilon for a sorted density profile.
///
/// Knee value when a knee exists, median otherwise. The fallback never
/// fails and always yields a finite, non-negative value.
pub fn recommend(profile: &[f64]) -> EpsilonSelection {
    match locate_knee(profile) {
        Some(index) => {
            info!(knee_index = index, epsilon = profile[index], "knee located in density profile");
            EpsilonSelection {
                recommended: profile[index],
                epsilon: profile[index],
                source: EpsilonSource::Knee(index),
            }
        }
        None => {
            let value = median(profile);
            warn!(epsilon = value, "no knee in density profile, falling back to median distance");
            EpsilonSelection {
                recommended: value,
                epsilon: value,
                source: EpsilonSource::MedianFallback,
            }
        }
    }
}

/// Confirmation seam for the recommended epsilon.
///
/// One implementation blocks for a line of input, the other accepts the
/// recommendation unconditionally; the pipeline selects between them by
/// configuration rather than scattering mode branches.
pub trait EpsilonConfirmer: Send + Sync {
    /// Return the epsilon to use, given the recommendation.
    fn confirm(&self, recommended: f64) -> f64;
}

/// Non-interactive confirmer: always accepts the recommendation.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptRecommended;

impl EpsilonConfirmer for AcceptRecommended {
    fn confirm(&self, recommended: f64) -> f64 {
        recommended
    }
}

/// Interactive confirmer: blocks for one line on stdin.
///
/// An empty line accepts the recommendation; anything else is parsed as
/// a replacement value. Invalid input is reported as a warning and the
/// recommendation is kept — never fatal.
#[derive(Debug, Default, Clone, Copy)]
pub struct InteractiveConfirmer;

impl EpsilonConfirmer for InteractiveConfirmer {
    fn confirm(&self, recommended: f64) -> f64 {
        eprint!("[RECOMMENDED] {recommended} | press ENTER to accept, or provide a value: ");
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(_) => apply_override(&line, recommended),
            Err(e) => {
                warn!(error = %e, "could not read epsilon confirmation, using recommendation");
                recommended
            }
        }
    }
}

/// Interpret a confirmation line against the recommendation.
///
/// Split out of [`InteractiveConfirmer`] so the override rules are
/// testable without a terminal.
pub fn apply_override(input: &str, recommended: f64) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return recommended;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => {
            info!(epsilon = value, "using operator-supplied epsilon");
            value
        }
        Ok(value) => {
            warn!(
                supplied = value,
                "override epsilon must be finite and non-negative, using recommendation"
            );
            recommended
        }
        Err(_) => {
            warn!(supplied = trimmed, "invalid epsilon override, using recommendation");
            recommended
        }
    }
}
