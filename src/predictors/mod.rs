//! Prediction strategies
//!
//! Two independent consumers of the normalized feature substrate: an empirical
//! nearest-neighbor path and a calibrated parametric path. Both produce the
//! same [`Prediction`] record.

use crate::data::Direction;
use serde::{Deserialize, Serialize};

pub mod calibrated;
pub mod similarity;

pub use calibrated::{CalibratedConfig, CalibratedScorePredictor, Combiner, WeightedSumCombiner};
pub use similarity::{FeatureVector, SimilarityConfig, SimilarityPredictor};

/// Why no directional call could be made
///
/// Every variant is an expected, recoverable outcome; none of them surface as
/// errors from the public entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnavailableReason {
    /// Fewer than the minimum warm-up bars were supplied
    InsufficientData,
    /// The validation window yielded no usable index, so no combo exists
    NoValidationSamples,
    /// The similarity gate found no candidate even at the maximum band
    GateExhausted,
}

/// A next-session directional forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Directional call
    pub label: Direction,
    /// Majority share of the neighbor vote, or the calibrated probability of
    /// an up move
    pub confidence: f64,
    /// Expected next-session percentage move
    pub expected_pct_change: f64,
    /// Neighbors behind an empirical forecast (0 for the calibrated path)
    pub matches: usize,
    /// Similarity band the gate settled on, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_used: Option<f64>,
    /// Set when no directional call could be made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
}

impl Prediction {
    /// A prediction that makes no call, annotated with the reason
    pub fn unavailable(reason: UnavailableReason) -> Self {
        Self {
            label: Direction::Unknown,
            confidence: 0.0,
            expected_pct_change: 0.0,
            matches: 0,
            band_used: None,
            reason: Some(reason),
        }
    }
}
