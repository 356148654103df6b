//! Gated k-nearest-neighbor similarity predictor
//!
//! Two-stage empirical forecast: a coarse gate keeps historical sessions whose
//! smoothed session score sits near today's, widening the band until enough
//! candidates exist, then a fine rank orders the survivors by feature-vector
//! distance and lets the nearest neighbors vote on direction.

use crate::data::Direction;
use crate::error::{Result, SignalError};
use crate::predictors::{Prediction, UnavailableReason};
use serde::{Deserialize, Serialize};

/// Configuration for [`SimilarityPredictor`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Initial avgTs gate half-width
    pub start_band: f64,
    /// Widest gate tried before giving up
    pub max_band: f64,
    /// Gate widening increment
    pub band_step: f64,
    /// Candidate count the gate tries to reach
    pub min_candidates: usize,
    /// Neighbors kept after the distance rank
    pub k: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            start_band: 3.0,
            max_band: 10.0,
            band_step: 1.0,
            min_candidates: 50,
            k: 100,
        }
    }
}

/// The five-dimensional session fingerprint compared across days
///
/// NaN dimensions are treated as missing and excluded from pairwise distances
/// rather than penalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Composite score S
    pub score: f64,
    /// Volume deviation percent
    pub volume_dev_pct: f64,
    /// Sentiment deviation percent
    pub sentiment_dev_pct: f64,
    /// Ticker volatility composite
    pub ticker_vol_comp: f64,
    /// Market volatility composite
    pub market_vol_comp: f64,
}

impl FeatureVector {
    fn dims(&self) -> [f64; 5] {
        [
            self.score,
            self.volume_dev_pct,
            self.sentiment_dev_pct,
            self.ticker_vol_comp,
            self.market_vol_comp,
        ]
    }

    /// Euclidean distance over the dimensions both vectors define
    ///
    /// Vectors sharing no finite dimension are infinitely far apart, so they
    /// rank behind every comparable candidate.
    pub fn partial_distance(&self, other: &FeatureVector) -> f64 {
        let mut sum = 0.0;
        let mut shared = 0usize;

        for (a, b) in self.dims().iter().zip(other.dims().iter()) {
            if a.is_finite() && b.is_finite() {
                sum += (a - b) * (a - b);
                shared += 1;
            }
        }

        if shared == 0 {
            f64::INFINITY
        } else {
            sum.sqrt()
        }
    }
}

/// Two-stage gated k-NN search over historical sessions
#[derive(Debug, Clone)]
pub struct SimilarityPredictor {
    config: SimilarityConfig,
}

impl SimilarityPredictor {
    /// Create a predictor, rejecting degenerate configurations
    pub fn new(config: SimilarityConfig) -> Result<Self> {
        if config.start_band > config.max_band {
            return Err(SignalError::InvalidParameter(
                "Start band must not exceed the maximum band".to_string(),
            ));
        }
        if config.band_step <= 0.0 {
            return Err(SignalError::InvalidParameter(
                "Band step must be positive".to_string(),
            ));
        }
        if config.k == 0 || config.min_candidates == 0 {
            return Err(SignalError::InvalidParameter(
                "Neighbor counts must be greater than zero".to_string(),
            ));
        }

        Ok(Self { config })
    }

    /// Predict the next session from historical analogues
    ///
    /// `history_moves[i]` is the realized next-day percentage move after
    /// historical day `i`; days with an undefined move never become
    /// candidates. Vote ties go to Down - the Up call requires a strict
    /// majority.
    pub fn predict(
        &self,
        today_avg_ts: f64,
        today: &FeatureVector,
        history_avg_ts: &[f64],
        history_vectors: &[FeatureVector],
        history_moves: &[f64],
    ) -> Result<Prediction> {
        if history_vectors.len() != history_avg_ts.len()
            || history_moves.len() != history_avg_ts.len()
        {
            return Err(SignalError::LengthMismatch(format!(
                "History arrays differ in length: {} avgTs, {} vectors, {} moves",
                history_avg_ts.len(),
                history_vectors.len(),
                history_moves.len()
            )));
        }

        // Stage 1: widen the avgTs gate until enough candidates appear.
        let mut band = self.config.start_band;
        let mut candidates: Vec<usize>;
        loop {
            candidates = (0..history_avg_ts.len())
                .filter(|&i| {
                    history_moves[i].is_finite()
                        && history_avg_ts[i].is_finite()
                        && (history_avg_ts[i] - today_avg_ts).abs() <= band
                })
                .collect();

            if candidates.len() >= self.config.min_candidates || band >= self.config.max_band {
                break;
            }
            band = (band + self.config.band_step).min(self.config.max_band);
        }

        if candidates.is_empty() {
            let mut prediction = Prediction::unavailable(UnavailableReason::GateExhausted);
            prediction.band_used = Some(band);
            return Ok(prediction);
        }

        // Stage 2: rank candidates by partial distance and keep the nearest k.
        let mut ranked: Vec<(f64, usize)> = candidates
            .iter()
            .map(|&i| (today.partial_distance(&history_vectors[i]), i))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.truncate(self.config.k);

        let mut up = 0usize;
        let mut move_sum = 0.0;
        for &(_, i) in &ranked {
            if history_moves[i] > 0.0 {
                up += 1;
            }
            move_sum += history_moves[i];
        }
        let total = ranked.len();
        let down = total - up;

        let label = if up > down { Direction::Up } else { Direction::Down };
        let majority = up.max(down);

        Ok(Prediction {
            label,
            confidence: majority as f64 / total as f64,
            expected_pct_change: move_sum / total as f64,
            matches: total,
            band_used: Some(band),
            reason: None,
        })
    }
}
