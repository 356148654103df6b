//! Calibrated composite-score predictor
//!
//! The parametric path: a pluggable combiner maps the named z-feature pack to
//! a scalar score, a temperature-scaled logistic turns the score into a
//! probability, and recent realized volatility anchors the expected magnitude.

use crate::data::Direction;
use crate::error::{Result, SignalError};
use crate::features::FeatureZPack;
use crate::predictors::{Prediction, UnavailableReason};
use crate::utils::finite_or_zero;
use serde::{Deserialize, Serialize};

/// Pluggable scalar scoring over the z-feature pack
///
/// The combiner isolates the weighting logic - frequently proprietary,
/// frequently re-tuned - from the statistical plumbing: swapping it touches
/// neither normalization nor calibration. Implementations must be pure; any
/// closure `Fn(&FeatureZPack, usize) -> f64` qualifies.
pub trait Combiner {
    /// Score the pack at index `t`, nominally in [-5, 5]
    fn score(&self, pack: &FeatureZPack, t: usize) -> f64;
}

impl<F> Combiner for F
where
    F: Fn(&FeatureZPack, usize) -> f64,
{
    fn score(&self, pack: &FeatureZPack, t: usize) -> f64 {
        self(pack, t)
    }
}

/// Weighted sum over named pack members, non-finite members contributing zero
#[derive(Debug, Clone)]
pub struct WeightedSumCombiner {
    weights: Vec<(String, f64)>,
}

impl WeightedSumCombiner {
    /// Create a combiner from (member key, weight) pairs
    pub fn new(weights: Vec<(String, f64)>) -> Self {
        Self { weights }
    }
}

impl Combiner for WeightedSumCombiner {
    fn score(&self, pack: &FeatureZPack, t: usize) -> f64 {
        self.weights
            .iter()
            .map(|(key, weight)| weight * finite_or_zero(pack.value(key, t)))
            .sum()
    }
}

/// Configuration for [`CalibratedScorePredictor`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibratedConfig {
    /// Logistic temperature; above 1 flattens overconfidence
    pub temperature: f64,
    /// Raw scores are clamped to ±cap before calibration
    pub score_cap: f64,
    /// Scores within ±band emit Neutral
    pub neutral_band: f64,
    /// Probability floor
    pub prob_min: f64,
    /// Probability ceiling
    pub prob_max: f64,
    /// Expected-magnitude floor, percent
    pub magnitude_min_pct: f64,
    /// Expected-magnitude ceiling, percent
    pub magnitude_max_pct: f64,
}

impl Default for CalibratedConfig {
    fn default() -> Self {
        Self {
            temperature: 1.5,
            score_cap: 5.0,
            neutral_band: 0.5,
            prob_min: 0.05,
            prob_max: 0.95,
            magnitude_min_pct: 0.1,
            magnitude_max_pct: 10.0,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Parametric forecast from a composite score
#[derive(Debug, Clone)]
pub struct CalibratedScorePredictor {
    config: CalibratedConfig,
}

impl CalibratedScorePredictor {
    /// Create a predictor, rejecting degenerate configurations
    pub fn new(config: CalibratedConfig) -> Result<Self> {
        if config.temperature <= 0.0 || config.score_cap <= 0.0 {
            return Err(SignalError::InvalidParameter(
                "Temperature and score cap must be positive".to_string(),
            ));
        }
        if config.neutral_band < 0.0 {
            return Err(SignalError::InvalidParameter(
                "Neutral band must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.prob_min)
            || !(0.0..=1.0).contains(&config.prob_max)
            || config.prob_min > config.prob_max
        {
            return Err(SignalError::InvalidParameter(
                "Probability clamps must satisfy 0 <= min <= max <= 1".to_string(),
            ));
        }
        if config.magnitude_min_pct < 0.0 || config.magnitude_min_pct > config.magnitude_max_pct {
            return Err(SignalError::InvalidParameter(
                "Magnitude clamps must satisfy 0 <= min <= max".to_string(),
            ));
        }

        Ok(Self { config })
    }

    /// Predictor configuration
    pub fn config(&self) -> &CalibratedConfig {
        &self.config
    }

    /// Forecast the session at index `t` of the pack
    ///
    /// `atr_pct` is the current average true range as a percent of close; it
    /// anchors the magnitude estimate to realized volatility instead of
    /// letting the score alone dictate move size. A non-finite combiner output
    /// yields Neutral at probability one half.
    pub fn predict(
        &self,
        pack: &FeatureZPack,
        t: usize,
        atr_pct: f64,
        combiner: &dyn Combiner,
    ) -> Result<Prediction> {
        if t >= pack.len() {
            return Err(SignalError::InvalidParameter(format!(
                "Index {} is out of range for a pack of {} days",
                t,
                pack.len()
            )));
        }

        let raw = combiner.score(pack, t);
        if !raw.is_finite() {
            return Ok(Prediction {
                label: Direction::Neutral,
                confidence: 0.5,
                expected_pct_change: 0.0,
                matches: 0,
                band_used: None,
                reason: Some(UnavailableReason::InsufficientData),
            });
        }

        let cfg = &self.config;
        let score = raw.clamp(-cfg.score_cap, cfg.score_cap);

        let prob_up = sigmoid(3.0 * score / cfg.temperature).clamp(cfg.prob_min, cfg.prob_max);

        let label = if score > cfg.neutral_band {
            Direction::Up
        } else if score < -cfg.neutral_band {
            Direction::Down
        } else {
            Direction::Neutral
        };

        let magnitude = (finite_or_zero(atr_pct) * (1.0 + 0.25 * score.abs()))
            .clamp(cfg.magnitude_min_pct, cfg.magnitude_max_pct);

        Ok(Prediction {
            label,
            confidence: prob_up,
            expected_pct_change: magnitude,
            matches: 0,
            band_used: None,
            reason: None,
        })
    }
}
