//! End-to-end forecast pipelines
//!
//! Wires the normalization, combo selection, session scoring and prediction
//! layers into two batch entry points: the empirical similarity path and the
//! calibrated combiner path. Both consume caller-supplied bars, indicator
//! series and auxiliary series; neither touches the network, files or the
//! process environment.

use crate::combo::select_best_combo;
use crate::data::{
    close_prices, next_day_pct_moves, validate_bars, volumes, AuxiliarySeries, DailyBar,
    ValidationWindow,
};
use crate::error::Result;
use crate::features::{FeatureCatalog, RawFeatureSet};
use crate::predictors::{
    CalibratedConfig, CalibratedScorePredictor, Combiner, FeatureVector, Prediction,
    SimilarityConfig, SimilarityPredictor, UnavailableReason,
};
use crate::session::{
    build_session_scores, smooth_session_scores, PhaseSamples, SessionComponents, SmoothingMode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minimum bar count before any derived feature is computed
pub const MIN_WARMUP_BARS: usize = 40;

/// Default lookback for the rolling robust normalizer
pub const DEFAULT_Z_LOOKBACK: usize = 60;

/// Configuration for the forecast pipelines
///
/// Every knob is an explicit parameter with a documented default; nothing is
/// read from the process environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Robust-z lookback window
    pub z_lookback: usize,
    /// Bars required before anything is computed
    pub warmup_bars: usize,
    /// Combo validation window; defaults to `[warmup_bars, len-1)`
    pub validation: Option<ValidationWindow>,
    /// Similarity predictor settings
    pub similarity: SimilarityConfig,
    /// Calibrated predictor settings
    pub calibrated: CalibratedConfig,
    /// Session-phase smoothing mode
    pub smoothing_mode: SmoothingMode,
    /// Attach the S/Ts/avgTs series to the report for diagnostics
    pub include_series: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            z_lookback: DEFAULT_Z_LOOKBACK,
            warmup_bars: MIN_WARMUP_BARS,
            validation: None,
            similarity: SimilarityConfig::default(),
            calibrated: CalibratedConfig::default(),
            smoothing_mode: SmoothingMode::After,
            include_series: false,
        }
    }
}

/// State of the forecast day, echoed alongside the prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Date of the last supplied bar
    pub date: NaiveDate,
    /// Composite score on the forecast day
    pub score: f64,
    /// Session score on the forecast day
    pub ts: f64,
    /// Smoothed session score on the forecast day
    pub avg_ts: f64,
    /// Volume deviation percent
    pub comp_vol_pct: f64,
    /// Sentiment deviation percent
    pub comp_sent_pct: f64,
    /// Ticker volatility composite
    pub ticker_vol_comp: f64,
    /// Market volatility composite
    pub market_vol_comp: f64,
    /// Member keys of the selected combo, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combo_keys: Option<Vec<String>>,
    /// Configuration the forecast ran with
    pub config: ForecastConfig,
}

/// Optional per-day series for diagnostics and backtests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesDiagnostics {
    /// Composite score series
    pub score: Vec<f64>,
    /// Session score series
    pub ts: Vec<f64>,
    /// Smoothed session score series
    pub avg_ts: Vec<f64>,
}

/// The complete, JSON-serializable forecast output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    /// The directional forecast
    pub prediction: Prediction,
    /// Forecast-day state and config echo
    pub snapshot: Snapshot,
    /// Diagnostic series, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesDiagnostics>,
}

fn empty_snapshot(date: NaiveDate, config: &ForecastConfig) -> Snapshot {
    Snapshot {
        date,
        score: f64::NAN,
        ts: f64::NAN,
        avg_ts: f64::NAN,
        comp_vol_pct: f64::NAN,
        comp_sent_pct: f64::NAN,
        ticker_vol_comp: f64::NAN,
        market_vol_comp: f64::NAN,
        combo_keys: None,
        config: config.clone(),
    }
}

fn effective_window(config: &ForecastConfig, len: usize) -> ValidationWindow {
    match config.validation {
        Some(window) => window,
        None => {
            let end = len.saturating_sub(1);
            ValidationWindow {
                start: config.warmup_bars.min(end),
                end,
            }
        }
    }
}

/// Run the empirical similarity forecast over a batch of bars
///
/// Fewer than `warmup_bars` bars yields an Unknown prediction annotated with
/// the reason; an empty validation window likewise short-circuits. Mismatched
/// array lengths are programmer errors.
pub fn run_similarity_forecast(
    bars: &[DailyBar],
    features: &RawFeatureSet,
    aux: &AuxiliarySeries,
    phases: Option<&[PhaseSamples]>,
    config: &ForecastConfig,
) -> Result<ForecastReport> {
    validate_bars(bars)?;
    let len = bars.len();
    features.validate_len(len)?;
    aux.validate_len(len)?;

    let last = len - 1;
    let last_date = bars[last].date;

    if len < config.warmup_bars {
        return Ok(ForecastReport {
            prediction: Prediction::unavailable(UnavailableReason::InsufficientData),
            snapshot: empty_snapshot(last_date, config),
            series: None,
        });
    }

    let catalog = FeatureCatalog::from_raw(features, len, config.z_lookback)?;
    let closes = close_prices(bars);
    let window = effective_window(config, len);

    let selection = match select_best_combo(&catalog, &closes, window)? {
        Some(selection) => selection,
        None => {
            return Ok(ForecastReport {
                prediction: Prediction::unavailable(UnavailableReason::NoValidationSamples),
                snapshot: empty_snapshot(last_date, config),
                series: None,
            });
        }
    };

    let bar_volumes = volumes(bars);
    let components = SessionComponents::build(
        &bar_volumes,
        &aux.sentiment,
        &[&features.realized_vol, &aux.implied_vol],
        &[&aux.market_vol, &aux.macro_uncertainty, &aux.drawdown_index],
    )?;

    let ts = build_session_scores(&selection.score, &components)?;
    let avg_ts = match phases {
        Some(phases) => smooth_session_scores(&ts, phases, config.smoothing_mode)?,
        None => ts.clone(),
    };

    let vectors: Vec<FeatureVector> = (0..len)
        .map(|t| FeatureVector {
            score: selection.score[t],
            volume_dev_pct: components.comp_vol_pct[t],
            sentiment_dev_pct: components.comp_sent_pct[t],
            ticker_vol_comp: components.ticker_vol_comp[t],
            market_vol_comp: components.market_vol_comp[t],
        })
        .collect();
    let moves = next_day_pct_moves(&closes);

    let predictor = SimilarityPredictor::new(config.similarity)?;
    let prediction = predictor.predict(
        avg_ts[last],
        &vectors[last],
        &avg_ts[..last],
        &vectors[..last],
        &moves[..last],
    )?;

    let snapshot = Snapshot {
        date: last_date,
        score: selection.score[last],
        ts: ts[last],
        avg_ts: avg_ts[last],
        comp_vol_pct: components.comp_vol_pct[last],
        comp_sent_pct: components.comp_sent_pct[last],
        ticker_vol_comp: components.ticker_vol_comp[last],
        market_vol_comp: components.market_vol_comp[last],
        combo_keys: Some(selection.keys),
        config: config.clone(),
    };

    let series = config.include_series.then(|| SeriesDiagnostics {
        score: selection.score,
        ts,
        avg_ts,
    });

    Ok(ForecastReport {
        prediction,
        snapshot,
        series,
    })
}

/// Run the calibrated combiner forecast over a batch of bars
pub fn run_calibrated_forecast(
    bars: &[DailyBar],
    features: &RawFeatureSet,
    combiner: &dyn Combiner,
    config: &ForecastConfig,
) -> Result<ForecastReport> {
    validate_bars(bars)?;
    let len = bars.len();
    features.validate_len(len)?;

    let last = len - 1;
    let last_date = bars[last].date;

    if len < config.warmup_bars {
        return Ok(ForecastReport {
            prediction: Prediction::unavailable(UnavailableReason::InsufficientData),
            snapshot: empty_snapshot(last_date, config),
            series: None,
        });
    }

    let catalog = FeatureCatalog::from_raw(features, len, config.z_lookback)?;
    let pack = catalog.z_pack();

    let predictor = CalibratedScorePredictor::new(config.calibrated)?;
    let prediction = predictor.predict(&pack, last, features.atr_pct[last], combiner)?;

    let mut snapshot = empty_snapshot(last_date, config);
    snapshot.score = combiner.score(&pack, last);

    Ok(ForecastReport {
        prediction,
        snapshot,
        series: None,
    })
}
