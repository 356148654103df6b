//! # Session Forecast
//!
//! A Rust library turning daily OHLCV bars into a calibrated next-session
//! directional forecast (Up/Down/Neutral) with a confidence value and an
//! expected magnitude.
//!
//! ## Features
//!
//! - Leakage-free rolling robust normalization (median/MAD with outlier trim)
//! - Exhaustive combo selection over a fixed five-family feature catalog,
//!   validated through decile statistics with a deterministic tie-break
//! - Session score aggregation (Ts) with volume, sentiment and
//!   volatility-regime adjustments, plus intraday-phase smoothing (avgTs)
//! - Two prediction strategies: gated k-nearest-neighbor similarity search
//!   and a calibrated pluggable-combiner score predictor
//!
//! Raw indicator arithmetic, data retrieval and persistence live outside this
//! crate: callers supply bar arrays and aligned indicator series, and every
//! component is a deterministic pure function over them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use session_forecast::data::AuxiliarySeries;
//! use session_forecast::features::RawFeatureSet;
//! use session_forecast::forecast::{run_similarity_forecast, ForecastConfig};
//!
//! # fn main() -> session_forecast::Result<()> {
//! # let bars = session_forecast::utils::generate_test_bars(120, 100.0, 0.1, 1.0, 1);
//! # let features = RawFeatureSet::default();
//! let aux = AuxiliarySeries::empty(bars.len());
//! let config = ForecastConfig::default();
//!
//! let report = run_similarity_forecast(&bars, &features, &aux, None, &config)?;
//! println!("{:?} at {:.0}%", report.prediction.label, report.prediction.confidence * 100.0);
//! # Ok(())
//! # }
//! ```

pub mod combo;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod normalize;
pub mod predictors;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use crate::combo::{select_best_combo, ComboSelection};
pub use crate::data::{DailyBar, Direction, ValidationWindow};
pub use crate::error::{Result, SignalError};
pub use crate::features::{FeatureCatalog, FeatureZPack, RawFeatureSet};
pub use crate::forecast::{
    run_calibrated_forecast, run_similarity_forecast, ForecastConfig, ForecastReport, Snapshot,
};
pub use crate::normalize::robust_z;
pub use crate::predictors::{Prediction, UnavailableReason};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
