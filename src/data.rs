//! Daily bar data and label handling for forecasting

use crate::error::{Result, SignalError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Represents one day's OHLCV (Open, High, Low, Close, Volume) record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Date of the data point
    pub date: NaiveDate,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: f64,
}

/// Directional outcome of a session, or the absence of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Next session expected (or observed) higher
    Up,
    /// Next session expected (or observed) lower
    Down,
    /// Score inside the neutral band - no directional call
    Neutral,
    /// No prediction available
    Unknown,
}

/// Validate a bar sequence: non-empty, ascending dates, no duplicates
pub fn validate_bars(bars: &[DailyBar]) -> Result<()> {
    if bars.is_empty() {
        return Err(SignalError::DataError("Empty bar sequence".to_string()));
    }

    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(SignalError::DataError(format!(
                "Bars must be strictly ascending by date: {} followed by {}",
                pair[0].date, pair[1].date
            )));
        }
    }

    Ok(())
}

/// Extract close prices from a bar sequence
pub fn close_prices(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Extract volumes from a bar sequence
pub fn volumes(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}

/// Next-day percentage move per index
///
/// `moves[t] = (close[t+1] - close[t]) / close[t] * 100`. The last index and
/// any index with a non-positive or non-finite close are NaN.
pub fn next_day_pct_moves(closes: &[f64]) -> Vec<f64> {
    let mut moves = vec![f64::NAN; closes.len()];

    for t in 0..closes.len().saturating_sub(1) {
        let today = closes[t];
        let next = closes[t + 1];
        if today.is_finite() && next.is_finite() && today > 0.0 {
            moves[t] = (next - today) / today * 100.0;
        }
    }

    moves
}

/// Direction label for a next-day percentage move
///
/// A zero move counts as Down: the Up rule is strictly `pct > 0`.
pub fn direction_of_move(pct: f64) -> Option<Direction> {
    if !pct.is_finite() {
        return None;
    }

    if pct > 0.0 {
        Some(Direction::Up)
    } else {
        Some(Direction::Down)
    }
}

/// Optional auxiliary series aligned 1:1 with the bar sequence
///
/// Missing series are supplied as all-NaN arrays and contribute zero to every
/// downstream sum; [`AuxiliarySeries::empty`] builds exactly that.
#[derive(Debug, Clone)]
pub struct AuxiliarySeries {
    /// News/social sentiment score per day
    pub sentiment: Vec<f64>,
    /// Implied volatility for the ticker
    pub implied_vol: Vec<f64>,
    /// Market-wide volatility index level
    pub market_vol: Vec<f64>,
    /// Macro-uncertainty index level
    pub macro_uncertainty: Vec<f64>,
    /// Market drawdown index level
    pub drawdown_index: Vec<f64>,
}

impl AuxiliarySeries {
    /// All-NaN auxiliary series for callers without any auxiliary data
    pub fn empty(len: usize) -> Self {
        Self {
            sentiment: vec![f64::NAN; len],
            implied_vol: vec![f64::NAN; len],
            market_vol: vec![f64::NAN; len],
            macro_uncertainty: vec![f64::NAN; len],
            drawdown_index: vec![f64::NAN; len],
        }
    }

    /// Check that every series matches the expected length
    pub fn validate_len(&self, len: usize) -> Result<()> {
        let fields = [
            ("sentiment", self.sentiment.len()),
            ("implied_vol", self.implied_vol.len()),
            ("market_vol", self.market_vol.len()),
            ("macro_uncertainty", self.macro_uncertainty.len()),
            ("drawdown_index", self.drawdown_index.len()),
        ];

        for (name, actual) in fields {
            if actual != len {
                return Err(SignalError::LengthMismatch(format!(
                    "Auxiliary series '{}' has length {} but {} bars were supplied",
                    name, actual, len
                )));
            }
        }

        Ok(())
    }
}

/// Contiguous half-open index range used for combo validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWindow {
    /// First index in the window
    pub start: usize,
    /// One past the last index in the window
    pub end: usize,
}

impl ValidationWindow {
    /// Create a validation window, rejecting inverted ranges
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if end < start {
            return Err(SignalError::InvalidParameter(format!(
                "Validation window end ({}) precedes start ({})",
                end, start
            )));
        }

        Ok(Self { start, end })
    }

    /// Number of indices covered by the window
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the window covers no indices
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
