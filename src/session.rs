//! Session score aggregation
//!
//! Folds the winning combo's composite score with volume, sentiment and
//! volatility-regime adjustments into one daily number (Ts), then smooths it
//! across intraday session phases (avgTs).

use crate::error::{Result, SignalError};
use crate::utils::{finite_or_zero, mean_finite, trailing_average};

/// Window for the trailing averages behind the deviation terms
pub const TRAILING_WINDOW: usize = 20;

/// Percentage deviation of `x` from `avg`
///
/// Returns 0.0 when `avg` is zero or either input is non-finite, guarding
/// against blow-ups from degenerate averages.
pub fn comp_percent(x: f64, avg: f64) -> f64 {
    if !x.is_finite() || !avg.is_finite() || avg == 0.0 {
        return 0.0;
    }

    (x - avg) / avg * 100.0
}

/// Like [`comp_percent`] but NaN when undefined, so missing components can be
/// skipped instead of dragged toward zero
fn deviation_pct(x: f64, avg: f64) -> f64 {
    if !x.is_finite() || !avg.is_finite() || avg == 0.0 {
        return f64::NAN;
    }

    (x - avg) / avg * 100.0
}

/// One condition of a bucket decision table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BucketRule {
    /// Matches deviations at most the bound (inclusive)
    AtMost(f64),
    /// Matches deviations strictly below the bound
    Below(f64),
}

impl BucketRule {
    fn matches(&self, deviation: f64) -> bool {
        match *self {
            BucketRule::AtMost(bound) => deviation <= bound,
            BucketRule::Below(bound) => deviation < bound,
        }
    }
}

/// Ordered decision table mapping a volatility deviation percent to an
/// ordinal regime score
///
/// Rules are evaluated top to bottom and the first match wins; anything past
/// the last rule takes the default score. Calmer-than-normal regimes are
/// rewarded, more volatile ones penalized. Non-finite deviations score 0.
#[derive(Debug, Clone, Copy)]
pub struct BucketTable {
    rules: &'static [(BucketRule, f64)],
    default_score: f64,
}

impl BucketTable {
    /// Score a deviation percent through the table
    pub fn score(&self, deviation: f64) -> f64 {
        if !deviation.is_finite() {
            return 0.0;
        }

        for (rule, score) in self.rules {
            if rule.matches(deviation) {
                return *score;
            }
        }

        self.default_score
    }
}

/// Regime table for the ticker's own volatility composite
pub const TICKER_VOL_BUCKETS: BucketTable = BucketTable {
    rules: &[
        (BucketRule::AtMost(-30.0), 3.0),
        (BucketRule::AtMost(-15.0), 2.0),
        (BucketRule::Below(15.0), 1.0),
        (BucketRule::Below(30.0), 0.0),
    ],
    default_score: -1.0,
};

/// Regime table for the market-wide volatility composite
pub const MARKET_VOL_BUCKETS: BucketTable = BucketTable {
    rules: &[
        (BucketRule::AtMost(-20.0), 3.0),
        (BucketRule::AtMost(-10.0), 2.0),
        (BucketRule::Below(10.0), 1.0),
        (BucketRule::Below(20.0), 0.0),
    ],
    default_score: -1.0,
};

/// Composite volatility deviation: per-component trailing deviation percent,
/// averaged over the components that are defined on each day
///
/// Days where no component is defined stay NaN, which the bucket tables score
/// as zero contribution.
pub fn volatility_composite(components: &[&[f64]], len: usize) -> Result<Vec<f64>> {
    for (i, component) in components.iter().enumerate() {
        if component.len() != len {
            return Err(SignalError::LengthMismatch(format!(
                "Volatility component {} has length {} but {} days were supplied",
                i,
                component.len(),
                len
            )));
        }
    }

    let averages: Vec<Vec<f64>> = components
        .iter()
        .map(|c| trailing_average(c, TRAILING_WINDOW))
        .collect();

    let mut composite = Vec::with_capacity(len);
    let mut deviations = Vec::with_capacity(components.len());

    for t in 0..len {
        deviations.clear();
        for (component, avg) in components.iter().zip(&averages) {
            deviations.push(deviation_pct(component[t], avg[t]));
        }
        composite.push(mean_finite(&deviations));
    }

    Ok(composite)
}

/// Per-day adjustment terms entering the session score
#[derive(Debug, Clone)]
pub struct SessionComponents {
    /// Volume deviation from its trailing average, percent
    pub comp_vol_pct: Vec<f64>,
    /// Sentiment deviation from its trailing average, percent
    pub comp_sent_pct: Vec<f64>,
    /// Ticker volatility composite deviation, percent (NaN when undefined)
    pub ticker_vol_comp: Vec<f64>,
    /// Market volatility composite deviation, percent (NaN when undefined)
    pub market_vol_comp: Vec<f64>,
}

impl SessionComponents {
    /// Build the adjustment terms from raw volume/sentiment series and the
    /// grouped volatility components
    pub fn build(
        volume: &[f64],
        sentiment: &[f64],
        ticker_vol_components: &[&[f64]],
        market_vol_components: &[&[f64]],
    ) -> Result<Self> {
        let len = volume.len();
        if sentiment.len() != len {
            return Err(SignalError::LengthMismatch(format!(
                "Sentiment series has length {} but volume covers {} days",
                sentiment.len(),
                len
            )));
        }

        let vol_avg = trailing_average(volume, TRAILING_WINDOW);
        let sent_avg = trailing_average(sentiment, TRAILING_WINDOW);

        let comp_vol_pct = volume
            .iter()
            .zip(&vol_avg)
            .map(|(&v, &a)| comp_percent(v, a))
            .collect();
        let comp_sent_pct = sentiment
            .iter()
            .zip(&sent_avg)
            .map(|(&s, &a)| comp_percent(s, a))
            .collect();

        Ok(Self {
            comp_vol_pct,
            comp_sent_pct,
            ticker_vol_comp: volatility_composite(ticker_vol_components, len)?,
            market_vol_comp: volatility_composite(market_vol_components, len)?,
        })
    }

    fn validate_len(&self, len: usize) -> Result<()> {
        if self.comp_vol_pct.len() != len
            || self.comp_sent_pct.len() != len
            || self.ticker_vol_comp.len() != len
            || self.market_vol_comp.len() != len
        {
            return Err(SignalError::LengthMismatch(
                "Session components must match the score series length".to_string(),
            ));
        }
        Ok(())
    }
}

/// Daily session score
///
/// `Ts[t] = S[t] + compVolPct[t] + compSentPct[t] + bucket(tickerVolComp[t]) +
/// bucket(marketVolComp[t])`. Undefined terms contribute exactly zero.
pub fn build_session_scores(score: &[f64], components: &SessionComponents) -> Result<Vec<f64>> {
    components.validate_len(score.len())?;

    let ts = (0..score.len())
        .map(|t| {
            finite_or_zero(score[t])
                + components.comp_vol_pct[t]
                + components.comp_sent_pct[t]
                + TICKER_VOL_BUCKETS.score(components.ticker_vol_comp[t])
                + MARKET_VOL_BUCKETS.score(components.market_vol_comp[t])
        })
        .collect();

    Ok(ts)
}

/// Which phase set the smoothing average draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SmoothingMode {
    /// Market hours: open/close of today plus yesterday's phases (5 terms)
    During,
    /// After the close: yesterday's phases plus today's close (4 terms)
    After,
}

/// Session-phase samples of the score for one calendar day
///
/// NaN marks an unavailable phase; [`PhaseSamples::missing`] marks a day the
/// intraday segmenter produced nothing for.
#[derive(Debug, Clone, Copy)]
pub struct PhaseSamples {
    /// After-hours sample
    pub after_hours: f64,
    /// Market-open sample
    pub market_open: f64,
    /// Market-close sample
    pub market_close: f64,
    /// Close sample
    pub close: f64,
}

impl PhaseSamples {
    /// A day with no phase data at all
    pub fn missing() -> Self {
        Self {
            after_hours: f64::NAN,
            market_open: f64::NAN,
            market_close: f64::NAN,
            close: f64::NAN,
        }
    }
}

/// Smooth daily session scores across intraday phases
///
/// For each day the average draws on the current and previous day's phase
/// samples per the mode, using only the finite terms present. Days with no
/// finite phase term fall back to the unsmoothed Ts value.
pub fn smooth_session_scores(
    ts: &[f64],
    phases: &[PhaseSamples],
    mode: SmoothingMode,
) -> Result<Vec<f64>> {
    if phases.len() != ts.len() {
        return Err(SignalError::LengthMismatch(format!(
            "Phase samples cover {} days but the score series covers {}",
            phases.len(),
            ts.len()
        )));
    }

    let mut avg_ts = Vec::with_capacity(ts.len());

    for d in 0..ts.len() {
        let today = phases[d];
        let prev = if d > 0 {
            phases[d - 1]
        } else {
            PhaseSamples::missing()
        };

        let terms = match mode {
            SmoothingMode::During => vec![
                today.market_open,
                prev.market_close,
                prev.after_hours,
                prev.market_open,
                today.close,
            ],
            SmoothingMode::After => vec![
                prev.market_close,
                prev.after_hours,
                prev.market_open,
                today.close,
            ],
        };

        let smoothed = mean_finite(&terms);
        avg_ts.push(if smoothed.is_finite() { smoothed } else { ts[d] });
    }

    Ok(avg_ts)
}
