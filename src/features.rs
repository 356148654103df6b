//! Feature family catalog
//!
//! A fixed taxonomy of five feature families whose members are mutually
//! substitutable indicator series. Raw indicator arithmetic lives outside this
//! crate; callers supply each series aligned 1:1 with the bar sequence and the
//! catalog normalizes them through [`robust_z`](crate::normalize::robust_z).
//!
//! Family sizes are 6/4/3/3/2, giving a combo space of 432 when one member is
//! chosen per family.

use crate::error::{Result, SignalError};
use crate::normalize::robust_z;

/// Raw indicator series supplied by the caller, one per catalog member
///
/// Undefined warm-up values should be NaN. Every series must match the bar
/// count exactly.
#[derive(Debug, Clone, Default)]
pub struct RawFeatureSet {
    // Momentum family
    /// Relative strength index
    pub rsi: Vec<f64>,
    /// MACD histogram
    pub macd_hist: Vec<f64>,
    /// Stochastic %K
    pub stochastic_k: Vec<f64>,
    /// Rate of change
    pub rate_of_change: Vec<f64>,
    /// Commodity channel index
    pub cci: Vec<f64>,
    /// Williams %R
    pub williams_r: Vec<f64>,

    // Trend family
    /// Close distance from its simple moving average, percent
    pub sma_gap_pct: Vec<f64>,
    /// Close distance from its exponential moving average, percent
    pub ema_gap_pct: Vec<f64>,
    /// Average directional index
    pub adx: Vec<f64>,
    /// Regression slope of recent closes
    pub trend_slope: Vec<f64>,

    // Volatility family
    /// Average true range as a percent of close
    pub atr_pct: Vec<f64>,
    /// Bollinger band width
    pub bollinger_width: Vec<f64>,
    /// Realized (close-to-close) volatility
    pub realized_vol: Vec<f64>,

    // Volume family
    /// Volume relative to its recent average
    pub volume_ratio: Vec<f64>,
    /// On-balance volume
    pub on_balance_volume: Vec<f64>,
    /// Money flow index
    pub money_flow_index: Vec<f64>,

    // Sentiment family
    /// News/social sentiment score
    pub sentiment: Vec<f64>,
    /// Drawdown index
    pub drawdown_index: Vec<f64>,
}

impl RawFeatureSet {
    fn members(&self) -> Vec<(&'static str, &'static str, &[f64])> {
        vec![
            ("momentum", "rsi", &self.rsi),
            ("momentum", "macd_hist", &self.macd_hist),
            ("momentum", "stochastic_k", &self.stochastic_k),
            ("momentum", "rate_of_change", &self.rate_of_change),
            ("momentum", "cci", &self.cci),
            ("momentum", "williams_r", &self.williams_r),
            ("trend", "sma_gap_pct", &self.sma_gap_pct),
            ("trend", "ema_gap_pct", &self.ema_gap_pct),
            ("trend", "adx", &self.adx),
            ("trend", "trend_slope", &self.trend_slope),
            ("volatility", "atr_pct", &self.atr_pct),
            ("volatility", "bollinger_width", &self.bollinger_width),
            ("volatility", "realized_vol", &self.realized_vol),
            ("volume", "volume_ratio", &self.volume_ratio),
            ("volume", "on_balance_volume", &self.on_balance_volume),
            ("volume", "money_flow_index", &self.money_flow_index),
            ("sentiment", "sentiment", &self.sentiment),
            ("sentiment", "drawdown_index", &self.drawdown_index),
        ]
    }

    /// Check that every series matches the expected length
    pub fn validate_len(&self, len: usize) -> Result<()> {
        for (_, key, series) in self.members() {
            if series.len() != len {
                return Err(SignalError::LengthMismatch(format!(
                    "Feature series '{}' has length {} but {} bars were supplied",
                    key,
                    series.len(),
                    len
                )));
            }
        }

        Ok(())
    }
}

/// One normalized catalog member
#[derive(Debug, Clone)]
pub struct FeatureMember {
    /// Member key, unique across the catalog
    pub key: String,
    /// Robust z-series for the member
    pub z: Vec<f64>,
}

/// A named group of mutually substitutable members
#[derive(Debug, Clone)]
pub struct FeatureFamily {
    /// Family name
    pub name: String,
    /// Members, in fixed catalog order
    pub members: Vec<FeatureMember>,
}

/// Normalized feature catalog consumed by combo selection and the combiners
#[derive(Debug, Clone)]
pub struct FeatureCatalog {
    families: Vec<FeatureFamily>,
    series_len: usize,
}

impl FeatureCatalog {
    /// Build a catalog from already-normalized families
    ///
    /// For callers that run their own normalization. Every member series must
    /// match `series_len` and every family needs at least one member.
    pub fn new(families: Vec<FeatureFamily>, series_len: usize) -> Result<Self> {
        if families.is_empty() {
            return Err(SignalError::InvalidParameter(
                "Catalog needs at least one family".to_string(),
            ));
        }

        for family in &families {
            if family.members.is_empty() {
                return Err(SignalError::InvalidParameter(format!(
                    "Feature family '{}' has no members",
                    family.name
                )));
            }
            for member in &family.members {
                if member.z.len() != series_len {
                    return Err(SignalError::LengthMismatch(format!(
                        "Member '{}' has length {} but the catalog covers {} days",
                        member.key,
                        member.z.len(),
                        series_len
                    )));
                }
            }
        }

        Ok(Self {
            families,
            series_len,
        })
    }

    /// Build the catalog by robust-normalizing every raw member
    pub fn from_raw(raw: &RawFeatureSet, series_len: usize, lookback: usize) -> Result<Self> {
        raw.validate_len(series_len)?;

        let mut families: Vec<FeatureFamily> = Vec::new();

        for (family_name, key, series) in raw.members() {
            let member = FeatureMember {
                key: key.to_string(),
                z: robust_z(series, lookback)?,
            };

            match families.iter_mut().find(|f| f.name == family_name) {
                Some(family) => family.members.push(member),
                None => families.push(FeatureFamily {
                    name: family_name.to_string(),
                    members: vec![member],
                }),
            }
        }

        Ok(Self {
            families,
            series_len,
        })
    }

    /// Families in fixed catalog order
    pub fn families(&self) -> &[FeatureFamily] {
        &self.families
    }

    /// Length of every member series
    pub fn series_len(&self) -> usize {
        self.series_len
    }

    /// Size of the combo space (product of family sizes)
    pub fn combo_count(&self) -> usize {
        self.families.iter().map(|f| f.members.len()).product()
    }

    /// Flatten the catalog into a named z-column pack for combiners
    pub fn z_pack(&self) -> FeatureZPack {
        let mut pack = FeatureZPack {
            names: Vec::new(),
            columns: Vec::new(),
            len: self.series_len,
        };

        for family in &self.families {
            for member in &family.members {
                pack.names.push(member.key.clone());
                pack.columns.push(member.z.clone());
            }
        }

        pack
    }
}

/// Named z-feature columns consumed by pluggable combiners
#[derive(Debug, Clone)]
pub struct FeatureZPack {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    len: usize,
}

impl FeatureZPack {
    /// Column for a member key, if present
    pub fn column(&self, key: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == key)
            .map(|i| self.columns[i].as_slice())
    }

    /// Z value for a member key at index `t`; NaN for unknown keys or
    /// out-of-range indices
    pub fn value(&self, key: &str, t: usize) -> f64 {
        match self.column(key) {
            Some(col) if t < col.len() => col[t],
            _ => f64::NAN,
        }
    }

    /// Member keys in catalog order
    pub fn keys(&self) -> &[String] {
        &self.names
    }

    /// Length of every column
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the pack covers no days
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_set(len: usize) -> RawFeatureSet {
        let ramp: Vec<f64> = (0..len).map(|i| i as f64).collect();
        RawFeatureSet {
            rsi: ramp.clone(),
            macd_hist: ramp.clone(),
            stochastic_k: ramp.clone(),
            rate_of_change: ramp.clone(),
            cci: ramp.clone(),
            williams_r: ramp.clone(),
            sma_gap_pct: ramp.clone(),
            ema_gap_pct: ramp.clone(),
            adx: ramp.clone(),
            trend_slope: ramp.clone(),
            atr_pct: ramp.clone(),
            bollinger_width: ramp.clone(),
            realized_vol: ramp.clone(),
            volume_ratio: ramp.clone(),
            on_balance_volume: ramp.clone(),
            money_flow_index: ramp.clone(),
            sentiment: ramp.clone(),
            drawdown_index: ramp,
        }
    }

    #[test]
    fn catalog_has_five_families_and_432_combos() {
        let catalog = FeatureCatalog::from_raw(&raw_set(60), 60, 20).unwrap();
        let sizes: Vec<usize> = catalog.families().iter().map(|f| f.members.len()).collect();
        assert_eq!(sizes, vec![6, 4, 3, 3, 2]);
        assert_eq!(catalog.combo_count(), 432);
    }

    #[test]
    fn mismatched_series_length_is_rejected() {
        let mut raw = raw_set(60);
        raw.adx.pop();
        assert!(FeatureCatalog::from_raw(&raw, 60, 20).is_err());
    }

    #[test]
    fn z_pack_exposes_all_members() {
        let catalog = FeatureCatalog::from_raw(&raw_set(60), 60, 20).unwrap();
        let pack = catalog.z_pack();
        assert_eq!(pack.keys().len(), 18);
        assert!(pack.column("rsi").is_some());
        assert!(pack.value("no_such_key", 0).is_nan());
    }
}
