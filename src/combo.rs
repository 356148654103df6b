//! Combo selection
//!
//! Exhaustively enumerates every cross-family combination of catalog members,
//! scores each against a validation window with decile statistics, and picks a
//! winner with a deterministic tie-break. Evaluation is columnar: member
//! z-columns are shared across combos and the only per-combo scratch is the
//! composite score buffer.

use crate::data::{direction_of_move, next_day_pct_moves, Direction, ValidationWindow};
use crate::error::{Result, SignalError};
use crate::features::FeatureCatalog;
use crate::utils::finite_or_zero;

/// Number of bins the validation window is partitioned into
pub const DECILE_COUNT: usize = 10;

/// Combos within this many percentage points of the best avgSM enter the
/// dispersion tie-break
pub const TIE_BREAK_TOLERANCE_PCT: f64 = 3.0;

/// The winning combo together with its validation statistics
#[derive(Debug, Clone)]
pub struct ComboSelection {
    /// Member key chosen from each family, in family order
    pub keys: Vec<String>,
    /// Mean per-bin majority fraction, in percent (0-100)
    pub avg_sm: f64,
    /// Mean per-bin next-day move range over majority-direction members
    pub avg_range_pct: f64,
    /// Retained composite score series over all days
    pub score: Vec<f64>,
}

/// Bin sizes for `n` validation samples: `floor(n/10)` in bins 0-8, the
/// remainder absorbed by bin 9
pub fn decile_bin_sizes(n: usize) -> Vec<usize> {
    let base = n / DECILE_COUNT;
    let mut sizes = vec![base; DECILE_COUNT];
    sizes[DECILE_COUNT - 1] = n - base * (DECILE_COUNT - 1);
    sizes
}

struct ComboStats {
    member_idx: Vec<usize>,
    avg_sm: f64,
    avg_range_pct: f64,
}

/// Composite score of one combo at one index: sum of the chosen member
/// z-values, non-finite members contributing zero
fn composite_at(columns: &[Vec<&[f64]>], member_idx: &[usize], t: usize) -> f64 {
    member_idx
        .iter()
        .enumerate()
        .map(|(family, &m)| finite_or_zero(columns[family][m][t]))
        .sum()
}

/// Decile statistics for one combo over the usable validation indices
///
/// `scored` pairs each usable index with its composite score and must already
/// be sorted ascending by score. Returns `(avg_sm, avg_range_pct)` averaged
/// over non-empty bins. Majority ties inside a bin count as Down, matching the
/// vote tie policy.
fn decile_stats(scored: &[(f64, usize)], moves: &[f64]) -> (f64, f64) {
    let sizes = decile_bin_sizes(scored.len());

    let mut sm_sum = 0.0;
    let mut range_sum = 0.0;
    let mut bins_used = 0usize;
    let mut offset = 0usize;

    for size in sizes {
        if size == 0 {
            continue;
        }
        let bin = &scored[offset..offset + size];
        offset += size;

        let mut up = 0usize;
        for &(_, t) in bin {
            if direction_of_move(moves[t]) == Some(Direction::Up) {
                up += 1;
            }
        }
        let down = bin.len() - up;
        let majority = if up > down {
            Direction::Up
        } else {
            Direction::Down
        };
        let majority_count = up.max(down);

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &(_, t) in bin {
            if direction_of_move(moves[t]) == Some(majority) {
                lo = lo.min(moves[t]);
                hi = hi.max(moves[t]);
            }
        }
        let range = if hi >= lo { hi - lo } else { 0.0 };

        sm_sum += majority_count as f64 / bin.len() as f64 * 100.0;
        range_sum += range;
        bins_used += 1;
    }

    if bins_used == 0 {
        (0.0, 0.0)
    } else {
        (
            sm_sum / bins_used as f64,
            range_sum / bins_used as f64,
        )
    }
}

/// Select the best combo over the validation window
///
/// Every combo is ranked by avgSM descending; among combos within
/// [`TIE_BREAK_TOLERANCE_PCT`] points of the best, the one minimizing
/// avgRangePct wins, and any remaining tie falls to the earliest combo in
/// enumeration order. Returns `None` when the window yields no usable index
/// (no combo can be validated), which callers must treat as "prediction
/// unavailable".
pub fn select_best_combo(
    catalog: &FeatureCatalog,
    closes: &[f64],
    window: ValidationWindow,
) -> Result<Option<ComboSelection>> {
    let len = catalog.series_len();
    if closes.len() != len {
        return Err(SignalError::LengthMismatch(format!(
            "Close series has length {} but the catalog covers {} days",
            closes.len(),
            len
        )));
    }
    if catalog.families().iter().any(|f| f.members.is_empty()) {
        return Err(SignalError::InvalidParameter(
            "Every feature family needs at least one member".to_string(),
        ));
    }

    let moves = next_day_pct_moves(closes);
    let usable: Vec<usize> = (window.start..window.end.min(len))
        .filter(|&t| moves[t].is_finite())
        .collect();

    if usable.is_empty() {
        return Ok(None);
    }

    // Columnar member views shared across every combo evaluation.
    let columns: Vec<Vec<&[f64]>> = catalog
        .families()
        .iter()
        .map(|f| f.members.iter().map(|m| m.z.as_slice()).collect())
        .collect();
    let family_sizes: Vec<usize> = columns.iter().map(|c| c.len()).collect();

    let mut all_stats: Vec<ComboStats> = Vec::with_capacity(catalog.combo_count());
    let mut member_idx = vec![0usize; family_sizes.len()];
    let mut scored: Vec<(f64, usize)> = Vec::with_capacity(usable.len());

    loop {
        scored.clear();
        for &t in &usable {
            scored.push((composite_at(&columns, &member_idx, t), t));
        }
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let (avg_sm, avg_range_pct) = decile_stats(&scored, &moves);
        all_stats.push(ComboStats {
            member_idx: member_idx.clone(),
            avg_sm,
            avg_range_pct,
        });

        // Odometer increment over the Cartesian product.
        let mut family = family_sizes.len();
        loop {
            if family == 0 {
                break;
            }
            family -= 1;
            member_idx[family] += 1;
            if member_idx[family] < family_sizes[family] {
                break;
            }
            member_idx[family] = 0;
            if family == 0 {
                break;
            }
        }
        if member_idx.iter().all(|&m| m == 0) {
            break;
        }
    }

    let best_sm = all_stats.iter().map(|s| s.avg_sm).fold(f64::MIN, f64::max);

    let mut winner: Option<&ComboStats> = None;
    for stats in &all_stats {
        if stats.avg_sm < best_sm - TIE_BREAK_TOLERANCE_PCT {
            continue;
        }
        match winner {
            Some(current) if stats.avg_range_pct >= current.avg_range_pct => {}
            _ => winner = Some(stats),
        }
    }
    let winner = winner.expect("at least one combo was evaluated");

    let keys: Vec<String> = catalog
        .families()
        .iter()
        .zip(&winner.member_idx)
        .map(|(family, &m)| family.members[m].key.clone())
        .collect();

    let mut score = Vec::with_capacity(len);
    for t in 0..len {
        score.push(composite_at(&columns, &winner.member_idx, t));
    }

    Ok(Some(ComboSelection {
        keys,
        avg_sm: winner.avg_sm,
        avg_range_pct: winner.avg_range_pct,
        score,
    }))
}
