//! Dataset metrics: pure functions over a generated trade log.
//!
//! Every metric is a pure function: trade list in, scalar or breakdown out.
//! Curve metrics walk the trades in file order, which is generation order.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use tradeseed_core::domain::TradeRecord;

/// Aggregate statistics for one trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub break_even: usize,
    pub win_rate: f64,
    pub profit_factor: f64,

    pub total_profit: i64,
    pub total_swap: f64,
    pub swap_received: f64,
    pub swap_paid: f64,
    pub total_commission: f64,
    /// Profit plus swap plus commission.
    pub closed_pnl: f64,

    pub final_cumulative: i64,
    pub peak_cumulative: i64,
    /// Largest peak-to-trough fall of the cumulative profit curve, in
    /// currency units (zero or positive).
    pub max_drawdown: i64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,

    pub weekend_trades: usize,
    pub by_instrument: BTreeMap<String, usize>,
    /// Keyed `YYYY-MM` by open time.
    pub by_month: BTreeMap<String, usize>,
}

impl DatasetSummary {
    pub fn compute(trades: &[TradeRecord]) -> Self {
        let curve = cumulative_curve(trades);
        let total_profit: i64 = trades.iter().map(|t| t.profit).sum();
        let total_swap: f64 = trades.iter().map(|t| t.swap).sum();
        let total_commission: f64 = trades.iter().map(|t| t.commission).sum();

        Self {
            trade_count: trades.len(),
            wins: trades.iter().filter(|t| t.is_winner()).count(),
            losses: trades.iter().filter(|t| t.is_loser()).count(),
            break_even: trades.iter().filter(|t| t.profit == 0).count(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            total_profit,
            total_swap,
            swap_received: trades.iter().filter(|t| t.swap > 0.0).map(|t| t.swap).sum(),
            swap_paid: trades.iter().filter(|t| t.swap < 0.0).map(|t| -t.swap).sum(),
            total_commission,
            closed_pnl: total_profit as f64 + total_swap + total_commission,
            final_cumulative: curve.last().copied().unwrap_or(0),
            peak_cumulative: curve.iter().copied().max().unwrap_or(0).max(0),
            max_drawdown: max_drawdown(&curve),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
            weekend_trades: weekend_trades(trades),
            by_instrument: count_by(trades, |t| t.instrument.symbol().to_string()),
            by_month: count_by(trades, |t| t.open_time.format("%Y-%m").to_string()),
        }
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  trades:        {}", self.trade_count)?;
        writeln!(
            f,
            "  wins/losses:   {} / {} ({} break-even)",
            self.wins, self.losses, self.break_even
        )?;
        writeln!(f, "  win rate:      {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "  profit factor: {:.2}", self.profit_factor)?;
        writeln!(f, "  total profit:  {}", self.total_profit)?;
        writeln!(
            f,
            "  swap:          {:.1} (+{:.1} / -{:.1})",
            self.total_swap, self.swap_received, self.swap_paid
        )?;
        writeln!(f, "  commission:    {:.1}", self.total_commission)?;
        writeln!(f, "  closed P&L:    {:.1}", self.closed_pnl)?;
        writeln!(
            f,
            "  curve:         final {}, peak {}, max drawdown {}",
            self.final_cumulative, self.peak_cumulative, self.max_drawdown
        )?;
        writeln!(
            f,
            "  streaks:       {} wins, {} losses",
            self.max_consecutive_wins, self.max_consecutive_losses
        )?;
        writeln!(f, "  weekend opens: {}", self.weekend_trades)?;
        writeln!(f, "  by instrument:")?;
        for (symbol, count) in &self.by_instrument {
            writeln!(f, "    {symbol}: {count}")?;
        }
        write!(f, "  months covered: {}", self.by_month.len())
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Running total of `profit` after each trade.
pub fn cumulative_curve(trades: &[TradeRecord]) -> Vec<i64> {
    trades
        .iter()
        .scan(0i64, |total, t| {
            *total += t.profit;
            Some(*total)
        })
        .collect()
}

/// Largest drop from a running peak. The curve starts from an implicit 0.
pub fn max_drawdown(curve: &[i64]) -> i64 {
    let mut peak = 0i64;
    let mut max_dd = 0i64;
    for &value in curve {
        peak = peak.max(value);
        max_dd = max_dd.max(peak - value);
    }
    max_dd
}

/// Fraction of trades with positive profit.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Gross profit / gross loss. Capped at 100.0 when there are no losses.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: i64 = trades.iter().filter(|t| t.profit > 0).map(|t| t.profit).sum();
    let gross_loss: i64 = trades.iter().filter(|t| t.profit < 0).map(|t| -t.profit).sum();
    if gross_loss == 0 {
        return if gross_profit > 0 { 100.0 } else { 0.0 };
    }
    (gross_profit as f64 / gross_loss as f64).min(100.0)
}

/// Longest run of winners (`winners = true`) or losers. Break-even trades
/// end both kinds of run.
pub fn max_consecutive(trades: &[TradeRecord], winners: bool) -> usize {
    let mut max = 0;
    let mut current = 0;
    for t in trades {
        let hit = if winners { t.is_winner() } else { t.is_loser() };
        if hit {
            current += 1;
            max = max.max(current);
        } else {
            current = 0;
        }
    }
    max
}

/// Trades opened on a Saturday or Sunday.
pub fn weekend_trades(trades: &[TradeRecord]) -> usize {
    trades
        .iter()
        .filter(|t| matches!(t.open_time.weekday(), Weekday::Sat | Weekday::Sun))
        .count()
}

fn count_by<F>(trades: &[TradeRecord], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&TradeRecord) -> String,
{
    let mut counts = BTreeMap::new();
    for t in trades {
        *counts.entry(key(t)).or_default() += 1;
    }
    counts
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn drawdown_bounded_by_curve_range(profits in prop::collection::vec(-50_000i64..50_000, 0..200)) {
            let curve: Vec<i64> = profits
                .iter()
                .scan(0i64, |total, p| {
                    *total += p;
                    Some(*total)
                })
                .collect();
            let dd = max_drawdown(&curve);
            prop_assert!(dd >= 0);
            let peak = curve.iter().copied().max().unwrap_or(0).max(0);
            let trough = curve.iter().copied().min().unwrap_or(0).min(0);
            prop_assert!(dd <= peak - trough);
            if let Some(&last) = curve.last() {
                prop_assert_eq!(last, profits.iter().sum::<i64>());
            }
        }
    }
}
