//! TradeRecord: one closed trade in a generated journal.

use super::ids::Ticket;
use super::instrument::Instrument;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trade direction as it appears in broker statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for buy, −1 for sell. Price moves in this direction are profitable.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown trade direction '{0}' (expected buy or sell)")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Direction::Buy),
            "sell" => Ok(Direction::Sell),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// A closed trade: entry, exit, protective levels and cash flows.
///
/// `profit` is in whole currency units. Commission and swap are booked
/// separately, the way broker statements report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub ticket: Ticket,
    pub instrument: Instrument,
    pub direction: Direction,
    pub size: f64,

    // ── Entry ──
    pub open_time: NaiveDateTime,
    pub open_price: f64,

    // ── Exit ──
    pub close_time: NaiveDateTime,
    pub close_price: f64,

    // ── Protective levels ──
    pub stop_loss: f64,
    pub take_profit: f64,

    // ── Cash flows ──
    pub commission: f64,
    pub swap: f64,
    pub profit: i64,

    pub annotation: String,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.profit > 0
    }

    pub fn is_loser(&self) -> bool {
        self.profit < 0
    }

    /// Minutes between open and close.
    pub fn holding_minutes(&self) -> i64 {
        (self.close_time - self.open_time).num_minutes()
    }

    /// Profit including commission and swap.
    pub fn closed_pnl(&self) -> f64 {
        self.profit as f64 + self.commission + self.swap
    }

    pub fn has_annotation(&self) -> bool {
        !self.annotation.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_trade() -> TradeRecord {
        let open = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        TradeRecord {
            ticket: Ticket(101_000_000),
            instrument: Instrument::new("EURUSD"),
            direction: Direction::Buy,
            size: 0.5,
            open_time: open,
            open_price: 1.08512,
            close_time: open + chrono::Duration::minutes(95),
            close_price: 1.08612,
            stop_loss: 1.08212,
            take_profit: 1.08912,
            commission: -12.0,
            swap: 1.5,
            profit: 5_000,
            annotation: String::new(),
        }
    }

    #[test]
    fn holding_minutes_from_timestamps() {
        assert_eq!(sample_trade().holding_minutes(), 95);
    }

    #[test]
    fn closed_pnl_includes_costs() {
        assert!((sample_trade().closed_pnl() - 4_989.5).abs() < 1e-9);
    }

    #[test]
    fn winner_and_loser_flags() {
        let mut t = sample_trade();
        assert!(t.is_winner());
        t.profit = -10;
        assert!(t.is_loser());
        t.profit = 0;
        assert!(!t.is_winner() && !t.is_loser());
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("BUY".parse::<Direction>().unwrap(), Direction::Buy);
        assert_eq!(" sell ".parse::<Direction>().unwrap(), Direction::Sell);
        assert!("hold".parse::<Direction>().is_err());
    }

    #[test]
    fn whitespace_annotation_counts_as_empty() {
        let mut t = sample_trade();
        t.annotation = "   ".into();
        assert!(!t.has_annotation());
        t.annotation = "Breakout".into();
        assert!(t.has_annotation());
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
