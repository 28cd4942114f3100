use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Currency pairs the assembler picks from.
pub const DEFAULT_INSTRUMENTS: [&str; 6] = ["EURUSD", "GBPUSD", "USDJPY", "AUDUSD", "EURJPY", "GBPJPY"];

/// How an instrument is quoted. Yen crosses carry two fewer decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteConvention {
    Yen,
    Standard,
}

impl QuoteConvention {
    /// Decimal places a price is rounded to.
    pub fn price_decimals(self) -> u32 {
        match self {
            QuoteConvention::Yen => 3,
            QuoteConvention::Standard => 5,
        }
    }

    /// Band a synthetic open price is drawn from.
    pub fn open_price_band(self) -> Range<f64> {
        match self {
            QuoteConvention::Yen => 100.0..160.0,
            QuoteConvention::Standard => 0.95..1.50,
        }
    }

    /// Pips moved for a monetary profit at a given position size.
    pub fn pips_for_profit(self, profit: f64, size: f64) -> f64 {
        match self {
            QuoteConvention::Yen => (profit / (size * 100.0)) / 10.0,
            QuoteConvention::Standard => profit / (size * 10_000.0),
        }
    }

    /// Pips per whole price unit.
    pub fn pips_per_unit(self) -> f64 {
        match self {
            QuoteConvention::Yen => 100.0,
            QuoteConvention::Standard => 10_000.0,
        }
    }

    /// Price-unit delta for a monetary profit at a given position size.
    pub fn price_delta(self, profit: f64, size: f64) -> f64 {
        self.pips_for_profit(profit, size) / self.pips_per_unit()
    }

    pub fn round_price(self, price: f64) -> f64 {
        let scale = 10_f64.powi(self.price_decimals() as i32);
        (price * scale).round() / scale
    }
}

/// A traded symbol such as `EURUSD` or `GBPJPY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument {
    symbol: String,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn quote(&self) -> QuoteConvention {
        if self.symbol.contains("JPY") {
            QuoteConvention::Yen
        } else {
            QuoteConvention::Standard
        }
    }

    pub fn price_decimals(&self) -> u32 {
        self.quote().price_decimals()
    }

    pub fn round_price(&self, price: f64) -> f64 {
        self.quote().round_price(price)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yen_crosses_use_three_decimals() {
        assert_eq!(Instrument::new("USDJPY").price_decimals(), 3);
        assert_eq!(Instrument::new("GBPJPY").price_decimals(), 3);
        assert_eq!(Instrument::new("EURUSD").price_decimals(), 5);
    }

    #[test]
    fn rounding_follows_precision() {
        assert_eq!(Instrument::new("USDJPY").round_price(134.56789), 134.568);
        assert_eq!(Instrument::new("EURUSD").round_price(1.123456789), 1.12346);
    }

    #[test]
    fn price_delta_scales_with_quote() {
        // 10_000 profit on 1 lot: yen moves 0.1, standard moves 0.0001
        let yen = QuoteConvention::Yen.price_delta(10_000.0, 1.0);
        let std = QuoteConvention::Standard.price_delta(10_000.0, 1.0);
        assert!((yen - 0.1).abs() < 1e-12);
        assert!((std - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn open_bands_are_plausible() {
        assert_eq!(QuoteConvention::Yen.open_price_band(), 100.0..160.0);
        assert_eq!(QuoteConvention::Standard.open_price_band(), 0.95..1.50);
    }
}
