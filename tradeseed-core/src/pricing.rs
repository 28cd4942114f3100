//! Price synthesis: turn a monetary profit into a plausible price quadruple.
//!
//! Prices are illustrative, not market-realistic. The only promises are that
//! the close sits on the profitable side of the open exactly when the profit
//! is positive (up to rounding), and that stop-loss and take-profit bracket
//! the open on the correct sides for the direction.

use crate::domain::{Direction, Instrument};
use crate::schedule::RiskReward;
use rand::Rng;

/// Open, close and protective levels for one trade, already rounded to the
/// instrument's precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub open: f64,
    pub close: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

pub fn synthesize_prices<R: Rng + ?Sized>(
    profit: i64,
    size: f64,
    instrument: &Instrument,
    direction: Direction,
    risk_reward: &RiskReward,
    rng: &mut R,
) -> PriceQuote {
    let quote = instrument.quote();
    let open = quote.round_price(rng.gen_range(quote.open_price_band()));
    let delta = quote.price_delta(profit as f64, size);
    let sign = direction.sign();

    PriceQuote {
        open,
        close: quote.round_price(open + sign * delta),
        stop_loss: quote.round_price(open - sign * risk_reward.stop_offset),
        take_profit: quote.round_price(open + sign * risk_reward.take_offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const RR: RiskReward = RiskReward {
        stop_offset: 0.003,
        take_offset: 0.004,
    };

    #[test]
    fn buy_levels_bracket_open() {
        let mut rng = StdRng::seed_from_u64(5);
        let q = synthesize_prices(5_000, 1.0, &Instrument::new("EURUSD"), Direction::Buy, &RR, &mut rng);
        assert!(q.stop_loss < q.open && q.open < q.take_profit);
        assert!((q.open - q.stop_loss - 0.003).abs() < 1e-9);
        assert!((q.take_profit - q.open - 0.004).abs() < 1e-9);
        assert!((0.95..1.50).contains(&q.open));
    }

    #[test]
    fn sell_levels_mirror() {
        let mut rng = StdRng::seed_from_u64(5);
        let q = synthesize_prices(5_000, 1.0, &Instrument::new("GBPJPY"), Direction::Sell, &RR, &mut rng);
        assert!(q.take_profit < q.open && q.open < q.stop_loss);
        assert!((100.0..=160.0).contains(&q.open));
    }

    #[test]
    fn close_moves_with_profit_sign() {
        let mut rng = StdRng::seed_from_u64(11);
        // 50_000 on 0.5 lot of a yen cross: 1 price unit
        let buy_win = synthesize_prices(50_000, 0.5, &Instrument::new("USDJPY"), Direction::Buy, &RR, &mut rng);
        assert!((buy_win.close - buy_win.open - 1.0).abs() < 1e-6);

        let sell_win = synthesize_prices(50_000, 0.5, &Instrument::new("USDJPY"), Direction::Sell, &RR, &mut rng);
        assert!((sell_win.open - sell_win.close - 1.0).abs() < 1e-6);

        let buy_loss = synthesize_prices(-500_000, 1.0, &Instrument::new("EURUSD"), Direction::Buy, &RR, &mut rng);
        assert!(buy_loss.close < buy_loss.open);
    }

    #[test]
    fn prices_rounded_to_instrument_precision() {
        let mut rng = StdRng::seed_from_u64(3);
        for symbol in ["EURUSD", "EURJPY"] {
            let instrument = Instrument::new(symbol);
            let q = synthesize_prices(12_345, 0.3, &instrument, Direction::Buy, &RR, &mut rng);
            for price in [q.open, q.close, q.stop_loss, q.take_profit] {
                assert_eq!(instrument.round_price(price), price);
            }
        }
    }
}
