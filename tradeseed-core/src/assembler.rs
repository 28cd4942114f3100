//! Record assembly: attributes drawn independently of the equity curve.
//!
//! Instrument, direction, size and timestamps are drawn before the sampler
//! runs, so revenge sizing sees the loss streak as it stood before the
//! trade. Commission and swap are drawn after pricing.

use crate::domain::{Direction, Instrument, Ticket, TradeRecord, DEFAULT_INSTRUMENTS};
use crate::pricing::PriceQuote;
use crate::sampler::GeneratorState;
use crate::schedule::ArchetypeProfile;
use chrono::{Duration, NaiveDateTime, SubsecRound};
use rand::seq::SliceRandom;
use rand::Rng;

pub const TICKET_BASE: u64 = 101_000_000;

/// Days of history the open timestamps are spread over.
pub const HISTORY_WINDOW_DAYS: i64 = 1095;

pub const POSITION_SIZES: [f64; 4] = [0.30, 0.50, 1.00, 2.00];

pub const COMMISSION: f64 = -12.0;
pub const COMMISSION_PROBABILITY: f64 = 0.3;

/// Swap is drawn from `[-SWAP_LIMIT, SWAP_LIMIT]`.
pub const SWAP_LIMIT: f64 = 10.0;

pub const MIN_HOLD_MINUTES: i64 = 30;
pub const MAX_HOLD_MINUTES: i64 = 300;

/// Everything about a trade that does not depend on its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeAttributes {
    pub instrument: Instrument,
    pub direction: Direction,
    pub size: f64,
    pub open_time: NaiveDateTime,
    pub close_time: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Costs {
    pub commission: f64,
    pub swap: f64,
}

#[derive(Debug, Clone)]
pub struct RecordAssembler {
    anchor: NaiveDateTime,
    instruments: Vec<Instrument>,
}

impl RecordAssembler {
    /// `anchor` is the generation time; sub-second precision is dropped.
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self {
            anchor: anchor.trunc_subsecs(0),
            instruments: DEFAULT_INSTRUMENTS.iter().map(|s| Instrument::new(*s)).collect(),
        }
    }

    pub fn anchor(&self) -> NaiveDateTime {
        self.anchor
    }

    /// Earliest possible open time.
    pub fn window_start(&self) -> NaiveDateTime {
        self.anchor - Duration::days(HISTORY_WINDOW_DAYS)
    }

    pub fn draw_attributes<R: Rng + ?Sized>(
        &self,
        profile: &ArchetypeProfile,
        state: &GeneratorState,
        rng: &mut R,
    ) -> TradeAttributes {
        let index = rng.gen_range(0..self.instruments.len());
        let instrument = self.instruments[index].clone();
        let direction = if rng.gen_bool(0.5) {
            Direction::Buy
        } else {
            Direction::Sell
        };

        let sizes: &[f64] = match &profile.revenge_sizing {
            Some(revenge) if revenge.active(state.loss_streak) => &revenge.sizes,
            _ => &POSITION_SIZES,
        };
        let size = sizes.choose(rng).copied().unwrap_or(POSITION_SIZES[0]);

        let open_time = self.window_start()
            + Duration::days(rng.gen_range(0..HISTORY_WINDOW_DAYS))
            + Duration::hours(rng.gen_range(0..24))
            + Duration::minutes(rng.gen_range(0..60));
        let close_time =
            open_time + Duration::minutes(rng.gen_range(MIN_HOLD_MINUTES..=MAX_HOLD_MINUTES));

        TradeAttributes {
            instrument,
            direction,
            size,
            open_time,
            close_time,
        }
    }

    pub fn draw_costs<R: Rng + ?Sized>(&self, rng: &mut R) -> Costs {
        let commission = if rng.gen::<f64>() < COMMISSION_PROBABILITY {
            COMMISSION
        } else {
            0.0
        };
        let swap = (rng.gen_range(-SWAP_LIMIT..=SWAP_LIMIT) * 10.0).round() / 10.0;
        Costs { commission, swap }
    }

    pub fn assemble(
        &self,
        index: usize,
        attributes: TradeAttributes,
        profit: i64,
        quote: PriceQuote,
        costs: Costs,
    ) -> TradeRecord {
        TradeRecord {
            ticket: Ticket::from_index(TICKET_BASE, index),
            instrument: attributes.instrument,
            direction: attributes.direction,
            size: attributes.size,
            open_time: attributes.open_time,
            open_price: quote.open,
            close_time: attributes.close_time,
            close_price: quote.close,
            stop_loss: quote.stop_loss,
            take_profit: quote.take_profit,
            commission: costs.commission,
            swap: costs.swap,
            profit,
            annotation: String::new(),
        }
    }
}
