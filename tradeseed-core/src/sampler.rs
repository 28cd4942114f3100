//! Trade sampler: outcome and signed profit for one trade.
//!
//! Outcome probability is fixed per phase. Magnitude is pulled toward the
//! schedule's target curve by a clamped bias factor, so the cumulative
//! curve follows its intended shape without becoming deterministic.

use crate::schedule::PhaseSchedule;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Running state of one archetype run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorState {
    pub cumulative_profit: i64,
    pub win_streak: u32,
    pub loss_streak: u32,
}

impl GeneratorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Book one trade: update the running total and the streak counters.
    pub fn record(&mut self, outcome: Outcome, profit: i64) {
        self.cumulative_profit += profit;
        match outcome {
            Outcome::Win => {
                self.win_streak += 1;
                self.loss_streak = 0;
            }
            Outcome::Loss => {
                self.loss_streak += 1;
                self.win_streak = 0;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

/// What the sampler decided for one trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledTrade {
    pub outcome: Outcome,
    /// Signed profit in whole currency units.
    pub profit: i64,
    pub phase_index: usize,
    /// Interpolated target at this trade's progress ratio.
    pub target: f64,
    /// Target minus the running total before this trade.
    pub bias: f64,
}

/// Sample trade `index` of `total`, updating `state`.
///
/// `total` must be positive; callers iterate `0..total`.
pub fn sample_trade<R: Rng + ?Sized>(
    schedule: &PhaseSchedule,
    index: usize,
    total: usize,
    state: &mut GeneratorState,
    rng: &mut R,
) -> SampledTrade {
    let ratio = index as f64 / total.max(1) as f64;
    let phase_index = schedule.phase_index_at(ratio);
    let phase = &schedule.phases()[phase_index];
    let profile = schedule.profile();

    let target = schedule.target_at(ratio);
    let bias = target - state.cumulative_profit as f64;

    let outcome = if rng.gen::<f64>() < phase.win_probability {
        Outcome::Win
    } else {
        Outcome::Loss
    };

    let profit = match outcome {
        Outcome::Win => {
            let streak = state.win_streak + 1;
            let mut magnitude = phase.win_range.sample(rng);
            if let Some(boost) = &profile.win_streak {
                magnitude *= boost.multiplier(streak);
            }
            if let Some(large) = &phase.large_win {
                magnitude *= large.draw(rng);
            }
            (magnitude * profile.win_bias.factor(bias)) as i64
        }
        Outcome::Loss => {
            let streak = state.loss_streak + 1;
            let mut magnitude = phase.loss_range.sample(rng);
            if let Some(panic) = &profile.loss_streak {
                magnitude *= panic.multiplier(streak);
            }
            if let Some(large) = &phase.large_loss {
                magnitude *= large.draw(rng);
            }
            -((magnitude * profile.loss_bias.factor(bias.abs())) as i64)
        }
    };

    state.record(outcome, profit);

    SampledTrade {
        outcome,
        profit,
        phase_index,
        target,
        bias,
    }
}
