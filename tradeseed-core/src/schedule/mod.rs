//! Phase schedules: declarative description of an archetype's equity curve.
//!
//! A schedule splits the run into contiguous progress-ratio intervals
//! covering `[0, 1)`. Each phase carries the cumulative profit the curve
//! should reach at its end, a fixed win probability, and the magnitude
//! ranges the sampler draws from. Targets are interpolated linearly from
//! the previous phase's target (zero before the first phase).
//!
//! Profiles are plain data: they deserialize from TOML and are validated
//! once, when a [`PhaseSchedule`] is built. The generator only accepts
//! validated schedules.

pub mod presets;

pub use presets::Archetype;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Tolerance used when checking that phase boundaries line up.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Errors rejected at schedule construction time.
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("schedule has no phases")]
    Empty,

    #[error("first phase starts at {start}, expected 0")]
    StartNotZero { start: f64 },

    #[error("last phase ends at {end}, expected 1")]
    EndNotOne { end: f64 },

    #[error("phase {index} has an empty or inverted interval [{start}, {end})")]
    EmptyInterval { index: usize, start: f64, end: f64 },

    #[error("gap between phase {index} (ends {prev_end}) and the next (starts {start})")]
    Gap { index: usize, prev_end: f64, start: f64 },

    #[error("phase {index} (ends {prev_end}) overlaps the next (starts {start})")]
    Overlap { index: usize, prev_end: f64, start: f64 },

    #[error("{field} must be a probability in [0, 1], got {value}")]
    Probability { field: String, value: f64 },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: String, value: f64 },

    #[error("{field} range is invalid: min {min}, max {max}")]
    InvalidRange { field: String, min: f64, max: f64 },

    #[error("{field} bias band is invalid: normalizer {normalizer}, min {min}, max {max}")]
    InvalidBiasBand {
        field: String,
        normalizer: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: String, value: f64 },

    #[error("revenge sizing needs at least one position size")]
    EmptyRevengeSizes,

    #[error("parse profile TOML: {0}")]
    Toml(String),

    #[error("read profile file: {0}")]
    Io(String),
}

// ── Building blocks ─────────────────────────────────────────────────

/// Closed-open uniform range `[min, max)`. A degenerate range yields `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformRange {
    pub min: f64,
    pub max: f64,
}

impl UniformRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    fn validate(&self, field: &str, floor: f64) -> Result<(), ScheduleError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min < floor || self.min > self.max
        {
            return Err(ScheduleError::InvalidRange {
                field: field.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Occasional outsized move: with `probability`, multiply the magnitude by
/// a factor drawn from `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LargeMove {
    pub probability: f64,
    pub multiplier: UniformRange,
}

impl LargeMove {
    /// Multiplier for one trade (1.0 when the move does not trigger).
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if rng.gen::<f64>() < self.probability {
            self.multiplier.sample(rng)
        } else {
            1.0
        }
    }

    fn validate(&self, field: &str) -> Result<(), ScheduleError> {
        check_probability(&format!("{field}.probability"), self.probability)?;
        self.multiplier.validate(&format!("{field}.multiplier"), 1.0)
    }
}

/// Magnitude correction: `clamp(1 + bias / normalizer, min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasBand {
    pub normalizer: f64,
    pub min: f64,
    pub max: f64,
}

impl BiasBand {
    pub fn factor(&self, bias: f64) -> f64 {
        (1.0 + bias / self.normalizer).clamp(self.min, self.max)
    }

    fn validate(&self, field: &str) -> Result<(), ScheduleError> {
        let finite = self.normalizer.is_finite() && self.min.is_finite() && self.max.is_finite();
        if !finite || self.normalizer <= 0.0 || self.min < 0.0 || self.min > self.max {
            return Err(ScheduleError::InvalidBiasBand {
                field: field.to_string(),
                normalizer: self.normalizer,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Streak-driven magnitude multiplier: once the streak (counting the
/// current trade) reaches `min_streak`, magnitude is scaled by
/// `1 + streak * step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreakBoost {
    pub min_streak: u32,
    pub step: f64,
}

impl StreakBoost {
    pub fn multiplier(&self, streak: u32) -> f64 {
        if streak >= self.min_streak {
            1.0 + f64::from(streak) * self.step
        } else {
            1.0
        }
    }
}

/// Revenge trading: after `min_losses` consecutive losses, position size
/// is drawn from `sizes` instead of the normal size set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevengeSizing {
    pub min_losses: u32,
    pub sizes: Vec<f64>,
}

impl RevengeSizing {
    pub fn active(&self, loss_streak: u32) -> bool {
        loss_streak >= self.min_losses
    }
}

/// Stop-loss and take-profit distances from the open price, in price units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskReward {
    pub stop_offset: f64,
    pub take_offset: f64,
}

impl RiskReward {
    pub fn ratio(&self) -> f64 {
        if self.stop_offset == 0.0 {
            return 0.0;
        }
        self.take_offset / self.stop_offset
    }
}

/// One contiguous slice of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(default)]
    pub label: String,
    pub start: f64,
    pub end: f64,
    /// Cumulative profit the curve should reach at `end`.
    pub target: f64,
    pub win_probability: f64,
    pub win_range: UniformRange,
    pub loss_range: UniformRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_win: Option<LargeMove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_loss: Option<LargeMove>,
}

impl Phase {
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Everything that shapes one archetype's generated history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub default_trades: usize,
    pub win_bias: BiasBand,
    pub loss_bias: BiasBand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_streak: Option<StreakBoost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_streak: Option<StreakBoost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenge_sizing: Option<RevengeSizing>,
    pub risk_reward: RiskReward,
    #[serde(rename = "phase")]
    pub phases: Vec<Phase>,
}

impl ArchetypeProfile {
    /// Parse a profile from a TOML string. The result is not yet validated.
    pub fn from_toml(content: &str) -> Result<Self, ScheduleError> {
        toml::from_str(content).map_err(|e| ScheduleError::Toml(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ScheduleError> {
        toml::to_string_pretty(self).map_err(|e| ScheduleError::Toml(e.to_string()))
    }

    /// Check every structural and numeric constraint.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let first = self.phases.first().ok_or(ScheduleError::Empty)?;
        if first.start.abs() > BOUNDARY_EPSILON {
            return Err(ScheduleError::StartNotZero { start: first.start });
        }

        for (index, phase) in self.phases.iter().enumerate() {
            if !(phase.end > phase.start) {
                return Err(ScheduleError::EmptyInterval {
                    index,
                    start: phase.start,
                    end: phase.end,
                });
            }
            if let Some(next) = self.phases.get(index + 1) {
                let diff = next.start - phase.end;
                if diff > BOUNDARY_EPSILON {
                    return Err(ScheduleError::Gap {
                        index,
                        prev_end: phase.end,
                        start: next.start,
                    });
                }
                if diff < -BOUNDARY_EPSILON {
                    return Err(ScheduleError::Overlap {
                        index,
                        prev_end: phase.end,
                        start: next.start,
                    });
                }
            }

            let prefix = format!("phase[{index}]");
            if !phase.target.is_finite() {
                return Err(ScheduleError::NonFinite {
                    field: format!("{prefix}.target"),
                    value: phase.target,
                });
            }
            check_probability(&format!("{prefix}.win_probability"), phase.win_probability)?;
            phase.win_range.validate(&format!("{prefix}.win_range"), 0.0)?;
            phase.loss_range.validate(&format!("{prefix}.loss_range"), 0.0)?;
            if let Some(large) = &phase.large_win {
                large.validate(&format!("{prefix}.large_win"))?;
            }
            if let Some(large) = &phase.large_loss {
                large.validate(&format!("{prefix}.large_loss"))?;
            }
        }

        if let Some(last) = self.phases.last() {
            if (last.end - 1.0).abs() > BOUNDARY_EPSILON {
                return Err(ScheduleError::EndNotOne { end: last.end });
            }
        }

        self.win_bias.validate("win_bias")?;
        self.loss_bias.validate("loss_bias")?;

        for (field, boost) in [("win_streak", &self.win_streak), ("loss_streak", &self.loss_streak)] {
            if let Some(boost) = boost {
                if !boost.step.is_finite() || boost.step < 0.0 {
                    return Err(ScheduleError::NotPositive {
                        field: format!("{field}.step"),
                        value: boost.step,
                    });
                }
            }
        }

        if let Some(revenge) = &self.revenge_sizing {
            if revenge.sizes.is_empty() {
                return Err(ScheduleError::EmptyRevengeSizes);
            }
            if let Some(&bad) = revenge.sizes.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
                return Err(ScheduleError::NotPositive {
                    field: "revenge_sizing.sizes".into(),
                    value: bad,
                });
            }
        }

        for (field, value) in [
            ("risk_reward.stop_offset", self.risk_reward.stop_offset),
            ("risk_reward.take_offset", self.risk_reward.take_offset),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ScheduleError::NotPositive {
                    field: field.into(),
                    value,
                });
            }
        }

        Ok(())
    }

    /// Deterministic BLAKE3 fingerprint of the profile's canonical JSON.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}

fn check_probability(field: &str, value: f64) -> Result<(), ScheduleError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ScheduleError::Probability {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

// ── Validated schedule ──────────────────────────────────────────────

/// A validated archetype profile, ready for generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArchetypeProfile", into = "ArchetypeProfile")]
pub struct PhaseSchedule {
    profile: ArchetypeProfile,
}

impl PhaseSchedule {
    pub fn new(profile: ArchetypeProfile) -> Result<Self, ScheduleError> {
        profile.validate()?;
        Ok(Self { profile })
    }

    /// Load and validate a profile from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ScheduleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScheduleError::Io(format!("{}: {e}", path.display())))?;
        Self::new(ArchetypeProfile::from_toml(&content)?)
    }

    pub fn profile(&self) -> &ArchetypeProfile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn phases(&self) -> &[Phase] {
        &self.profile.phases
    }

    /// Index of the phase active at `ratio`. Ratios at or past 1 resolve
    /// to the final phase.
    pub fn phase_index_at(&self, ratio: f64) -> usize {
        let phases = self.phases();
        phases
            .iter()
            .position(|p| ratio < p.end)
            .unwrap_or(phases.len() - 1)
    }

    pub fn phase_at(&self, ratio: f64) -> &Phase {
        &self.phases()[self.phase_index_at(ratio)]
    }

    /// Target cumulative profit at the end of the phase before `index`.
    pub fn target_before(&self, index: usize) -> f64 {
        match index {
            0 => 0.0,
            i => self.phases()[i - 1].target,
        }
    }

    /// Piecewise-linear target curve evaluated at `ratio`.
    pub fn target_at(&self, ratio: f64) -> f64 {
        let index = self.phase_index_at(ratio);
        let phase = &self.phases()[index];
        let from = self.target_before(index);
        let progress = ((ratio - phase.start) / phase.width()).clamp(0.0, 1.0);
        from + (phase.target - from) * progress
    }

    pub fn final_target(&self) -> f64 {
        self.phases().last().map_or(0.0, |p| p.target)
    }

    /// Distance between the highest and lowest point of the target curve,
    /// including the zero it starts from.
    pub fn target_span(&self) -> f64 {
        let (lo, hi) = self
            .phases()
            .iter()
            .fold((0.0_f64, 0.0_f64), |(lo, hi), p| (lo.min(p.target), hi.max(p.target)));
        hi - lo
    }

    /// Win rate implied by the schedule for a run of `total` trades: the
    /// trade-count-weighted mean of per-phase win probabilities.
    pub fn expected_win_rate(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let sum: f64 = (0..total)
            .map(|i| self.phase_at(i as f64 / total as f64).win_probability)
            .sum();
        sum / total as f64
    }
}

impl TryFrom<ArchetypeProfile> for PhaseSchedule {
    type Error = ScheduleError;

    fn try_from(profile: ArchetypeProfile) -> Result<Self, Self::Error> {
        Self::new(profile)
    }
}

impl From<PhaseSchedule> for ArchetypeProfile {
    fn from(schedule: PhaseSchedule) -> Self {
        schedule.profile
    }
}
