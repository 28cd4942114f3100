//! Built-in archetypes.
//!
//! Magnitudes, modifiers and bias bands describe three recognisable trader
//! personalities. Per-phase win probabilities are calibrated so that the
//! mean cumulative curve lands on each phase target.

use super::{
    ArchetypeProfile, BiasBand, LargeMove, Phase, PhaseSchedule, RevengeSizing, RiskReward,
    ScheduleError, StreakBoost, UniformRange,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The three preset trader personalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    /// Choppy net-loser: rallies, gives it back, recovers, then bleeds out.
    A,
    /// Volatile high-performer: deep corrections between explosive legs.
    B,
    /// Roller-coaster: two crashes and two rebounds, finishing positive.
    C,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::A, Archetype::B, Archetype::C];

    pub fn label(self) -> &'static str {
        match self {
            Archetype::A => "A",
            Archetype::B => "B",
            Archetype::C => "C",
        }
    }

    pub fn default_trades(self) -> usize {
        match self {
            Archetype::A => 500,
            Archetype::B => 380,
            Archetype::C => 620,
        }
    }

    pub fn profile(self) -> ArchetypeProfile {
        match self {
            Archetype::A => choppy_loser(),
            Archetype::B => high_performer(),
            Archetype::C => roller_coaster(),
        }
    }

    /// Validated schedule for this archetype.
    pub fn schedule(self) -> Result<PhaseSchedule, ScheduleError> {
        PhaseSchedule::new(self.profile())
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
#[error("unknown archetype '{0}' (expected A, B or C)")]
pub struct ParseArchetypeError(String);

impl FromStr for Archetype {
    type Err = ParseArchetypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "choppy-loser" => Ok(Archetype::A),
            "b" | "high-performer" => Ok(Archetype::B),
            "c" | "roller-coaster" => Ok(Archetype::C),
            _ => Err(ParseArchetypeError(s.to_string())),
        }
    }
}

// ── Profiles ────────────────────────────────────────────────────────

struct PhaseRow {
    label: &'static str,
    end: f64,
    target: f64,
    win_probability: f64,
    large_win: Option<LargeMove>,
    large_loss: Option<LargeMove>,
}

fn build_phases(rows: &[PhaseRow], win: UniformRange, loss: UniformRange) -> Vec<Phase> {
    let mut start = 0.0;
    rows.iter()
        .map(|row| {
            let phase = Phase {
                label: row.label.to_string(),
                start,
                end: row.end,
                target: row.target,
                win_probability: row.win_probability,
                win_range: win,
                loss_range: loss,
                large_win: row.large_win,
                large_loss: row.large_loss,
            };
            start = row.end;
            phase
        })
        .collect()
}

fn large(probability: f64, min: f64, max: f64) -> Option<LargeMove> {
    Some(LargeMove {
        probability,
        multiplier: UniformRange::new(min, max),
    })
}

fn choppy_loser() -> ArchetypeProfile {
    let big_win = large(0.15, 1.5, 2.0);
    let big_loss = large(0.18, 1.5, 2.0);
    let phases = build_phases(
        &[
            PhaseRow {
                label: "rally",
                end: 0.30,
                target: 150_000.0,
                win_probability: 0.63,
                large_win: big_win,
                large_loss: None,
            },
            PhaseRow {
                label: "giveback",
                end: 0.45,
                target: 60_000.0,
                win_probability: 0.52,
                large_win: None,
                large_loss: big_loss,
            },
            PhaseRow {
                label: "recovery",
                end: 0.70,
                target: 130_000.0,
                win_probability: 0.64,
                large_win: big_win,
                large_loss: big_loss,
            },
            PhaseRow {
                label: "bleed",
                end: 1.0,
                target: -70_000.0,
                win_probability: 0.51,
                large_win: None,
                large_loss: big_loss,
            },
        ],
        UniformRange::new(1_500.0, 8_000.0),
        UniformRange::new(1_800.0, 9_000.0),
    );

    ArchetypeProfile {
        name: "A".into(),
        description: "choppy net-loser".into(),
        default_trades: Archetype::A.default_trades(),
        win_bias: BiasBand {
            normalizer: 150_000.0,
            min: 0.7,
            max: 1.3,
        },
        loss_bias: BiasBand {
            normalizer: 100_000.0,
            min: 0.7,
            max: 1.3,
        },
        win_streak: None,
        loss_streak: None,
        revenge_sizing: None,
        risk_reward: RiskReward {
            stop_offset: 0.003,
            take_offset: 0.004,
        },
        phases,
    }
}

fn high_performer() -> ArchetypeProfile {
    let big_win = large(0.22, 2.2, 3.5);
    let big_loss = large(0.28, 2.0, 3.8);
    let phases = build_phases(
        &[
            PhaseRow {
                label: "early surge",
                end: 0.25,
                target: 2_000_000.0,
                win_probability: 0.52,
                large_win: big_win,
                large_loss: None,
            },
            PhaseRow {
                label: "deep correction",
                end: 0.40,
                target: 300_000.0,
                win_probability: 0.14,
                large_win: None,
                large_loss: big_loss,
            },
            PhaseRow {
                label: "violent rally",
                end: 0.60,
                target: 3_500_000.0,
                win_probability: 0.69,
                large_win: big_win,
                large_loss: None,
            },
            PhaseRow {
                label: "second correction",
                end: 0.75,
                target: 1_800_000.0,
                win_probability: 0.15,
                large_win: None,
                large_loss: big_loss,
            },
            PhaseRow {
                label: "final breakout",
                end: 1.0,
                target: 4_200_000.0,
                win_probability: 0.57,
                large_win: big_win,
                large_loss: None,
            },
        ],
        UniformRange::new(20_000.0, 60_000.0),
        UniformRange::new(12_000.0, 35_000.0),
    );

    ArchetypeProfile {
        name: "B".into(),
        description: "volatile high-performer".into(),
        default_trades: Archetype::B.default_trades(),
        win_bias: BiasBand {
            normalizer: 3_500_000.0,
            min: 0.4,
            max: 1.8,
        },
        loss_bias: BiasBand {
            normalizer: 2_500_000.0,
            min: 0.4,
            max: 1.8,
        },
        win_streak: Some(StreakBoost {
            min_streak: 3,
            step: 0.12,
        }),
        loss_streak: None,
        revenge_sizing: None,
        risk_reward: RiskReward {
            stop_offset: 0.003,
            take_offset: 0.006,
        },
        phases,
    }
}

fn roller_coaster() -> ArchetypeProfile {
    let crash = large(0.26, 1.8, 3.2);
    let phases = build_phases(
        &[
            PhaseRow {
                label: "spike",
                end: 0.15,
                target: 800_000.0,
                win_probability: 0.77,
                large_win: None,
                large_loss: None,
            },
            PhaseRow {
                label: "crash",
                end: 0.32,
                target: -1_500_000.0,
                win_probability: 0.18,
                large_win: None,
                large_loss: crash,
            },
            PhaseRow {
                label: "rebound",
                end: 0.48,
                target: 1_000_000.0,
                win_probability: 0.90,
                large_win: large(0.30, 2.2, 3.2),
                large_loss: None,
            },
            PhaseRow {
                label: "second crash",
                end: 0.68,
                target: -1_200_000.0,
                win_probability: 0.29,
                large_win: None,
                large_loss: crash,
            },
            PhaseRow {
                label: "bottoming",
                end: 0.82,
                target: -800_000.0,
                win_probability: 0.66,
                large_win: None,
                large_loss: None,
            },
            PhaseRow {
                label: "recovery",
                end: 1.0,
                target: 325_000.0,
                win_probability: 0.62,
                large_win: large(0.35, 2.5, 3.5),
                large_loss: None,
            },
        ],
        UniformRange::new(8_000.0, 22_000.0),
        UniformRange::new(7_000.0, 19_000.0),
    );

    ArchetypeProfile {
        name: "C".into(),
        description: "roller-coaster trader finishing positive".into(),
        default_trades: Archetype::C.default_trades(),
        win_bias: BiasBand {
            normalizer: 1_650_000.0,
            min: 0.2,
            max: 2.0,
        },
        loss_bias: BiasBand {
            normalizer: 1_600_000.0,
            min: 0.3,
            max: 1.8,
        },
        win_streak: None,
        loss_streak: Some(StreakBoost {
            min_streak: 3,
            step: 0.09,
        }),
        revenge_sizing: Some(RevengeSizing {
            min_losses: 3,
            sizes: vec![1.0, 2.0, 2.0, 2.0],
        }),
        risk_reward: RiskReward {
            stop_offset: 0.005,
            take_offset: 0.003,
        },
        phases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_validate() {
        for archetype in Archetype::ALL {
            let schedule = archetype.schedule();
            assert!(schedule.is_ok(), "{archetype}: {:?}", schedule.err());
        }
    }

    #[test]
    fn final_targets_match_personalities() {
        assert_eq!(Archetype::A.schedule().unwrap().final_target(), -70_000.0);
        assert_eq!(Archetype::B.schedule().unwrap().final_target(), 4_200_000.0);
        assert_eq!(Archetype::C.schedule().unwrap().final_target(), 325_000.0);
    }

    #[test]
    fn phase_counts() {
        assert_eq!(Archetype::A.profile().phases.len(), 4);
        assert_eq!(Archetype::B.profile().phases.len(), 5);
        assert_eq!(Archetype::C.profile().phases.len(), 6);
    }

    #[test]
    fn large_move_probabilities_stay_low() {
        for archetype in Archetype::ALL {
            for phase in archetype.profile().phases {
                for large in [phase.large_win, phase.large_loss].into_iter().flatten() {
                    assert!((0.12..=0.35).contains(&large.probability));
                }
            }
        }
    }

    #[test]
    fn only_c_revenge_trades() {
        assert!(Archetype::A.profile().revenge_sizing.is_none());
        assert!(Archetype::B.profile().revenge_sizing.is_none());
        assert!(Archetype::C.profile().revenge_sizing.is_some());
        assert!(Archetype::C.profile().loss_streak.is_some());
    }

    #[test]
    fn parse_archetype_names() {
        assert_eq!("a".parse::<Archetype>().unwrap(), Archetype::A);
        assert_eq!("High-Performer".parse::<Archetype>().unwrap(), Archetype::B);
        assert_eq!("C".parse::<Archetype>().unwrap(), Archetype::C);
        assert!("D".parse::<Archetype>().is_err());
    }

    #[test]
    fn preset_toml_roundtrip_validates() {
        let text = Archetype::C.profile().to_toml().unwrap();
        let schedule: PhaseSchedule = toml::from_str(&text).unwrap();
        assert_eq!(schedule.name(), "C");
        assert_eq!(schedule.phases().len(), 6);
    }
}
