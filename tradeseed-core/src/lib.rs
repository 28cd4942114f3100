//! tradeseed core: synthetic trade journals with shaped equity curves.
//!
//! This crate contains the pure generation engine:
//! - Domain types (trade records, instruments, tickets)
//! - Phase schedules and the built-in A/B/C archetypes
//! - Bias-corrected trade sampler
//! - Price synthesis and record assembly
//! - Deterministic RNG hierarchy for reproducible, parallel-safe runs

pub mod assembler;
pub mod domain;
pub mod generator;
pub mod pricing;
pub mod rng;
pub mod sampler;
pub mod schedule;

pub use generator::{GeneratedRun, TradeGenerator};
pub use schedule::{Archetype, ArchetypeProfile, PhaseSchedule, ScheduleError};
