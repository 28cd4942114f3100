//! Domain types for generated trade journals

pub mod ids;
pub mod instrument;
pub mod trade;

pub use ids::Ticket;
pub use instrument::{Instrument, QuoteConvention, DEFAULT_INSTRUMENTS};
pub use trade::{Direction, ParseDirectionError, TradeRecord};
