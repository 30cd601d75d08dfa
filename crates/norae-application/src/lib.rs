//! Session lifecycle engine for the rental floor.
//!
//! This crate owns the locally derived floor state, the clock ticker that
//! promotes session status from wall-clock comparisons, the alarm deduper
//! that guarantees at-most-once expiry alarms, and the idempotent session
//! commands (start / extend / end).

pub mod floor;

pub use floor::deduper::AlarmDeduper;
pub use floor::engine::{FloorEngine, StartSession};
pub use floor::state::FloorState;
