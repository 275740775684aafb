//! Scheduling core for classbell.
//!
//! - `expand` turns recurring courses into the concrete occurrences of a date
//! - `planner` turns an event into reminder and live triggers on a timer service
//! - `anchor` arbitrates the single persistent live channel between events in progress
//!
//! Persistence (`store`), configuration (`config`) and the `schedule` service
//! tie these to the data on disk. Timers and notification rendering are
//! collaborators behind the `timer` and `render` traits.

pub mod anchor;
pub mod clock;
pub mod config;
pub mod constants;
pub mod course;
pub mod delivery;
pub mod error;
pub mod event;
pub mod expand;
pub mod period;
pub mod planner;
pub mod render;
pub mod schedule;
pub mod store;
pub mod term;
pub mod timer;
pub mod trigger;

pub use error::{BellError, BellResult};
pub use expand::expand;
