//! Shell Module
//!
//! The command dispatcher: reads request lines, runs them against the
//! engine one at a time, and writes replies.
//!
//! ## Architecture
//! - One session per process, over any `BufRead`/`Write` pair
//! - The clock is injected, so the engine never reads wall time itself

mod clock;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{Session, SessionStats, Step};
