//! Order number generator
//!
//! Format: `{prefix}{YYYYMMDDHHMMSS}{seq:04}` in local time, e.g.
//! `ORD202610161530420001`. The sequence restarts every second.

use chrono::{DateTime, Local};
use parking_lot::Mutex;

const SEQUENCE_MODULO: u32 = 10_000;

#[derive(Debug)]
struct SequenceState {
    second: String,
    sequence: u32,
}

/// Process-wide monotonic order number source, owned by the order engine
#[derive(Debug)]
pub struct OrderNumberGenerator {
    prefix: String,
    state: Mutex<SequenceState>,
}

impl OrderNumberGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            state: Mutex::new(SequenceState {
                second: String::new(),
                sequence: 0,
            }),
        }
    }

    /// Next number for the current second
    pub fn next(&self) -> String {
        self.next_at(Local::now())
    }

    fn next_at(&self, now: DateTime<Local>) -> String {
        let second = now.format("%Y%m%d%H%M%S").to_string();
        let mut state = self.state.lock();
        if state.second == second {
            state.sequence = (state.sequence + 1) % SEQUENCE_MODULO;
        } else {
            state.second = second;
            state.sequence = 1;
        }
        format!("{}{}{:04}", self.prefix, state.second, state.sequence)
    }
}
