//! Per-match mutual exclusion for `verify`.
//!
//! Held across the whole verify critical section: time gate, snapshot,
//! grading, scoring, advance. A caller arriving after a grading pass
//! completed just sees `graded == true` and returns the cached list.

use parking_lot::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct GradingGate(Mutex<()>);

impl GradingGate {
    pub fn enter(&self) -> MutexGuard<'_, ()> {
        self.0.lock()
    }
}
