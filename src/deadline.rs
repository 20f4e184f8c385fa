//! Single-slot one-shot deadline timer.
//!
//! Holds at most one `(fire tick, action)` pair.  The tick interrupt calls
//! [`DeadlineTimer::poll`] right after advancing the clock; when the current
//! tick *equals* the armed tick the slot is cleared and the action is handed
//! to the caller's dispatcher.
//!
//! ## Caller contract
//!
//! - Arming overwrites whatever was pending, silently.  There is no queue
//!   and no cancellation token.
//! - The firing condition is equality, not `>=`.  A deadline armed for a
//!   tick that has already passed never fires, so callers always arm with a
//!   non-negative offset relative to the tick they just read.
//! - The slot is cleared *before* the action runs, so an action may re-arm
//!   the timer from inside its own dispatch.

use core::cell::Cell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;

use crate::clock::Tick;

/// A pending one-shot deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline<A> {
    pub fire_at: Tick,
    pub action: A,
}

pub struct DeadlineTimer<A: Copy> {
    slot: CriticalSectionMutex<Cell<Option<Deadline<A>>>>,
}

impl<A: Copy> Default for DeadlineTimer<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Copy> DeadlineTimer<A> {
    pub const fn new() -> Self {
        Self {
            slot: CriticalSectionMutex::new(Cell::new(None)),
        }
    }

    /// Arm the slot to fire `offset_ms` after `now`, replacing any pending
    /// deadline.
    pub fn arm(&self, now: Tick, offset_ms: u32, action: A) {
        let deadline = Deadline {
            fire_at: now + u64::from(offset_ms),
            action,
        };
        self.slot.lock(|slot| slot.set(Some(deadline)));
    }

    /// Tick-interrupt hook.  Fires the pending action if `now` is its tick.
    /// Returns `true` when an action was dispatched.
    pub fn poll(&self, now: Tick, dispatch: impl FnOnce(A)) -> bool {
        let due = self.slot.lock(|slot| match slot.get() {
            Some(d) if d.fire_at == now => {
                slot.set(None);
                Some(d.action)
            }
            _ => None,
        });

        match due {
            Some(action) => {
                dispatch(action);
                true
            }
            None => false,
        }
    }

    /// The pending deadline, if any.
    pub fn pending(&self) -> Option<Deadline<A>> {
        self.slot.lock(Cell::get)
    }

    pub fn is_armed(&self) -> bool {
        self.pending().is_some()
    }
}
