//! Interrupt-safe event queue.
//!
//! Events are produced by:
//! - the tick interrupt (dispense completion, faults dispatched from the
//!   sense latch)
//! - the console task (dispense start, clean sweeps)
//!
//! and consumed by the main loop, which drains them into an
//! [`EventSink`](crate::app::ports::EventSink) and logs them there.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Tick ISR    │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ Console     │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Producers never block: when the queue is full the event is dropped and
//! counted.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::events::BoardEvent;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 16;

pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, BoardEvent, EVENT_QUEUE_CAP>,
    dropped: AtomicU32,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push an event.  Safe from interrupt context.
    /// Returns `false` if the queue was full and the event was dropped.
    pub fn push(&self, event: BoardEvent) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Pop the oldest pending event.
    pub fn pop(&self) -> Option<BoardEvent> {
        self.channel.try_receive().ok()
    }

    /// Drain every pending event, oldest first.
    pub fn drain(&self, mut handler: impl FnMut(BoardEvent)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Events lost to a full queue since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}
