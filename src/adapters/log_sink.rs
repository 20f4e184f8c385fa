//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing board events to the ESP-IDF logger
//! (which goes to UART / USB-CDC in production).  Faults are logged at
//! `error` level, everything else at `info`.

use log::{error, info};

use crate::app::events::BoardEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BoardEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BoardEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            BoardEvent::DispenseStarted { ingredients, at } => {
                info!("DISPENSE | started | ingredients={} | t={}ms", ingredients, at);
            }
            BoardEvent::DispenseCompleted { at, elapsed_ms } => {
                info!("DISPENSE | completed | elapsed={}ms | t={}ms", elapsed_ms, at);
            }
            BoardEvent::FaultReported { bank, at } => {
                error!("FAULT | pump driver {} reports a problem | t={}ms", bank, at);
            }
            BoardEvent::CleanStarted => {
                info!("CLEAN | all pumps on");
            }
            BoardEvent::CleanStopped => {
                info!("CLEAN | all pumps off");
            }
        }
    }
}
