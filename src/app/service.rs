//! Application service: the hexagonal core.
//!
//! [`PumpBoard`] owns the clock, the deadline slot, the actuator, the
//! dispense scheduler, the fault monitor and the recipe being built.  It is
//! shared by reference between three contexts:
//!
//! - the tick interrupt calls [`PumpBoard::on_tick`] once per millisecond
//! - the fault path calls [`PumpBoard::on_fault`]
//! - the console calls everything else
//!
//! ```text
//!  tick ISR ──▶ ┌──────────────────────────────┐ ──▶ PumpPort
//! fault ISR ──▶ │          PumpBoard           │ ──▶ StatusLightPort
//!   console ──▶ │ clock · deadline · dispense  │ ──▶ EventQueue
//!               │ actuator · faults · recipe   │
//!               └──────────────────────────────┘
//! ```
//!
//! Everything the interrupts touch (outputs, run state, clean flag) lives
//! in one [`BoardCore`] behind a critical-section mutex, so a multi-step
//! change is never observed half done.  The recipe has its own mutex and is
//! only touched from console context.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::actuator::{Actuator, PumpId, PumpMask};
use crate::clock::{SystemClock, Tick};
use crate::config::BoardConfig;
use crate::deadline::DeadlineTimer;
use crate::dispense::{DispenseScheduler, DispenseStep, StepOutcome};
use crate::error::{BusyError, Result};
use crate::events::EventQueue;
use crate::recipe::{Ingredient, Recipe, RecipeStore};
use crate::safety::{FaultBank, FaultMonitor};

use super::events::BoardEvent;
use super::ports::{PumpPort, StatusLightPort};

/// State shared with interrupt context.
struct BoardCore<P, L> {
    actuator: Actuator<P, L>,
    scheduler: DispenseScheduler,
    monitor: FaultMonitor,
    cleaning: bool,
}

pub struct PumpBoard<P, L> {
    config: BoardConfig,
    clock: SystemClock,
    timer: DeadlineTimer<DispenseStep>,
    core: CriticalSectionMutex<RefCell<BoardCore<P, L>>>,
    recipe: CriticalSectionMutex<RefCell<RecipeStore>>,
    events: EventQueue,
}

impl<P: PumpPort, L: StatusLightPort> PumpBoard<P, L> {
    pub fn new(config: BoardConfig, pumps: P, lights: L) -> Self {
        Self {
            config,
            clock: SystemClock::new(),
            timer: DeadlineTimer::new(),
            core: CriticalSectionMutex::new(RefCell::new(BoardCore {
                actuator: Actuator::new(pumps, lights),
                scheduler: DispenseScheduler::new(),
                monitor: FaultMonitor::new(),
                cleaning: false,
            })),
            recipe: CriticalSectionMutex::new(RefCell::new(RecipeStore::new())),
            events: EventQueue::new(),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Milliseconds since boot.
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    // ── Interrupt entry points ────────────────────────────────

    /// Periodic 1 ms tick.  Advances the clock and fires the dispense
    /// deadline when it is due.
    pub fn on_tick(&self) {
        let now = self.clock.advance();
        self.timer.poll(now, |step| match step {
            DispenseStep::NextStop => {
                let outcome = self.with_core(|core| {
                    core.scheduler
                        .on_deadline(now, &mut core.actuator, &self.timer)
                });
                if let StepOutcome::Completed { elapsed_ms } = outcome {
                    self.events.push(BoardEvent::DispenseCompleted {
                        at: now,
                        elapsed_ms,
                    });
                }
            }
        });
    }

    /// A fault bank asserted its sense line.  All outputs go off, the
    /// dispense run and any clean cycle end.
    ///
    /// On target the sense interrupt drives the pump pins low at once and
    /// this runs from the next tick's fault dispatch.  Until then
    /// [`is_dispensing`](Self::is_dispensing) and
    /// [`energized`](Self::energized) still report the interrupted run, for
    /// up to one tick.
    pub fn on_fault(&self, bank: FaultBank) {
        self.with_core(|core| {
            core.monitor
                .on_fault(bank, &mut core.actuator, &mut core.scheduler);
            core.cleaning = false;
        });
        self.events.push(BoardEvent::FaultReported {
            bank,
            at: self.clock.now(),
        });
    }

    // ── Recipe building ───────────────────────────────────────

    pub fn reset(&self) -> Result<()> {
        self.with_recipe(|r| {
            r.reset();
            Ok(())
        })
    }

    pub fn set_pump(&self, raw: u16) -> Result<()> {
        self.with_recipe(|r| r.set_pump(raw))
    }

    pub fn set_duration(&self, ms: u16) -> Result<()> {
        self.with_recipe(|r| r.set_duration(ms))
    }

    pub fn set_delay(&self, ms: u16) -> Result<()> {
        self.with_recipe(|r| r.set_delay(ms))
    }

    pub fn store(&self) -> Result<Ingredient> {
        let stored = self.with_recipe(RecipeStore::store)?;
        debug!(
            "stored pump {} for {} ms after {} ms",
            stored.pump, stored.duration_ms, stored.delay_ms
        );
        Ok(stored)
    }

    /// Committed ingredients in storage order.
    pub fn list(&self) -> Recipe {
        self.recipe.lock(|r| r.borrow().snapshot())
    }

    // ── Dispensing ────────────────────────────────────────────

    /// Start dispensing the committed recipe and return immediately.
    /// Returns the number of pumps started.
    pub fn start(&self) -> Result<u8> {
        let recipe = self.list();
        let (count, at) = self.with_core(|core| {
            if core.cleaning {
                return Err(BusyError::Cleaning.into());
            }
            let now = self.clock.now();
            core.scheduler
                .start(&recipe, now, &mut core.actuator, &self.timer)
                .map(|count| (count, now))
        })?;

        self.events.push(BoardEvent::DispenseStarted {
            ingredients: count,
            at,
        });
        Ok(count)
    }

    /// Start the committed recipe and block until it has finished, either
    /// normally or because a fault ended it.  The recipe is consumed.
    pub fn go(&self, delay: &mut impl DelayNs) -> Result<()> {
        let count = self.start()?;
        let started = self.now();
        info!("dispensing {count} ingredients");

        while self.is_dispensing() {
            delay.delay_ms(1);
        }

        self.recipe.lock(|r| r.borrow_mut().reset());
        info!("dispense finished after {} ms", self.clock.elapsed_since(started));
        Ok(())
    }

    pub fn is_dispensing(&self) -> bool {
        self.with_core(|core| core.scheduler.is_dispensing())
    }

    // ── Manual control ────────────────────────────────────────

    pub fn pump_on(&self, raw: u16) -> Result<PumpId> {
        self.manual(raw, true)
    }

    pub fn pump_off(&self, raw: u16) -> Result<PumpId> {
        self.manual(raw, false)
    }

    /// Switch every pump on (`start`) or off, one after another with
    /// `clean_step_delay_ms` between pumps.
    ///
    /// A fault during a start sweep ends the cycle; the remaining pumps are
    /// left off.
    pub fn clean(&self, start: bool, delay: &mut impl DelayNs) -> Result<()> {
        self.with_core(|core| -> Result<()> {
            if core.scheduler.is_dispensing() {
                Err(BusyError::Dispensing.into())
            } else if start && core.cleaning {
                Err(BusyError::Cleaning.into())
            } else if !start && !core.cleaning {
                Err(BusyError::NotCleaning.into())
            } else {
                core.cleaning = start;
                Ok(())
            }
        })?;
        info!("clean cycle {}", if start { "starting" } else { "stopping" });

        for id in PumpId::all() {
            let switched = self.with_core(|core| {
                if start && !core.cleaning {
                    return false;
                }
                core.actuator.set(id, start);
                true
            });
            if !switched {
                info!("clean cycle interrupted at pump {id}");
                return Ok(());
            }
            delay.delay_ms(self.config.clean_step_delay_ms);
        }

        self.events.push(if start {
            BoardEvent::CleanStarted
        } else {
            BoardEvent::CleanStopped
        });
        Ok(())
    }

    pub fn is_cleaning(&self) -> bool {
        self.with_core(|core| core.cleaning)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Pumps currently energized.
    pub fn energized(&self) -> PumpMask {
        self.with_core(|core| core.actuator.energized())
    }

    /// Latched fault bitmask, one bit per [`FaultBank`].
    pub fn fault_flags(&self) -> u8 {
        self.with_core(|core| core.monitor.faults())
    }

    /// Fault signals handled since boot.
    pub fn fault_count(&self) -> u32 {
        self.with_core(|core| core.monitor.count())
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Drain pending events, oldest first.
    pub fn drain_events(&self, handler: impl FnMut(BoardEvent)) {
        self.events.drain(handler);
    }

    /// Inspect the pump outputs.
    pub fn with_pumps<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        self.with_core(|core| f(core.actuator.pumps()))
    }

    /// Inspect the status-light adapter.
    pub fn with_lights<R>(&self, f: impl FnOnce(&L) -> R) -> R {
        self.with_core(|core| f(core.actuator.lights()))
    }

    // ── Internal ──────────────────────────────────────────────

    fn with_core<R>(&self, f: impl FnOnce(&mut BoardCore<P, L>) -> R) -> R {
        self.core.lock(|core| f(&mut *core.borrow_mut()))
    }

    /// Recipe edits are refused while a dispense derived from it runs.
    fn with_recipe<R>(&self, f: impl FnOnce(&mut RecipeStore) -> Result<R>) -> Result<R> {
        if self.is_dispensing() {
            return Err(BusyError::Dispensing.into());
        }
        self.recipe.lock(|r| f(&mut *r.borrow_mut()))
    }

    fn manual(&self, raw: u16, on: bool) -> Result<PumpId> {
        self.with_core(|core| {
            if core.scheduler.is_dispensing() {
                return Err(BusyError::Dispensing.into());
            }
            if core.cleaning {
                return Err(BusyError::Cleaning.into());
            }
            core.actuator.set_pump(raw, on)
        })
    }
}
