//! Cascading dispense scheduler.
//!
//! A dispense energizes every recipe pump at once and then stops each pump
//! at its own millisecond offset, using the one-slot [`DeadlineTimer`].  The
//! timer only ever holds the *next* stop.  Each time it fires, the handler
//! switches off that pump plus every other pump whose stop time has already
//! been reached, picks the soonest remaining stop and re-arms the slot for
//! the difference.  When nothing remains the run is complete.
//!
//! ## Run state
//!
//! Each [`RunEntry`] carries a stop marker: the pump's duration while it is
//! running, zero once it has been switched off.  While a run is active the
//! set of energized pumps is exactly the set of entries with a non-zero
//! marker.
//!
//! ## Concurrency
//!
//! [`DispenseScheduler::start`] runs in normal context and
//! [`DispenseScheduler::on_deadline`] in the tick interrupt; the owner must
//! call both inside the same critical section as the actuator they drive.
//! Neither blocks nor allocates, and a deadline pass is O(n) with n ≤ 20.
//!
//! ## Known limitations
//!
//! - `delay_ms` only takes part in ranking the *first* stop.  All pumps
//!   start together.  The first deadline fires at `duration + delay` of the
//!   winning entry, but the elapsed time is then taken as its `duration`
//!   alone, so every later stop lands late by that entry's `delay_ms`.
//!   With `(1, 100ms, delay 50)` and `(2, 200ms)` pump 1 stops at t=150
//!   and pump 2 at t=250.
//! - [`DispenseScheduler::abort`] clears the running flag but keeps the stop
//!   markers and the armed deadline.  A deadline that fires afterwards still
//!   walks the stale entries; it only ever switches pumps off.

use heapless::Vec;

use crate::actuator::{Actuator, PumpId, PumpMask};
use crate::app::ports::{PumpPort, StatusLightPort};
use crate::clock::Tick;
use crate::config::RECIPE_MAX_INGREDIENTS;
use crate::deadline::DeadlineTimer;
use crate::error::{BusyError, Result, ValidationError};
use crate::recipe::Ingredient;

/// Timer action armed by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispenseStep {
    /// The soonest pending stop is due.
    NextStop,
}

/// One pump of the run in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunEntry {
    pub pump: PumpId,
    /// Stop time in ms after start; 0 once the pump has been stopped.
    pub stop_ms: u32,
}

impl RunEntry {
    pub fn is_stopped(&self) -> bool {
        self.stop_ms == 0
    }
}

#[derive(Debug, Default)]
struct RunState {
    running: bool,
    entries: Vec<RunEntry, RECIPE_MAX_INGREDIENTS>,
    elapsed_ms: u32,
    /// Entry whose stop the armed deadline belongs to.
    next: Option<usize>,
}

/// Result of one deadline pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// More pumps are running; the timer fires again in `next_in_ms`.
    Rearmed { next_in_ms: u32 },
    /// The last pump of an active run was stopped.
    Completed { elapsed_ms: u32 },
    /// The pass ran against a run that had already been aborted, or there
    /// was nothing to stop.
    Stale,
}

#[derive(Debug, Default)]
pub struct DispenseScheduler {
    run: RunState,
}

impl DispenseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dispensing `recipe`.
    ///
    /// Every ingredient is validated before any output changes.  On success
    /// all listed pumps are on and the deadline for the first stop is armed
    /// relative to `now`.  Returns the number of pumps started.
    pub fn start<P: PumpPort, L: StatusLightPort>(
        &mut self,
        recipe: &[Ingredient],
        now: Tick,
        actuator: &mut Actuator<P, L>,
        timer: &DeadlineTimer<DispenseStep>,
    ) -> Result<u8> {
        if self.run.running {
            return Err(BusyError::Dispensing.into());
        }
        if recipe.is_empty() {
            return Err(ValidationError::EmptyRecipe.into());
        }
        if recipe.len() > RECIPE_MAX_INGREDIENTS {
            return Err(ValidationError::RecipeFull.into());
        }

        let mut entries: Vec<RunEntry, RECIPE_MAX_INGREDIENTS> = Vec::new();
        let mut seen = PumpMask::EMPTY;
        let mut first: Option<(usize, u32)> = None;

        for (i, ingredient) in recipe.iter().enumerate() {
            let pump = PumpId::new(u16::from(ingredient.pump))?;
            if ingredient.duration_ms == 0 {
                return Err(ValidationError::InvalidDuration.into());
            }
            if seen.contains(pump) {
                return Err(ValidationError::DuplicatePump(pump.get()).into());
            }
            seen.insert(pump);

            let rank = ingredient.stop_rank();
            if first.is_none_or(|(_, best)| rank < best) {
                first = Some((i, rank));
            }

            entries
                .push(RunEntry {
                    pump,
                    stop_ms: u32::from(ingredient.duration_ms),
                })
                .map_err(|_| ValidationError::RecipeFull)?;
        }
        let Some((first_idx, first_in_ms)) = first else {
            return Err(ValidationError::EmptyRecipe.into());
        };

        for entry in &entries {
            actuator.set(entry.pump, true);
        }

        let count = entries.len() as u8;
        self.run = RunState {
            running: true,
            entries,
            elapsed_ms: 0,
            next: Some(first_idx),
        };
        timer.arm(now, first_in_ms, DispenseStep::NextStop);
        Ok(count)
    }

    /// Deadline handler.  Stops the due pump, coalesces every stop that is
    /// already reached and re-arms the timer for the next one.
    pub fn on_deadline<P: PumpPort, L: StatusLightPort>(
        &mut self,
        now: Tick,
        actuator: &mut Actuator<P, L>,
        timer: &DeadlineTimer<DispenseStep>,
    ) -> StepOutcome {
        let Some(due) = self.run.next.take() else {
            return StepOutcome::Stale;
        };
        let Some(entry) = self.run.entries.get_mut(due) else {
            return StepOutcome::Stale;
        };

        actuator.set(entry.pump, false);
        self.run.elapsed_ms = entry.stop_ms;
        entry.stop_ms = 0;
        let elapsed = self.run.elapsed_ms;

        let mut soonest: Option<(usize, u32)> = None;
        for (i, entry) in self.run.entries.iter_mut().enumerate() {
            if entry.is_stopped() {
                continue;
            }
            if entry.stop_ms <= elapsed {
                actuator.set(entry.pump, false);
                entry.stop_ms = 0;
            } else if soonest.is_none_or(|(_, best)| entry.stop_ms < best) {
                soonest = Some((i, entry.stop_ms));
            }
        }

        match soonest {
            Some((i, stop_ms)) => {
                let next_in_ms = stop_ms - elapsed;
                self.run.next = Some(i);
                timer.arm(now, next_in_ms, DispenseStep::NextStop);
                StepOutcome::Rearmed { next_in_ms }
            }
            None if self.run.running => {
                self.run.running = false;
                StepOutcome::Completed { elapsed_ms: elapsed }
            }
            None => StepOutcome::Stale,
        }
    }

    /// Mark the run as no longer dispensing.  Stop markers are kept.
    pub fn abort(&mut self) {
        self.run.running = false;
    }

    pub fn is_dispensing(&self) -> bool {
        self.run.running
    }

    /// Milliseconds covered by the stops processed so far.
    pub fn elapsed_ms(&self) -> u32 {
        self.run.elapsed_ms
    }

    /// Entries of the current or most recent run.
    pub fn entries(&self) -> &[RunEntry] {
        &self.run.entries
    }

    /// Pumps of the current run that have not been stopped yet.
    pub fn pending(&self) -> PumpMask {
        self.run
            .entries
            .iter()
            .filter(|e| !e.is_stopped())
            .map(|e| e.pump)
            .collect()
    }
}
