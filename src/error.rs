//! Unified error types for the pump board firmware.
//!
//! Every synchronous operation that can be refused funnels into [`Error`].
//! All variants are `Copy` and allocation-free so they can be returned from
//! inside critical sections.  Hardware faults are not errors: they arrive
//! asynchronously and are reported as
//! [`BoardEvent::FaultReported`](crate::app::events::BoardEvent).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// A refused operation.  The board state is unchanged whenever one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An argument or the recipe contents were invalid.
    Validation(ValidationError),
    /// The operation conflicts with what the board is currently doing.
    Busy(BusyError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::Busy(e) => write!(f, "{e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Pump id outside 1..=20.
    InvalidPumpId(u16),
    /// Durations must be at least one millisecond.
    InvalidDuration,
    /// `store` without a staged pump and duration.
    IncompleteIngredient,
    /// The recipe already holds the maximum number of ingredients.
    RecipeFull,
    /// Dispense requested with no ingredients.
    EmptyRecipe,
    /// The same pump appears twice in one recipe.
    DuplicatePump(u8),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPumpId(id) => write!(f, "invalid pump id {id}"),
            Self::InvalidDuration => write!(f, "only positive integer times are allowed"),
            Self::IncompleteIngredient => write!(f, "can't store without pump and time"),
            Self::RecipeFull => write!(f, "too many ingredients in recipe"),
            Self::EmptyRecipe => write!(f, "no ingredients stored"),
            Self::DuplicatePump(id) => write!(f, "pump {id} used twice in recipe"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Busy errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyError {
    /// A recipe is being dispensed.
    Dispensing,
    /// A clean cycle is running.
    Cleaning,
    /// Clean stop requested while no clean cycle is running.
    NotCleaning,
}

impl fmt::Display for BusyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispensing => write!(f, "pumps are busy dispensing"),
            Self::Cleaning => write!(f, "can't do that while cleaning"),
            Self::NotCleaning => write!(f, "can't stop cleaning while no pumps are running"),
        }
    }
}

impl From<BusyError> for Error {
    fn from(e: BusyError) -> Self {
        Self::Busy(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
