//! Recipe builder.
//!
//! The operator stages a pump id, a duration and optionally a delay, then
//! commits them as one [`Ingredient`].  Committing a pump that is already in
//! the recipe overwrites that entry in place, so a recipe never holds the
//! same pump twice and never grows past [`RECIPE_MAX_INGREDIENTS`].
//!
//! Storage is a fixed-capacity `heapless::Vec`; nothing here allocates.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::actuator::PumpId;
use crate::config::RECIPE_MAX_INGREDIENTS;
use crate::error::{Result, ValidationError};

/// One pump's dispensing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Pump id, 1-based.
    pub pump: u8,
    /// How long the pump runs (ms, > 0).
    pub duration_ms: u16,
    /// Requested start offset (ms).  Stored and reported, see
    /// [`DispenseScheduler::start`](crate::dispense::DispenseScheduler::start)
    /// for how it is used.
    pub delay_ms: u16,
}

impl Ingredient {
    /// Ranking key for the first stop event.
    pub fn stop_rank(&self) -> u32 {
        u32::from(self.duration_ms) + u32::from(self.delay_ms)
    }
}

pub type Recipe = Vec<Ingredient, RECIPE_MAX_INGREDIENTS>;

#[derive(Debug, Default)]
pub struct RecipeStore {
    committed: Recipe,
    pump: Option<PumpId>,
    duration_ms: Option<u16>,
    delay_ms: u16,
}

impl RecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every staged field and committed ingredient.
    pub fn reset(&mut self) {
        self.committed.clear();
        self.clear_staged();
    }

    pub fn set_pump(&mut self, raw: u16) -> Result<()> {
        self.pump = Some(PumpId::new(raw)?);
        Ok(())
    }

    pub fn set_duration(&mut self, ms: u16) -> Result<()> {
        if ms == 0 {
            return Err(ValidationError::InvalidDuration.into());
        }
        self.duration_ms = Some(ms);
        Ok(())
    }

    pub fn set_delay(&mut self, ms: u16) -> Result<()> {
        self.delay_ms = ms;
        Ok(())
    }

    /// Commit the staged ingredient and clear the staging area.
    ///
    /// A full recipe rejects every commit, including one that would only
    /// overwrite an existing pump.
    pub fn store(&mut self) -> Result<Ingredient> {
        if self.committed.is_full() {
            return Err(ValidationError::RecipeFull.into());
        }
        let (Some(pump), Some(duration_ms)) = (self.pump, self.duration_ms) else {
            return Err(ValidationError::IncompleteIngredient.into());
        };

        let ingredient = Ingredient {
            pump: pump.get(),
            duration_ms,
            delay_ms: self.delay_ms,
        };

        match self.committed.iter_mut().find(|i| i.pump == ingredient.pump) {
            Some(existing) => *existing = ingredient,
            None => self
                .committed
                .push(ingredient)
                .map_err(|_| ValidationError::RecipeFull)?,
        }

        self.clear_staged();
        Ok(ingredient)
    }

    /// Committed ingredients in storage order.
    pub fn list(&self) -> &[Ingredient] {
        &self.committed
    }

    /// Owned copy of the committed ingredients.
    pub fn snapshot(&self) -> Recipe {
        self.committed.clone()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Staged pump and duration, if any.
    pub fn staged(&self) -> (Option<PumpId>, Option<u16>, u16) {
        (self.pump, self.duration_ms, self.delay_ms)
    }

    fn clear_staged(&mut self) {
        self.pump = None;
        self.duration_ms = None;
        self.delay_ms = 0;
    }
}
