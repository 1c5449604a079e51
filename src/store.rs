//! In-memory ordered collection of the worries currently on the tree.

use chrono::Utc;
use rand::Rng;
use thiserror::Error;

use crate::models::{Palette, Position, Worry, WorryId, WorryState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("worry text is blank")]
    BlankText,
}

/// Ordered worry collection, the single source of truth for the tree.
///
/// Ids are strictly increasing: a new id is the current time in milliseconds,
/// bumped past the high-water mark when the clock has not moved on. The mark
/// survives removals, so a removed id never comes back.
#[derive(Debug, Clone, Default)]
pub struct WorryStore {
    worries: Vec<Worry>,
    last_id: u64,
}

impl WorryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hang a new worry with a random position and color.
    pub fn add<R: Rng + ?Sized>(&mut self, text: &str, rng: &mut R) -> Result<WorryId, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::BlankText);
        }

        let id = self.next_id();
        self.worries.push(Worry {
            id,
            text: text.to_string(),
            position: Position::random(rng),
            color: Palette::random(rng),
            state: WorryState::Pending,
        });
        Ok(id)
    }

    /// Append a worry rebuilt from elsewhere (e.g. a share link).
    ///
    /// The worry keeps its id when that id is above every id seen so far;
    /// otherwise it is given the next free one.
    pub fn restore(&mut self, mut worry: Worry) -> WorryId {
        if worry.id.0 <= self.last_id {
            worry.id = WorryId(self.last_id.saturating_add(1));
        }
        self.last_id = worry.id.0;
        let id = worry.id;
        self.worries.push(worry);
        id
    }

    pub fn get(&self, id: WorryId) -> Option<&Worry> {
        self.worries.iter().find(|w| w.id == id)
    }

    pub fn get_mut(&mut self, id: WorryId) -> Option<&mut Worry> {
        self.worries.iter_mut().find(|w| w.id == id)
    }

    pub fn remove(&mut self, id: WorryId) -> Option<Worry> {
        let idx = self.worries.iter().position(|w| w.id == id)?;
        Some(self.worries.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Worry> {
        self.worries.iter()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Worry> {
        self.worries.iter().filter(|w| w.is_pending())
    }

    pub fn len(&self) -> usize {
        self.worries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worries.is_empty()
    }

    fn next_id(&mut self) -> WorryId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last_id = now.max(self.last_id.saturating_add(1));
        WorryId(self.last_id)
    }
}

impl FromIterator<Worry> for WorryStore {
    fn from_iter<I: IntoIterator<Item = Worry>>(iter: I) -> Self {
        let mut store = Self::new();
        for worry in iter {
            store.restore(worry);
        }
        store
    }
}
