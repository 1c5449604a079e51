//! Worry lifecycle and application mode.
//!
//! A worry moves `Pending -> Falling -> removed`. Confirming comfort makes it
//! fall and schedules its removal; [`TreeController::complete_fall`] performs
//! the removal once the fall is over. Emptying a non-empty tree this way is
//! the "all cleared" condition, which switches the tree into
//! [`AppMode::Celebrating`] until the summary is dismissed.
//!
//! The controller itself has no clock. [`session::TreeSession`] drives the
//! fall timers on tokio.

pub mod session;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;

use crate::models::{ClearedWorry, Worry, WorryId, WorryState};
use crate::store::{StoreError, WorryStore};

/// How long a comforted monster takes to fall off the tree.
pub const DEFAULT_FALL_DURATION: Duration = Duration::from_secs(2);

/// What the tree is doing right now.
///
/// - `Normal`: worries can be added and the tree shared
/// - `Comforting`: clicking a pending worry opens the comfort flow
/// - `SharedView`: comforting someone else's tree loaded from a link
/// - `Celebrating`: every worry is cleared and the summary is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AppMode {
    Normal,
    Comforting,
    SharedView,
    Celebrating { shared: bool },
}

impl AppMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Comforting => "comforting",
            Self::SharedView => "shared_view",
            Self::Celebrating { .. } => "celebrating",
        }
    }

    /// Whether clicks on pending worries start the comfort flow.
    pub fn accepts_comfort(&self) -> bool {
        matches!(self, Self::Comforting | Self::SharedView)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("worry text is blank")]
    BlankText,

    #[error("comfort text is blank")]
    BlankComfort,

    #[error("cannot {action} while {mode}")]
    NotAllowed {
        action: &'static str,
        mode: &'static str,
    },

    #[error("there are no worries to comfort")]
    NothingToComfort,

    #[error("worry {0} not found")]
    NotFound(WorryId),

    #[error("worry {0} is already falling")]
    AlreadyFalling(WorryId),

    #[error("worry {0} is not falling")]
    NotFalling(WorryId),
}

impl From<StoreError> for LifecycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::BlankText => Self::BlankText,
        }
    }
}

/// A removal the caller must carry out after `after` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledRemoval {
    pub worry_id: WorryId,
    pub after: Duration,
}

/// Result of finishing a fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallOutcome {
    /// The worry is gone and others remain.
    Removed,
    /// The worry was the last one; the tree is now celebrating.
    AllCleared,
}

/// Owns the worry store, the resolved list, and the application mode.
#[derive(Debug)]
pub struct TreeController {
    store: WorryStore,
    mode: AppMode,
    resolved: Vec<ClearedWorry>,
    rng: StdRng,
    fall_duration: Duration,
}

impl Default for TreeController {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeController {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic positions and colors, for tests and demos.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            store: WorryStore::new(),
            mode: AppMode::Normal,
            resolved: Vec::new(),
            rng,
            fall_duration: DEFAULT_FALL_DURATION,
        }
    }

    /// A tree loaded from a share link, ready to be comforted.
    pub fn from_shared(worries: Vec<Worry>) -> Self {
        let mut controller = Self::new();
        controller.store = worries.into_iter().collect();
        controller.mode = AppMode::SharedView;
        controller
    }

    pub fn with_fall_duration(mut self, fall_duration: Duration) -> Self {
        self.fall_duration = fall_duration;
        self
    }

    // ============================================================
    // Accessors
    // ============================================================

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn store(&self) -> &WorryStore {
        &self.store
    }

    pub fn resolved(&self) -> &[ClearedWorry] {
        &self.resolved
    }

    pub fn fall_duration(&self) -> Duration {
        self.fall_duration
    }

    pub fn is_shared_view(&self) -> bool {
        matches!(
            self.mode,
            AppMode::SharedView | AppMode::Celebrating { shared: true }
        )
    }

    pub fn can_add_worries(&self) -> bool {
        self.mode == AppMode::Normal
    }

    /// Sharing is offered for your own tree, never for a shared one.
    pub fn can_share(&self) -> bool {
        matches!(self.mode, AppMode::Normal | AppMode::Comforting)
            && self.store.pending().next().is_some()
    }

    // ============================================================
    // Intents
    // ============================================================

    pub fn add_worry(&mut self, text: &str) -> Result<WorryId, LifecycleError> {
        if !self.can_add_worries() {
            return Err(self.not_allowed("add worries"));
        }
        let id = self.store.add(text, &mut self.rng)?;
        tracing::debug!(worry_id = %id, "worry added");
        Ok(id)
    }

    /// Flip comfort mode, or leave the celebration if one is showing.
    pub fn toggle_comfort_mode(&mut self) -> Result<AppMode, LifecycleError> {
        let next = match self.mode {
            AppMode::Normal if self.store.is_empty() => {
                return Err(LifecycleError::NothingToComfort)
            }
            AppMode::Normal => AppMode::Comforting,
            AppMode::Comforting => AppMode::Normal,
            AppMode::Celebrating { .. } => return self.dismiss_summary(),
            AppMode::SharedView => return Err(self.not_allowed("leave comfort mode")),
        };
        self.mode = next;
        tracing::debug!(mode = self.mode.as_str(), "comfort mode toggled");
        Ok(self.mode)
    }

    /// The comfort intent of a click on a worry.
    pub fn select(&self, id: WorryId) -> Result<&Worry, LifecycleError> {
        if !self.mode.accepts_comfort() {
            return Err(self.not_allowed("comfort worries"));
        }
        let worry = self.store.get(id).ok_or(LifecycleError::NotFound(id))?;
        if worry.is_falling() {
            return Err(LifecycleError::AlreadyFalling(id));
        }
        Ok(worry)
    }

    /// Comfort a worry: record it as resolved and start its fall.
    pub fn confirm_comfort(
        &mut self,
        id: WorryId,
        comfort_text: &str,
    ) -> Result<ScheduledRemoval, LifecycleError> {
        let comfort_text = comfort_text.trim();
        if comfort_text.is_empty() {
            return Err(LifecycleError::BlankComfort);
        }
        self.select(id)?;

        let worry = self.store.get_mut(id).ok_or(LifecycleError::NotFound(id))?;
        self.resolved.push(ClearedWorry {
            worry_text: worry.text.clone(),
            comfort_text: comfort_text.to_string(),
        });
        worry.state = WorryState::Falling {
            comfort_text: comfort_text.to_string(),
        };
        tracing::info!(worry_id = %id, "worry comforted, falling");

        Ok(ScheduledRemoval {
            worry_id: id,
            after: self.fall_duration,
        })
    }

    /// Remove a worry whose fall has finished.
    pub fn complete_fall(&mut self, id: WorryId) -> Result<FallOutcome, LifecycleError> {
        let worry = self.store.get(id).ok_or(LifecycleError::NotFound(id))?;
        if !worry.is_falling() {
            return Err(LifecycleError::NotFalling(id));
        }
        self.store.remove(id);
        tracing::debug!(worry_id = %id, remaining = self.store.len(), "worry removed");

        if !self.store.is_empty() {
            return Ok(FallOutcome::Removed);
        }

        let shared = self.is_shared_view();
        self.mode = AppMode::Celebrating { shared };
        tracing::info!(resolved = self.resolved.len(), "all worries cleared");
        Ok(FallOutcome::AllCleared)
    }

    /// Close the summary and go back to the tree.
    pub fn dismiss_summary(&mut self) -> Result<AppMode, LifecycleError> {
        let AppMode::Celebrating { shared } = self.mode else {
            return Err(self.not_allowed("dismiss the summary"));
        };
        self.resolved.clear();
        self.mode = if shared {
            AppMode::SharedView
        } else {
            AppMode::Normal
        };
        Ok(self.mode)
    }

    fn not_allowed(&self, action: &'static str) -> LifecycleError {
        LifecycleError::NotAllowed {
            action,
            mode: self.mode.as_str(),
        }
    }
}
