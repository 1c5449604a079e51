//! Async driver for a [`TreeController`]: owns the fall timers and publishes
//! lifecycle events.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{FallOutcome, LifecycleError, TreeController};
use crate::models::WorryId;

/// Something the front-end should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    WorryFalling(WorryId),
    WorryRemoved(WorryId),
    AllCleared,
}

/// Shared handle to a tree. Cloning gives another handle to the same tree.
///
/// The controller lock is never held across an await point, so every reader
/// sees a fully applied intent.
#[derive(Clone)]
pub struct TreeSession {
    controller: Arc<Mutex<TreeController>>,
    events: mpsc::UnboundedSender<TreeEvent>,
}

impl TreeSession {
    pub fn new(controller: TreeController) -> (Self, mpsc::UnboundedReceiver<TreeEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            controller: Arc::new(Mutex::new(controller)),
            events,
        };
        (session, rx)
    }

    /// Lock the controller for a synchronous intent or read.
    pub fn lock(&self) -> MutexGuard<'_, TreeController> {
        self.controller.lock().expect("tree lock poisoned")
    }

    /// Comfort a worry and start its fall timer.
    ///
    /// The timer cannot be cancelled: once this returns `Ok`, the worry will
    /// be removed after the fall duration. The returned handle resolves when
    /// the removal has happened.
    pub fn confirm_comfort(
        &self,
        id: WorryId,
        comfort_text: &str,
    ) -> Result<JoinHandle<()>, LifecycleError> {
        let scheduled = self.lock().confirm_comfort(id, comfort_text)?;
        let _ = self.events.send(TreeEvent::WorryFalling(id));

        let session = self.clone();
        Ok(tokio::spawn(async move {
            tokio::time::sleep(scheduled.after).await;
            session.finish_fall(scheduled.worry_id);
        }))
    }

    fn finish_fall(&self, id: WorryId) {
        let outcome = self.lock().complete_fall(id);
        match outcome {
            Ok(FallOutcome::Removed) => {
                let _ = self.events.send(TreeEvent::WorryRemoved(id));
            }
            Ok(FallOutcome::AllCleared) => {
                let _ = self.events.send(TreeEvent::WorryRemoved(id));
                let _ = self.events.send(TreeEvent::AllCleared);
            }
            Err(e) => tracing::warn!(worry_id = %id, "fall finished for unknown worry: {}", e),
        }
    }
}
