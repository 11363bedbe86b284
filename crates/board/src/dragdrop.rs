//! Drag and drop of cards between board columns.
//!
//! The controller is a small state machine: a drag starts on a card, and a
//! drop on a registered zone moves that card to the zone's column. Moves are
//! optimistic: the local column changes at once, and a failed write is only
//! logged.
//!
//! All methods take `&self`. The drag state sits behind a `std` mutex that
//! is only held for the state change itself, so a drop waiting on the store
//! never blocks starting or cancelling the next drag.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use join_protocol::{MainCategory, TaskId};
use tracing::{debug, instrument, warn};

use crate::error::{BoardError, Result};
use crate::repository::TaskRepository;

/// Drag state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    /// No card is being dragged.
    #[default]
    Idle,
    /// The given card is being dragged.
    Dragging(TaskId),
}

/// Registry of drop zones by name.
///
/// The default registry has one zone per column, named after the column's
/// wire name (`"ToDo"`, `"InProgress"`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropZones {
    zones: HashMap<String, MainCategory>,
}

impl Default for DropZones {
    fn default() -> Self {
        let mut zones = Self::empty();
        for category in MainCategory::all() {
            zones.register(category.as_str(), category);
        }
        zones
    }
}

impl DropZones {
    /// Creates a registry without any zone.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            zones: HashMap::new(),
        }
    }

    /// Registers `name` as a drop zone for `category`, replacing any
    /// previous registration.
    pub fn register(&mut self, name: impl Into<String>, category: MainCategory) {
        self.zones.insert(name.into(), category);
    }

    /// Removes a zone. Returns the column it was bound to.
    pub fn unregister(&mut self, name: &str) -> Option<MainCategory> {
        self.zones.remove(name)
    }

    /// Returns the column a zone drops into.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<MainCategory> {
        self.zones.get(name).copied()
    }
}

/// What a drop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The card was moved; the write may still have failed.
    Moved {
        /// The moved card.
        id: TaskId,
        /// Its new column.
        category: MainCategory,
    },
    /// No drag was in progress.
    NothingDragged,
    /// The zone is not registered.
    UnknownZone(String),
    /// The dragged card is no longer loaded.
    TaskGone(TaskId),
}

/// Tracks the current drag and applies drops.
///
/// Clones share the drag state and the zone registry.
#[derive(Debug, Clone)]
pub struct DragDropController {
    repo: TaskRepository,
    zones: Arc<RwLock<DropZones>>,
    state: Arc<Mutex<DragState>>,
}

impl DragDropController {
    /// Creates an idle controller with the default zones.
    #[must_use]
    pub fn new(repo: TaskRepository) -> Self {
        Self::with_zones(repo, DropZones::default())
    }

    /// Creates an idle controller with the given zones.
    #[must_use]
    pub fn with_zones(repo: TaskRepository, zones: DropZones) -> Self {
        Self {
            repo,
            zones: Arc::new(RwLock::new(zones)),
            state: Arc::new(Mutex::new(DragState::Idle)),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> DragState {
        self.lock_state().clone()
    }

    /// Returns a copy of the zone registry.
    #[must_use]
    pub fn zones(&self) -> DropZones {
        self.zones.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Changes the zone registry, for columns added or removed at runtime.
    pub fn update_zones<R>(&self, f: impl FnOnce(&mut DropZones) -> R) -> R {
        f(&mut self.zones.write().unwrap_or_else(PoisonError::into_inner))
    }

    /// Starts dragging a card, replacing any drag in progress.
    pub fn start_drag(&self, id: TaskId) {
        debug!(task_id = %id, "drag started");
        *self.lock_state() = DragState::Dragging(id);
    }

    /// Returns `true` if `zone` accepts drops.
    #[must_use]
    pub fn allow_drop(&self, zone: &str) -> bool {
        self.resolve(zone).is_some()
    }

    /// Ends the drag without a drop.
    pub fn cancel(&self) {
        let previous = std::mem::take(&mut *self.lock_state());
        if let DragState::Dragging(id) = previous {
            debug!(task_id = %id, "drag cancelled");
        }
    }

    /// Drops the dragged card on `zone`.
    ///
    /// The controller is idle afterwards, whatever happened. Unknown zones
    /// and drops without a drag send nothing; a failed write is logged and
    /// the local move is kept.
    #[instrument(skip(self))]
    pub async fn drop_on(&self, zone: &str) -> DropOutcome {
        let taken = std::mem::take(&mut *self.lock_state());
        let DragState::Dragging(id) = taken else {
            return DropOutcome::NothingDragged;
        };
        let Some(category) = self.resolve(zone) else {
            debug!("dropped outside any zone");
            return DropOutcome::UnknownZone(zone.to_string());
        };

        match self.repo.set_status(&id, category).await {
            Err(BoardError::TaskNotFound(id)) => DropOutcome::TaskGone(id),
            result => {
                if let Err(e) = result {
                    warn!(task_id = %id, error = %e, "move not persisted");
                }
                DropOutcome::Moved { id, category }
            }
        }
    }

    /// Moves a card to `category` without dragging.
    ///
    /// # Errors
    ///
    /// See [`TaskRepository::set_status`].
    pub async fn move_to(&self, id: &TaskId, category: MainCategory) -> Result<()> {
        self.repo.set_status(id, category).await
    }

    fn resolve(&self, zone: &str) -> Option<MainCategory> {
        self.zones
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(zone)
    }

    fn lock_state(&self) -> MutexGuard<'_, DragState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
