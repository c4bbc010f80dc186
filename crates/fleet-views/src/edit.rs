//! Inline grid edits and the batch save

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fleet_core::data::{BoatDataService, Notifier};
use fleet_core::{
    Boat, BoatId, EditBatch, FieldEdit, FleetError, LoadingIndicator, Notification, Result,
};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::results::ResultsStore;
use crate::DashboardContext;

pub const SUCCESS_TITLE: &str = "Success";
pub const MESSAGE_SHIP_IT: &str = "Ship it!";
pub const ERROR_TITLE: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Editing,
    Saving,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// There were no drafts
    NothingToSave,
    Saved,
    /// The data service rejected the batch; drafts are kept
    Failed(FleetError),
}

/// Ends a save: clears the saving flag and, once loading was signalled,
/// signals done. Runs even if the save future is dropped.
struct SaveGuard {
    saving: Arc<AtomicBool>,
    loading: Arc<LoadingIndicator>,
    signalled: bool,
}

impl SaveGuard {
    fn signal_loading(&mut self) {
        self.loading.start();
        self.signalled = true;
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        if self.signalled {
            self.loading.done();
        }
        self.saving.store(false, Ordering::Release);
    }
}

/// Draft edits over the results grid.
///
/// Drafts never touch the canonical list in [`ResultsStore`]; they are sent
/// as one batch by [`save`](Self::save), after which the store is refreshed
/// whether or not the save succeeded.
pub struct EditTransaction {
    drafts: Mutex<EditBatch>,
    saving: Arc<AtomicBool>,
    results: Arc<ResultsStore>,
    service: Arc<dyn BoatDataService>,
    notifier: Arc<dyn Notifier>,
    loading: Arc<LoadingIndicator>,
}

impl EditTransaction {
    pub fn new(context: &DashboardContext, results: Arc<ResultsStore>) -> Self {
        Self {
            drafts: Mutex::new(EditBatch::new()),
            saving: Arc::new(AtomicBool::new(false)),
            results,
            service: context.service.clone(),
            notifier: context.notifier.clone(),
            loading: context.loading.clone(),
        }
    }

    pub fn state(&self) -> EditState {
        if self.saving.load(Ordering::Acquire) {
            EditState::Saving
        } else if self.drafts.lock().is_empty() {
            EditState::Idle
        } else {
            EditState::Editing
        }
    }

    /// Record a cell edit
    pub fn edit(&self, boat_id: impl Into<BoatId>, edit: FieldEdit) -> Result<()> {
        if self.saving.load(Ordering::Acquire) {
            return Err(FleetError::SaveInProgress);
        }
        self.drafts
            .lock()
            .entry(boat_id.into())
            .or_default()
            .merge(edit);
        Ok(())
    }

    /// Drop every draft
    pub fn discard(&self) -> Result<()> {
        if self.saving.load(Ordering::Acquire) {
            return Err(FleetError::SaveInProgress);
        }
        self.drafts.lock().clear();
        Ok(())
    }

    pub fn draft_batch(&self) -> EditBatch {
        self.drafts.lock().clone()
    }

    /// `boats` with the pending drafts applied
    pub fn overlay(&self, boats: &[Boat]) -> Vec<Boat> {
        let drafts = self.drafts.lock();
        boats
            .iter()
            .map(|boat| {
                let mut row = boat.clone();
                if let Some(patch) = drafts.get(&boat.id) {
                    patch.apply(&mut row);
                }
                row
            })
            .collect()
    }

    /// Grid rows as currently displayed
    pub fn rows(&self) -> Vec<Boat> {
        self.overlay(&self.results.boats())
    }

    /// Send the drafts as one batch, then refresh the results.
    ///
    /// Returns an error without contacting the data service when another
    /// save is running or a draft does not validate.
    pub async fn save(&self) -> Result<SaveOutcome> {
        if self.saving.swap(true, Ordering::AcqRel) {
            return Err(FleetError::SaveInProgress);
        }
        let mut guard = SaveGuard {
            saving: self.saving.clone(),
            loading: self.loading.clone(),
            signalled: false,
        };

        let batch = self.draft_batch();
        if batch.is_empty() {
            return Ok(SaveOutcome::NothingToSave);
        }
        for (boat_id, patch) in &batch {
            if let Err(error) = patch.validate(boat_id) {
                self.notifier
                    .notify(Notification::error(ERROR_TITLE, error.user_message()));
                return Err(error);
            }
        }

        guard.signal_loading();
        info!(boats = batch.len(), "Saving draft edits");

        let outcome = match self.service.save_boat_batch(&batch).await {
            Ok(()) => {
                self.notifier
                    .notify(Notification::success(SUCCESS_TITLE, MESSAGE_SHIP_IT));
                self.drafts.lock().clear();
                SaveOutcome::Saved
            }
            Err(error) => {
                warn!(%error, "Save failed, keeping drafts");
                self.notifier
                    .notify(Notification::error(ERROR_TITLE, error.user_message()));
                SaveOutcome::Failed(error)
            }
        };

        self.results.refresh().await;
        drop(guard);
        Ok(outcome)
    }
}
