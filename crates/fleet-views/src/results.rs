//! Search results grid state

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fleet_core::{
    Boat, BoatId, BoatSelected, FilterState, LoadingIndicator, QueryResult,
    ReactiveQueryController, SelectionBus, SelectionEvent,
};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::DashboardContext;

pub const TILE_WRAPPER_SELECTED_CLASS: &str = "tile-wrapper selected";
pub const TILE_WRAPPER_UNSELECTED_CLASS: &str = "tile-wrapper";

/// Canonical boat list for the active filter.
///
/// The list is written only when the boat query settles; everything else
/// reads clones of it. While a search or refresh is outstanding the store
/// holds the shared loading indicator.
pub struct ResultsStore {
    query: ReactiveQueryController<FilterState, Vec<Boat>>,
    bus: SelectionBus,
    loading: Arc<LoadingIndicator>,
    holding: Arc<AtomicBool>,
    selected: RwLock<Option<BoatId>>,
}

impl ResultsStore {
    pub fn new(context: &DashboardContext) -> Self {
        let service = context.service.clone();
        let query = ReactiveQueryController::new("boats", move |filter: FilterState| {
            let service = service.clone();
            async move { service.query_boats(&filter.boat_type_id).await }
        });

        let loading = context.loading.clone();
        let holding = Arc::new(AtomicBool::new(false));
        {
            let loading = loading.clone();
            let holding = holding.clone();
            query.on_settled(move |settlement| {
                if let Ok(boats) = &settlement.outcome {
                    debug!(count = boats.len(), "Boat list replaced");
                }
                if holding.swap(false, Ordering::AcqRel) {
                    loading.done();
                }
            });
        }

        Self {
            query,
            bus: context.bus.clone(),
            loading,
            holding,
            selected: RwLock::new(None),
        }
    }

    /// Take the loading hold; returns false if it was already held
    fn hold(&self) -> bool {
        let newly_held = !self.holding.swap(true, Ordering::AcqRel);
        if newly_held {
            self.loading.start();
        }
        newly_held
    }

    fn release(&self) {
        if self.holding.swap(false, Ordering::AcqRel) {
            self.loading.done();
        }
    }

    /// Search with a new boat type.
    ///
    /// Signals loading before the fetch starts. Returns false when the
    /// filter is unchanged and no query was issued.
    pub fn search_boats(&self, boat_type_id: impl Into<String>) -> bool {
        let filter = FilterState::new(boat_type_id);
        let newly_held = self.hold();
        let issued = self.query.set_params(filter);
        if !issued && newly_held {
            self.release();
        }
        issued
    }

    /// Re-run the current search.
    ///
    /// The returned future resolves after the refetch has settled.
    pub fn refresh(&self) -> impl Future<Output = QueryResult<Vec<Boat>>> + Send + 'static {
        if self.query.params().is_some() {
            self.hold();
        }
        self.query.refetch()
    }

    /// Publish a row selection to the rest of the dashboard
    pub fn select_boat(&self, boat_id: impl Into<BoatId>) {
        let boat_id = boat_id.into();
        info!(boat_id = %boat_id, "Boat selected");
        *self.selected.write() = Some(boat_id.clone());
        self.bus.publish::<BoatSelected>(SelectionEvent { record_id: boat_id });
    }

    /// Wait for the outstanding search, if any
    pub async fn settled(&self) -> QueryResult<Vec<Boat>> {
        self.query.settled().await
    }

    /// Clone of the canonical list; empty before the first success
    pub fn boats(&self) -> Vec<Boat> {
        self.query.result().data.unwrap_or_default()
    }

    pub fn result(&self) -> QueryResult<Vec<Boat>> {
        self.query.result()
    }

    pub fn filter(&self) -> Option<FilterState> {
        self.query.params()
    }

    pub fn is_loading(&self) -> bool {
        self.query.is_loading()
    }

    pub fn selected_boat_id(&self) -> Option<BoatId> {
        self.selected.read().clone()
    }

    /// CSS class of a result tile
    pub fn tile_class(&self, boat_id: &str) -> &'static str {
        if self.selected.read().as_deref() == Some(boat_id) {
            TILE_WRAPPER_SELECTED_CLASS
        } else {
            TILE_WRAPPER_UNSELECTED_CLASS
        }
    }
}
