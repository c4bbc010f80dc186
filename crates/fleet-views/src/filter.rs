//! Boat type filter

use fleet_core::events::{ListenerId, Listeners};
use fleet_core::{BoatType, FilterState, FleetError, QueryResult, ReactiveQueryController, SearchOption};
use parking_lot::RwLock;
use tracing::info;

use crate::DashboardContext;

/// Label of the synthetic option that clears the filter
pub const ALL_TYPES_LABEL: &str = "All Types";

/// Owns the selected boat type and announces changes to it.
///
/// The controller never queries boats itself; listeners registered with
/// [`on_change`](Self::on_change) decide what a new filter means.
pub struct FilterController {
    types: ReactiveQueryController<(), Vec<BoatType>>,
    selected: RwLock<FilterState>,
    listeners: Listeners<FilterState>,
}

impl FilterController {
    pub fn new(context: &DashboardContext) -> Self {
        let service = context.service.clone();
        let types = ReactiveQueryController::new("boat-types", move |()| {
            let service = service.clone();
            async move { service.query_boat_types().await }
        });

        Self {
            types,
            selected: RwLock::new(FilterState::default()),
            listeners: Listeners::new(),
        }
    }

    /// Fetch the boat types; later calls reuse the first fetch
    pub async fn load_types(&self) -> QueryResult<Vec<BoatType>> {
        self.types.set_params(());
        self.types.settled().await
    }

    /// Picker options with "All Types" first, or `None` until types load
    pub fn options(&self) -> Option<Vec<SearchOption>> {
        let types = self.types.result().data?;
        let mut options = Vec::with_capacity(types.len() + 1);
        options.push(SearchOption {
            label: ALL_TYPES_LABEL.to_string(),
            value: String::new(),
        });
        options.extend(types.into_iter().map(|boat_type| SearchOption {
            label: boat_type.name,
            value: boat_type.id,
        }));
        Some(options)
    }

    pub fn error(&self) -> Option<FleetError> {
        self.types.result().error
    }

    pub fn selected_boat_type_id(&self) -> String {
        self.selected.read().boat_type_id.clone()
    }

    pub fn filter(&self) -> FilterState {
        self.selected.read().clone()
    }

    /// Record the user's choice and emit filter-changed
    pub fn select(&self, boat_type_id: impl Into<String>) {
        let filter = FilterState::new(boat_type_id);
        *self.selected.write() = filter.clone();
        info!(boat_type_id = %filter.boat_type_id, "Filter changed");
        self.listeners.emit(&filter);
    }

    pub fn on_change(&self, callback: impl Fn(&FilterState) + Send + Sync + 'static) -> ListenerId {
        self.listeners.on(callback)
    }

    pub fn off(&self, id: ListenerId) {
        self.listeners.off(id);
    }
}
