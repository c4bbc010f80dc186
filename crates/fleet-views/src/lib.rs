//! Dashboard components for the fleet browser
//!
//! Each component owns one slice of dashboard state and talks to its peers
//! only through the shared [`DashboardContext`]: the selection bus, the
//! loading indicator and the external collaborators.

mod dashboard;
mod detail;
mod edit;
mod filter;
mod proximity;
mod results;
mod reviews;

#[cfg(test)]
mod test_support;

pub use dashboard::Dashboard;
pub use detail::{DetailBinder, DetailTab, BOAT_FIELDS, DETAILS_TAB_ICON};
pub use edit::{EditState, EditTransaction, SaveOutcome};
pub use filter::{FilterController, ALL_TYPES_LABEL};
pub use proximity::{create_map_markers, PositionState, ProximityParams, ProximitySearch};
pub use results::{ResultsStore, TILE_WRAPPER_SELECTED_CLASS, TILE_WRAPPER_UNSELECTED_CLASS};
pub use reviews::ReviewsPanel;

use std::sync::Arc;

use fleet_core::data::{BoatDataService, Navigator, Notifier, PositionProvider, RecordResolver};
use fleet_core::{LoadingIndicator, SelectionBus};

/// Context shared by every component of one dashboard
#[derive(Clone)]
pub struct DashboardContext {
    /// Backend queries and the batch save
    pub service: Arc<dyn BoatDataService>,

    /// Record lookup for the detail tabs
    pub records: Arc<dyn RecordResolver>,

    /// Current position source for the proximity map
    pub position: Arc<dyn PositionProvider>,

    /// Toast delivery
    pub notifier: Arc<dyn Notifier>,

    /// Record page navigation
    pub navigator: Arc<dyn Navigator>,

    /// Application-wide selection channel
    pub bus: SelectionBus,

    /// Spinner state of the search container
    pub loading: Arc<LoadingIndicator>,
}

impl DashboardContext {
    /// Build a context with a fresh bus and loading indicator.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        service: Arc<dyn BoatDataService>,
        records: Arc<dyn RecordResolver>,
        position: Arc<dyn PositionProvider>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            service,
            records,
            position,
            notifier,
            navigator,
            bus: SelectionBus::new(),
            loading: Arc::new(LoadingIndicator::new()),
        }
    }
}
