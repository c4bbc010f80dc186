//! Wiring of the dashboard components

use std::sync::Arc;

use fleet_core::events::ListenerId;
use fleet_core::{LoadingIndicator, SelectionBus};
use tracing::info;

use crate::detail::DetailBinder;
use crate::edit::EditTransaction;
use crate::filter::FilterController;
use crate::proximity::ProximitySearch;
use crate::results::ResultsStore;
use crate::reviews::ReviewsPanel;
use crate::DashboardContext;

/// The whole fleet browser: filter, results grid, detail tabs and map.
///
/// Components share one selection bus and one loading indicator taken from
/// the context. A filter change reaches the results grid and the map
/// directly; a row selection reaches the detail tabs over the bus.
pub struct Dashboard {
    context: DashboardContext,
    filter: Arc<FilterController>,
    results: Arc<ResultsStore>,
    edits: Arc<EditTransaction>,
    detail: Arc<DetailBinder>,
    proximity: Arc<ProximitySearch>,
    filter_listener: ListenerId,
}

impl Dashboard {
    pub fn new(context: DashboardContext) -> Self {
        let filter = Arc::new(FilterController::new(&context));
        let results = Arc::new(ResultsStore::new(&context));
        let edits = Arc::new(EditTransaction::new(&context, results.clone()));
        let reviews = Arc::new(ReviewsPanel::new(&context));
        let detail = Arc::new(DetailBinder::new(&context, reviews));
        let proximity = Arc::new(ProximitySearch::new(&context));

        let filter_listener = {
            let results = Arc::downgrade(&results);
            let proximity = Arc::downgrade(&proximity);
            filter.on_change(move |state| {
                if let Some(results) = results.upgrade() {
                    results.search_boats(state.boat_type_id.clone());
                }
                if let Some(proximity) = proximity.upgrade() {
                    proximity.set_boat_type_id(state.boat_type_id.clone());
                }
            })
        };

        Self {
            context,
            filter,
            results,
            edits,
            detail,
            proximity,
            filter_listener,
        }
    }

    /// Connect the detail tabs, load the boat types, run the initial search
    /// and locate the user
    pub async fn start(&self, initial_boat_type_id: &str) {
        info!(boat_type_id = %initial_boat_type_id, "Starting dashboard");
        self.detail.connect();
        self.filter.load_types().await;
        self.filter.select(initial_boat_type_id);
        self.proximity.initialize().await;
    }

    /// Wait until the results grid and the map have settled
    pub async fn settled(&self) {
        self.results.settled().await;
        self.proximity.settled().await;
        self.context.bus.flush().await;
    }

    pub fn filter(&self) -> &Arc<FilterController> {
        &self.filter
    }

    pub fn results(&self) -> &Arc<ResultsStore> {
        &self.results
    }

    pub fn edits(&self) -> &Arc<EditTransaction> {
        &self.edits
    }

    pub fn detail(&self) -> &Arc<DetailBinder> {
        &self.detail
    }

    pub fn reviews(&self) -> &Arc<ReviewsPanel> {
        self.detail.reviews()
    }

    pub fn proximity(&self) -> &Arc<ProximitySearch> {
        &self.proximity
    }

    pub fn bus(&self) -> &SelectionBus {
        &self.context.bus
    }

    pub fn loading(&self) -> &Arc<LoadingIndicator> {
        &self.context.loading
    }

    /// State of the search container spinner
    pub fn is_loading(&self) -> bool {
        self.context.loading.is_loading()
    }

    /// Detach from the bus and the filter
    pub fn shutdown(&self) {
        self.detail.disconnect();
        self.filter.off(self.filter_listener);
        info!("Dashboard shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{boat, review, FakeService, Harness};
    use fleet_core::{BoatSelected, BoatType, FieldEdit};
    use rust_decimal::Decimal;

    fn service() -> Arc<FakeService> {
        let service = FakeService::with_boats(vec![
            boat("B1", "Zephyr", "T1"),
            boat("B7", "Sea Breeze", "T1"),
            boat("B9", "Marlin", "T2"),
        ]);
        service.set_types(vec![
            BoatType { id: "T2".to_string(), name: "Power Boat".to_string() },
            BoatType { id: "T1".to_string(), name: "Sailboat".to_string() },
        ]);
        service.set_nearby(vec![boat("B9", "Marlin", "T2")]);
        service.set_reviews(vec![review("R1", "B7")]);
        service
    }

    #[tokio::test]
    async fn test_start_runs_initial_search_and_map() {
        let harness = Harness::new(service());
        let dashboard = Dashboard::new(harness.context.clone());

        dashboard.start("").await;
        dashboard.settled().await;

        assert_eq!(dashboard.filter().options().map(|o| o.len()), Some(3));
        assert_eq!(dashboard.results().boats().len(), 3);
        assert_eq!(dashboard.proximity().markers().len(), 2);
        assert!(dashboard.detail().is_connected());
        assert!(!dashboard.is_loading());
    }

    #[tokio::test]
    async fn test_filter_change_queries_type_once() {
        let harness = Harness::new(service());
        let dashboard = Dashboard::new(harness.context.clone());
        dashboard.start("").await;
        dashboard.settled().await;

        dashboard.filter().select("T1");
        assert!(dashboard.is_loading());
        dashboard.settled().await;

        let queries = harness.service.boat_queries.lock().clone();
        assert_eq!(queries.iter().filter(|q| q.as_str() == "T1").count(), 1);
        assert_eq!(dashboard.results().boats().len(), 2);
        let nearby = harness.service.nearby_queries.lock().clone();
        assert_eq!(nearby.last().map(|q| q.2.as_str()), Some("T1"));
        assert!(!dashboard.is_loading());
    }

    #[tokio::test]
    async fn test_row_selection_reaches_detail_tabs() {
        let harness = Harness::new(service());
        let dashboard = Dashboard::new(harness.context.clone());
        dashboard.start("T1").await;
        dashboard.settled().await;

        dashboard.results().select_boat("B7");
        dashboard.bus().flush().await;
        dashboard.detail().record_settled().await;
        dashboard.reviews().settled().await;

        assert_eq!(dashboard.detail().boat_name().as_deref(), Some("Sea Breeze"));
        assert_eq!(dashboard.reviews().reviews().len(), 1);
        assert_eq!(dashboard.results().tile_class("B7"), crate::TILE_WRAPPER_SELECTED_CLASS);
    }

    #[tokio::test]
    async fn test_edit_and_save_through_dashboard() {
        let harness = Harness::new(service());
        let dashboard = Dashboard::new(harness.context.clone());
        dashboard.start("T1").await;
        dashboard.settled().await;

        dashboard
            .edits()
            .edit("B1", FieldEdit::Price(Decimal::new(9999, 0)))
            .unwrap();
        dashboard.edits().save().await.unwrap();

        let b1 = dashboard.results().boats().into_iter().find(|b| b.id == "B1");
        assert_eq!(b1.map(|b| b.price), Some(Decimal::new(9999, 0)));
        assert!(dashboard.edits().draft_batch().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_detaches() {
        let harness = Harness::new(service());
        let dashboard = Dashboard::new(harness.context.clone());
        dashboard.start("").await;
        dashboard.settled().await;

        dashboard.shutdown();
        assert_eq!(harness.context.bus.subscriber_count::<BoatSelected>(), 0);

        let before = harness.service.boat_queries.lock().len();
        dashboard.filter().select("T2");
        assert_eq!(harness.service.boat_queries.lock().len(), before);
        assert_eq!(dashboard.results().filter().map(|f| f.boat_type_id), Some(String::new()));
    }
}
