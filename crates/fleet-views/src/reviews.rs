//! Reviews of the selected boat

use std::future::Future;
use std::sync::Arc;

use fleet_core::data::Navigator;
use fleet_core::{BoatId, QueryResult, ReactiveQueryController, Review};

use crate::DashboardContext;

/// Reviews for the currently bound boat.
///
/// Binding the same id twice does not refetch; [`refresh`](Self::refresh)
/// always does, which is how the panel picks up a review created next to it.
pub struct ReviewsPanel {
    query: ReactiveQueryController<BoatId, Vec<Review>>,
    navigator: Arc<dyn Navigator>,
}

impl ReviewsPanel {
    pub fn new(context: &DashboardContext) -> Self {
        let service = context.service.clone();
        let query = ReactiveQueryController::new("reviews", move |boat_id: BoatId| {
            let service = service.clone();
            async move {
                if boat_id.is_empty() {
                    return Ok(Vec::new());
                }
                service.query_reviews(&boat_id).await
            }
        });

        Self {
            query,
            navigator: context.navigator.clone(),
        }
    }

    /// Bind the panel to a boat; returns whether a fetch was issued
    pub fn set_boat_id(&self, boat_id: impl Into<BoatId>) -> bool {
        self.query.set_params(boat_id.into())
    }

    /// Re-fetch the reviews of the bound boat.
    ///
    /// Without a bound boat nothing is fetched and the result is empty.
    pub fn refresh(&self) -> impl Future<Output = QueryResult<Vec<Review>>> + Send + 'static {
        let pending = self.query.params().map(|_| self.query.refetch());
        async move {
            match pending {
                Some(refetch) => refetch.await,
                None => QueryResult::ready(Vec::new()),
            }
        }
    }

    pub async fn settled(&self) -> QueryResult<Vec<Review>> {
        self.query.settled().await
    }

    pub fn boat_id(&self) -> Option<BoatId> {
        self.query.params().filter(|id| !id.is_empty())
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.query.result().data.unwrap_or_default()
    }

    pub fn reviews_to_show(&self) -> bool {
        self.query
            .result()
            .data
            .map(|reviews| !reviews.is_empty())
            .unwrap_or(false)
    }

    pub fn result(&self) -> QueryResult<Vec<Review>> {
        self.query.result()
    }

    pub fn is_loading(&self) -> bool {
        self.query.is_loading()
    }

    /// Open the bound boat's record page
    pub fn navigate_to_record(&self) {
        if let Some(boat_id) = self.boat_id() {
            self.navigator.navigate_to_record(&boat_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{boat, review, run_pending_tasks, FakeService, Harness};

    fn service() -> Arc<FakeService> {
        let service = FakeService::with_boats(vec![boat("B7", "Sea Breeze", "T1")]);
        service.set_reviews(vec![review("R1", "B7"), review("R2", "B7"), review("R3", "B1")]);
        service
    }

    #[tokio::test]
    async fn test_same_boat_id_fetches_once() {
        let harness = Harness::new(service());
        let panel = ReviewsPanel::new(&harness.context);

        assert!(panel.set_boat_id("B7"));
        assert!(!panel.set_boat_id("B7"));
        panel.settled().await;
        assert!(!panel.set_boat_id("B7"));
        run_pending_tasks().await;

        assert_eq!(*harness.service.review_queries.lock(), vec!["B7".to_string()]);
        assert_eq!(panel.reviews().len(), 2);
        assert!(panel.reviews_to_show());
    }

    #[tokio::test]
    async fn test_refresh_always_refetches() {
        let harness = Harness::new(service());
        let panel = ReviewsPanel::new(&harness.context);
        panel.set_boat_id("B7");
        panel.settled().await;

        harness.service.set_reviews(vec![
            review("R1", "B7"),
            review("R2", "B7"),
            review("R4", "B7"),
        ]);
        let result = panel.refresh().await;

        assert_eq!(result.data.map(|r| r.len()), Some(3));
        assert_eq!(harness.service.review_queries.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_unbound_panel_is_empty_without_fetching() {
        let harness = Harness::new(service());
        let panel = ReviewsPanel::new(&harness.context);

        let result = panel.refresh().await;
        assert_eq!(result, QueryResult::ready(Vec::new()));

        panel.set_boat_id("");
        let result = panel.settled().await;
        assert_eq!(result.data, Some(Vec::new()));
        assert!(!panel.reviews_to_show());
        assert!(panel.boat_id().is_none());
        assert!(harness.service.review_queries.lock().is_empty());

        panel.navigate_to_record();
        assert!(harness.navigator.visited.lock().is_empty());
    }

    #[tokio::test]
    async fn test_navigate_to_bound_boat() {
        let harness = Harness::new(service());
        let panel = ReviewsPanel::new(&harness.context);
        panel.set_boat_id("B7");

        panel.navigate_to_record();
        assert_eq!(*harness.navigator.visited.lock(), vec!["B7".to_string()]);
    }
}
