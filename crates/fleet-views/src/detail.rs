//! Detail tabs bound to the selected boat

use std::sync::{Arc, Weak};

use fleet_core::data::Navigator;
use fleet_core::{
    BoatId, BoatSelected, QueryResult, ReactiveQueryController, RecordSnapshot, SelectionBus,
    SelectionEvent, Subscription,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::reviews::ReviewsPanel;
use crate::DashboardContext;

/// Fields resolved for the detail tab
pub const BOAT_FIELDS: &[&str] = &["Id", "Name"];

pub const DETAILS_TAB_ICON: &str = "utility:anchor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Details,
    Reviews,
    AddReview,
}

#[derive(Default)]
struct DetailState {
    boat_id: Option<BoatId>,
    active_tab: DetailTab,
}

struct DetailInner {
    state: RwLock<DetailState>,
    record: ReactiveQueryController<BoatId, RecordSnapshot>,
    reviews: Arc<ReviewsPanel>,
    navigator: Arc<dyn Navigator>,
}

impl DetailInner {
    fn bind(&self, event: &SelectionEvent) {
        let boat_id = event.record_id.clone();
        debug!(boat_id = %boat_id, "Binding detail tabs");
        self.state.write().boat_id = Some(boat_id.clone());
        self.record.set_params(boat_id.clone());
        self.reviews.set_boat_id(boat_id);
    }
}

/// Listens for boat selections and resolves the selected record.
///
/// Selections arrive over the bus from components that are not related to
/// the binder; whichever id was published last wins, even when an earlier
/// record lookup settles after it.
pub struct DetailBinder {
    inner: Arc<DetailInner>,
    bus: SelectionBus,
    subscription: Mutex<Option<Subscription>>,
}

impl DetailBinder {
    pub fn new(context: &DashboardContext, reviews: Arc<ReviewsPanel>) -> Self {
        let records = context.records.clone();
        let record = ReactiveQueryController::new("boat-record", move |boat_id: BoatId| {
            let records = records.clone();
            async move { records.resolve_record(&boat_id, BOAT_FIELDS).await }
        });

        Self {
            inner: Arc::new(DetailInner {
                state: RwLock::new(DetailState::default()),
                record,
                reviews,
                navigator: context.navigator.clone(),
            }),
            bus: context.bus.clone(),
            subscription: Mutex::new(None),
        }
    }

    /// Start listening for selections; returns false if already connected
    pub fn connect(&self) -> bool {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return false;
        }

        let inner: Weak<DetailInner> = Arc::downgrade(&self.inner);
        *subscription = Some(self.bus.subscribe::<BoatSelected>(move |event| {
            if let Some(inner) = inner.upgrade() {
                inner.bind(event);
            }
        }));
        info!("Detail binder connected");
        true
    }

    pub fn disconnect(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.unsubscribe();
            info!("Detail binder disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.lock().is_some()
    }

    pub fn boat_id(&self) -> Option<BoatId> {
        self.inner.state.read().boat_id.clone()
    }

    pub fn has_selection(&self) -> bool {
        self.inner.state.read().boat_id.is_some()
    }

    pub fn record(&self) -> Option<RecordSnapshot> {
        self.inner.record.result().data
    }

    pub fn record_result(&self) -> QueryResult<RecordSnapshot> {
        self.inner.record.result()
    }

    /// Wait for the latest record lookup
    pub async fn record_settled(&self) -> QueryResult<RecordSnapshot> {
        self.inner.record.settled().await
    }

    pub fn boat_name(&self) -> Option<String> {
        let record = self.record()?;
        record
            .field_value("Name")
            .and_then(|value| value.as_str())
            .map(str::to_string)
    }

    pub fn details_tab_icon_name(&self) -> Option<&'static str> {
        self.record().map(|_| DETAILS_TAB_ICON)
    }

    pub fn navigate_to_record_view(&self) {
        if let Some(boat_id) = self.boat_id() {
            self.inner.navigator.navigate_to_record(&boat_id);
        }
    }

    pub fn active_tab(&self) -> DetailTab {
        self.inner.state.read().active_tab
    }

    pub fn set_active_tab(&self, tab: DetailTab) {
        self.inner.state.write().active_tab = tab;
    }

    pub fn reviews(&self) -> &Arc<ReviewsPanel> {
        &self.inner.reviews
    }

    /// A review was added from the add-review tab: show and reload the list
    pub async fn handle_review_created(&self) {
        self.set_active_tab(DetailTab::Reviews);
        self.inner.reviews.refresh().await;
    }
}

impl Drop for DetailBinder {
    fn drop(&mut self) {
        self.disconnect();
    }
}
