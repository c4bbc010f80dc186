//! Scripted collaborators for component tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fleet_core::data::{BoatDataService, Navigator, Notifier, PositionProvider, RecordResolver};
use fleet_core::{
    Boat, BoatType, EditBatch, FleetError, Geolocation, Notification, RecordSnapshot, Result, Review,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::oneshot;

use crate::DashboardContext;

pub fn boat(id: &str, name: &str, type_id: &str) -> Boat {
    Boat {
        id: id.to_string(),
        name: name.to_string(),
        boat_type_id: type_id.to_string(),
        length: 30.0,
        price: Decimal::new(100_000, 0),
        description: String::new(),
        picture_url: String::new(),
        geolocation: Geolocation::new(37.8, -122.4),
    }
}

pub fn review(id: &str, boat_id: &str) -> Review {
    Review {
        id: id.to_string(),
        boat_id: boat_id.to_string(),
        author: "Skipper".to_string(),
        rating: 5,
        text: "Great boat".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
    }
}

/// Let spawned tasks run on the current-thread test runtime
pub async fn run_pending_tasks() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[derive(Default)]
struct FakeData {
    boats: Vec<Boat>,
    types: Vec<BoatType>,
    reviews: Vec<Review>,
    nearby: Vec<Boat>,
    fail_boats: Option<String>,
    fail_nearby: Option<String>,
    fail_save: Option<String>,
}

/// In-memory data service that records every call.
///
/// With gating enabled, `query_boats` and `resolve_record` stay pending until
/// the test releases them, which lets tests settle queries out of order.
#[derive(Default)]
pub struct FakeService {
    data: Mutex<FakeData>,
    gated: Mutex<bool>,
    gates: Mutex<Vec<(String, oneshot::Sender<()>)>>,
    pub boat_queries: Mutex<Vec<String>>,
    pub nearby_queries: Mutex<Vec<(f64, f64, String)>>,
    pub review_queries: Mutex<Vec<String>>,
    pub record_queries: Mutex<Vec<String>>,
    pub type_queries: AtomicUsize,
    pub saves: Mutex<Vec<EditBatch>>,
}

impl FakeService {
    pub fn with_boats(boats: Vec<Boat>) -> Arc<Self> {
        let service = Self::default();
        service.data.lock().boats = boats;
        Arc::new(service)
    }

    pub fn set_types(&self, types: Vec<BoatType>) {
        self.data.lock().types = types;
    }

    pub fn set_reviews(&self, reviews: Vec<Review>) {
        self.data.lock().reviews = reviews;
    }

    pub fn set_nearby(&self, boats: Vec<Boat>) {
        self.data.lock().nearby = boats;
    }

    pub fn fail_boats(&self, message: Option<&str>) {
        self.data.lock().fail_boats = message.map(str::to_string);
    }

    pub fn fail_nearby(&self, message: Option<&str>) {
        self.data.lock().fail_nearby = message.map(str::to_string);
    }

    pub fn fail_save(&self, message: Option<&str>) {
        self.data.lock().fail_save = message.map(str::to_string);
    }

    pub fn enable_gates(&self) {
        *self.gated.lock() = true;
    }

    /// Release the oldest pending gated call for `key`
    pub fn release(&self, key: &str) {
        let sender = {
            let mut gates = self.gates.lock();
            let idx = gates
                .iter()
                .position(|(k, _)| k == key)
                .unwrap_or_else(|| panic!("no pending call for {key}"));
            gates.remove(idx).1
        };
        let _ = sender.send(());
    }

    pub fn pending_gates(&self) -> usize {
        self.gates.lock().len()
    }

    pub fn boats(&self) -> Vec<Boat> {
        self.data.lock().boats.clone()
    }

    async fn wait_gate(&self, key: &str) {
        if !*self.gated.lock() {
            return;
        }
        let (tx, rx) = oneshot::channel();
        self.gates.lock().push((key.to_string(), tx));
        let _ = rx.await;
    }
}

#[async_trait]
impl BoatDataService for FakeService {
    async fn query_boats(&self, boat_type_id: &str) -> Result<Vec<Boat>> {
        self.boat_queries.lock().push(boat_type_id.to_string());
        self.wait_gate(boat_type_id).await;

        let data = self.data.lock();
        if let Some(message) = &data.fail_boats {
            return Err(FleetError::Query(message.clone()));
        }
        Ok(data
            .boats
            .iter()
            .filter(|b| boat_type_id.is_empty() || b.boat_type_id == boat_type_id)
            .cloned()
            .collect())
    }

    async fn query_boats_by_location(
        &self,
        latitude: f64,
        longitude: f64,
        boat_type_id: &str,
    ) -> Result<Vec<Boat>> {
        self.nearby_queries
            .lock()
            .push((latitude, longitude, boat_type_id.to_string()));

        let data = self.data.lock();
        if let Some(message) = &data.fail_nearby {
            return Err(FleetError::Query(message.clone()));
        }
        Ok(data
            .nearby
            .iter()
            .filter(|b| boat_type_id.is_empty() || b.boat_type_id == boat_type_id)
            .cloned()
            .collect())
    }

    async fn query_boat_types(&self) -> Result<Vec<BoatType>> {
        self.type_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.lock().types.clone())
    }

    async fn query_reviews(&self, boat_id: &str) -> Result<Vec<Review>> {
        self.review_queries.lock().push(boat_id.to_string());
        Ok(self
            .data
            .lock()
            .reviews
            .iter()
            .filter(|r| r.boat_id == boat_id)
            .cloned()
            .collect())
    }

    async fn save_boat_batch(&self, batch: &EditBatch) -> Result<()> {
        self.saves.lock().push(batch.clone());

        let mut data = self.data.lock();
        if let Some(message) = &data.fail_save {
            return Err(FleetError::Save(message.clone()));
        }
        for (boat_id, patch) in batch {
            if let Some(boat) = data.boats.iter_mut().find(|b| &b.id == boat_id) {
                patch.apply(boat);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordResolver for FakeService {
    async fn resolve_record(&self, id: &str, fields: &[&str]) -> Result<RecordSnapshot> {
        self.record_queries.lock().push(id.to_string());
        self.wait_gate(id).await;

        let data = self.data.lock();
        let boat = data
            .boats
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| FleetError::Record(format!("no boat {id}")))?;

        let mut values = serde_json::Map::new();
        for field in fields {
            let value = match *field {
                "Id" => serde_json::Value::from(boat.id.clone()),
                "Name" => serde_json::Value::from(boat.name.clone()),
                _ => serde_json::Value::Null,
            };
            values.insert(field.to_string(), value);
        }
        Ok(RecordSnapshot {
            id: id.to_string(),
            fields: values,
        })
    }
}

/// Position provider returning a fixed outcome
pub struct FakePosition {
    outcome: Result<Geolocation>,
    pub calls: AtomicUsize,
}

impl FakePosition {
    pub fn at(latitude: f64, longitude: f64) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(Geolocation::new(latitude, longitude)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn denied() -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(FleetError::Position("User denied Geolocation".to_string())),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PositionProvider for FakePosition {
    async fn acquire_position(&self) -> Result<Geolocation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn taken(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub visited: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate_to_record(&self, record_id: &str) {
        self.visited.lock().push(record_id.to_string());
    }
}

/// A context plus handles on its fakes
pub struct Harness {
    pub context: DashboardContext,
    pub service: Arc<FakeService>,
    pub position: Arc<FakePosition>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(service: Arc<FakeService>) -> Self {
        Self::with_position(service, FakePosition::at(37.7749, -122.4194))
    }

    pub fn with_position(service: Arc<FakeService>, position: Arc<FakePosition>) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let context = DashboardContext::new(
            service.clone(),
            service.clone(),
            position.clone(),
            notifier.clone(),
            navigator.clone(),
        );
        Self {
            context,
            service,
            position,
            notifier,
            navigator,
        }
    }
}
