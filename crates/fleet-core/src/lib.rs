//! Core functionality for the fleet dashboard
//!
//! This crate provides the state synchronization primitives shared by the
//! dashboard components: the selection bus, the reactive query controller,
//! the loading indicator and the collaborator interfaces.

pub mod error;
pub mod events;
pub mod model;
pub mod query;
pub mod sync;

// Re-export commonly used types
pub use error::{FleetError, Result};
pub use events::{BoatSelected, Listeners, SelectionBus, Subscription, Topic};
pub use model::{
    Boat, BoatId, BoatPatch, BoatType, EditBatch, FieldEdit, FilterState, Geolocation,
    MapMarker, Notification, NotificationVariant, RecordSnapshot, Review, SearchOption,
    SelectionEvent,
};
pub use query::{QueryFuture, QueryResult, ReactiveQueryController};
pub use sync::{LoadingIndicator, LoadingSignal};
pub use data::{BoatDataService, Navigator, Notifier, PositionProvider, RecordResolver};

/// Interfaces of the collaborators the dashboard talks to
pub mod data {
    use crate::model::{Boat, BoatType, EditBatch, Geolocation, Notification, RecordSnapshot, Review};
    use crate::Result;

    /// Backend queries and mutations
    #[async_trait::async_trait]
    pub trait BoatDataService: Send + Sync {
        /// Boats of the given type, or every boat for an empty id
        async fn query_boats(&self, boat_type_id: &str) -> Result<Vec<Boat>>;

        /// Boats closest to a position, nearest first
        async fn query_boats_by_location(
            &self,
            latitude: f64,
            longitude: f64,
            boat_type_id: &str,
        ) -> Result<Vec<Boat>>;

        /// Every boat type
        async fn query_boat_types(&self) -> Result<Vec<BoatType>>;

        /// Reviews of one boat, newest first
        async fn query_reviews(&self, boat_id: &str) -> Result<Vec<Review>>;

        /// Apply a whole batch of edits; either every patch lands or none does
        async fn save_boat_batch(&self, batch: &EditBatch) -> Result<()>;
    }

    /// Record lookup used by the detail tabs
    #[async_trait::async_trait]
    pub trait RecordResolver: Send + Sync {
        async fn resolve_record(&self, id: &str, fields: &[&str]) -> Result<RecordSnapshot>;
    }

    /// Source of the user's current position
    #[async_trait::async_trait]
    pub trait PositionProvider: Send + Sync {
        async fn acquire_position(&self) -> Result<Geolocation>;
    }

    /// Fire-and-forget delivery of transient messages
    pub trait Notifier: Send + Sync {
        fn notify(&self, notification: Notification);
    }

    /// Fire-and-forget navigation to a record page
    pub trait Navigator: Send + Sync {
        fn navigate_to_record(&self, record_id: &str);
    }
}
