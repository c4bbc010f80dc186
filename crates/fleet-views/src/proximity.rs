//! Boats near the user's position

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fleet_core::data::{Notifier, PositionProvider};
use fleet_core::{
    Boat, FleetError, Geolocation, MapMarker, Notification, QueryResult, ReactiveQueryController,
};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::DashboardContext;

pub const LABEL_YOU_ARE_HERE: &str = "You are here!";
pub const ICON_STANDARD_USER: &str = "standard:user";
pub const ERROR_TITLE: &str = "Error loading Boats Near Me";

#[derive(Debug, Clone, PartialEq)]
pub enum PositionState {
    Uninitialized,
    AwaitingPosition,
    Acquired(Geolocation),
    Failed(FleetError),
}

/// Key of the proximity query
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityParams {
    pub latitude: f64,
    pub longitude: f64,
    pub boat_type_id: String,
}

impl ProximityParams {
    fn here(&self) -> Geolocation {
        Geolocation::new(self.latitude, self.longitude)
    }
}

/// Markers for `boats`, preceded by the user's own position
pub fn create_map_markers(here: Geolocation, boats: &[Boat]) -> Vec<MapMarker> {
    let mut markers = Vec::with_capacity(boats.len() + 1);
    markers.push(MapMarker {
        location: here,
        title: LABEL_YOU_ARE_HERE.to_string(),
        icon: Some(ICON_STANDARD_USER.to_string()),
    });
    markers.extend(boats.iter().map(|boat| MapMarker {
        location: boat.geolocation,
        title: boat.name.clone(),
        icon: None,
    }));
    markers
}

struct ProximityState {
    position: PositionState,
    boat_type_id: String,
    markers: Vec<MapMarker>,
    rendered: bool,
}

/// Map of nearby boats.
///
/// The position is requested once, on the first [`initialize`](Self::initialize);
/// a denied request is reported and never retried. Failed queries leave the
/// previous markers in place.
pub struct ProximitySearch {
    query: ReactiveQueryController<ProximityParams, Vec<Boat>>,
    state: Arc<RwLock<ProximityState>>,
    initialized: AtomicBool,
    position: Arc<dyn PositionProvider>,
    notifier: Arc<dyn Notifier>,
}

impl ProximitySearch {
    pub fn new(context: &DashboardContext) -> Self {
        let service = context.service.clone();
        let query = ReactiveQueryController::new("boats-near-me", move |params: ProximityParams| {
            let service = service.clone();
            async move {
                service
                    .query_boats_by_location(params.latitude, params.longitude, &params.boat_type_id)
                    .await
            }
        });

        let state = Arc::new(RwLock::new(ProximityState {
            position: PositionState::Uninitialized,
            boat_type_id: String::new(),
            markers: Vec::new(),
            rendered: false,
        }));

        {
            let state = state.clone();
            let notifier = context.notifier.clone();
            query.on_settled(move |settlement| {
                match &settlement.outcome {
                    Ok(boats) => {
                        let markers = create_map_markers(settlement.params.here(), boats);
                        let mut state = state.write();
                        state.markers = markers;
                        state.rendered = true;
                    }
                    Err(error) => {
                        state.write().rendered = true;
                        notifier.notify(Notification::error(ERROR_TITLE, error.user_message()));
                    }
                }
            });
        }

        Self {
            query,
            state,
            initialized: AtomicBool::new(false),
            position: context.position.clone(),
            notifier: context.notifier.clone(),
        }
    }

    /// Acquire the position and issue the first query.
    ///
    /// Only the first call does anything.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return;
        }
        self.state.write().position = PositionState::AwaitingPosition;

        match self.position.acquire_position().await {
            Ok(here) => {
                info!(latitude = here.latitude, longitude = here.longitude, "Position acquired");
                let boat_type_id = {
                    let mut state = self.state.write();
                    state.position = PositionState::Acquired(here);
                    state.boat_type_id.clone()
                };
                self.query.set_params(ProximityParams {
                    latitude: here.latitude,
                    longitude: here.longitude,
                    boat_type_id,
                });
            }
            Err(error) => {
                warn!(%error, "Position unavailable");
                {
                    let mut state = self.state.write();
                    state.position = PositionState::Failed(error.clone());
                    state.rendered = true;
                }
                self.notifier
                    .notify(Notification::error(ERROR_TITLE, error.user_message()));
            }
        }
    }

    /// Change the type filter; re-queries once a position is known
    pub fn set_boat_type_id(&self, boat_type_id: impl Into<String>) -> bool {
        let boat_type_id = boat_type_id.into();
        let here = {
            let mut state = self.state.write();
            state.boat_type_id = boat_type_id.clone();
            match state.position {
                PositionState::Acquired(here) => here,
                _ => return false,
            }
        };
        self.query.set_params(ProximityParams {
            latitude: here.latitude,
            longitude: here.longitude,
            boat_type_id,
        })
    }

    pub fn markers(&self) -> Vec<MapMarker> {
        self.state.read().markers.clone()
    }

    pub fn state(&self) -> PositionState {
        self.state.read().position.clone()
    }

    pub fn boat_type_id(&self) -> String {
        self.state.read().boat_type_id.clone()
    }

    /// True until the first query settles or the position fails
    pub fn is_loading(&self) -> bool {
        !self.state.read().rendered
    }

    pub async fn settled(&self) -> QueryResult<Vec<Boat>> {
        self.query.settled().await
    }
}
