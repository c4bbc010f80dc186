//! Headless stand-ins for the browser collaborators

use async_trait::async_trait;
use fleet_core::data::{Navigator, Notifier, PositionProvider};
use fleet_core::{Geolocation, Notification, NotificationVariant, Result};
use tracing::{error, info};

/// Writes notifications to the log
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.variant {
            NotificationVariant::Success => {
                info!(title = %notification.title, "{}", notification.message)
            }
            NotificationVariant::Error => {
                error!(title = %notification.title, "{}", notification.message)
            }
        }
    }
}

/// Logs record navigation requests
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate_to_record(&self, record_id: &str) {
        info!(record_id, "Navigate to record page");
    }
}

/// Reports the configured home position
pub struct FixedPosition {
    position: Geolocation,
}

impl FixedPosition {
    pub fn new(position: Geolocation) -> Self {
        Self { position }
    }
}

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn acquire_position(&self) -> Result<Geolocation> {
        Ok(self.position)
    }
}
