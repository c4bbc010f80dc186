//! Entities exchanged between the dashboard components and the data service

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FleetError, Result};

/// Identifier of a boat record
pub type BoatId = String;

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl Geolocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A boat as returned by the data service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boat {
    pub id: BoatId,
    pub name: String,
    pub boat_type_id: String,
    pub length: f64,
    pub price: Decimal,
    pub description: String,
    pub picture_url: String,
    pub geolocation: Geolocation,
}

/// Boat type reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoatType {
    pub id: String,
    pub name: String,
}

/// A review left on a boat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub boat_id: BoatId,
    pub author: String,
    pub rating: u8,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Payload of the boat selection topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEvent {
    pub record_id: BoatId,
}

/// Active boat type filter; an empty id means "all types"
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub boat_type_id: String,
}

impl FilterState {
    pub fn new(boat_type_id: impl Into<String>) -> Self {
        Self { boat_type_id: boat_type_id.into() }
    }

    pub fn is_all_types(&self) -> bool {
        self.boat_type_id.is_empty()
    }
}

/// An option in the boat type picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOption {
    pub label: String,
    pub value: String,
}

/// A single-field edit made in the results grid
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Name(String),
    Length(f64),
    Price(Decimal),
    Description(String),
}

/// Changed fields of one boat; untouched fields stay `None`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoatPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BoatPatch {
    /// Fold an edit into the patch, replacing any earlier value of the field
    pub fn merge(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::Name(name) => self.name = Some(name),
            FieldEdit::Length(length) => self.length = Some(length),
            FieldEdit::Price(price) => self.price = Some(price),
            FieldEdit::Description(description) => self.description = Some(description),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.length.is_none()
            && self.price.is_none()
            && self.description.is_none()
    }

    /// Check the patch before it is sent to the data service
    pub fn validate(&self, boat_id: &str) -> Result<()> {
        let invalid = |reason: &str| FleetError::InvalidEdit {
            boat_id: boat_id.to_string(),
            reason: reason.to_string(),
        };

        if self.is_empty() {
            return Err(invalid("no fields changed"));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(invalid("name must not be blank"));
            }
        }
        if let Some(length) = self.length {
            if !length.is_finite() || length <= 0.0 {
                return Err(invalid("length must be a positive number"));
            }
        }
        if let Some(price) = self.price {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(invalid("price must not be negative"));
            }
        }
        Ok(())
    }

    /// Overlay the patch on a boat
    pub fn apply(&self, boat: &mut Boat) {
        if let Some(name) = &self.name {
            boat.name = name.clone();
        }
        if let Some(length) = self.length {
            boat.length = length;
        }
        if let Some(price) = self.price {
            boat.price = price;
        }
        if let Some(description) = &self.description {
            boat.description = description.clone();
        }
    }
}

/// Pending grid edits keyed by boat id, in the order rows were first edited
pub type EditBatch = IndexMap<BoatId, BoatPatch>;

/// A marker placed on the proximity map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub location: Geolocation,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A record resolved for the detail tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub id: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl RecordSnapshot {
    pub fn field_value(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field)
    }
}

/// Visual variant of a transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Success,
    Error,
}

/// A transient message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: NotificationVariant::Success,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: NotificationVariant::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boat() -> Boat {
        Boat {
            id: "B7".to_string(),
            name: "Sea Breeze".to_string(),
            boat_type_id: "T1".to_string(),
            length: 32.0,
            price: Decimal::new(120_000, 0),
            description: "Classic sloop".to_string(),
            picture_url: String::new(),
            geolocation: Geolocation::new(37.8, -122.4),
        }
    }

    #[test]
    fn test_patch_merge_keeps_latest_edit() {
        let mut patch = BoatPatch::default();
        patch.merge(FieldEdit::Price(Decimal::new(5000, 0)));
        patch.merge(FieldEdit::Price(Decimal::new(9999, 0)));

        assert_eq!(patch.price, Some(Decimal::new(9999, 0)));
        assert!(patch.name.is_none());
    }

    #[test]
    fn test_patch_apply_only_touches_changed_fields() {
        let mut target = boat();
        let patch = BoatPatch {
            length: Some(40.5),
            ..Default::default()
        };
        patch.apply(&mut target);

        assert_eq!(target.length, 40.5);
        assert_eq!(target.name, "Sea Breeze");
        assert_eq!(target.price, Decimal::new(120_000, 0));
    }

    #[test]
    fn test_patch_validation() {
        assert!(BoatPatch::default().validate("B1").is_err());

        let blank = BoatPatch {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(blank.validate("B1"), Err(FleetError::InvalidEdit { .. })));

        let negative_length = BoatPatch {
            length: Some(-3.0),
            ..Default::default()
        };
        assert!(negative_length.validate("B1").is_err());

        let negative_price = BoatPatch {
            price: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert!(negative_price.validate("B1").is_err());

        let free = BoatPatch {
            price: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(free.validate("B1").is_ok());
    }

    #[test]
    fn test_patch_serializes_only_changed_fields() {
        let mut patch = BoatPatch::default();
        patch.merge(FieldEdit::Price(Decimal::new(9999, 0)));
        let json = serde_json::to_value(&patch).unwrap();

        assert_eq!(json, serde_json::json!({ "price": "9999" }));
    }

    #[test]
    fn test_filter_state_default_is_all_types() {
        assert!(FilterState::default().is_all_types());
        assert!(!FilterState::new("T1").is_all_types());
    }
}
