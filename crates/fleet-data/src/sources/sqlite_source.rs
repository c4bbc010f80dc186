//! SQLite implementation of the boat data service

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fleet_core::data::{BoatDataService, RecordResolver};
use fleet_core::{Boat, BoatType, EditBatch, FleetError, Geolocation, RecordSnapshot, Review};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use crate::schema::{self, BOAT_COLUMNS};
use crate::DataError;

const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance between two points, in miles
pub fn distance_miles(a: Geolocation, b: Geolocation) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Boat data service backed by a SQLite file.
///
/// Each call opens its own connection on the blocking pool, so the service
/// is cheap to share between components.
pub struct SqliteBoatService {
    path: PathBuf,
    nearby_limit: usize,
}

impl SqliteBoatService {
    /// Open the database, creating the fleet tables if needed
    pub fn open<P: AsRef<Path>>(path: P, nearby_limit: usize) -> Result<Self, DataError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        schema::ensure_schema(&conn)?;
        info!("Opened fleet database {:?}", path);

        Ok(Self {
            path,
            nearby_limit: nearby_limit.max(1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run blocking database work off the async scheduler
    async fn with_connection<R, F>(&self, work: F) -> Result<R, DataError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<R, DataError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&path)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            work(&mut conn)
        })
        .await?
    }

    fn load_boats(conn: &Connection, boat_type_id: &str) -> Result<Vec<Boat>, DataError> {
        let boats = if boat_type_id.is_empty() {
            let mut stmt = conn.prepare(&format!("SELECT {BOAT_COLUMNS} FROM boat ORDER BY name"))?;
            let rows = stmt.query_map([], schema::boat_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOAT_COLUMNS} FROM boat WHERE boat_type_id = ?1 ORDER BY name"
            ))?;
            let rows = stmt.query_map([boat_type_id], schema::boat_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(boats)
    }

    fn find_boat(conn: &Connection, id: &str) -> Result<Boat, DataError> {
        conn.query_row(
            &format!("SELECT {BOAT_COLUMNS} FROM boat WHERE id = ?1"),
            [id],
            schema::boat_from_row,
        )
        .optional()?
        .ok_or_else(|| DataError::UnknownBoat(id.to_string()))
    }

    fn apply_batch(conn: &mut Connection, batch: &EditBatch) -> Result<(), DataError> {
        let tx = conn.transaction()?;

        for (boat_id, patch) in batch {
            patch
                .validate(boat_id)
                .map_err(|e| DataError::Other(e.to_string()))?;

            let mut assignments = Vec::new();
            let mut values = Vec::new();
            if let Some(name) = &patch.name {
                assignments.push("name = ?");
                values.push(Value::Text(name.clone()));
            }
            if let Some(length) = patch.length {
                assignments.push("length = ?");
                values.push(Value::Real(length));
            }
            if let Some(price) = patch.price {
                assignments.push("price = ?");
                values.push(Value::Text(price.to_string()));
            }
            if let Some(description) = &patch.description {
                assignments.push("description = ?");
                values.push(Value::Text(description.clone()));
            }
            values.push(Value::Text(boat_id.clone()));

            let sql = format!("UPDATE boat SET {} WHERE id = ?", assignments.join(", "));
            let updated = tx.execute(&sql, params_from_iter(values.iter()))?;
            if updated == 0 {
                // Dropping the transaction rolls back the earlier patches
                return Err(DataError::UnknownBoat(boat_id.clone()));
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn record_field(boat: &Boat, field: &str) -> Result<JsonValue, DataError> {
        let value = match field {
            "Id" => JsonValue::from(boat.id.clone()),
            "Name" => JsonValue::from(boat.name.clone()),
            "Length" => JsonValue::from(boat.length),
            "Price" => JsonValue::from(boat.price.to_string()),
            "Description" => JsonValue::from(boat.description.clone()),
            "BoatType" => JsonValue::from(boat.boat_type_id.clone()),
            other => return Err(DataError::UnsupportedField(other.to_string())),
        };
        Ok(value)
    }
}

#[async_trait]
impl BoatDataService for SqliteBoatService {
    async fn query_boats(&self, boat_type_id: &str) -> Result<Vec<Boat>, FleetError> {
        let boat_type_id = boat_type_id.to_string();
        let boats = self
            .with_connection(move |conn| Self::load_boats(conn, &boat_type_id))
            .await
            .map_err(DataError::into_query_error)?;
        debug!("Loaded {} boats", boats.len());
        Ok(boats)
    }

    async fn query_boats_by_location(
        &self,
        latitude: f64,
        longitude: f64,
        boat_type_id: &str,
    ) -> Result<Vec<Boat>, FleetError> {
        let boat_type_id = boat_type_id.to_string();
        let origin = Geolocation::new(latitude, longitude);
        let limit = self.nearby_limit;

        let mut boats = self
            .with_connection(move |conn| Self::load_boats(conn, &boat_type_id))
            .await
            .map_err(DataError::into_query_error)?;

        boats.sort_by(|a, b| {
            distance_miles(origin, a.geolocation).total_cmp(&distance_miles(origin, b.geolocation))
        });
        boats.truncate(limit);
        Ok(boats)
    }

    async fn query_boat_types(&self) -> Result<Vec<BoatType>, FleetError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM boat_type ORDER BY name")?;
            let rows = stmt.query_map([], schema::boat_type_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
        .map_err(DataError::into_query_error)
    }

    async fn query_reviews(&self, boat_id: &str) -> Result<Vec<Review>, FleetError> {
        let boat_id = boat_id.to_string();
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, boat_id, author, rating, body, created_at
                 FROM boat_review WHERE boat_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map([boat_id], schema::review_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
        .map_err(DataError::into_query_error)
    }

    async fn save_boat_batch(&self, batch: &EditBatch) -> Result<(), FleetError> {
        let batch = batch.clone();
        let rows = batch.len();
        self.with_connection(move |conn| Self::apply_batch(conn, &batch))
            .await
            .map_err(DataError::into_save_error)?;
        info!("Saved {} boat updates", rows);
        Ok(())
    }
}

#[async_trait]
impl RecordResolver for SqliteBoatService {
    async fn resolve_record(&self, id: &str, fields: &[&str]) -> Result<RecordSnapshot, FleetError> {
        let id = id.to_string();
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();

        self.with_connection(move |conn| {
            let boat = Self::find_boat(conn, &id)?;
            let mut values = Map::new();
            for field in &fields {
                values.insert(field.clone(), Self::record_field(&boat, field)?);
            }
            Ok(RecordSnapshot { id, fields: values })
        })
        .await
        .map_err(DataError::into_record_error)
    }
}
