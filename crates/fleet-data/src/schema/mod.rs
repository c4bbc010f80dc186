//! SQLite schema and row mapping for the fleet tables

use std::str::FromStr;

use chrono::{DateTime, Utc};
use fleet_core::{Boat, BoatType, Geolocation, Review};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;

/// Columns selected for every boat query, in the order `boat_from_row` reads them
pub const BOAT_COLUMNS: &str =
    "id, name, boat_type_id, length, price, description, picture_url, latitude, longitude";

/// Create the fleet tables if they do not exist yet
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS boat_type (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS boat (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            boat_type_id TEXT NOT NULL REFERENCES boat_type(id),
            length REAL NOT NULL,
            price TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            picture_url TEXT NOT NULL DEFAULT '',
            latitude REAL NOT NULL,
            longitude REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS boat_review (
            id TEXT PRIMARY KEY,
            boat_id TEXT NOT NULL REFERENCES boat(id),
            author TEXT NOT NULL,
            rating INTEGER NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_boat_type ON boat(boat_type_id);
        CREATE INDEX IF NOT EXISTS idx_review_boat ON boat_review(boat_id, created_at);
        ",
    )
}

pub fn boat_from_row(row: &Row<'_>) -> rusqlite::Result<Boat> {
    let price: String = row.get(4)?;
    let price = Decimal::from_str(&price)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Boat {
        id: row.get(0)?,
        name: row.get(1)?,
        boat_type_id: row.get(2)?,
        length: row.get(3)?,
        price,
        description: row.get(5)?,
        picture_url: row.get(6)?,
        geolocation: Geolocation::new(row.get(7)?, row.get(8)?),
    })
}

pub fn boat_type_from_row(row: &Row<'_>) -> rusqlite::Result<BoatType> {
    Ok(BoatType {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

/// Reads `id, boat_id, author, rating, body, created_at`
pub fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    let created_at: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Review {
        id: row.get(0)?,
        boat_id: row.get(1)?,
        author: row.get(2)?,
        rating: row.get(3)?,
        text: row.get(4)?,
        created_at,
    })
}

pub fn insert_boat_type(conn: &Connection, boat_type: &BoatType) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO boat_type (id, name) VALUES (?1, ?2)",
        params![boat_type.id, boat_type.name],
    )?;
    Ok(())
}

pub fn insert_boat(conn: &Connection, boat: &Boat) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO boat (id, name, boat_type_id, length, price, description, picture_url, latitude, longitude)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            boat.id,
            boat.name,
            boat.boat_type_id,
            boat.length,
            boat.price.to_string(),
            boat.description,
            boat.picture_url,
            boat.geolocation.latitude,
            boat.geolocation.longitude,
        ],
    )?;
    Ok(())
}

pub fn insert_review(conn: &Connection, review: &Review) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO boat_review (id, boat_id, author, rating, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            review.id,
            review.boat_id,
            review.author,
            review.rating,
            review.text,
            review.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}
