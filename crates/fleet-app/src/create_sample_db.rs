//! Create sample SQLite database with demo fleet data

use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use fleet_core::{Boat, BoatType, Geolocation, Review};
use fleet_data::schema;
use rusqlite::{Connection, Result};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

const BOAT_TYPES: &[&str] = &["Sailboat", "Power Boat", "Fishing Boat", "Catamaran"];

const BOAT_NAMES: &[&str] = &[
    "Zephyr", "Sea Breeze", "Albatross", "Marlin", "Kestrel", "Osprey", "Halcyon", "Tern",
    "Blue Heron", "Windward", "Spindrift", "Driftwood", "Seahorse", "Corsair", "Pelican",
    "Northern Star", "Calypso", "Moonraker", "Tradewind", "Gull",
];

const HARBORS: &[(&str, f64, f64)] = &[
    ("Sausalito", 37.8591, -122.4853),
    ("Alameda", 37.7799, -122.2822),
    ("Half Moon Bay", 37.5021, -122.4822),
    ("Monterey", 36.6002, -121.8947),
    ("San Diego", 32.7157, -117.1611),
];

const AUTHORS: &[&str] = &["Ahab", "Ishmael", "Queequeg", "Starbuck", "Stubb"];

const REVIEW_TEXT: &[&str] = &[
    "Handled beautifully in a stiff breeze.",
    "Clean, roomy and well maintained.",
    "A bit slow, but very comfortable.",
    "The skipper was great, the galley less so.",
    "Would charter again.",
];

/// Create and populate the sample database at `path`
pub fn create_sample_database(path: &Path) -> Result<()> {
    let mut conn = Connection::open(path)?;
    schema::ensure_schema(&conn)?;

    let tx = conn.transaction()?;
    let mut rng = 42u32;

    info!("Generating boat types...");
    let types: Vec<BoatType> = BOAT_TYPES
        .iter()
        .map(|name| BoatType {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        })
        .collect();
    for boat_type in &types {
        schema::insert_boat_type(&tx, boat_type)?;
    }

    info!("Generating boats...");
    let mut boats = Vec::with_capacity(BOAT_NAMES.len());
    for (i, name) in BOAT_NAMES.iter().enumerate() {
        let boat_type = &types[random_int(&mut rng) as usize % types.len()];
        let (harbor, latitude, longitude) = HARBORS[i % HARBORS.len()];
        let length = 20.0 + (random_int(&mut rng) % 40) as f64;
        let price = Decimal::new(25_000 + (random_int(&mut rng) % 400) as i64 * 1_000, 0);

        let boat = Boat {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            boat_type_id: boat_type.id.clone(),
            length,
            price,
            description: format!("{} {} moored at {}", length, boat_type.name, harbor),
            picture_url: format!("/resource/boats/{}.jpg", i + 1),
            geolocation: Geolocation::new(
                latitude + (random_float(&mut rng) - 0.5) * 0.05,
                longitude + (random_float(&mut rng) - 0.5) * 0.05,
            ),
        };
        schema::insert_boat(&tx, &boat)?;
        boats.push(boat);
    }

    info!("Generating reviews...");
    let base_time = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single().unwrap_or_else(Utc::now);
    let mut reviews = 0;
    for boat in &boats {
        for _ in 0..(random_int(&mut rng) % 4) {
            let review = Review {
                id: Uuid::new_v4().to_string(),
                boat_id: boat.id.clone(),
                author: AUTHORS[random_int(&mut rng) as usize % AUTHORS.len()].to_string(),
                rating: 1 + (random_int(&mut rng) % 5) as u8,
                text: REVIEW_TEXT[random_int(&mut rng) as usize % REVIEW_TEXT.len()].to_string(),
                created_at: base_time + Duration::hours((random_int(&mut rng) % 8_000) as i64),
            };
            schema::insert_review(&tx, &review)?;
            reviews += 1;
        }
    }

    tx.commit()?;
    info!(
        types = types.len(),
        boats = boats.len(),
        reviews,
        "Sample database created"
    );
    Ok(())
}

fn random_float(seed: &mut u32) -> f64 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    (*seed as f64) / (u32::MAX as f64)
}

fn random_int(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed >> 8
}
