//! SQLite store for the device roster and local preferences.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::models::*;
use super::roster::{next_device_id, validate_form};

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Not found")]
    NotFound,
    #[error("invalid device: {0}")]
    Validation(String),
    #[error("{0} is already taken")]
    Duplicate(&'static str),
}

const DEVICE_COLUMNS: &str = "id, name, license_plate_id, phone, car_type, device_id, created_at";

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;

        Ok(())
    }

    // --- Preferences ---

    /// Read a preference value.
    pub fn get_preference(&self, key: &str) -> Result<Option<String>, DbError> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a preference value.
    pub fn set_preference(&self, key: &str, value: &str) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a preference. Missing keys are not an error.
    pub fn delete_preference(&self, key: &str) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        Ok(())
    }

    // --- Device CRUD ---

    /// Register a new device, assigning the next id for its car type.
    pub fn add_device(&self, form: &DeviceForm) -> Result<Device, DbError> {
        let form = &form.trimmed();
        validate_form(form)?;

        let conn = self.conn.lock().unwrap();
        ensure_unique(&conn, UniqueField::DeviceId, &form.device_id, None)?;
        ensure_unique(&conn, UniqueField::LicensePlateId, &form.license_plate_id, None)?;

        let ids = {
            let mut stmt = conn.prepare("SELECT id FROM devices")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<SqlResult<Vec<_>>>()?;
            ids
        };

        let device = Device {
            id: next_device_id(ids.iter().map(String::as_str), form.car_type),
            name: form.name.clone(),
            license_plate_id: form.license_plate_id.clone(),
            phone: form.phone.clone(),
            car_type: form.car_type,
            device_id: form.device_id.clone(),
            date: Utc::now(),
        };

        conn.execute(
            &format!("INSERT INTO devices ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)", DEVICE_COLUMNS),
            params![
                device.id,
                device.name,
                device.license_plate_id,
                device.phone,
                device.car_type.as_str(),
                device.device_id,
                format_db_time(device.date),
            ],
        )?;

        Ok(device)
    }

    /// Replace the editable fields of an existing device.
    pub fn update_device(&self, id: &str, form: &DeviceForm) -> Result<Device, DbError> {
        let form = &form.trimmed();
        validate_form(form)?;

        let conn = self.conn.lock().unwrap();
        ensure_unique(&conn, UniqueField::DeviceId, &form.device_id, Some(id))?;
        ensure_unique(&conn, UniqueField::LicensePlateId, &form.license_plate_id, Some(id))?;

        let changed = conn.execute(
            "UPDATE devices SET name=?1, license_plate_id=?2, phone=?3, car_type=?4, device_id=?5 WHERE id=?6",
            params![
                form.name,
                form.license_plate_id,
                form.phone,
                form.car_type.as_str(),
                form.device_id,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(DbError::NotFound);
        }

        query_device(&conn, id)
    }

    /// Get all devices, newest first.
    pub fn get_devices(&self) -> Result<Vec<Device>, DbError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM devices ORDER BY created_at DESC",
            DEVICE_COLUMNS
        ))?;

        let devices = stmt
            .query_map([], device_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(devices)
    }

    /// Get a device by roster id.
    pub fn get_device(&self, id: &str) -> Result<Device, DbError> {
        let conn = self.conn.lock().unwrap();
        query_device(&conn, id)
    }

    /// Delete a device.
    pub fn delete_device(&self, id: &str) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM devices WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Whether a unique field value is already used by a device other than
    /// `exclude_id`. Comparison is case-insensitive.
    pub fn is_value_taken(
        &self,
        field: UniqueField,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, DbError> {
        let conn = self.conn.lock().unwrap();
        value_taken(&conn, field, value, exclude_id)
    }
}

fn value_taken(
    conn: &Connection,
    field: UniqueField,
    value: &str,
    exclude_id: Option<&str>,
) -> Result<bool, DbError> {
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM devices WHERE LOWER({}) = LOWER(?1) AND id != COALESCE(?2, '')",
            field.column()
        ),
        params![value, exclude_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn ensure_unique(
    conn: &Connection,
    field: UniqueField,
    value: &str,
    exclude_id: Option<&str>,
) -> Result<(), DbError> {
    if value_taken(conn, field, value, exclude_id)? {
        return Err(DbError::Duplicate(field.label()));
    }
    Ok(())
}

fn query_device(conn: &Connection, id: &str) -> Result<Device, DbError> {
    conn.query_row(
        &format!("SELECT {} FROM devices WHERE id = ?1", DEVICE_COLUMNS),
        params![id],
        device_from_row,
    )
    .optional()?
    .ok_or(DbError::NotFound)
}

fn device_from_row(row: &Row<'_>) -> SqlResult<Device> {
    let car_type: String = row.get(4)?;
    let created_at: String = row.get(6)?;

    Ok(Device {
        id: row.get(0)?,
        name: row.get(1)?,
        license_plate_id: row.get(2)?,
        phone: row.get(3)?,
        car_type: car_type.parse::<CarType>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        device_id: row.get(5)?,
        date: parse_db_time(&created_at).unwrap_or_else(Utc::now),
    })
}

fn format_db_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S%.9f").to_string()
}

/// Parse a datetime string from the database.
fn parse_db_time(s: &str) -> Option<DateTime<Utc>> {
    let formats = ["%Y-%m-%d %H:%M:%S%.9f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

    for fmt in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
