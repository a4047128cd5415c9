//! Location model
//!
//! A delivery site. Persistent sites have no order_id; ad-hoc sites are
//! scoped to a single order and removed with it.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A delivery location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    /// None for persistent sites, Some(order_id) for order-scoped sites
    pub order_id: Option<i64>,
    pub created_at: String,
}

/// Data for creating a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCreate {
    pub name: String,
    pub order_id: Option<i64>,
}

impl Location {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            order_id: row.get("order_id")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a new location
    pub fn create(conn: &Connection, data: &LocationCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO locations (name, order_id) VALUES (?1, ?2)",
            params![data.name, data.order_id],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a location by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM locations WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(location) => Ok(Some(location)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all persistent locations
    pub fn get_persistent(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM locations WHERE order_id IS NULL ORDER BY name ASC")?;

        let locations = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(locations)
    }

    /// Locations active for an order: persistent sites plus the order's ad-hoc sites
    pub fn get_active_for_order(conn: &Connection, order_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM locations WHERE order_id IS NULL OR order_id = ?1 ORDER BY id",
        )?;

        let locations = stmt
            .query_map([order_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(locations)
    }

    /// Delete a location
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM locations WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
