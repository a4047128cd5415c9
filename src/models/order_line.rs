//! Order line models
//!
//! Direct recipe requirements and whole-platter requirements per location.
//! Lines carry bare ids on purpose: reference rows may be deleted after
//! lines were written, and the report layer skips orphans.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A direct recipe requirement on an order, in the recipe's ordering unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecipeLine {
    pub id: i64,
    pub order_id: i64,
    pub recipe_id: i64,
    pub location_id: i64,
    pub quantity: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// A whole-platter requirement on an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlatterLine {
    pub id: i64,
    pub order_id: i64,
    pub platter_id: i64,
    pub location_id: i64,
    pub portions: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl OrderRecipeLine {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            order_id: row.get("order_id")?,
            recipe_id: row.get("recipe_id")?,
            location_id: row.get("location_id")?,
            quantity: row.get("quantity")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert or update a line (one per order, recipe, location)
    pub fn set(
        conn: &Connection,
        order_id: i64,
        recipe_id: i64,
        location_id: i64,
        quantity: f64,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO order_recipe_lines (order_id, recipe_id, location_id, quantity)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(order_id, recipe_id, location_id)
            DO UPDATE SET quantity = ?4, updated_at = datetime('now')
            "#,
            params![order_id, recipe_id, location_id, quantity],
        )?;

        let mut stmt = conn.prepare(
            "SELECT * FROM order_recipe_lines
             WHERE order_id = ?1 AND recipe_id = ?2 AND location_id = ?3",
        )?;
        let line = stmt.query_row(params![order_id, recipe_id, location_id], Self::from_row)?;
        Ok(line)
    }

    /// Get all recipe lines for an order
    pub fn get_for_order(conn: &Connection, order_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM order_recipe_lines WHERE order_id = ?1 ORDER BY id",
        )?;

        let lines = stmt
            .query_map([order_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    /// Remove a line
    pub fn remove(
        conn: &Connection,
        order_id: i64,
        recipe_id: i64,
        location_id: i64,
    ) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM order_recipe_lines
             WHERE order_id = ?1 AND recipe_id = ?2 AND location_id = ?3",
            params![order_id, recipe_id, location_id],
        )?;
        Ok(rows > 0)
    }
}

impl OrderPlatterLine {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            order_id: row.get("order_id")?,
            platter_id: row.get("platter_id")?,
            location_id: row.get("location_id")?,
            portions: row.get("portions")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert or update a line (one per order, platter, location)
    pub fn set(
        conn: &Connection,
        order_id: i64,
        platter_id: i64,
        location_id: i64,
        portions: f64,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO order_platter_lines (order_id, platter_id, location_id, portions)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(order_id, platter_id, location_id)
            DO UPDATE SET portions = ?4, updated_at = datetime('now')
            "#,
            params![order_id, platter_id, location_id, portions],
        )?;

        let mut stmt = conn.prepare(
            "SELECT * FROM order_platter_lines
             WHERE order_id = ?1 AND platter_id = ?2 AND location_id = ?3",
        )?;
        let line = stmt.query_row(params![order_id, platter_id, location_id], Self::from_row)?;
        Ok(line)
    }

    /// Get all platter lines for an order
    pub fn get_for_order(conn: &Connection, order_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM order_platter_lines WHERE order_id = ?1 ORDER BY id",
        )?;

        let lines = stmt
            .query_map([order_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    /// Remove a line
    pub fn remove(
        conn: &Connection,
        order_id: i64,
        platter_id: i64,
        location_id: i64,
    ) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM order_platter_lines
             WHERE order_id = ?1 AND platter_id = ?2 AND location_id = ?3",
            params![order_id, platter_id, location_id],
        )?;
        Ok(rows > 0)
    }
}
