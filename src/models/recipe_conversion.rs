//! Recipe conversion model
//!
//! Recipe-local unit table: one row declares that 1 `unit` equals
//! `factor` units of the recipe's yield unit.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A declared conversion for a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeConversion {
    pub id: i64,
    pub recipe_id: i64,
    pub unit: String,
    pub factor: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for setting a conversion on a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeConversionSet {
    pub recipe_id: i64,
    pub unit: String,
    pub factor: f64,
}

impl RecipeConversion {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            unit: row.get("unit")?,
            factor: row.get("factor")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert or update a conversion (one entry per distinct unit)
    pub fn set(conn: &Connection, data: &RecipeConversionSet) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipe_conversions (recipe_id, unit, factor)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(recipe_id, unit)
            DO UPDATE SET factor = ?3, updated_at = datetime('now')
            "#,
            params![data.recipe_id, data.unit, data.factor],
        )?;

        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_conversions WHERE recipe_id = ?1 AND unit = ?2",
        )?;
        let conversion = stmt.query_row(params![data.recipe_id, data.unit], Self::from_row)?;
        Ok(conversion)
    }

    /// Get all conversions for a recipe
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_conversions WHERE recipe_id = ?1 ORDER BY id",
        )?;

        let conversions = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(conversions)
    }

    /// Remove a conversion by recipe and unit
    pub fn remove(conn: &Connection, recipe_id: i64, unit: &str) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM recipe_conversions WHERE recipe_id = ?1 AND unit = ?2",
            params![recipe_id, unit],
        )?;
        Ok(rows > 0)
    }
}
