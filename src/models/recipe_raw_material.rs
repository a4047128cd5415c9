//! Recipe raw material model
//!
//! The formula line of a recipe: the amount of a raw material needed to
//! produce one full batch of the recipe's yield quantity.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A formula line linking a raw material to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRawMaterial {
    pub id: i64,
    pub recipe_id: i64,
    pub raw_material_id: i64,
    pub quantity: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Formula line with raw material details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRawMaterialDetail {
    pub id: i64,
    pub raw_material_id: i64,
    pub raw_material_name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Data for setting a formula line on a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRawMaterialSet {
    pub recipe_id: i64,
    pub raw_material_id: i64,
    pub quantity: f64,
}

impl RecipeRawMaterial {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            raw_material_id: row.get("raw_material_id")?,
            quantity: row.get("quantity")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert or update a formula line (one entry per raw material)
    pub fn set(conn: &Connection, data: &RecipeRawMaterialSet) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipe_raw_materials (recipe_id, raw_material_id, quantity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(recipe_id, raw_material_id)
            DO UPDATE SET quantity = ?3, updated_at = datetime('now')
            "#,
            params![data.recipe_id, data.raw_material_id, data.quantity],
        )?;

        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_raw_materials WHERE recipe_id = ?1 AND raw_material_id = ?2",
        )?;
        let line = stmt.query_row(
            params![data.recipe_id, data.raw_material_id],
            Self::from_row,
        )?;
        Ok(line)
    }

    /// Get all formula lines for a recipe
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_raw_materials WHERE recipe_id = ?1 ORDER BY id",
        )?;

        let lines = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    /// Get formula lines with raw material details for a recipe
    pub fn get_details_for_recipe(
        conn: &Connection,
        recipe_id: i64,
    ) -> DbResult<Vec<RecipeRawMaterialDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT rrm.id, rrm.raw_material_id, rm.name as raw_material_name,
                   rrm.quantity, rm.unit
            FROM recipe_raw_materials rrm
            INNER JOIN raw_materials rm ON rrm.raw_material_id = rm.id
            WHERE rrm.recipe_id = ?1
            ORDER BY rrm.id
            "#,
        )?;

        let details = stmt
            .query_map([recipe_id], |row| {
                Ok(RecipeRawMaterialDetail {
                    id: row.get("id")?,
                    raw_material_id: row.get("raw_material_id")?,
                    raw_material_name: row.get("raw_material_name")?,
                    quantity: row.get("quantity")?,
                    unit: row.get("unit")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    /// Remove a formula line by recipe and raw material
    pub fn remove(conn: &Connection, recipe_id: i64, raw_material_id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM recipe_raw_materials WHERE recipe_id = ?1 AND raw_material_id = ?2",
            params![recipe_id, raw_material_id],
        )?;
        Ok(rows > 0)
    }
}
