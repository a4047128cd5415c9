//! Platter recipe model
//!
//! The contents of one platter portion: a quantity of a recipe in a
//! declared unit (which may differ from the recipe's yield unit).

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A component recipe of a platter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatterRecipe {
    pub id: i64,
    pub platter_id: i64,
    pub recipe_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Platter component with recipe details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatterRecipeDetail {
    pub id: i64,
    pub recipe_id: i64,
    pub recipe_name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Data for setting a component on a platter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatterRecipeSet {
    pub platter_id: i64,
    pub recipe_id: i64,
    pub quantity: f64,
    pub unit: String,
}

impl PlatterRecipe {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            platter_id: row.get("platter_id")?,
            recipe_id: row.get("recipe_id")?,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert or update a component (one entry per recipe per platter)
    pub fn set(conn: &Connection, data: &PlatterRecipeSet) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO platter_recipes (platter_id, recipe_id, quantity, unit)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(platter_id, recipe_id)
            DO UPDATE SET quantity = ?3, unit = ?4, updated_at = datetime('now')
            "#,
            params![data.platter_id, data.recipe_id, data.quantity, data.unit],
        )?;

        let mut stmt = conn.prepare(
            "SELECT * FROM platter_recipes WHERE platter_id = ?1 AND recipe_id = ?2",
        )?;
        let component = stmt.query_row(params![data.platter_id, data.recipe_id], Self::from_row)?;
        Ok(component)
    }

    /// Get all components for a platter
    pub fn get_for_platter(conn: &Connection, platter_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM platter_recipes WHERE platter_id = ?1 ORDER BY id",
        )?;

        let components = stmt
            .query_map([platter_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(components)
    }

    /// Get components with recipe details for a platter
    pub fn get_details_for_platter(
        conn: &Connection,
        platter_id: i64,
    ) -> DbResult<Vec<PlatterRecipeDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT pr.id, pr.recipe_id, r.name as recipe_name, pr.quantity, pr.unit
            FROM platter_recipes pr
            INNER JOIN recipes r ON pr.recipe_id = r.id
            WHERE pr.platter_id = ?1
            ORDER BY pr.id
            "#,
        )?;

        let details = stmt
            .query_map([platter_id], |row| {
                Ok(PlatterRecipeDetail {
                    id: row.get("id")?,
                    recipe_id: row.get("recipe_id")?,
                    recipe_name: row.get("recipe_name")?,
                    quantity: row.get("quantity")?,
                    unit: row.get("unit")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    /// Remove a component by platter and recipe
    pub fn remove(conn: &Connection, platter_id: i64, recipe_id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM platter_recipes WHERE platter_id = ?1 AND recipe_id = ?2",
            params![platter_id, recipe_id],
        )?;
        Ok(rows > 0)
    }
}
