//! Recipe model
//!
//! Represents a recipe whose batch output is measured in a yield unit.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A recipe with its batch yield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub yield_quantity: f64,
    pub yield_unit: String,
    pub default_ordering_unit: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    #[serde(default = "default_yield_quantity")]
    pub yield_quantity: f64,
    pub yield_unit: String,
    /// Defaults to the yield unit when omitted
    pub default_ordering_unit: Option<String>,
    pub notes: Option<String>,
}

fn default_yield_quantity() -> f64 {
    1.0
}

/// Data for updating a recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub yield_quantity: Option<f64>,
    pub yield_unit: Option<String>,
    pub default_ordering_unit: Option<String>,
    pub notes: Option<String>,
}

impl Recipe {
    /// Create a Recipe from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            yield_quantity: row.get("yield_quantity")?,
            yield_unit: row.get("yield_unit")?,
            default_ordering_unit: row.get("default_ordering_unit")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new recipe into the database
    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        let ordering_unit = data
            .default_ordering_unit
            .clone()
            .unwrap_or_else(|| data.yield_unit.clone());

        conn.execute(
            r#"
            INSERT INTO recipes (name, yield_quantity, yield_unit, default_ordering_unit, notes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.name,
                data.yield_quantity,
                data.yield_unit,
                ordering_unit,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all recipes
    pub fn get_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes ORDER BY id")?;

        let recipes = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// List recipes with optional name search
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let (sql, search_param) = match query {
            Some(q) => (
                "SELECT * FROM recipes WHERE name LIKE ?1 ORDER BY name ASC LIMIT ?2 OFFSET ?3",
                Some(format!("%{}%", q)),
            ),
            None => (
                "SELECT * FROM recipes ORDER BY name ASC LIMIT ?1 OFFSET ?2",
                None,
            ),
        };

        let mut stmt = conn.prepare(sql)?;

        let recipes = if let Some(pattern) = search_param {
            stmt.query_map(params![pattern, limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(recipes)
    }

    /// Update a recipe
    pub fn update(conn: &Connection, id: i64, data: &RecipeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(yield_quantity) = data.yield_quantity {
            updates.push(format!("yield_quantity = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(yield_quantity));
        }
        if let Some(ref yield_unit) = data.yield_unit {
            updates.push(format!("yield_unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(yield_unit.clone()));
        }
        if let Some(ref ordering_unit) = data.default_ordering_unit {
            updates.push(format!("default_ordering_unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(ordering_unit.clone()));
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipes SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Count recipes
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count platters using this recipe as a component
    pub fn get_platter_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM platter_recipes WHERE recipe_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count order lines referencing this recipe
    pub fn get_order_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM order_recipe_lines WHERE recipe_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a recipe (cascades to conversions and formula entries)
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(false);
        }

        // platter_recipes has ON DELETE RESTRICT for recipe_id,
        // so this fails while the recipe is still on a platter
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
