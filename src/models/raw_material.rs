//! Raw material model
//!
//! A purchasable ingredient with its own canonical unit of measure.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A raw material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterial {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a raw material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterialCreate {
    pub name: String,
    pub unit: String,
    pub notes: Option<String>,
}

/// Data for updating a raw material
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMaterialUpdate {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

impl RawMaterial {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            unit: row.get("unit")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new raw material
    pub fn create(conn: &Connection, data: &RawMaterialCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO raw_materials (name, unit, notes)
            VALUES (?1, ?2, ?3)
            "#,
            params![data.name, data.unit, data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a raw material by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM raw_materials WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(material) => Ok(Some(material)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all raw materials
    pub fn get_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM raw_materials ORDER BY id")?;

        let materials = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(materials)
    }

    /// List raw materials with optional name search
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let (sql, search_param) = match query {
            Some(q) => (
                "SELECT * FROM raw_materials WHERE name LIKE ?1 ORDER BY name ASC LIMIT ?2 OFFSET ?3",
                Some(format!("%{}%", q)),
            ),
            None => (
                "SELECT * FROM raw_materials ORDER BY name ASC LIMIT ?1 OFFSET ?2",
                None,
            ),
        };

        let mut stmt = conn.prepare(sql)?;

        let materials = if let Some(pattern) = search_param {
            stmt.query_map(params![pattern, limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(materials)
    }

    /// Update a raw material
    pub fn update(conn: &Connection, id: i64, data: &RawMaterialUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref unit) = data.unit {
            updates.push(format!("unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit.clone()));
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
            "UPDATE raw_materials SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Count recipes whose formula uses this raw material
    pub fn get_recipe_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipe_raw_materials WHERE raw_material_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a raw material (blocked by RESTRICT while any formula uses it)
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(false);
        }

        let rows = conn.execute("DELETE FROM raw_materials WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
