//! Order model
//!
//! A production order for one date and kitchen session.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A production order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_date: String,
    pub session: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub order_date: String,
    #[serde(default)]
    pub session: String,
    pub notes: Option<String>,
}

/// Data for updating an order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order_date: Option<String>,
    pub session: Option<String>,
    pub notes: Option<String>,
}

impl Order {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            order_date: row.get("order_date")?,
            session: row.get("session")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new order
    pub fn create(conn: &Connection, data: &OrderCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO orders (order_date, session, notes) VALUES (?1, ?2, ?3)",
            params![data.order_date, data.session, data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an order by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM orders WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List orders with optional date range filter
    pub fn list(
        conn: &Connection,
        start_date: Option<&str>,
        end_date: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let (sql, date_params): (String, Vec<String>) = match (start_date, end_date) {
            (Some(start), Some(end)) => (
                "SELECT * FROM orders WHERE order_date >= ?1 AND order_date <= ?2
                 ORDER BY order_date DESC LIMIT ?3 OFFSET ?4"
                    .to_string(),
                vec![start.to_string(), end.to_string()],
            ),
            (Some(start), None) => (
                "SELECT * FROM orders WHERE order_date >= ?1
                 ORDER BY order_date DESC LIMIT ?2 OFFSET ?3"
                    .to_string(),
                vec![start.to_string()],
            ),
            (None, Some(end)) => (
                "SELECT * FROM orders WHERE order_date <= ?1
                 ORDER BY order_date DESC LIMIT ?2 OFFSET ?3"
                    .to_string(),
                vec![end.to_string()],
            ),
            (None, None) => (
                "SELECT * FROM orders ORDER BY order_date DESC LIMIT ?1 OFFSET ?2".to_string(),
                vec![],
            ),
        };

        let mut stmt = conn.prepare(&sql)?;

        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        for p in &date_params {
            params_vec.push(Box::new(p.clone()));
        }
        params_vec.push(Box::new(limit));
        params_vec.push(Box::new(offset));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let orders = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(orders)
    }

    /// Update an order
    pub fn update(conn: &Connection, id: i64, data: &OrderUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref order_date) = data.order_date {
            updates.push(format!("order_date = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(order_date.clone()));
        }
        if let Some(ref session) = data.session {
            updates.push(format!("session = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(session.clone()));
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
            "UPDATE orders SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Count orders
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete an order (cascades to its lines and ad-hoc locations)
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(false);
        }

        let rows = conn.execute("DELETE FROM orders WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
