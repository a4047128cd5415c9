//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Get current version
    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Run migrations
    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- RECIPES
        -- Batch output measured in a recipe-local yield unit
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            yield_quantity REAL NOT NULL DEFAULT 1.0,    -- one batch makes this much
            yield_unit TEXT NOT NULL,                    -- e.g., "litres", "kg", "pieces"
            default_ordering_unit TEXT NOT NULL,         -- unit used on order lines, defaults to yield_unit

            -- Metadata
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);

        -- ============================================
        -- RECIPE CONVERSIONS
        -- Recipe-local unit table: 1 unit = factor yield units
        -- ============================================
        CREATE TABLE recipe_conversions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            unit TEXT NOT NULL,                  -- alternate unit (never the yield unit itself)
            factor REAL NOT NULL,                -- must be > 0

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(recipe_id, unit)              -- at most one entry per distinct unit
        );

        CREATE INDEX idx_recipe_conversions_recipe ON recipe_conversions(recipe_id);

        -- ============================================
        -- RAW MATERIALS
        -- Purchasable ingredients with a fixed canonical unit
        -- ============================================
        CREATE TABLE raw_materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            unit TEXT NOT NULL,                  -- canonical unit, never converted

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_raw_materials_name ON raw_materials(name);

        -- ============================================
        -- RECIPE RAW MATERIALS
        -- Formula per one full batch of yield_quantity
        -- ============================================
        CREATE TABLE recipe_raw_materials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            raw_material_id INTEGER NOT NULL REFERENCES raw_materials(id) ON DELETE RESTRICT,
            quantity REAL NOT NULL,              -- amount per batch, in the raw material's unit

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(recipe_id, raw_material_id)
        );

        CREATE INDEX idx_recipe_raw_materials_recipe ON recipe_raw_materials(recipe_id);
        CREATE INDEX idx_recipe_raw_materials_material ON recipe_raw_materials(raw_material_id);

        -- ============================================
        -- PLATTERS
        -- Bundles of fixed recipe quantities ordered as portions
        -- ============================================
        CREATE TABLE platters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_platters_name ON platters(name);

        -- ============================================
        -- PLATTER RECIPES
        -- Contents of one platter portion
        -- ============================================
        CREATE TABLE platter_recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            platter_id INTEGER NOT NULL REFERENCES platters(id) ON DELETE CASCADE,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE RESTRICT,
            quantity REAL NOT NULL,              -- amount of the recipe per portion
            unit TEXT NOT NULL,                  -- may differ from the recipe's yield unit

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(platter_id, recipe_id)
        );

        CREATE INDEX idx_platter_recipes_platter ON platter_recipes(platter_id);
        CREATE INDEX idx_platter_recipes_recipe ON platter_recipes(recipe_id);

        -- ============================================
        -- LOCATIONS
        -- Delivery sites; order_id NULL = persistent, set = order-scoped ad hoc
        -- ============================================
        CREATE TABLE locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            order_id INTEGER REFERENCES orders(id) ON DELETE CASCADE,

            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_locations_order ON locations(order_id);

        -- ============================================
        -- ORDERS
        -- One production order per date/session
        -- ============================================
        CREATE TABLE orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_date TEXT NOT NULL,            -- ISO date
            session TEXT NOT NULL DEFAULT '',    -- e.g., "lunch", "dinner"

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_orders_date ON orders(order_date);

        -- ============================================
        -- ORDER RECIPE LINES
        -- Direct recipe requirements, in the recipe's default ordering unit.
        -- No FK to recipes/locations: reference rows may be deleted later
        -- and the report must still be produced (orphans are skipped).
        -- ============================================
        CREATE TABLE order_recipe_lines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            recipe_id INTEGER NOT NULL,
            location_id INTEGER NOT NULL,
            quantity REAL NOT NULL,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(order_id, recipe_id, location_id)
        );

        CREATE INDEX idx_order_recipe_lines_order ON order_recipe_lines(order_id);

        -- ============================================
        -- ORDER PLATTER LINES
        -- Whole-portion platter requirements per location
        -- ============================================
        CREATE TABLE order_platter_lines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            platter_id INTEGER NOT NULL,
            location_id INTEGER NOT NULL,
            portions REAL NOT NULL,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(order_id, platter_id, location_id)
        );

        CREATE INDEX idx_order_platter_lines_order ON order_platter_lines(order_id);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_run_clean() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }
}
