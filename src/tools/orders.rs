//! Order MCP Tools
//!
//! Tools for managing production orders, their lines, and their
//! delivery locations.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    Location, LocationCreate, Order, OrderCreate, OrderPlatterLine, OrderRecipeLine, OrderUpdate,
    Platter, Recipe,
};

/// Full order detail with lines and active locations
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: i64,
    pub order_date: String,
    pub session: String,
    pub recipe_lines: Vec<OrderRecipeLine>,
    pub platter_lines: Vec<OrderPlatterLine>,
    pub locations: Vec<Location>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Order summary for listing
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: i64,
    pub order_date: String,
    pub session: String,
    pub recipe_line_count: usize,
    pub platter_line_count: usize,
}

/// Response for list_orders
#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct OrderDeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

// ============================================================================
// Order Tools
// ============================================================================

fn validate_date(date: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("Invalid order_date '{}': expected YYYY-MM-DD", date))
}

/// Create a new order
pub fn create_order(db: &Database, data: OrderCreate) -> Result<Order, String> {
    validate_date(&data.order_date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Order::create(&conn, &data).map_err(|e| format!("Failed to create order: {}", e))
}

/// Get an order with its lines and active locations
pub fn get_order(db: &Database, id: i64) -> Result<Option<OrderDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let order = Order::get_by_id(&conn, id).map_err(|e| format!("Failed to get order: {}", e))?;

    match order {
        Some(order) => {
            let recipe_lines = OrderRecipeLine::get_for_order(&conn, id)
                .map_err(|e| format!("Failed to get recipe lines: {}", e))?;
            let platter_lines = OrderPlatterLine::get_for_order(&conn, id)
                .map_err(|e| format!("Failed to get platter lines: {}", e))?;
            let locations = Location::get_active_for_order(&conn, id)
                .map_err(|e| format!("Failed to get locations: {}", e))?;

            Ok(Some(OrderDetail {
                id: order.id,
                order_date: order.order_date,
                session: order.session,
                recipe_lines,
                platter_lines,
                locations,
                notes: order.notes,
                created_at: order.created_at,
                updated_at: order.updated_at,
            }))
        }
        None => Ok(None),
    }
}

/// List orders with optional date range
pub fn list_orders(
    db: &Database,
    start_date: Option<&str>,
    end_date: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListOrdersResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let orders = Order::list(&conn, start_date, end_date, limit, offset)
        .map_err(|e| format!("Failed to list orders: {}", e))?;

    let total = Order::count(&conn).map_err(|e| format!("Failed to count orders: {}", e))?;

    let mut summaries = Vec::new();
    for order in orders {
        let recipe_lines = OrderRecipeLine::get_for_order(&conn, order.id)
            .map_err(|e| format!("Failed to get recipe lines: {}", e))?;
        let platter_lines = OrderPlatterLine::get_for_order(&conn, order.id)
            .map_err(|e| format!("Failed to get platter lines: {}", e))?;

        summaries.push(OrderSummary {
            id: order.id,
            order_date: order.order_date,
            session: order.session,
            recipe_line_count: recipe_lines.len(),
            platter_line_count: platter_lines.len(),
        });
    }

    Ok(ListOrdersResponse {
        orders: summaries,
        total,
        limit,
        offset,
    })
}

/// Update an order
pub fn update_order(db: &Database, id: i64, data: OrderUpdate) -> Result<Option<Order>, String> {
    if let Some(ref order_date) = data.order_date {
        validate_date(order_date)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Order::update(&conn, id, &data).map_err(|e| format!("Failed to update order: {}", e))
}

/// Delete an order (cascades to its lines and ad-hoc locations)
pub fn delete_order(db: &Database, id: i64) -> Result<OrderDeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Order::delete(&conn, id).map_err(|e| format!("Failed to delete order: {}", e))?;
    if !deleted {
        return Err(format!("Order not found with id: {}", id));
    }

    Ok(OrderDeleteResponse {
        success: true,
        deleted_id: id,
    })
}

// ============================================================================
// Line Tools
// ============================================================================

fn check_order_and_location(db: &Database, order_id: i64, location_id: i64) -> Result<(), String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let order = Order::get_by_id(&conn, order_id)
        .map_err(|e| format!("Database error checking order: {}", e))?;
    if order.is_none() {
        return Err(format!("Order not found with id: {}", order_id));
    }

    let location = Location::get_by_id(&conn, location_id)
        .map_err(|e| format!("Database error checking location: {}", e))?
        .ok_or_else(|| format!("Location not found with id: {}", location_id))?;

    // Ad-hoc locations belong to exactly one order
    if let Some(owner) = location.order_id {
        if owner != order_id {
            return Err(format!(
                "Location {} is scoped to order {}, not order {}",
                location_id, owner, order_id
            ));
        }
    }

    Ok(())
}

/// Set a direct recipe requirement (insert or update)
///
/// The quantity is interpreted in the recipe's default ordering unit.
/// Negative quantities are rejected here; the report additionally clamps
/// whatever it finds.
pub fn set_order_recipe_line(
    db: &Database,
    order_id: i64,
    recipe_id: i64,
    location_id: i64,
    quantity: f64,
) -> Result<OrderRecipeLine, String> {
    if quantity < 0.0 {
        return Err("Quantity cannot be negative".to_string());
    }

    check_order_and_location(db, order_id, location_id)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, recipe_id)
        .map_err(|e| format!("Database error checking recipe: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", recipe_id));
    }

    OrderRecipeLine::set(&conn, order_id, recipe_id, location_id, quantity)
        .map_err(|e| format!("Failed to set line: {}", e))
}

/// Remove a direct recipe requirement
pub fn remove_order_recipe_line(
    db: &Database,
    order_id: i64,
    recipe_id: i64,
    location_id: i64,
) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    OrderRecipeLine::remove(&conn, order_id, recipe_id, location_id)
        .map_err(|e| format!("Failed to remove line: {}", e))
}

/// Set a platter requirement (insert or update)
pub fn set_order_platter_line(
    db: &Database,
    order_id: i64,
    platter_id: i64,
    location_id: i64,
    portions: f64,
) -> Result<OrderPlatterLine, String> {
    if portions < 0.0 {
        return Err("Portions cannot be negative".to_string());
    }

    check_order_and_location(db, order_id, location_id)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let platter = Platter::get_by_id(&conn, platter_id)
        .map_err(|e| format!("Database error checking platter: {}", e))?;
    if platter.is_none() {
        return Err(format!("Platter not found with id: {}", platter_id));
    }

    OrderPlatterLine::set(&conn, order_id, platter_id, location_id, portions)
        .map_err(|e| format!("Failed to set line: {}", e))
}

/// Remove a platter requirement
pub fn remove_order_platter_line(
    db: &Database,
    order_id: i64,
    platter_id: i64,
    location_id: i64,
) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    OrderPlatterLine::remove(&conn, order_id, platter_id, location_id)
        .map_err(|e| format!("Failed to remove line: {}", e))
}

// ============================================================================
// Location Tools
// ============================================================================

/// Create a location, persistent or scoped to one order
pub fn add_location(db: &Database, data: LocationCreate) -> Result<Location, String> {
    if data.name.trim().is_empty() {
        return Err("Location name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if let Some(order_id) = data.order_id {
        let order = Order::get_by_id(&conn, order_id)
            .map_err(|e| format!("Database error checking order: {}", e))?;
        if order.is_none() {
            return Err(format!("Order not found with id: {}", order_id));
        }
    }

    Location::create(&conn, &data).map_err(|e| format!("Failed to create location: {}", e))
}

/// List persistent locations, or all locations active for an order
pub fn list_locations(db: &Database, order_id: Option<i64>) -> Result<Vec<Location>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let locations = match order_id {
        Some(order_id) => Location::get_active_for_order(&conn, order_id),
        None => Location::get_persistent(&conn),
    };

    locations.map_err(|e| format!("Failed to list locations: {}", e))
}

/// Delete a location
///
/// Order lines referencing it stay in place; reports skip them.
pub fn delete_location(db: &Database, id: i64) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Location::delete(&conn, id).map_err(|e| format!("Failed to delete location: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::RecipeCreate;
    use crate::tools::recipes;

    fn test_db() -> Database {
        let db = Database::new_in_memory().unwrap();
        db.with_conn(|conn| {
            run_migrations(conn)?;
            Ok(())
        })
        .unwrap();
        db
    }

    fn fixtures(db: &Database) -> (i64, i64, i64) {
        let recipe_id = recipes::create_recipe(
            db,
            RecipeCreate {
                name: "Tomato Soup".to_string(),
                yield_quantity: 5.0,
                yield_unit: "litres".to_string(),
                default_ordering_unit: Some("bowl".to_string()),
                notes: None,
            },
        )
        .unwrap()
        .id;

        let order = create_order(
            db,
            OrderCreate {
                order_date: "2026-08-24".to_string(),
                session: "lunch".to_string(),
                notes: None,
            },
        )
        .unwrap();

        let location = add_location(
            db,
            LocationCreate {
                name: "Site A".to_string(),
                order_id: None,
            },
        )
        .unwrap();

        (recipe_id, order.id, location.id)
    }

    #[test]
    fn test_set_line_then_get_order() {
        let db = test_db();
        let (recipe_id, order_id, location_id) = fixtures(&db);

        set_order_recipe_line(&db, order_id, recipe_id, location_id, 10.0).unwrap();

        let detail = get_order(&db, order_id).unwrap().unwrap();
        assert_eq!(detail.recipe_lines.len(), 1);
        assert!((detail.recipe_lines[0].quantity - 10.0).abs() < 1e-9);
        assert_eq!(detail.locations.len(), 1);
    }

    #[test]
    fn test_set_line_upserts() {
        let db = test_db();
        let (recipe_id, order_id, location_id) = fixtures(&db);

        set_order_recipe_line(&db, order_id, recipe_id, location_id, 10.0).unwrap();
        set_order_recipe_line(&db, order_id, recipe_id, location_id, 15.0).unwrap();

        let detail = get_order(&db, order_id).unwrap().unwrap();
        assert_eq!(detail.recipe_lines.len(), 1);
        assert!((detail.recipe_lines[0].quantity - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_order_date_rejected() {
        let db = test_db();
        let result = create_order(
            &db,
            OrderCreate {
                order_date: "24/08/2026".to_string(),
                session: "lunch".to_string(),
                notes: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let db = test_db();
        let (recipe_id, order_id, location_id) = fixtures(&db);

        let result = set_order_recipe_line(&db, order_id, recipe_id, location_id, -3.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_adhoc_location_scoped_to_its_order() {
        let db = test_db();
        let (recipe_id, order_id, _) = fixtures(&db);

        let other = create_order(
            &db,
            OrderCreate {
                order_date: "2026-08-25".to_string(),
                session: "dinner".to_string(),
                notes: None,
            },
        )
        .unwrap();

        let adhoc = add_location(
            &db,
            LocationCreate {
                name: "One-off Event".to_string(),
                order_id: Some(other.id),
            },
        )
        .unwrap();

        // Not usable from a different order
        let result = set_order_recipe_line(&db, order_id, recipe_id, adhoc.id, 5.0);
        assert!(result.is_err());

        // Usable from its own order
        set_order_recipe_line(&db, other.id, recipe_id, adhoc.id, 5.0).unwrap();
    }

    #[test]
    fn test_delete_order_cascades_adhoc_locations_and_lines() {
        let db = test_db();
        let (recipe_id, order_id, _) = fixtures(&db);

        let adhoc = add_location(
            &db,
            LocationCreate {
                name: "One-off Event".to_string(),
                order_id: Some(order_id),
            },
        )
        .unwrap();
        set_order_recipe_line(&db, order_id, recipe_id, adhoc.id, 5.0).unwrap();

        delete_order(&db, order_id).unwrap();

        let conn = db.get_conn().unwrap();
        assert!(Location::get_by_id(&conn, adhoc.id).unwrap().is_none());
        assert!(OrderRecipeLine::get_for_order(&conn, order_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_location_delete_leaves_lines_in_place() {
        let db = test_db();
        let (recipe_id, order_id, location_id) = fixtures(&db);

        set_order_recipe_line(&db, order_id, recipe_id, location_id, 10.0).unwrap();
        delete_location(&db, location_id).unwrap();

        // The line survives as an orphan; reports skip it
        let detail = get_order(&db, order_id).unwrap().unwrap();
        assert_eq!(detail.recipe_lines.len(), 1);
        assert!(detail.locations.is_empty());
    }
}
