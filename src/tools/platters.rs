//! Platter MCP Tools
//!
//! Tools for managing platters and their component recipes.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    Platter, PlatterCreate, PlatterRecipe, PlatterRecipeDetail, PlatterRecipeSet, PlatterUpdate,
    Recipe,
};

/// Full platter detail with components
#[derive(Debug, Serialize)]
pub struct PlatterDetail {
    pub id: i64,
    pub name: String,
    pub recipes: Vec<PlatterRecipeDetail>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Platter summary for listing
#[derive(Debug, Serialize)]
pub struct PlatterSummary {
    pub id: i64,
    pub name: String,
    pub recipe_count: usize,
}

/// Response for list_platters
#[derive(Debug, Serialize)]
pub struct ListPlattersResponse {
    pub platters: Vec<PlatterSummary>,
    pub limit: i64,
    pub offset: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct PlatterDeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
    /// Order lines still referencing the platter; reports skip them
    pub stale_order_line_count: i64,
}

/// Create a new platter
pub fn create_platter(db: &Database, data: PlatterCreate) -> Result<Platter, String> {
    if data.name.trim().is_empty() {
        return Err("Platter name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Platter::create(&conn, &data).map_err(|e| format!("Failed to create platter: {}", e))
}

/// Get a platter with its components
pub fn get_platter(db: &Database, id: i64) -> Result<Option<PlatterDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let platter = Platter::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get platter: {}", e))?;

    match platter {
        Some(platter) => {
            let recipes = PlatterRecipe::get_details_for_platter(&conn, id)
                .map_err(|e| format!("Failed to get components: {}", e))?;

            Ok(Some(PlatterDetail {
                id: platter.id,
                name: platter.name,
                recipes,
                notes: platter.notes,
                created_at: platter.created_at,
                updated_at: platter.updated_at,
            }))
        }
        None => Ok(None),
    }
}

/// List platters with optional name search
pub fn list_platters(
    db: &Database,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListPlattersResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let platters = Platter::list(&conn, query, limit, offset)
        .map_err(|e| format!("Failed to list platters: {}", e))?;

    let mut summaries = Vec::new();
    for platter in platters {
        let components = PlatterRecipe::get_for_platter(&conn, platter.id)
            .map_err(|e| format!("Failed to get components: {}", e))?;

        summaries.push(PlatterSummary {
            id: platter.id,
            name: platter.name,
            recipe_count: components.len(),
        });
    }

    Ok(ListPlattersResponse {
        platters: summaries,
        limit,
        offset,
    })
}

/// Update a platter
pub fn update_platter(
    db: &Database,
    id: i64,
    data: PlatterUpdate,
) -> Result<Option<Platter>, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Platter name cannot be empty".to_string());
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Platter::update(&conn, id, &data).map_err(|e| format!("Failed to update platter: {}", e))
}

/// Delete a platter
///
/// Order lines referencing the platter stay in place; reports skip them.
/// The response carries the stale line count so the caller can warn.
pub fn delete_platter(db: &Database, id: i64) -> Result<PlatterDeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let platter = Platter::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if platter.is_none() {
        return Err(format!("Platter not found with id: {}", id));
    }

    let stale_order_line_count = Platter::get_order_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check order usage: {}", e))?;

    Platter::delete(&conn, id).map_err(|e| format!("Failed to delete platter: {}", e))?;

    Ok(PlatterDeleteResponse {
        success: true,
        deleted_id: id,
        stale_order_line_count,
    })
}

/// Set a component recipe on a platter (insert or update)
pub fn set_platter_recipe(db: &Database, data: PlatterRecipeSet) -> Result<PlatterRecipe, String> {
    if data.quantity <= 0.0 {
        return Err("Component quantity must be greater than 0".to_string());
    }
    if data.unit.trim().is_empty() {
        return Err("Component unit cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let platter = Platter::get_by_id(&conn, data.platter_id)
        .map_err(|e| format!("Database error checking platter: {}", e))?;
    if platter.is_none() {
        return Err(format!("Platter not found with id: {}", data.platter_id));
    }

    let recipe = Recipe::get_by_id(&conn, data.recipe_id)
        .map_err(|e| format!("Database error checking recipe: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", data.recipe_id));
    }

    PlatterRecipe::set(&conn, &data).map_err(|e| format!("Failed to set component: {}", e))
}

/// Remove a component recipe from a platter
pub fn remove_platter_recipe(db: &Database, platter_id: i64, recipe_id: i64) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    PlatterRecipe::remove(&conn, platter_id, recipe_id)
        .map_err(|e| format!("Failed to remove component: {}", e))
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

    fn soup(db: &Database) -> i64 {
        recipes::create_recipe(
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
        .id
    }

    #[test]
    fn test_create_platter_and_set_component() {
        let db = test_db();
        let recipe_id = soup(&db);

        let platter = create_platter(
            &db,
            PlatterCreate {
                name: "Lunch Platter".to_string(),
                notes: None,
            },
        )
        .unwrap();

        let component = set_platter_recipe(
            &db,
            PlatterRecipeSet {
                platter_id: platter.id,
                recipe_id,
                quantity: 2.0,
                unit: "bowl".to_string(),
            },
        )
        .unwrap();
        assert!((component.quantity - 2.0).abs() < 1e-9);

        let detail = get_platter(&db, platter.id).unwrap().unwrap();
        assert_eq!(detail.recipes.len(), 1);
        assert_eq!(detail.recipes[0].recipe_name, "Tomato Soup");
    }

    #[test]
    fn test_set_component_upserts() {
        let db = test_db();
        let recipe_id = soup(&db);
        let platter = create_platter(
            &db,
            PlatterCreate {
                name: "Lunch Platter".to_string(),
                notes: None,
            },
        )
        .unwrap();

        for quantity in [1.0, 3.0] {
            set_platter_recipe(
                &db,
                PlatterRecipeSet {
                    platter_id: platter.id,
                    recipe_id,
                    quantity,
                    unit: "bowl".to_string(),
                },
            )
            .unwrap();
        }

        let detail = get_platter(&db, platter.id).unwrap().unwrap();
        assert_eq!(detail.recipes.len(), 1);
        assert!((detail.recipes[0].quantity - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_recipe_delete_blocked_while_on_platter() {
        let db = test_db();
        let recipe_id = soup(&db);
        let platter = create_platter(
            &db,
            PlatterCreate {
                name: "Lunch Platter".to_string(),
                notes: None,
            },
        )
        .unwrap();

        set_platter_recipe(
            &db,
            PlatterRecipeSet {
                platter_id: platter.id,
                recipe_id,
                quantity: 2.0,
                unit: "bowl".to_string(),
            },
        )
        .unwrap();

        let blocked = recipes::delete_recipe(&db, recipe_id).unwrap();
        assert!(blocked.is_err());

        remove_platter_recipe(&db, platter.id, recipe_id).unwrap();
        let deleted = recipes::delete_recipe(&db, recipe_id).unwrap();
        assert!(deleted.is_ok());
    }
}
