//! Recipe MCP Tools
//!
//! Tools for managing recipes, their conversion tables, and their raw
//! material formulas.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    RawMaterial, Recipe, RecipeConversion, RecipeConversionSet, RecipeCreate,
    RecipeRawMaterial, RecipeRawMaterialDetail, RecipeRawMaterialSet, RecipeUpdate,
};

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub name: String,
    pub yield_quantity: f64,
    pub yield_unit: String,
    pub default_ordering_unit: String,
    pub created_at: String,
}

/// Full recipe detail with conversions and formula
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub name: String,
    pub yield_quantity: f64,
    pub yield_unit: String,
    pub default_ordering_unit: String,
    pub conversions: Vec<RecipeConversion>,
    pub raw_materials: Vec<RecipeRawMaterialDetail>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub yield_quantity: f64,
    pub yield_unit: String,
    pub default_ordering_unit: String,
    pub conversion_count: usize,
    pub raw_material_count: usize,
}

/// Response for list_recipes
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for delete blocked
#[derive(Debug, Serialize)]
pub struct RecipeDeleteBlockedResponse {
    pub error: String,
    pub platter_usage_count: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct RecipeDeleteSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
    /// Order lines that now reference a missing recipe; reports skip them
    pub stale_order_line_count: i64,
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a new recipe
pub fn create_recipe(db: &Database, data: RecipeCreate) -> Result<CreateRecipeResponse, String> {
    // Validate name
    let name = data.name.trim();
    if name.is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }

    // Validate yield
    if data.yield_quantity <= 0.0 {
        return Err("yield_quantity must be greater than 0".to_string());
    }
    if data.yield_unit.trim().is_empty() {
        return Err("yield_unit cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::create(&conn, &data)
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    Ok(CreateRecipeResponse {
        id: recipe.id,
        name: recipe.name,
        yield_quantity: recipe.yield_quantity,
        yield_unit: recipe.yield_unit,
        default_ordering_unit: recipe.default_ordering_unit,
        created_at: recipe.created_at,
    })
}

/// Get a recipe with full details
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?;

    match recipe {
        Some(recipe) => {
            let conversions = RecipeConversion::get_for_recipe(&conn, id)
                .map_err(|e| format!("Failed to get conversions: {}", e))?;

            let raw_materials = RecipeRawMaterial::get_details_for_recipe(&conn, id)
                .map_err(|e| format!("Failed to get raw materials: {}", e))?;

            Ok(Some(RecipeDetail {
                id: recipe.id,
                name: recipe.name,
                yield_quantity: recipe.yield_quantity,
                yield_unit: recipe.yield_unit,
                default_ordering_unit: recipe.default_ordering_unit,
                conversions,
                raw_materials,
                notes: recipe.notes,
                created_at: recipe.created_at,
                updated_at: recipe.updated_at,
            }))
        }
        None => Ok(None),
    }
}

/// List recipes with optional name search
pub fn list_recipes(
    db: &Database,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListRecipesResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query, limit, offset)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let total = Recipe::count(&conn)
        .map_err(|e| format!("Failed to count recipes: {}", e))?;

    let mut summaries = Vec::new();
    for recipe in recipes {
        let conversions = RecipeConversion::get_for_recipe(&conn, recipe.id)
            .map_err(|e| format!("Failed to get conversions: {}", e))?;
        let raw_materials = RecipeRawMaterial::get_for_recipe(&conn, recipe.id)
            .map_err(|e| format!("Failed to get raw materials: {}", e))?;

        summaries.push(RecipeSummary {
            id: recipe.id,
            name: recipe.name,
            yield_quantity: recipe.yield_quantity,
            yield_unit: recipe.yield_unit,
            default_ordering_unit: recipe.default_ordering_unit,
            conversion_count: conversions.len(),
            raw_material_count: raw_materials.len(),
        });
    }

    Ok(ListRecipesResponse {
        recipes: summaries,
        total,
        limit,
        offset,
    })
}

/// Update a recipe
pub fn update_recipe(db: &Database, id: i64, data: RecipeUpdate) -> Result<Option<Recipe>, String> {
    if let Some(yield_quantity) = data.yield_quantity {
        if yield_quantity <= 0.0 {
            return Err("yield_quantity must be greater than 0".to_string());
        }
    }
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Recipe name cannot be empty".to_string());
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Recipe::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update recipe: {}", e))
}

/// Delete a recipe (blocked while it is a platter component)
pub fn delete_recipe(
    db: &Database,
    id: i64,
) -> Result<Result<RecipeDeleteSuccessResponse, RecipeDeleteBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    // Check if recipe exists
    let recipe = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", id));
    }

    // Check if used on a platter
    let platter_usage_count = Recipe::get_platter_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check platter usage: {}", e))?;

    if platter_usage_count > 0 {
        return Ok(Err(RecipeDeleteBlockedResponse {
            error: format!(
                "Cannot delete recipe: used as component on {} platter(s)",
                platter_usage_count
            ),
            platter_usage_count,
        }));
    }

    let stale_order_line_count = Recipe::get_order_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check order usage: {}", e))?;

    // Deletion cascades to conversions and formula lines; stale order
    // lines are tolerated and skipped by the report
    Recipe::delete(&conn, id)
        .map_err(|e| format!("Failed to delete recipe: {}", e))?;

    Ok(Ok(RecipeDeleteSuccessResponse {
        success: true,
        deleted_id: id,
        stale_order_line_count,
    }))
}

// ============================================================================
// Conversion Tools
// ============================================================================

/// Set a conversion on a recipe (insert or update)
pub fn set_recipe_conversion(
    db: &Database,
    data: RecipeConversionSet,
) -> Result<RecipeConversion, String> {
    if data.factor <= 0.0 {
        return Err("Conversion factor must be greater than 0".to_string());
    }
    let unit = data.unit.trim();
    if unit.is_empty() {
        return Err("Conversion unit cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, data.recipe_id)
        .map_err(|e| format!("Database error checking recipe: {}", e))?
        .ok_or_else(|| format!("Recipe not found with id: {}", data.recipe_id))?;

    // The yield unit converts to itself; a table entry for it would shadow
    // the identity rule
    if unit.to_lowercase() == recipe.yield_unit.trim().to_lowercase() {
        return Err(format!(
            "Conversion unit '{}' equals the recipe's yield unit; the yield unit needs no conversion",
            unit
        ));
    }

    RecipeConversion::set(&conn, &data)
        .map_err(|e| format!("Failed to set conversion: {}", e))
}

/// Remove a conversion from a recipe
pub fn remove_recipe_conversion(db: &Database, recipe_id: i64, unit: &str) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    RecipeConversion::remove(&conn, recipe_id, unit)
        .map_err(|e| format!("Failed to remove conversion: {}", e))
}

// ============================================================================
// Formula Tools
// ============================================================================

/// Set a raw material quantity on a recipe's formula (insert or update)
pub fn set_recipe_raw_material(
    db: &Database,
    data: RecipeRawMaterialSet,
) -> Result<RecipeRawMaterial, String> {
    if data.quantity < 0.0 {
        return Err("Raw material quantity cannot be negative".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    // Validate recipe exists
    let recipe = Recipe::get_by_id(&conn, data.recipe_id)
        .map_err(|e| format!("Database error checking recipe: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", data.recipe_id));
    }

    // Validate raw material exists
    let material = RawMaterial::get_by_id(&conn, data.raw_material_id)
        .map_err(|e| format!("Database error checking raw material: {}", e))?;
    if material.is_none() {
        return Err(format!(
            "Raw material not found with id: {}",
            data.raw_material_id
        ));
    }

    RecipeRawMaterial::set(&conn, &data)
        .map_err(|e| format!("Failed to set raw material: {}", e))
}

/// Remove a raw material from a recipe's formula
pub fn remove_recipe_raw_material(
    db: &Database,
    recipe_id: i64,
    raw_material_id: i64,
) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    RecipeRawMaterial::remove(&conn, recipe_id, raw_material_id)
        .map_err(|e| format!("Failed to remove raw material: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn test_db() -> Database {
        let db = Database::new_in_memory().unwrap();
        db.with_conn(|conn| {
            run_migrations(conn)?;
            Ok(())
        })
        .unwrap();
        db
    }

    fn soup_create() -> RecipeCreate {
        RecipeCreate {
            name: "Tomato Soup".to_string(),
            yield_quantity: 5.0,
            yield_unit: "litres".to_string(),
            default_ordering_unit: Some("bowl".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_create_and_get_recipe() {
        let db = test_db();
        let created = create_recipe(&db, soup_create()).unwrap();
        assert_eq!(created.name, "Tomato Soup");
        assert_eq!(created.default_ordering_unit, "bowl");

        let detail = get_recipe(&db, created.id).unwrap().unwrap();
        assert_eq!(detail.yield_unit, "litres");
        assert!(detail.conversions.is_empty());
    }

    #[test]
    fn test_ordering_unit_defaults_to_yield_unit() {
        let db = test_db();
        let mut data = soup_create();
        data.default_ordering_unit = None;

        let created = create_recipe(&db, data).unwrap();
        assert_eq!(created.default_ordering_unit, "litres");
    }

    #[test]
    fn test_create_recipe_rejects_bad_yield() {
        let db = test_db();
        let mut data = soup_create();
        data.yield_quantity = 0.0;
        assert!(create_recipe(&db, data).is_err());
    }

    #[test]
    fn test_set_conversion_rejects_yield_unit() {
        let db = test_db();
        let created = create_recipe(&db, soup_create()).unwrap();

        let result = set_recipe_conversion(
            &db,
            RecipeConversionSet {
                recipe_id: created.id,
                unit: "Litres".to_string(),
                factor: 1.0,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_set_conversion_upserts() {
        let db = test_db();
        let created = create_recipe(&db, soup_create()).unwrap();

        let first = set_recipe_conversion(
            &db,
            RecipeConversionSet {
                recipe_id: created.id,
                unit: "bowl".to_string(),
                factor: 0.2,
            },
        )
        .unwrap();
        assert!((first.factor - 0.2).abs() < 1e-9);

        let second = set_recipe_conversion(
            &db,
            RecipeConversionSet {
                recipe_id: created.id,
                unit: "bowl".to_string(),
                factor: 0.25,
            },
        )
        .unwrap();
        assert_eq!(second.id, first.id);
        assert!((second.factor - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_set_conversion_rejects_nonpositive_factor() {
        let db = test_db();
        let created = create_recipe(&db, soup_create()).unwrap();

        let result = set_recipe_conversion(
            &db,
            RecipeConversionSet {
                recipe_id: created.id,
                unit: "bowl".to_string(),
                factor: 0.0,
            },
        );
        assert!(result.is_err());
    }
}
