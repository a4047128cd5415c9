//! Raw Material MCP Tools

use serde::Serialize;

use crate::db::Database;
use crate::models::{RawMaterial, RawMaterialCreate, RawMaterialUpdate};

/// Raw material summary for listing
#[derive(Debug, Serialize)]
pub struct RawMaterialSummary {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub recipe_usage_count: i64,
}

/// Response for list_raw_materials
#[derive(Debug, Serialize)]
pub struct ListRawMaterialsResponse {
    pub raw_materials: Vec<RawMaterialSummary>,
    pub limit: i64,
    pub offset: i64,
}

/// Response for delete blocked
#[derive(Debug, Serialize)]
pub struct RawMaterialDeleteBlockedResponse {
    pub error: String,
    pub recipe_usage_count: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct RawMaterialDeleteSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Create a new raw material
pub fn create_raw_material(
    db: &Database,
    data: RawMaterialCreate,
) -> Result<RawMaterial, String> {
    if data.name.trim().is_empty() {
        return Err("Raw material name cannot be empty".to_string());
    }
    if data.unit.trim().is_empty() {
        return Err("Raw material unit cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    RawMaterial::create(&conn, &data)
        .map_err(|e| format!("Failed to create raw material: {}", e))
}

/// Get a raw material by id
pub fn get_raw_material(db: &Database, id: i64) -> Result<Option<RawMaterial>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    RawMaterial::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get raw material: {}", e))
}

/// List raw materials with optional name search
pub fn list_raw_materials(
    db: &Database,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListRawMaterialsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let materials = RawMaterial::list(&conn, query, limit, offset)
        .map_err(|e| format!("Failed to list raw materials: {}", e))?;

    let mut summaries = Vec::new();
    for material in materials {
        let recipe_usage_count = RawMaterial::get_recipe_usage_count(&conn, material.id)
            .map_err(|e| format!("Failed to check usage: {}", e))?;

        summaries.push(RawMaterialSummary {
            id: material.id,
            name: material.name,
            unit: material.unit,
            recipe_usage_count,
        });
    }

    Ok(ListRawMaterialsResponse {
        raw_materials: summaries,
        limit,
        offset,
    })
}

/// Update a raw material
pub fn update_raw_material(
    db: &Database,
    id: i64,
    data: RawMaterialUpdate,
) -> Result<Option<RawMaterial>, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Raw material name cannot be empty".to_string());
        }
    }
    if let Some(ref unit) = data.unit {
        if unit.trim().is_empty() {
            return Err("Raw material unit cannot be empty".to_string());
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    RawMaterial::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update raw material: {}", e))
}

/// Delete a raw material (blocked while any recipe formula uses it)
pub fn delete_raw_material(
    db: &Database,
    id: i64,
) -> Result<Result<RawMaterialDeleteSuccessResponse, RawMaterialDeleteBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let material = RawMaterial::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if material.is_none() {
        return Err(format!("Raw material not found with id: {}", id));
    }

    let recipe_usage_count = RawMaterial::get_recipe_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check usage: {}", e))?;

    if recipe_usage_count > 0 {
        return Ok(Err(RawMaterialDeleteBlockedResponse {
            error: format!(
                "Cannot delete raw material: used in {} recipe formula(s)",
                recipe_usage_count
            ),
            recipe_usage_count,
        }));
    }

    RawMaterial::delete(&conn, id)
        .map_err(|e| format!("Failed to delete raw material: {}", e))?;

    Ok(Ok(RawMaterialDeleteSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{RecipeCreate, RecipeRawMaterialSet};
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

    #[test]
    fn test_create_and_get() {
        let db = test_db();
        let created = create_raw_material(
            &db,
            RawMaterialCreate {
                name: "Tomato".to_string(),
                unit: "kg".to_string(),
                notes: None,
            },
        )
        .unwrap();

        let fetched = get_raw_material(&db, created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Tomato");
        assert_eq!(fetched.unit, "kg");
    }

    #[test]
    fn test_create_rejects_empty_unit() {
        let db = test_db();
        let result = create_raw_material(
            &db,
            RawMaterialCreate {
                name: "Tomato".to_string(),
                unit: "  ".to_string(),
                notes: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_blocked_while_in_formula() {
        let db = test_db();
        let material = create_raw_material(
            &db,
            RawMaterialCreate {
                name: "Tomato".to_string(),
                unit: "kg".to_string(),
                notes: None,
            },
        )
        .unwrap();

        let recipe = recipes::create_recipe(
            &db,
            RecipeCreate {
                name: "Tomato Soup".to_string(),
                yield_quantity: 5.0,
                yield_unit: "litres".to_string(),
                default_ordering_unit: None,
                notes: None,
            },
        )
        .unwrap();

        recipes::set_recipe_raw_material(
            &db,
            RecipeRawMaterialSet {
                recipe_id: recipe.id,
                raw_material_id: material.id,
                quantity: 2.0,
            },
        )
        .unwrap();

        let blocked = delete_raw_material(&db, material.id).unwrap();
        assert!(blocked.is_err());

        recipes::remove_recipe_raw_material(&db, recipe.id, material.id).unwrap();
        let deleted = delete_raw_material(&db, material.id).unwrap();
        assert!(deleted.is_ok());
    }
}
