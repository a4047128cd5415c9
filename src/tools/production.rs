//! Production Report MCP Tool
//!
//! Assembles an engine snapshot from the database and runs the report
//! pipeline over it.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::engine::{
    compute_report, FormulaLine, LocationSpec, OrderSnapshot, PlatterComponent, PlatterSpec,
    ProductionReport, RawMaterialSpec, RecipeSpec, Snapshot, UnitConversion,
};
use crate::models::{
    Location, Order, OrderPlatterLine, OrderRecipeLine, Platter, PlatterRecipe, RawMaterial,
    Recipe, RecipeConversion, RecipeRawMaterial,
};

/// Response for production_report
#[derive(Debug, Serialize)]
pub struct ProductionReportResponse {
    pub order_id: i64,
    pub order_date: String,
    pub session: String,
    /// location id -> name, for rendering the per-location columns
    pub locations: BTreeMap<i64, String>,
    pub report: ProductionReport,
    /// Human-readable notes about skipped or approximated data
    pub warnings: Vec<String>,
}

/// Load everything the engine needs for one order
///
/// Reference collections are loaded in full; the engine skips whatever
/// an order line references that no longer exists.
pub fn load_snapshot(conn: &Connection, order_id: i64) -> DbResult<Snapshot> {
    let mut snapshot = Snapshot::default();

    for recipe in Recipe::get_all(conn)? {
        let conversions = RecipeConversion::get_for_recipe(conn, recipe.id)?
            .into_iter()
            .map(|c| UnitConversion {
                unit: c.unit,
                factor: c.factor,
            })
            .collect();

        let raw_materials = RecipeRawMaterial::get_for_recipe(conn, recipe.id)?
            .into_iter()
            .map(|line| FormulaLine {
                raw_material_id: line.raw_material_id,
                quantity: line.quantity,
            })
            .collect();

        snapshot.recipes.insert(
            recipe.id,
            RecipeSpec {
                id: recipe.id,
                name: recipe.name,
                yield_quantity: recipe.yield_quantity,
                yield_unit: recipe.yield_unit,
                default_ordering_unit: recipe.default_ordering_unit,
                conversions,
                raw_materials,
            },
        );
    }

    for platter in Platter::get_all(conn)? {
        let recipes = PlatterRecipe::get_for_platter(conn, platter.id)?
            .into_iter()
            .map(|component| PlatterComponent {
                recipe_id: component.recipe_id,
                quantity: component.quantity,
                unit: component.unit,
            })
            .collect();

        snapshot.platters.insert(
            platter.id,
            PlatterSpec {
                id: platter.id,
                name: platter.name,
                recipes,
            },
        );
    }

    for material in RawMaterial::get_all(conn)? {
        snapshot.raw_materials.insert(
            material.id,
            RawMaterialSpec {
                id: material.id,
                name: material.name,
                unit: material.unit,
            },
        );
    }

    for location in Location::get_active_for_order(conn, order_id)? {
        snapshot.locations.insert(
            location.id,
            LocationSpec {
                id: location.id,
                name: location.name,
            },
        );
    }

    let mut order = OrderSnapshot::default();
    for line in OrderRecipeLine::get_for_order(conn, order_id)? {
        order
            .recipe_requirements
            .entry(line.recipe_id)
            .or_default()
            .insert(line.location_id, line.quantity);
    }
    for line in OrderPlatterLine::get_for_order(conn, order_id)? {
        order
            .platter_requirements
            .entry(line.platter_id)
            .or_default()
            .insert(line.location_id, line.portions);
    }
    snapshot.order = order;

    Ok(snapshot)
}

fn collect_warnings(snapshot: &Snapshot, report: &ProductionReport) -> Vec<String> {
    let mut warnings = Vec::new();

    for (recipe_id, production) in &report.production {
        if production.incomplete {
            warnings.push(format!(
                "Recipe '{}' has lines in units it cannot convert; its total is incomplete",
                production.name
            ));
        }
        if let Some(packing) = report.packing.get(recipe_id) {
            if packing.total.unit.ends_with("(assumed)") {
                warnings.push(format!(
                    "Recipe '{}' packs as {} using the 1 kg per litre approximation",
                    packing.name, packing.total.unit
                ));
            }
        }
    }

    for recipe_id in &report.unscaled_recipes {
        if let Some(recipe) = snapshot.recipes.get(recipe_id) {
            warnings.push(format!(
                "Recipe '{}' has a nonpositive batch yield; its raw materials were omitted",
                recipe.name
            ));
        }
    }

    for recipe_id in snapshot.order.recipe_requirements.keys() {
        if !snapshot.recipes.contains_key(recipe_id) {
            warnings.push(format!(
                "Order references deleted recipe {}; those lines were skipped",
                recipe_id
            ));
        }
    }
    for platter_id in snapshot.order.platter_requirements.keys() {
        if !snapshot.platters.contains_key(platter_id) {
            warnings.push(format!(
                "Order references deleted platter {}; those lines were skipped",
                platter_id
            ));
        }
    }

    warnings
}

/// Compute the production report for an order
pub fn production_report(db: &Database, order_id: i64) -> Result<ProductionReportResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let order = Order::get_by_id(&conn, order_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Order not found with id: {}", order_id))?;

    let snapshot =
        load_snapshot(&conn, order_id).map_err(|e| format!("Failed to load order data: {}", e))?;

    let report = compute_report(&snapshot);
    let warnings = collect_warnings(&snapshot, &report);

    let locations = snapshot
        .locations
        .values()
        .map(|location| (location.id, location.name.clone()))
        .collect();

    Ok(ProductionReportResponse {
        order_id,
        order_date: order.order_date,
        session: order.session,
        locations,
        report,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{
        LocationCreate, OrderCreate, PlatterCreate, PlatterRecipeSet, RawMaterialCreate,
        RecipeConversionSet, RecipeCreate, RecipeRawMaterialSet,
    };
    use crate::tools::{orders, platters, raw_materials, recipes};

    const EPSILON: f64 = 1e-9;

    fn test_db() -> Database {
        let db = Database::new_in_memory().unwrap();
        db.with_conn(|conn| {
            run_migrations(conn)?;
            Ok(())
        })
        .unwrap();
        db
    }

    struct Fixture {
        db: Database,
        soup_id: i64,
        tomato_id: i64,
        order_id: i64,
        site_a: i64,
        site_b: i64,
    }

    /// Tomato Soup ordered by the bowl across two sites
    fn fixture() -> Fixture {
        let db = test_db();

        let soup_id = recipes::create_recipe(
            &db,
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

        recipes::set_recipe_conversion(
            &db,
            RecipeConversionSet {
                recipe_id: soup_id,
                unit: "bowl".to_string(),
                factor: 0.2,
            },
        )
        .unwrap();

        let tomato_id = raw_materials::create_raw_material(
            &db,
            RawMaterialCreate {
                name: "Tomato".to_string(),
                unit: "kg".to_string(),
                notes: None,
            },
        )
        .unwrap()
        .id;

        recipes::set_recipe_raw_material(
            &db,
            RecipeRawMaterialSet {
                recipe_id: soup_id,
                raw_material_id: tomato_id,
                quantity: 2.0,
            },
        )
        .unwrap();

        let order_id = orders::create_order(
            &db,
            OrderCreate {
                order_date: "2026-08-24".to_string(),
                session: "lunch".to_string(),
                notes: None,
            },
        )
        .unwrap()
        .id;

        let site_a = orders::add_location(
            &db,
            LocationCreate {
                name: "Site A".to_string(),
                order_id: None,
            },
        )
        .unwrap()
        .id;
        let site_b = orders::add_location(
            &db,
            LocationCreate {
                name: "Site B".to_string(),
                order_id: None,
            },
        )
        .unwrap()
        .id;

        Fixture {
            db,
            soup_id,
            tomato_id,
            order_id,
            site_a,
            site_b,
        }
    }

    #[test]
    fn test_report_from_database() {
        let f = fixture();

        orders::set_order_recipe_line(&f.db, f.order_id, f.soup_id, f.site_a, 10.0).unwrap();
        orders::set_order_recipe_line(&f.db, f.order_id, f.soup_id, f.site_b, 15.0).unwrap();

        let response = production_report(&f.db, f.order_id).unwrap();

        assert_eq!(response.order_date, "2026-08-24");
        assert_eq!(response.locations.len(), 2);

        let soup = &response.report.production[&f.soup_id];
        assert!((soup.quantity - 5.0).abs() < EPSILON);
        assert_eq!(soup.unit, "litres");

        let tomato = &response.report.raw_materials[&f.tomato_id];
        assert!((tomato.total - 2.0).abs() < EPSILON);

        // The litre-to-kg packing approximation is surfaced
        assert!(response
            .warnings
            .iter()
            .any(|w| w.contains("approximation")));
    }

    #[test]
    fn test_report_includes_platter_lines() {
        let f = fixture();

        let platter_id = platters::create_platter(
            &f.db,
            PlatterCreate {
                name: "Lunch Platter".to_string(),
                notes: None,
            },
        )
        .unwrap()
        .id;
        platters::set_platter_recipe(
            &f.db,
            PlatterRecipeSet {
                platter_id,
                recipe_id: f.soup_id,
                quantity: 2.0,
                unit: "bowl".to_string(),
            },
        )
        .unwrap();

        orders::set_order_recipe_line(&f.db, f.order_id, f.soup_id, f.site_a, 10.0).unwrap();
        orders::set_order_platter_line(&f.db, f.order_id, platter_id, f.site_b, 5.0).unwrap();

        let response = production_report(&f.db, f.order_id).unwrap();

        // (10 + 5 * 2) bowls * 0.2 = 4.0 litres
        let soup = &response.report.production[&f.soup_id];
        assert!((soup.quantity - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_report_survives_deleted_location() {
        let f = fixture();

        orders::set_order_recipe_line(&f.db, f.order_id, f.soup_id, f.site_a, 10.0).unwrap();
        orders::set_order_recipe_line(&f.db, f.order_id, f.soup_id, f.site_b, 15.0).unwrap();
        orders::delete_location(&f.db, f.site_b).unwrap();

        let response = production_report(&f.db, f.order_id).unwrap();

        // Only Site A's lines count
        let soup = &response.report.production[&f.soup_id];
        assert!((soup.quantity - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_report_for_missing_order_errors() {
        let f = fixture();
        assert!(production_report(&f.db, f.order_id + 999).is_err());
    }
}
