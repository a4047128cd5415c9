//! Production report assembly
//!
//! The single shared pipeline behind both the interactive report tool and
//! any export path: aggregate production, plan packing per location and
//! for the grand total, then aggregate raw materials.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::packing::{plan_packing, PackedQuantity};
use super::production::aggregate_production;
use super::raw_materials::{aggregate_raw_materials, RawMaterialTotal};
use super::snapshot::Snapshot;

/// Total production for one recipe, in its yield unit
#[derive(Debug, Clone, Serialize)]
pub struct RecipeProduction {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    /// True when an unconvertible line was excluded from the total; the
    /// figure understates demand and should render as incomplete/"N/A"
    pub incomplete: bool,
}

/// Packing figures for one recipe: per location plus the grand total
#[derive(Debug, Clone, Serialize)]
pub struct RecipePacking {
    pub name: String,
    pub by_location: BTreeMap<i64, PackedQuantity>,
    pub total: PackedQuantity,
}

/// The full derived output for one order
///
/// Consumers treat a missing key as zero / not applicable, never as an
/// error.
#[derive(Debug, Clone, Serialize)]
pub struct ProductionReport {
    /// recipe id -> total production in yield units
    pub production: BTreeMap<i64, RecipeProduction>,
    /// recipe id -> packing plan
    pub packing: BTreeMap<i64, RecipePacking>,
    /// raw material id -> aggregate requirement
    pub raw_materials: BTreeMap<i64, RawMaterialTotal>,
    /// Recipes whose raw materials were omitted (nonpositive yield)
    pub unscaled_recipes: BTreeSet<i64>,
}

/// Compute the full production report for one snapshot
pub fn compute_report(snapshot: &Snapshot) -> ProductionReport {
    let totals = aggregate_production(
        &snapshot.order,
        &snapshot.recipes,
        &snapshot.platters,
        &snapshot.locations,
    );

    let mut production = BTreeMap::new();
    let mut packing = BTreeMap::new();

    for (&recipe_id, &total) in &totals.per_recipe {
        // Recipes only enter the totals through the reference collection
        let Some(recipe) = snapshot.recipes.get(&recipe_id) else {
            continue;
        };

        production.insert(
            recipe_id,
            RecipeProduction {
                name: recipe.name.clone(),
                quantity: total,
                unit: recipe.yield_unit.clone(),
                incomplete: totals.flagged.contains(&recipe_id),
            },
        );

        let by_location = totals
            .per_location
            .get(&recipe_id)
            .map(|cells| {
                cells
                    .iter()
                    .map(|(&location_id, &quantity)| {
                        (location_id, plan_packing(recipe, quantity))
                    })
                    .collect()
            })
            .unwrap_or_default();

        packing.insert(
            recipe_id,
            RecipePacking {
                name: recipe.name.clone(),
                by_location,
                total: plan_packing(recipe, total),
            },
        );
    }

    let aggregated = aggregate_raw_materials(
        &totals.per_recipe,
        &snapshot.recipes,
        &snapshot.raw_materials,
    );

    ProductionReport {
        production,
        packing,
        raw_materials: aggregated.totals,
        unscaled_recipes: aggregated.unscaled_recipes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::snapshot::{
        FormulaLine, LocationSpec, PlatterComponent, PlatterSpec, RawMaterialSpec, RecipeSpec,
        UnitConversion,
    };

    const EPSILON: f64 = 1e-9;

    /// Tomato Soup: 5-litre batches, ordered by the bowl, 2 kg of tomato
    /// per batch
    fn soup_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();

        snapshot.recipes.insert(
            1,
            RecipeSpec {
                id: 1,
                name: "Tomato Soup".to_string(),
                yield_quantity: 5.0,
                yield_unit: "litres".to_string(),
                default_ordering_unit: "bowl".to_string(),
                conversions: vec![UnitConversion {
                    unit: "bowl".to_string(),
                    factor: 0.2,
                }],
                raw_materials: vec![FormulaLine {
                    raw_material_id: 50,
                    quantity: 2.0,
                }],
            },
        );

        snapshot.raw_materials.insert(
            50,
            RawMaterialSpec {
                id: 50,
                name: "Tomato".to_string(),
                unit: "kg".to_string(),
            },
        );

        for (id, name) in [(100, "Site A"), (200, "Site B")] {
            snapshot.locations.insert(
                id,
                LocationSpec {
                    id,
                    name: name.to_string(),
                },
            );
        }

        snapshot
    }

    #[test]
    fn test_end_to_end_tomato_soup() {
        let mut snapshot = soup_snapshot();
        snapshot
            .order
            .recipe_requirements
            .entry(1)
            .or_default()
            .extend([(100, 10.0), (200, 15.0)]);

        let report = compute_report(&snapshot);

        // Production: (10 + 15) * 0.2 = 5.0 litres
        let soup = &report.production[&1];
        assert!((soup.quantity - 5.0).abs() < EPSILON);
        assert_eq!(soup.unit, "litres");
        assert!(!soup.incomplete);

        // Packing: no kg/grams conversion declared, yield unit contains
        // "litre", so the quantity packs as labeled kg
        let packed = &report.packing[&1];
        assert_eq!(packed.total.unit, "kg (assumed)");
        assert!((packed.total.quantity - 5.0).abs() < EPSILON);
        assert!((packed.by_location[&100].quantity - 2.0).abs() < EPSILON);
        assert!((packed.by_location[&200].quantity - 3.0).abs() < EPSILON);

        // Raw materials: 2 kg tomato * (5.0 / 5.0) = 2.0 kg
        let tomato = &report.raw_materials[&50];
        assert!((tomato.total - 2.0).abs() < EPSILON);
        assert_eq!(tomato.unit, "kg");
    }

    #[test]
    fn test_platter_contribution_reaches_raw_materials() {
        let mut snapshot = soup_snapshot();
        snapshot.platters.insert(
            10,
            PlatterSpec {
                id: 10,
                name: "Lunch Platter".to_string(),
                recipes: vec![PlatterComponent {
                    recipe_id: 1,
                    quantity: 5.0,
                    unit: "bowl".to_string(),
                }],
            },
        );
        snapshot
            .order
            .platter_requirements
            .entry(10)
            .or_default()
            .insert(100, 5.0);

        let report = compute_report(&snapshot);

        // 25 bowls * 0.2 = 5 litres = one full batch = 2 kg tomato
        assert!((report.production[&1].quantity - 5.0).abs() < EPSILON);
        assert!((report.raw_materials[&50].total - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_incomplete_flag_propagates_to_report() {
        let mut snapshot = soup_snapshot();
        snapshot
            .recipes
            .get_mut(&1)
            .unwrap()
            .default_ordering_unit = "scoop".to_string();
        snapshot
            .order
            .recipe_requirements
            .entry(1)
            .or_default()
            .insert(100, 5.0);

        let report = compute_report(&snapshot);

        let soup = &report.production[&1];
        assert_eq!(soup.quantity, 0.0);
        assert!(soup.incomplete);
    }

    #[test]
    fn test_empty_order_produces_empty_report() {
        let snapshot = soup_snapshot();
        let report = compute_report(&snapshot);

        assert!(report.production.is_empty());
        assert!(report.packing.is_empty());
        assert!(report.raw_materials.is_empty());
    }

    #[test]
    fn test_commutativity_across_location_order() {
        // Same lines inserted in different orders produce identical totals
        let mut a = soup_snapshot();
        a.order
            .recipe_requirements
            .entry(1)
            .or_default()
            .extend([(100, 10.0), (200, 15.0)]);

        let mut b = soup_snapshot();
        b.order
            .recipe_requirements
            .entry(1)
            .or_default()
            .extend([(200, 15.0), (100, 10.0)]);

        let ra = compute_report(&a);
        let rb = compute_report(&b);

        assert!((ra.production[&1].quantity - rb.production[&1].quantity).abs() < EPSILON);
        assert!(
            (ra.raw_materials[&50].total - rb.raw_materials[&50].total).abs() < EPSILON
        );
    }
}
