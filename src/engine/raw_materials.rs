//! Raw material aggregation
//!
//! Scales each produced recipe's formula by its production multiplier and
//! sums matching raw materials across recipes. Raw material units are
//! fixed per material and never converted.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::snapshot::{RawMaterialSpec, RecipeSpec};

/// Total requirement for one raw material, in its canonical unit
#[derive(Debug, Clone, Serialize)]
pub struct RawMaterialTotal {
    pub name: String,
    pub total: f64,
    pub unit: String,
}

/// Aggregated raw material requirements across all produced recipes
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregatedRawMaterials {
    /// raw material id -> summed requirement
    pub totals: BTreeMap<i64, RawMaterialTotal>,
    /// Recipes that could not be scaled (yield quantity <= 0); their raw
    /// materials are omitted from the totals
    pub unscaled_recipes: BTreeSet<i64>,
}

/// Aggregate raw materials for the given production totals
///
/// A recipe missing from the reference collection, with a nonpositive
/// yield, or with a nonpositive production total contributes nothing.
/// The multiplier is production total over batch yield, since formulas
/// are defined per one full batch. Orphan raw material ids are skipped.
pub fn aggregate_raw_materials(
    production: &BTreeMap<i64, f64>,
    recipes: &BTreeMap<i64, RecipeSpec>,
    raw_materials: &BTreeMap<i64, RawMaterialSpec>,
) -> AggregatedRawMaterials {
    let mut result = AggregatedRawMaterials::default();

    for (recipe_id, &total) in production {
        let Some(recipe) = recipes.get(recipe_id) else {
            continue;
        };

        if recipe.yield_quantity <= 0.0 {
            tracing::warn!(
                "Recipe '{}' has nonpositive yield quantity; raw materials omitted",
                recipe.name
            );
            result.unscaled_recipes.insert(*recipe_id);
            continue;
        }

        if total <= 0.0 {
            continue;
        }

        let multiplier = total / recipe.yield_quantity;

        for line in &recipe.raw_materials {
            let Some(material) = raw_materials.get(&line.raw_material_id) else {
                continue;
            };

            result
                .totals
                .entry(material.id)
                .and_modify(|t| t.total += line.quantity * multiplier)
                .or_insert_with(|| RawMaterialTotal {
                    name: material.name.clone(),
                    total: line.quantity * multiplier,
                    unit: material.unit.clone(),
                });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::snapshot::FormulaLine;

    const EPSILON: f64 = 1e-9;

    fn tomato() -> RawMaterialSpec {
        RawMaterialSpec {
            id: 50,
            name: "Tomato".to_string(),
            unit: "kg".to_string(),
        }
    }

    fn soup_recipe() -> RecipeSpec {
        RecipeSpec {
            id: 1,
            name: "Tomato Soup".to_string(),
            yield_quantity: 5.0,
            yield_unit: "litres".to_string(),
            default_ordering_unit: "bowl".to_string(),
            conversions: vec![],
            raw_materials: vec![FormulaLine {
                raw_material_id: 50,
                quantity: 2.0,
            }],
        }
    }

    fn materials() -> BTreeMap<i64, RawMaterialSpec> {
        let mut map = BTreeMap::new();
        map.insert(50, tomato());
        map
    }

    #[test]
    fn test_scaling_by_production_multiplier() {
        let mut recipes = BTreeMap::new();
        recipes.insert(1, soup_recipe());

        // 7.5 litres produced on a 5-litre batch: 2 kg * 1.5 = 3 kg tomato
        let mut production = BTreeMap::new();
        production.insert(1, 7.5);

        let result = aggregate_raw_materials(&production, &recipes, &materials());
        let tomato = &result.totals[&50];
        assert!((tomato.total - 3.0).abs() < EPSILON);
        assert_eq!(tomato.unit, "kg");
    }

    #[test]
    fn test_matching_materials_sum_across_recipes() {
        let mut recipes = BTreeMap::new();
        recipes.insert(1, soup_recipe());

        let mut sauce = soup_recipe();
        sauce.id = 2;
        sauce.name = "Tomato Sauce".to_string();
        sauce.yield_quantity = 2.0;
        sauce.raw_materials = vec![FormulaLine {
            raw_material_id: 50,
            quantity: 1.0,
        }];
        recipes.insert(2, sauce);

        let mut production = BTreeMap::new();
        production.insert(1, 5.0); // multiplier 1.0 -> 2 kg
        production.insert(2, 4.0); // multiplier 2.0 -> 2 kg

        let result = aggregate_raw_materials(&production, &recipes, &materials());
        assert!((result.totals[&50].total - 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_nonpositive_yield_excluded_and_flagged() {
        let mut recipe = soup_recipe();
        recipe.yield_quantity = 0.0;
        let mut recipes = BTreeMap::new();
        recipes.insert(1, recipe);

        let mut production = BTreeMap::new();
        production.insert(1, 5.0);

        let result = aggregate_raw_materials(&production, &recipes, &materials());
        assert!(result.totals.is_empty());
        assert!(result.unscaled_recipes.contains(&1));
    }

    #[test]
    fn test_zero_production_and_orphans_skipped() {
        let mut recipes = BTreeMap::new();
        recipes.insert(1, soup_recipe());

        let mut production = BTreeMap::new();
        production.insert(1, 0.0); // nothing produced
        production.insert(99, 5.0); // orphan recipe

        let result = aggregate_raw_materials(&production, &recipes, &materials());
        assert!(result.totals.is_empty());
        assert!(result.unscaled_recipes.is_empty());
    }

    #[test]
    fn test_orphan_raw_material_skipped() {
        let mut recipe = soup_recipe();
        recipe.raw_materials.push(FormulaLine {
            raw_material_id: 777,
            quantity: 4.0,
        });
        let mut recipes = BTreeMap::new();
        recipes.insert(1, recipe);

        let mut production = BTreeMap::new();
        production.insert(1, 5.0);

        let result = aggregate_raw_materials(&production, &recipes, &materials());
        assert_eq!(result.totals.len(), 1);
        assert!(result.totals.contains_key(&50));
    }
}
