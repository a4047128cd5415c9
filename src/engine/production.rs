//! Production aggregation
//!
//! Merges direct recipe order lines and platter-expanded lines into one
//! total per recipe, expressed in that recipe's yield unit. Direct orders
//! and platter contributions share a single running total: a recipe may
//! be produced both ways on the same order, and the two are summed.

use std::collections::{BTreeMap, BTreeSet};

use super::convert::{convert_to_yield_unit, Conversion};
use super::platter::expand_platter;
use super::snapshot::{LocationSpec, OrderSnapshot, PlatterSpec, RecipeSpec};

/// Aggregated production figures in yield units
#[derive(Debug, Clone, Default)]
pub struct ProductionTotals {
    /// recipe id -> total production in the recipe's yield unit
    pub per_recipe: BTreeMap<i64, f64>,
    /// recipe id -> location id -> production in the recipe's yield unit
    pub per_location: BTreeMap<i64, BTreeMap<i64, f64>>,
    /// Recipes touched by at least one unconvertible line; their numeric
    /// totals understate demand and must be surfaced as incomplete
    pub flagged: BTreeSet<i64>,
}

impl ProductionTotals {
    fn add(&mut self, recipe_id: i64, location_id: i64, quantity: f64) {
        *self.per_recipe.entry(recipe_id).or_insert(0.0) += quantity;
        *self
            .per_location
            .entry(recipe_id)
            .or_default()
            .entry(location_id)
            .or_insert(0.0) += quantity;
    }

    fn record(&mut self, recipe: &RecipeSpec, location_id: i64, conversion: Conversion, unit: &str) {
        match conversion {
            Conversion::Converted(quantity) => self.add(recipe.id, location_id, quantity),
            Conversion::Unconvertible => {
                tracing::warn!(
                    "No conversion from '{}' to '{}' for recipe '{}'; contribution excluded",
                    unit,
                    recipe.yield_unit,
                    recipe.name
                );
                // Keep the cell present so the report shows N/A, not a gap
                self.add(recipe.id, location_id, 0.0);
                self.flagged.insert(recipe.id);
            }
        }
    }
}

/// Aggregate an order into per-recipe production totals
///
/// Orphan recipe, platter, or location ids are skipped line by line;
/// negative ordered quantities are clamped to zero. Conversion is linear,
/// so converting each per-location subtotal once is equivalent to
/// converting the combined total.
pub fn aggregate_production(
    order: &OrderSnapshot,
    recipes: &BTreeMap<i64, RecipeSpec>,
    platters: &BTreeMap<i64, PlatterSpec>,
    locations: &BTreeMap<i64, LocationSpec>,
) -> ProductionTotals {
    let mut totals = ProductionTotals::default();

    // Direct recipe requirements, ordered in the default ordering unit
    for (recipe_id, by_location) in &order.recipe_requirements {
        let Some(recipe) = recipes.get(recipe_id) else {
            continue;
        };

        for (&location_id, &quantity) in by_location {
            if !locations.contains_key(&location_id) {
                continue;
            }
            let quantity = quantity.max(0.0);
            if quantity <= 0.0 {
                continue;
            }

            let converted =
                convert_to_yield_unit(recipe, quantity, &recipe.default_ordering_unit);
            totals.record(recipe, location_id, converted, &recipe.default_ordering_unit);
        }
    }

    // Platter requirements, expanded into component recipe lines
    for (platter_id, by_location) in &order.platter_requirements {
        let Some(platter) = platters.get(platter_id) else {
            continue;
        };

        for line in expand_platter(platter, by_location) {
            let Some(recipe) = recipes.get(&line.recipe_id) else {
                continue;
            };
            if !locations.contains_key(&line.location_id) {
                continue;
            }

            let converted = convert_to_yield_unit(recipe, line.quantity, &line.unit);
            totals.record(recipe, line.location_id, converted, &line.unit);
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::snapshot::{PlatterComponent, UnitConversion};

    const EPSILON: f64 = 1e-9;

    fn soup_recipe() -> RecipeSpec {
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
            raw_materials: vec![],
        }
    }

    fn locations() -> BTreeMap<i64, LocationSpec> {
        let mut map = BTreeMap::new();
        for (id, name) in [(100, "Site A"), (200, "Site B")] {
            map.insert(
                id,
                LocationSpec {
                    id,
                    name: name.to_string(),
                },
            );
        }
        map
    }

    fn direct_order(lines: &[(i64, i64, f64)]) -> OrderSnapshot {
        let mut order = OrderSnapshot::default();
        for &(recipe_id, location_id, quantity) in lines {
            order
                .recipe_requirements
                .entry(recipe_id)
                .or_default()
                .insert(location_id, quantity);
        }
        order
    }

    #[test]
    fn test_direct_lines_sum_across_locations() {
        let mut recipes = BTreeMap::new();
        recipes.insert(1, soup_recipe());

        // 10 bowls at A, 15 bowls at B -> (10+15)*0.2 = 5.0 litres
        let order = direct_order(&[(1, 100, 10.0), (1, 200, 15.0)]);
        let totals = aggregate_production(&order, &recipes, &BTreeMap::new(), &locations());

        assert!((totals.per_recipe[&1] - 5.0).abs() < EPSILON);
        assert!((totals.per_location[&1][&100] - 2.0).abs() < EPSILON);
        assert!((totals.per_location[&1][&200] - 3.0).abs() < EPSILON);
        assert!(totals.flagged.is_empty());
    }

    #[test]
    fn test_platter_and_direct_share_one_total() {
        let mut recipes = BTreeMap::new();
        recipes.insert(1, soup_recipe());

        let mut platters = BTreeMap::new();
        platters.insert(
            10,
            PlatterSpec {
                id: 10,
                name: "Lunch Platter".to_string(),
                recipes: vec![PlatterComponent {
                    recipe_id: 1,
                    quantity: 2.0,
                    unit: "bowl".to_string(),
                }],
            },
        );

        // Direct: 5 bowls at A. Platter: 3 portions at A of 2 bowls each.
        let mut order = direct_order(&[(1, 100, 5.0)]);
        order
            .platter_requirements
            .entry(10)
            .or_default()
            .insert(100, 3.0);

        let totals = aggregate_production(&order, &recipes, &platters, &locations());

        // (5 + 6) bowls * 0.2 = 2.2 litres, all at location A
        assert!((totals.per_recipe[&1] - 2.2).abs() < EPSILON);
        assert!((totals.per_location[&1][&100] - 2.2).abs() < EPSILON);
    }

    #[test]
    fn test_platter_equivalence_to_direct_order() {
        let mut recipes = BTreeMap::new();
        recipes.insert(1, soup_recipe());

        let mut platters = BTreeMap::new();
        platters.insert(
            10,
            PlatterSpec {
                id: 10,
                name: "Solo".to_string(),
                recipes: vec![PlatterComponent {
                    recipe_id: 1,
                    quantity: 2.0,
                    unit: "bowl".to_string(),
                }],
            },
        );

        // N platters of 2 bowls vs N*2 bowls ordered directly
        let mut platter_order = OrderSnapshot::default();
        platter_order
            .platter_requirements
            .entry(10)
            .or_default()
            .insert(100, 4.0);

        let direct = direct_order(&[(1, 100, 8.0)]);

        let via_platter =
            aggregate_production(&platter_order, &recipes, &platters, &locations());
        let via_direct = aggregate_production(&direct, &recipes, &platters, &locations());

        assert!(
            (via_platter.per_recipe[&1] - via_direct.per_recipe[&1]).abs() < EPSILON
        );
    }

    #[test]
    fn test_linearity_of_aggregation() {
        let mut recipes = BTreeMap::new();
        recipes.insert(1, soup_recipe());

        let single = direct_order(&[(1, 100, 10.0), (1, 200, 15.0)]);
        let doubled = direct_order(&[(1, 100, 20.0), (1, 200, 30.0)]);

        let t1 = aggregate_production(&single, &recipes, &BTreeMap::new(), &locations());
        let t2 = aggregate_production(&doubled, &recipes, &BTreeMap::new(), &locations());

        assert!((t2.per_recipe[&1] - 2.0 * t1.per_recipe[&1]).abs() < EPSILON);
    }

    #[test]
    fn test_unconvertible_contributes_zero_and_flags() {
        let mut recipe = soup_recipe();
        recipe.default_ordering_unit = "scoop".to_string();
        let mut recipes = BTreeMap::new();
        recipes.insert(1, recipe);

        let order = direct_order(&[(1, 100, 5.0)]);
        let totals = aggregate_production(&order, &recipes, &BTreeMap::new(), &locations());

        assert_eq!(totals.per_recipe[&1], 0.0);
        assert!(totals.flagged.contains(&1));
    }

    #[test]
    fn test_orphan_references_skipped() {
        let mut recipes = BTreeMap::new();
        recipes.insert(1, soup_recipe());

        // Recipe 99 and location 999 do not exist; platter 77 does not exist
        let mut order = direct_order(&[(99, 100, 10.0), (1, 999, 10.0), (1, 100, 10.0)]);
        order
            .platter_requirements
            .entry(77)
            .or_default()
            .insert(100, 2.0);

        let totals = aggregate_production(&order, &recipes, &BTreeMap::new(), &locations());

        assert_eq!(totals.per_recipe.len(), 1);
        assert!((totals.per_recipe[&1] - 2.0).abs() < EPSILON);
        assert!(totals.flagged.is_empty());
    }

    #[test]
    fn test_negative_quantities_clamped() {
        let mut recipes = BTreeMap::new();
        recipes.insert(1, soup_recipe());

        let order = direct_order(&[(1, 100, -10.0), (1, 200, 5.0)]);
        let totals = aggregate_production(&order, &recipes, &BTreeMap::new(), &locations());

        assert!((totals.per_recipe[&1] - 1.0).abs() < EPSILON);
        assert!(!totals.per_location[&1].contains_key(&100));
    }
}
