//! Packing planning
//!
//! Converts a yield-unit production figure into a physically practical
//! packing quantity, preferring weight units.

use serde::Serialize;

use super::convert::units_match;
use super::snapshot::RecipeSpec;

/// Packing units tried in order before falling back
const PREFERRED_UNITS: [&str; 2] = ["kg", "grams"];

/// A quantity resolved to a packing unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedQuantity {
    pub quantity: f64,
    pub unit: String,
}

/// Choose a packing unit for a yield-unit quantity
///
/// Tries the preferred weight units first: the yield unit itself, then
/// the recipe's conversion table applied in the inverse direction
/// (yield-unit quantity divided by the declared factor). A litre-based
/// yield unit with no weight conversion packs as "kg (assumed)" — a
/// labeled approximation rather than a silent unit mismatch. Anything
/// else stays in the yield unit.
pub fn plan_packing(recipe: &RecipeSpec, total_yield_quantity: f64) -> PackedQuantity {
    for preferred in PREFERRED_UNITS {
        if units_match(&recipe.yield_unit, preferred) {
            return PackedQuantity {
                quantity: total_yield_quantity,
                unit: recipe.yield_unit.clone(),
            };
        }
    }

    for preferred in PREFERRED_UNITS {
        if let Some(conversion) = recipe
            .conversions
            .iter()
            .find(|c| units_match(&c.unit, preferred))
        {
            if conversion.factor > 0.0 {
                return PackedQuantity {
                    quantity: total_yield_quantity / conversion.factor,
                    unit: conversion.unit.clone(),
                };
            }
        }
    }

    if recipe.yield_unit.to_lowercase().contains("litre") {
        return PackedQuantity {
            quantity: total_yield_quantity,
            unit: "kg (assumed)".to_string(),
        };
    }

    PackedQuantity {
        quantity: total_yield_quantity,
        unit: recipe.yield_unit.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::snapshot::UnitConversion;

    const EPSILON: f64 = 1e-9;

    fn recipe(yield_unit: &str, conversions: Vec<UnitConversion>) -> RecipeSpec {
        RecipeSpec {
            id: 1,
            name: "Test".to_string(),
            yield_quantity: 5.0,
            yield_unit: yield_unit.to_string(),
            default_ordering_unit: yield_unit.to_string(),
            conversions,
            raw_materials: vec![],
        }
    }

    #[test]
    fn test_yield_unit_already_preferred() {
        let r = recipe("kg", vec![]);
        let packed = plan_packing(&r, 12.5);
        assert_eq!(packed.unit, "kg");
        assert!((packed.quantity - 12.5).abs() < EPSILON);
    }

    #[test]
    fn test_inverse_conversion_to_kg() {
        // 1 kg = 2 litres declared; 10 litres pack as 5 kg
        let r = recipe(
            "litres",
            vec![UnitConversion {
                unit: "kg".to_string(),
                factor: 2.0,
            }],
        );
        let packed = plan_packing(&r, 10.0);
        assert_eq!(packed.unit, "kg");
        assert!((packed.quantity - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_kg_preferred_over_grams() {
        let r = recipe(
            "litres",
            vec![
                UnitConversion {
                    unit: "grams".to_string(),
                    factor: 0.001,
                },
                UnitConversion {
                    unit: "kg".to_string(),
                    factor: 1.0,
                },
            ],
        );
        let packed = plan_packing(&r, 3.0);
        assert_eq!(packed.unit, "kg");
    }

    #[test]
    fn test_litre_yield_packs_as_assumed_kg() {
        // No weight conversion declared; litres pack as labeled kg
        let r = recipe(
            "litres",
            vec![UnitConversion {
                unit: "bowl".to_string(),
                factor: 0.2,
            }],
        );
        let packed = plan_packing(&r, 5.0);
        assert_eq!(packed.unit, "kg (assumed)");
        assert!((packed.quantity - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_fallback_to_yield_unit() {
        let r = recipe("pieces", vec![]);
        let packed = plan_packing(&r, 40.0);
        assert_eq!(packed.unit, "pieces");
        assert!((packed.quantity - 40.0).abs() < EPSILON);
    }
}
