//! Platter expansion
//!
//! Resolves a platter order into the direct-recipe lines it implies.
//! Pure multiplication: unit conversion is deferred to aggregation,
//! because the component recipe owns the conversion table.

use std::collections::BTreeMap;

use super::snapshot::PlatterSpec;

/// A synthetic recipe line produced by expanding a platter order
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedLine {
    pub recipe_id: i64,
    pub location_id: i64,
    /// Quantity in the component's declared unit
    pub quantity: f64,
    pub unit: String,
}

/// Expand a platter order into its component recipe lines
///
/// One line per (component, location) pair with portions > 0. Negative
/// portion counts are clamped to zero before multiplying.
pub fn expand_platter(
    platter: &PlatterSpec,
    portions_by_location: &BTreeMap<i64, f64>,
) -> Vec<ExpandedLine> {
    let mut lines = Vec::new();

    for component in &platter.recipes {
        for (&location_id, &portions) in portions_by_location {
            let portions = portions.max(0.0);
            if portions <= 0.0 {
                continue;
            }

            lines.push(ExpandedLine {
                recipe_id: component.recipe_id,
                location_id,
                quantity: component.quantity * portions,
                unit: component.unit.clone(),
            });
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::snapshot::PlatterComponent;

    fn mezze_platter() -> PlatterSpec {
        PlatterSpec {
            id: 10,
            name: "Mezze".to_string(),
            recipes: vec![
                PlatterComponent {
                    recipe_id: 1,
                    quantity: 0.5,
                    unit: "bowl".to_string(),
                },
                PlatterComponent {
                    recipe_id: 2,
                    quantity: 3.0,
                    unit: "pieces".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_expand_multiplies_per_location() {
        let platter = mezze_platter();
        let mut portions = BTreeMap::new();
        portions.insert(100, 4.0);
        portions.insert(200, 2.0);

        let lines = expand_platter(&platter, &portions);
        assert_eq!(lines.len(), 4);

        let soup_at_100 = lines
            .iter()
            .find(|l| l.recipe_id == 1 && l.location_id == 100)
            .unwrap();
        assert!((soup_at_100.quantity - 2.0).abs() < 1e-9);
        assert_eq!(soup_at_100.unit, "bowl");

        let pieces_at_200 = lines
            .iter()
            .find(|l| l.recipe_id == 2 && l.location_id == 200)
            .unwrap();
        assert!((pieces_at_200.quantity - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_expand_skips_zero_portions() {
        let platter = mezze_platter();
        let mut portions = BTreeMap::new();
        portions.insert(100, 0.0);
        portions.insert(200, 1.0);

        let lines = expand_platter(&platter, &portions);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.location_id == 200));
    }

    #[test]
    fn test_expand_clamps_negative_portions() {
        let platter = mezze_platter();
        let mut portions = BTreeMap::new();
        portions.insert(100, -3.0);

        let lines = expand_platter(&platter, &portions);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_expand_empty_platter() {
        let platter = PlatterSpec {
            id: 11,
            name: "Empty".to_string(),
            recipes: vec![],
        };
        let mut portions = BTreeMap::new();
        portions.insert(100, 5.0);

        assert!(expand_platter(&platter, &portions).is_empty());
    }
}
