//! Unit conversion
//!
//! Expresses quantities in a recipe's yield unit through the recipe's own
//! conversion table, plus one narrow cross-unit heuristic for kg/litres.

use super::snapshot::RecipeSpec;

/// Result of a conversion attempt
///
/// A tagged result rather than a bare number, so calling code cannot
/// mistake a failed conversion for a valid zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    /// Quantity expressed in the recipe's yield unit
    Converted(f64),
    /// No path from the source unit to the yield unit
    Unconvertible,
}

impl Conversion {
    /// Numeric value, treating an unconvertible result as zero
    pub fn value_or_zero(&self) -> f64 {
        match self {
            Conversion::Converted(v) => *v,
            Conversion::Unconvertible => 0.0,
        }
    }

    /// Whether the conversion succeeded
    pub fn is_converted(&self) -> bool {
        matches!(self, Conversion::Converted(_))
    }
}

/// Normalize a unit string for comparison
fn normalize(unit: &str) -> String {
    unit.trim().to_lowercase()
}

/// Case-insensitive, trimmed unit equality
pub fn units_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Whether two units form the kg/litres pair, in either order
///
/// Treats 1 kg as 1 litre when no explicit conversion is declared. This
/// assumes water density and is only applied as a last resort.
fn is_kg_litres_pair(a: &str, b: &str) -> bool {
    let (a, b) = (normalize(a), normalize(b));
    (a == "kg" && b == "litres") || (a == "litres" && b == "kg")
}

/// Convert a quantity from `from_unit` into the recipe's yield unit
///
/// Resolution order: identity on the yield unit, then the recipe's
/// conversion table, then the kg/litres heuristic. Anything else is
/// `Unconvertible` and must surface as "N/A", never as a silent zero.
pub fn convert_to_yield_unit(recipe: &RecipeSpec, quantity: f64, from_unit: &str) -> Conversion {
    if units_match(from_unit, &recipe.yield_unit) {
        return Conversion::Converted(quantity);
    }

    if let Some(conversion) = recipe
        .conversions
        .iter()
        .find(|c| units_match(&c.unit, from_unit))
    {
        if conversion.factor > 0.0 {
            return Conversion::Converted(quantity * conversion.factor);
        }
    }

    if is_kg_litres_pair(&recipe.yield_unit, from_unit) {
        return Conversion::Converted(quantity);
    }

    Conversion::Unconvertible
}

/// Express the recipe's entire yield in `target_unit`
///
/// The inverse direction of [`convert_to_yield_unit`]: a conversion table
/// entry divides instead of multiplies. Returns None when no path exists.
pub fn yield_equivalent(recipe: &RecipeSpec, target_unit: &str) -> Option<f64> {
    if units_match(target_unit, &recipe.yield_unit) {
        return Some(recipe.yield_quantity);
    }

    if let Some(conversion) = recipe
        .conversions
        .iter()
        .find(|c| units_match(&c.unit, target_unit))
    {
        if conversion.factor > 0.0 {
            return Some(recipe.yield_quantity / conversion.factor);
        }
    }

    if is_kg_litres_pair(&recipe.yield_unit, target_unit) {
        return Some(recipe.yield_quantity);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::snapshot::UnitConversion;

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

    #[test]
    fn test_identity_conversion() {
        let recipe = soup_recipe();
        assert_eq!(
            convert_to_yield_unit(&recipe, 7.5, "litres"),
            Conversion::Converted(7.5)
        );
        // Case-insensitive and trimmed
        assert_eq!(
            convert_to_yield_unit(&recipe, 3.0, "  Litres "),
            Conversion::Converted(3.0)
        );
    }

    #[test]
    fn test_table_conversion() {
        let recipe = soup_recipe();
        // 10 bowls at 0.2 litres each
        let result = convert_to_yield_unit(&recipe, 10.0, "bowl");
        match result {
            Conversion::Converted(v) => assert!((v - 2.0).abs() < 1e-9),
            Conversion::Unconvertible => panic!("expected conversion"),
        }
    }

    #[test]
    fn test_table_conversion_case_insensitive() {
        let recipe = soup_recipe();
        let result = convert_to_yield_unit(&recipe, 5.0, "BOWL");
        match result {
            Conversion::Converted(v) => assert!((v - 1.0).abs() < 1e-9),
            Conversion::Unconvertible => panic!("expected conversion"),
        }
    }

    #[test]
    fn test_kg_litres_heuristic() {
        let recipe = soup_recipe();
        // yield unit is litres, ordering in kg with no declared conversion
        assert_eq!(
            convert_to_yield_unit(&recipe, 4.0, "kg"),
            Conversion::Converted(4.0)
        );

        let mut kg_recipe = soup_recipe();
        kg_recipe.yield_unit = "kg".to_string();
        kg_recipe.conversions.clear();
        assert_eq!(
            convert_to_yield_unit(&kg_recipe, 2.5, "litres"),
            Conversion::Converted(2.5)
        );
    }

    #[test]
    fn test_unconvertible_unit() {
        let recipe = soup_recipe();
        assert_eq!(
            convert_to_yield_unit(&recipe, 5.0, "scoop"),
            Conversion::Unconvertible
        );
    }

    #[test]
    fn test_nonpositive_factor_is_unconvertible() {
        let mut recipe = soup_recipe();
        recipe.conversions[0].factor = 0.0;
        assert_eq!(
            convert_to_yield_unit(&recipe, 10.0, "bowl"),
            Conversion::Unconvertible
        );
    }

    #[test]
    fn test_yield_equivalent_identity() {
        let recipe = soup_recipe();
        assert_eq!(yield_equivalent(&recipe, "litres"), Some(5.0));
    }

    #[test]
    fn test_yield_equivalent_through_table() {
        let recipe = soup_recipe();
        // 5 litres at 0.2 litres per bowl = 25 bowls
        let bowls = yield_equivalent(&recipe, "bowl").unwrap();
        assert!((bowls - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_yield_equivalent_heuristic_and_missing() {
        let recipe = soup_recipe();
        assert_eq!(yield_equivalent(&recipe, "kg"), Some(5.0));
        assert_eq!(yield_equivalent(&recipe, "scoop"), None);
    }

    #[test]
    fn test_value_or_zero() {
        assert_eq!(Conversion::Converted(1.5).value_or_zero(), 1.5);
        assert_eq!(Conversion::Unconvertible.value_or_zero(), 0.0);
        assert!(!Conversion::Unconvertible.is_converted());
    }
}
