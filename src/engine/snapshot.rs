//! Engine input snapshot
//!
//! Immutable view of an order and the reference collections active when
//! the report is computed. The tool layer assembles this from the
//! database; the engine only reads it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A recipe as the engine sees it: yield, units, conversions, formula
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSpec {
    pub id: i64,
    pub name: String,
    pub yield_quantity: f64,
    pub yield_unit: String,
    pub default_ordering_unit: String,
    pub conversions: Vec<UnitConversion>,
    pub raw_materials: Vec<FormulaLine>,
}

/// One declared conversion: 1 `unit` = `factor` yield units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConversion {
    pub unit: String,
    pub factor: f64,
}

/// One formula line: amount of a raw material per full batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaLine {
    pub raw_material_id: i64,
    pub quantity: f64,
}

/// A platter and its component recipes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatterSpec {
    pub id: i64,
    pub name: String,
    pub recipes: Vec<PlatterComponent>,
}

/// One component of a platter portion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatterComponent {
    pub recipe_id: i64,
    pub quantity: f64,
    pub unit: String,
}

/// A raw material with its canonical unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterialSpec {
    pub id: i64,
    pub name: String,
    pub unit: String,
}

/// A delivery location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSpec {
    pub id: i64,
    pub name: String,
}

/// The order being computed: requirements keyed by id maps
///
/// Direct requirements are quantities in each recipe's default ordering
/// unit; platter requirements are whole-portion counts. BTreeMap keys
/// give deterministic iteration so repeated runs produce identical output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// recipe id -> location id -> ordered quantity
    pub recipe_requirements: BTreeMap<i64, BTreeMap<i64, f64>>,
    /// platter id -> location id -> ordered portions
    pub platter_requirements: BTreeMap<i64, BTreeMap<i64, f64>>,
}

/// Everything the engine needs for one computation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub order: OrderSnapshot,
    pub recipes: BTreeMap<i64, RecipeSpec>,
    pub platters: BTreeMap<i64, PlatterSpec>,
    pub raw_materials: BTreeMap<i64, RawMaterialSpec>,
    pub locations: BTreeMap<i64, LocationSpec>,
}
