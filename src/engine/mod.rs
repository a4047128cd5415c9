//! Production computation engine
//!
//! Pure, synchronous functions that turn an order plus the loaded
//! reference collections into production totals, a packing plan, and
//! aggregated raw material requirements. Nothing in this module touches
//! the database; the tool layer assembles a [`Snapshot`] and both the
//! interactive report and any export path go through [`compute_report`].

pub mod convert;
pub mod packing;
pub mod platter;
pub mod production;
pub mod raw_materials;
pub mod report;
pub mod snapshot;

pub use convert::{convert_to_yield_unit, yield_equivalent, Conversion};
pub use packing::{plan_packing, PackedQuantity};
pub use platter::{expand_platter, ExpandedLine};
pub use production::{aggregate_production, ProductionTotals};
pub use raw_materials::{aggregate_raw_materials, AggregatedRawMaterials, RawMaterialTotal};
pub use report::{compute_report, ProductionReport, RecipePacking, RecipeProduction};
pub use snapshot::{
    FormulaLine, LocationSpec, OrderSnapshot, PlatterComponent, PlatterSpec, RawMaterialSpec,
    RecipeSpec, Snapshot, UnitConversion,
};
