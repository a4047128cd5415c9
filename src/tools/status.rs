//! KPM Status Tool
//!
//! Provides runtime status information about the KPM service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use crate::build_info::BuildInfo;

/// Ordering workflow instructions for AI assistants
pub const ORDERING_INSTRUCTIONS: &str = r#"
# KPM Ordering Instructions

This guide explains how to build a production order and get its report
using the Kitchen Production Manager (KPM) tools.

## Overview

To produce a report, you need:
1. **Recipes** - What the kitchen produces, with a batch yield (e.g., 5 litres)
2. **Raw Materials** (optional) - Purchasable ingredients with a fixed unit
3. **Platters** (optional) - Bundles of recipe quantities ordered as portions
4. **Locations** - Delivery sites the order fans out to
5. **An Order** - Lines per recipe/platter per location

## Key Concepts

### Yield Units and Ordering Units
- Every recipe has a **yield unit** (how the kitchen measures output: litres, kg, pieces)
- Order lines use the recipe's **default ordering unit** (how customers ask: bowls, portions)
- A **conversion** declares how they relate: 1 bowl = 0.2 litres means
  `set_recipe_conversion(recipe_id, unit: "bowl", factor: 0.2)`
- The factor is always "one of this unit equals this many yield units"
- Never declare a conversion for the yield unit itself; it converts 1:1 automatically
- kg and litres convert to each other 1:1 without a declaration (water density assumption)

### What Happens Without a Conversion
If an order line uses a unit the recipe cannot convert, the line is NOT silently
dropped or guessed: the recipe's total is marked incomplete and the report carries
a warning. Declare the conversion and rerun the report.

### Raw Material Formulas
- A formula line is the amount of a raw material per **one full batch**
  (the yield_quantity), in the raw material's own unit
- `set_recipe_raw_material(recipe_id, raw_material_id, quantity: 2.0)` with a
  5-litre yield means 2 kg of tomato per 5 litres of soup
- Raw material units are never converted; totals sum only across matching materials

### Locations
- Persistent locations (no order_id) appear on every order
- Ad-hoc locations (created with an order_id) exist for one order and are
  deleted with it

## Step-by-Step Workflow

### Step 1: Set up recipes

```
create_recipe(name: "Tomato Soup", yield_quantity: 5, yield_unit: "litres",
              default_ordering_unit: "bowl")
set_recipe_conversion(recipe_id: 1, unit: "bowl", factor: 0.2)
```

### Step 2: Attach raw materials

```
create_raw_material(name: "Tomato", unit: "kg")
set_recipe_raw_material(recipe_id: 1, raw_material_id: 1, quantity: 2.0)
```

### Step 3: Optionally define platters

```
create_platter(name: "Lunch Platter")
set_platter_recipe(platter_id: 1, recipe_id: 1, quantity: 2, unit: "bowl")
```

### Step 4: Create the order and its lines

```
create_order(order_date: "2026-08-24", session: "lunch")
set_order_recipe_line(order_id: 1, recipe_id: 1, location_id: 1, quantity: 10)
set_order_platter_line(order_id: 1, platter_id: 1, location_id: 2, portions: 5)
```

Setting a line again for the same (recipe, location) replaces the quantity.

### Step 5: Get the report

```
production_report(order_id: 1)
```

Returns per recipe: production total in yield units, packing quantities per
location and overall, plus aggregated raw materials. Read the `warnings`
array; it lists incomplete totals, packing approximations, and skipped
references to deleted rows.

## Common Mistakes to Avoid

1. Declaring a conversion for the yield unit itself (rejected)
2. Forgetting the conversion for the default ordering unit (total goes incomplete)
3. Entering formula quantities per portion instead of per batch
4. Reusing an ad-hoc location on a different order (rejected)

## Notes

- Dates use ISO format: YYYY-MM-DD
- Deleting a recipe is blocked while a platter uses it
- Deleting a raw material is blocked while a recipe formula uses it
- Deleting a location or platter leaves order lines in place; reports skip them
- "kg (assumed)" in packing output marks the 1 kg per litre approximation
"#;

/// Runtime status of the KPM service
#[derive(Debug, Clone, Serialize)]
pub struct KpmStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> KpmStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        KpmStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: std::process::id(),
        }
    }
}
