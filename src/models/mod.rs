//! Data models
//!
//! Rust structs representing database entities.

mod location;
mod order;
mod order_line;
mod platter;
mod platter_recipe;
mod raw_material;
mod recipe;
mod recipe_conversion;
mod recipe_raw_material;

pub use location::{Location, LocationCreate};
pub use order::{Order, OrderCreate, OrderUpdate};
pub use order_line::{OrderPlatterLine, OrderRecipeLine};
pub use platter::{Platter, PlatterCreate, PlatterUpdate};
pub use platter_recipe::{PlatterRecipe, PlatterRecipeDetail, PlatterRecipeSet};
pub use raw_material::{RawMaterial, RawMaterialCreate, RawMaterialUpdate};
pub use recipe::{Recipe, RecipeCreate, RecipeUpdate};
pub use recipe_conversion::{RecipeConversion, RecipeConversionSet};
pub use recipe_raw_material::{
    RecipeRawMaterial, RecipeRawMaterialDetail, RecipeRawMaterialSet,
};
