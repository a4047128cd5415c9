//! KPM MCP Server Implementation
//!
//! Implements the MCP server with all KPM tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{
    LocationCreate, OrderCreate, OrderUpdate, PlatterCreate, PlatterRecipeSet, PlatterUpdate,
    RawMaterialCreate, RawMaterialUpdate, RecipeConversionSet, RecipeCreate, RecipeRawMaterialSet,
    RecipeUpdate,
};
use crate::tools::orders;
use crate::tools::platters;
use crate::tools::production;
use crate::tools::raw_materials;
use crate::tools::recipes;
use crate::tools::status::StatusTracker;

/// KPM MCP Service
#[derive(Clone)]
pub struct KpmService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<KpmService>,
}

impl KpmService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    /// Name of the recipe
    pub name: String,
    /// Output of one batch, in the yield unit (default 1.0)
    #[serde(default = "default_yield")]
    pub yield_quantity: f64,
    /// Unit the kitchen measures output in (e.g., "litres", "kg", "pieces")
    pub yield_unit: String,
    /// Unit used on order lines (defaults to the yield unit)
    pub default_ordering_unit: Option<String>,
    /// Optional notes
    pub notes: Option<String>,
}

fn default_yield() -> f64 { 1.0 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetRecipeParams {
    /// Recipe ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Search query for recipe name (optional)
    pub query: Option<String>,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Offset for pagination (default 0)
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeParams {
    /// Recipe ID to update
    pub id: i64,
    /// New name (optional)
    pub name: Option<String>,
    /// New batch yield quantity (optional)
    pub yield_quantity: Option<f64>,
    /// New yield unit (optional)
    pub yield_unit: Option<String>,
    /// New default ordering unit (optional)
    pub default_ordering_unit: Option<String>,
    /// New notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteRecipeParams {
    /// Recipe ID to delete
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetRecipeConversionParams {
    /// Recipe ID
    pub recipe_id: i64,
    /// Alternate unit (never the yield unit itself)
    pub unit: String,
    /// How many yield units one `unit` equals (must be > 0)
    pub factor: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveRecipeConversionParams {
    /// Recipe ID
    pub recipe_id: i64,
    /// Unit of the conversion to remove
    pub unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetRecipeRawMaterialParams {
    /// Recipe ID
    pub recipe_id: i64,
    /// Raw material ID
    pub raw_material_id: i64,
    /// Amount per full batch, in the raw material's unit
    pub quantity: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveRecipeRawMaterialParams {
    /// Recipe ID
    pub recipe_id: i64,
    /// Raw material ID
    pub raw_material_id: i64,
}

// ============================================================================
// Raw Material Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRawMaterialParams {
    /// Name of the raw material
    pub name: String,
    /// Canonical unit it is purchased and counted in (e.g., "kg")
    pub unit: String,
    /// Optional notes
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetRawMaterialParams {
    /// Raw material ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRawMaterialsParams {
    /// Search query for material name (optional)
    pub query: Option<String>,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Offset for pagination (default 0)
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRawMaterialParams {
    /// Raw material ID to update
    pub id: i64,
    /// New name (optional)
    pub name: Option<String>,
    /// New unit (optional)
    pub unit: Option<String>,
    /// New notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteRawMaterialParams {
    /// Raw material ID to delete
    pub id: i64,
}

// ============================================================================
// Platter Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreatePlatterParams {
    /// Name of the platter
    pub name: String,
    /// Optional notes
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetPlatterParams {
    /// Platter ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListPlattersParams {
    /// Search query for platter name (optional)
    pub query: Option<String>,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Offset for pagination (default 0)
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdatePlatterParams {
    /// Platter ID to update
    pub id: i64,
    /// New name (optional)
    pub name: Option<String>,
    /// New notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeletePlatterParams {
    /// Platter ID to delete
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetPlatterRecipeParams {
    /// Platter ID
    pub platter_id: i64,
    /// Recipe ID to include in each portion
    pub recipe_id: i64,
    /// Amount of the recipe per portion
    pub quantity: f64,
    /// Unit of the amount (may differ from the recipe's yield unit)
    pub unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemovePlatterRecipeParams {
    /// Platter ID
    pub platter_id: i64,
    /// Recipe ID to remove from the platter
    pub recipe_id: i64,
}

// ============================================================================
// Location Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddLocationParams {
    /// Name of the delivery location
    pub name: String,
    /// Scope the location to one order (omit for a persistent location)
    pub order_id: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListLocationsParams {
    /// Include ad-hoc locations active for this order (omit for persistent only)
    pub order_id: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteLocationParams {
    /// Location ID to delete
    pub id: i64,
}

// ============================================================================
// Order Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateOrderParams {
    /// Date in ISO format: YYYY-MM-DD
    pub order_date: String,
    /// Kitchen session (e.g., "lunch", "dinner")
    #[serde(default)]
    pub session: String,
    /// Optional notes
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetOrderParams {
    /// Order ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListOrdersParams {
    /// Start date (inclusive) - optional
    pub start_date: Option<String>,
    /// End date (inclusive) - optional
    pub end_date: Option<String>,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Offset for pagination (default 0)
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateOrderParams {
    /// Order ID to update
    pub id: i64,
    /// New date (optional)
    pub order_date: Option<String>,
    /// New session (optional)
    pub session: Option<String>,
    /// New notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteOrderParams {
    /// Order ID to delete
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetOrderRecipeLineParams {
    /// Order ID
    pub order_id: i64,
    /// Recipe ID
    pub recipe_id: i64,
    /// Location ID
    pub location_id: i64,
    /// Quantity in the recipe's default ordering unit
    pub quantity: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveOrderRecipeLineParams {
    /// Order ID
    pub order_id: i64,
    /// Recipe ID
    pub recipe_id: i64,
    /// Location ID
    pub location_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetOrderPlatterLineParams {
    /// Order ID
    pub order_id: i64,
    /// Platter ID
    pub platter_id: i64,
    /// Location ID
    pub location_id: i64,
    /// Number of platter portions
    pub portions: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveOrderPlatterLineParams {
    /// Order ID
    pub order_id: i64,
    /// Platter ID
    pub platter_id: i64,
    /// Location ID
    pub location_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProductionReportParams {
    /// Order ID to compute the report for
    pub order_id: i64,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl KpmService {
    // --- Status ---

    #[tool(description = "Get the current status of the KPM service including build info, database status, and process information")]
    async fn kpm_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get step-by-step instructions for building production orders and reading reports. Call this when starting an ordering session or when unsure how to use the KPM tools.")]
    fn ordering_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::ORDERING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(ORDERING_INSTRUCTIONS)]))
    }

    // --- Recipes ---

    #[tool(description = "Create a new recipe with its batch yield and ordering unit")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            yield_quantity: p.yield_quantity,
            yield_unit: p.yield_unit,
            default_ordering_unit: p.default_ordering_unit,
            notes: p.notes,
        };
        let result = recipes::create_recipe(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get full details for a recipe including its conversions and raw material formula")]
    fn get_recipe(&self, Parameters(p): Parameters<GetRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(recipe) => serde_json::to_string_pretty(&recipe),
            None => Ok(format!(r#"{{"error": "Recipe not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List recipes with optional name search and pagination")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(&self.database, p.query.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a recipe's name, yield, ordering unit, or notes")]
    fn update_recipe(&self, Parameters(p): Parameters<UpdateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeUpdate {
            name: p.name,
            yield_quantity: p.yield_quantity,
            yield_unit: p.yield_unit,
            default_ordering_unit: p.default_ordering_unit,
            notes: p.notes,
        };
        let result = recipes::update_recipe(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(recipe) => serde_json::to_string_pretty(&recipe),
            None => Ok(format!(r#"{{"error": "Recipe not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a recipe. Blocked while the recipe is a component of any platter.")]
    fn delete_recipe(&self, Parameters(p): Parameters<DeleteRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Ok(success) => serde_json::to_string_pretty(&success),
            Err(blocked) => serde_json::to_string_pretty(&blocked),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Declare or update a unit conversion on a recipe: 1 unit = factor yield units")]
    fn set_recipe_conversion(&self, Parameters(p): Parameters<SetRecipeConversionParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeConversionSet {
            recipe_id: p.recipe_id,
            unit: p.unit,
            factor: p.factor,
        };
        let result = recipes::set_recipe_conversion(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove a unit conversion from a recipe")]
    fn remove_recipe_conversion(&self, Parameters(p): Parameters<RemoveRecipeConversionParams>) -> Result<CallToolResult, McpError> {
        let removed = recipes::remove_recipe_conversion(&self.database, p.recipe_id, &p.unit)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&serde_json::json!({ "removed": removed }))
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Set the amount of a raw material per batch on a recipe's formula")]
    fn set_recipe_raw_material(&self, Parameters(p): Parameters<SetRecipeRawMaterialParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeRawMaterialSet {
            recipe_id: p.recipe_id,
            raw_material_id: p.raw_material_id,
            quantity: p.quantity,
        };
        let result = recipes::set_recipe_raw_material(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove a raw material from a recipe's formula")]
    fn remove_recipe_raw_material(&self, Parameters(p): Parameters<RemoveRecipeRawMaterialParams>) -> Result<CallToolResult, McpError> {
        let removed = recipes::remove_recipe_raw_material(&self.database, p.recipe_id, p.raw_material_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&serde_json::json!({ "removed": removed }))
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Raw Materials ---

    #[tool(description = "Create a new raw material with its canonical unit")]
    fn create_raw_material(&self, Parameters(p): Parameters<CreateRawMaterialParams>) -> Result<CallToolResult, McpError> {
        let data = RawMaterialCreate {
            name: p.name,
            unit: p.unit,
            notes: p.notes,
        };
        let result = raw_materials::create_raw_material(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get details for a raw material")]
    fn get_raw_material(&self, Parameters(p): Parameters<GetRawMaterialParams>) -> Result<CallToolResult, McpError> {
        let result = raw_materials::get_raw_material(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(material) => serde_json::to_string_pretty(&material),
            None => Ok(format!(r#"{{"error": "Raw material not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List raw materials with optional name search and pagination")]
    fn list_raw_materials(&self, Parameters(p): Parameters<ListRawMaterialsParams>) -> Result<CallToolResult, McpError> {
        let result = raw_materials::list_raw_materials(&self.database, p.query.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a raw material's name, unit, or notes")]
    fn update_raw_material(&self, Parameters(p): Parameters<UpdateRawMaterialParams>) -> Result<CallToolResult, McpError> {
        let data = RawMaterialUpdate {
            name: p.name,
            unit: p.unit,
            notes: p.notes,
        };
        let result = raw_materials::update_raw_material(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(material) => serde_json::to_string_pretty(&material),
            None => Ok(format!(r#"{{"error": "Raw material not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a raw material. Blocked while any recipe formula uses it.")]
    fn delete_raw_material(&self, Parameters(p): Parameters<DeleteRawMaterialParams>) -> Result<CallToolResult, McpError> {
        let result = raw_materials::delete_raw_material(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Ok(success) => serde_json::to_string_pretty(&success),
            Err(blocked) => serde_json::to_string_pretty(&blocked),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Platters ---

    #[tool(description = "Create a new platter")]
    fn create_platter(&self, Parameters(p): Parameters<CreatePlatterParams>) -> Result<CallToolResult, McpError> {
        let data = PlatterCreate {
            name: p.name,
            notes: p.notes,
        };
        let result = platters::create_platter(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a platter with its component recipes")]
    fn get_platter(&self, Parameters(p): Parameters<GetPlatterParams>) -> Result<CallToolResult, McpError> {
        let result = platters::get_platter(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(platter) => serde_json::to_string_pretty(&platter),
            None => Ok(format!(r#"{{"error": "Platter not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List platters with optional name search and pagination")]
    fn list_platters(&self, Parameters(p): Parameters<ListPlattersParams>) -> Result<CallToolResult, McpError> {
        let result = platters::list_platters(&self.database, p.query.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a platter's name or notes")]
    fn update_platter(&self, Parameters(p): Parameters<UpdatePlatterParams>) -> Result<CallToolResult, McpError> {
        let data = PlatterUpdate {
            name: p.name,
            notes: p.notes,
        };
        let result = platters::update_platter(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(platter) => serde_json::to_string_pretty(&platter),
            None => Ok(format!(r#"{{"error": "Platter not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a platter. Order lines referencing it are skipped by later reports.")]
    fn delete_platter(&self, Parameters(p): Parameters<DeletePlatterParams>) -> Result<CallToolResult, McpError> {
        let result = platters::delete_platter(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Set a component recipe on a platter: amount per portion in a declared unit")]
    fn set_platter_recipe(&self, Parameters(p): Parameters<SetPlatterRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = PlatterRecipeSet {
            platter_id: p.platter_id,
            recipe_id: p.recipe_id,
            quantity: p.quantity,
            unit: p.unit,
        };
        let result = platters::set_platter_recipe(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove a component recipe from a platter")]
    fn remove_platter_recipe(&self, Parameters(p): Parameters<RemovePlatterRecipeParams>) -> Result<CallToolResult, McpError> {
        let removed = platters::remove_platter_recipe(&self.database, p.platter_id, p.recipe_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&serde_json::json!({ "removed": removed }))
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Locations ---

    #[tool(description = "Add a delivery location, either persistent or scoped to one order")]
    fn add_location(&self, Parameters(p): Parameters<AddLocationParams>) -> Result<CallToolResult, McpError> {
        let data = LocationCreate {
            name: p.name,
            order_id: p.order_id,
        };
        let result = orders::add_location(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List persistent locations, or all locations active for an order")]
    fn list_locations(&self, Parameters(p): Parameters<ListLocationsParams>) -> Result<CallToolResult, McpError> {
        let result = orders::list_locations(&self.database, p.order_id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a location. Order lines referencing it are skipped by later reports.")]
    fn delete_location(&self, Parameters(p): Parameters<DeleteLocationParams>) -> Result<CallToolResult, McpError> {
        let deleted = orders::delete_location(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&serde_json::json!({ "deleted": deleted }))
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Orders ---

    #[tool(description = "Create a new production order for a date and session")]
    fn create_order(&self, Parameters(p): Parameters<CreateOrderParams>) -> Result<CallToolResult, McpError> {
        let data = OrderCreate {
            order_date: p.order_date,
            session: p.session,
            notes: p.notes,
        };
        let result = orders::create_order(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get an order with its lines and active locations")]
    fn get_order(&self, Parameters(p): Parameters<GetOrderParams>) -> Result<CallToolResult, McpError> {
        let result = orders::get_order(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(order) => serde_json::to_string_pretty(&order),
            None => Ok(format!(r#"{{"error": "Order not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List orders with optional date range and pagination")]
    fn list_orders(&self, Parameters(p): Parameters<ListOrdersParams>) -> Result<CallToolResult, McpError> {
        let result = orders::list_orders(&self.database, p.start_date.as_deref(), p.end_date.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update an order's date, session, or notes")]
    fn update_order(&self, Parameters(p): Parameters<UpdateOrderParams>) -> Result<CallToolResult, McpError> {
        let data = OrderUpdate {
            order_date: p.order_date,
            session: p.session,
            notes: p.notes,
        };
        let result = orders::update_order(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(order) => serde_json::to_string_pretty(&order),
            None => Ok(format!(r#"{{"error": "Order not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete an order along with its lines and ad-hoc locations")]
    fn delete_order(&self, Parameters(p): Parameters<DeleteOrderParams>) -> Result<CallToolResult, McpError> {
        let result = orders::delete_order(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Set a direct recipe requirement on an order for one location, in the recipe's default ordering unit. Setting the same (recipe, location) again replaces the quantity.")]
    fn set_order_recipe_line(&self, Parameters(p): Parameters<SetOrderRecipeLineParams>) -> Result<CallToolResult, McpError> {
        let result = orders::set_order_recipe_line(&self.database, p.order_id, p.recipe_id, p.location_id, p.quantity)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove a direct recipe requirement from an order")]
    fn remove_order_recipe_line(&self, Parameters(p): Parameters<RemoveOrderRecipeLineParams>) -> Result<CallToolResult, McpError> {
        let removed = orders::remove_order_recipe_line(&self.database, p.order_id, p.recipe_id, p.location_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&serde_json::json!({ "removed": removed }))
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Set a whole-platter requirement on an order for one location. Setting the same (platter, location) again replaces the portions.")]
    fn set_order_platter_line(&self, Parameters(p): Parameters<SetOrderPlatterLineParams>) -> Result<CallToolResult, McpError> {
        let result = orders::set_order_platter_line(&self.database, p.order_id, p.platter_id, p.location_id, p.portions)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove a platter requirement from an order")]
    fn remove_order_platter_line(&self, Parameters(p): Parameters<RemoveOrderPlatterLineParams>) -> Result<CallToolResult, McpError> {
        let removed = orders::remove_order_platter_line(&self.database, p.order_id, p.platter_id, p.location_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&serde_json::json!({ "removed": removed }))
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Reports ---

    #[tool(description = "Compute the full production report for an order: production totals per recipe, packing quantities per location and overall, and aggregated raw material requirements. Check the warnings array for incomplete totals and skipped references.")]
    fn production_report(&self, Parameters(p): Parameters<ProductionReportParams>) -> Result<CallToolResult, McpError> {
        let result = production::production_report(&self.database, p.order_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for KpmService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "kpm".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Kitchen Production Manager".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Kitchen Production Manager (KPM) - Production order aggregation and unit conversion. \
                 IMPORTANT: Call ordering_instructions when starting an ordering session. \
                 Recipes: create/get/list/update/delete_recipe, set/remove_recipe_conversion, \
                 set/remove_recipe_raw_material. Conversions declare 1 unit = factor yield units. \
                 Raw materials: create/get/list/update/delete_raw_material. \
                 Platters: create/get/list/update/delete_platter, set/remove_platter_recipe. \
                 Locations: add/list/delete_location (persistent, or scoped to one order via order_id). \
                 Orders: create/get/list/update/delete_order, set/remove_order_recipe_line, \
                 set/remove_order_platter_line. Lines are one per (recipe-or-platter, location); setting again replaces. \
                 Reports: production_report(order_id) returns production totals, packing plan, and \
                 raw material aggregates. Always surface its warnings array to the user."
                    .into(),
            ),
        }
    }
}
