//! MCP tool implementations
//!
//! Business logic called by the MCP server tool handlers.

pub mod orders;
pub mod platters;
pub mod production;
pub mod raw_materials;
pub mod recipes;
pub mod status;
