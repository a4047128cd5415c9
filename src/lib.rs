//! Kitchen Production Manager (KPM) Library
//!
//! Core functionality for catering production planning.

pub mod build_info;
pub mod db;
pub mod engine;
pub mod mcp;
pub mod models;
pub mod tools;
