//! Data structures for catalog configuration.
//!
//! This module contains pure data structures that define buildings,
//! research, ships and defense. All structs are designed to be
//! deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by callers; the standard catalog is embedded.

mod object_data;

pub use object_data::{
    CatalogData, Category, CombatStats, CostData, ObjectData, ObjectEffect, RequirementData,
};
