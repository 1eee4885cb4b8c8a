//! Shared types, error model, and configuration for cloudgraph.
//!
//! This crate is the foundation depended on by all other cloudgraph crates.
//! It provides:
//! - [`CloudGraphError`], the unified error type
//! - The graph model ([`Entity`], [`Relationship`], schemas, key derivation)
//! - Run types ([`RunId`], [`StepRecord`])
//! - Configuration ([`AppConfig`], [`IntegrationConfig`], config loading)

pub mod config;
pub mod error;
pub mod graph;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AzureConfig, EndpointsConfig, IngestionConfig, InstanceConfig, IntegrationConfig,
    IntegrationInstance, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_credentials,
};
pub use error::{CloudGraphError, Result};
pub use graph::{
    Entity, EntitySchema, RawData, Relationship, RelationshipClass, RelationshipSchema,
    generate_entity_key, generate_relationship_key, generate_relationship_type,
};
pub use types::{RunId, RunRecord, StepRecord};
