//! # Stellar Game Server
//!
//! Request-driven service around the planet economy engine.
//!
//! There is no game loop: every request loads the planet it targets,
//! brings it up to the current instant, applies the change and saves it
//! back. Requests for different planets run in parallel; requests for the
//! same planet (or the same player's research) are serialized.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stellar_core::catalog::Catalog;
use stellar_core::config::EngineConfig;
use stellar_core::engine::Engine;
use stellar_core::error::GameError;
use stellar_core::planet::DEFAULT_MAX_TEMPERATURE;
use stellar_core::resources::Resources;
use thiserror::Error;

pub mod protocol;
pub mod service;
pub mod store;

/// Errors that can occur while loading the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse RON file.
    #[error("Failed to parse RON file '{path}': {source}")]
    ParseError {
        /// Path to the file.
        path: String,
        /// Underlying parse error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// The catalog or engine settings were rejected.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Resources a new planet starts with, in whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingResources {
    /// Metal.
    pub metal: u32,
    /// Crystal.
    pub crystal: u32,
    /// Deuterium.
    pub deuterium: u32,
}

impl Default for StartingResources {
    fn default() -> Self {
        Self {
            metal: 500,
            crystal: 500,
            deuterium: 0,
        }
    }
}

impl From<StartingResources> for Resources {
    fn from(value: StartingResources) -> Self {
        Resources::new(
            i64::from(value.metal),
            i64::from(value.crystal),
            i64::from(value.deuterium),
            0,
        )
    }
}

/// Server configuration.
///
/// # Example RON
///
/// ```ron
/// ServerConfig(
///     engine: EngineConfig(economy_speed: 2),
///     starting_resources: StartingResources(metal: 1000, crystal: 1000),
///     catalog_path: Some("data/catalog.ron"),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Engine tuning.
    pub engine: EngineConfig,
    /// Stock of newly created planets.
    pub starting_resources: StartingResources,
    /// Maximum temperature of newly created planets.
    pub starting_temperature: i32,
    /// Catalog file to load instead of the embedded one.
    pub catalog_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            starting_resources: StartingResources::default(),
            starting_temperature: DEFAULT_MAX_TEMPERATURE,
            catalog_path: None,
        }
    }
}

impl ServerConfig {
    /// Parse a configuration from RON text.
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        ron::from_str(source).map_err(|source| ConfigError::ParseError {
            path: "<inline>".to_string(),
            source,
        })
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read_file(path)?;
        ron::from_str(&text).map_err(|source| ConfigError::ParseError {
            path: path.display().to_string(),
            source,
        })
    }

    /// Build the engine: catalog from `catalog_path` or the embedded one,
    /// validated engine settings.
    pub fn build_engine(&self) -> Result<Engine, ConfigError> {
        let catalog = match &self.catalog_path {
            Some(path) => {
                let text = read_file(path)?;
                Catalog::from_ron_named(&text, &path.display().to_string())?
            }
            None => Catalog::standard()?,
        };
        tracing::info!(
            objects = catalog.len(),
            economy_speed = self.engine.economy_speed,
            "engine ready"
        );
        Ok(Engine::new(catalog, self.engine)?)
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.display().to_string(),
        source,
    })
}
