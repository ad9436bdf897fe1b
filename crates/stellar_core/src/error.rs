//! Error types for the planet economy engine.

use thiserror::Error;

use crate::production::{QueueItemId, QueueKind};
use crate::resources::ResourceKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all engine errors.
///
/// Every mutating operation either succeeds completely or returns one of
/// these without having changed any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// No catalog entry with this machine name or id.
    #[error("Unknown object: {0}")]
    UnknownObject(String),

    /// A required building or research level is missing.
    #[error("Prerequisite not met for {object}: requires {requirement} level {level}")]
    PrerequisiteNotMet {
        /// Machine name of the object being built.
        object: String,
        /// Machine name of the missing requirement.
        requirement: String,
        /// Minimum level of the requirement.
        level: u32,
    },

    /// The cost exceeds the available stock.
    #[error("Insufficient resources: need {required} {resource}, have {available}")]
    InsufficientResources {
        /// Resource type.
        resource: ResourceKind,
        /// Amount required.
        required: i64,
        /// Amount available.
        available: i64,
    },

    /// The queue already holds as many items as it may.
    #[error("The {queue} queue is full ({limit} item(s) allowed)")]
    QueueFull {
        /// Which queue.
        queue: QueueKind,
        /// The configured cap.
        limit: usize,
    },

    /// Cancel target absent, already completed or already cancelled.
    #[error("Queue item not found: {0}")]
    ItemNotFound(QueueItemId),

    /// Level or amount outside what the catalog allows.
    #[error("Invalid level {level} for {object}")]
    InvalidLevel {
        /// Machine name of the object.
        object: String,
        /// The rejected level or amount.
        level: i64,
    },

    /// A facility cannot be upgraded while it is in use, or used while upgrading.
    #[error("Facility busy: {0}")]
    FacilityBusy(String),

    /// No planet with this id.
    #[error("Planet not found: {0}")]
    UnknownPlanet(u32),

    /// No player with this id.
    #[error("Player not found: {0}")]
    UnknownPlayer(u32),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or name) of the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Catalog data parsed but is inconsistent.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Engine configuration out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The persistence layer failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl GameError {
    /// Stable snake_case identifier, used as the error kind on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownObject(_) => "unknown_object",
            Self::PrerequisiteNotMet { .. } => "prerequisite_not_met",
            Self::InsufficientResources { .. } => "insufficient_resources",
            Self::QueueFull { .. } => "queue_full",
            Self::ItemNotFound(_) => "item_not_found",
            Self::InvalidLevel { .. } => "invalid_level",
            Self::FacilityBusy(_) => "facility_busy",
            Self::UnknownPlanet(_) => "unknown_planet",
            Self::UnknownPlayer(_) => "unknown_player",
            Self::DataParseError { .. } => "data_parse_error",
            Self::InvalidCatalog(_) => "invalid_catalog",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Storage(_) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            GameError::UnknownObject("death_ray".into()).to_string(),
            "Unknown object: death_ray"
        );
        assert_eq!(
            GameError::InsufficientResources {
                resource: ResourceKind::Metal,
                required: 60,
                available: 10,
            }
            .to_string(),
            "Insufficient resources: need 60 metal, have 10"
        );
        assert_eq!(
            GameError::QueueFull {
                queue: QueueKind::Research,
                limit: 1,
            }
            .to_string(),
            "The research queue is full (1 item(s) allowed)"
        );
        assert_eq!(
            GameError::ItemNotFound(QueueItemId(7)).to_string(),
            "Queue item not found: #7"
        );
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let errors = [
            GameError::UnknownObject(String::new()),
            GameError::PrerequisiteNotMet {
                object: String::new(),
                requirement: String::new(),
                level: 1,
            },
            GameError::InsufficientResources {
                resource: ResourceKind::Metal,
                required: 1,
                available: 0,
            },
            GameError::QueueFull {
                queue: QueueKind::Buildings,
                limit: 1,
            },
            GameError::ItemNotFound(QueueItemId(1)),
            GameError::InvalidLevel {
                object: String::new(),
                level: -1,
            },
        ];
        let mut kinds: Vec<_> = errors.iter().map(GameError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }
}
