//! # Stellar Core
//!
//! Deterministic planet economy engine for a browser strategy game.
//!
//! This crate contains **only** deterministic logic:
//! - No IO (the standard catalog is embedded)
//! - No wall clock (every operation takes the current [`clock::Timestamp`])
//! - No floating-point math (uses fixed-point)
//!
//! State is advanced lazily: reading a planet at time `t` ticks its queues
//! and resource ledger up to `t`, so no background timer is needed.
//!
//! ## Crate Structure
//!
//! - [`resources`] / [`economy`] - Resource values, ledger and production formulas
//! - [`catalog`] / [`data`] - Object definitions loaded from RON
//! - [`production`] - Build queues and their state machine
//! - [`planet`] / [`research`] - Planet and player state
//! - [`engine`] - Validated mutations
//! - [`view`] - The read model
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod clock;
pub mod config;
pub mod data;
pub mod economy;
pub mod engine;
pub mod error;
pub mod math;
pub mod planet;
pub mod production;
pub mod research;
pub mod resources;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Catalog, ObjectDefinition, ObjectId, ObjectKind};
    pub use crate::clock::{Clock, ManualClock, SystemClock, Timestamp};
    pub use crate::config::{EngineConfig, QueueLimits};
    pub use crate::data::{Category, ObjectEffect};
    pub use crate::economy::{Ledger, ProductionProfile};
    pub use crate::engine::{Cancelled, Enqueued, Engine};
    pub use crate::error::{GameError, Result};
    pub use crate::math::Amount;
    pub use crate::planet::{Planet, PlanetId};
    pub use crate::production::{
        BuildQueue, BuildQueueItem, ItemStatus, ProductionEvent, QueueItemId, QueueKind,
    };
    pub use crate::research::{Player, PlayerId, PlayerResearch, ResearchChange};
    pub use crate::resources::{ResourceKind, Resources};
    pub use crate::view::{ObjectView, PlanetView, QueueItemView, QueueView};
}
