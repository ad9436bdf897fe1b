//! Test fixtures and helpers.
//!
//! Pre-built engines, players and planets for consistent testing.

use stellar_core::catalog::{Catalog, ObjectId};
use stellar_core::clock::Timestamp;
use stellar_core::config::EngineConfig;
use stellar_core::engine::Engine;
use stellar_core::planet::{Planet, PlanetId};
use stellar_core::research::{Player, PlayerId};
use stellar_core::resources::Resources;

/// Instant every fixture starts at.
pub const START: Timestamp = Timestamp(1_700_000_000);

/// Engine with the standard catalog and default configuration.
///
/// # Panics
///
/// Panics if the embedded catalog fails to load.
#[must_use]
pub fn engine() -> Engine {
    Engine::standard().expect("standard catalog loads")
}

/// Engine with the standard catalog and `config`.
///
/// # Panics
///
/// Panics if the catalog fails to load or `config` is invalid.
#[must_use]
pub fn engine_with(config: EngineConfig) -> Engine {
    Engine::new(Catalog::standard().expect("standard catalog loads"), config)
        .expect("valid engine config")
}

/// Whole-unit resources without energy.
#[must_use]
pub fn resources(metal: i64, crystal: i64, deuterium: i64) -> Resources {
    Resources::new(metal, crystal, deuterium, 0)
}

/// A player with no research.
#[must_use]
pub fn player(id: u32) -> Player {
    Player::new(PlayerId(id), format!("player-{id}"))
}

/// A bare planet holding `stock` at [`START`].
#[must_use]
pub fn planet(id: u32, owner: u32, stock: Resources) -> Planet {
    Planet::new(PlanetId(id), PlayerId(owner), format!("planet-{id}"), stock, START)
}

/// Resolve machine names to ids.
///
/// # Panics
///
/// Panics on an unknown machine name.
#[must_use]
pub fn levels(catalog: &Catalog, entries: &[(&str, u32)]) -> Vec<(ObjectId, u32)> {
    entries
        .iter()
        .map(|&(name, level)| {
            let id = catalog
                .id_of(name)
                .unwrap_or_else(|| panic!("unknown object {name}"));
            (id, level)
        })
        .collect()
}

/// A planet well into the game: large mines, matching power and stores,
/// everything at full production.
#[must_use]
pub fn developed_planet(catalog: &Catalog, id: u32, owner: u32) -> Planet {
    planet(id, owner, resources(500_000, 250_000, 100_000)).with_levels(levels(
        catalog,
        &[
            ("metal_mine", 30),
            ("crystal_mine", 26),
            ("deuterium_synthesizer", 22),
            ("solar_plant", 32),
            ("fusion_plant", 10),
            ("metal_store", 10),
            ("crystal_store", 9),
            ("deuterium_store", 8),
            ("robot_factory", 10),
            ("shipyard", 12),
            ("research_lab", 10),
            ("nano_factory", 2),
        ],
    ))
}
