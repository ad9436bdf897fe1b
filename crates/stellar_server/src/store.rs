//! Persistence of planets and players.
//!
//! The engine treats stored state as an opaque blob per entity. Every load
//! returns a fresh copy, so a request that fails half way simply does not
//! save and leaves the stored state untouched.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use stellar_core::error::{GameError, Result};
use stellar_core::planet::{Planet, PlanetId};
use stellar_core::research::{Player, PlayerId};

/// Load and save entity state by id.
pub trait GameStore: Send + Sync {
    /// Load a planet.
    fn load_planet(&self, id: PlanetId) -> Result<Planet>;

    /// Insert or replace a planet.
    fn save_planet(&self, planet: &Planet) -> Result<()>;

    /// Load a player.
    fn load_player(&self, id: PlayerId) -> Result<Player>;

    /// Insert or replace a player.
    fn save_player(&self, player: &Player) -> Result<()>;

    /// Owner of a planet, without decoding it.
    fn owner_of(&self, planet: PlanetId) -> Result<PlayerId>;

    /// All planets of a player, in id order.
    fn planets_of(&self, player: PlayerId) -> Result<Vec<PlanetId>>;
}

/// In-memory store of bincode snapshots.
#[derive(Debug, Default)]
pub struct MemoryStore {
    planets: Mutex<HashMap<PlanetId, (PlayerId, Vec<u8>)>>,
    players: Mutex<HashMap<PlayerId, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored planets.
    #[must_use]
    pub fn planet_count(&self) -> usize {
        self.planets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| GameError::Storage(format!("encode failed: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| {
        tracing::error!(error = %e, "stored snapshot is corrupt");
        GameError::Storage(format!("decode failed: {e}"))
    })
}

impl GameStore for MemoryStore {
    fn load_planet(&self, id: PlanetId) -> Result<Planet> {
        let planets = self.planets.lock().unwrap_or_else(PoisonError::into_inner);
        let (_, bytes) = planets.get(&id).ok_or(GameError::UnknownPlanet(id.0))?;
        decode(bytes)
    }

    fn save_planet(&self, planet: &Planet) -> Result<()> {
        let bytes = encode(planet)?;
        self.planets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(planet.id, (planet.owner, bytes));
        Ok(())
    }

    fn load_player(&self, id: PlayerId) -> Result<Player> {
        let players = self.players.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = players.get(&id).ok_or(GameError::UnknownPlayer(id.0))?;
        decode(bytes)
    }

    fn save_player(&self, player: &Player) -> Result<()> {
        let bytes = encode(player)?;
        self.players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player.id, bytes);
        Ok(())
    }

    fn owner_of(&self, planet: PlanetId) -> Result<PlayerId> {
        self.planets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&planet)
            .map(|(owner, _)| *owner)
            .ok_or(GameError::UnknownPlanet(planet.0))
    }

    fn planets_of(&self, player: PlayerId) -> Result<Vec<PlanetId>> {
        let mut ids: Vec<PlanetId> = self
            .planets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, (owner, _))| *owner == player)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
