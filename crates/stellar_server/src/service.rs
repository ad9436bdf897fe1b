//! Request handling with per-planet and per-player critical sections.
//!
//! Every request that touches a planet runs load, tick, mutate and save
//! under that planet's lock. Research is player-global, so requests that
//! read or change the research queue also hold the owner's lock for the
//! whole read-modify-write. Locks are always taken player first, then
//! planet.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use stellar_core::catalog::{ObjectId, ObjectKind};
use stellar_core::clock::{Clock, Timestamp};
use stellar_core::data::ObjectEffect;
use stellar_core::engine::Engine;
use stellar_core::error::{GameError, Result};
use stellar_core::planet::{Planet, PlanetId};
use stellar_core::production::{ProductionEvent, QueueItemId, QueueKind};
use stellar_core::research::{Player, PlayerId};
use stellar_core::resources::Resources;
use stellar_core::view::PlanetView;

use crate::protocol::{level_from_wire, request_resources, Request, Response};
use crate::store::GameStore;

/// One async mutex per key, created on first use.
#[derive(Debug)]
struct LockMap<K> {
    locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K: Eq + Hash + Copy> LockMap<K> {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: K) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key).or_default())
    }
}

/// How a planet request treats the owner's research state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerAccess {
    /// Research levels are read from a snapshot; the player is not saved.
    Snapshot,
    /// The research queue may change; the player lock is held throughout.
    Exclusive,
}

/// The game service: engine, store, clock and locks.
pub struct GameService<S> {
    engine: Engine,
    store: S,
    clock: Arc<dyn Clock>,
    starting_resources: Resources,
    starting_temperature: i32,
    next_player: AtomicU32,
    next_planet: AtomicU32,
    planet_locks: LockMap<PlanetId>,
    player_locks: LockMap<PlayerId>,
}

impl<S> std::fmt::Debug for GameService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("engine", &self.engine)
            .field("starting_resources", &self.starting_resources)
            .finish_non_exhaustive()
    }
}

impl<S: GameStore> GameService<S> {
    /// Create a service over `store`. New planets get `starting_resources`.
    pub fn new(
        engine: Engine,
        store: S,
        clock: Arc<dyn Clock>,
        starting_resources: Resources,
        starting_temperature: i32,
    ) -> Self {
        Self {
            engine,
            store,
            clock,
            starting_resources,
            starting_temperature,
            next_player: AtomicU32::new(1),
            next_planet: AtomicU32::new(1),
            planet_locks: LockMap::new(),
            player_locks: LockMap::new(),
        }
    }

    /// The engine.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Register a player with no research.
    pub fn create_player(&self, name: &str) -> Result<PlayerId> {
        let id = PlayerId::new(self.next_player.fetch_add(1, Ordering::SeqCst));
        self.store.save_player(&Player::new(id, name))?;
        tracing::info!(player = %id, name, "player created");
        Ok(id)
    }

    /// Create a planet holding the starting resources.
    pub async fn create_planet(&self, owner: PlayerId, name: &str) -> Result<PlanetId> {
        let player_lock = self.player_locks.get(owner);
        let _player_guard = player_lock.lock().await;
        self.store.load_player(owner)?;

        let id = PlanetId::new(self.next_planet.fetch_add(1, Ordering::SeqCst));
        let planet = Planet::new(id, owner, name, self.starting_resources, self.clock.now())
            .with_max_temperature(self.starting_temperature);
        self.store.save_planet(&planet)?;
        tracing::info!(planet = %id, player = %owner, name, "planet created");
        Ok(id)
    }

    /// Queue a build request on `planet`. Research is queued with
    /// `planet` as its origin.
    pub async fn enqueue(
        &self,
        planet: PlanetId,
        object: ObjectId,
        amount: u32,
    ) -> Result<QueueItemId> {
        let access = self.access_for(object)?;
        let queued = self
            .with_planet(planet, access, "enqueue", |engine, planet, player, now| {
                engine.enqueue(planet, player, object, amount, now)
            })
            .await?;
        report(planet, &queued.events);
        Ok(queued.item)
    }

    /// Cancel a queued item and refund it to `planet`.
    pub async fn cancel(
        &self,
        planet: PlanetId,
        object: ObjectId,
        item: QueueItemId,
    ) -> Result<Resources> {
        let access = self.access_for(object)?;
        let cancelled = self
            .with_planet(planet, access, "cancel", |engine, planet, player, now| {
                engine.cancel(planet, player, object, item, now)
            })
            .await?;
        report(planet, &cancelled.events);
        Ok(cancelled.refund)
    }

    /// Add resources to `planet`.
    pub async fn add_resources(
        &self,
        planet: PlanetId,
        delta: Resources,
        allow_overflow: bool,
    ) -> Result<()> {
        self.with_planet(
            planet,
            PlayerAccess::Snapshot,
            "add_resources",
            |engine, planet, player, now| {
                engine.add_resources(planet, player, delta, allow_overflow, now)
            },
        )
        .await
    }

    /// Deduct resources from `planet`, all or nothing.
    pub async fn deduct_resources(&self, planet: PlanetId, delta: Resources) -> Result<()> {
        self.with_planet(
            planet,
            PlayerAccess::Snapshot,
            "deduct_resources",
            |engine, planet, player, now| engine.deduct_resources(planet, player, delta, now),
        )
        .await
    }

    /// Set a building level or unit count on `planet`.
    pub async fn set_object_level(
        &self,
        planet: PlanetId,
        machine_name: &str,
        level: u32,
    ) -> Result<()> {
        self.with_planet(
            planet,
            PlayerAccess::Snapshot,
            "set_object_level",
            |engine, planet, player, now| {
                engine.set_object_level(planet, player, machine_name, level, now)
            },
        )
        .await
    }

    /// Set a research level of `player`.
    pub async fn set_research_level(
        &self,
        player: PlayerId,
        machine_name: &str,
        level: u32,
    ) -> Result<()> {
        let player_lock = self.player_locks.get(player);
        let _player_guard = player_lock.lock().await;
        let mut state = self.store.load_player(player)?;
        let now = self.clock.now();
        self.engine
            .set_research_level(&mut state, machine_name, level, now)
            .map_err(|e| rejected("set_research_level", &e))?;
        self.forget_settled_research(&mut state)?;
        self.store.save_player(&state)
    }

    /// Planet state now. Completed work up to now is applied and saved.
    pub async fn state(&self, planet: PlanetId) -> Result<PlanetView> {
        self.with_planet(
            planet,
            PlayerAccess::Snapshot,
            "state",
            |engine, planet, player, now| engine.current_state(planet, player, now),
        )
        .await
    }

    /// Dispatch a decoded request.
    pub async fn handle(&self, request: Request) -> Response {
        let outcome = match request {
            Request::CreatePlayer { name } => self
                .create_player(&name)
                .map(|player_id| Response::PlayerCreated { player_id }),
            Request::CreatePlanet { player_id, name } => self
                .create_planet(player_id, &name)
                .await
                .map(|planet_id| Response::PlanetCreated { planet_id }),
            Request::AddBuildRequest {
                planet_id,
                object_id,
                amount,
            } => self
                .enqueue(planet_id, object_id, amount.unwrap_or(1))
                .await
                .map(|item_id| Response::Queued { item_id }),
            Request::CancelBuildRequest {
                planet_id,
                object_id,
                item_id,
            } => self
                .cancel(planet_id, object_id, item_id)
                .await
                .map(|refund| Response::Cancelled {
                    refund: refund.into(),
                }),
            Request::AddResources {
                planet_id,
                metal,
                crystal,
                deuterium,
                allow_overflow,
            } => self
                .add_resources(
                    planet_id,
                    request_resources(metal, crystal, deuterium),
                    allow_overflow,
                )
                .await
                .map(|()| Response::Ok),
            Request::DeductResources {
                planet_id,
                metal,
                crystal,
                deuterium,
            } => self
                .deduct_resources(planet_id, request_resources(metal, crystal, deuterium))
                .await
                .map(|()| Response::Ok),
            Request::SetObjectLevel {
                planet_id,
                machine_name,
                level,
            } => match level_from_wire(&machine_name, level) {
                Ok(level) => self
                    .set_object_level(planet_id, &machine_name, level)
                    .await
                    .map(|()| Response::Ok),
                Err(e) => Err(e),
            },
            Request::SetResearchLevel {
                player_id,
                machine_name,
                level,
            } => match level_from_wire(&machine_name, level) {
                Ok(level) => self
                    .set_research_level(player_id, &machine_name, level)
                    .await
                    .map(|()| Response::Ok),
                Err(e) => Err(e),
            },
            Request::State { planet_id } => self
                .state(planet_id)
                .await
                .map(|view| Response::State {
                    view: Box::new(view),
                }),
        };
        outcome.unwrap_or_else(|e| Response::error(&e))
    }

    /// Research, and buildings that speed up research, touch the research
    /// queue and need the owner exclusively.
    fn access_for(&self, object: ObjectId) -> Result<PlayerAccess> {
        let def = self.engine.catalog().definition(object)?;
        let touches_research = def.kind() == ObjectKind::Research
            || def.has_effect(|e| matches!(e, ObjectEffect::ResearchSpeed));
        Ok(if touches_research {
            PlayerAccess::Exclusive
        } else {
            PlayerAccess::Snapshot
        })
    }

    async fn with_planet<T>(
        &self,
        planet_id: PlanetId,
        access: PlayerAccess,
        operation: &'static str,
        apply: impl FnOnce(&Engine, &mut Planet, &mut Player, Timestamp) -> Result<T>,
    ) -> Result<T> {
        let owner = self.store.owner_of(planet_id)?;
        let player_lock = self.player_locks.get(owner);
        let planet_lock = self.planet_locks.get(planet_id);

        match access {
            PlayerAccess::Exclusive => {
                let _player_guard = player_lock.lock().await;
                let _planet_guard = planet_lock.lock().await;
                let mut player = self.store.load_player(owner)?;
                let mut planet = self.store.load_planet(planet_id)?;
                let now = self.clock.now();
                let (events, value) =
                    self.apply_at(operation, &mut planet, &mut player, now, apply)?;
                self.forget_settled_research(&mut player)?;
                self.store.save_player(&player)?;
                self.store.save_planet(&planet)?;
                report(planet_id, &events);
                Ok(value)
            }
            PlayerAccess::Snapshot => {
                let mut player = {
                    let _player_guard = player_lock.lock().await;
                    self.store.load_player(owner)?
                };
                let _planet_guard = planet_lock.lock().await;
                let mut planet = self.store.load_planet(planet_id)?;
                let now = self.clock.now();
                let (mut events, value) =
                    self.apply_at(operation, &mut planet, &mut player, now, apply)?;
                // The player is not saved, so research transitions seen here
                // are reported by the next exclusive request.
                events.retain(|event| queue_of(event) != QueueKind::Research);
                self.store.save_planet(&planet)?;
                report(planet_id, &events);
                Ok(value)
            }
        }
    }

    /// Tick to `now`, then apply the request.
    fn apply_at<T>(
        &self,
        operation: &'static str,
        planet: &mut Planet,
        player: &mut Player,
        now: Timestamp,
        apply: impl FnOnce(&Engine, &mut Planet, &mut Player, Timestamp) -> Result<T>,
    ) -> Result<(Vec<ProductionEvent>, T)> {
        let events = self
            .engine
            .tick(planet, player, now)
            .map_err(|e| rejected(operation, &e))?;
        let value =
            apply(&self.engine, planet, player, now).map_err(|e| rejected(operation, &e))?;
        Ok((events, value))
    }

    /// Drop research changes that precede every planet's ledger checkpoint.
    /// Stored checkpoints only move forward, so a stale read keeps more.
    fn forget_settled_research(&self, player: &mut Player) -> Result<()> {
        let mut oldest: Option<Timestamp> = None;
        for planet in self.store.planets_of(player.id)? {
            let checkpoint = self.store.load_planet(planet)?.ledger().checkpoint();
            oldest = Some(oldest.map_or(checkpoint, |o| o.min(checkpoint)));
        }
        if let Some(oldest) = oldest {
            player.forget_research_changes_through(oldest);
        }
        Ok(())
    }
}

fn queue_of(event: &ProductionEvent) -> QueueKind {
    match *event {
        ProductionEvent::Queued { queue, .. }
        | ProductionEvent::Started { queue, .. }
        | ProductionEvent::UnitsDelivered { queue, .. }
        | ProductionEvent::Completed { queue, .. }
        | ProductionEvent::Cancelled { queue, .. } => queue,
    }
}

/// Log the queue transitions a request caused.
fn report(planet: PlanetId, events: &[ProductionEvent]) {
    for event in events {
        match event {
            ProductionEvent::Queued { .. } | ProductionEvent::Started { .. } => {
                tracing::debug!(%planet, ?event, "production event");
            }
            _ => tracing::info!(%planet, ?event, "production event"),
        }
    }
}

fn rejected(operation: &str, error: &GameError) -> GameError {
    tracing::warn!(operation, kind = error.kind(), %error, "request rejected");
    error.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use stellar_core::clock::ManualClock;
    use stellar_test_utils::fixtures::{self, resources, START};

    fn service() -> (GameService<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let service = GameService::new(
            fixtures::engine(),
            MemoryStore::new(),
            clock.clone(),
            resources(500, 500, 0),
            40,
        );
        (service, clock)
    }

    fn id(service: &GameService<MemoryStore>, name: &str) -> ObjectId {
        service.engine().catalog().id_of(name).unwrap()
    }

    #[tokio::test]
    async fn test_enqueue_is_saved() {
        let (service, clock) = service();
        let player = service.create_player("ada").unwrap();
        let planet = service.create_planet(player, "Home").await.unwrap();

        service
            .enqueue(planet, id(&service, "metal_mine"), 1)
            .await
            .unwrap();
        let view = service.state(planet).await.unwrap();
        assert_eq!(view.resources.floor().without_energy(), resources(440, 485, 0));

        clock.advance(108);
        let view = service.state(planet).await.unwrap();
        assert_eq!(view.object("metal_mine").unwrap().level, 1);
    }

    #[tokio::test]
    async fn test_rejected_request_saves_nothing() {
        let (service, _clock) = service();
        let player = service.create_player("ada").unwrap();
        let planet = service.create_planet(player, "Home").await.unwrap();
        let before = service.store().load_planet(planet).unwrap();

        let err = service
            .deduct_resources(planet, resources(501, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::InsufficientResources { .. }));
        assert_eq!(service.store().load_planet(planet).unwrap(), before);
    }

    #[tokio::test]
    async fn test_planet_for_unknown_player() {
        let (service, _clock) = service();
        assert_eq!(
            service
                .create_planet(PlayerId::new(42), "Nowhere")
                .await
                .unwrap_err(),
            GameError::UnknownPlayer(42)
        );
    }

    #[tokio::test]
    async fn test_handle_maps_errors_to_kinds() {
        let (service, _clock) = service();
        let response = service
            .handle(Request::State {
                planet_id: PlanetId::new(9),
            })
            .await;
        assert_eq!(
            response,
            Response::Error {
                kind: "unknown_planet".into(),
                message: "Planet not found: 9".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_research_level_is_player_wide() {
        let (service, _clock) = service();
        let player = service.create_player("ada").unwrap();
        let home = service.create_planet(player, "Home").await.unwrap();
        let colony = service.create_planet(player, "Colony").await.unwrap();

        service
            .set_research_level(player, "energy_technology", 3)
            .await
            .unwrap();
        for planet in [home, colony] {
            let view = service.state(planet).await.unwrap();
            assert_eq!(view.object("energy_technology").unwrap().level, 3);
        }
    }

    #[tokio::test]
    async fn test_settled_research_changes_are_forgotten() {
        let (service, clock) = service();
        let player = service.create_player("ada").unwrap();
        let home = service.create_planet(player, "Home").await.unwrap();

        clock.advance(100);
        service
            .set_research_level(player, "energy_technology", 3)
            .await
            .unwrap();
        let stored = service.store().load_player(player).unwrap();
        assert_eq!(stored.research_history().changes.len(), 1);

        // Home catches up past the first change; only the second remains.
        service.state(home).await.unwrap();
        clock.advance(100);
        service
            .set_research_level(player, "energy_technology", 4)
            .await
            .unwrap();
        let changes = service
            .store()
            .load_player(player)
            .unwrap()
            .research_history()
            .changes
            .clone();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].at, START.plus(200));
        assert_eq!(changes[0].to, 4);
    }
}
