//! Scenario harness: one engine, one player, one planet and a manual clock.
//!
//! Scenarios read like the story they test:
//!
//! ```ignore
//! let mut s = Scenario::new(resources(500, 500, 0));
//! s.set_level("robot_factory", 1);
//! s.enqueue("metal_mine", 1).unwrap();
//! s.advance(61);
//! assert_eq!(s.level("metal_mine"), 1);
//! ```

use stellar_core::clock::{Clock, ManualClock, Timestamp};
use stellar_core::engine::Engine;
use stellar_core::error::Result;
use stellar_core::planet::Planet;
use stellar_core::production::QueueItemId;
use stellar_core::research::Player;
use stellar_core::resources::Resources;
use stellar_core::view::PlanetView;

use crate::fixtures::{self, START};

/// A single-planet game driven by a manual clock.
#[derive(Debug)]
pub struct Scenario {
    /// The engine under test.
    pub engine: Engine,
    /// Planet 1.
    pub planet: Planet,
    /// Player 1, owner of the planet.
    pub player: Player,
    /// Time source; starts at [`START`].
    pub clock: ManualClock,
}

impl Scenario {
    /// Standard engine, empty planet holding `stock`.
    #[must_use]
    pub fn new(stock: Resources) -> Self {
        Self::with_engine(fixtures::engine(), stock)
    }

    /// Custom engine, empty planet holding `stock`.
    #[must_use]
    pub fn with_engine(engine: Engine, stock: Resources) -> Self {
        Self {
            engine,
            planet: fixtures::planet(1, 1, stock),
            player: fixtures::player(1),
            clock: ManualClock::new(START),
        }
    }

    /// Current instant.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Move the clock forward.
    pub fn advance(&mut self, secs: u64) -> Timestamp {
        self.clock.advance(secs)
    }

    /// Set a building level or unit count now.
    ///
    /// # Panics
    ///
    /// Panics if the engine rejects the level.
    pub fn set_level(&mut self, machine_name: &str, level: u32) -> &mut Self {
        let now = self.now();
        self.engine
            .set_object_level(&mut self.planet, &mut self.player, machine_name, level, now)
            .unwrap_or_else(|e| panic!("set {machine_name} to {level}: {e}"));
        self
    }

    /// Set a research level.
    ///
    /// # Panics
    ///
    /// Panics if the engine rejects the level.
    pub fn set_research(&mut self, machine_name: &str, level: u32) -> &mut Self {
        let now = self.now();
        self.engine
            .set_research_level(&mut self.player, machine_name, level, now)
            .unwrap_or_else(|e| panic!("set {machine_name} to {level}: {e}"));
        self
    }

    /// Queue a build request now.
    pub fn enqueue(&mut self, machine_name: &str, amount: u32) -> Result<QueueItemId> {
        let now = self.now();
        self.engine
            .enqueue_by_name(&mut self.planet, &mut self.player, machine_name, amount, now)
            .map(|queued| queued.item)
    }

    /// Cancel a queued item now.
    pub fn cancel(&mut self, machine_name: &str, item: QueueItemId) -> Result<Resources> {
        let now = self.now();
        let object = self.engine.catalog().definition_for(machine_name)?.id;
        self.engine
            .cancel(&mut self.planet, &mut self.player, object, item, now)
            .map(|cancelled| cancelled.refund)
    }

    /// Add resources now, optionally past storage capacity.
    ///
    /// # Panics
    ///
    /// Panics if the engine rejects the operation.
    pub fn give(&mut self, delta: Resources, allow_overflow: bool) -> &mut Self {
        let now = self.now();
        self.engine
            .add_resources(&mut self.planet, &mut self.player, delta, allow_overflow, now)
            .unwrap_or_else(|e| panic!("add {delta}: {e}"));
        self
    }

    /// Planet view now.
    ///
    /// # Panics
    ///
    /// Panics if the view cannot be built.
    pub fn state(&mut self) -> PlanetView {
        let now = self.now();
        self.engine
            .current_state(&mut self.planet, &mut self.player, now)
            .unwrap_or_else(|e| panic!("state at {now}: {e}"))
    }

    /// Stock now, floored to whole units. Energy is left out; read the
    /// balance from [`state`](Self::state).
    pub fn resources(&mut self) -> Resources {
        self.state().resources.floor().without_energy()
    }

    /// Building level, research level or unit count now.
    ///
    /// # Panics
    ///
    /// Panics on an unknown machine name.
    pub fn level(&mut self, machine_name: &str) -> u32 {
        self.state()
            .object(machine_name)
            .unwrap_or_else(|| panic!("unknown object {machine_name}"))
            .level
    }
}
