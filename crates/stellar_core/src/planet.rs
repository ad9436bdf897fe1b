//! Planet state: ledger, levels and the three planet-owned build queues.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Levels, ObjectId};
use crate::clock::Timestamp;
use crate::economy::{EconomyInputs, Ledger, ProductionPercents, ProductionProfile};
use crate::production::{BuildQueue, ProductionEvent, QueueItemId, QueueKind};
use crate::research::{PlayerId, PlayerResearch};
use crate::resources::Resources;

/// Unique identifier for planets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanetId(pub u32);

impl PlanetId {
    /// Create a new planet ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PlanetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default maximum temperature of a new planet.
pub const DEFAULT_MAX_TEMPERATURE: i32 = 40;

/// A planet and everything built on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
    /// Planet identifier.
    pub id: PlanetId,
    /// Owning player.
    pub owner: PlayerId,
    /// Display name.
    pub name: String,
    /// Maximum temperature in degrees, drives deuterium and satellite output.
    pub max_temperature: i32,
    pub(crate) ledger: Ledger,
    pub(crate) levels: Levels,
    pub(crate) percents: ProductionPercents,
    pub(crate) buildings: BuildQueue,
    pub(crate) shipyard: BuildQueue,
    pub(crate) defense: BuildQueue,
    next_item_id: u64,
}

impl Planet {
    /// Create a planet holding `resources` at `at`, with nothing built.
    #[must_use]
    pub fn new(
        id: PlanetId,
        owner: PlayerId,
        name: impl Into<String>,
        resources: Resources,
        at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner,
            name: name.into(),
            max_temperature: DEFAULT_MAX_TEMPERATURE,
            ledger: Ledger::new(resources, at),
            levels: Levels::new(),
            percents: ProductionPercents::new(),
            buildings: BuildQueue::new(QueueKind::Buildings),
            shipyard: BuildQueue::new(QueueKind::Shipyard),
            defense: BuildQueue::new(QueueKind::Defense),
            next_item_id: 1,
        }
    }

    /// Set the maximum temperature.
    #[must_use]
    pub fn with_max_temperature(mut self, max_temperature: i32) -> Self {
        self.max_temperature = max_temperature;
        self
    }

    /// Set initial levels or unit counts.
    #[must_use]
    pub fn with_levels(mut self, levels: impl IntoIterator<Item = (ObjectId, u32)>) -> Self {
        for (object, level) in levels {
            self.levels.set(object, level);
        }
        self
    }

    /// The resource ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Building levels and unit counts.
    #[must_use]
    pub const fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Level (or unit count) of one object.
    #[must_use]
    pub fn level(&self, object: ObjectId) -> u32 {
        self.levels.get(object)
    }

    /// Production settings.
    #[must_use]
    pub const fn percents(&self) -> &ProductionPercents {
        &self.percents
    }

    /// One of the planet's queues. The research queue belongs to the player.
    #[must_use]
    pub const fn queue(&self, kind: QueueKind) -> Option<&BuildQueue> {
        match kind {
            QueueKind::Buildings => Some(&self.buildings),
            QueueKind::Shipyard => Some(&self.shipyard),
            QueueKind::Defense => Some(&self.defense),
            QueueKind::Research => None,
        }
    }

    pub(crate) fn queue_mut(&mut self, kind: QueueKind) -> Option<&mut BuildQueue> {
        match kind {
            QueueKind::Buildings => Some(&mut self.buildings),
            QueueKind::Shipyard => Some(&mut self.shipyard),
            QueueKind::Defense => Some(&mut self.defense),
            QueueKind::Research => None,
        }
    }

    /// Allocate the next queue item id.
    pub(crate) fn allocate_item_id(&mut self) -> QueueItemId {
        let id = QueueItemId(self.next_item_id);
        self.next_item_id += 1;
        id
    }

    /// Production profile with the current levels.
    #[must_use]
    pub fn profile(
        &self,
        catalog: &Catalog,
        research: &Levels,
        economy_speed: u32,
    ) -> ProductionProfile {
        ProductionProfile::compute(
            catalog,
            &EconomyInputs {
                levels: &self.levels,
                percents: &self.percents,
                research,
                max_temperature: self.max_temperature,
                economy_speed,
            },
        )
    }

    /// Bring queues and ledger up to `now`.
    ///
    /// Resources accrue in segments. A segment ends at every building
    /// completion, every delivery of a unit that changes production and
    /// every research change; the new levels count from that instant on.
    pub fn tick(
        &mut self,
        catalog: &Catalog,
        research: &PlayerResearch,
        economy_speed: u32,
        now: Timestamp,
    ) -> Vec<ProductionEvent> {
        let mut events = Vec::new();
        while let Some(at) = self
            .next_boundary(catalog, research)
            .filter(|at| *at <= now)
        {
            self.accrue_to(catalog, research, economy_speed, at);
            events.extend(self.advance_queues(at));
        }
        self.accrue_to(catalog, research, economy_speed, now);
        events.extend(self.advance_queues(now));
        events
    }

    fn accrue_to(
        &mut self,
        catalog: &Catalog,
        research: &PlayerResearch,
        economy_speed: u32,
        at: Timestamp,
    ) {
        let levels = research.levels_at(self.ledger.checkpoint());
        let profile = self.profile(catalog, &levels, economy_speed);
        self.ledger.accrue_to(at, &profile);
    }

    /// Earliest instant after which production may differ.
    fn next_boundary(&self, catalog: &Catalog, research: &PlayerResearch) -> Option<Timestamp> {
        let productive_units = [&self.shipyard, &self.defense]
            .into_iter()
            .filter(|queue| {
                queue.head().is_some_and(|head| {
                    catalog
                        .definition(head.object)
                        .is_ok_and(|def| !def.effects.is_empty())
                })
            })
            .filter_map(BuildQueue::next_delivery);
        self.buildings
            .next_delivery()
            .into_iter()
            .chain(productive_units)
            .chain(research.next_change_after(self.ledger.checkpoint()))
            .min()
    }

    fn advance_queues(&mut self, now: Timestamp) -> Vec<ProductionEvent> {
        let mut events = self.shipyard.advance(now);
        events.extend(self.defense.advance(now));
        events.extend(self.buildings.advance(now));
        self.apply(&events);
        events
    }

    /// Apply building completions and unit deliveries to the levels. A
    /// completion never lowers a level that was set directly meanwhile.
    fn apply(&mut self, events: &[ProductionEvent]) {
        for event in events {
            match *event {
                ProductionEvent::Completed {
                    queue: QueueKind::Buildings,
                    object,
                    level: Some(level),
                    ..
                } => {
                    let level = level.max(self.levels.get(object));
                    self.levels.set(object, level);
                }
                ProductionEvent::UnitsDelivered { object, amount, .. } => {
                    self.levels.add(object, amount);
                }
                _ => {}
            }
        }
    }

    /// Units of `object` on the planet plus those still queued.
    #[must_use]
    pub fn units_including_queued(&self, object: ObjectId) -> u32 {
        let queued = self
            .shipyard
            .undelivered_units(object)
            .saturating_add(self.defense.undelivered_units(object));
        self.levels.get(object).saturating_add(queued)
    }

    /// Level the next queued upgrade of `object` would reach.
    #[must_use]
    pub fn next_building_level(&self, object: ObjectId) -> u32 {
        self.buildings
            .highest_target(object)
            .unwrap_or(0)
            .max(self.levels.get(object))
            .saturating_add(1)
    }

    /// Stock at `now` without advancing anything.
    #[must_use]
    pub fn resources_at(&self, now: Timestamp, profile: &ProductionProfile) -> Resources {
        self.ledger.current_amount(now, profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Amount;
    use crate::production::{BuildOrder, BuildQueueItem, ItemStatus};
    use crate::research::Player;

    fn planet_with_mine(catalog: &Catalog) -> Planet {
        Planet::new(
            PlanetId(1),
            PlayerId(1),
            "Homeworld",
            Resources::new(500, 500, 0, 0),
            Timestamp(0),
        )
        .with_levels([(catalog.id_of("solar_plant").unwrap(), 5)])
    }

    fn queue_mine(planet: &mut Planet, catalog: &Catalog, level: u32, duration: u64) {
        let mine = catalog.id_of("metal_mine").unwrap();
        let id = planet.allocate_item_id();
        let (start, finish) = planet.buildings.schedule(Timestamp(0), duration);
        planet.buildings.push(
            BuildQueueItem {
                id,
                object: mine,
                order: BuildOrder::Upgrade {
                    target_level: level,
                },
                cost: Resources::ZERO,
                start,
                finish,
                status: ItemStatus::Pending,
                planet: planet.id,
            },
            Timestamp(0),
        );
    }

    #[test]
    fn test_item_ids_increase() {
        let catalog = Catalog::standard().unwrap();
        let mut planet = planet_with_mine(&catalog);
        assert_eq!(planet.allocate_item_id(), QueueItemId(1));
        assert_eq!(planet.allocate_item_id(), QueueItemId(2));
    }

    #[test]
    fn test_tick_applies_completion_and_accrues_in_segments() {
        let catalog = Catalog::standard().unwrap();
        let mut planet = planet_with_mine(&catalog);
        let player = Player::new(PlayerId(1), "Ada");
        queue_mine(&mut planet, &catalog, 1, 3600);

        let events = planet.tick(&catalog, player.research_history(), 1, Timestamp(7200));
        assert!(events
            .iter()
            .any(|e| matches!(e, ProductionEvent::Completed { level: Some(1), .. })));
        assert_eq!(planet.level(catalog.id_of("metal_mine").unwrap()), 1);

        // First hour: base income 30. Second hour: 30 + 33 from the mine.
        assert_eq!(
            planet.ledger().stored().metal(),
            Amount::from_num(500 + 30 + 63)
        );
        assert_eq!(planet.ledger().checkpoint(), Timestamp(7200));
    }

    #[test]
    fn test_tick_twice_is_idempotent() {
        let catalog = Catalog::standard().unwrap();
        let mut planet = planet_with_mine(&catalog);
        let player = Player::new(PlayerId(1), "Ada");
        let research = player.research_history();
        queue_mine(&mut planet, &catalog, 1, 100);

        planet.tick(&catalog, research, 1, Timestamp(500));
        let snapshot = planet.clone();
        assert!(planet.tick(&catalog, research, 1, Timestamp(500)).is_empty());
        assert_eq!(planet, snapshot);
    }

    #[test]
    fn test_completion_keeps_a_higher_direct_level() {
        let catalog = Catalog::standard().unwrap();
        let mut planet = planet_with_mine(&catalog);
        let player = Player::new(PlayerId(1), "Ada");
        let mine = catalog.id_of("metal_mine").unwrap();
        queue_mine(&mut planet, &catalog, 1, 100);
        planet.levels.set(mine, 5);

        planet.tick(&catalog, player.research_history(), 1, Timestamp(500));
        assert_eq!(planet.level(mine), 5);
    }

    #[test]
    fn test_next_building_level_counts_queue() {
        let catalog = Catalog::standard().unwrap();
        let mut planet = planet_with_mine(&catalog);
        let mine = catalog.id_of("metal_mine").unwrap();
        assert_eq!(planet.next_building_level(mine), 1);
        queue_mine(&mut planet, &catalog, 1, 100);
        assert_eq!(planet.next_building_level(mine), 2);
    }

    #[test]
    fn test_research_queue_is_not_on_planet() {
        let catalog = Catalog::standard().unwrap();
        let planet = planet_with_mine(&catalog);
        assert!(planet.queue(QueueKind::Research).is_none());
        assert!(planet.queue(QueueKind::Defense).is_some());
    }
}
