//! The engine: validated mutations of planets and players.
//!
//! Every operation first ticks the planet (and its owner's research) up to
//! `now`, then validates, and only then changes state. A failed operation
//! leaves nothing changed apart from that tick, which never alters what a
//! read at `now` returns.

use crate::catalog::{Catalog, ObjectDefinition, ObjectId, ObjectKind};
use crate::clock::Timestamp;
use crate::config::EngineConfig;
use crate::data::ObjectEffect;
use crate::economy::ProductionProfile;
use crate::error::{GameError, Result};
use crate::math::Amount;
use crate::planet::Planet;
use crate::production::{
    BuildOrder, BuildQueue, BuildQueueItem, ItemStatus, ProductionEvent, QueueItemId, QueueKind,
};
use crate::research::Player;
use crate::resources::{ResourceKind, Resources};

/// A queued build request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enqueued {
    /// The new item.
    pub item: QueueItemId,
    /// Transitions up to the request, then the `Queued` event.
    pub events: Vec<ProductionEvent>,
}

/// A cancelled build request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancelled {
    /// Resources returned to the planet.
    pub refund: Resources,
    /// Transitions up to the request, then the cancellation events.
    pub events: Vec<ProductionEvent>,
}

/// Catalog plus configuration; stateless otherwise.
#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Catalog,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine, validating the configuration.
    pub fn new(catalog: Catalog, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { catalog, config })
    }

    /// Standard catalog with default configuration.
    pub fn standard() -> Result<Self> {
        Self::new(Catalog::standard()?, EngineConfig::default())
    }

    /// The object catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Production profile of `planet` with its current levels.
    #[must_use]
    pub fn profile(&self, planet: &Planet, player: &Player) -> ProductionProfile {
        planet.profile(&self.catalog, player.research(), self.config.economy_speed)
    }

    /// Bring `player`'s research and then `planet` up to `now`.
    pub fn tick(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        now: Timestamp,
    ) -> Result<Vec<ProductionEvent>> {
        if planet.owner != player.id {
            return Err(GameError::UnknownPlanet(planet.id.0));
        }
        let mut events = player.tick(now);
        events.extend(planet.tick(
            &self.catalog,
            &player.research,
            self.config.economy_speed,
            now,
        ));
        Ok(events)
    }

    /// Stock of `planet` at `now`. The energy field is the energy balance.
    pub fn current_amount(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        now: Timestamp,
    ) -> Result<Resources> {
        self.tick(planet, player, now)?;
        let profile = self.profile(planet, player);
        Ok(planet.resources_at(now, &profile))
    }

    /// Add resources, saturating at storage capacity unless `allow_overflow`.
    pub fn add_resources(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        delta: Resources,
        allow_overflow: bool,
        now: Timestamp,
    ) -> Result<()> {
        self.tick(planet, player, now)?;
        let profile = self.profile(planet, player);
        planet
            .ledger
            .add_resources(delta, allow_overflow, now, &profile);
        Ok(())
    }

    /// Deduct resources, all or nothing.
    pub fn deduct_resources(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        delta: Resources,
        now: Timestamp,
    ) -> Result<()> {
        self.tick(planet, player, now)?;
        let profile = self.profile(planet, player);
        planet.ledger.deduct_resources(delta, now, &profile)
    }

    /// Overwrite the stock of `planet`.
    pub fn set_resources(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        resources: Resources,
        now: Timestamp,
    ) -> Result<()> {
        self.tick(planet, player, now)?;
        planet.ledger.set_resources(resources, now);
        Ok(())
    }

    /// Queue a build request by machine name. See [`enqueue`](Self::enqueue).
    pub fn enqueue_by_name(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        machine_name: &str,
        amount: u32,
        now: Timestamp,
    ) -> Result<Enqueued> {
        let id = self.catalog.definition_for(machine_name)?.id;
        self.enqueue(planet, player, id, amount, now)
    }

    /// Queue the next level of a building or research, or `amount` units.
    ///
    /// `amount` is ignored for buildings and research. The cost is deducted
    /// immediately; nothing changes if any check fails.
    pub fn enqueue(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        object: ObjectId,
        amount: u32,
        now: Timestamp,
    ) -> Result<Enqueued> {
        let mut events = self.tick(planet, player, now)?;
        let def = self.catalog.definition(object)?;
        let queue_kind = def.category.queue();
        let facilities = self.catalog.facility_levels(planet.levels());
        let speed = self.config.economy_speed;

        let (order, cost, duration) = match def.kind() {
            ObjectKind::Building => {
                let target = planet.next_building_level(def.id);
                check_max_level(def, u64::from(target))?;
                self.catalog
                    .check_prerequisites(def, planet.levels(), player.research())?;
                self.check_queue_room(&planet.buildings, queue_kind)?;
                self.check_facility_free(def, planet, player)?;
                let current = target - 1;
                (
                    BuildOrder::Upgrade {
                        target_level: target,
                    },
                    def.cost_at(current),
                    def.build_time_at(current, &facilities, speed),
                )
            }
            ObjectKind::Research => {
                let target = player.next_research_level(def.id);
                check_max_level(def, u64::from(target))?;
                self.catalog
                    .check_prerequisites(def, planet.levels(), player.research())?;
                self.check_queue_room(&player.queue, queue_kind)?;
                if planet
                    .buildings
                    .contains_any(&self.objects_with(|e| matches!(e, ObjectEffect::ResearchSpeed)))
                {
                    return Err(GameError::FacilityBusy(format!(
                        "cannot research {} while the research lab is being upgraded",
                        def.machine_name
                    )));
                }
                let current = target - 1;
                (
                    BuildOrder::Upgrade {
                        target_level: target,
                    },
                    def.cost_at(current),
                    def.build_time_at(current, &facilities, speed),
                )
            }
            ObjectKind::Unit => {
                if amount == 0 {
                    return Err(GameError::InvalidLevel {
                        object: def.machine_name.clone(),
                        level: 0,
                    });
                }
                let total = u64::from(planet.units_including_queued(def.id)) + u64::from(amount);
                check_max_level(def, total)?;
                self.catalog
                    .check_prerequisites(def, planet.levels(), player.research())?;
                let queue = planet
                    .queue(queue_kind)
                    .ok_or_else(|| GameError::UnknownObject(def.machine_name.clone()))?;
                self.check_queue_room(queue, queue_kind)?;
                if planet.buildings.contains_any(&self.objects_with(|e| {
                    matches!(e, ObjectEffect::ShipyardSpeed | ObjectEffect::NaniteSpeed)
                })) {
                    return Err(GameError::FacilityBusy(format!(
                        "cannot build {} while the shipyard or nanite factory is being upgraded",
                        def.machine_name
                    )));
                }
                let unit_duration = def.build_time_at(0, &facilities, speed);
                (
                    BuildOrder::Units {
                        amount,
                        delivered: 0,
                        unit_duration,
                    },
                    def.cost_at(0).times(amount),
                    unit_duration.saturating_mul(u64::from(amount)),
                )
            }
        };

        let profile = self.profile(planet, player);
        let required_energy = cost.energy();
        let balance = profile.energy_balance();
        if required_energy > Amount::ZERO && required_energy > balance {
            return Err(GameError::InsufficientResources {
                resource: ResourceKind::Energy,
                required: required_energy.ceil().to_num(),
                available: balance.floor().to_num(),
            });
        }
        planet.ledger.deduct_resources(cost, now, &profile)?;

        let planet_id = planet.id;
        let (id, queue) = if queue_kind == QueueKind::Research {
            (player.allocate_item_id(), &mut player.queue)
        } else {
            let id = planet.allocate_item_id();
            let queue = planet
                .queue_mut(queue_kind)
                .ok_or_else(|| GameError::UnknownObject(def.machine_name.clone()))?;
            (id, queue)
        };
        let (start, finish) = queue.schedule(now, duration);
        events.push(queue.push(
            BuildQueueItem {
                id,
                object: def.id,
                order,
                cost: cost.without_energy(),
                start,
                finish,
                status: ItemStatus::Pending,
                planet: planet_id,
            },
            now,
        ));
        Ok(Enqueued { item: id, events })
    }

    /// Cancel a queued item of `object` and refund it to `planet`.
    ///
    /// Pending items are refunded in full, in-progress items per
    /// [`EngineConfig::in_progress_refund_percent`]. Later levels of the
    /// same building or research are cancelled with it.
    pub fn cancel(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        object: ObjectId,
        item: QueueItemId,
        now: Timestamp,
    ) -> Result<Cancelled> {
        let mut events = self.tick(planet, player, now)?;
        let def = self.catalog.definition(object)?;
        let queue_kind = def.category.queue();
        let planet_id = planet.id;

        let queue = if queue_kind == QueueKind::Research {
            &mut player.queue
        } else {
            planet
                .queue_mut(queue_kind)
                .ok_or(GameError::ItemNotFound(item))?
        };
        let belongs = queue
            .get(item)
            .is_some_and(|queued| queued.object == object && queued.planet == planet_id);
        if !belongs {
            return Err(GameError::ItemNotFound(item));
        }
        let outcome = queue.cancel(item, now, self.config.in_progress_refund_percent)?;

        let profile = self.profile(planet, player);
        planet
            .ledger
            .add_resources(outcome.refund, true, now, &profile);
        tracing::debug!(
            planet = %planet_id,
            %item,
            removed = outcome.removed.len(),
            refund = %outcome.refund,
            "build request cancelled"
        );
        events.extend(outcome.events);
        Ok(Cancelled {
            refund: outcome.refund,
            events,
        })
    }

    /// Set a research level directly, bypassing queue and cost.
    ///
    /// The level counts from `now`; planets read later still accrue at the
    /// old level up to `now`.
    pub fn set_research_level(
        &self,
        player: &mut Player,
        machine_name: &str,
        level: u32,
        now: Timestamp,
    ) -> Result<()> {
        let def = self.catalog.definition_for(machine_name)?;
        if def.kind() != ObjectKind::Research {
            return Err(GameError::InvalidLevel {
                object: def.machine_name.clone(),
                level: i64::from(level),
            });
        }
        check_max_level(def, u64::from(level))?;
        player.tick(now);
        player.research.record(def.id, level, now);
        Ok(())
    }

    /// Set a building level or unit count directly, bypassing queue and cost.
    ///
    /// Resources accrue at the old level up to `now`.
    pub fn set_object_level(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        machine_name: &str,
        level: u32,
        now: Timestamp,
    ) -> Result<()> {
        let def = self.catalog.definition_for(machine_name)?;
        if def.kind() == ObjectKind::Research {
            return Err(GameError::InvalidLevel {
                object: def.machine_name.clone(),
                level: i64::from(level),
            });
        }
        check_max_level(def, u64::from(level))?;
        self.tick(planet, player, now)?;
        planet.levels.set(def.id, level);
        Ok(())
    }

    /// Add ships or defense directly, bypassing queue and cost.
    pub fn add_units(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        machine_name: &str,
        amount: u32,
        now: Timestamp,
    ) -> Result<()> {
        let def = self.catalog.definition_for(machine_name)?;
        let total = u64::from(planet.level(def.id)) + u64::from(amount);
        if def.kind() != ObjectKind::Unit || amount == 0 {
            return Err(GameError::InvalidLevel {
                object: def.machine_name.clone(),
                level: i64::from(amount),
            });
        }
        check_max_level(def, total)?;
        self.tick(planet, player, now)?;
        planet.levels.add(def.id, amount);
        Ok(())
    }

    /// Change the production setting of a building, in tenths (0..=10).
    pub fn set_production_percent(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        machine_name: &str,
        tenths: u8,
        now: Timestamp,
    ) -> Result<()> {
        let def = self.catalog.definition_for(machine_name)?;
        self.tick(planet, player, now)?;
        planet.percents.set(def.id, tenths)
    }

    fn check_queue_room(&self, queue: &BuildQueue, kind: QueueKind) -> Result<()> {
        let limit = self.config.queue_limits.limit(kind);
        if queue.is_full(limit) {
            return Err(GameError::QueueFull { queue: kind, limit });
        }
        Ok(())
    }

    /// A lab cannot be upgraded during research, nor a shipyard or nanite
    /// factory while ships or defense are being built.
    fn check_facility_free(
        &self,
        def: &ObjectDefinition,
        planet: &Planet,
        player: &Player,
    ) -> Result<()> {
        if def.has_effect(|e| matches!(e, ObjectEffect::ResearchSpeed)) && !player.queue.is_empty()
        {
            return Err(GameError::FacilityBusy(format!(
                "{} cannot be upgraded while research is in progress",
                def.machine_name
            )));
        }
        let builds_units = def.has_effect(|e| {
            matches!(e, ObjectEffect::ShipyardSpeed | ObjectEffect::NaniteSpeed)
        });
        if builds_units && !(planet.shipyard.is_empty() && planet.defense.is_empty()) {
            return Err(GameError::FacilityBusy(format!(
                "{} cannot be upgraded while ships or defense are being built",
                def.machine_name
            )));
        }
        Ok(())
    }

    fn objects_with(&self, predicate: impl Fn(&ObjectEffect) -> bool) -> Vec<ObjectId> {
        self.catalog
            .iter()
            .filter(|def| def.effects.iter().any(&predicate))
            .map(|def| def.id)
            .collect()
    }
}

fn check_max_level(def: &ObjectDefinition, level: u64) -> Result<()> {
    if level > u64::from(def.max_level) {
        return Err(GameError::InvalidLevel {
            object: def.machine_name.clone(),
            level: i64::try_from(level).unwrap_or(i64::MAX),
        });
    }
    Ok(())
}
