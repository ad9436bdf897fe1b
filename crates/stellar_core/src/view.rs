//! Read model of a planet at an instant.
//!
//! [`Engine::current_state`] is the single read path: it ticks the planet
//! and its owner, then assembles everything a client renders.

use serde::{Deserialize, Serialize};

use crate::catalog::{ObjectDefinition, ObjectId, ObjectKind};
use crate::clock::Timestamp;
use crate::data::Category;
use crate::economy::ProductionProfile;
use crate::engine::Engine;
use crate::error::Result;
use crate::math::Amount;
use crate::planet::{Planet, PlanetId};
use crate::production::{BuildOrder, BuildQueue, BuildQueueItem, ItemStatus, QueueItemId, QueueKind};
use crate::research::Player;
use crate::resources::{FormattedResources, Resources};

/// One catalog object as seen from a planet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectView {
    /// Numeric id.
    pub id: ObjectId,
    /// Machine name.
    pub machine_name: String,
    /// Display name.
    pub title: String,
    /// Menu.
    pub category: Category,
    /// Building level, research level or unit count.
    pub level: u32,
    /// Whether any queue holds this object.
    pub in_queue: bool,
    /// Latest finish among the queued items of this object.
    pub queue_finish: Option<Timestamp>,
    /// Prerequisites met, below the maximum level and affordable right now.
    pub buildable: bool,
}

/// One queued item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItemView {
    /// Item id.
    pub id: QueueItemId,
    /// Object being built.
    pub object: ObjectId,
    /// Its machine name.
    pub machine_name: String,
    /// Pending or in progress.
    pub status: ItemStatus,
    /// Level reached on completion, for buildings and research.
    pub target_level: Option<u32>,
    /// Units ordered, for ships and defense.
    pub amount: Option<u32>,
    /// Units already delivered.
    pub delivered: u32,
    /// Start instant.
    pub start: Timestamp,
    /// Finish instant.
    pub finish: Timestamp,
    /// Planet the item was ordered from.
    pub planet: PlanetId,
}

/// One queue and its items in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueView {
    /// Which queue.
    pub kind: QueueKind,
    /// Items, head first.
    pub items: Vec<QueueItemView>,
}

/// Everything about a planet at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetView {
    /// Planet id.
    pub planet: PlanetId,
    /// Planet name.
    pub name: String,
    /// Instant the view was taken.
    pub at: Timestamp,
    /// Stock; the energy field is the net energy balance.
    pub resources: Resources,
    /// Stock in the client's long format.
    pub formatted: FormattedResources,
    /// Production per hour, storage capacity and energy.
    pub profile: ProductionProfile,
    /// Every catalog object in id order.
    pub objects: Vec<ObjectView>,
    /// Buildings, research, shipyard and defense queues.
    pub queues: Vec<QueueView>,
}

impl PlanetView {
    /// View of one object by machine name.
    #[must_use]
    pub fn object(&self, machine_name: &str) -> Option<&ObjectView> {
        self.objects.iter().find(|o| o.machine_name == machine_name)
    }

    /// View of one queue.
    #[must_use]
    pub fn queue(&self, kind: QueueKind) -> Option<&QueueView> {
        self.queues.iter().find(|q| q.kind == kind)
    }
}

impl Engine {
    /// Tick `planet` and `player` to `now` and describe the result.
    ///
    /// Fails only with [`GameError::UnknownObject`](crate::error::GameError)
    /// when a queue references an object missing from the catalog.
    pub fn current_state(
        &self,
        planet: &mut Planet,
        player: &mut Player,
        now: Timestamp,
    ) -> Result<PlanetView> {
        self.tick(planet, player, now)?;
        let profile = self.profile(planet, player);
        let resources = planet.resources_at(now, &profile);

        let queues = QueueKind::ALL
            .iter()
            .map(|&kind| {
                let queue = planet.queue(kind).unwrap_or_else(|| player.queue());
                self.queue_view(queue)
            })
            .collect::<Result<Vec<_>>>()?;

        let objects = self
            .catalog()
            .iter()
            .map(|def| self.object_view(def, planet, player, &resources, &profile))
            .collect();

        Ok(PlanetView {
            planet: planet.id,
            name: planet.name.clone(),
            at: now,
            resources,
            formatted: resources.formatted(),
            profile,
            objects,
            queues,
        })
    }

    fn queue_view(&self, queue: &BuildQueue) -> Result<QueueView> {
        let items = queue
            .iter()
            .map(|item| self.item_view(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(QueueView {
            kind: queue.kind(),
            items,
        })
    }

    fn item_view(&self, item: &BuildQueueItem) -> Result<QueueItemView> {
        let def = self.catalog().definition(item.object).map_err(|err| {
            tracing::error!(
                item = %item.id,
                object = %item.object,
                "queue references an object missing from the catalog"
            );
            err
        })?;
        let (amount, delivered) = match item.order {
            BuildOrder::Upgrade { .. } => (None, 0),
            BuildOrder::Units {
                amount, delivered, ..
            } => (Some(amount), delivered),
        };
        Ok(QueueItemView {
            id: item.id,
            object: item.object,
            machine_name: def.machine_name.clone(),
            status: item.status,
            target_level: item.target_level(),
            amount,
            delivered,
            start: item.start,
            finish: item.finish,
            planet: item.planet,
        })
    }

    fn object_view(
        &self,
        def: &ObjectDefinition,
        planet: &Planet,
        player: &Player,
        resources: &Resources,
        profile: &ProductionProfile,
    ) -> ObjectView {
        let (level, queue, next) = match def.kind() {
            ObjectKind::Building => (
                planet.level(def.id),
                planet.queue(QueueKind::Buildings),
                u64::from(planet.next_building_level(def.id)),
            ),
            ObjectKind::Research => (
                player.research_level(def.id),
                Some(player.queue()),
                u64::from(player.next_research_level(def.id)),
            ),
            ObjectKind::Unit => (
                planet.level(def.id),
                planet.queue(def.category.queue()),
                u64::from(planet.units_including_queued(def.id)) + 1,
            ),
        };
        let queue_finish = queue.and_then(|q| q.finish_for(def.id));

        let cost = match def.kind() {
            ObjectKind::Unit => def.cost_at(0),
            _ => def.cost_at(u32::try_from(next.saturating_sub(1)).unwrap_or(u32::MAX)),
        };
        let energy_ok = cost.energy() <= Amount::ZERO || cost.energy() <= profile.energy_balance();
        let buildable = next <= u64::from(def.max_level)
            && self
                .catalog()
                .prerequisites_met(def, planet.levels(), player.research())
            && resources.covers(&cost)
            && energy_ok;

        ObjectView {
            id: def.id,
            machine_name: def.machine_name.clone(),
            title: def.title.clone(),
            category: def.category,
            level,
            in_queue: queue_finish.is_some(),
            queue_finish,
            buildable,
        }
    }
}
