//! Build queues: timed construction of buildings, research and units.
//!
//! A queue is an ordered list of items with precomputed start and finish
//! timestamps. Nothing runs in the background: [`BuildQueue::advance`] is
//! called with the current time and completes every item whose finish has
//! passed, emitting [`ProductionEvent`]s for the caller to apply.
//!
//! Items run one after another. Only the head can be in progress; every
//! later item starts when its predecessor finishes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::catalog::ObjectId;
use crate::clock::Timestamp;
use crate::error::{GameError, Result};
use crate::planet::PlanetId;
use crate::resources::Resources;

/// Identifier of a queue item, unique per queue owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueueItemId(pub u64);

impl QueueItemId {
    /// Create a new queue item ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for QueueItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The four queues of the game.
///
/// Buildings, shipyard and defense queues live on a planet. The research
/// queue lives on the player and is shared by all of their planets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    /// Resource and facility buildings.
    Buildings,
    /// Technologies.
    Research,
    /// Ships.
    Shipyard,
    /// Planetary defense.
    Defense,
}

impl QueueKind {
    /// Every queue kind.
    pub const ALL: [Self; 4] = [Self::Buildings, Self::Research, Self::Shipyard, Self::Defense];

    /// Lowercase name used in machine-readable output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buildings => "buildings",
            Self::Research => "research",
            Self::Shipyard => "shipyard",
            Self::Defense => "defense",
        }
    }
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a queue item.
///
/// Queues only ever hold `Pending` and `InProgress` items; the terminal
/// states are reported through [`ProductionEvent`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Waiting for the item ahead of it.
    Pending,
    /// Being built.
    InProgress,
    /// Effect applied and removed from the queue.
    Completed,
    /// Removed from the queue before completion.
    Cancelled,
}

/// What a queue item produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildOrder {
    /// Raise a building or research to `target_level`.
    Upgrade {
        /// Level reached on completion.
        target_level: u32,
    },
    /// Build `amount` ships or defense units, delivered one by one.
    Units {
        /// Units ordered.
        amount: u32,
        /// Units already handed over to the planet.
        delivered: u32,
        /// Seconds per unit.
        unit_duration: u64,
    },
}

/// An entry in a build queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildQueueItem {
    /// Identifier, unique per queue owner.
    pub id: QueueItemId,
    /// Object being built.
    pub object: ObjectId,
    /// Level or units produced.
    pub order: BuildOrder,
    /// Resources deducted when the item was queued.
    pub cost: Resources,
    /// Scheduled start.
    pub start: Timestamp,
    /// Scheduled finish.
    pub finish: Timestamp,
    /// `Pending` or `InProgress`.
    pub status: ItemStatus,
    /// Planet the item was queued from.
    pub planet: PlanetId,
}

impl BuildQueueItem {
    /// Seconds between start and finish.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.finish.since(self.start)
    }

    /// Target level for upgrades.
    #[must_use]
    pub const fn target_level(&self) -> Option<u32> {
        match self.order {
            BuildOrder::Upgrade { target_level } => Some(target_level),
            BuildOrder::Units { .. } => None,
        }
    }

    /// Units ordered but not yet delivered.
    #[must_use]
    pub const fn undelivered(&self) -> u32 {
        match self.order {
            BuildOrder::Upgrade { .. } => 0,
            BuildOrder::Units {
                amount, delivered, ..
            } => amount.saturating_sub(delivered),
        }
    }

    /// Resources returned if this item is cancelled at `now`.
    ///
    /// Pending items are refunded in full. In-progress items refund
    /// `in_progress_percent` of the cost of whatever is not yet delivered.
    #[must_use]
    pub fn refund(&self, now: Timestamp, in_progress_percent: u8) -> Resources {
        if self.start > now {
            return self.cost;
        }
        let percent = u64::from(in_progress_percent);
        match self.order {
            BuildOrder::Upgrade { .. } => self.cost.portion(percent, 100),
            BuildOrder::Units { amount, .. } => self.cost.portion(
                u64::from(self.undelivered()) * percent,
                u64::from(amount) * 100,
            ),
        }
    }
}

/// Events generated by queue transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionEvent {
    /// An item was added to a queue.
    Queued {
        /// Queue the item was added to.
        queue: QueueKind,
        /// The new item.
        item: QueueItemId,
        /// Object being built.
        object: ObjectId,
        /// Scheduled start.
        start: Timestamp,
        /// Scheduled finish.
        finish: Timestamp,
    },
    /// An item became the one in progress.
    Started {
        /// Queue of the item.
        queue: QueueKind,
        /// The item.
        item: QueueItemId,
        /// Object being built.
        object: ObjectId,
        /// When work began.
        at: Timestamp,
    },
    /// Units of an item were handed over.
    UnitsDelivered {
        /// Queue of the item.
        queue: QueueKind,
        /// The item.
        item: QueueItemId,
        /// Unit type.
        object: ObjectId,
        /// Units delivered by this event.
        amount: u32,
        /// When the last of these units finished.
        at: Timestamp,
    },
    /// An item finished and left the queue.
    Completed {
        /// Queue of the item.
        queue: QueueKind,
        /// The item.
        item: QueueItemId,
        /// Object built.
        object: ObjectId,
        /// Level reached, for upgrades.
        level: Option<u32>,
        /// Scheduled finish.
        at: Timestamp,
    },
    /// An item was cancelled and left the queue.
    Cancelled {
        /// Queue of the item.
        queue: QueueKind,
        /// The item.
        item: QueueItemId,
        /// Object that will not be built.
        object: ObjectId,
        /// Resources returned.
        refund: Resources,
    },
}

/// Outcome of cancelling an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    /// Items removed: the requested one first, then any later items that
    /// depended on it.
    pub removed: Vec<BuildQueueItem>,
    /// Total refund.
    pub refund: Resources,
    /// Events describing the removal and any re-based starts.
    pub events: Vec<ProductionEvent>,
}

/// One ordered build queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildQueue {
    kind: QueueKind,
    items: VecDeque<BuildQueueItem>,
}

impl BuildQueue {
    /// Create an empty queue.
    #[must_use]
    pub const fn new(kind: QueueKind) -> Self {
        Self {
            kind,
            items: VecDeque::new(),
        }
    }

    /// Which queue this is.
    #[must_use]
    pub const fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue holds `limit` or more items.
    #[must_use]
    pub fn is_full(&self, limit: usize) -> bool {
        self.items.len() >= limit
    }

    /// Items in build order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildQueueItem> {
        self.items.iter()
    }

    /// The item currently being built, or next to be built.
    #[must_use]
    pub fn head(&self) -> Option<&BuildQueueItem> {
        self.items.front()
    }

    /// Look up an item.
    #[must_use]
    pub fn get(&self, id: QueueItemId) -> Option<&BuildQueueItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Check if any item builds one of `objects`.
    #[must_use]
    pub fn contains_any(&self, objects: &[ObjectId]) -> bool {
        self.items.iter().any(|item| objects.contains(&item.object))
    }

    /// Highest level queued for `object`.
    #[must_use]
    pub fn highest_target(&self, object: ObjectId) -> Option<u32> {
        self.items
            .iter()
            .filter(|item| item.object == object)
            .filter_map(BuildQueueItem::target_level)
            .max()
    }

    /// Units of `object` ordered but not yet delivered.
    #[must_use]
    pub fn undelivered_units(&self, object: ObjectId) -> u32 {
        self.items
            .iter()
            .filter(|item| item.object == object)
            .map(BuildQueueItem::undelivered)
            .fold(0, u32::saturating_add)
    }

    /// Latest finish among the items building `object`.
    #[must_use]
    pub fn finish_for(&self, object: ObjectId) -> Option<Timestamp> {
        self.items
            .iter()
            .filter(|item| item.object == object)
            .map(|item| item.finish)
            .max()
    }

    /// Finish of the last item, when the queue frees up.
    #[must_use]
    pub fn last_finish(&self) -> Option<Timestamp> {
        self.items.back().map(|item| item.finish)
    }

    /// Finish of the head item, the next instant [`advance`](Self::advance)
    /// has work to do.
    #[must_use]
    pub fn next_completion(&self) -> Option<Timestamp> {
        self.items.front().map(|item| item.finish)
    }

    /// Next instant at which [`advance`](Self::advance) hands something
    /// over: the head's next unit, or its finish for upgrades.
    #[must_use]
    pub fn next_delivery(&self) -> Option<Timestamp> {
        let head = self.items.front()?;
        match head.order {
            BuildOrder::Upgrade { .. } => Some(head.finish),
            BuildOrder::Units {
                delivered,
                unit_duration,
                ..
            } => {
                let next = head
                    .start
                    .plus((u64::from(delivered) + 1).saturating_mul(unit_duration.max(1)));
                Some(next.min(head.finish))
            }
        }
    }

    /// Start and finish for a new item of `duration` seconds queued at `now`.
    #[must_use]
    pub fn schedule(&self, now: Timestamp, duration: u64) -> (Timestamp, Timestamp) {
        let start = self.last_finish().map_or(now, |last| last.max(now));
        (start, start.plus(duration))
    }

    /// Append an item whose start and finish came from
    /// [`schedule`](Self::schedule). Its status is derived from `now`.
    pub fn push(&mut self, mut item: BuildQueueItem, now: Timestamp) -> ProductionEvent {
        item.status = if item.start <= now {
            ItemStatus::InProgress
        } else {
            ItemStatus::Pending
        };
        tracing::debug!(
            queue = %self.kind,
            item = %item.id,
            object = %item.object,
            start = %item.start,
            finish = %item.finish,
            status = ?item.status,
            "queued"
        );
        let event = ProductionEvent::Queued {
            queue: self.kind,
            item: item.id,
            object: item.object,
            start: item.start,
            finish: item.finish,
        };
        self.items.push_back(item);
        event
    }

    /// Bring the queue up to `now`.
    ///
    /// Delivers finished units, completes and removes every item whose
    /// finish is at or before `now`, and promotes the next item. Calling it
    /// twice with the same `now` emits nothing the second time.
    pub fn advance(&mut self, now: Timestamp) -> Vec<ProductionEvent> {
        let mut events = Vec::new();
        let mut previous_finish: Option<Timestamp> = None;

        while let Some(head) = self.items.front_mut() {
            if let Some(previous) = previous_finish {
                if head.start < previous {
                    let duration = head.duration();
                    head.start = previous;
                    head.finish = previous.plus(duration);
                }
            }
            if head.start > now {
                break;
            }
            if head.status == ItemStatus::Pending {
                head.status = ItemStatus::InProgress;
                tracing::debug!(queue = %self.kind, item = %head.id, at = %head.start, "started");
                events.push(ProductionEvent::Started {
                    queue: self.kind,
                    item: head.id,
                    object: head.object,
                    at: head.start,
                });
            }

            if let BuildOrder::Units {
                amount,
                ref mut delivered,
                unit_duration,
            } = head.order
            {
                let elapsed = now.since(head.start);
                let done = u32::try_from(elapsed / unit_duration.max(1))
                    .unwrap_or(u32::MAX)
                    .min(amount);
                if done > *delivered {
                    let fresh = done - *delivered;
                    *delivered = done;
                    events.push(ProductionEvent::UnitsDelivered {
                        queue: self.kind,
                        item: head.id,
                        object: head.object,
                        amount: fresh,
                        at: head.start.plus(u64::from(done) * unit_duration),
                    });
                }
            }

            if head.finish > now {
                break;
            }

            let finished = head.finish;
            if let Some(done) = self.items.pop_front() {
                tracing::debug!(queue = %self.kind, item = %done.id, at = %done.finish, "completed");
                events.push(ProductionEvent::Completed {
                    queue: self.kind,
                    item: done.id,
                    object: done.object,
                    level: done.target_level(),
                    at: done.finish,
                });
            }
            previous_finish = Some(finished);
        }

        events
    }

    /// Remove an item, and any later upgrade of the same object, and
    /// re-base what follows.
    ///
    /// The queue must have been advanced to `now` first so that delivered
    /// units are not refunded.
    pub fn cancel(
        &mut self,
        id: QueueItemId,
        now: Timestamp,
        in_progress_refund_percent: u8,
    ) -> Result<Cancellation> {
        let position = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(GameError::ItemNotFound(id))?;

        let target = &self.items[position];
        let object = target.object;
        let cascades = matches!(target.order, BuildOrder::Upgrade { .. });

        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.items.len());
        for (index, item) in std::mem::take(&mut self.items).into_iter().enumerate() {
            let remove =
                index == position || (cascades && index > position && item.object == object);
            if remove {
                removed.push(item);
            } else {
                kept.push_back(item);
            }
        }
        self.items = kept;

        let mut events = Vec::with_capacity(removed.len());
        let mut refund = Resources::ZERO;
        for (index, item) in removed.iter().enumerate() {
            // Only the requested item can be in progress; dependents are refunded in full.
            let item_refund = if index == 0 {
                item.refund(now, in_progress_refund_percent)
            } else {
                item.cost
            };
            refund = refund + item_refund;
            tracing::debug!(queue = %self.kind, item = %item.id, refund = %item_refund, "cancelled");
            events.push(ProductionEvent::Cancelled {
                queue: self.kind,
                item: item.id,
                object: item.object,
                refund: item_refund,
            });
        }

        events.extend(self.rebase(position, now));
        Ok(Cancellation {
            removed,
            refund,
            events,
        })
    }

    /// Pull items from `from` onward forward so each starts at
    /// `max(now, previous finish)`, keeping durations.
    fn rebase(&mut self, from: usize, now: Timestamp) -> Vec<ProductionEvent> {
        let mut events = Vec::new();
        for index in from..self.items.len() {
            let previous = index
                .checked_sub(1)
                .and_then(|prev| self.items.get(prev))
                .map_or(now, |prev| prev.finish.max(now));
            let Some(item) = self.items.get_mut(index) else {
                break;
            };
            if item.status != ItemStatus::Pending || item.start <= previous {
                continue;
            }
            let duration = item.duration();
            item.start = previous;
            item.finish = previous.plus(duration);
            if item.start <= now {
                item.status = ItemStatus::InProgress;
                events.push(ProductionEvent::Started {
                    queue: self.kind,
                    item: item.id,
                    object: item.object,
                    at: item.start,
                });
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANET: PlanetId = PlanetId(1);
    const MINE: ObjectId = ObjectId(1);
    const LAB: ObjectId = ObjectId(31);
    const FIGHTER: ObjectId = ObjectId(204);

    fn t(secs: u64) -> Timestamp {
        Timestamp(secs)
    }

    fn queue_upgrade(
        queue: &mut BuildQueue,
        id: u64,
        object: ObjectId,
        level: u32,
        duration: u64,
        now: Timestamp,
    ) {
        let (start, finish) = queue.schedule(now, duration);
        queue.push(
            BuildQueueItem {
                id: QueueItemId(id),
                object,
                order: BuildOrder::Upgrade {
                    target_level: level,
                },
                cost: Resources::new(100, 50, 0, 0),
                start,
                finish,
                status: ItemStatus::Pending,
                planet: PLANET,
            },
            now,
        );
    }

    fn queue_units(queue: &mut BuildQueue, id: u64, amount: u32, unit_duration: u64, now: Timestamp) {
        let (start, finish) = queue.schedule(now, unit_duration * u64::from(amount));
        queue.push(
            BuildQueueItem {
                id: QueueItemId(id),
                object: FIGHTER,
                order: BuildOrder::Units {
                    amount,
                    delivered: 0,
                    unit_duration,
                },
                cost: Resources::new(3000, 1000, 0, 0).times(amount),
                start,
                finish,
                status: ItemStatus::Pending,
                planet: PLANET,
            },
            now,
        );
    }

    #[test]
    fn test_queue_item_id_display() {
        assert_eq!(QueueItemId::new(7).to_string(), "#7");
        assert_eq!(QueueKind::Shipyard.to_string(), "shipyard");
    }

    #[test]
    fn test_schedule_chains_items() {
        let mut queue = BuildQueue::new(QueueKind::Buildings);
        queue_upgrade(&mut queue, 1, MINE, 1, 60, t(100));
        queue_upgrade(&mut queue, 2, MINE, 2, 90, t(110));

        let items: Vec<_> = queue.iter().collect();
        assert_eq!(items[0].start, t(100));
        assert_eq!(items[0].finish, t(160));
        assert_eq!(items[0].status, ItemStatus::InProgress);
        assert_eq!(items[1].start, t(160));
        assert_eq!(items[1].finish, t(250));
        assert_eq!(items[1].status, ItemStatus::Pending);
        assert_eq!(queue.highest_target(MINE), Some(2));
        assert_eq!(queue.finish_for(MINE), Some(t(250)));
        assert_eq!(queue.last_finish(), Some(t(250)));
    }

    #[test]
    fn test_schedule_after_idle_gap_starts_now() {
        let mut queue = BuildQueue::new(QueueKind::Buildings);
        queue_upgrade(&mut queue, 1, MINE, 1, 60, t(0));
        // Nothing advanced yet, but the last finish is in the past.
        assert_eq!(queue.schedule(t(500), 10), (t(500), t(510)));
    }

    #[test]
    fn test_advance_completes_in_order() {
        let mut queue = BuildQueue::new(QueueKind::Buildings);
        queue_upgrade(&mut queue, 1, MINE, 1, 60, t(0));
        queue_upgrade(&mut queue, 2, LAB, 1, 60, t(0));

        assert!(queue.advance(t(59)).is_empty());

        let events = queue.advance(t(60));
        assert_eq!(
            events,
            vec![
                ProductionEvent::Completed {
                    queue: QueueKind::Buildings,
                    item: QueueItemId(1),
                    object: MINE,
                    level: Some(1),
                    at: t(60),
                },
                ProductionEvent::Started {
                    queue: QueueKind::Buildings,
                    item: QueueItemId(2),
                    object: LAB,
                    at: t(60),
                },
            ]
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.head().map(|item| item.status), Some(ItemStatus::InProgress));
    }

    #[test]
    fn test_advance_is_idempotent() {
        let mut queue = BuildQueue::new(QueueKind::Buildings);
        queue_upgrade(&mut queue, 1, MINE, 1, 60, t(0));
        queue_upgrade(&mut queue, 2, MINE, 2, 60, t(0));

        let first = queue.advance(t(1_000));
        assert_eq!(first.len(), 3);
        let snapshot = queue.clone();
        assert!(queue.advance(t(1_000)).is_empty());
        assert_eq!(queue, snapshot);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_units_delivered_progressively() {
        let mut queue = BuildQueue::new(QueueKind::Shipyard);
        queue_units(&mut queue, 1, 5, 10, t(0));

        let events = queue.advance(t(25));
        assert_eq!(
            events,
            vec![ProductionEvent::UnitsDelivered {
                queue: QueueKind::Shipyard,
                item: QueueItemId(1),
                object: FIGHTER,
                amount: 2,
                at: t(20),
            }]
        );
        assert_eq!(queue.undelivered_units(FIGHTER), 3);

        let events = queue.advance(t(50));
        assert!(matches!(
            events[0],
            ProductionEvent::UnitsDelivered { amount: 3, .. }
        ));
        assert!(matches!(
            events[1],
            ProductionEvent::Completed { level: None, .. }
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_next_delivery_steps_unit_by_unit() {
        let mut queue = BuildQueue::new(QueueKind::Shipyard);
        assert_eq!(queue.next_delivery(), None);
        queue_units(&mut queue, 1, 3, 10, t(0));
        assert_eq!(queue.next_delivery(), Some(t(10)));

        queue.advance(t(15));
        assert_eq!(queue.next_delivery(), Some(t(20)));

        let mut buildings = BuildQueue::new(QueueKind::Buildings);
        queue_upgrade(&mut buildings, 1, MINE, 1, 60, t(0));
        assert_eq!(buildings.next_delivery(), Some(t(60)));
    }

    #[test]
    fn test_cancel_pending_refunds_in_full() {
        let mut queue = BuildQueue::new(QueueKind::Shipyard);
        queue_units(&mut queue, 1, 1, 60, t(0));
        queue_units(&mut queue, 2, 2, 60, t(0));

        let outcome = queue.cancel(QueueItemId(2), t(10), 0).unwrap();
        assert_eq!(outcome.refund, Resources::new(6000, 2000, 0, 0));
        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cancel_in_progress_uses_policy() {
        let mut queue = BuildQueue::new(QueueKind::Buildings);
        queue_upgrade(&mut queue, 1, MINE, 1, 60, t(0));
        let none = queue.clone().cancel(QueueItemId(1), t(30), 0).unwrap();
        assert_eq!(none.refund, Resources::ZERO);

        let half = queue.cancel(QueueItemId(1), t(30), 50).unwrap();
        assert_eq!(half.refund, Resources::new(50, 25, 0, 0));
    }

    #[test]
    fn test_cancel_in_progress_units_refunds_undelivered_part() {
        let mut queue = BuildQueue::new(QueueKind::Shipyard);
        queue_units(&mut queue, 1, 4, 10, t(0));
        queue.advance(t(25));

        let outcome = queue.cancel(QueueItemId(1), t(25), 100).unwrap();
        // Two of four delivered.
        assert_eq!(outcome.refund, Resources::new(6000, 2000, 0, 0));
    }

    #[test]
    fn test_cancel_cascades_to_later_levels_and_rebases() {
        let mut queue = BuildQueue::new(QueueKind::Buildings);
        queue_upgrade(&mut queue, 1, MINE, 1, 60, t(0));
        queue_upgrade(&mut queue, 2, LAB, 1, 100, t(0));
        queue_upgrade(&mut queue, 3, MINE, 2, 60, t(0));

        let outcome = queue.cancel(QueueItemId(1), t(20), 0).unwrap();
        let ids: Vec<_> = outcome.removed.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![QueueItemId(1), QueueItemId(3)]);
        // In-progress level refunds nothing, the dependent level refunds everything.
        assert_eq!(outcome.refund, Resources::new(100, 50, 0, 0));

        let lab = queue.head().unwrap();
        assert_eq!(lab.id, QueueItemId(2));
        assert_eq!(lab.start, t(20));
        assert_eq!(lab.finish, t(120));
        assert_eq!(lab.status, ItemStatus::InProgress);
    }

    #[test]
    fn test_cancel_unknown_item() {
        let mut queue = BuildQueue::new(QueueKind::Buildings);
        assert_eq!(
            queue.cancel(QueueItemId(9), t(0), 0).unwrap_err(),
            GameError::ItemNotFound(QueueItemId(9))
        );
    }

    #[test]
    fn test_cancelled_item_never_completes() {
        let mut queue = BuildQueue::new(QueueKind::Buildings);
        queue_upgrade(&mut queue, 1, MINE, 1, 60, t(0));
        queue.cancel(QueueItemId(1), t(10), 0).unwrap();
        assert!(queue.advance(t(10_000)).is_empty());
    }
}
