//! Player-wide research levels and the player's research queue.
//!
//! Research is shared by all planets of a player, so its queue lives here
//! rather than on a planet. Only one research item runs per player.

use serde::{Deserialize, Serialize};

use crate::catalog::{Levels, ObjectId};
use crate::clock::Timestamp;
use crate::production::{BuildQueue, ProductionEvent, QueueItemId, QueueKind};

/// Unique identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A research level change and the instant it took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchChange {
    /// Research object.
    pub object: ObjectId,
    /// Level before the change.
    pub from: u32,
    /// Level after the change.
    pub to: u32,
    /// When the change took effect.
    pub at: Timestamp,
}

/// Research levels of one player, plus the recent changes that led to them.
///
/// Planets accrue resources lazily, so a planet whose checkpoint lies before
/// a research change must see the old levels up to that instant. The change
/// log lets [`levels_at`](Self::levels_at) reconstruct them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResearch {
    /// Owner.
    pub player: PlayerId,
    /// Level per research object.
    pub levels: Levels,
    /// Changes in time order.
    #[serde(default)]
    pub changes: Vec<ResearchChange>,
}

impl PlayerResearch {
    /// Levels in effect at `at`, counting changes made at exactly `at`.
    #[must_use]
    pub fn levels_at(&self, at: Timestamp) -> Levels {
        let mut levels = self.levels.clone();
        for change in self.changes.iter().rev().take_while(|c| c.at > at) {
            levels.set(change.object, change.from);
        }
        levels
    }

    /// First instant after `after` at which a level changed.
    #[must_use]
    pub fn next_change_after(&self, after: Timestamp) -> Option<Timestamp> {
        self.changes.iter().map(|c| c.at).find(|at| *at > after)
    }

    /// Set `object` to `level` from `at` on.
    pub(crate) fn record(&mut self, object: ObjectId, level: u32, at: Timestamp) {
        let from = self.levels.get(object);
        if from == level {
            return;
        }
        self.levels.set(object, level);
        let index = self.changes.partition_point(|c| c.at <= at);
        self.changes.insert(
            index,
            ResearchChange {
                object,
                from,
                to: level,
                at,
            },
        );
    }

    /// Drop changes at or before `at`. Only safe once no planet of the
    /// player has a ledger checkpoint before `at`.
    pub fn forget_changes_through(&mut self, at: Timestamp) {
        self.changes.retain(|c| c.at > at);
    }
}

/// A player: research levels plus the research queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    pub(crate) research: PlayerResearch,
    pub(crate) queue: BuildQueue,
    next_item_id: u64,
}

impl Player {
    /// Create a player with no research.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            research: PlayerResearch {
                player: id,
                levels: Levels::new(),
                changes: Vec::new(),
            },
            queue: BuildQueue::new(QueueKind::Research),
            next_item_id: 1,
        }
    }

    /// Set initial research levels.
    #[must_use]
    pub fn with_research(mut self, levels: impl IntoIterator<Item = (ObjectId, u32)>) -> Self {
        for (object, level) in levels {
            self.research.levels.set(object, level);
        }
        self
    }

    /// Research levels.
    #[must_use]
    pub const fn research(&self) -> &Levels {
        &self.research.levels
    }

    /// Research levels with their change log.
    #[must_use]
    pub const fn research_history(&self) -> &PlayerResearch {
        &self.research
    }

    /// Drop research changes no planet of this player still needs.
    pub fn forget_research_changes_through(&mut self, at: Timestamp) {
        self.research.forget_changes_through(at);
    }

    /// Level of one research object.
    #[must_use]
    pub fn research_level(&self, object: ObjectId) -> u32 {
        self.research.levels.get(object)
    }

    /// The research queue.
    #[must_use]
    pub const fn queue(&self) -> &BuildQueue {
        &self.queue
    }

    /// Level the next queued research of `object` would reach.
    #[must_use]
    pub fn next_research_level(&self, object: ObjectId) -> u32 {
        self.queue
            .highest_target(object)
            .unwrap_or(0)
            .max(self.research.levels.get(object))
            .saturating_add(1)
    }

    pub(crate) fn allocate_item_id(&mut self) -> QueueItemId {
        let id = QueueItemId(self.next_item_id);
        self.next_item_id += 1;
        id
    }

    /// Complete research finished by `now`.
    ///
    /// A completion never lowers a level that was raised directly while the
    /// item was queued.
    pub fn tick(&mut self, now: Timestamp) -> Vec<ProductionEvent> {
        let events = self.queue.advance(now);
        for event in &events {
            if let ProductionEvent::Completed {
                object,
                level: Some(level),
                at,
                ..
            } = *event
            {
                let level = level.max(self.research.levels.get(object));
                self.research.record(object, level, at);
            }
        }
        events
    }
}
