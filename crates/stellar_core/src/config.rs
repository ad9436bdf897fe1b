//! Engine tuning: economy speed, queue caps and cancel refunds.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::production::QueueKind;

/// Maximum number of items per queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueLimits {
    /// Building items per planet (resources and facilities share one queue).
    pub buildings: usize,
    /// Research items per player.
    pub research: usize,
    /// Shipyard items per planet.
    pub shipyard: usize,
    /// Defense items per planet.
    pub defense: usize,
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self {
            buildings: 1,
            research: 1,
            shipyard: 10,
            defense: 10,
        }
    }
}

impl QueueLimits {
    /// Cap for one queue.
    #[must_use]
    pub const fn limit(&self, queue: QueueKind) -> usize {
        match queue {
            QueueKind::Buildings => self.buildings,
            QueueKind::Research => self.research,
            QueueKind::Shipyard => self.shipyard,
            QueueKind::Defense => self.defense,
        }
    }
}

/// Engine configuration.
///
/// # Example RON
///
/// ```ron
/// EngineConfig(
///     economy_speed: 2,
///     queue_limits: (buildings: 5),
///     in_progress_refund_percent: 50,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Multiplies production and divides build times.
    pub economy_speed: u32,
    /// Queue caps.
    pub queue_limits: QueueLimits,
    /// Share of the undelivered cost refunded when an in-progress item is
    /// cancelled. Pending items are always refunded in full.
    pub in_progress_refund_percent: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            economy_speed: 1,
            queue_limits: QueueLimits::default(),
            in_progress_refund_percent: 0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from RON text.
    pub fn from_ron(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: "engine config".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.economy_speed == 0 {
            return Err(GameError::InvalidConfig(
                "economy_speed must be at least 1".into(),
            ));
        }
        if self.in_progress_refund_percent > 100 {
            return Err(GameError::InvalidConfig(format!(
                "in_progress_refund_percent is {} (maximum 100)",
                self.in_progress_refund_percent
            )));
        }
        for queue in QueueKind::ALL {
            if self.queue_limits.limit(queue) == 0 {
                return Err(GameError::InvalidConfig(format!(
                    "{queue} queue limit must be at least 1"
                )));
            }
        }
        Ok(())
    }
}
