//! Resource ledger and production profiles.
//!
//! A planet's stock is stored as of a checkpoint. The current stock is the
//! stored amount plus production since the checkpoint, capped at storage
//! capacity. Every mutation first moves the checkpoint to the mutation
//! instant, so elapsed time is never counted twice.
//!
//! All calculations use fixed-point math for deterministic accrual.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Levels, ObjectId, ObjectKind};
use crate::clock::Timestamp;
use crate::data::ObjectEffect;
use crate::error::{GameError, Result};
use crate::math::{compound, exp, mul_div, per_hour_over, Amount, Ratio};
use crate::resources::{ResourceKind, Resources};

/// Income every planet receives regardless of buildings, per hour.
pub const BASE_INCOME: Resources = Resources::from_amounts(
    Amount::const_from_int(30),
    Amount::const_from_int(15),
    Amount::ZERO,
    Amount::ZERO,
);

/// Highest production setting, in tenths.
pub const MAX_PRODUCTION_PERCENT: u8 = 10;

/// Storage capacity of a resource with its store at `level`:
/// `5000 * floor(2.5 * e^(20 * level / 33))`.
#[must_use]
pub fn storage_capacity(level: u32) -> Amount {
    let growth = exp(Ratio::saturating_from_num(level).saturating_mul_int(20) / 33);
    let multiple = growth.saturating_mul(Ratio::from_num(2.5)).floor();
    Amount::saturating_from_num(multiple).saturating_mul(Amount::const_from_int(5000))
}

/// Per-building production settings in tenths (0 = off, 10 = full).
///
/// Buildings without an entry run at full production.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionPercents(BTreeMap<ObjectId, u8>);

impl ProductionPercents {
    /// Create settings with everything at full production.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Setting for `object`.
    #[must_use]
    pub fn get(&self, object: ObjectId) -> u8 {
        self.0
            .get(&object)
            .copied()
            .unwrap_or(MAX_PRODUCTION_PERCENT)
    }

    /// Change the setting for `object`; `tenths` must be 0..=10.
    pub fn set(&mut self, object: ObjectId, tenths: u8) -> Result<()> {
        if tenths > MAX_PRODUCTION_PERCENT {
            return Err(GameError::InvalidLevel {
                object: format!("#{object} production"),
                level: i64::from(tenths),
            });
        }
        if tenths == MAX_PRODUCTION_PERCENT {
            self.0.remove(&object);
        } else {
            self.0.insert(object, tenths);
        }
        Ok(())
    }
}

/// Everything production depends on.
#[derive(Debug, Clone, Copy)]
pub struct EconomyInputs<'a> {
    /// Building levels and unit counts on the planet.
    pub levels: &'a Levels,
    /// Production settings on the planet.
    pub percents: &'a ProductionPercents,
    /// The owner's research levels.
    pub research: &'a Levels,
    /// Maximum planet temperature in degrees.
    pub max_temperature: i32,
    /// Economy speed multiplier.
    pub economy_speed: u32,
}

/// Hourly production, energy balance and storage of a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionProfile {
    /// Net metal, crystal and deuterium per hour. The energy field holds
    /// the net energy balance.
    pub per_hour: Resources,
    /// Storage capacity of metal, crystal and deuterium.
    pub capacity: Resources,
    /// Energy produced by plants and satellites.
    #[serde(with = "crate::math::amount_serde")]
    pub energy_production: Amount,
    /// Energy required by mines.
    #[serde(with = "crate::math::amount_serde")]
    pub energy_consumption: Amount,
    /// Share of mine output actually produced, 1 unless energy is short.
    #[serde(with = "crate::math::ratio_serde")]
    pub production_factor: Ratio,
}

impl ProductionProfile {
    /// Net energy: production minus consumption. Negative in a deficit.
    #[must_use]
    pub fn energy_balance(&self) -> Amount {
        self.energy_production.saturating_sub(self.energy_consumption)
    }

    /// Compute the profile of a planet.
    ///
    /// Mine output (not base income) is throttled by
    /// `energy_production / energy_consumption` when energy is short.
    /// Resource rates are multiplied by the economy speed; energy is not.
    #[must_use]
    pub fn compute(catalog: &Catalog, inputs: &EconomyInputs<'_>) -> Self {
        let research_level = |predicate: fn(&ObjectEffect) -> bool| {
            catalog
                .find_by_effect(predicate)
                .map_or(0, |def| inputs.research.get(def.id))
        };
        let energy_technology = research_level(|e| matches!(e, ObjectEffect::EnergyTechnology));
        let plasma = u64::from(research_level(|e| matches!(e, ObjectEffect::PlasmaBonus)));

        let mut mines = Resources::ZERO;
        let mut upkeep = Amount::ZERO;
        let mut energy_production = Amount::ZERO;
        let mut energy_consumption = Amount::ZERO;
        let mut capacity = Resources::ZERO;
        for kind in ResourceKind::STORABLE {
            capacity = capacity.with(kind, storage_capacity(0));
        }

        for def in catalog.iter() {
            if def.kind() == ObjectKind::Research {
                continue;
            }
            let level = inputs.levels.get(def.id);
            if level == 0 {
                continue;
            }
            let tenths = u64::from(inputs.percents.get(def.id));
            // base * L * (percent / 100)^L * tenths / 10
            let curve = |base: u32, percent: u32| {
                let start = Amount::from_num(base).saturating_mul(Amount::from_num(level));
                mul_div(compound(start, percent, level), tenths, 10)
            };

            for effect in &def.effects {
                match *effect {
                    ObjectEffect::Produces { resource, base } => {
                        let mut output = curve(base, 110);
                        if resource == ResourceKind::Deuterium {
                            let factor = (1440 - 4 * i64::from(inputs.max_temperature)).max(0);
                            output = mul_div(output, factor.unsigned_abs(), 1000);
                        }
                        let (bonus, denominator) = match resource {
                            ResourceKind::Metal => (100 * plasma, 10_000),
                            ResourceKind::Crystal => (66 * plasma, 10_000),
                            ResourceKind::Deuterium => (33 * plasma, 10_000),
                            ResourceKind::Energy => (0, 10_000),
                        };
                        output = mul_div(output, denominator + bonus, denominator).floor();
                        mines = mines.with(resource, mines.get(resource).saturating_add(output));
                    }
                    ObjectEffect::ConsumesEnergy { base } => {
                        energy_consumption =
                            energy_consumption.saturating_add(curve(base, 110).floor());
                    }
                    ObjectEffect::ProducesEnergy { base } => {
                        energy_production =
                            energy_production.saturating_add(curve(base, 110).floor());
                    }
                    ObjectEffect::FusionEnergy {
                        base,
                        deuterium_upkeep,
                    } => {
                        let percent = 105u32.saturating_add(energy_technology);
                        energy_production =
                            energy_production.saturating_add(curve(base, percent).floor());
                        upkeep = upkeep.saturating_add(curve(deuterium_upkeep, 110).floor());
                    }
                    ObjectEffect::SolarSatellite => {
                        let each = ((i64::from(inputs.max_temperature) + 140) / 6).max(0);
                        let total = mul_div(
                            Amount::saturating_from_num(each),
                            u64::from(level) * tenths,
                            10,
                        );
                        energy_production = energy_production.saturating_add(total.floor());
                    }
                    ObjectEffect::Storage { resource } => {
                        capacity = capacity.with(resource, storage_capacity(level));
                    }
                    ObjectEffect::BuildingSpeed
                    | ObjectEffect::NaniteSpeed
                    | ObjectEffect::ShipyardSpeed
                    | ObjectEffect::ResearchSpeed
                    | ObjectEffect::PlasmaBonus
                    | ObjectEffect::EnergyTechnology => {}
                }
            }
        }

        let production_factor = if energy_consumption > energy_production {
            Ratio::saturating_from_num(energy_production)
                / Ratio::saturating_from_num(energy_consumption)
        } else {
            Ratio::ONE
        };

        let speed = inputs.economy_speed.max(1);
        let throttled = mines.scale(production_factor).floor();
        let per_hour = (BASE_INCOME + throttled)
            .with(
                ResourceKind::Deuterium,
                throttled.deuterium().saturating_sub(upkeep),
            )
            .times(speed)
            .with(
                ResourceKind::Energy,
                energy_production.saturating_sub(energy_consumption),
            );

        Self {
            per_hour,
            capacity,
            energy_production,
            energy_consumption,
            production_factor,
        }
    }
}

/// Stored resources of one planet as of a checkpoint.
///
/// The energy component of the stored amount is always zero; energy is a
/// balance reported from the production profile, not a stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    stored: Resources,
    checkpoint: Timestamp,
}

impl Ledger {
    /// Create a ledger holding `initial` at `at`.
    #[must_use]
    pub fn new(initial: Resources, at: Timestamp) -> Self {
        Self {
            stored: initial.without_energy(),
            checkpoint: at,
        }
    }

    /// Stock as of the checkpoint.
    #[must_use]
    pub const fn stored(&self) -> Resources {
        self.stored
    }

    /// Instant the stored amount refers to.
    #[must_use]
    pub const fn checkpoint(&self) -> Timestamp {
        self.checkpoint
    }

    /// Stock at `at` given production `profile`, without changing the ledger.
    ///
    /// Each storable resource stops growing at its capacity; a stock already
    /// above capacity keeps its overflow. Upkeep can drain deuterium to zero
    /// but not below. The energy field is the profile's energy balance.
    #[must_use]
    pub fn current_amount(&self, at: Timestamp, profile: &ProductionProfile) -> Resources {
        let elapsed = at.since(self.checkpoint);
        let mut current = self.stored;
        for kind in ResourceKind::STORABLE {
            let stored = self.stored.get(kind);
            let rate = profile.per_hour.get(kind);
            let cap = profile.capacity.get(kind);
            let gained = per_hour_over(rate, elapsed);
            let value = if rate >= Amount::ZERO {
                if stored >= cap {
                    stored
                } else {
                    stored.saturating_add(gained).min(cap)
                }
            } else {
                stored.saturating_add(gained).max(Amount::ZERO)
            };
            current = current.with(kind, value);
        }
        current.with(ResourceKind::Energy, profile.energy_balance())
    }

    /// Fold production up to `at` into the stored amount and move the
    /// checkpoint there. Instants before the checkpoint are ignored.
    pub fn accrue_to(&mut self, at: Timestamp, profile: &ProductionProfile) {
        if at <= self.checkpoint {
            return;
        }
        self.stored = self.current_amount(at, profile).without_energy();
        self.checkpoint = at;
    }

    /// Add resources at `at`.
    ///
    /// Without `allow_overflow` each resource saturates at capacity, and a
    /// stock already above capacity is left unchanged. Energy is ignored.
    pub fn add_resources(
        &mut self,
        delta: Resources,
        allow_overflow: bool,
        at: Timestamp,
        profile: &ProductionProfile,
    ) {
        self.accrue_to(at, profile);
        let mut stored = self.stored;
        for kind in ResourceKind::STORABLE {
            let current = stored.get(kind);
            let added = current.saturating_add(delta.get(kind));
            let value = if allow_overflow {
                added
            } else {
                let cap = profile.capacity.get(kind);
                if current >= cap {
                    current
                } else {
                    added.min(cap)
                }
            };
            stored = stored.with(kind, value);
        }
        self.stored = stored;
    }

    /// Deduct resources at `at`, all or nothing.
    ///
    /// Fails with [`GameError::InsufficientResources`] if metal, crystal or
    /// deuterium would go negative. Energy is not consumed.
    pub fn deduct_resources(
        &mut self,
        delta: Resources,
        at: Timestamp,
        profile: &ProductionProfile,
    ) -> Result<()> {
        let available = self.current_amount(at, profile).without_energy();
        let remaining = available.checked_sub(delta.without_energy())?;
        self.accrue_to(at, profile);
        self.stored = remaining;
        Ok(())
    }

    /// Overwrite the stock at `at`.
    pub fn set_resources(&mut self, resources: Resources, at: Timestamp) {
        self.stored = resources.without_energy();
        self.checkpoint = self.checkpoint.max(at);
    }
}
