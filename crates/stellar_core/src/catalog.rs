//! Static object definitions: cost curves, build times and prerequisites.
//!
//! The catalog is loaded once from RON data, validated, and then only
//! read. Every mutating engine operation consults it for costs, times and
//! requirement checks.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::data::{CatalogData, Category, CombatStats, ObjectData, ObjectEffect};
use crate::error::{GameError, Result};
use crate::math::{compound, Amount, SECONDS_PER_HOUR};
use crate::production::QueueKind;
use crate::resources::Resources;

/// The standard catalog shipped with the engine.
const STANDARD_CATALOG: &str = include_str!("../data/catalog.ron");

/// Numeric identifier of a catalog object, as used by build requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Create a new object ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a completed queue item is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Planet level increment.
    Building,
    /// Player research level increment.
    Research,
    /// Planet unit count increment.
    Unit,
}

impl Category {
    /// Application rule for objects of this category.
    #[must_use]
    pub const fn kind(self) -> ObjectKind {
        match self {
            Self::Resources | Self::Facilities => ObjectKind::Building,
            Self::Research => ObjectKind::Research,
            Self::Shipyard | Self::Defense => ObjectKind::Unit,
        }
    }

    /// Queue that builds objects of this category.
    #[must_use]
    pub const fn queue(self) -> QueueKind {
        match self {
            Self::Resources | Self::Facilities => QueueKind::Buildings,
            Self::Research => QueueKind::Research,
            Self::Shipyard => QueueKind::Shipyard,
            Self::Defense => QueueKind::Defense,
        }
    }
}

/// Minimum level of another object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Required object.
    pub object: ObjectId,
    /// Minimum level (or unit count).
    pub level: u32,
}

/// Facility levels that shorten build times.
///
/// `research_lab` is read from the planet that starts the research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacilityLevels {
    /// Robotics factory level.
    pub robotics: u32,
    /// Nanite factory level.
    pub nanite: u32,
    /// Shipyard level.
    pub shipyard: u32,
    /// Research lab level.
    pub research_lab: u32,
}

/// Levels (or unit counts) keyed by object.
///
/// Missing entries read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Levels(BTreeMap<ObjectId, u32>);

impl Levels {
    /// Create an empty level map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of `object`, zero when never built.
    #[must_use]
    pub fn get(&self, object: ObjectId) -> u32 {
        self.0.get(&object).copied().unwrap_or(0)
    }

    /// Overwrite the level of `object`.
    pub fn set(&mut self, object: ObjectId, level: u32) {
        if level == 0 {
            self.0.remove(&object);
        } else {
            self.0.insert(object, level);
        }
    }

    /// Raise the level of `object` by `amount`, saturating.
    pub fn add(&mut self, object: ObjectId, amount: u32) {
        let level = self.get(object).saturating_add(amount);
        self.set(object, level);
    }

    /// Non-zero entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, u32)> + '_ {
        self.0.iter().map(|(&id, &level)| (id, level))
    }
}

impl FromIterator<(ObjectId, u32)> for Levels {
    fn from_iter<I: IntoIterator<Item = (ObjectId, u32)>>(iter: I) -> Self {
        let mut levels = Self::new();
        for (id, level) in iter {
            levels.set(id, level);
        }
        levels
    }
}

/// A validated catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDefinition {
    /// Numeric identifier.
    pub id: ObjectId,
    /// Stable string identifier.
    pub machine_name: String,
    /// Display name.
    pub title: String,
    /// Menu the object belongs to.
    pub category: Category,
    /// Cost of the first level, or of one unit.
    pub base_cost: Resources,
    /// Cost multiplier per level, in percent.
    pub cost_factor_percent: u32,
    /// Highest level (or unit count) allowed.
    pub max_level: u32,
    /// Requirements, resolved to ids.
    pub requirements: Vec<Requirement>,
    /// What the object does.
    pub effects: Vec<ObjectEffect>,
    /// Combat values for ships and defense.
    pub combat: Option<CombatStats>,
}

impl ObjectDefinition {
    /// Application rule for this object.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.category.kind()
    }

    /// Check if the object has an effect matching `predicate`.
    pub fn has_effect(&self, predicate: impl Fn(&ObjectEffect) -> bool) -> bool {
        self.effects.iter().any(predicate)
    }

    /// Cost of raising the object from `current_level` to the next level.
    ///
    /// `floor(base * factor^level)` per resource. Units always cost the
    /// base price per unit.
    #[must_use]
    pub fn cost_at(&self, current_level: u32) -> Resources {
        if self.kind() == ObjectKind::Unit {
            return self.base_cost;
        }
        let grow = |amount: Amount| {
            compound(amount, self.cost_factor_percent, current_level).floor()
        };
        Resources::from_amounts(
            grow(self.base_cost.metal()),
            grow(self.base_cost.crystal()),
            grow(self.base_cost.deuterium()),
            grow(self.base_cost.energy()),
        )
    }

    /// Build time in seconds for the level after `current_level`, or for a
    /// single unit.
    ///
    /// - buildings: `(metal + crystal) / (2500 * (1 + robotics) * 2^nanite)` hours
    /// - research: `(metal + crystal) / (1000 * (1 + lab))` hours
    /// - units: `(metal + crystal) / (2500 * (1 + shipyard) * 2^nanite)` hours
    ///
    /// The result is divided by the economy speed, floored, and never
    /// shorter than one second.
    #[must_use]
    pub fn build_time_at(
        &self,
        current_level: u32,
        facilities: &FacilityLevels,
        economy_speed: u32,
    ) -> u64 {
        let cost = self.cost_at(current_level);
        let work = u128::try_from(cost.metal_and_crystal().floor().to_num::<i64>()).unwrap_or(0);

        let nanite = 1u128.checked_shl(facilities.nanite).unwrap_or(u128::MAX);
        let divisor = match self.kind() {
            ObjectKind::Building => (1 + u128::from(facilities.robotics)).saturating_mul(nanite),
            ObjectKind::Research => 1 + u128::from(facilities.research_lab),
            ObjectKind::Unit => (1 + u128::from(facilities.shipyard)).saturating_mul(nanite),
        };
        let base = if self.kind() == ObjectKind::Research {
            1000
        } else {
            2500
        };
        let divisor = divisor
            .saturating_mul(base)
            .saturating_mul(u128::from(economy_speed.max(1)));

        let seconds = work.saturating_mul(u128::from(SECONDS_PER_HOUR)) / divisor;
        u64::try_from(seconds).unwrap_or(u64::MAX).max(1)
    }

    fn from_data(data: &ObjectData, ids: &HashMap<String, ObjectId>) -> Result<Self> {
        let requirements = data
            .requirements
            .iter()
            .map(|r| {
                ids.get(&r.object)
                    .map(|&object| Requirement {
                        object,
                        level: r.level,
                    })
                    .ok_or_else(|| {
                        GameError::InvalidCatalog(format!(
                            "{} requires unknown object {}",
                            data.machine_name, r.object
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: ObjectId(data.id),
            machine_name: data.machine_name.clone(),
            title: data.title.clone(),
            category: data.category,
            base_cost: Resources::new(
                i64::from(data.cost.metal),
                i64::from(data.cost.crystal),
                i64::from(data.cost.deuterium),
                i64::from(data.cost.energy),
            ),
            cost_factor_percent: data.cost_factor_percent,
            max_level: data.max_level.unwrap_or(u32::MAX),
            requirements,
            effects: data.effects.clone(),
            combat: data.combat,
        })
    }
}

/// Registry of every object the engine knows about.
#[derive(Debug, Clone)]
pub struct Catalog {
    definitions: BTreeMap<ObjectId, ObjectDefinition>,
    by_name: HashMap<String, ObjectId>,
}

impl Catalog {
    /// The catalog embedded in this crate.
    pub fn standard() -> Result<Self> {
        Self::from_ron_named(STANDARD_CATALOG, "catalog.ron")
    }

    /// Parse and validate a catalog from RON text.
    pub fn from_ron(source: &str) -> Result<Self> {
        Self::from_ron_named(source, "<inline>")
    }

    /// Parse and validate a catalog from RON text, naming `path` in errors.
    pub fn from_ron_named(source: &str, path: &str) -> Result<Self> {
        let data: CatalogData =
            ron::from_str(source).map_err(|e| GameError::DataParseError {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Self::from_data(&data)
    }

    /// Validate catalog data.
    ///
    /// Ids and machine names must be unique, every requirement must name a
    /// known object, cost factors may not shrink costs, and units must keep
    /// a flat per-unit price.
    pub fn from_data(data: &CatalogData) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(data.objects.len());
        let mut seen_ids = BTreeMap::new();
        for object in &data.objects {
            if let Some(other) = seen_ids.insert(object.id, &object.machine_name) {
                return Err(GameError::InvalidCatalog(format!(
                    "id {} used by both {other} and {}",
                    object.id, object.machine_name
                )));
            }
            if by_name
                .insert(object.machine_name.clone(), ObjectId(object.id))
                .is_some()
            {
                return Err(GameError::InvalidCatalog(format!(
                    "duplicate machine name {}",
                    object.machine_name
                )));
            }
            if object.cost_factor_percent < 100 {
                return Err(GameError::InvalidCatalog(format!(
                    "{} has cost factor {}% (minimum 100%)",
                    object.machine_name, object.cost_factor_percent
                )));
            }
            if object.is_unit() && object.cost_factor_percent != 100 {
                return Err(GameError::InvalidCatalog(format!(
                    "{} is a unit and must have cost factor 100%",
                    object.machine_name
                )));
            }
        }

        let definitions = data
            .objects
            .iter()
            .map(|object| {
                ObjectDefinition::from_data(object, &by_name).map(|def| (def.id, def))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        tracing::debug!(objects = definitions.len(), "catalog loaded");
        Ok(Self {
            definitions,
            by_name,
        })
    }

    /// Look up a definition by machine name.
    pub fn definition_for(&self, machine_name: &str) -> Result<&ObjectDefinition> {
        self.by_name
            .get(machine_name)
            .and_then(|id| self.definitions.get(id))
            .ok_or_else(|| GameError::UnknownObject(machine_name.to_string()))
    }

    /// Look up a definition by numeric id.
    pub fn definition(&self, id: ObjectId) -> Result<&ObjectDefinition> {
        self.definitions
            .get(&id)
            .ok_or_else(|| GameError::UnknownObject(format!("#{id}")))
    }

    /// Id of the object with this machine name, if any.
    #[must_use]
    pub fn id_of(&self, machine_name: &str) -> Option<ObjectId> {
        self.by_name.get(machine_name).copied()
    }

    /// First object carrying an effect matching `predicate`.
    pub fn find_by_effect(
        &self,
        predicate: impl Fn(&ObjectEffect) -> bool,
    ) -> Option<&ObjectDefinition> {
        self.definitions
            .values()
            .find(|def| def.effects.iter().any(&predicate))
    }

    /// All definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectDefinition> {
        self.definitions.values()
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Facility levels relevant to build times, read from planet levels.
    #[must_use]
    pub fn facility_levels(&self, planet_levels: &Levels) -> FacilityLevels {
        let level_of = |predicate: fn(&ObjectEffect) -> bool| {
            self.find_by_effect(predicate)
                .map_or(0, |def| planet_levels.get(def.id))
        };
        FacilityLevels {
            robotics: level_of(|e| matches!(e, ObjectEffect::BuildingSpeed)),
            nanite: level_of(|e| matches!(e, ObjectEffect::NaniteSpeed)),
            shipyard: level_of(|e| matches!(e, ObjectEffect::ShipyardSpeed)),
            research_lab: level_of(|e| matches!(e, ObjectEffect::ResearchSpeed)),
        }
    }

    /// First requirement of `definition` that is not met.
    ///
    /// Requirements on research objects are checked against
    /// `research_levels`, everything else against `planet_levels`.
    #[must_use]
    pub fn missing_prerequisite(
        &self,
        definition: &ObjectDefinition,
        planet_levels: &Levels,
        research_levels: &Levels,
    ) -> Option<Requirement> {
        definition.requirements.iter().copied().find(|req| {
            let is_research = self
                .definitions
                .get(&req.object)
                .is_some_and(|def| def.kind() == ObjectKind::Research);
            let have = if is_research {
                research_levels.get(req.object)
            } else {
                planet_levels.get(req.object)
            };
            have < req.level
        })
    }

    /// Check whether every requirement of `definition` is met.
    #[must_use]
    pub fn prerequisites_met(
        &self,
        definition: &ObjectDefinition,
        planet_levels: &Levels,
        research_levels: &Levels,
    ) -> bool {
        self.missing_prerequisite(definition, planet_levels, research_levels)
            .is_none()
    }

    /// Fail with [`GameError::PrerequisiteNotMet`] naming the first unmet requirement.
    pub fn check_prerequisites(
        &self,
        definition: &ObjectDefinition,
        planet_levels: &Levels,
        research_levels: &Levels,
    ) -> Result<()> {
        match self.missing_prerequisite(definition, planet_levels, research_levels) {
            None => Ok(()),
            Some(req) => Err(GameError::PrerequisiteNotMet {
                object: definition.machine_name.clone(),
                requirement: self
                    .definitions
                    .get(&req.object)
                    .map_or_else(|| format!("#{}", req.object), |d| d.machine_name.clone()),
                level: req.level,
            }),
        }
    }
}
