//! Object data structures for data-driven catalog definitions.

use serde::{Deserialize, Serialize};

use crate::resources::ResourceKind;

/// Which menu an object belongs to. Determines the queue it is built in
/// and how completion is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Mines, power plants and storage.
    Resources,
    /// Robotics factory, shipyard, research lab and friends.
    Facilities,
    /// Player-wide technologies.
    Research,
    /// Ships.
    Shipyard,
    /// Planetary defense.
    Defense,
}

impl Category {
    /// Lowercase name used in machine-readable output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resources => "resources",
            Self::Facilities => "facilities",
            Self::Research => "research",
            Self::Shipyard => "shipyard",
            Self::Defense => "defense",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an object does once built.
///
/// Formulas use `L` for the object's level (or unit count) and `pct` for
/// its production setting in tenths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectEffect {
    /// Produces `base * L * 1.1^L * pct` of a resource per hour.
    /// Deuterium output also scales with planet temperature.
    Produces {
        /// Produced resource.
        resource: ResourceKind,
        /// Base output per hour.
        base: u32,
    },

    /// Consumes `base * L * 1.1^L * pct` energy.
    ConsumesEnergy {
        /// Base consumption.
        base: u32,
    },

    /// Produces `base * L * 1.1^L * pct` energy.
    ProducesEnergy {
        /// Base output.
        base: u32,
    },

    /// Produces `base * L * (1.05 + 0.01 * energy_technology)^L * pct` energy
    /// and burns `deuterium_upkeep * L * 1.1^L * pct` deuterium per hour.
    FusionEnergy {
        /// Base energy output.
        base: u32,
        /// Base deuterium consumption.
        deuterium_upkeep: u32,
    },

    /// Each unit produces `floor((max_temperature + 140) / 6)` energy.
    SolarSatellite,

    /// Raises storage capacity of a resource to `5000 * floor(2.5 * e^(20L/33))`.
    Storage {
        /// Stored resource.
        resource: ResourceKind,
    },

    /// Divides building construction time by `1 + L`.
    BuildingSpeed,

    /// Divides building and unit construction time by `2^L`.
    NaniteSpeed,

    /// Divides unit construction time by `1 + L`.
    ShipyardSpeed,

    /// Divides research time by `1 + L` on the planet it is built on.
    ResearchSpeed,

    /// Raises mine output by 1% metal, 0.66% crystal, 0.33% deuterium per level.
    PlasmaBonus,

    /// Improves fusion reactor output.
    EnergyTechnology,
}

/// Combat values of ships and defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatStats {
    /// Hull points.
    pub structural_integrity: u32,
    /// Shield points, restored every round.
    pub shield: u32,
    /// Weapon damage per shot.
    pub attack: u32,
}

/// Base cost of an object in whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostData {
    /// Metal.
    #[serde(default)]
    pub metal: u32,
    /// Crystal.
    #[serde(default)]
    pub crystal: u32,
    /// Deuterium.
    #[serde(default)]
    pub deuterium: u32,
    /// Energy that must be available (not consumed).
    #[serde(default)]
    pub energy: u32,
}

/// A minimum level of another object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementData {
    /// Machine name of the required object.
    pub object: String,
    /// Minimum level.
    pub level: u32,
}

/// Data-driven object definition.
///
/// # Example RON
///
/// ```ron
/// ObjectData(
///     id: 1,
///     machine_name: "metal_mine",
///     title: "Metal Mine",
///     category: resources,
///     cost: CostData(metal: 60, crystal: 15),
///     cost_factor_percent: 150,
///     effects: [
///         Produces(resource: metal, base: 30),
///         ConsumesEnergy(base: 10),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectData {
    /// Stable numeric identifier, used by build requests.
    pub id: u32,

    /// Stable string identifier.
    pub machine_name: String,

    /// Display name.
    pub title: String,

    /// Menu the object belongs to.
    pub category: Category,

    /// Cost of the first level (or of one unit).
    pub cost: CostData,

    /// Cost multiplier per level, in percent.
    #[serde(default = "default_cost_factor_percent")]
    pub cost_factor_percent: u32,

    /// Highest level (or unit count) allowed. Unbounded when absent.
    #[serde(default)]
    pub max_level: Option<u32>,

    /// Objects that must reach a level first.
    #[serde(default)]
    pub requirements: Vec<RequirementData>,

    /// What the object does.
    #[serde(default)]
    pub effects: Vec<ObjectEffect>,

    /// Combat values for ships and defense.
    #[serde(default)]
    pub combat: Option<CombatStats>,
}

/// Default cost multiplier: doubling per level.
const fn default_cost_factor_percent() -> u32 {
    200
}

/// Top-level catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Every object, in display order.
    pub objects: Vec<ObjectData>,
}

impl ObjectData {
    /// Check if this object requires another object.
    #[must_use]
    pub fn requires(&self, machine_name: &str) -> bool {
        self.requirements.iter().any(|r| r.object == machine_name)
    }

    /// Check if this object is built in units rather than levels.
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self.category, Category::Shipyard | Category::Defense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METAL_MINE: &str = r#"
        ObjectData(
            id: 1,
            machine_name: "metal_mine",
            title: "Metal Mine",
            category: resources,
            cost: CostData(metal: 60, crystal: 15),
            cost_factor_percent: 150,
            effects: [
                Produces(resource: metal, base: 30),
                ConsumesEnergy(base: 10),
            ],
        )
    "#;

    #[test]
    fn test_parse_object_data() {
        let data: ObjectData = ron::from_str(METAL_MINE).unwrap();
        assert_eq!(data.id, 1);
        assert_eq!(data.machine_name, "metal_mine");
        assert_eq!(data.category, Category::Resources);
        assert_eq!(data.cost.metal, 60);
        assert_eq!(data.cost.deuterium, 0);
        assert_eq!(data.cost_factor_percent, 150);
        assert_eq!(data.max_level, None);
        assert!(data.requirements.is_empty());
        assert_eq!(data.effects.len(), 2);
        assert!(!data.is_unit());
    }

    #[test]
    fn test_defaults() {
        let data: ObjectData = ron::from_str(
            r#"ObjectData(
                id: 9,
                machine_name: "rocket_launcher",
                title: "Rocket Launcher",
                category: defense,
                cost: CostData(metal: 2000),
                requirements: [RequirementData(object: "shipyard", level: 1)],
                combat: Some(CombatStats(structural_integrity: 2000, shield: 20, attack: 80)),
            )"#,
        )
        .unwrap();
        assert_eq!(data.cost_factor_percent, 200);
        assert!(data.is_unit());
        assert!(data.requires("shipyard"));
        assert!(!data.requires("research_lab"));
        assert_eq!(data.combat.unwrap().attack, 80);
    }
}
