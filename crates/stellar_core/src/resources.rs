//! The four planetary resources as an immutable value type.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{amount_serde, format_long, mul_div, scale, Amount, Ratio};

/// One of the four resources a planet tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Mined by metal mines.
    Metal,
    /// Mined by crystal mines.
    Crystal,
    /// Synthesized from water, burned by fusion reactors.
    Deuterium,
    /// Produced by power plants, consumed by mines. Not storable.
    Energy,
}

impl ResourceKind {
    /// The storable resources, in display order.
    pub const STORABLE: [Self; 3] = [Self::Metal, Self::Crystal, Self::Deuterium];

    /// Lowercase name used in machine-readable output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metal => "metal",
            Self::Crystal => "crystal",
            Self::Deuterium => "deuterium",
            Self::Energy => "energy",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An amount of each resource.
///
/// Values are immutable: arithmetic returns a new `Resources`. Metal,
/// crystal and deuterium are never allowed to go negative through
/// [`Resources::checked_sub`]; energy may be negative (a deficit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    #[serde(with = "amount_serde")]
    metal: Amount,
    #[serde(with = "amount_serde")]
    crystal: Amount,
    #[serde(with = "amount_serde")]
    deuterium: Amount,
    #[serde(with = "amount_serde")]
    energy: Amount,
}

impl Resources {
    /// No resources at all.
    pub const ZERO: Self = Self {
        metal: Amount::ZERO,
        crystal: Amount::ZERO,
        deuterium: Amount::ZERO,
        energy: Amount::ZERO,
    };

    /// Create from whole-unit amounts.
    #[must_use]
    pub fn new(metal: i64, crystal: i64, deuterium: i64, energy: i64) -> Self {
        Self::from_amounts(
            Amount::saturating_from_num(metal),
            Amount::saturating_from_num(crystal),
            Amount::saturating_from_num(deuterium),
            Amount::saturating_from_num(energy),
        )
    }

    /// Create from fixed-point amounts.
    #[must_use]
    pub const fn from_amounts(
        metal: Amount,
        crystal: Amount,
        deuterium: Amount,
        energy: Amount,
    ) -> Self {
        Self {
            metal,
            crystal,
            deuterium,
            energy,
        }
    }

    /// Metal amount.
    #[must_use]
    pub const fn metal(&self) -> Amount {
        self.metal
    }

    /// Crystal amount.
    #[must_use]
    pub const fn crystal(&self) -> Amount {
        self.crystal
    }

    /// Deuterium amount.
    #[must_use]
    pub const fn deuterium(&self) -> Amount {
        self.deuterium
    }

    /// Energy amount.
    #[must_use]
    pub const fn energy(&self) -> Amount {
        self.energy
    }

    /// Amount of one resource.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> Amount {
        match kind {
            ResourceKind::Metal => self.metal,
            ResourceKind::Crystal => self.crystal,
            ResourceKind::Deuterium => self.deuterium,
            ResourceKind::Energy => self.energy,
        }
    }

    /// Copy with one resource replaced.
    #[must_use]
    pub const fn with(mut self, kind: ResourceKind, value: Amount) -> Self {
        match kind {
            ResourceKind::Metal => self.metal = value,
            ResourceKind::Crystal => self.crystal = value,
            ResourceKind::Deuterium => self.deuterium = value,
            ResourceKind::Energy => self.energy = value,
        }
        self
    }

    /// Copy with energy cleared, for quantities that only make sense for storable resources.
    #[must_use]
    pub const fn without_energy(self) -> Self {
        self.with(ResourceKind::Energy, Amount::ZERO)
    }

    /// Sum of metal and crystal, the basis of every build time formula.
    #[must_use]
    pub fn metal_and_crystal(&self) -> Amount {
        self.metal.saturating_add(self.crystal)
    }

    /// Whether every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Subtract, failing if metal, crystal or deuterium would go negative.
    ///
    /// Energy is subtracted without a floor.
    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        for kind in ResourceKind::STORABLE {
            let available = self.get(kind);
            let required = rhs.get(kind);
            if available < required {
                return Err(GameError::InsufficientResources {
                    resource: kind,
                    required: required.ceil().to_num(),
                    available: available.floor().to_num(),
                });
            }
        }
        Ok(self.saturating_sub_raw(rhs))
    }

    /// Subtract, flooring metal, crystal and deuterium at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        let raw = self.saturating_sub_raw(rhs);
        Self {
            metal: raw.metal.max(Amount::ZERO),
            crystal: raw.crystal.max(Amount::ZERO),
            deuterium: raw.deuterium.max(Amount::ZERO),
            energy: raw.energy,
        }
    }

    /// Multiply every component by `factor`.
    #[must_use]
    pub fn scale(self, factor: Ratio) -> Self {
        Self {
            metal: scale(self.metal, factor),
            crystal: scale(self.crystal, factor),
            deuterium: scale(self.deuterium, factor),
            energy: scale(self.energy, factor),
        }
    }

    /// Multiply every component by a whole count.
    #[must_use]
    pub fn times(self, count: u32) -> Self {
        let n = Amount::from_num(count);
        Self {
            metal: self.metal.saturating_mul(n),
            crystal: self.crystal.saturating_mul(n),
            deuterium: self.deuterium.saturating_mul(n),
            energy: self.energy.saturating_mul(n),
        }
    }

    /// `self * numerator / denominator` per component, rounded down.
    ///
    /// Used for partial refunds; a zero denominator yields zero.
    #[must_use]
    pub fn portion(self, numerator: u64, denominator: u64) -> Self {
        let part = |amount: Amount| mul_div(amount, numerator, denominator).floor();
        Self {
            metal: part(self.metal),
            crystal: part(self.crystal),
            deuterium: part(self.deuterium),
            energy: part(self.energy),
        }
    }

    /// Round every component down to whole units.
    #[must_use]
    pub fn floor(self) -> Self {
        Self {
            metal: self.metal.floor(),
            crystal: self.crystal.floor(),
            deuterium: self.deuterium.floor(),
            energy: self.energy.floor(),
        }
    }

    /// Whether `self` holds at least `cost` of every storable resource.
    #[must_use]
    pub fn covers(&self, cost: &Self) -> bool {
        ResourceKind::STORABLE
            .iter()
            .all(|&kind| self.get(kind) >= cost.get(kind))
    }

    /// Display strings in the client's long format.
    #[must_use]
    pub fn formatted(&self) -> FormattedResources {
        FormattedResources {
            metal: format_long(self.metal),
            crystal: format_long(self.crystal),
            deuterium: format_long(self.deuterium),
            energy: format_long(self.energy),
        }
    }

    fn saturating_sub_raw(self, rhs: Self) -> Self {
        Self {
            metal: self.metal.saturating_sub(rhs.metal),
            crystal: self.crystal.saturating_sub(rhs.crystal),
            deuterium: self.deuterium.saturating_sub(rhs.deuterium),
            energy: self.energy.saturating_sub(rhs.energy),
        }
    }
}

impl std::ops::Add for Resources {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            metal: self.metal.saturating_add(rhs.metal),
            crystal: self.crystal.saturating_add(rhs.crystal),
            deuterium: self.deuterium.saturating_add(rhs.deuterium),
            energy: self.energy.saturating_add(rhs.energy),
        }
    }
}

impl std::fmt::Display for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.formatted();
        write!(
            f,
            "metal {}, crystal {}, deuterium {}, energy {}",
            s.metal, s.crystal, s.deuterium, s.energy
        )
    }
}

/// Resource amounts rendered for display and string comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedResources {
    /// Metal, long format.
    pub metal: String,
    /// Crystal, long format.
    pub crystal: String,
    /// Deuterium, long format.
    pub deuterium: String,
    /// Energy, long format.
    pub energy: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_checked_sub() {
        let a = Resources::new(500, 500, 0, 0);
        let cost = Resources::new(60, 15, 0, 0);

        let after = a.checked_sub(cost).unwrap();
        assert_eq!(after, Resources::new(440, 485, 0, 0));
        assert_eq!(after + cost, a);
    }

    #[test]
    fn test_checked_sub_reports_first_short_resource() {
        let a = Resources::new(100, 10, 0, 0);
        let err = a.checked_sub(Resources::new(50, 20, 0, 0)).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientResources {
                resource: ResourceKind::Crystal,
                required: 20,
                available: 10,
            }
        );
    }

    #[test]
    fn test_energy_may_go_negative() {
        let a = Resources::new(10, 10, 10, 5);
        let after = a.checked_sub(Resources::new(0, 0, 0, 20)).unwrap();
        assert_eq!(after.energy(), Amount::from_num(-15));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        let a = Resources::new(10, 100, 0, 0);
        let after = a.saturating_sub(Resources::new(50, 20, 5, 0));
        assert_eq!(after, Resources::new(0, 80, 0, 0));
    }

    #[test]
    fn test_scale_and_times() {
        let base = Resources::new(60, 15, 0, 0);
        let scaled = base.scale(Ratio::from_num(1.5));
        assert_eq!(scaled.metal(), Amount::from_num(90));
        assert_eq!(scaled.crystal(), Amount::from_num(22.5));
        assert_eq!(base.times(3), Resources::new(180, 45, 0, 0));
    }

    #[test]
    fn test_portion() {
        let cost = Resources::new(3000, 1000, 0, 0);
        assert_eq!(cost.portion(1, 2), Resources::new(1500, 500, 0, 0));
        assert_eq!(cost.portion(1, 3), Resources::new(1000, 333, 0, 0));
        assert_eq!(cost.portion(5, 0), Resources::ZERO);
    }

    #[test]
    fn test_covers_ignores_energy() {
        let stock = Resources::new(100, 100, 100, -50);
        assert!(stock.covers(&Resources::new(100, 100, 100, 1_000)));
        assert!(!stock.covers(&Resources::new(101, 0, 0, 0)));
    }

    #[test]
    fn test_formatted() {
        let f = Resources::new(1_234_567, 440, 0, -12).formatted();
        assert_eq!(f.metal, "1.234.567");
        assert_eq!(f.crystal, "440");
        assert_eq!(f.deuterium, "0");
        assert_eq!(f.energy, "-12");
    }
}
