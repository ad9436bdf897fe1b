//! Cost and build time tables.

use std::fmt::Write as _;

use stellar_core::catalog::{Catalog, FacilityLevels, ObjectKind};
use stellar_core::math::format_long;
use stellar_core::resources::Resources;

use crate::ToolError;

/// One row of a cost table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostRow {
    /// Level reached, or units built.
    pub level: u32,
    /// Cost of this row.
    pub cost: Resources,
    /// Build time in seconds.
    pub seconds: u64,
}

/// Cost and build time of `machine_name` for levels `1..=levels`.
///
/// For ships and defense each row is a batch of `level` units.
///
/// # Errors
///
/// Returns an error if the object is unknown.
pub fn cost_table(
    catalog: &Catalog,
    machine_name: &str,
    levels: u32,
    facilities: &FacilityLevels,
    economy_speed: u32,
) -> Result<Vec<CostRow>, ToolError> {
    let def = catalog.definition_for(machine_name)?;
    let last = levels.min(def.max_level);
    let rows = (1..=last)
        .map(|level| {
            if def.kind() == ObjectKind::Unit {
                let per_unit = def.build_time_at(0, facilities, economy_speed);
                CostRow {
                    level,
                    cost: def.cost_at(0).times(level),
                    seconds: per_unit.saturating_mul(u64::from(level)),
                }
            } else {
                CostRow {
                    level,
                    cost: def.cost_at(level - 1),
                    seconds: def.build_time_at(level - 1, facilities, economy_speed),
                }
            }
        })
        .collect();
    Ok(rows)
}

/// `1d 02:03:04` style duration.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let rest = seconds % 86_400;
    let clock = format!(
        "{:02}:{:02}:{:02}",
        rest / 3_600,
        rest % 3_600 / 60,
        rest % 60
    );
    if days > 0 {
        format!("{days}d {clock}")
    } else {
        clock
    }
}

/// Render rows as an aligned text table.
#[must_use]
pub fn render_table(rows: &[CostRow]) -> String {
    let mut out = format!(
        "{:>5} {:>15} {:>15} {:>15} {:>10} {:>14}\n",
        "level", "metal", "crystal", "deuterium", "energy", "time"
    );
    for row in rows {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{:>5} {:>15} {:>15} {:>15} {:>10} {:>14}",
            row.level,
            format_long(row.cost.metal()),
            format_long(row.cost.crystal()),
            format_long(row.cost.deuterium()),
            format_long(row.cost.energy()),
            format_duration(row.seconds),
        );
    }
    out
}
