//! Catalog validation.
//!
//! Loading a catalog already rejects structural errors (duplicate ids,
//! unknown requirements, shrinking cost factors). The validator adds checks
//! that make a catalog unplayable without making it unloadable.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use stellar_core::catalog::{Catalog, ObjectDefinition, ObjectId, ObjectKind};
use stellar_core::data::{CatalogData, Category, ObjectEffect};

use crate::ToolError;

/// Outcome of validating a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Objects per category.
    pub counts: BTreeMap<Category, usize>,
    /// Problems that do not stop the catalog from loading.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// No warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Validate a catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or loaded.
pub fn validate_catalog_file(path: &Path) -> Result<ValidationReport, ToolError> {
    let display = path.display().to_string();
    let source = std::fs::read_to_string(path).map_err(|source| ToolError::IoError {
        path: display.clone(),
        source,
    })?;
    validate_catalog_source(&source, &display)
}

/// Validate catalog RON text; `path` names the source in errors.
///
/// # Errors
///
/// Returns an error if the text cannot be parsed or loaded.
pub fn validate_catalog_source(source: &str, path: &str) -> Result<ValidationReport, ToolError> {
    let data: CatalogData = ron::from_str(source).map_err(|source| ToolError::ParseError {
        path: path.to_string(),
        source,
    })?;
    let catalog = Catalog::from_data(&data)?;
    Ok(validate_catalog(&catalog))
}

/// Run the playability checks on a loaded catalog.
#[must_use]
pub fn validate_catalog(catalog: &Catalog) -> ValidationReport {
    let mut report = ValidationReport::default();
    for def in catalog.iter() {
        *report.counts.entry(def.category).or_default() += 1;
        check_object(catalog, def, &mut report.warnings);
    }
    let cycles: BTreeSet<Vec<ObjectId>> = catalog
        .iter()
        .filter_map(|def| requirement_cycle(catalog, def.id))
        .collect();
    for cycle in cycles {
        let names: Vec<&str> = cycle
            .iter()
            .chain(cycle.first())
            .filter_map(|id| catalog.definition(*id).ok())
            .map(|def| def.machine_name.as_str())
            .collect();
        report
            .warnings
            .push(format!("requirement cycle: {}", names.join(" -> ")));
    }
    report
}

fn check_object(catalog: &Catalog, def: &ObjectDefinition, warnings: &mut Vec<String>) {
    let name = &def.machine_name;
    if def.base_cost.is_zero() {
        warnings.push(format!("{name} costs nothing"));
    }
    if def.max_level == 0 {
        warnings.push(format!("{name} can never be built (max level 0)"));
    }
    if def.kind() == ObjectKind::Unit && def.combat.is_none() && def.effects.is_empty() {
        warnings.push(format!("{name} is a unit without combat values or effects"));
    }
    if def.kind() == ObjectKind::Research && def.requirements.is_empty() {
        warnings.push(format!("{name} does not require a research lab"));
    }
    for requirement in &def.requirements {
        let Ok(required) = catalog.definition(requirement.object) else {
            continue;
        };
        if requirement.level > required.max_level {
            warnings.push(format!(
                "{name} requires {} level {}, above its max level {}",
                required.machine_name, requirement.level, required.max_level
            ));
        }
        if required.kind() == ObjectKind::Unit {
            warnings.push(format!(
                "{name} requires units of {}, which can be destroyed",
                required.machine_name
            ));
        }
    }
    let unit_effect = def.has_effect(|e| matches!(e, ObjectEffect::SolarSatellite));
    if unit_effect && def.kind() != ObjectKind::Unit {
        warnings.push(format!("{name} has a per-unit effect but is not a unit"));
    }
}

/// A requirement cycle through `start`, rotated to begin at its smallest
/// id so every member reports the same cycle.
fn requirement_cycle(catalog: &Catalog, start: ObjectId) -> Option<Vec<ObjectId>> {
    fn visit(
        catalog: &Catalog,
        current: ObjectId,
        start: ObjectId,
        path: &mut Vec<ObjectId>,
    ) -> bool {
        let Ok(def) = catalog.definition(current) else {
            return false;
        };
        for requirement in &def.requirements {
            if requirement.object == start {
                return true;
            }
            if path.contains(&requirement.object) {
                continue;
            }
            path.push(requirement.object);
            if visit(catalog, requirement.object, start, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = vec![start];
    if !visit(catalog, start, start, &mut path) {
        return None;
    }
    let smallest = path
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map_or(0, |(index, _)| index);
    path.rotate_left(smallest);
    Some(path)
}
