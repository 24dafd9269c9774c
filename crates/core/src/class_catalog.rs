//! Class-type catalog and cost estimation.
//!
//! One shared table of class types and their durations. Earlier screens
//! carried diverging copies (one listed "CPR" at 4 hours next to "First Aid"
//! and "OSHA"); this catalog follows the client request form, which is the
//! only copy that feeds cost estimates.

use serde::Serialize;

use crate::error::CoreError;

/// A catalog entry: display name and duration in hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassType {
    pub name: &'static str,
    pub hours: u32,
}

pub const CLASS_TYPES: &[ClassType] = &[
    ClassType { name: "AED", hours: 2 },
    ClassType { name: "CPR", hours: 3 },
    ClassType { name: "BBP", hours: 1 },
    ClassType { name: "SFA", hours: 2 },
    ClassType { name: "EFA", hours: 3 },
    ClassType { name: "40 Hour First Responder", hours: 40 },
    ClassType { name: "Advanced SFA", hours: 4 },
    ClassType { name: "AHA CPR Pro", hours: 3 },
    ClassType { name: "ASHI BLS", hours: 3 },
    ClassType { name: "ASHI CABS", hours: 2 },
    ClassType { name: "ASHI CPR Pro", hours: 3 },
    ClassType { name: "Babysitter Safety 101", hours: 2 },
    ClassType { name: "Babysitter Safety 102", hours: 2 },
    ClassType { name: "Earthquake Preparedness", hours: 1 },
    ClassType { name: "ECSI CPR Pro", hours: 3 },
    ClassType { name: "Infant CPR", hours: 2 },
    ClassType { name: "Pediatric CPR", hours: 3 },
];

/// Separator used when a list of class types is flattened into one label.
pub const CLASS_TYPE_SEPARATOR: &str = ", ";

pub fn find_class_type(name: &str) -> Option<&'static ClassType> {
    CLASS_TYPES.iter().find(|t| t.name == name)
}

/// Split a comma-joined label back into trimmed class type names.
pub fn split_class_types(label: &str) -> Vec<String> {
    label
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Flatten class types into the label stored on a confirmed class.
pub fn join_class_types(types: &[String]) -> String {
    types.join(CLASS_TYPE_SEPARATOR)
}

/// Require at least one class type, every one of them in the catalog,
/// and no duplicates.
pub fn validate_class_types(types: &[String]) -> Result<(), CoreError> {
    if types.is_empty() {
        return Err(CoreError::Validation(
            "At least one class type is required".to_string(),
        ));
    }

    for (i, name) in types.iter().enumerate() {
        if find_class_type(name).is_none() {
            return Err(CoreError::Validation(format!(
                "Unknown class type '{name}'"
            )));
        }
        if types[..i].contains(name) {
            return Err(CoreError::Validation(format!(
                "Class type '{name}' listed more than once"
            )));
        }
    }
    Ok(())
}

/// Sum the catalog hours of the selected class types.
pub fn total_hours(types: &[String]) -> Result<u32, CoreError> {
    types.iter().try_fold(0u32, |acc, name| {
        find_class_type(name)
            .map(|t| acc + t.hours)
            .ok_or_else(|| CoreError::Validation(format!("Unknown class type '{name}'")))
    })
}

/// Estimated cost of a class: total hours times the educator's hourly rate,
/// rounded to cents.
pub fn estimate_cost(types: &[String], hourly_rate: f64) -> Result<f64, CoreError> {
    if !hourly_rate.is_finite() || hourly_rate < 0.0 {
        return Err(CoreError::Validation(format!(
            "Hourly rate must be a non-negative number, got {hourly_rate}"
        )));
    }
    let hours = total_hours(types)?;
    Ok((f64::from(hours) * hourly_rate * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn types(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cpr_plus_aed_at_25_is_125() {
        let cost = estimate_cost(&types(&["CPR", "AED"]), 25.0).unwrap();
        assert_eq!(cost, 125.00);
    }

    #[test]
    fn total_hours_sums_catalog_entries() {
        assert_eq!(total_hours(&types(&["CPR", "AED", "BBP"])).unwrap(), 6);
        assert_eq!(total_hours(&types(&["40 Hour First Responder"])).unwrap(), 40);
    }

    #[test]
    fn estimate_rounds_to_cents() {
        let cost = estimate_cost(&types(&["BBP"]), 33.333).unwrap();
        assert_eq!(cost, 33.33);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert_matches!(
            estimate_cost(&types(&["OSHA"]), 25.0),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_class_types(&types(&["CPR", "Scuba"])),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn negative_rate_is_rejected() {
        assert_matches!(
            estimate_cost(&types(&["CPR"]), -1.0),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn empty_and_duplicate_lists_are_rejected() {
        assert!(validate_class_types(&[]).is_err());
        assert!(validate_class_types(&types(&["CPR", "CPR"])).is_err());
        assert!(validate_class_types(&types(&["CPR", "AED"])).is_ok());
    }

    #[test]
    fn label_split_and_join_preserve_order() {
        let label = join_class_types(&types(&["CPR", "AED", "Infant CPR"]));
        assert_eq!(label, "CPR, AED, Infant CPR");
        assert_eq!(split_class_types(&label), types(&["CPR", "AED", "Infant CPR"]));
        assert_eq!(split_class_types(" CPR,, AED "), types(&["CPR", "AED"]));
    }
}
