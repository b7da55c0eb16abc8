//! Read-only lookup tables: state FIPS codes and default variables.

/// Variables fetched when none are given.
pub const DEFAULT_VARS: &[&str] = &["AWND", "PRCP", "SNOW", "SNWD", "TAVG", "TMAX", "TMIN"];

/// The 50 states (DC and territories excluded), in FIPS order.
pub static STATE_FIPS: &[(&str, &str)] = &[
    ("01", "Alabama"),
    ("02", "Alaska"),
    ("04", "Arizona"),
    ("05", "Arkansas"),
    ("06", "California"),
    ("08", "Colorado"),
    ("09", "Connecticut"),
    ("10", "Delaware"),
    ("12", "Florida"),
    ("13", "Georgia"),
    ("15", "Hawaii"),
    ("16", "Idaho"),
    ("17", "Illinois"),
    ("18", "Indiana"),
    ("19", "Iowa"),
    ("20", "Kansas"),
    ("21", "Kentucky"),
    ("22", "Louisiana"),
    ("23", "Maine"),
    ("24", "Maryland"),
    ("25", "Massachusetts"),
    ("26", "Michigan"),
    ("27", "Minnesota"),
    ("28", "Mississippi"),
    ("29", "Missouri"),
    ("30", "Montana"),
    ("31", "Nebraska"),
    ("32", "Nevada"),
    ("33", "New Hampshire"),
    ("34", "New Jersey"),
    ("35", "New Mexico"),
    ("36", "New York"),
    ("37", "North Carolina"),
    ("38", "North Dakota"),
    ("39", "Ohio"),
    ("40", "Oklahoma"),
    ("41", "Oregon"),
    ("42", "Pennsylvania"),
    ("44", "Rhode Island"),
    ("45", "South Carolina"),
    ("46", "South Dakota"),
    ("47", "Tennessee"),
    ("48", "Texas"),
    ("49", "Utah"),
    ("50", "Vermont"),
    ("51", "Virginia"),
    ("53", "Washington"),
    ("54", "West Virginia"),
    ("55", "Wisconsin"),
    ("56", "Wyoming"),
];

/// Display name for a FIPS code, if it is one of the 50 states.
pub fn state_name(fips: &str) -> Option<&'static str> {
    STATE_FIPS
        .iter()
        .find(|(code, _)| *code == fips)
        .map(|(_, name)| *name)
}

/// Comma-joined default state list, for CLI defaults.
pub fn default_states_arg() -> String {
    STATE_FIPS
        .iter()
        .map(|(code, _)| *code)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn default_vars_arg() -> String {
    DEFAULT_VARS.join(",")
}

/// Name of the per-region output directory.
pub fn region_dir_name(fips: &str) -> String {
    format!("FIPS_{fips}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifty_states() {
        assert_eq!(STATE_FIPS.len(), 50);
        assert!(state_name("11").is_none());
    }

    #[test]
    fn test_state_name_lookup() {
        assert_eq!(state_name("06"), Some("California"));
        assert_eq!(state_name("56"), Some("Wyoming"));
    }

    #[test]
    fn test_default_args() {
        assert!(default_states_arg().starts_with("01,02,04"));
        assert_eq!(default_vars_arg(), "AWND,PRCP,SNOW,SNWD,TAVG,TMAX,TMIN");
    }
}
