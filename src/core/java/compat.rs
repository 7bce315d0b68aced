// ─── Compatibility Table ───
// Maps ranges of target application versions to the Java runtimes that
// may run them. Rules are data, so a new cutover is a new entry.

use serde::{Deserialize, Serialize};

use super::version::{TargetVersion, VersionRecord};

/// Which runtime versions a rule accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Acceptance {
    /// Legacy-scheme runtimes of exactly `major` with an update strictly
    /// above `min_update_exclusive`.
    Legacy {
        major: u32,
        min_update_exclusive: u32,
    },
    /// Modern-scheme runtimes with `min_major <= major <= max_major`.
    Modern {
        min_major: u32,
        #[serde(default)]
        max_major: Option<u32>,
    },
}

impl Acceptance {
    pub fn accepts(&self, version: &VersionRecord) -> bool {
        match (self, *version) {
            (
                Acceptance::Legacy {
                    major,
                    min_update_exclusive,
                },
                VersionRecord::Legacy {
                    major: found,
                    update,
                    ..
                },
            ) => found == *major && update > *min_update_exclusive,
            (
                Acceptance::Modern {
                    min_major,
                    max_major,
                },
                VersionRecord::Modern { major, .. },
            ) => major >= *min_major && max_major.is_none_or(|max| major <= max),
            _ => false,
        }
    }
}

/// One row of the table: applies to targets in `[since, until)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    #[serde(default)]
    pub since: Option<TargetVersion>,
    #[serde(default)]
    pub until: Option<TargetVersion>,
    pub accept: Acceptance,
    /// Major version to request when nothing local qualifies.
    pub recommended_major: u32,
}

impl CompatibilityRule {
    pub fn covers(&self, target: &TargetVersion) -> bool {
        let above_floor = self.since.as_ref().is_none_or(|since| target.at_least(since));
        let below_ceiling = self.until.as_ref().is_none_or(|until| !target.at_least(until));
        above_floor && below_ceiling
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityTable {
    pub rules: Vec<CompatibilityRule>,
}

/// Targets before this version run on Java 8, later ones on Java 17+.
pub const DEFAULT_THRESHOLD: &str = "1.17";
/// Java 8 updates at or below this are rejected.
pub const DEFAULT_UPDATE_FLOOR: u32 = 52;

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::with_threshold(TargetVersion::parse(DEFAULT_THRESHOLD), DEFAULT_UPDATE_FLOOR)
    }
}

impl CompatibilityTable {
    /// The two-era table: legacy 8 below `threshold`, modern 17+ from it.
    pub fn with_threshold(threshold: TargetVersion, update_floor: u32) -> Self {
        Self {
            rules: vec![
                CompatibilityRule {
                    since: None,
                    until: Some(threshold.clone()),
                    accept: Acceptance::Legacy {
                        major: 8,
                        min_update_exclusive: update_floor,
                    },
                    recommended_major: 8,
                },
                CompatibilityRule {
                    since: Some(threshold),
                    until: None,
                    accept: Acceptance::Modern {
                        min_major: 17,
                        max_major: None,
                    },
                    recommended_major: 17,
                },
            ],
        }
    }

    /// First rule covering `target`.
    pub fn rule_for(&self, target: &TargetVersion) -> Option<&CompatibilityRule> {
        self.rules.iter().find(|rule| rule.covers(target))
    }

    pub fn accepts(&self, target: &TargetVersion, version: &VersionRecord) -> bool {
        self.rule_for(target)
            .is_some_and(|rule| rule.accept.accepts(version))
    }

    pub fn recommended_major(&self, target: &TargetVersion) -> Option<u32> {
        self.rule_for(target).map(|rule| rule.recommended_major)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> VersionRecord {
        VersionRecord::parse(raw).unwrap()
    }

    #[test]
    fn old_targets_need_recent_java_8() {
        let table = CompatibilityTable::default();
        let target = TargetVersion::parse("1.16.5");
        assert!(table.accepts(&target, &v("1.8.0_321-b07")));
        assert!(!table.accepts(&target, &v("1.8.0_52-b13")));
        assert!(!table.accepts(&target, &v("1.8.0_40-b25")));
        assert!(!table.accepts(&target, &v("1.7.0_80-b15")));
        assert!(!table.accepts(&target, &v("17.0.8+7")));
    }

    #[test]
    fn new_targets_need_java_17_or_later() {
        let table = CompatibilityTable::default();
        let target = TargetVersion::parse("1.20.4");
        assert!(table.accepts(&target, &v("17.0.8+7")));
        assert!(table.accepts(&target, &v("21.0.2+13")));
        assert!(!table.accepts(&target, &v("11.0.20+8")));
        assert!(!table.accepts(&target, &v("1.8.0_321-b07")));
    }

    #[test]
    fn recommended_major_follows_rule() {
        let table = CompatibilityTable::default();
        assert_eq!(table.recommended_major(&TargetVersion::parse("1.12.2")), Some(8));
        assert_eq!(table.recommended_major(&TargetVersion::parse("1.17")), Some(17));
    }

    #[test]
    fn extra_cutover_is_configuration() {
        let table: CompatibilityTable = serde_json::from_value(serde_json::json!({
            "rules": [
                {"until": "1.17", "accept": {"scheme": "legacy", "major": 8, "min_update_exclusive": 52}, "recommended_major": 8},
                {"since": "1.17", "until": "1.20.5", "accept": {"scheme": "modern", "min_major": 17, "max_major": 17}, "recommended_major": 17},
                {"since": "1.20.5", "accept": {"scheme": "modern", "min_major": 21}, "recommended_major": 21}
            ]
        }))
        .unwrap();

        assert!(table.accepts(&TargetVersion::parse("1.20.4"), &v("17.0.8+7")));
        assert!(!table.accepts(&TargetVersion::parse("1.20.4"), &v("21.0.2+13")));
        assert!(!table.accepts(&TargetVersion::parse("1.21"), &v("17.0.8+7")));
        assert_eq!(table.recommended_major(&TargetVersion::parse("1.21")), Some(21));
    }

    #[test]
    fn empty_table_accepts_nothing() {
        let table = CompatibilityTable { rules: Vec::new() };
        assert!(!table.accepts(&TargetVersion::parse("1.20.4"), &v("17.0.8+7")));
    }
}
