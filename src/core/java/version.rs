// ─── Java Version Parsing ───
// Two grammars are auto-detected from the first dotted token:
//   legacy  1.{major}.0_{update}-b{build}     e.g. 1.8.0_152-b16
//   modern  {major}.{minor}.{revision}+{build} e.g. 10.0.2+13

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{GuardError, GuardResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionScheme {
    Legacy,
    Modern,
}

/// A parsed `java.runtime.version`. Immutable once built; `major` is
/// always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum VersionRecord {
    Legacy { major: u32, update: u32, build: u32 },
    Modern {
        major: u32,
        minor: u32,
        revision: u32,
        build: u32,
    },
}

impl VersionRecord {
    /// Parse a full runtime version string, picking the grammar from its
    /// leading token.
    pub fn parse(input: &str) -> GuardResult<Self> {
        let trimmed = input.trim();
        if trimmed.split('.').next() == Some("1") {
            parse_legacy(trimmed)
        } else {
            parse_modern(trimmed)
        }
    }

    pub fn scheme(&self) -> VersionScheme {
        match self {
            VersionRecord::Legacy { .. } => VersionScheme::Legacy,
            VersionRecord::Modern { .. } => VersionScheme::Modern,
        }
    }

    pub fn major(&self) -> u32 {
        match *self {
            VersionRecord::Legacy { major, .. } | VersionRecord::Modern { major, .. } => major,
        }
    }

    /// Scheme-specific ranking keys after the major: `(update, build)` for
    /// legacy, `(minor, revision)` for modern.
    pub(crate) fn secondary_keys(&self) -> (u32, u32) {
        match *self {
            VersionRecord::Legacy { update, build, .. } => (update, build),
            VersionRecord::Modern {
                minor, revision, ..
            } => (minor, revision),
        }
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            VersionRecord::Legacy {
                major,
                update,
                build,
            } => write!(f, "1.{major}.0_{update}-b{build}"),
            VersionRecord::Modern {
                major,
                minor,
                revision,
                build,
            } => write!(f, "{major}.{minor}.{revision}+{build}"),
        }
    }
}

fn parse_legacy(input: &str) -> GuardResult<VersionRecord> {
    let (head, trailer) = input
        .split_once('-')
        .ok_or_else(|| GuardError::malformed(input, "missing '-b' build separator"))?;
    // Distro builds put a vendor tag before the build:
    // 1.8.0_392-8u392-ga-1~22.04-b08
    let build = trailer
        .rsplit('-')
        .find_map(build_number)
        .ok_or_else(|| GuardError::malformed(input, "build is not numeric"))?;

    let (dotted, update) = head
        .split_once('_')
        .ok_or_else(|| GuardError::malformed(input, "missing '_' update separator"))?;
    let update = parse_field(input, update, "update is not numeric")?;

    let major = dotted
        .split('.')
        .nth(1)
        .ok_or_else(|| GuardError::malformed(input, "missing major component"))?;
    let major = parse_major(input, major)?;

    Ok(VersionRecord::Legacy {
        major,
        update,
        build,
    })
}

fn parse_modern(input: &str) -> GuardResult<VersionRecord> {
    let (vnum, build) = input
        .split_once('+')
        .ok_or_else(|| GuardError::malformed(input, "missing '+' build separator"))?;
    // `$BUILD-$OPT`: the optional trailer is not part of the build number.
    let build = build.split('-').next().unwrap_or_default();
    let build = parse_field(input, build, "build is not numeric")?;

    // `$VNUM-$PRE`: a pre-release tag does not change the numbering.
    let vnum = vnum.split('-').next().unwrap_or_default();
    let mut parts = vnum.split('.');
    let major = parse_major(input, parts.next().unwrap_or_default())?;
    let minor = match parts.next() {
        Some(part) => parse_field(input, part, "minor is not numeric")?,
        None => 0,
    };
    let revision = match parts.next() {
        Some(part) => parse_field(input, part, "revision is not numeric")?,
        None => 0,
    };

    Ok(VersionRecord::Modern {
        major,
        minor,
        revision,
        build,
    })
}

fn build_number(segment: &str) -> Option<u32> {
    segment.strip_prefix('b').unwrap_or(segment).parse().ok()
}

fn parse_major(input: &str, raw: &str) -> GuardResult<u32> {
    let major = parse_field(input, raw, "major is not numeric")?;
    if major == 0 {
        return Err(GuardError::malformed(input, "major must be at least 1"));
    }
    Ok(major)
}

fn parse_field(input: &str, raw: &str, reason: &'static str) -> GuardResult<u32> {
    raw.parse::<u32>()
        .map_err(|_| GuardError::malformed(input, reason))
}

/// An application version used to select a compatibility rule
/// (`1.16.5`, `1.20.4`, `24w10a`).
///
/// Components compare numerically left to right; missing trailing
/// components count as zero. Only the leading digits of a component are
/// significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct TargetVersion {
    raw: String,
    parts: Vec<u32>,
}

impl TargetVersion {
    pub fn parse(raw: &str) -> Self {
        let parts = raw
            .trim()
            .split('.')
            .map(|part| {
                let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u32>().unwrap_or(0)
            })
            .collect();
        Self {
            raw: raw.trim().to_string(),
            parts,
        }
    }

    /// True if `self >= minimum`.
    pub fn at_least(&self, minimum: &TargetVersion) -> bool {
        self.cmp(minimum) != Ordering::Less
    }
}

impl Ord for TargetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| {
                let left = self.parts.get(i).copied().unwrap_or(0);
                let right = other.parts.get(i).copied().unwrap_or(0);
                left.cmp(&right)
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for TargetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TargetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<String> for TargetVersion {
    fn from(value: String) -> Self {
        TargetVersion::parse(&value)
    }
}

impl From<TargetVersion> for String {
    fn from(value: TargetVersion) -> Self {
        value.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_runtime_version() {
        let parsed = VersionRecord::parse("1.8.0_152-b16").unwrap();
        assert_eq!(
            parsed,
            VersionRecord::Legacy {
                major: 8,
                update: 152,
                build: 16
            }
        );
        assert_eq!(parsed.scheme(), VersionScheme::Legacy);
    }

    #[test]
    fn legacy_build_comes_from_trailing_segment() {
        assert_eq!(
            VersionRecord::parse("1.8.0_392-8u392-ga-1~22.04-b08").unwrap(),
            VersionRecord::Legacy {
                major: 8,
                update: 392,
                build: 8
            }
        );
        assert_eq!(
            VersionRecord::parse("1.8.0_292-8u292-b10-0ubuntu1~20.04-b10").unwrap(),
            VersionRecord::Legacy {
                major: 8,
                update: 292,
                build: 10
            }
        );
        assert!(VersionRecord::parse("1.8.0_392-8u392-ga").is_err());
    }

    #[test]
    fn parses_modern_runtime_version() {
        let parsed = VersionRecord::parse("10.0.2+13").unwrap();
        assert_eq!(
            parsed,
            VersionRecord::Modern {
                major: 10,
                minor: 0,
                revision: 2,
                build: 13
            }
        );
        assert_eq!(parsed.major(), 10);
    }

    #[test]
    fn modern_version_tolerates_vendor_trailers() {
        assert_eq!(
            VersionRecord::parse("17.0.2+8-LTS").unwrap(),
            VersionRecord::Modern {
                major: 17,
                minor: 0,
                revision: 2,
                build: 8
            }
        );
        assert_eq!(
            VersionRecord::parse("21+35").unwrap(),
            VersionRecord::Modern {
                major: 21,
                minor: 0,
                revision: 0,
                build: 35
            }
        );
    }

    #[test]
    fn rejects_missing_separators() {
        assert!(matches!(
            VersionRecord::parse("8.0"),
            Err(GuardError::MalformedVersion { .. })
        ));
        assert!(VersionRecord::parse("1.8.0_152").is_err());
        assert!(VersionRecord::parse("1.8.0-b16").is_err());
    }

    #[test]
    fn rejects_non_numeric_fields() {
        assert!(VersionRecord::parse("1.8.0_abc-b16").is_err());
        assert!(VersionRecord::parse("17.x.1+9").is_err());
        assert!(VersionRecord::parse("0.1.2+3").is_err());
    }

    #[test]
    fn display_round_trips_canonical_forms() {
        for raw in ["1.8.0_321-b07", "17.0.8+7"] {
            assert_eq!(VersionRecord::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn target_versions_compare_numerically() {
        let threshold = TargetVersion::parse("1.17");
        assert!(!TargetVersion::parse("1.16.5").at_least(&threshold));
        assert!(TargetVersion::parse("1.17").at_least(&threshold));
        assert!(TargetVersion::parse("1.20.4").at_least(&threshold));
        assert!(TargetVersion::parse("2.0").at_least(&threshold));
        assert!(!TargetVersion::parse("1.9").at_least(&threshold));
        assert!(TargetVersion::parse("24w10a").at_least(&threshold));
    }
}
