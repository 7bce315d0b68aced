use std::cmp::Ordering;
use std::path::PathBuf;

use serde::Serialize;

use super::probe::ValidationResult;
use super::version::VersionRecord;

/// Path token that marks a full development kit.
const JDK_MARKER: &str = "jdk";

/// A valid runtime, positioned in descending preference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCandidate {
    pub exec_path: PathBuf,
    pub arch_bits: u32,
    pub version: VersionRecord,
    pub vendor: Option<String>,
}

/// Drop invalid results and sort the rest best-first. The sort is stable,
/// so candidates that compare equal keep their discovery order.
pub fn rank(results: Vec<ValidationResult>) -> Vec<RankedCandidate> {
    let mut ranked = results
        .into_iter()
        .filter(|result| result.valid)
        .filter_map(|result| {
            Some(RankedCandidate {
                arch_bits: result.arch_bits?,
                version: result.version?,
                exec_path: result.exec_path,
                vendor: result.vendor,
            })
        })
        .collect::<Vec<_>>();
    ranked.sort_by(compare_preference);
    ranked
}

/// `Less` means `a` is preferred over `b`.
fn compare_preference(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.version
        .major()
        .cmp(&a.version.major())
        .then_with(|| b.version.secondary_keys().cmp(&a.version.secondary_keys()))
        .then_with(|| is_development_kit(a).cmp(&is_development_kit(b)))
}

fn is_development_kit(candidate: &RankedCandidate) -> bool {
    candidate
        .exec_path
        .to_string_lossy()
        .to_lowercase()
        .contains(JDK_MARKER)
}
