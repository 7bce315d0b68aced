pub mod compat;
pub mod discovery;
pub mod paths;
pub mod platform;
pub mod probe;
pub mod rank;
pub mod registry;
pub mod remote;
pub mod resolver;
pub mod version;

pub use platform::Platform;
pub use rank::RankedCandidate;
pub use remote::{locate_latest, RemoteOptions, RemotePackageMeta};
pub use resolver::{resolve, ResolveOptions, RuntimeResolver};
pub use version::{TargetVersion, VersionRecord};
