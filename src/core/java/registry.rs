// ─── Registry Source ───
// Java 8 installs register themselves under HKLM. Java 9+ uses the
// `JRE`/`JDK` keys instead, which are not read here.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::error::GuardResult;

use super::discovery::{CandidateSet, DiscoverySource, X86_MARKER};

pub const JAVA_REGISTRY_KEYS: [&str; 2] = [
    r"SOFTWARE\JavaSoft\Java Runtime Environment",
    r"SOFTWARE\JavaSoft\Java Development Kit",
];
const JAVA_HOME_VALUE: &str = "JavaHome";
const SUPPORTED_REGISTRY_VERSION: f64 = 1.8;

/// Read access to the 64-bit view of `HKEY_LOCAL_MACHINE`.
pub trait RegistryReader: Send + Sync {
    /// Names of the direct subkeys of `key`, or `None` if `key` is absent.
    fn subkeys(&self, key: &str) -> GuardResult<Option<Vec<String>>>;

    /// A string value stored under `key`, or `None` if absent.
    fn string_value(&self, key: &str, name: &str) -> GuardResult<Option<String>>;
}

#[derive(Clone)]
pub struct RegistrySource {
    reader: Arc<dyn RegistryReader>,
}

impl RegistrySource {
    pub fn new(reader: Arc<dyn RegistryReader>) -> Self {
        Self { reader }
    }

    /// Every eligible home under both roots. Each root is isolated: a
    /// missing key or failed enumeration only empties that root.
    pub fn scan(&self) -> CandidateSet {
        let mut set = CandidateSet::default();
        for root in JAVA_REGISTRY_KEYS {
            match scan_root(self.reader.as_ref(), root) {
                Ok(homes) => {
                    debug!("Registry key {root} listed {} Java home(s)", homes.len());
                    homes.into_iter().for_each(|home| {
                        set.insert(home);
                    });
                }
                Err(err) => warn!("Skipping registry key {root}: {err}"),
            }
        }
        set
    }
}

#[async_trait]
impl DiscoverySource for RegistrySource {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn discover(&self) -> CandidateSet {
        let source = self.clone();
        match tokio::task::spawn_blocking(move || source.scan()).await {
            Ok(set) => set,
            Err(err) => {
                warn!("Registry scan task failed: {err}");
                CandidateSet::default()
            }
        }
    }
}

fn scan_root(reader: &dyn RegistryReader, root: &str) -> GuardResult<Vec<PathBuf>> {
    let Some(versions) = reader.subkeys(root)? else {
        return Ok(Vec::new());
    };

    let mut homes = Vec::new();
    for version in versions
        .iter()
        .filter(|name| is_supported_registry_version(name))
    {
        let key = format!(r"{root}\{version}");
        match reader.string_value(&key, JAVA_HOME_VALUE) {
            Ok(Some(home)) if !home.contains(X86_MARKER) => homes.push(PathBuf::from(home)),
            Ok(Some(home)) => debug!("Ignoring 32-bit registry home {home:?}"),
            Ok(None) => debug!("{key} has no {JAVA_HOME_VALUE} value"),
            Err(err) => warn!("Failed to read {key}: {err}"),
        }
    }
    Ok(homes)
}

/// Version subkeys are matched on their leading decimal number, so both
/// `1.8` and `1.8.0_321` qualify while `1.7` and `11` do not.
fn is_supported_registry_version(name: &str) -> bool {
    leading_decimal(name).is_some_and(|value| value == SUPPORTED_REGISTRY_VERSION)
}

fn leading_decimal(text: &str) -> Option<f64> {
    let mut seen_dot = false;
    let end = text
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                false
            } else {
                !c.is_ascii_digit()
            }
        })
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    text[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Registry for the current host: the real one on Windows, an empty one
/// everywhere else.
pub fn system_registry() -> Arc<dyn RegistryReader> {
    #[cfg(windows)]
    {
        Arc::new(windows::WindowsRegistry)
    }
    #[cfg(not(windows))]
    {
        Arc::new(NoRegistry)
    }
}

/// A registry with no keys.
#[derive(Debug, Default)]
pub struct NoRegistry;

impl RegistryReader for NoRegistry {
    fn subkeys(&self, _key: &str) -> GuardResult<Option<Vec<String>>> {
        Ok(None)
    }

    fn string_value(&self, _key: &str, _name: &str) -> GuardResult<Option<String>> {
        Ok(None)
    }
}

#[cfg(windows)]
mod windows {
    use std::io::ErrorKind;

    use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_64KEY};
    use winreg::RegKey;

    use super::*;
    use crate::core::error::GuardError;

    pub struct WindowsRegistry;

    fn registry_err(key: &str, source: std::io::Error) -> GuardError {
        GuardError::Registry {
            key: key.to_string(),
            message: source.to_string(),
        }
    }

    fn open(key: &str) -> GuardResult<Option<RegKey>> {
        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        match hklm.open_subkey_with_flags(key, KEY_READ | KEY_WOW64_64KEY) {
            Ok(opened) => Ok(Some(opened)),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(registry_err(key, source)),
        }
    }

    impl RegistryReader for WindowsRegistry {
        fn subkeys(&self, key: &str) -> GuardResult<Option<Vec<String>>> {
            let Some(opened) = open(key)? else {
                return Ok(None);
            };
            opened
                .enum_keys()
                .collect::<Result<Vec<_>, _>>()
                .map(Some)
                .map_err(|source| registry_err(key, source))
        }

        fn string_value(&self, key: &str, name: &str) -> GuardResult<Option<String>> {
            let Some(opened) = open(key)? else {
                return Ok(None);
            };
            match opened.get_value::<String, _>(name) {
                Ok(value) => Ok(Some(value)),
                Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
                Err(source) => Err(registry_err(key, source)),
            }
        }
    }
}
