// ─── Discovery Sources ───
// Independent probes that each contribute candidate installation roots.
// A failing source logs and contributes nothing; it never aborts siblings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::core::error::{GuardError, GuardResult};

use super::platform::Platform;
use super::registry::RegistrySource;

/// Marker found in 32-bit install locations on Windows.
pub const X86_MARKER: &str = "(x86)";
/// Internal layout of a macOS runtime bundle below its root.
const MAC_BUNDLE_HOME: &str = "/Contents/Home";

/// Candidate roots in first-seen order, unique by normalized path.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    roots: Vec<PathBuf>,
    seen: HashSet<String>,
}

impl CandidateSet {
    /// Returns false if an equivalent root was already present.
    pub fn insert(&mut self, root: PathBuf) -> bool {
        if !self.seen.insert(normalize_root(&root)) {
            return false;
        }
        self.roots.push(root);
        true
    }

    /// Single-writer merge point for fanned-out sources.
    pub fn merge(&mut self, other: CandidateSet) {
        for root in other.roots {
            self.insert(root);
        }
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.roots
    }
}

impl FromIterator<PathBuf> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut set = CandidateSet::default();
        for root in iter {
            set.insert(root);
        }
        set
    }
}

/// Comparison key for a root: lexically cleaned, without trailing
/// separators, case-folded where the host filesystem is case-insensitive.
pub fn normalize_root(path: &Path) -> String {
    let cleaned = path.components().collect::<PathBuf>();
    let text = cleaned.to_string_lossy();
    let trimmed = text.trim_end_matches(['/', '\\']);
    let key = if trimmed.is_empty() { &*text } else { trimmed };
    if cfg!(windows) {
        key.to_lowercase()
    } else {
        key.to_string()
    }
}

/// Rebase a path that ends in a macOS runtime bundle's home
/// (`.../jdk.jdk/Contents/Home`) back to the bundle root.
pub fn normalize_bundle_root(path: &str) -> &str {
    path.trim_end_matches('/')
        .strip_suffix(MAC_BUNDLE_HOME)
        .unwrap_or(path)
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[async_trait]
pub trait DiscoverySource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn discover(&self) -> CandidateSet;
}

/// Run every source concurrently and merge their results in source order.
pub async fn discover_all(sources: &[Box<dyn DiscoverySource>]) -> CandidateSet {
    let results = join_all(sources.iter().map(|source| async move {
        let found = source.discover().await;
        debug!("{} contributed {} candidate(s)", source.name(), found.len());
        found
    }))
    .await;

    let mut merged = CandidateSet::default();
    for found in results {
        merged.merge(found);
    }
    merged
}

// ── Environment variable ────────────────────────────────

/// The value of one environment variable, captured by the caller.
#[derive(Debug, Clone)]
pub struct EnvironmentSource {
    pub platform: Platform,
    pub value: Option<String>,
}

#[async_trait]
impl DiscoverySource for EnvironmentSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn discover(&self) -> CandidateSet {
        let mut set = CandidateSet::default();
        let Some(raw) = self.value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
            return set;
        };
        if !path_exists(Path::new(raw)).await {
            debug!("Ignoring Java home {raw:?}: path does not exist");
            return set;
        }

        let root = match self.platform {
            Platform::Windows if raw.contains(X86_MARKER) => {
                debug!("Ignoring 32-bit Java home {raw:?}");
                return set;
            }
            Platform::MacOs => normalize_bundle_root(raw),
            _ => raw,
        };
        set.insert(PathBuf::from(root));
        set
    }
}

// ── Filesystem scan ─────────────────────────────────────

/// Children of `dir` whose derived executable exists.
#[derive(Debug, Clone)]
pub struct FilesystemScanSource {
    pub platform: Platform,
    pub dir: PathBuf,
}

impl FilesystemScanSource {
    pub fn new(platform: Platform, dir: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            dir: dir.into(),
        }
    }

    async fn scan(&self) -> GuardResult<CandidateSet> {
        let mut set = CandidateSet::default();
        if !path_exists(&self.dir).await {
            return Ok(set);
        }

        let io_err = |source| GuardError::DiscoveryIo {
            path: self.dir.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            children.push(entry.path());
        }
        // Directory order is filesystem-defined; keep discovery stable.
        children.sort();

        for child in children {
            if path_exists(&self.platform.exec_from_root(&child)).await {
                set.insert(child);
            }
        }
        Ok(set)
    }
}

#[async_trait]
impl DiscoverySource for FilesystemScanSource {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn discover(&self) -> CandidateSet {
        match self.scan().await {
            Ok(set) => set,
            Err(err) => {
                warn!("Skipping {:?}: {}", self.dir, err);
                CandidateSet::default()
            }
        }
    }
}

// ── Browser plugin bundle ───────────────────────────────

pub const MAC_PLUGIN_BUNDLE: &str = "/Library/Internet Plug-Ins/JavaAppletPlugin.plugin";

#[derive(Debug, Clone)]
pub struct PluginSource {
    pub platform: Platform,
    pub bundle: PathBuf,
}

#[async_trait]
impl DiscoverySource for PluginSource {
    fn name(&self) -> &'static str {
        "plugin"
    }

    async fn discover(&self) -> CandidateSet {
        let mut set = CandidateSet::default();
        if path_exists(&self.platform.exec_from_root(&self.bundle)).await {
            set.insert(self.bundle.clone());
        }
        set
    }
}

// ── Mounted volumes ─────────────────────────────────────

pub trait VolumeLister: Send + Sync {
    fn mount_points(&self) -> Vec<PathBuf>;
}

/// Mount points reported by the operating system.
#[derive(Debug, Default)]
pub struct SystemVolumes;

impl VolumeLister for SystemVolumes {
    fn mount_points(&self) -> Vec<PathBuf> {
        let disks = sysinfo::Disks::new_with_refreshed_list();
        let mut mounts = disks
            .list()
            .iter()
            .map(|disk| disk.mount_point().to_path_buf())
            .collect::<Vec<_>>();
        mounts.sort();
        mounts.dedup();
        mounts
    }
}

/// Registry lookup, falling back to a scan of vendor install directories
/// on every mounted volume when the registry knows of nothing.
pub struct RegistryOrVolumeScanSource {
    pub platform: Platform,
    pub registry: RegistrySource,
    pub volumes: Arc<dyn VolumeLister>,
    /// Install directories relative to a volume root.
    pub vendor_dirs: Vec<PathBuf>,
}

impl RegistryOrVolumeScanSource {
    fn fallback_sources(&self) -> Vec<FilesystemScanSource> {
        self.volumes
            .mount_points()
            .iter()
            .flat_map(|mount| {
                self.vendor_dirs
                    .iter()
                    .map(move |vendor| FilesystemScanSource::new(self.platform, mount.join(vendor)))
            })
            .collect()
    }
}

#[async_trait]
impl DiscoverySource for RegistryOrVolumeScanSource {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn discover(&self) -> CandidateSet {
        let from_registry = self.registry.discover().await;
        if !from_registry.is_empty() {
            return from_registry;
        }

        let fallback = self.fallback_sources();
        debug!(
            "Registry listed no Java homes, scanning {} volume location(s)",
            fallback.len()
        );
        let results = join_all(fallback.iter().map(|source| source.discover())).await;
        let mut merged = CandidateSet::default();
        for found in results {
            merged.merge(found);
        }
        merged
    }
}
