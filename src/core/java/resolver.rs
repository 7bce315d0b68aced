// ─── Runtime Resolver ───
// Picks the discovery pipeline for a platform, validates every unique
// candidate and returns the best-ranked executable.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{info, instrument};

use super::compat::CompatibilityTable;
use super::discovery::{
    self, DiscoverySource, EnvironmentSource, FilesystemScanSource, PluginSource,
    RegistryOrVolumeScanSource, SystemVolumes, VolumeLister, MAC_PLUGIN_BUNDLE,
};
use super::paths::RuntimePaths;
use super::platform::Platform;
use super::probe::{BinaryValidator, ProbeStream, Validate};
use super::rank::{rank, RankedCandidate};
use super::registry::{system_registry, RegistryReader, RegistrySource};
use super::version::TargetVersion;

/// Caller-supplied inputs for one resolution. Nothing here is read from
/// ambient process state by the engine itself.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub compatibility: CompatibilityTable,
    /// Snapshot of the Java home environment variable.
    pub java_home: Option<String>,
    pub probe_timeout: Duration,
    pub probe_concurrency: usize,
    pub probe_stream: ProbeStream,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            compatibility: CompatibilityTable::default(),
            java_home: None,
            probe_timeout: Duration::from_secs(10),
            probe_concurrency: 4,
            probe_stream: ProbeStream::Auto,
        }
    }
}

/// Well-known install locations for one platform.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryLayout {
    pub system_jvm_dir: Option<PathBuf>,
    pub plugin_bundle: Option<PathBuf>,
    /// Vendor install directories, relative to each mounted volume.
    pub vendor_dirs: Vec<PathBuf>,
}

impl DiscoveryLayout {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Windows => Self {
                system_jvm_dir: None,
                plugin_bundle: None,
                vendor_dirs: ["Java", "Eclipse Adoptium", "Eclipse Foundation", "AdoptOpenJDK"]
                    .iter()
                    .map(|vendor| Path::new("Program Files").join(vendor))
                    .collect(),
            },
            Platform::MacOs => Self {
                system_jvm_dir: Some(PathBuf::from("/Library/Java/JavaVirtualMachines")),
                plugin_bundle: Some(PathBuf::from(MAC_PLUGIN_BUNDLE)),
                vendor_dirs: Vec::new(),
            },
            Platform::Linux => Self {
                system_jvm_dir: Some(PathBuf::from("/usr/lib/jvm")),
                plugin_bundle: None,
                vendor_dirs: Vec::new(),
            },
        }
    }
}

pub struct RuntimeResolver {
    platform: Platform,
    paths: RuntimePaths,
    layout: DiscoveryLayout,
    java_home: Option<String>,
    probe_concurrency: usize,
    registry: Arc<dyn RegistryReader>,
    volumes: Arc<dyn VolumeLister>,
    validator: Arc<dyn Validate>,
}

impl RuntimeResolver {
    pub fn new(
        platform: Platform,
        paths: RuntimePaths,
        target: TargetVersion,
        options: ResolveOptions,
    ) -> Self {
        let validator = BinaryValidator::new(platform, options.compatibility, target)
            .with_timeout(options.probe_timeout)
            .with_stream(options.probe_stream);
        Self {
            platform,
            paths,
            layout: DiscoveryLayout::for_platform(platform),
            java_home: options.java_home,
            probe_concurrency: options.probe_concurrency.max(1),
            registry: system_registry(),
            volumes: Arc::new(SystemVolumes),
            validator: Arc::new(validator),
        }
    }

    pub fn with_layout(mut self, layout: DiscoveryLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn RegistryReader>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_volumes(mut self, volumes: Arc<dyn VolumeLister>) -> Self {
        self.volumes = volumes;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validate>) -> Self {
        self.validator = validator;
        self
    }

    fn sources(&self) -> Vec<Box<dyn DiscoverySource>> {
        match self.platform {
            Platform::Windows => self.windows_sources(),
            Platform::MacOs => self.mac_sources(),
            Platform::Linux => self.linux_sources(),
        }
    }

    fn windows_sources(&self) -> Vec<Box<dyn DiscoverySource>> {
        vec![
            Box::new(RegistryOrVolumeScanSource {
                platform: self.platform,
                registry: RegistrySource::new(self.registry.clone()),
                volumes: self.volumes.clone(),
                vendor_dirs: self.layout.vendor_dirs.clone(),
            }),
            Box::new(self.runtime_cache_source()),
            Box::new(self.environment_source()),
        ]
    }

    fn mac_sources(&self) -> Vec<Box<dyn DiscoverySource>> {
        let mut sources: Vec<Box<dyn DiscoverySource>> = Vec::new();
        if let Some(dir) = &self.layout.system_jvm_dir {
            sources.push(Box::new(FilesystemScanSource::new(self.platform, dir)));
        }
        sources.push(Box::new(self.runtime_cache_source()));
        if let Some(bundle) = &self.layout.plugin_bundle {
            sources.push(Box::new(PluginSource {
                platform: self.platform,
                bundle: bundle.clone(),
            }));
        }
        sources.push(Box::new(self.environment_source()));
        sources
    }

    fn linux_sources(&self) -> Vec<Box<dyn DiscoverySource>> {
        let mut sources: Vec<Box<dyn DiscoverySource>> = Vec::new();
        if let Some(dir) = &self.layout.system_jvm_dir {
            sources.push(Box::new(FilesystemScanSource::new(self.platform, dir)));
        }
        sources.push(Box::new(self.runtime_cache_source()));
        sources.push(Box::new(self.environment_source()));
        sources
    }

    fn runtime_cache_source(&self) -> FilesystemScanSource {
        FilesystemScanSource::new(self.platform, self.paths.runtime_cache_dir())
    }

    fn environment_source(&self) -> EnvironmentSource {
        EnvironmentSource {
            platform: self.platform,
            value: self.java_home.clone(),
        }
    }

    /// Every valid installation, best first.
    #[instrument(skip(self), fields(platform = %self.platform))]
    pub async fn discover_all(&self) -> Vec<RankedCandidate> {
        let candidates = discovery::discover_all(&self.sources()).await;
        info!("Validating {} unique Java candidate(s)", candidates.len());

        let platform = self.platform;
        let validator = &self.validator;
        let results = stream::iter(candidates.into_vec())
            .map(|root| {
                let exec_path = platform.exec_from_root(&root);
                async move { validator.validate(&exec_path).await }
            })
            .buffered(self.probe_concurrency)
            .collect::<Vec<_>>()
            .await;

        let ranked = rank(results);
        info!("{} Java installation(s) passed validation", ranked.len());
        ranked
    }

    /// The best valid executable, or `None` if nothing qualifies.
    pub async fn resolve(&self) -> Option<PathBuf> {
        let best = self
            .discover_all()
            .await
            .into_iter()
            .next()
            .map(|candidate| candidate.exec_path);
        match &best {
            Some(path) => info!("Selected Java executable {}", path.display()),
            None => info!("No compatible Java installation found on {}", self.platform),
        }
        best
    }
}

/// Resolve the best local Java executable for `target` on `platform`.
pub async fn resolve(
    platform: Platform,
    app_data_dir: &Path,
    target: &str,
    options: ResolveOptions,
) -> Option<PathBuf> {
    RuntimeResolver::new(
        platform,
        RuntimePaths::new(app_data_dir),
        TargetVersion::parse(target),
        options,
    )
    .resolve()
    .await
}
