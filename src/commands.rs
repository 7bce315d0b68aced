use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::{GuardError, GuardResult};
use crate::core::java::paths::RuntimePaths;
use crate::core::java::{self, Platform, RankedCandidate, RemotePackageMeta, RuntimeResolver, TargetVersion};
use crate::core::settings::GuardSettings;

// ─── Payloads ───

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveJavaPayload {
    pub target_version: String,
    /// Defaults to the host platform.
    pub platform: Option<Platform>,
    /// Defaults to the per-user data directory.
    pub app_data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteJavaPayload {
    pub platform: Option<Platform>,
    pub major: Option<u32>,
    /// Used to pick a major when `major` is not given.
    pub target_version: Option<String>,
    pub app_data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedJava {
    pub platform: Platform,
    pub target_version: String,
    pub exec_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JavaInstallation {
    pub exec_path: String,
    pub version: String,
    pub major: u32,
    pub arch_bits: u32,
    pub vendor: Option<String>,
}

impl From<RankedCandidate> for JavaInstallation {
    fn from(candidate: RankedCandidate) -> Self {
        Self {
            exec_path: candidate.exec_path.to_string_lossy().to_string(),
            version: candidate.version.to_string(),
            major: candidate.version.major(),
            arch_bits: candidate.arch_bits,
            vendor: candidate.vendor,
        }
    }
}

// ─── Commands ───

pub async fn resolve_java(payload: ResolveJavaPayload) -> GuardResult<ResolvedJava> {
    let platform = platform_or_host(payload.platform)?;
    let resolver = build_resolver(platform, payload.app_data_dir, &payload.target_version);
    let exec_path = resolver.resolve().await;

    Ok(ResolvedJava {
        platform,
        target_version: payload.target_version,
        exec_path: exec_path.map(|path| path.to_string_lossy().to_string()),
    })
}

pub async fn list_java_installations(payload: ResolveJavaPayload) -> GuardResult<Vec<JavaInstallation>> {
    let platform = platform_or_host(payload.platform)?;
    let resolver = build_resolver(platform, payload.app_data_dir, &payload.target_version);
    Ok(resolver
        .discover_all()
        .await
        .into_iter()
        .map(JavaInstallation::from)
        .collect())
}

pub async fn locate_remote_java(payload: RemoteJavaPayload) -> GuardResult<Option<RemotePackageMeta>> {
    let platform = platform_or_host(payload.platform)?;
    let settings = GuardSettings::load(&runtime_paths(payload.app_data_dir));

    let major = match (payload.major, payload.target_version) {
        (Some(major), _) => major,
        (None, Some(target)) => settings
            .compatibility_table()
            .recommended_major(&TargetVersion::parse(&target))
            .ok_or_else(|| GuardError::Other(format!("No Java major is mapped to target {target}")))?,
        (None, None) => {
            return Err(GuardError::Other(
                "Either a Java major or a target version is required".into(),
            ))
        }
    };

    Ok(java::locate_latest(platform, major, settings.remote_options()).await)
}

fn build_resolver(platform: Platform, app_data_dir: Option<PathBuf>, target: &str) -> RuntimeResolver {
    let paths = runtime_paths(app_data_dir);
    let options = GuardSettings::load(&paths).resolve_options();
    RuntimeResolver::new(platform, paths, TargetVersion::parse(target), options)
}

fn runtime_paths(app_data_dir: Option<PathBuf>) -> RuntimePaths {
    app_data_dir.map_or_else(RuntimePaths::from_default_dir, |dir| RuntimePaths::new(dir))
}

fn platform_or_host(platform: Option<Platform>) -> GuardResult<Platform> {
    platform
        .or_else(Platform::current)
        .ok_or_else(|| GuardError::Other(format!("Unsupported host OS {}", std::env::consts::OS)))
}
