use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{GuardError, GuardResult};
use crate::core::java::compat::CompatibilityTable;
use crate::core::java::paths::RuntimePaths;
use crate::core::java::probe::ProbeStream;
use crate::core::java::remote::RemoteOptions;
use crate::core::java::resolver::ResolveOptions;

/// User-tunable knobs, persisted as `java_guard.json` in the application
/// data directory. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardSettings {
    /// Name of the environment variable holding a Java home.
    pub java_home_var: String,
    pub probe_timeout_secs: u64,
    pub probe_concurrency: usize,
    pub probe_stream: ProbeStream,
    pub remote_timeout_secs: u64,
    /// Replaces the built-in compatibility table when present.
    pub compatibility: Option<CompatibilityTable>,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            java_home_var: "JAVA_HOME".to_string(),
            probe_timeout_secs: 10,
            probe_concurrency: 4,
            probe_stream: ProbeStream::Auto,
            remote_timeout_secs: 30,
            compatibility: None,
        }
    }
}

impl GuardSettings {
    /// Settings from disk, or defaults if the file is missing or unreadable.
    pub fn load(paths: &RuntimePaths) -> Self {
        let file = paths.settings_file();
        match Self::read(&file) {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No settings at {}, using defaults", file.display());
                Self::default()
            }
            Err(err) => {
                warn!("Ignoring settings file: {}", err);
                Self::default()
            }
        }
    }

    fn read(file: &Path) -> GuardResult<Option<Self>> {
        let raw = match std::fs::read_to_string(file) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(GuardError::Io {
                    path: file.to_path_buf(),
                    source,
                })
            }
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save(&self, paths: &RuntimePaths) -> GuardResult<()> {
        let file = paths.settings_file();
        std::fs::create_dir_all(paths.app_data_dir()).map_err(|source| GuardError::Io {
            path: paths.app_data_dir().to_path_buf(),
            source,
        })?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&file, json).map_err(|source| GuardError::Io { path: file, source })
    }

    /// Options for the resolver, reading the Java home variable from the
    /// process environment.
    pub fn resolve_options(&self) -> ResolveOptions {
        self.resolve_options_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_options_with(&self, env: impl Fn(&str) -> Option<String>) -> ResolveOptions {
        ResolveOptions {
            compatibility: self.compatibility_table(),
            java_home: env(&self.java_home_var).filter(|value| !value.trim().is_empty()),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            probe_concurrency: self.probe_concurrency,
            probe_stream: self.probe_stream,
        }
    }

    pub fn remote_options(&self) -> RemoteOptions {
        RemoteOptions {
            timeout: Duration::from_secs(self.remote_timeout_secs),
            ..RemoteOptions::default()
        }
    }

    pub fn compatibility_table(&self) -> CompatibilityTable {
        self.compatibility.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RuntimePaths::new(dir.path());
        assert_eq!(GuardSettings::load(&paths), GuardSettings::default());
    }

    #[test]
    fn garbled_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RuntimePaths::new(dir.path());
        std::fs::write(paths.settings_file(), "{ not json").unwrap();
        assert_eq!(GuardSettings::load(&paths), GuardSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RuntimePaths::new(dir.path());
        std::fs::write(
            paths.settings_file(),
            r#"{ "java_home_var": "GAME_JAVA", "probe_stream": "stdout" }"#,
        )
        .unwrap();

        let settings = GuardSettings::load(&paths);
        assert_eq!(settings.java_home_var, "GAME_JAVA");
        assert_eq!(settings.probe_stream, ProbeStream::Stdout);
        assert_eq!(settings.probe_concurrency, 4);
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RuntimePaths::new(dir.path().join("nested"));
        let settings = GuardSettings {
            probe_timeout_secs: 3,
            compatibility: Some(CompatibilityTable::default()),
            ..GuardSettings::default()
        };
        settings.save(&paths).unwrap();
        assert_eq!(GuardSettings::load(&paths), settings);
    }

    #[test]
    fn resolve_options_read_configured_variable() {
        let settings = GuardSettings {
            java_home_var: "GAME_JAVA".to_string(),
            ..GuardSettings::default()
        };
        let options = settings.resolve_options_with(|name| {
            (name == "GAME_JAVA").then(|| "/opt/jdk-17".to_string())
        });
        assert_eq!(options.java_home.as_deref(), Some("/opt/jdk-17"));
        assert_eq!(options.probe_timeout, Duration::from_secs(10));

        let blank = settings.resolve_options_with(|_| Some("  ".to_string()));
        assert_eq!(blank.java_home, None);
    }
}
