// ─── Binary Validation ───
// Spawns a candidate with `-XshowSettings:properties` and reads the
// architecture, runtime version and vendor out of the property dump.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::core::error::{GuardError, GuardResult};

use super::compat::CompatibilityTable;
use super::platform::Platform;
use super::version::{TargetVersion, VersionRecord};

const ARCH_PROPERTY: &str = "sun.arch.data.model";
const VERSION_PROPERTY: &str = "java.runtime.version";
// Trailing space keeps `java.vendor.url` and friends out.
const VENDOR_PROPERTY: &str = "java.vendor ";
const REQUIRED_ARCH_BITS: u32 = 64;
/// Conditions that must hold for a runtime to be valid: 64-bit and an
/// accepted version.
const VALIDITY_GOAL: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub exec_path: PathBuf,
    pub arch_bits: Option<u32>,
    pub version: Option<VersionRecord>,
    pub vendor: Option<String>,
    pub valid: bool,
}

impl ValidationResult {
    pub fn invalid(exec_path: &Path) -> Self {
        Self {
            exec_path: exec_path.to_path_buf(),
            arch_bits: None,
            version: None,
            vendor: None,
            valid: false,
        }
    }
}

/// Which output stream carries the property dump. HotSpot has written it
/// to stderr for as long as the flag has existed, but that is not a
/// documented guarantee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStream {
    /// stderr, or stdout if stderr carries no known property.
    #[default]
    Auto,
    Stderr,
    Stdout,
}

#[async_trait]
pub trait Validate: Send + Sync {
    /// Never fails: anything that goes wrong yields an invalid result.
    async fn validate(&self, exec_path: &Path) -> ValidationResult;
}

#[derive(Debug, Clone)]
pub struct BinaryValidator {
    pub platform: Platform,
    pub compatibility: CompatibilityTable,
    pub target: TargetVersion,
    pub timeout: Duration,
    pub stream: ProbeStream,
}

impl BinaryValidator {
    pub fn new(platform: Platform, compatibility: CompatibilityTable, target: TargetVersion) -> Self {
        Self {
            platform,
            compatibility,
            target,
            timeout: Duration::from_secs(10),
            stream: ProbeStream::Auto,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stream(mut self, stream: ProbeStream) -> Self {
        self.stream = stream;
        self
    }

    pub fn is_executable_path(&self, path: Option<&Path>) -> bool {
        path.is_some_and(|path| self.platform.is_exec_path(&path.to_string_lossy()))
    }

    #[instrument(skip(self))]
    async fn probe(&self, exec_path: &Path) -> GuardResult<ValidationResult> {
        let spawn_path = self.platform.spawnable_exec(exec_path);
        let mut command = Command::new(&spawn_path);
        command
            .args(["-XshowSettings:properties", "-version"])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| GuardError::ProbeTimeout {
                path: spawn_path.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| GuardError::ValidationSpawn {
                path: spawn_path.clone(),
                source,
            })?;

        let properties = self.select_stream(&output);
        self.parse_properties(exec_path, &properties)
    }

    fn select_stream(&self, output: &Output) -> String {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let chosen = match self.stream {
            ProbeStream::Stderr => stderr,
            ProbeStream::Stdout => stdout,
            ProbeStream::Auto if has_known_property(&stderr) => stderr,
            ProbeStream::Auto => stdout,
        };
        chosen.into_owned()
    }

    /// Scan a property dump. Stops as soon as both validity conditions
    /// hold; a malformed runtime version fails the whole parse.
    pub fn parse_properties(&self, exec_path: &Path, output: &str) -> GuardResult<ValidationResult> {
        let mut result = ValidationResult::invalid(exec_path);
        let mut checksum = 0;

        for line in output.lines() {
            if line.contains(ARCH_PROPERTY) {
                debug!("{}", line.trim());
                let Ok(bits) = property_value(line).parse::<u32>() else {
                    continue;
                };
                result.arch_bits = Some(bits);
                if bits == REQUIRED_ARCH_BITS {
                    checksum += 1;
                }
            } else if line.contains(VERSION_PROPERTY) {
                debug!("{}", line.trim());
                let version = VersionRecord::parse(property_value(line))?;
                result.version = Some(version);
                if self.compatibility.accepts(&self.target, &version) {
                    checksum += 1;
                }
            } else if line.contains(VENDOR_PROPERTY) {
                debug!("{}", line.trim());
                result.vendor = Some(property_value(line).to_string());
            }

            if checksum == VALIDITY_GOAL {
                break;
            }
        }

        result.valid = checksum == VALIDITY_GOAL;
        Ok(result)
    }
}

#[async_trait]
impl Validate for BinaryValidator {
    async fn validate(&self, exec_path: &Path) -> ValidationResult {
        if !self.is_executable_path(Some(exec_path)) {
            debug!("{exec_path:?} is not a Java executable path");
            return ValidationResult::invalid(exec_path);
        }
        if !tokio::fs::try_exists(exec_path).await.unwrap_or(false) {
            return ValidationResult::invalid(exec_path);
        }

        match self.probe(exec_path).await {
            Ok(result) => result,
            Err(err) => {
                debug!("Rejecting {exec_path:?}: {err}");
                ValidationResult::invalid(exec_path)
            }
        }
    }
}

fn has_known_property(output: &str) -> bool {
    output.contains(ARCH_PROPERTY) || output.contains(VERSION_PROPERTY)
}

fn property_value(line: &str) -> &str {
    line.split_once('=').map(|(_, value)| value.trim()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAVA_8_DUMP: &str = "Property settings:
    file.encoding = UTF-8
    java.runtime.version = 1.8.0_321-b07
    java.vendor = Oracle Corporation
    java.vendor.url = http://java.oracle.com/
    sun.arch.data.model = 64

java version \"1.8.0_321\"";

    fn validator(target: &str) -> BinaryValidator {
        BinaryValidator::new(
            Platform::Linux,
            CompatibilityTable::default(),
            TargetVersion::parse(target),
        )
    }

    fn exec() -> PathBuf {
        PathBuf::from("/opt/jre8/bin/java")
    }

    #[test]
    fn java_8_dump_is_valid_for_old_targets() {
        let result = validator("1.12.2")
            .parse_properties(&exec(), JAVA_8_DUMP)
            .unwrap();
        assert!(result.valid);
        assert_eq!(result.arch_bits, Some(64));
        assert_eq!(result.vendor.as_deref(), Some("Oracle Corporation"));
        assert_eq!(
            result.version,
            Some(VersionRecord::Legacy {
                major: 8,
                update: 321,
                build: 7
            })
        );
    }

    #[test]
    fn java_8_dump_is_invalid_for_new_targets() {
        let result = validator("1.20.4")
            .parse_properties(&exec(), JAVA_8_DUMP)
            .unwrap();
        assert!(!result.valid);
    }

    #[test]
    fn update_at_or_below_floor_is_invalid() {
        let dump = "java.runtime.version = 1.8.0_40-b25\nsun.arch.data.model = 64\n";
        let result = validator("1.12.2").parse_properties(&exec(), dump).unwrap();
        assert_eq!(result.arch_bits, Some(64));
        assert!(!result.valid);
    }

    #[test]
    fn distro_java_8_is_valid_for_old_targets() {
        let dump = "java.runtime.version = 1.8.0_392-8u392-ga-1~22.04-b08\nsun.arch.data.model = 64\n";
        let result = validator("1.12.2").parse_properties(&exec(), dump).unwrap();
        assert!(result.valid);
    }

    #[test]
    fn thirty_two_bit_runtime_is_invalid() {
        let dump = "java.runtime.version = 17.0.8+7\nsun.arch.data.model = 32\n";
        let result = validator("1.20.4").parse_properties(&exec(), dump).unwrap();
        assert_eq!(result.arch_bits, Some(32));
        assert!(!result.valid);
    }

    #[test]
    fn malformed_version_fails_parse() {
        let dump = "java.runtime.version = garbage\nsun.arch.data.model = 64\n";
        assert!(matches!(
            validator("1.20.4").parse_properties(&exec(), dump),
            Err(GuardError::MalformedVersion { .. })
        ));
    }

    #[test]
    fn vendor_is_optional() {
        let dump = "java.runtime.version = 17.0.8+7\nsun.arch.data.model = 64\n";
        let result = validator("1.20.4").parse_properties(&exec(), dump).unwrap();
        assert!(result.valid);
        assert_eq!(result.vendor, None);
    }

    #[test]
    fn executable_path_check() {
        let validator = validator("1.20.4");
        assert!(!validator.is_executable_path(None));
        assert!(!validator.is_executable_path(Some(Path::new(""))));
        assert!(!validator.is_executable_path(Some(Path::new("/opt/jdk/bin"))));
        assert!(validator.is_executable_path(Some(Path::new("/opt/jdk/bin/java"))));
    }

    #[tokio::test]
    async fn non_executable_or_missing_paths_are_invalid() {
        let validator = validator("1.20.4");
        assert!(!validator.validate(Path::new("/opt/jdk/lib/rt.jar")).await.valid);
        assert!(!validator.validate(Path::new("/nonexistent/jdk/bin/java")).await.valid);
    }

    #[cfg(unix)]
    mod spawn {
        use std::os::unix::fs::PermissionsExt;

        use super::*;

        fn fake_java(root: &Path, script_body: &str) -> PathBuf {
            let exec = Platform::Linux.exec_from_root(root);
            std::fs::create_dir_all(exec.parent().unwrap()).unwrap();
            std::fs::write(&exec, format!("#!/bin/sh\n{script_body}\n")).unwrap();
            std::fs::set_permissions(&exec, std::fs::Permissions::from_mode(0o755)).unwrap();
            exec
        }

        #[tokio::test]
        async fn reads_properties_from_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let exec = fake_java(
                dir.path(),
                "echo '    java.runtime.version = 17.0.8+7' >&2\necho '    sun.arch.data.model = 64' >&2",
            );
            let result = validator("1.20.4").validate(&exec).await;
            assert!(result.valid);
            assert_eq!(result.exec_path, exec);
        }

        #[tokio::test]
        async fn falls_back_to_stdout_when_stderr_is_silent() {
            let dir = tempfile::tempdir().unwrap();
            let exec = fake_java(
                dir.path(),
                "echo 'java.runtime.version = 21.0.2+13'\necho 'sun.arch.data.model = 64'",
            );
            assert!(validator("1.20.4").validate(&exec).await.valid);
            assert!(
                !validator("1.20.4")
                    .with_stream(ProbeStream::Stderr)
                    .validate(&exec)
                    .await
                    .valid
            );
        }

        #[tokio::test]
        async fn hung_binary_times_out_as_invalid() {
            let dir = tempfile::tempdir().unwrap();
            let exec = fake_java(dir.path(), "sleep 30");
            let result = validator("1.20.4")
                .with_timeout(Duration::from_millis(200))
                .validate(&exec)
                .await;
            assert!(!result.valid);
        }

        #[tokio::test]
        async fn crashing_binary_is_invalid() {
            let dir = tempfile::tempdir().unwrap();
            let exec = fake_java(dir.path(), "echo 'Error: could not open jvm.cfg' >&2\nexit 1");
            assert!(!validator("1.20.4").validate(&exec).await.valid);
        }
    }
}
