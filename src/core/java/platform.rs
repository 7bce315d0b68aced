use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Supported host platforms. Each variant owns its executable layout and
/// its discovery pipeline (see `resolver`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for, if supported.
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "windows" => Some(Platform::Windows),
            "macos" => Some(Platform::MacOs),
            "linux" => Some(Platform::Linux),
            _ => None,
        }
    }

    /// Relative segments from an installation root to its launcher binary.
    fn exec_template(self) -> &'static [&'static str] {
        match self {
            Platform::Windows => &["bin", "javaw.exe"],
            Platform::MacOs => &["Contents", "Home", "bin", "java"],
            Platform::Linux => &["bin", "java"],
        }
    }

    /// Trailing segments that identify a Java executable. Windows accepts
    /// the windowed and console launchers interchangeably.
    fn exec_suffixes(self) -> &'static [[&'static str; 2]] {
        match self {
            Platform::Windows => &[["bin", "javaw.exe"], ["bin", "java.exe"]],
            Platform::MacOs | Platform::Linux => &[["bin", "java"]],
        }
    }

    pub fn exec_from_root(self, root: &Path) -> PathBuf {
        self.exec_template()
            .iter()
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    }

    /// True iff the trailing segments of `path` match this platform's
    /// executable suffix exactly.
    pub fn is_exec_path(self, path: &str) -> bool {
        if path.is_empty() || path.ends_with(['/', '\\']) {
            return false;
        }
        let segments = path
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        if segments.len() < 2 {
            return false;
        }
        let tail = &segments[segments.len() - 2..];
        self.exec_suffixes().iter().any(|suffix| {
            suffix.iter().zip(tail).all(|(expected, actual)| {
                if self == Platform::Windows {
                    expected.eq_ignore_ascii_case(actual)
                } else {
                    expected == actual
                }
            })
        })
    }

    /// The binary to actually spawn for `exec_path`. The windowed Windows
    /// launcher prints no diagnostics, so its console sibling is used.
    pub fn spawnable_exec(self, exec_path: &Path) -> PathBuf {
        if self != Platform::Windows {
            return exec_path.to_path_buf();
        }
        let is_windowed = exec_path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.eq_ignore_ascii_case("javaw.exe"));
        if is_windowed {
            exec_path.with_file_name("java.exe")
        } else {
            exec_path.to_path_buf()
        }
    }

    /// OS slug used by the Adoptium API.
    pub fn adoptium_os(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOs => "mac",
            Platform::Linux => "linux",
        }
    }

    /// OS slug and archive extension used by Corretto download links.
    pub fn corretto_os_and_ext(self) -> (&'static str, &'static str) {
        match self {
            Platform::Windows => ("windows", "zip"),
            Platform::MacOs => ("macos", "tar.gz"),
            Platform::Linux => ("linux", "tar.gz"),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
        })
    }
}
