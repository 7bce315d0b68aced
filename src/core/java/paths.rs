use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "JavaGuard";

/// Directories the engine reads from, rooted at the application data
/// directory supplied by the caller.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    app_data_dir: PathBuf,
}

impl RuntimePaths {
    pub fn new(app_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_data_dir: app_data_dir.into(),
        }
    }

    /// `dirs::data_dir()/JavaGuard`, or the working directory when the
    /// platform reports no data directory.
    pub fn from_default_dir() -> Self {
        Self::new(default_app_data_dir())
    }

    pub fn app_data_dir(&self) -> &Path {
        &self.app_data_dir
    }

    /// Runtimes unpacked by the launcher's own downloader.
    pub fn runtime_cache_dir(&self) -> PathBuf {
        self.app_data_dir.join("runtime").join("x64")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.app_data_dir.join("java_guard.json")
    }
}

pub fn default_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
