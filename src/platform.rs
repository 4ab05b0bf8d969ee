//! Host checks used only when diagnosing a failed engine connection.
//! None of these may fail: an unreadable answer means "unknown".

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    /// The Linux distribution we ship install guidance for.
    Ubuntu,
    Other,
}

pub trait PlatformClassifier: Send + Sync {
    fn classify(&self) -> Platform;
}

pub trait ExecutableLocator: Send + Sync {
    fn exists(&self, name: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct HostPlatform {
    os_release: PathBuf,
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self {
            os_release: PathBuf::from("/etc/os-release"),
        }
    }
}

impl HostPlatform {
    #[cfg(test)]
    fn with_os_release(path: &Path) -> Self {
        Self {
            os_release: path.to_path_buf(),
        }
    }
}

impl PlatformClassifier for HostPlatform {
    fn classify(&self) -> Platform {
        if cfg!(target_os = "macos") {
            return Platform::MacOs;
        }
        if cfg!(target_os = "linux") && is_ubuntu(&self.os_release) {
            return Platform::Ubuntu;
        }
        Platform::Other
    }
}

fn is_ubuntu(os_release: &Path) -> bool {
    let Ok(text) = fs::read_to_string(os_release) else {
        return false;
    };
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("ID="))
        .any(|id| id.trim_matches('"').eq_ignore_ascii_case("ubuntu"))
}

/// Looks binaries up on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPath;

impl ExecutableLocator for SearchPath {
    fn exists(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }
}
