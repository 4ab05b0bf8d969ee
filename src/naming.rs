use crate::config::warn_deprecated_var;
use crate::env::EnvSource;
use crate::logging::LogSink;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

pub const PROJECT_NAME_ENV: &str = "COMPOSE_PROJECT_NAME";
pub const DEPRECATED_PROJECT_NAME_ENV: &str = "FIG_PROJECT_NAME";
pub const FALLBACK_PROJECT_NAME: &str = "default";

/// Lowercase, then drop everything outside `[a-z0-9]`.
pub fn normalize_name(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let invalid = INVALID.get_or_init(|| Regex::new(r"[^a-z0-9]").expect("static regex"));
    invalid.replace_all(&name.to_lowercase(), "").into_owned()
}

/// Name the project.
///
/// Precedence: `explicit` > `COMPOSE_PROJECT_NAME` > `FIG_PROJECT_NAME` >
/// the directory holding the config file > `"default"`.
pub fn resolve_project_name(
    config_path: &Path,
    explicit: Option<&str>,
    env: &dyn EnvSource,
    log: &dyn LogSink,
) -> String {
    warn_deprecated_var(env, log, DEPRECATED_PROJECT_NAME_ENV, PROJECT_NAME_ENV);

    let chosen = explicit
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| env.non_empty(PROJECT_NAME_ENV))
        .or_else(|| env.non_empty(DEPRECATED_PROJECT_NAME_ENV));
    if let Some(name) = chosen {
        return normalize_name(&name);
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    let dir_name = absolutize(config_path, &cwd)
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if dir_name.is_empty() {
        FALLBACK_PROJECT_NAME.to_string()
    } else {
        normalize_name(&dir_name)
    }
}

/// Lexically absolute form of `path`: joined onto `cwd` when relative, with
/// `.` and `..` folded away. Symlinks are not followed.
fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
