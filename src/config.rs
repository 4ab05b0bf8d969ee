use crate::env::EnvSource;
use crate::errors::UserError;
use crate::logging::LogSink;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

pub const DEFAULT_FILENAME: &str = "docker-compose.yml";
pub const LEGACY_FILENAME: &str = "docker-compose.yaml";

pub const FILE_ENV: &str = "COMPOSE_FILE";
pub const DEPRECATED_FILE_ENV: &str = "FIG_FILE";

/// Emit the two-line notice for a renamed environment variable, if the old
/// name is still set.
pub fn warn_deprecated_var(env: &dyn EnvSource, log: &dyn LogSink, old: &str, new: &str) {
    if env.contains(old) {
        log.warn(&format!("The {old} environment variable is deprecated."));
        log.warn(&format!("Please use {new} instead."));
    }
}

/// Pick the config file for this invocation.
///
/// Precedence: `explicit` > `COMPOSE_FILE` > `FIG_FILE` > discovery in
/// `base_dir`. Only discovery looks at the filesystem, and only to check
/// whether the legacy `.yaml` name exists.
pub fn resolve_config_path(
    base_dir: &Path,
    explicit: Option<&str>,
    env: &dyn EnvSource,
    log: &dyn LogSink,
) -> PathBuf {
    warn_deprecated_var(env, log, DEPRECATED_FILE_ENV, FILE_ENV);

    let chosen = explicit
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .or_else(|| env.non_empty(FILE_ENV))
        .or_else(|| env.non_empty(DEPRECATED_FILE_ENV));
    if let Some(file) = chosen {
        return base_dir.join(file);
    }

    let legacy = base_dir.join(LEGACY_FILENAME);
    if legacy.exists() {
        log.warn(&format!(
            "Compose just read the file '{LEGACY_FILENAME}' on startup, \
             rather than '{DEFAULT_FILENAME}'"
        ));
        log.warn(
            "Please be aware that .yml is the expected extension in most cases, \
             and using .yaml can cause compatibility issues in future",
        );
        return legacy;
    }

    base_dir.join(DEFAULT_FILENAME)
}

/// Read and parse the config file. A missing file is reported by base name
/// only; every other read or parse failure keeps its own message.
pub fn load_config(path: &Path) -> Result<serde_yaml::Value, UserError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => UserError::ComposeFileNotFound(base_name(path)),
        _ => UserError::Generic(format!("{}: {e}", path.display())),
    })?;
    let reader = BufReader::new(file);
    serde_yaml::from_reader(reader)
        .map_err(|e| UserError::Generic(format!("{}: {e}", path.display())))
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::testing::MapEnv;
    use crate::logging::testing::RecordingSink;
    use std::fs;

    fn resolve(base: &Path, explicit: Option<&str>, env: &MapEnv) -> (PathBuf, Vec<String>) {
        let log = RecordingSink::default();
        let path = resolve_config_path(base, explicit, env, &log);
        (path, log.warnings())
    }

    #[test]
    fn defaults_to_yml_even_if_missing() {
        let dir = tempfile::tempdir().unwrap();
        let (path, warnings) = resolve(dir.path(), None, &MapEnv::new());
        assert_eq!(path, dir.path().join("docker-compose.yml"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn legacy_yaml_is_used_with_two_warnings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LEGACY_FILENAME), "web:\n  image: busybox\n").unwrap();

        let (path, warnings) = resolve(dir.path(), None, &MapEnv::new());
        assert_eq!(path, dir.path().join("docker-compose.yaml"));
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("'docker-compose.yaml'"));
        assert!(warnings[1].contains(".yml is the expected extension"));
    }

    #[test]
    fn legacy_yaml_is_ignored_when_a_file_is_named() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LEGACY_FILENAME), "").unwrap();

        let (path, warnings) = resolve(dir.path(), Some("other.yml"), &MapEnv::new());
        assert_eq!(path, dir.path().join("other.yml"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn explicit_beats_both_env_vars() {
        let env = MapEnv::new()
            .with(FILE_ENV, "from-compose.yml")
            .with(DEPRECATED_FILE_ENV, "from-fig.yml");
        let (path, _) = resolve(Path::new("/base"), Some("explicit.yml"), &env);
        assert_eq!(path, PathBuf::from("/base/explicit.yml"));
    }

    #[test]
    fn compose_file_beats_fig_file() {
        let env = MapEnv::new()
            .with(FILE_ENV, "from-compose.yml")
            .with(DEPRECATED_FILE_ENV, "from-fig.yml");
        let (path, _) = resolve(Path::new("/base"), None, &env);
        assert_eq!(path, PathBuf::from("/base/from-compose.yml"));
    }

    #[test]
    fn fig_file_is_used_and_flagged() {
        let env = MapEnv::new().with(DEPRECATED_FILE_ENV, "fig.yml");
        let (path, warnings) = resolve(Path::new("/base"), None, &env);
        assert_eq!(path, PathBuf::from("/base/fig.yml"));
        assert_eq!(
            warnings,
            vec![
                "The FIG_FILE environment variable is deprecated.".to_string(),
                "Please use COMPOSE_FILE instead.".to_string(),
            ]
        );
    }

    #[test]
    fn fig_file_warns_even_when_overridden() {
        let env = MapEnv::new().with(DEPRECATED_FILE_ENV, "fig.yml");
        let (path, warnings) = resolve(Path::new("/base"), Some("explicit.yml"), &env);
        assert_eq!(path, PathBuf::from("/base/explicit.yml"));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn empty_sources_fall_through() {
        let env = MapEnv::new().with(FILE_ENV, "").with(DEPRECATED_FILE_ENV, "fig.yml");
        let (path, _) = resolve(Path::new("/base"), Some(""), &env);
        assert_eq!(path, PathBuf::from("/base/fig.yml"));
    }

    #[test]
    fn absolute_override_ignores_base_dir() {
        let explicit = Some("/tmp/x/docker-compose.yml");
        let (path, _) = resolve(Path::new("/base"), explicit, &MapEnv::new());
        assert_eq!(path, PathBuf::from("/tmp/x/docker-compose.yml"));
    }

    #[test]
    fn load_missing_file_reports_base_name_only() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("docker-compose.yml")).unwrap_err();
        assert_eq!(err, UserError::ComposeFileNotFound("docker-compose.yml".into()));
    }

    #[test]
    fn load_parses_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker-compose.yml");
        fs::write(&path, "web:\n  image: busybox\n").unwrap();

        let value = load_config(&path).unwrap();
        assert_eq!(value["web"]["image"].as_str(), Some("busybox"));
    }

    #[test]
    fn load_maps_parse_failures_to_generic_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker-compose.yml");
        fs::write(&path, "web: [unclosed\n").unwrap();

        match load_config(&path).unwrap_err() {
            UserError::Generic(msg) => assert!(msg.contains("docker-compose.yml")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_maps_directory_to_generic_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, UserError::Generic(_)), "{err:?}");
    }
}
