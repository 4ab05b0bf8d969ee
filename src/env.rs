use std::path::Path;

/// Read-only view of environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    fn contains(&self, key: &str) -> bool {
        self.var(key).is_some()
    }

    /// Value of `key`, treating an empty string as unset.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvLoad {
    pub loaded: Vec<String>,
    /// Files that could not be read or parsed, with the reason.
    pub skipped: Vec<String>,
}

/// Load `<base_dir>/.env` into the process environment.
/// Variables that are already set keep their values. A broken file never
/// stops the invocation: it is reported in `skipped` and loading carries on.
/// Runs before logging is set up, so the caller reports the outcome.
pub fn load_env(base_dir: &Path) -> EnvLoad {
    let mut report = EnvLoad::default();

    let dotenv = base_dir.join(".env");
    if dotenv.is_file() {
        match dotenvy::from_path(&dotenv) {
            Ok(()) => report.loaded.push(".env".to_string()),
            Err(e) => report.skipped.push(format!("{}: {e}", dotenv.display())),
        }
    }

    report
}

#[cfg(test)]
pub mod testing {
    use super::EnvSource;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Default)]
    pub struct MapEnv(HashMap<String, String>);

    impl MapEnv {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, key: &str, value: &str) -> Self {
            self.0.insert(key.to_string(), value.to_string());
            self
        }
    }

    impl EnvSource for MapEnv {
        fn var(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    /// Fails the test if anything reads the environment.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UntouchableEnv;

    impl EnvSource for UntouchableEnv {
        fn var(&self, key: &str) -> Option<String> {
            panic!("environment must not be consulted (read {key})");
        }
    }
}
