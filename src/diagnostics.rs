use crate::errors::UserError;
use crate::platform::{ExecutableLocator, Platform, PlatformClassifier};

pub const ENGINE_BINARY: &str = "docker";
pub const VM_WRAPPER_BINARY: &str = "boot2docker";

/// Explain a failed connection to the engine at `base_url`.
///
/// Binary presence stands in for the real question ("why can't we reach the
/// engine?"): not installed, installed behind boot2docker, or installed but
/// unreachable. First match wins.
pub fn diagnose(
    locator: &dyn ExecutableLocator,
    platform: &dyn PlatformClassifier,
    base_url: &str,
) -> UserError {
    if !locator.exists(ENGINE_BINARY) {
        return match platform.classify() {
            Platform::MacOs => UserError::EngineNotFoundMac,
            Platform::Ubuntu => UserError::EngineNotFoundUbuntu,
            Platform::Other => UserError::EngineNotFoundGeneric,
        };
    }

    if locator.exists(VM_WRAPPER_BINARY) {
        return UserError::VmWrapperConnection;
    }

    UserError::Connection {
        base_url: base_url.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeLocator, FixedPlatform};
    use super::*;

    const URL: &str = "http+unix://var/run/docker.sock";

    fn expected(engine: bool, wrapper: bool, platform: Platform) -> UserError {
        match (engine, wrapper, platform) {
            (false, _, Platform::MacOs) => UserError::EngineNotFoundMac,
            (false, _, Platform::Ubuntu) => UserError::EngineNotFoundUbuntu,
            (false, _, Platform::Other) => UserError::EngineNotFoundGeneric,
            (true, true, _) => UserError::VmWrapperConnection,
            (true, false, _) => UserError::Connection {
                base_url: URL.to_string(),
            },
        }
    }

    #[test]
    fn every_host_combination_maps_to_its_variant() {
        for engine in [false, true] {
            for wrapper in [false, true] {
                for platform in [Platform::MacOs, Platform::Ubuntu, Platform::Other] {
                    let mut present = Vec::new();
                    if engine {
                        present.push(ENGINE_BINARY);
                    }
                    if wrapper {
                        present.push(VM_WRAPPER_BINARY);
                    }
                    let got = diagnose(&FakeLocator::with(&present), &FixedPlatform(platform), URL);
                    assert_eq!(
                        got,
                        expected(engine, wrapper, platform),
                        "engine={engine} wrapper={wrapper} platform={platform:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn generic_connection_error_carries_attempted_url() {
        let got = diagnose(
            &FakeLocator::with(&[ENGINE_BINARY]),
            &FixedPlatform(Platform::Other),
            "tcp://192.168.59.103:2376",
        );
        assert_eq!(
            got,
            UserError::Connection {
                base_url: "tcp://192.168.59.103:2376".into()
            }
        );
    }
}
