use thiserror::Error;

/// Failures the user can act on. These are the only errors `Dispatcher`
/// reports as diagnoses rather than as bugs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("SSL error: {0}")]
    Tls(String),

    #[error(
        "Couldn't connect to Docker daemon. You might need to install Docker:\n\n\
         https://docs.docker.com/installation/mac/"
    )]
    EngineNotFoundMac,

    #[error(
        "Couldn't connect to Docker daemon. You might need to install Docker:\n\n\
         https://docs.docker.com/installation/ubuntulinux/"
    )]
    EngineNotFoundUbuntu,

    #[error(
        "Couldn't connect to Docker daemon. You might need to install Docker:\n\n\
         https://docs.docker.com/installation/"
    )]
    EngineNotFoundGeneric,

    #[error("Couldn't connect to Docker daemon - you might need to run `boot2docker up`.")]
    VmWrapperConnection,

    #[error(
        "Couldn't connect to Docker daemon at {base_url} - is it running?\n\n\
         If it's at a non-standard location, specify the URL with the DOCKER_HOST \
         environment variable."
    )]
    Connection { base_url: String },

    #[error(
        "Can't find {0}. Are you in the right directory?\n\n\
         Supported filenames: docker-compose.yml, docker-compose.yaml"
    )]
    ComposeFileNotFound(String),

    #[error("{0}")]
    Generic(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_error_is_labelled() {
        let err = UserError::Tls("certificate verify failed".into());
        assert_eq!(err.to_string(), "SSL error: certificate verify failed");
    }

    #[test]
    fn connection_error_names_the_endpoint() {
        let err = UserError::Connection {
            base_url: "tcp://10.0.0.2:2375".into(),
        };
        let expected = "Couldn't connect to Docker daemon at tcp://10.0.0.2:2375 - is it running?";
        assert!(err.to_string().starts_with(expected));
    }

    #[test]
    fn not_found_mentions_supported_filenames() {
        let msg = UserError::ComposeFileNotFound("docker-compose.yml".into()).to_string();
        assert!(msg.starts_with("Can't find docker-compose.yml."));
        assert!(msg.ends_with("Supported filenames: docker-compose.yml, docker-compose.yaml"));
    }

    #[test]
    fn generic_error_is_verbatim() {
        assert_eq!(UserError::Generic("boom".into()).to_string(), "boom");
    }
}
