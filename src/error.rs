/// Startup failures. Any of these stops the process before it serves requests.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid {var}='{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid MEM0_PROVIDER '{value}'. Must be one of: {allowed}")]
    UnknownProvider { value: String, allowed: String },
    #[error("unsupported MEMORY_SEARCH_DRIVER '{value}'. Must be one of: {allowed}")]
    UnknownSearchDriver { value: String, allowed: String },
    #[error("{0} support is not compiled in (enable the `{0}` feature)")]
    FeatureDisabled(&'static str),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_build_failure_is_a_config_error() {
        let build_err = reqwest::Client::builder()
            .user_agent("bad\nagent")
            .build()
            .unwrap_err();
        let err = ConfigError::from(build_err);
        assert!(matches!(err, ConfigError::HttpClient(_)));
        assert!(err.to_string().starts_with("failed to build HTTP client"));
    }
}
