use std::fmt;

/// Errors raised while building a [`MapConfig`](crate::MapConfig) from
/// external input. The runtime sync path has no error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The input could not be decoded into a configuration.
    Parse(String),
    /// A coordinate was NaN or infinite.
    NonFiniteCoordinate { field: &'static str },
    /// The zoom level was NaN, infinite or negative.
    InvalidZoom(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(message) => write!(f, "invalid map configuration: {}", message),
            ConfigError::NonFiniteCoordinate { field } => {
                write!(f, "coordinate {} must be a finite number", field)
            }
            ConfigError::InvalidZoom(value) => {
                write!(f, "zoom must be a finite, non-negative number (got {})", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ConfigError::NonFiniteCoordinate { field: "center.lat" }.to_string(),
            "coordinate center.lat must be a finite number"
        );
        assert!(ConfigError::InvalidZoom("-1".into())
            .to_string()
            .contains("got -1"));
    }

    #[test]
    fn from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: ConfigError = err.into();
        assert!(matches!(converted, ConfigError::Parse(_)));
    }
}
