//! Domain error types.

/// Top-level error type for wfopt.
///
/// Variants fall into three classes that callers must be able to tell
/// apart: configuration mistakes, malformed input data, and data that could
/// not be obtained at all. None of them are retried inside the crate.
#[derive(Debug, thiserror::Error)]
pub enum WfoptError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data integrity error: {reason}")]
    DataIntegrity { reason: String },

    #[error("data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WfoptError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        WfoptError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn data_integrity(reason: impl Into<String>) -> Self {
        WfoptError::DataIntegrity {
            reason: reason.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            WfoptError::Configuration { .. }
                | WfoptError::ConfigParse { .. }
                | WfoptError::ConfigMissing { .. }
                | WfoptError::ConfigInvalid { .. }
        )
    }
}

impl From<&WfoptError> for std::process::ExitCode {
    fn from(err: &WfoptError) -> Self {
        let code: u8 = match err {
            WfoptError::Io(_) => 1,
            WfoptError::Configuration { .. }
            | WfoptError::ConfigParse { .. }
            | WfoptError::ConfigMissing { .. }
            | WfoptError::ConfigInvalid { .. } => 2,
            WfoptError::DataUnavailable { .. } => 3,
            WfoptError::DataIntegrity { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_class() {
        assert!(WfoptError::configuration("empty grid").is_configuration());
        assert!(
            WfoptError::ConfigMissing {
                section: "data".into(),
                key: "symbol".into(),
            }
            .is_configuration()
        );
        assert!(!WfoptError::data_integrity("nan close").is_configuration());
        assert!(
            !WfoptError::DataUnavailable {
                symbol: "AAPL".into(),
                reason: "offline".into(),
            }
            .is_configuration()
        );
    }

    #[test]
    fn display_messages() {
        let err = WfoptError::DataUnavailable {
            symbol: "MSFT".into(),
            reason: "no such file".into(),
        };
        assert_eq!(err.to_string(), "data unavailable for MSFT: no such file");

        let err = WfoptError::ConfigInvalid {
            section: "walk_forward".into(),
            key: "train_bars".into(),
            reason: "must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [walk_forward] train_bars: must be positive"
        );
    }
}
