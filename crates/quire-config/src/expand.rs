//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the config key for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(
            expand_env("https://api.github.com", "github.api_url").unwrap(),
            "https://api.github.com"
        );
    }

    #[test]
    fn test_default_used_when_unset() {
        assert_eq!(
            expand_env("${QUIRE_TEST_UNSET_VAR_1:-fallback}", "github.token").unwrap(),
            "fallback"
        );
    }

    #[test]
    fn test_unset_without_default_is_error() {
        let err = expand_env("${QUIRE_TEST_UNSET_VAR_2}", "github.token").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { ref field, .. } if field == "github.token"));
        assert!(err.to_string().contains("QUIRE_TEST_UNSET_VAR_2"));
    }
}
