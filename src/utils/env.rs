//! Environment variable helpers
//!
//! Used by the configuration layer to pick up engine defaults from the
//! usual `ANSIBLE_*` variables.

use std::env;

/// Environment variable utilities
#[derive(Debug)]
pub struct EnvUtils;

impl EnvUtils {
    /// Get a non-empty environment variable
    pub fn get_var(key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.trim().is_empty())
    }

    /// Get an environment variable with a default value
    pub fn get_var_or_default(key: &str, default: &str) -> String {
        Self::get_var(key).unwrap_or_else(|| default.to_string())
    }

    /// Get an environment variable and parse it to a specific type
    pub fn get_var_parsed<T>(key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        Self::get_var(key)?.trim().parse().ok()
    }

    /// First non-empty variable among `keys`, in order
    pub fn first_var(keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| Self::get_var(key))
    }

    /// Whether a variable is set to something other than an off value
    pub fn is_enabled(key: &str) -> bool {
        Self::get_var(key).is_some_and(|value| {
            !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            )
        })
    }

    /// Set environment variable (mainly for testing)
    pub fn set_var<K, V>(key: K, value: V)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        unsafe { env::set_var(key.as_ref(), value.as_ref()) }
    }

    /// Remove environment variable (mainly for testing)
    pub fn remove_var<K: AsRef<str>>(key: K) {
        unsafe { env::remove_var(key.as_ref()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_utils() {
        let value = EnvUtils::get_var_or_default("RELAY_TEST_NONEXISTENT", "default");
        assert_eq!(value, "default");

        EnvUtils::set_var("RELAY_TEST_VAR", "test_value");
        let value = EnvUtils::get_var_or_default("RELAY_TEST_VAR", "default");
        assert_eq!(value, "test_value");

        EnvUtils::set_var("RELAY_TEST_NUMBER", " 42 ");
        let number: Option<u32> = EnvUtils::get_var_parsed("RELAY_TEST_NUMBER");
        assert_eq!(number, Some(42));

        EnvUtils::remove_var("RELAY_TEST_VAR");
        EnvUtils::remove_var("RELAY_TEST_NUMBER");
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        EnvUtils::set_var("RELAY_TEST_EMPTY", "  ");
        assert_eq!(EnvUtils::get_var("RELAY_TEST_EMPTY"), None);
        assert_eq!(
            EnvUtils::first_var(&["RELAY_TEST_EMPTY", "RELAY_TEST_SECOND"]),
            None
        );

        EnvUtils::set_var("RELAY_TEST_SECOND", "hosts.ini");
        assert_eq!(
            EnvUtils::first_var(&["RELAY_TEST_EMPTY", "RELAY_TEST_SECOND"]).as_deref(),
            Some("hosts.ini")
        );

        EnvUtils::remove_var("RELAY_TEST_EMPTY");
        EnvUtils::remove_var("RELAY_TEST_SECOND");
    }

    #[test]
    fn test_is_enabled() {
        EnvUtils::set_var("RELAY_TEST_FLAG", "false");
        assert!(!EnvUtils::is_enabled("RELAY_TEST_FLAG"));

        EnvUtils::set_var("RELAY_TEST_FLAG", "1");
        assert!(EnvUtils::is_enabled("RELAY_TEST_FLAG"));

        EnvUtils::remove_var("RELAY_TEST_FLAG");
        assert!(!EnvUtils::is_enabled("RELAY_TEST_FLAG"));
    }
}
