use std::env;
pub const LOG_ENV: &str = "XLREPLACE_LOG";
pub const DURABILITY_STRICT_ENV: &str = "XLREPLACE_DURABILITY_STRICT";
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub log_filter: Option<String>,
    pub durability_strict: bool,
}
impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_filter: lookup(LOG_ENV)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty()),
            durability_strict: lookup(DURABILITY_STRICT_ENV).is_some_and(|v| is_truthy(&v)),
        }
    }
}
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    #[test]
    fn reads_known_variables() {
        let config = Config::from_lookup(|key| match key {
            LOG_ENV => Some(" debug ".to_owned()),
            DURABILITY_STRICT_ENV => Some("Yes".to_owned()),
            _ => None,
        });
        assert_eq!(
            config,
            Config {
                log_filter: Some("debug".to_owned()),
                durability_strict: true,
            },
            "filter is trimmed and yes is truthy"
        );
    }
    #[test]
    fn blank_or_unknown_values_fall_back_to_defaults() {
        let config = Config::from_lookup(|key| match key {
            LOG_ENV => Some("   ".to_owned()),
            DURABILITY_STRICT_ENV => Some("maybe".to_owned()),
            _ => None,
        });
        assert_eq!(config, Config::default(), "blank filter and unknown flag");
    }
}
