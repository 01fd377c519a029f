use std::time::Duration;

pub const TARGET_URL_VAR: &str = "TARGET_URL";
pub const API_KEY_VAR: &str = "API_KEY";
pub const DURATION_VAR: &str = "DURATION";
pub const RPS_VAR: &str = "RPS";
pub const USERS_VAR: &str = "USERS";

/// Deliberately not a usable URL: a run against an unconfigured target should
/// fail loudly at client construction, not quietly load the wrong host.
const DEFAULT_TARGET_URL: &str = "REPLACE_ME_TARGET_URL";
const DEFAULT_API_KEY: &str = "REPLACE_ME_API_KEY";

const DEFAULT_RATE_PER_SEC: u32 = 50;
const DEFAULT_USERS: usize = 10;

/// Run parameters for a profile, resolved once from the environment at
/// startup and immutable for the lifetime of the run.
///
/// Missing or unparseable values fall back to fixed defaults, so a typo in
/// `RPS` degrades to the stock rate instead of failing the run.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Base URL of the proxy under test (`TARGET_URL`).
    pub target_url: String,
    /// Credential sent in the API key header (`API_KEY`).
    pub api_key: String,
    /// Run length (`DURATION`, humantime syntax such as "1m" or "2h").
    pub duration: Duration,
    /// Target iteration starts per second for arrival-rate profiles (`RPS`).
    pub rate_per_sec: u32,
    /// Concurrent agents for the user-flow profile (`USERS`).
    pub users: usize,
}

impl ProxyConfig {
    /// Resolve from the process environment. `default_duration` is the
    /// profile's own default, used when `DURATION` is unset or malformed.
    pub fn resolve(default_duration: Duration) -> Self {
        Self::resolve_from(default_duration, |name| std::env::var(name).ok())
    }

    /// Resolution against an arbitrary lookup, so tests do not have to
    /// mutate the process environment.
    pub fn resolve_from(
        default_duration: Duration,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        Self {
            target_url: lookup(TARGET_URL_VAR).unwrap_or_else(|| DEFAULT_TARGET_URL.to_string()),
            api_key: lookup(API_KEY_VAR).unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            duration: lookup(DURATION_VAR)
                .and_then(|raw| humantime::parse_duration(&raw).ok())
                .unwrap_or(default_duration),
            rate_per_sec: lookup(RPS_VAR)
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_RATE_PER_SEC),
            users: lookup(USERS_VAR)
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_USERS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> ProxyConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        ProxyConfig::resolve_from(Duration::from_secs(60), |name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_resolves_to_defaults() {
        let config = resolve(&[]);

        assert_eq!(config.target_url, "REPLACE_ME_TARGET_URL");
        assert_eq!(config.api_key, "REPLACE_ME_API_KEY");
        assert_eq!(config.duration, Duration::from_secs(60));
        assert_eq!(config.rate_per_sec, 50);
        assert_eq!(config.users, 10);
    }

    #[test]
    fn set_values_are_used() {
        let config = resolve(&[
            ("TARGET_URL", "http://localhost:8000"),
            ("API_KEY", "test-key"),
            ("DURATION", "2h"),
            ("RPS", "75"),
            ("USERS", "25"),
        ]);

        assert_eq!(config.target_url, "http://localhost:8000");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.duration, Duration::from_secs(2 * 60 * 60));
        assert_eq!(config.rate_per_sec, 75);
        assert_eq!(config.users, 25);
    }

    #[test]
    fn non_numeric_rate_falls_back_to_the_default() {
        let config = resolve(&[("RPS", "plenty")]);

        assert_eq!(config.rate_per_sec, 50);
    }

    #[test]
    fn malformed_duration_falls_back_to_the_profile_default() {
        let config = resolve(&[("DURATION", "soon")]);

        assert_eq!(config.duration, Duration::from_secs(60));
    }

    #[test]
    fn short_duration_forms_parse() {
        assert_eq!(
            resolve(&[("DURATION", "10s")]).duration,
            Duration::from_secs(10)
        );
        assert_eq!(
            resolve(&[("DURATION", "1m")]).duration,
            Duration::from_secs(60)
        );
    }
}
