use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    /// Basic Auth credentials for /metrics, "username:password".
    pub metrics_auth: String,
    /// How often the binary runs rate limit state cleanup.
    pub cleanup_interval_secs: u64,
    /// Escape hatch for local perf runs; never set in production.
    pub rate_limit_disabled: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", app_env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .unwrap_or_else(|_| {
                if app_env == "prod" {
                    panic!("FATAL: METRICS_AUTH must be set in production!");
                }
                eprintln!("WARNING: Using default METRICS_AUTH (dev mode only!)");
                "admin:changeme".to_string()
            });

        let cleanup_interval_secs = settings
            .get_int("rate_limit.cleanup_interval_secs")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .or_else(|| {
                env::var("CLEANUP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or(3600);

        let rate_limit_disabled = env::var("RATE_LIMIT_DISABLED").unwrap_or_default() == "1";

        Ok(Config {
            bind_addr,
            metrics_auth,
            cleanup_interval_secs,
            rate_limit_disabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn load_applies_env_overrides_and_defaults() {
        std::env::set_var("BIND_ADDR", "127.0.0.1:9999");
        std::env::set_var("METRICS_AUTH", "ops:secret");
        std::env::set_var("CLEANUP_INTERVAL_SECS", "120");
        std::env::remove_var("RATE_LIMIT_DISABLED");

        let config = Config::load().expect("config should load");
        assert_eq!(config.bind_addr, "127.0.0.1:9999");
        assert_eq!(config.metrics_auth, "ops:secret");
        assert_eq!(config.cleanup_interval_secs, 120);
        assert!(!config.rate_limit_disabled);

        std::env::remove_var("BIND_ADDR");
        std::env::remove_var("METRICS_AUTH");
        std::env::remove_var("CLEANUP_INTERVAL_SECS");
    }

    #[test]
    #[serial_test::serial]
    fn rate_limiting_can_be_disabled_via_env() {
        std::env::set_var("METRICS_AUTH", "ops:secret");
        std::env::set_var("RATE_LIMIT_DISABLED", "1");

        let config = Config::load().expect("config should load");
        assert!(config.rate_limit_disabled);

        std::env::remove_var("RATE_LIMIT_DISABLED");
        std::env::remove_var("METRICS_AUTH");
    }
}
