use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging defaults, TOML, and
    /// environment variables (`SIGNAL_RELAY_` prefix, `__` nesting).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("config/Config.toml"))
            .merge(Env::prefixed("SIGNAL_RELAY_").split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AppConfig::default();
        assert_eq!(config.dedup.capacity, 100);
        assert_eq!(config.store.retention_days, 30);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(
                r#"
                [store]
                snapshot_path = "/var/lib/signal-relay/signals.json"
                retention_days = 7
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.store.retention_days, 7);
        assert_eq!(
            config.store.snapshot_path.to_str().unwrap(),
            "/var/lib/signal-relay/signals.json"
        );
        // Untouched section keeps its default
        assert_eq!(config.dedup.capacity, 100);
    }
}
