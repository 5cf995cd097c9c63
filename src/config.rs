use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_path: String,
    /// Wall-clock interval between monitoring runs, in seconds.
    pub check_interval_secs: u64,
    /// Per-request timeout for a single page fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Bounded attempts per fetch_full_info call.
    pub retry_attempts: u32,
    /// Fixed delay between attempts, in seconds.
    pub retry_backoff_secs: u64,
    pub user_agent: String,
    pub referer: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "price_monitor.db".to_string(),
            check_interval_secs: 3600,
            fetch_timeout_secs: 20,
            retry_attempts: 3,
            retry_backoff_secs: 3,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            referer: "https://www.xcom-shop.ru/".to_string(),
        }
    }
}

impl Settings {
    /// Layered configuration: built-in defaults, then an optional
    /// `monitor.toml` next to the binary, then `MONITOR_*` environment
    /// variables.
    pub fn load() -> Result<Self> {
        let defaults = Settings::default();

        let settings = config::Config::builder()
            .set_default("database_path", defaults.database_path)?
            .set_default("check_interval_secs", defaults.check_interval_secs)?
            .set_default("fetch_timeout_secs", defaults.fetch_timeout_secs)?
            .set_default("retry_attempts", u64::from(defaults.retry_attempts))?
            .set_default("retry_backoff_secs", defaults.retry_backoff_secs)?
            .set_default("user_agent", defaults.user_agent)?
            .set_default("referer", defaults.referer)?
            .add_source(config::File::with_name("monitor").required(false))
            .add_source(config::Environment::with_prefix("MONITOR"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_monitoring_contract() {
        let settings = Settings::default();
        assert_eq!(settings.check_interval_secs, 3600);
        assert_eq!(settings.fetch_timeout_secs, 20);
        assert_eq!(settings.retry_attempts, 3);
        assert_eq!(settings.retry_backoff_secs, 3);
    }
}
