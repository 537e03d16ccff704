use dotenvy::dotenv;
use log::LevelFilter;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid value for {key}: {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub workers: usize,
    pub log_level: LevelFilter,
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            workers: num_cpus::get(),
            log_level: LevelFilter::Debug,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    /// for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", lookup("PORT"), defaults.port)?,
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            workers: parse_or("WORKERS", lookup("WORKERS"), defaults.workers)?,
            log_level: parse_or("LOG_LEVEL", lookup("LOG_LEVEL"), defaults.log_level)?,
            bcrypt_cost: parse_or("BCRYPT_COST", lookup("BCRYPT_COST"), defaults.bcrypt_cost)?,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn tweets_path(&self) -> PathBuf {
        self.data_dir.join("tweets.json")
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.users_path(), PathBuf::from("./data/users.json"));
        assert_eq!(config.tweets_path(), PathBuf::from("./data/tweets.json"));
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("DATA_DIR", "/tmp/twitter"),
            ("LOG_LEVEL", "warn"),
            ("BCRYPT_COST", "4"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, LevelFilter::Warn);
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.users_path(), PathBuf::from("/tmp/twitter/users.json"));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.key, "PORT");
    }
}
