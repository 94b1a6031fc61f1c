use cadence_core::models::SchedulingConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize, Serialize, Debug)]
pub struct Config {
    pub database_path: String,
    /// Acting user when `--user` is not given
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "cadence.db".to_string(),
            user_id: None,
            scheduling: SchedulingConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then `cadence.toml`, then `CADENCE_*` variables.
    /// Nested keys use a double underscore, e.g. `CADENCE_SCHEDULING__STORE_TIMEOUT_MS`.
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("cadence.toml"))
            .merge(Env::prefixed("CADENCE_").split("__"))
    }
}
