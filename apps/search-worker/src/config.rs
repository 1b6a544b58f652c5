use core_config::{
    app_info, env_or_default, mongodb::MongoConfig, postgres::PostgresConfig, redis::RedisConfig,
    AppInfo, ConfigError, Environment, FromEnv,
};
use domain_search::ScheduleConfig;

/// Worker configuration composed from shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub postgres: PostgresConfig,
    pub mongo: MongoConfig,
    pub redis: RedisConfig,
    pub schedule: ScheduleConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = ScheduleConfig::default();

        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            postgres: PostgresConfig::from_env()?,
            mongo: MongoConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            schedule: ScheduleConfig {
                reindex_cron: env_or_default("REINDEX_CRON", &defaults.reindex_cron),
                preferences_cron: env_or_default("PREFERENCES_CRON", &defaults.preferences_cron),
            },
        })
    }
}
