use core_config::{
    app_info, mongodb::MongoConfig, postgres::PostgresConfig, server::ServerConfig, AppInfo,
    ConfigError, Environment, FromEnv,
};

/// Application-specific configuration composed from shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub mongo: MongoConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            postgres: PostgresConfig::from_env()?,
            mongo: MongoConfig::from_env()?,
        })
    }
}
