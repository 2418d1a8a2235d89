use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment, parse_f64,
    parse_u16, parse_u64,
};
use super::types::{
    ApiSettings, ConfigError, CorsSettings, DatabaseSettings, GradingSettings, RedisSettings,
    RuntimeSettings, ServerHost, ServerPort, ServerSettings, Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("CLASSMARK_HOST", "0.0.0.0");
        let port = env_or_default("CLASSMARK_PORT", "8000");

        let environment =
            parse_environment(env_optional("CLASSMARK_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config = env_optional("CLASSMARK_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Classmark API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "classmark");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "classmark_db");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let scale = parse_f64("GRADING_SCALE", env_or_default("GRADING_SCALE", "20"))?;
        let submit_grace_period_seconds = parse_u64(
            "SUBMIT_GRACE_PERIOD_SECONDS",
            env_or_default("SUBMIT_GRACE_PERIOD_SECONDS", "300"),
        )?;
        let answer_save_interval_seconds = parse_u64(
            "ANSWER_SAVE_INTERVAL_SECONDS",
            env_or_default("ANSWER_SAVE_INTERVAL_SECONDS", "2"),
        )?;
        let deadline_sweep_interval_seconds = parse_u64(
            "DEADLINE_SWEEP_INTERVAL_SECONDS",
            env_or_default("DEADLINE_SWEEP_INTERVAL_SECONDS", "60"),
        )?;

        let log_level = env_or_default("CLASSMARK_LOG_LEVEL", "info");
        let json = env_optional("CLASSMARK_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            grading: GradingSettings {
                scale,
                submit_grace_period_seconds,
                answer_save_interval_seconds,
                deadline_sweep_interval_seconds,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn grading(&self) -> &GradingSettings {
        &self.grading
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.grading.scale.is_finite() || self.grading.scale <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "GRADING_SCALE",
                value: self.grading.scale.to_string(),
            });
        }

        if self.grading.deadline_sweep_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DEADLINE_SWEEP_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use crate::test_support;

    #[test]
    fn load_uses_grading_defaults() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.grading().scale, 20.0);
        assert_eq!(settings.grading().submit_grace_period_seconds, 300);
    }

    #[test]
    fn load_rejects_non_positive_scale() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        std::env::set_var("GRADING_SCALE", "0");

        assert!(Settings::load().is_err());
        std::env::remove_var("GRADING_SCALE");
    }

    #[test]
    fn strict_config_requires_database_secret() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        std::env::set_var("CLASSMARK_STRICT_CONFIG", "1");
        std::env::remove_var("POSTGRES_PASSWORD");

        assert!(Settings::load().is_err());

        std::env::set_var("DATABASE_URL", "postgresql://u:p@localhost:5432/classmark_db");
        assert!(Settings::load().is_ok());

        std::env::remove_var("CLASSMARK_STRICT_CONFIG");
        std::env::remove_var("DATABASE_URL");
    }
}
