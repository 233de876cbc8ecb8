use gateway::config::Config as GatewayConfig;
use serde::Deserialize;
use std::fs::File;

#[derive(Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Deserialize)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://key@sentry.example.com/1
            gateway:
                listener:
                    host: 0.0.0.0
                    port: 8080
                admin_listener:
                    host: 127.0.0.1
                    port: 8081
                public_domain: docs.example.com
                auth:
                    external_endpoint: https://docs.example.com/accounts/login/
                    internal_endpoint: http://web:8000/accounts/login/
                registry:
                    type: projects
                    path: /etc/docgate/projects.yaml
                storage:
                    mode: direct
                    root: /var/docs
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_host, "127.0.0.1");
        assert_eq!(metrics.statsd_port, 8125);
        assert!(config.common.logging.is_some());
        assert_eq!(config.gateway.public_domain, "docs.example.com");
        assert!(config.gateway.validate().is_ok());
    }

    #[test]
    fn test_minimal_config() {
        let yaml = r#"
            gateway:
                listener:
                    host: 0.0.0.0
                    port: 8080
                admin_listener:
                    host: 127.0.0.1
                    port: 8081
                public_domain: docs.example.com
                auth:
                    external_endpoint: https://docs.example.com/accounts/login/
                    internal_endpoint: http://web:8000/accounts/login/
                registry:
                    type: url
                    url: http://registry.internal/
                storage:
                    mode: internal_redirect
                    base_url: http://storage.internal/media/
                    secret: super-secret
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert!(config.common.metrics.is_none());
        assert!(config.common.logging.is_none());
        assert!(config.gateway.validate().is_ok());
    }
}
