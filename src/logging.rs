use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Subscriber settings shared by the API server and the change point job.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    /// `default_service` labels the process when `SERVICE_NAME` is unset.
    pub fn from_env(default_service: &str) -> Self {
        Self {
            loki_enabled: std::env::var("LOKI_ENABLED")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            loki_url: std::env::var("LOKI_URL").ok().filter(|u| !u.trim().is_empty()),
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| default_service.to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Reject settings that would only fail once the subscriber is installed.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.env_filter()?;
        if self.loki_enabled {
            self.parsed_loki_url()?;
        }
        Ok(())
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("invalid RUST_LOG directive '{}'", self.log_level))
    }

    fn parsed_loki_url(&self) -> anyhow::Result<url::Url> {
        let raw = self
            .loki_url
            .as_deref()
            .context("LOKI_ENABLED is true but LOKI_URL is not set")?;
        url::Url::parse(raw).with_context(|| format!("LOKI_URL '{}' is not a valid URL", raw))
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Install the global subscriber. Loki shipping needs a running Tokio runtime.
pub fn init_logging(config: LoggingConfig) -> anyhow::Result<()> {
    config.validate()?;

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            return init_with_loki(config);
        }
    }

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!(
        "📊 Console logging initialized for {} ({})",
        config.service_name,
        config.environment
    );
    Ok(())
}

/// Loki layer labelled with the service and environment, plus the task
/// that ships its batches. The caller decides where the task runs.
#[cfg(feature = "loki")]
pub fn loki_layer(
    config: &LoggingConfig,
) -> anyhow::Result<(tracing_loki::Layer, tracing_loki::BackgroundTask)> {
    let url = config.parsed_loki_url()?;
    Ok(tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?)
}

#[cfg(feature = "loki")]
fn init_with_loki(config: LoggingConfig) -> anyhow::Result<()> {
    let (layer, task) = loki_layer(&config)?;
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .with(layer)
        .try_init()?;

    tracing::info!(
        "✅ Loki logging initialized for {} ({})",
        config.service_name,
        config.environment
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LoggingConfig {
        LoggingConfig {
            loki_enabled: true,
            loki_url: Some("http://localhost:3100".to_string()),
            service_name: "brent-changepoint".to_string(),
            environment: "test".to_string(),
            log_level: "info,brent_backend=debug".to_string(),
        }
    }

    #[test]
    fn test_loki_requires_a_valid_url() {
        assert!(config().validate().is_ok());

        let missing = LoggingConfig {
            loki_url: None,
            ..config()
        };
        assert!(missing.validate().is_err());

        let garbled = LoggingConfig {
            loki_url: Some("not a url".to_string()),
            ..config()
        };
        assert!(garbled.validate().is_err());

        // the URL is irrelevant while Loki is off
        let console = LoggingConfig {
            loki_enabled: false,
            ..garbled
        };
        assert!(console.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_level_directive() {
        let bad = LoggingConfig {
            log_level: "brent_backend=loud".to_string(),
            ..config()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_truthy_flags() {
        assert!(is_truthy("true"));
        assert!(is_truthy(" 1 "));
        assert!(is_truthy("YES"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
    }

    #[cfg(feature = "loki")]
    #[tokio::test]
    async fn test_loki_layer_builds_without_installing() {
        assert!(loki_layer(&config()).is_ok());

        let invalid = LoggingConfig {
            loki_url: Some("::".to_string()),
            ..config()
        };
        assert!(loki_layer(&invalid).is_err());
    }
}
