use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub amazon: AmazonConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: u64,
    #[serde(default = "default_price_drop_threshold")]
    pub price_drop_threshold_percent: f64,
    #[serde(default = "default_delay_between_requests")]
    pub delay_between_requests_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmazonConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

/// SMTP settings. Every credential field is optional: missing credentials
/// disable notification dispatch without failing the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_password: Option<String>,
    #[serde(default)]
    pub receiver_email: Option<String>,
}

fn default_check_interval_hours() -> u64 {
    6
}

fn default_price_drop_threshold() -> f64 {
    5.0
}

fn default_delay_between_requests() -> u64 {
    2
}

fn default_base_url() -> String {
    "https://www.amazon.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
    ]
}

fn default_database_url() -> String {
    "sqlite://price_tracker.db?mode=rwc".to_string()
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            check_interval_hours: default_check_interval_hours(),
            price_drop_threshold_percent: default_price_drop_threshold(),
            delay_between_requests_secs: default_delay_between_requests(),
        }
    }
}

impl Default for AmazonConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agents: default_user_agents(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            sender_email: None,
            sender_password: None,
            receiver_email: None,
        }
    }
}

impl EmailConfig {
    /// Dispatch requires all three credential fields.
    pub fn is_configured(&self) -> bool {
        self.sender_email.is_some()
            && self.sender_password.is_some()
            && self.receiver_email.is_some()
    }
}

impl AppConfig {
    /// Loads configuration from an optional file plus `PRICEWATCH_`
    /// environment overrides. Serde defaults fill any missing field, so a
    /// partial or absent file still yields a working config.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(
                File::with_name(config_file.unwrap_or("config")).required(config_file.is_some()),
            )
            .add_source(Environment::with_prefix("PRICEWATCH").separator("__"));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracking.check_interval_hours == 0 {
            return Err(ConfigError::Message(
                "tracking.check_interval_hours must be greater than 0".into(),
            ));
        }

        if self.tracking.price_drop_threshold_percent < 0.0 {
            return Err(ConfigError::Message(
                "tracking.price_drop_threshold_percent cannot be negative".into(),
            ));
        }

        if Url::parse(&self.amazon.base_url).is_err() {
            return Err(ConfigError::Message("Invalid amazon.base_url format".into()));
        }

        if self.amazon.user_agents.is_empty() {
            return Err(ConfigError::Message(
                "amazon.user_agents must contain at least one entry".into(),
            ));
        }

        if self.amazon.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "amazon.request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.email.smtp_port == 0 {
            return Err(ConfigError::Message(
                "email.smtp_port must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
