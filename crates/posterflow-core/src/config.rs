use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8180;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Dispatch loop cadence — one reconciliation tick per minute.
pub const DEFAULT_TICK_SECS: u64 = 60;
/// Adapter-side request timeout so one slow send cannot stall a whole tick.
pub const SEND_TIMEOUT_SECS: u64 = 10;

/// Top-level config (posterflow.toml + POSTERFLOW_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterflowConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl Default for PosterflowConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// WhatsApp Business Cloud API credentials and sending defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Graph API bearer token from Meta Business Suite.
    #[serde(default)]
    pub access_token: String,
    /// WhatsApp Phone Number ID — the fixed sender address.
    #[serde(default)]
    pub phone_number_id: String,
    /// Prefixed to recipient numbers that lack an explicit `+` country code.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            phone_number_id: String::new(),
            default_country_code: default_country_code(),
            api_base: default_api_base(),
        }
    }
}

/// Dispatch-loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Fixed UTC offset every schedule time is interpreted in, e.g. "+05:30".
    /// Dispatch correctness must not depend on the host's local timezone.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Widens the due window backwards by N minutes so records missed while
    /// the process was down are still dispatched. 0 keeps the exact-minute
    /// matching; see `DispatchEngine` docs before changing this.
    #[serde(default)]
    pub catch_up_minutes: u32,
    /// Public base URL poster media is served under; the per-poster URL is
    /// derived from this, never stored.
    #[serde(default = "default_media_base_url")]
    pub media_base_url: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            tick_secs: default_tick_secs(),
            catch_up_minutes: 0,
            media_base_url: default_media_base_url(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.posterflow/posterflow.db", home)
}
fn default_country_code() -> String {
    "+91".to_string()
}
fn default_api_base() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}
fn default_timezone() -> String {
    "+05:30".to_string()
}
fn default_tick_secs() -> u64 {
    DEFAULT_TICK_SECS
}
fn default_media_base_url() -> String {
    format!("http://{}:{}/uploads", DEFAULT_BIND, DEFAULT_PORT)
}

impl PosterflowConfig {
    /// Load config from a TOML file with POSTERFLOW_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. POSTERFLOW_CONFIG env var (handled by the caller)
    ///   3. ~/.posterflow/posterflow.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: PosterflowConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("POSTERFLOW_").split("_"))
            .extract()
            .map_err(|e| crate::error::PosterflowError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.posterflow/posterflow.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let cfg = PosterflowConfig::default();
        assert_eq!(cfg.gateway.port, DEFAULT_PORT);
        assert_eq!(cfg.delivery.timezone, "+05:30");
        assert_eq!(cfg.delivery.tick_secs, 60);
        assert_eq!(cfg.delivery.catch_up_minutes, 0);
        assert_eq!(cfg.whatsapp.default_country_code, "+91");
    }

    fn from_toml(raw: &str) -> PosterflowConfig {
        Figment::new()
            .merge(Toml::string(raw))
            .extract()
            .expect("config should parse")
    }

    #[test]
    fn empty_toml_deserializes_with_defaults() {
        let cfg = from_toml("");
        assert_eq!(cfg.database.path, super::default_db_path());
        assert!(cfg.whatsapp.access_token.is_empty());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = from_toml(
            r#"
            [delivery]
            timezone = "+00:00"
            catch_up_minutes = 5
            "#,
        );
        assert_eq!(cfg.delivery.timezone, "+00:00");
        assert_eq!(cfg.delivery.catch_up_minutes, 5);
        assert_eq!(cfg.delivery.tick_secs, 60);
        assert_eq!(cfg.gateway.bind, DEFAULT_BIND);
    }
}
