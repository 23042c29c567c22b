use crate::auth::credential::{CredentialPolicy, CredentialSource};
use crate::auth::session::RoleSource;
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:3001";
pub const DEFAULT_SESSION_URL: &str = "http://localhost:3567";
pub const DEFAULT_POLICY_URL: &str = "http://localhost:3592";
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_SESSION_COOKIE: &str = "sAccessToken";

// Service configuration sourced from environment variables, read once at start.
#[derive(Debug, Clone)]
pub struct GatekeeperConfig {
    // HTTP listener bind address.
    pub bind_addr: SocketAddr,
    // Base URL of the session-authentication service.
    pub session_url: String,
    // Optional API key sent to the session service.
    pub session_api_key: Option<String>,
    // Base URL of the policy decision service.
    pub policy_url: String,
    // Bound applied to every outbound call.
    pub upstream_timeout: Duration,
    // Where principal roles come from.
    pub role_source: RoleSource,
    // Which request parts may carry the session credential.
    pub credential_source: CredentialSource,
    // Cookie name consulted for cookie credentials.
    pub session_cookie: String,
    // Browser origins allowed by CORS; empty mirrors the request origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GatekeeperConfigOverride {
    bind_addr: Option<String>,
    session_url: Option<String>,
    session_api_key: Option<String>,
    policy_url: Option<String>,
    upstream_timeout_ms: Option<u64>,
    role_source: Option<RoleSource>,
    credential_source: Option<CredentialSource>,
    session_cookie: Option<String>,
    cors_origins: Option<Vec<String>>,
}

impl GatekeeperConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr: SocketAddr = match std::env::var("GATEKEEPER_BIND") {
            Ok(value) => value.parse().with_context(|| "parse GATEKEEPER_BIND")?,
            // Legacy: PORT alone binds every interface.
            Err(_) => match std::env::var("PORT") {
                Ok(port) => format!("0.0.0.0:{}", port.trim())
                    .parse()
                    .with_context(|| "parse PORT")?,
                Err(_) => DEFAULT_BIND.parse().with_context(|| "parse default bind")?,
            },
        };
        let session_url = env_with_legacy("GATEKEEPER_SESSION_URL", "SUPERTOKENS_CONNECTION_URI")
            .unwrap_or_else(|| DEFAULT_SESSION_URL.to_string());
        let session_api_key =
            env_with_legacy("GATEKEEPER_SESSION_API_KEY", "SUPERTOKENS_API_KEY")
                .filter(|value| !value.is_empty());
        let policy_url = env_with_legacy("GATEKEEPER_POLICY_URL", "CERBOS_URL")
            .unwrap_or_else(|| DEFAULT_POLICY_URL.to_string());
        let upstream_timeout_ms = match std::env::var("GATEKEEPER_UPSTREAM_TIMEOUT_MS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| "parse GATEKEEPER_UPSTREAM_TIMEOUT_MS")?,
            Err(_) => DEFAULT_UPSTREAM_TIMEOUT_MS,
        };
        let role_source = match std::env::var("GATEKEEPER_ROLE_SOURCE") {
            Ok(value) => value
                .parse::<RoleSource>()
                .map_err(|err: String| anyhow!(err))
                .with_context(|| "parse GATEKEEPER_ROLE_SOURCE")?,
            Err(_) => RoleSource::Session,
        };
        let credential_source = match std::env::var("GATEKEEPER_CREDENTIAL_SOURCE") {
            Ok(value) => value
                .parse::<CredentialSource>()
                .map_err(|err: String| anyhow!(err))
                .with_context(|| "parse GATEKEEPER_CREDENTIAL_SOURCE")?,
            Err(_) => CredentialSource::Both,
        };
        let session_cookie = std::env::var("GATEKEEPER_SESSION_COOKIE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
        let cors_origins = std::env::var("GATEKEEPER_CORS_ORIGINS")
            .map(|value| parse_origins(&value))
            .unwrap_or_default();
        let config = Self {
            bind_addr,
            session_url,
            session_api_key,
            policy_url,
            upstream_timeout: Duration::from_millis(upstream_timeout_ms),
            role_source,
            credential_source,
            session_cookie,
            cors_origins,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("GATEKEEPER_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read GATEKEEPER_CONFIG: {path}"))?;
            let override_cfg: GatekeeperConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse gatekeeper config yaml")?;
            config.apply(override_cfg)?;
            config.validate()?;
        }
        Ok(config)
    }

    pub fn credential_policy(&self) -> CredentialPolicy {
        CredentialPolicy {
            source: self.credential_source,
            cookie_name: self.session_cookie.clone(),
        }
    }

    fn apply(&mut self, override_cfg: GatekeeperConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.session_url {
            self.session_url = value;
        }
        if let Some(value) = override_cfg.session_api_key {
            self.session_api_key = Some(value).filter(|value| !value.is_empty());
        }
        if let Some(value) = override_cfg.policy_url {
            self.policy_url = value;
        }
        if let Some(value) = override_cfg.upstream_timeout_ms {
            self.upstream_timeout = Duration::from_millis(value);
        }
        if let Some(value) = override_cfg.role_source {
            self.role_source = value;
        }
        if let Some(value) = override_cfg.credential_source {
            self.credential_source = value;
        }
        if let Some(value) = override_cfg.session_cookie {
            self.session_cookie = value;
        }
        if let Some(values) = override_cfg.cors_origins {
            self.cors_origins = values
                .iter()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .collect();
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("session_url", &self.session_url),
            ("policy_url", &self.policy_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow!("{name} must be an http(s) URL: {url}"));
            }
        }
        if self.session_cookie.trim().is_empty() {
            return Err(anyhow!("session_cookie must not be empty"));
        }
        if self.upstream_timeout.is_zero() {
            return Err(anyhow!("upstream_timeout_ms must be greater than zero"));
        }
        if let Some(origin) = self
            .cors_origins
            .iter()
            .find(|origin| !(origin.starts_with("http://") || origin.starts_with("https://")))
        {
            return Err(anyhow!("cors origin must be an http(s) origin: {origin}"));
        }
        Ok(())
    }
}

// Comma-separated origin list; browsers send origins without a trailing slash.
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn env_with_legacy(primary: &str, legacy: &str) -> Option<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var(legacy))
        .ok()
        .map(|value| value.trim().to_string())
}
