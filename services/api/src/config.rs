use anyhow::{Context, Result, bail};
use progress_authz::VerificationKey;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

/// Progress API configuration sourced from environment variables, with an
/// optional YAML file named by `PROGRESS_API_CONFIG` layered on top.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub auth: AuthConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub leeway_secs: u64,
    pub keys: Vec<VerificationKey>,
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub enabled: bool,
    pub bind_addr: SocketAddr,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ApiConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    #[serde(default)]
    auth: AuthOverride,
    #[serde(default)]
    bootstrap: BootstrapOverride,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AuthOverride {
    issuer: Option<String>,
    audience: Option<String>,
    leeway_secs: Option<u64>,
    /// `kid -> base64url public key`; replaces the environment key set.
    keys: Option<std::collections::BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct BootstrapOverride {
    enabled: Option<bool>,
    bind_addr: Option<String>,
    token: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("PROGRESS_API_BIND", "0.0.0.0:8443")
            .parse()
            .with_context(|| "parse PROGRESS_API_BIND")?;
        let metrics_bind = env_or("PROGRESS_API_METRICS_BIND", "0.0.0.0:8080")
            .parse()
            .with_context(|| "parse PROGRESS_API_METRICS_BIND")?;
        let leeway_secs = env_or("PROGRESS_AUTH_LEEWAY_SECS", "30")
            .parse()
            .with_context(|| "parse PROGRESS_AUTH_LEEWAY_SECS")?;
        let keys = match std::env::var("PROGRESS_AUTH_KEYS") {
            Ok(raw) => parse_key_list(&raw).with_context(|| "parse PROGRESS_AUTH_KEYS")?,
            Err(_) => Vec::new(),
        };
        let bootstrap_enabled = match std::env::var("PROGRESS_BOOTSTRAP_ENABLED") {
            Ok(raw) => parse_bool(&raw).with_context(|| "parse PROGRESS_BOOTSTRAP_ENABLED")?,
            Err(_) => false,
        };
        let bootstrap_bind = env_or("PROGRESS_BOOTSTRAP_BIND", "127.0.0.1:9095")
            .parse()
            .with_context(|| "parse PROGRESS_BOOTSTRAP_BIND")?;

        let config = Self {
            bind_addr,
            metrics_bind,
            auth: AuthConfig {
                issuer: env_or("PROGRESS_AUTH_ISSUER", "progress-idp"),
                audience: env_or("PROGRESS_AUTH_AUDIENCE", "progress-api"),
                leeway_secs,
                keys,
            },
            bootstrap: BootstrapConfig {
                enabled: bootstrap_enabled,
                bind_addr: bootstrap_bind,
                token: std::env::var("PROGRESS_BOOTSTRAP_TOKEN").ok(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("PROGRESS_API_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read PROGRESS_API_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: ApiConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse progress api config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        let auth = override_cfg.auth;
        if let Some(value) = auth.issuer {
            self.auth.issuer = value;
        }
        if let Some(value) = auth.audience {
            self.auth.audience = value;
        }
        if let Some(value) = auth.leeway_secs {
            self.auth.leeway_secs = value;
        }
        if let Some(keys) = auth.keys {
            self.auth.keys = keys
                .iter()
                .map(|(kid, encoded)| VerificationKey::from_base64url(kid.as_str(), encoded))
                .collect::<Result<_, _>>()
                .with_context(|| "parse auth.keys")?;
        }
        let bootstrap = override_cfg.bootstrap;
        if let Some(value) = bootstrap.enabled {
            self.bootstrap.enabled = value;
        }
        if let Some(value) = bootstrap.bind_addr {
            self.bootstrap.bind_addr = value.parse().with_context(|| "parse bootstrap.bind_addr")?;
        }
        if let Some(value) = bootstrap.token {
            self.bootstrap.token = Some(value);
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.bootstrap.enabled
            && self
                .bootstrap
                .token
                .as_deref()
                .is_none_or(|token| token.trim().is_empty())
        {
            bail!("bootstrap enabled but PROGRESS_BOOTSTRAP_TOKEN is not set");
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("invalid boolean: {other}"),
    }
}

/// Parse `kid=<base64url key>` entries separated by commas.
fn parse_key_list(raw: &str) -> Result<Vec<VerificationKey>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (kid, encoded) = entry
                .split_once('=')
                .with_context(|| format!("expected kid=<key>, got {entry}"))?;
            let kid = kid.trim();
            if kid.is_empty() {
                bail!("empty kid in {entry}");
            }
            Ok(VerificationKey::from_base64url(kid, encoded)?)
        })
        .collect()
}
