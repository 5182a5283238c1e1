use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// Top-level service configuration.
///
/// Keys from the legacy JSON config (`listenAddress`, `logLevel`, `ltmhost`,
/// `uploadpath`) are accepted as aliases.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_address", alias = "listenAddress")]
    pub listen_address: String,
    /// Pre-shared token. Clients send a bcrypt hash of it in `X-Auth-Token`.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_log_level", alias = "logLevel")]
    pub log_level: String,
    #[serde(default, alias = "logFormat")]
    pub log_format: LogFormat,
    /// Organization tag, required.
    #[serde(default)]
    pub org: String,
    /// Deadline applied to every inbound request, appliance calls included.
    #[serde(default = "default_request_timeout", alias = "requestTimeoutSecs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true", alias = "metricsEnabled")]
    pub metrics_enabled: bool,
    /// Host alias → appliance account.
    #[serde(default)]
    pub accounts: BTreeMap<String, Account>,
}

/// Credentials and location of one BigIP appliance.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(alias = "ltmhost")]
    pub ltm_host: String,
    pub username: String,
    pub password: String,
    /// Directory the appliance stores uploaded files in.
    #[serde(default = "default_upload_path", alias = "uploadpath")]
    pub upload_path: String,
    /// Set to false for management interfaces with self-signed certificates.
    #[serde(default = "default_true", alias = "verifytls")]
    pub verify_tls: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_listen_address() -> String { "0.0.0.0:8080".into() }
fn default_log_level() -> String { "info".into() }
fn default_request_timeout() -> u64 { 15 }
fn default_upload_path() -> String { "/var/config/rest/downloads".into() }
fn default_true() -> bool { true }

// ── Impls ─────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            token: String::new(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            org: String::new(),
            request_timeout_secs: default_request_timeout(),
            metrics_enabled: true,
            accounts: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen_address", &self.listen_address)
            .field("token", &"<redacted>")
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("org", &self.org)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("accounts", &self.accounts)
            .finish()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("ltm_host", &self.ltm_host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("upload_path", &self.upload_path)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

impl Config {
    /// Load configuration from a YAML (or JSON) file + `F5API_` env overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `F5API_ACCOUNTS__LAB__PASSWORD`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: Config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("F5API_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Listen address in socket form; a bare `:8080` binds all interfaces.
    pub fn listen_addr(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.org.is_empty() {
            return Err(ConfigError::Missing("org".into()));
        }
        if self.token.is_empty() {
            return Err(ConfigError::Missing("token".into()));
        }
        for (alias, account) in &self.accounts {
            if account.ltm_host.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "account '{alias}' has an empty ltmhost"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LEGACY_JSON: &str = r#"{
        "listenAddress": ":8000",
        "accounts": {
            "www.example.org": {
                "ltmhost": "www.example.org",
                "username": "user1",
                "password": "1badpass",
                "uploadpath": "/foobar"
            }
        },
        "token": "SEKRET",
        "logLevel": "infos",
        "org": "test"
    }"#;

    fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "{contents}").unwrap();
        tmpfile
    }

    fn valid() -> Config {
        Config {
            org: "test".into(),
            token: "SEKRET".into(),
            ..Config::default()
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let cfg = Config::default();
        assert_eq!(cfg.listen_address, "0.0.0.0:8080");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.log_format, LogFormat::Text);
        assert_eq!(cfg.request_timeout_secs, 15);
        assert!(cfg.metrics_enabled);
        assert!(cfg.accounts.is_empty());
    }

    #[test]
    fn load_legacy_json_config() {
        let tmpfile = write_tmp(LEGACY_JSON);
        let cfg = Config::load(tmpfile.path()).unwrap();

        assert_eq!(cfg.listen_address, ":8000");
        assert_eq!(cfg.token, "SEKRET");
        assert_eq!(cfg.log_level, "infos");
        assert_eq!(cfg.org, "test");

        let account = &cfg.accounts["www.example.org"];
        assert_eq!(
            *account,
            Account {
                ltm_host: "www.example.org".into(),
                username: "user1".into(),
                password: "1badpass".into(),
                upload_path: "/foobar".into(),
                verify_tls: true,
            }
        );
    }

    #[test]
    fn load_yaml_applies_defaults() {
        let yaml = r#"
org: acme
token: s3cret
log_format: json
accounts:
  lab:
    ltm_host: "10.0.0.5"
    username: admin
    password: admin
    verify_tls: false
"#;
        let tmpfile = write_tmp(yaml);
        let cfg = Config::load(tmpfile.path()).unwrap();
        assert_eq!(cfg.listen_address, "0.0.0.0:8080");
        assert_eq!(cfg.log_format, LogFormat::Json);

        let lab = &cfg.accounts["lab"];
        assert_eq!(lab.upload_path, "/var/config/rest/downloads");
        assert!(!lab.verify_tls);
    }

    #[test]
    fn load_broken_file_returns_error() {
        let tmpfile = write_tmp(r#"{ "foobar": { "baz": "biz" }"#);
        assert!(Config::load(tmpfile.path()).is_err());
    }

    #[test]
    fn load_without_org_is_rejected() {
        let tmpfile = write_tmp("token: abc\n");
        let err = Config::load(tmpfile.path()).unwrap_err();
        assert!(err.to_string().contains("org"), "got: {err}");
    }

    #[test]
    fn listen_addr_expands_port_only_form() {
        let cfg = Config { listen_address: ":8000".into(), ..valid() };
        assert_eq!(cfg.listen_addr(), "0.0.0.0:8000");
        assert_eq!(valid().listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn validate_requires_token() {
        let cfg = Config { token: String::new(), ..valid() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing(f)) if f == "token"));
    }

    #[test]
    fn validate_rejects_empty_ltm_host() {
        let mut cfg = valid();
        cfg.accounts.insert(
            "broken".into(),
            Account {
                ltm_host: String::new(),
                username: "u".into(),
                password: "p".into(),
                upload_path: default_upload_path(),
                verify_tls: true,
            },
        );
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let tmpfile = write_tmp(LEGACY_JSON);
        let cfg = Config::load(tmpfile.path()).unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("SEKRET"));
        assert!(!printed.contains("1badpass"));
        assert!(printed.contains("www.example.org"));
    }
}
