use anyhow::{bail, Context, Result};
use figment::value::{Uncased, UncasedStr};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use url::Url;

/// Addresses processed when neither the configuration nor the command line
/// names any.
pub const DEFAULT_EMAILS: [&str; 3] = [
    "noreply@example.com",
    "no-reply@example.com",
    "notifications@example.com",
];

/// Environment variables understood without the `APP__` prefix, and the
/// configuration keys they land on.
const LEGACY_ENV: [(&str, &str); 4] = [
    ("ZENDESK_SUBDOMAIN", "helpdesk.subdomain"),
    ("ZENDESK_EMAIL", "helpdesk.email"),
    ("ZENDESK_API_TOKEN", "helpdesk.api_token"),
    ("NOREPLY_EMAILS", "emails"),
];

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Helpdesk account and API settings.
    #[serde(default)]
    pub helpdesk: HelpdeskConfig,
    /// Target addresses. Accepts a list or a comma-delimited string.
    #[serde(
        default,
        deserialize_with = "deserialize_email_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub emails: Option<Vec<String>>,
    /// Logging configuration.
    #[serde(default = "default_logging_config")]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HelpdeskConfig {
    /// Account subdomain, as in `<subdomain>.zendesk.com`.
    #[serde(default)]
    pub subdomain: String,
    /// Agent email the API token belongs to.
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub api_token: String,
    /// Overrides the API root derived from `subdomain`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds; 0 disables it.
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/unsuspend.log", empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    /// Drop rotated files older than this; overrides `max_backups`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

fn default_timeout_sec() -> u64 {
    30
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            subdomain: String::new(),
            email: String::new(),
            api_token: String::new(),
            base_url: None,
            timeout_sec: default_timeout_sec(),
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "warn".to_string(),
            file: String::new(),
            file_level: "debug".to_string(),
            max_age_days: None,
            max_backups: Some(3),
            max_size_mb: Some(10),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            helpdesk: HelpdeskConfig::default(),
            emails: None,
            logging: default_logging_config(),
        }
    }
}

impl HelpdeskConfig {
    /// Check that the credentials needed to build a client are present.
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            bail!("helpdesk.email is not set (ZENDESK_EMAIL)");
        }
        if self.api_token.trim().is_empty() {
            bail!("helpdesk.api_token is not set (ZENDESK_API_TOKEN)");
        }
        self.api_base_url()?;
        Ok(())
    }

    /// API root: the explicit `base_url`, or `https://<subdomain>.zendesk.com/api/v2`.
    pub fn api_base_url(&self) -> Result<Url> {
        if let Some(raw) = self.base_url.as_deref().filter(|s| !s.trim().is_empty()) {
            return Url::parse(raw.trim())
                .with_context(|| format!("Invalid helpdesk.base_url '{}'", raw));
        }

        let subdomain = self.subdomain.trim();
        if subdomain.is_empty() {
            bail!("helpdesk.subdomain is not set (ZENDESK_SUBDOMAIN)");
        }
        if !subdomain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            bail!("Invalid helpdesk.subdomain '{}'", subdomain);
        }

        Url::parse(&format!("https://{}.zendesk.com/api/v2", subdomain))
            .with_context(|| format!("Invalid helpdesk.subdomain '{}'", subdomain))
    }

    /// Basic-auth username for API-token authentication.
    pub fn auth_username(&self) -> String {
        format!("{}/token", self.email.trim())
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → `APP__`
    /// environment variables → `ZENDESK_*` / `NOREPLY_EMAILS`.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }
        Self::extract(Some(path))
    }

    /// Same as [`AppConfig::load_layered`], skipping the file layer when no
    /// path is given.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => Self::extract(None),
        }
    }

    fn extract(config_path: Option<&Path>) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        let legacy_keys: Vec<&str> = LEGACY_ENV.iter().map(|(var, _)| *var).collect();
        let figment = figment
            // Example: APP__HELPDESK__TIMEOUT_SEC=10 maps to helpdesk.timeout_sec
            .merge(Env::prefixed("APP__").split("__"))
            .merge(Env::raw().only(&legacy_keys).map(legacy_env_key));

        figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// YAML rendering with the API token masked.
    pub fn to_redacted_yaml(&self) -> Result<String> {
        let mut shown = self.clone();
        if !shown.helpdesk.api_token.is_empty() {
            shown.helpdesk.api_token = "***".to_string();
        }
        shown.to_yaml()
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if !args.emails.is_empty() {
            self.emails = Some(args.emails.clone());
        }

        // Set logging level based on verbose flags for "default" section.
        let default_section = self
            .logging
            .entry("default".to_string())
            .or_insert_with(|| default_logging_config()["default"].clone());
        default_section.console_level = match args.verbose {
            0 => default_section.console_level.clone(), // keep
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        };
    }

    /// Addresses to process: configured ones, or [`DEFAULT_EMAILS`].
    pub fn target_emails(&self) -> Vec<String> {
        match &self.emails {
            Some(list) => list.clone(),
            None => DEFAULT_EMAILS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Command line values that override the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub verbose: u8,
    pub emails: Vec<String>,
}

fn legacy_env_key(key: &UncasedStr) -> Uncased<'_> {
    LEGACY_ENV
        .iter()
        .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
        .map_or_else(|| Uncased::from(key.as_str()), |(_, path)| Uncased::from(*path))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmailList {
    Delimited(String),
    Items(Vec<String>),
}

/// Split a comma-delimited address list. Entries are kept verbatim; callers
/// trim them.
pub fn split_email_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn deserialize_email_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<EmailList>::deserialize(deserializer)?;
    Ok(raw.and_then(|list| match list {
        EmailList::Delimited(s) if s.trim().is_empty() => None,
        EmailList::Delimited(s) => Some(split_email_list(&s)),
        EmailList::Items(items) => Some(items),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn helpdesk(subdomain: &str) -> HelpdeskConfig {
        HelpdeskConfig {
            subdomain: subdomain.to_string(),
            email: "agent@example.com".to_string(),
            api_token: "s3cr3t".to_string(),
            ..HelpdeskConfig::default()
        }
    }

    #[test]
    fn test_default_config_structure() {
        let config = AppConfig::default();

        assert_eq!(config.helpdesk.subdomain, "");
        assert_eq!(config.helpdesk.timeout_sec, 30);
        assert!(config.helpdesk.base_url.is_none());
        assert!(config.emails.is_none());

        let default_section = &config.logging["default"];
        assert_eq!(default_section.console_level, "warn");
        assert_eq!(default_section.file, "");
    }

    #[test]
    fn test_target_emails_falls_back_to_builtin_list() {
        let config = AppConfig::default();
        assert_eq!(
            config.target_emails(),
            vec![
                "noreply@example.com",
                "no-reply@example.com",
                "notifications@example.com"
            ]
        );
    }

    #[test]
    fn test_legacy_env_vars() {
        Jail::expect_with(|jail| {
            jail.set_env("ZENDESK_SUBDOMAIN", "acme");
            jail.set_env("ZENDESK_EMAIL", "agent@acme.com");
            jail.set_env("ZENDESK_API_TOKEN", "tok");
            jail.set_env("NOREPLY_EMAILS", "a@x.com,b@x.com,c@x.com");

            let config = AppConfig::load_or_default(None::<&str>).unwrap();
            assert_eq!(config.helpdesk.subdomain, "acme");
            assert_eq!(config.helpdesk.email, "agent@acme.com");
            assert_eq!(config.helpdesk.api_token, "tok");
            assert_eq!(
                config.emails.as_deref().unwrap(),
                ["a@x.com", "b@x.com", "c@x.com"]
            );
            Ok(())
        });
    }

    #[test]
    fn test_split_email_list_keeps_entries_verbatim() {
        assert_eq!(
            split_email_list("a@x.com, b@x.com ,,c@x.com"),
            vec!["a@x.com", " b@x.com ", "", "c@x.com"]
        );
    }

    #[test]
    fn test_empty_email_env_uses_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("NOREPLY_EMAILS", "");
            let config = AppConfig::load_or_default(None::<&str>).unwrap();
            assert!(config.emails.is_none());
            assert_eq!(config.target_emails().len(), 3);
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "unsuspend.yaml",
                r#"
helpdesk:
  subdomain: "from-file"
  email: "file@acme.com"
  api_token: "file-token"
  timeout_sec: 5
emails:
  - "one@x.com"
  - "two@x.com"
logging:
  default:
    console_level: debug
"#,
            )?;
            jail.set_env("ZENDESK_API_TOKEN", "env-token");
            jail.set_env("APP__HELPDESK__TIMEOUT_SEC", "12");

            let config = AppConfig::load_layered("unsuspend.yaml").unwrap();
            assert_eq!(config.helpdesk.subdomain, "from-file");
            assert_eq!(config.helpdesk.email, "file@acme.com");
            assert_eq!(config.helpdesk.api_token, "env-token");
            assert_eq!(config.helpdesk.timeout_sec, 12);
            assert_eq!(config.emails.as_deref().unwrap(), ["one@x.com", "two@x.com"]);
            assert_eq!(config.logging["default"].console_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = AppConfig::load_layered(tmp.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.yaml", "helpdesk:\n  subdomian: typo\n")?;
            assert!(AppConfig::load_layered("bad.yaml").is_err());
            Ok(())
        });
    }

    #[test]
    fn test_api_base_url_from_subdomain() {
        let url = helpdesk("acme").api_base_url().unwrap();
        assert_eq!(url.as_str(), "https://acme.zendesk.com/api/v2");
    }

    #[test]
    fn test_api_base_url_override() {
        let mut cfg = helpdesk("");
        cfg.base_url = Some("http://127.0.0.1:8080/api/v2".to_string());
        assert_eq!(
            cfg.api_base_url().unwrap().as_str(),
            "http://127.0.0.1:8080/api/v2"
        );
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(helpdesk("").validate().is_err());
        assert!(helpdesk("acme.evil.com/").validate().is_err());

        let mut no_token = helpdesk("acme");
        no_token.api_token.clear();
        assert!(no_token.validate().is_err());

        let mut no_email = helpdesk("acme");
        no_email.email = "  ".to_string();
        assert!(no_email.validate().is_err());

        assert!(helpdesk("acme-support").validate().is_ok());
    }

    #[test]
    fn test_auth_username() {
        assert_eq!(helpdesk("acme").auth_username(), "agent@example.com/token");
    }

    #[test]
    fn test_redacted_yaml_masks_token() {
        let config = AppConfig {
            helpdesk: helpdesk("acme"),
            ..AppConfig::default()
        };
        let yaml = config.to_redacted_yaml().unwrap();
        assert!(yaml.contains("subdomain: acme"));
        assert!(!yaml.contains("s3cr3t"));
        assert!(yaml.contains("***"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        let args = CliArgs {
            verbose: 2,
            emails: vec!["x@y.com".to_string()],
            ..CliArgs::default()
        };

        config.apply_cli_overrides(&args);

        assert_eq!(config.target_emails(), vec!["x@y.com"]);
        assert_eq!(config.logging["default"].console_level, "debug");
    }

    #[test]
    fn test_cli_verbose_levels_matrix() {
        for (verbose_level, expected_log_level) in
            [(0, "warn"), (1, "info"), (2, "debug"), (3, "trace"), (5, "trace")]
        {
            let mut config = AppConfig::default();
            let args = CliArgs {
                verbose: verbose_level,
                ..CliArgs::default()
            };

            config.apply_cli_overrides(&args);

            assert_eq!(
                config.logging["default"].console_level, expected_log_level,
                "verbose={verbose_level}"
            );
        }
    }

    #[test]
    fn test_cli_without_emails_keeps_configured_list() {
        let mut config = AppConfig {
            emails: Some(vec!["kept@x.com".to_string()]),
            ..AppConfig::default()
        };
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config.target_emails(), vec!["kept@x.com"]);
    }
}
