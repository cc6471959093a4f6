//! Orchestrator configuration
//!
//! Every setting is read from an `APP_`-prefixed environment variable, with
//! `.env` files honoured, and falls back to defaults suited for local
//! development. Empty values count as unset.

use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::time::Duration;
use tracing::Level;

const ENV_PREFIX: &str = "APP_";

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: String,

    pub api_title: String,
    pub api_version: String,

    /// CORS origins; a single `*` allows any origin
    pub allow_origins: Vec<String>,

    /// Default level for the orchestrator's own tracing output
    pub log_level: Level,

    /// Length of one simulated unit of step work
    pub step_time_unit: Duration,

    pub github: GitHubConfig,
}

/// Optional GitHub Actions integration
#[derive(Clone)]
pub struct GitHubConfig {
    /// Personal access token; integration is disabled without one
    pub token: Option<String>,
    pub api_url: String,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub workflow: String,
    pub git_ref: String,
    /// Provision a workflow in the pipeline's repository on creation
    pub auto_create_workflow: bool,
}

impl GitHubConfig {
    pub fn enabled(&self) -> bool {
        self.token.is_some()
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            owner: None,
            repo: None,
            workflow: "pipeline.yml".to_string(),
            git_ref: "main".to_string(),
            auto_create_workflow: true,
        }
    }
}

// Never print the token itself.
impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "***MASKED***"))
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("workflow", &self.workflow)
            .field("git_ref", &self.git_ref)
            .field("auto_create_workflow", &self.auto_create_workflow)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            api_title: "Delivery-Bot API".to_string(),
            api_version: "0.1.0".to_string(),
            allow_origins: vec!["*".to_string()],
            log_level: Level::INFO,
            step_time_unit: Duration::from_millis(1000),
            github: GitHubConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment and `.env`
    ///
    /// Recognised variables (all optional):
    /// - APP_BIND_ADDR (default: 0.0.0.0:8080)
    /// - APP_API_TITLE, APP_API_VERSION
    /// - APP_ALLOW_ORIGINS (JSON array or comma-separated list, default: *)
    /// - APP_LOG_LEVEL (debug, info, warn/warning, error; default: info)
    /// - APP_STEP_TIME_UNIT_MS (default: 1000)
    /// - APP_GITHUB_TOKEN, APP_GITHUB_API_URL, APP_GITHUB_OWNER, APP_GITHUB_REPO
    /// - APP_GITHUB_WORKFLOW (default: pipeline.yml), APP_GITHUB_REF (default: main)
    /// - APP_GITHUB_AUTO_CREATE_WORKFLOW (default: true)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Config::default();
        let github_defaults = GitHubConfig::default();

        let allow_origins = match get("ALLOW_ORIGINS") {
            Some(raw) => parse_origins(&raw)?,
            None => defaults.allow_origins,
        };

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => parse_level(&raw)?,
            None => defaults.log_level,
        };

        let step_time_unit = match get("STEP_TIME_UNIT_MS") {
            Some(raw) => Duration::from_millis(
                raw.parse::<u64>()
                    .with_context(|| format!("Invalid APP_STEP_TIME_UNIT_MS: {raw}"))?,
            ),
            None => defaults.step_time_unit,
        };

        let auto_create_workflow = match get("GITHUB_AUTO_CREATE_WORKFLOW") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow!("Invalid APP_GITHUB_AUTO_CREATE_WORKFLOW: {raw}"))?,
            None => github_defaults.auto_create_workflow,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            api_title: get("API_TITLE").unwrap_or(defaults.api_title),
            api_version: get("API_VERSION").unwrap_or(defaults.api_version),
            allow_origins,
            log_level,
            step_time_unit,
            github: GitHubConfig {
                token: get("GITHUB_TOKEN"),
                api_url: get("GITHUB_API_URL").unwrap_or(github_defaults.api_url),
                owner: get("GITHUB_OWNER"),
                repo: get("GITHUB_REPO"),
                workflow: get("GITHUB_WORKFLOW").unwrap_or(github_defaults.workflow),
                git_ref: get("GITHUB_REF").unwrap_or(github_defaults.git_ref),
                auto_create_workflow,
            },
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.allow_origins.is_empty() {
            anyhow::bail!("allow_origins must list at least one origin");
        }

        if self.step_time_unit.is_zero() {
            anyhow::bail!("step_time_unit must be greater than 0");
        }

        if !self.github.api_url.starts_with("http://")
            && !self.github.api_url.starts_with("https://")
        {
            anyhow::bail!("github api_url must start with http:// or https://");
        }

        Ok(())
    }

    /// Default `EnvFilter` directives when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> String {
        let level = self.log_level.as_str().to_lowercase();
        format!("delivery_orchestrator={level},tower_http={level}")
    }
}

fn parse_origins(raw: &str) -> Result<Vec<String>> {
    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw)
            .with_context(|| format!("Invalid APP_ALLOW_ORIGINS JSON array: {raw}"));
    }

    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect())
}

fn parse_level(raw: &str) -> Result<Level> {
    match raw.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" | "critical" => Ok(Level::ERROR),
        _ => Err(anyhow!("Invalid APP_LOG_LEVEL: {raw}")),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.api_title, "Delivery-Bot API");
        assert_eq!(config.api_version, "0.1.0");
        assert_eq!(config.allow_origins, vec!["*"]);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.step_time_unit, Duration::from_secs(1));
        assert_eq!(config.github.workflow, "pipeline.yml");
        assert_eq!(config.github.git_ref, "main");
        assert!(config.github.auto_create_workflow);
        assert!(!config.github.enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_override() {
        let config = load(&[
            ("APP_API_TITLE", "Custom API"),
            ("APP_BIND_ADDR", "127.0.0.1:9000"),
            ("APP_STEP_TIME_UNIT_MS", "25"),
            ("APP_GITHUB_TOKEN", "ghp_secret"),
            ("APP_GITHUB_AUTO_CREATE_WORKFLOW", "false"),
        ])
        .unwrap();

        assert_eq!(config.api_title, "Custom API");
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.step_time_unit, Duration::from_millis(25));
        assert!(config.github.enabled());
        assert!(!config.github.auto_create_workflow);
    }

    #[test]
    fn test_allow_origins_formats() {
        let json = load(&[(
            "APP_ALLOW_ORIGINS",
            r#"["http://localhost:3000", "https://example.com"]"#,
        )])
        .unwrap();
        assert_eq!(
            json.allow_origins,
            vec!["http://localhost:3000", "https://example.com"]
        );

        let csv = load(&[("APP_ALLOW_ORIGINS", "http://a.test, http://b.test")]).unwrap();
        assert_eq!(csv.allow_origins, vec!["http://a.test", "http://b.test"]);

        assert!(load(&[("APP_ALLOW_ORIGINS", "[not json")]).is_err());
    }

    #[test]
    fn test_log_level_case_insensitive() {
        for (raw, expected) in [
            ("DEBUG", Level::DEBUG),
            ("info", Level::INFO),
            ("Warning", Level::WARN),
            ("error", Level::ERROR),
        ] {
            let config = load(&[("APP_LOG_LEVEL", raw)]).unwrap();
            assert_eq!(config.log_level, expected);
        }
        assert!(load(&[("APP_LOG_LEVEL", "loud")]).is_err());
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = load(&[("APP_GITHUB_TOKEN", ""), ("APP_API_TITLE", "  ")]).unwrap();
        assert!(config.github.token.is_none());
        assert_eq!(config.api_title, "Delivery-Bot API");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(load(&[("APP_STEP_TIME_UNIT_MS", "fast")]).is_err());
        assert!(load(&[("APP_GITHUB_AUTO_CREATE_WORKFLOW", "maybe")]).is_err());

        let config = load(&[("APP_STEP_TIME_UNIT_MS", "0")]).unwrap();
        assert!(config.validate().is_err());

        let config = load(&[("APP_GITHUB_API_URL", "api.github.com")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_output_masks_token() {
        let config = load(&[("APP_GITHUB_TOKEN", "ghp_supersecret")]).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("ghp_supersecret"));
        assert!(rendered.contains("***MASKED***"));
    }

    #[test]
    fn test_default_log_filter() {
        let config = load(&[("APP_LOG_LEVEL", "debug")]).unwrap();
        assert_eq!(
            config.default_log_filter(),
            "delivery_orchestrator=debug,tower_http=debug"
        );
    }
}
