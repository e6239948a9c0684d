// Configuration loading: environment file (Tabbycat + Discord credentials),
// categories TOML and the participant database path.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cli::Cli;
use crate::draw::category::Categories;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("environment variable {name} is not set")]
    MissingVariable { name: String },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabbycatConfig {
    pub api_key: String,
    pub url: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tabbycat: TabbycatConfig,
    /// Main bot token first, then helpers in index order.
    pub bot_tokens: Vec<String>,
    pub db_path: String,
    pub categories: Categories,
}

/// Prefix of the optional helper bot variables: `DISCORD_HELPER_1`,
/// `DISCORD_HELPER_2`, ... read until the first gap.
const HELPER_PREFIX: &str = "DISCORD_HELPER_";

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load the environment file named on the command line, then assemble the
/// configuration from the process environment and the CLI flags.
pub fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    dotenvy::from_path(&cli.env).map_err(|source| ConfigError::EnvFile {
        path: cli.env.clone(),
        source,
    })?;

    load_config_from(
        |name| std::env::var(name).ok(),
        cli.db.as_deref(),
        cli.categories.as_deref(),
    )
}

/// Assemble the configuration from an arbitrary variable source. This is the
/// lower-level primitive behind [`load_config`]; it never touches the
/// process environment itself.
pub fn load_config_from<F>(
    var: F,
    db_override: Option<&str>,
    categories_path: Option<&Path>,
) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |name: &str| {
        var(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingVariable {
                name: name.to_string(),
            })
    };

    let tabbycat = TabbycatConfig {
        api_key: require("TABBYCAT_API_KEY")?,
        url: require("TABBYCAT_URL")?,
        slug: require("TABBYCAT_SLUG")?,
    };

    let mut bot_tokens = vec![require("DISCORD_BOT_TOKEN")?];
    bot_tokens.extend(
        (1..)
            .map(|i| var(&format!("{HELPER_PREFIX}{i}")).unwrap_or_default())
            .take_while(|token| !token.is_empty()),
    );

    let db_path = match db_override {
        Some(path) => path.to_string(),
        None => format!("{}.db", tabbycat.slug),
    };

    let categories = match categories_path {
        Some(path) => Categories::load(path)?,
        None => Categories::default(),
    };

    let config = Config {
        tabbycat,
        bot_tokens,
        db_path,
        categories,
    };

    validate(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = &config.tabbycat.url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "TABBYCAT_URL".into(),
            message: format!("must be an http(s) URL, got {url:?}"),
        });
    }

    if config.tabbycat.slug.contains('/') {
        return Err(ConfigError::ValidationError {
            field: "TABBYCAT_SLUG".into(),
            message: "must not contain '/'".into(),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "db".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
