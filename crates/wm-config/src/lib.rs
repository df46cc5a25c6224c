//! Configuration management for wikimark.
//!
//! Parses `wikimark.toml` files with serde and provides auto-discovery of the
//! config file in parent directories. CLI settings can be applied during load
//! via [`CliSettings`].
//!
//! ```toml
//! safe_mode = false
//!
//! [policy]
//! tags = { a = ["href", "title"], img = ["src", "alt"], b = true }
//! classes = ["note", "#intro"]
//! styles = ["color", "text-align"]
//!
//! [html]
//! pass_comments = false
//!
//! [links]
//! force_nofollow = true
//! schemes = ["http", "https", "mailto"]
//! root = "${DOCS_ROOT:-/docs}"
//!
//! [images]
//! root = "/static"
//! ```
//!
//! ## Environment Variable Expansion
//!
//! `links.root` and `images.root` support `${VAR}` (error if unset) and
//! `${VAR:-default}`.

mod expand;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wikimark.toml";

/// Longest tag name the markup recognizes.
const MAX_TAG_NAME: usize = 51;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Force the safe preset.
    pub safe_mode: Option<bool>,
    /// Override comment pass-through.
    pub pass_comments: Option<bool>,
    /// Override `rel="nofollow"` injection.
    pub force_nofollow: Option<bool>,
}

/// `true`, `false` or an explicit list of names.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum NameList {
    Toggle(bool),
    Names(Vec<String>),
}

/// `true`, `false` or a table of tag name to attribute list.
///
/// In the table, `true` allows every attribute of the tag and `false` allows
/// the tag without attributes; tags not listed are rejected.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TagsSetting {
    Toggle(bool),
    PerTag(BTreeMap<String, NameList>),
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Start from the safe preset before applying the sections below.
    pub safe_mode: bool,
    /// Allow-lists.
    pub policy: PolicyConfig,
    /// Raw HTML handling.
    pub html: HtmlConfig,
    /// Anchor handling.
    pub links: LinksConfig,
    /// Image handling.
    pub images: ImagesConfig,

    /// Set when the command line forced the safe preset; the preset then
    /// wins over the file sections.
    #[serde(skip)]
    pub safe_forced: bool,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Allow-list configuration. Unset entries keep the preset's lists.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub tags: Option<TagsSetting>,
    /// Class names; `#id` entries allow id values.
    pub classes: Option<NameList>,
    /// CSS property names.
    pub styles: Option<NameList>,
}

/// Raw HTML configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pass_comments: Option<bool>,
}

impl HtmlConfig {
    /// Whether sanitized comments are kept (default `true`).
    #[must_use]
    pub fn pass_comments(&self) -> bool {
        self.pass_comments.unwrap_or(true)
    }

    /// The configured value, `None` when unset.
    #[must_use]
    pub fn pass_comments_setting(&self) -> Option<bool> {
        self.pass_comments
    }
}

/// Anchor configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    force_nofollow: Option<bool>,
    /// Allowed URL schemes for `a[href]`; unset means any safe scheme.
    pub schemes: Option<Vec<String>>,
    /// Prefix for relative hrefs.
    pub root: Option<String>,
}

impl LinksConfig {
    /// Whether `rel="nofollow"` is added to external links (default `false`).
    #[must_use]
    pub fn force_nofollow(&self) -> bool {
        self.force_nofollow.unwrap_or(false)
    }

    /// The configured value, `None` when unset.
    #[must_use]
    pub fn force_nofollow_setting(&self) -> Option<bool> {
        self.force_nofollow
    }
}

/// Image configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Allowed URL schemes for `img[src]`.
    pub schemes: Option<Vec<String>>,
    /// Prefix for relative image sources.
    pub root: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`links.root`").
        field: String,
        /// Error message (e.g., "${`DOCS_ROOT`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `wikimark.toml` in the current directory and its parents, falling
    /// back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if parsing,
    /// expansion or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            tracing::debug!("No config file found, using defaults");
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(safe_mode) = settings.safe_mode {
            self.safe_mode = safe_mode;
            self.safe_forced = safe_mode;
        }
        if let Some(pass_comments) = settings.pass_comments {
            self.html.pass_comments = Some(pass_comments);
        }
        if let Some(force_nofollow) = settings.force_nofollow {
            self.links.force_nofollow = Some(force_nofollow);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::discover_from(&cwd)
    }

    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "Discovered config file");
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_policy()?;
        validate_schemes(self.links.schemes.as_deref(), "links.schemes")?;
        validate_schemes(self.images.schemes.as_deref(), "images.schemes")?;
        require_non_empty(self.links.root.as_deref(), "links.root")?;
        require_non_empty(self.images.root.as_deref(), "images.root")?;
        Ok(())
    }

    fn validate_policy(&self) -> Result<(), ConfigError> {
        if let Some(TagsSetting::PerTag(tags)) = &self.policy.tags {
            for (tag, attrs) in tags {
                if !is_tag_name(tag) {
                    return Err(ConfigError::Validation(format!(
                        "policy.tags: invalid tag name '{tag}'"
                    )));
                }
                if let NameList::Names(names) = attrs
                    && names.iter().any(|name| name.trim().is_empty())
                {
                    return Err(ConfigError::Validation(format!(
                        "policy.tags.{tag}: attribute names cannot be empty"
                    )));
                }
            }
        }
        for (list, field) in [
            (&self.policy.classes, "policy.classes"),
            (&self.policy.styles, "policy.styles"),
        ] {
            if let Some(NameList::Names(names)) = list
                && names.iter().any(|name| name.trim().is_empty())
            {
                return Err(ConfigError::Validation(format!(
                    "{field}: names cannot be empty"
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(root) = &self.links.root {
            self.links.root = Some(expand::expand_env(root, "links.root")?);
        }
        if let Some(root) = &self.images.root {
            self.images.root = Some(expand::expand_env(root, "images.root")?);
        }
        Ok(())
    }
}

fn require_non_empty(value: Option<&str>, field: &str) -> Result<(), ConfigError> {
    if value.is_some_and(|v| v.trim().is_empty()) {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Scheme names follow `[a-z][a-z0-9+.-]*`.
fn validate_schemes(schemes: Option<&[String]>, field: &str) -> Result<(), ConfigError> {
    for scheme in schemes.unwrap_or_default() {
        let mut chars = scheme.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase())
            && chars.all(|c| {
                c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '.' | '-')
            });
        if !valid {
            return Err(ConfigError::Validation(format!(
                "{field}: invalid scheme '{scheme}'"
            )));
        }
    }
    Ok(())
}

/// Tag names follow the raw HTML tag grammar: a letter, then letters, digits,
/// `_`, `:` or `-`.
fn is_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    name.len() <= MAX_TAG_NAME
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-'))
}
