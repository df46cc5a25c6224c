//! `wm check-policy` command implementation.

use std::path::PathBuf;

use clap::Args;
use wm_config::Config;

use crate::error::CliError;
use crate::output::Output;
use crate::settings::{describe_policy, settings_from_config};

/// Arguments for the check-policy command.
#[derive(Args)]
pub(crate) struct CheckPolicyArgs {
    /// Path to configuration file (default: auto-discover wikimark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl CheckPolicyArgs {
    /// Execute the check-policy command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is invalid.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::stderr();
        let config = Config::load(self.config.as_deref(), None)?;

        match &config.config_path {
            Some(path) => output.note(&format!("Config file: {}", path.display())),
            None => output.warning("No wikimark.toml found, using defaults"),
        }
        if config.safe_mode {
            output.note("Safe mode: enabled");
        }

        let settings = settings_from_config(&config);
        output.section("Policy");
        for line in describe_policy(&settings.policy) {
            output.item(0, &line);
        }

        output.section("Links");
        output.field("nofollow", settings.force_nofollow);
        output.field("schemes", schemes(config.links.schemes.as_deref()));
        if let Some(root) = &settings.link_root {
            output.field("root", root);
        }
        output.section("Images");
        output.field("schemes", schemes(config.images.schemes.as_deref()));
        if let Some(root) = &settings.image_root {
            output.field("root", root);
        }
        output.section("HTML");
        output.field("comments", settings.pass_comments);

        output.success("Configuration is valid");
        Ok(())
    }
}

fn schemes(list: Option<&[String]>) -> String {
    list.map_or_else(|| "default".to_owned(), |list| list.join(" "))
}
