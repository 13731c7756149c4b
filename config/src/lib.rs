//! Load configuration from XDG `config.toml` and project `.env`, then apply to the process
//! environment with priority: **existing env > .env > XDG**. Typed defaults for a play
//! session are read afterwards with [`GameDefaults::from_env`].

mod dotenv_file;
mod settings;
#[cfg(feature = "tracing-init")]
pub mod tracing_init;
mod xdg_toml;

pub use settings::GameDefaults;

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(dotenv::Error),
}

/// Merges the two file layers: `.env` entries override XDG entries with the same key.
fn merge_layers(
    xdg: HashMap<String, String>,
    dotenv_map: HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged = xdg;
    merged.extend(dotenv_map);
    merged
}

/// Loads `$XDG_CONFIG_HOME/<app_name>/config.toml` (`[env]` table) and the project `.env`,
/// then sets every key that is **not** already present in the process environment.
///
/// * `app_name`: e.g. `"questline"`.
/// * `override_dir`: directory holding `.env` instead of the current directory.
///
/// Returns the keys that were applied.
pub fn load_and_apply(
    app_name: &str,
    override_dir: Option<&Path>,
) -> Result<Vec<String>, LoadError> {
    let merged = merge_layers(
        xdg_toml::load_env_map(app_name)?,
        dotenv_file::load_env_map(override_dir)?,
    );
    let mut applied = Vec::new();
    for (key, value) in merged {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        std::env::set_var(&key, value);
        applied.push(key);
    }
    applied.sort();
    Ok(applied)
}
