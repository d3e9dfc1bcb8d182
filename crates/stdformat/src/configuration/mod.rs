use anyhow::Context;
use anyhow::Result;
use std::path::PathBuf;

mod deserialize_settings;
mod types;

pub use deserialize_settings::*;
pub use types::*;

use crate::environment::Environment;

pub const SETTINGS_FILE_NAME: &str = "stdformat.json";

/// Resolves where the settings file lives: `STDFORMAT_CONFIG_DIR`
/// when set, otherwise the `stdformat` folder under the system
/// configuration directory.
pub fn resolve_settings_file_path(environment: &impl Environment) -> Option<PathBuf> {
  if let Some(dir) = environment.env_var("STDFORMAT_CONFIG_DIR").filter(|dir| !dir.is_empty()) {
    return Some(PathBuf::from(dir).join(SETTINGS_FILE_NAME));
  }
  environment.get_config_dir().map(|dir| dir.join("stdformat").join(SETTINGS_FILE_NAME))
}

pub fn load_settings(environment: &impl Environment) -> Settings {
  let Some(file_path) = resolve_settings_file_path(environment) else {
    log_debug!(environment, "Could not resolve a settings directory. Using default settings.");
    return Settings::default();
  };
  if !environment.path_exists(&file_path) {
    log_debug!(environment, "No settings file at {}. Using default settings.", file_path.display());
    return Settings::default();
  }
  match environment.read_file(&file_path) {
    Ok(file_text) => deserialize_settings(environment, &file_text),
    Err(err) => {
      log_warn!(environment, "Error reading settings file. Using defaults. {:#}", err);
      Settings::default()
    }
  }
}

pub fn save_settings(environment: &impl Environment, settings: &Settings) -> Result<()> {
  let file_path = resolve_settings_file_path(environment).context("Could not resolve a settings directory.")?;
  if let Some(parent) = file_path.parent() {
    environment.mk_dir_all(parent)?;
  }
  let mut file_text = serde_json::to_string_pretty(settings)?;
  file_text.push('\n');
  environment.write_file(&file_path, &file_text)
}

/// Flips the persisted "format on save" preference and returns the
/// new value.
pub fn toggle_format_on_save(environment: &impl Environment) -> Result<bool> {
  let mut settings = load_settings(environment);
  settings.format_on_save = !settings.format_on_save;
  save_settings(environment, &settings)?;
  Ok(settings.format_on_save)
}
