use indexmap::IndexMap;
use serde_json::Value;

use super::CommandSpec;
use super::Settings;
use crate::environment::Environment;

/// Maps settings file text onto a strongly typed `Settings`. A field
/// of the wrong type degrades to its default with a logged
/// diagnostic; this never fails back to the caller.
pub fn deserialize_settings(environment: &impl Environment, file_text: &str) -> Settings {
  let value = match jsonc_parser::parse_to_serde_value(file_text, &Default::default()) {
    Ok(Some(value)) => value,
    Ok(None) => return Settings::default(),
    Err(err) => {
      log_warn!(environment, "Error parsing settings file. Using defaults. {:#}", err);
      return Settings::default();
    }
  };
  let mut obj = match value {
    Value::Object(obj) => obj,
    _ => {
      log_warn!(environment, "Expected an object in the settings file root. Using defaults.");
      return Settings::default();
    }
  };

  let mut settings = Settings::default();
  settings.format_on_save = take_bool(environment, &mut obj, "format_on_save", settings.format_on_save);
  settings.path = take_string_list(environment, &mut obj, "PATH", settings.path);
  settings.use_view_path = take_bool(environment, &mut obj, "use_view_path", settings.use_view_path);
  settings.use_project_path_fallback = take_bool(environment, &mut obj, "use_project_path_fallback", settings.use_project_path_fallback);
  settings.use_global_path = take_bool(environment, &mut obj, "use_global_path", settings.use_global_path);
  settings.commands = take_commands(environment, &mut obj, settings.commands);
  settings.includes = take_string_list(environment, &mut obj, "includes", settings.includes);
  settings.excludes = take_string_list(environment, &mut obj, "excludes", settings.excludes);
  settings.selectors = take_string_map(environment, &mut obj, "selectors", settings.selectors);
  settings.loud_error = take_bool(environment, &mut obj, "loud_error", settings.loud_error);
  settings.log_errors = take_bool(environment, &mut obj, "log_errors", settings.log_errors);
  settings.check_version = take_bool(environment, &mut obj, "check_version", settings.check_version);
  settings.get_path_command = take_string_list(environment, &mut obj, "get_path_command", settings.get_path_command);
  settings.logging_on_view_change = take_bool(environment, &mut obj, "logging_on_view_change", settings.logging_on_view_change);
  settings.format_timeout_seconds = take_u64(environment, &mut obj, "format_timeout_seconds", settings.format_timeout_seconds);
  settings.apply_output_on_stderr = take_bool(environment, &mut obj, "apply_output_on_stderr", settings.apply_output_on_stderr);
  settings.syntax_blacklist = take_string_list(environment, &mut obj, "syntax_blacklist", settings.syntax_blacklist);

  for key in obj.keys() {
    log_warn!(environment, "Unknown setting '{}'.", key);
  }

  settings
}

fn take_bool(environment: &impl Environment, obj: &mut serde_json::Map<String, Value>, key: &str, default: bool) -> bool {
  match obj.remove(key) {
    Some(Value::Bool(value)) => value,
    Some(_) => {
      log_wrong_type(environment, key, "a boolean");
      default
    }
    None => default,
  }
}

fn take_u64(environment: &impl Environment, obj: &mut serde_json::Map<String, Value>, key: &str, default: u64) -> u64 {
  match obj.remove(key) {
    Some(Value::Number(value)) => match value.as_u64() {
      Some(value) => value,
      None => {
        log_wrong_type(environment, key, "a non-negative integer");
        default
      }
    },
    Some(_) => {
      log_wrong_type(environment, key, "a non-negative integer");
      default
    }
    None => default,
  }
}

fn take_string_list(environment: &impl Environment, obj: &mut serde_json::Map<String, Value>, key: &str, default: Vec<String>) -> Vec<String> {
  match obj.remove(key) {
    Some(Value::Array(values)) => {
      let mut result = Vec::with_capacity(values.len());
      for value in values {
        match value {
          Value::String(value) => result.push(value),
          _ => log_wrong_type(environment, key, "an array of strings"),
        }
      }
      result
    }
    Some(_) => {
      log_wrong_type(environment, key, "an array of strings");
      default
    }
    None => default,
  }
}

fn take_string_map(
  environment: &impl Environment,
  obj: &mut serde_json::Map<String, Value>,
  key: &str,
  default: IndexMap<String, String>,
) -> IndexMap<String, String> {
  match obj.remove(key) {
    Some(Value::Object(values)) => {
      let mut result = IndexMap::with_capacity(values.len());
      for (name, value) in values {
        match value {
          Value::String(value) => {
            result.insert(name, value);
          }
          _ => log_wrong_type(environment, key, "an object of strings"),
        }
      }
      result
    }
    Some(_) => {
      log_wrong_type(environment, key, "an object of strings");
      default
    }
    None => default,
  }
}

fn take_commands(environment: &impl Environment, obj: &mut serde_json::Map<String, Value>, default: Vec<CommandSpec>) -> Vec<CommandSpec> {
  let values = match obj.remove("commands") {
    Some(Value::Array(values)) => values,
    Some(_) => {
      log_wrong_type(environment, "commands", "an array of string arrays");
      return default;
    }
    None => return default,
  };
  let mut commands = Vec::with_capacity(values.len());
  for value in values {
    match serde_json::from_value::<Vec<String>>(value) {
      Ok(parts) if !parts.is_empty() => commands.push(CommandSpec(parts)),
      Ok(_) => log_warn!(environment, "Ignoring empty entry in setting 'commands'."),
      Err(_) => log_wrong_type(environment, "commands", "an array of string arrays"),
    }
  }
  commands
}

fn log_wrong_type(environment: &impl Environment, key: &str, expected: &str) {
  log_warn!(environment, "Expected {} for setting '{}'. Using the default.", expected, key);
}
