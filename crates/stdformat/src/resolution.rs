use once_cell::sync::Lazy;
use std::time::Duration;

use crate::configuration::CommandSpec;
use crate::configuration::Settings;
use crate::environment::Environment;

/// Probed after every configured command, so a plain `standard`
/// install still works when `standard-format` is absent.
static FALLBACK_COMMAND: Lazy<CommandSpec> = Lazy::new(|| CommandSpec::new(&["standard", "--stdin", "--fix"]));

const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// A command spec whose executable was confirmed to resolve on the
/// current search path. Never cached across requests because the
/// search path may change between invocations.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ResolvedCommand {
  pub executable: String,
  pub args: Vec<String>,
}

/// Returns the first command in priority order whose executable
/// resolves on `search_path`, or `None` when nothing resolves.
///
/// On Windows the executable is rewritten to the absolute resolved
/// path because process creation there does not consult a supplied
/// PATH the same way.
pub fn resolve_command<TEnvironment: Environment>(environment: &TEnvironment, settings: &Settings, search_path: &str) -> Option<ResolvedCommand> {
  log_debug!(environment, "Search path: {}", search_path);
  for spec in settings.commands.iter().chain(std::iter::once(&*FALLBACK_COMMAND)) {
    let Some(name) = spec.executable_name() else {
      continue;
    };
    let Some(resolved_path) = environment.find_executable(name, search_path) else {
      continue;
    };
    log_debug!(environment, "Resolved '{}' to {}", name, resolved_path.display());
    let executable = if environment.is_windows() {
      resolved_path.to_string_lossy().into_owned()
    } else {
      name.to_string()
    };
    let command = ResolvedCommand {
      executable,
      args: spec.args().to_vec(),
    };
    if settings.check_version {
      log_command_version(environment, &command, search_path);
    }
    return Some(command);
  }
  log_debug!(environment, "No formatter executable found on the search path.");
  None
}

fn log_command_version(environment: &impl Environment, command: &ResolvedCommand, search_path: &str) {
  let args = vec!["--version".to_string()];
  match environment.run_command(&command.executable, &args, Some(search_path), b"", Some(VERSION_PROBE_TIMEOUT)) {
    Ok(output) if output.success() => {
      let version = String::from_utf8_lossy(&output.stdout);
      log_warn!(environment, "{} version: {}", command.executable, version.trim());
    }
    Ok(output) => {
      log_debug!(environment, "Version probe of {} exited with code {:?}.", command.executable, output.exit_code);
    }
    Err(err) => {
      log_debug!(environment, "Error checking version of {}: {:#}", command.executable, err);
    }
  }
}
