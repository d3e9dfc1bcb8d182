use once_cell::sync::OnceCell;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::configuration::Settings;
use crate::environment::Environment;

/// Guards against pathological directory nesting. A real file system
/// hierarchy never comes close to this.
const MAX_UPWARD_WALK_DEPTH: usize = 64;
const LOGIN_PATH_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the ordered search path used to find formatter executables.
///
/// The login path is derived at most once per process no matter how
/// many documents get formatted.
pub struct PathResolver<TEnvironment: Environment> {
  environment: TEnvironment,
  login_path: Arc<OnceCell<Option<String>>>,
}

impl<TEnvironment: Environment> PathResolver<TEnvironment> {
  pub fn new(environment: TEnvironment) -> Self {
    PathResolver {
      environment,
      login_path: Default::default(),
    }
  }

  /// Produces a single separator-joined search path. Priority order:
  /// user configured entries, project-local `node_modules/.bin`
  /// directories found walking upward from the active file (or from
  /// each open project folder when there is no file), then the
  /// global PATH.
  pub fn build_search_path(&self, settings: &Settings, view_file_path: Option<&Path>, project_folders: &[PathBuf]) -> String {
    let mut entries: Vec<String> = settings.path.iter().filter(|entry| !entry.is_empty()).cloned().collect();

    let view_dir = view_file_path.and_then(|file_path| file_path.parent());
    if settings.use_view_path && let Some(view_dir) = view_dir {
      entries.extend(find_node_modules_bin_dirs(&self.environment, view_dir));
    } else if settings.use_project_path_fallback {
      for folder in project_folders {
        entries.extend(find_node_modules_bin_dirs(&self.environment, folder));
      }
    }

    if settings.use_global_path
      && let Some(global_path) = self.global_path(settings)
      && !global_path.is_empty()
    {
      entries.push(global_path);
    }

    entries.join(&self.environment.path_separator().to_string())
  }

  fn global_path(&self, settings: &Settings) -> Option<String> {
    if !self.environment.is_windows() && !settings.get_path_command.is_empty() {
      let login_path = self
        .login_path
        .get_or_init(|| derive_login_path(&self.environment, &settings.get_path_command))
        .clone();
      if login_path.is_some() {
        return login_path;
      }
    }
    self.environment.env_var("PATH")
  }
}

/// Walks upward from `start_dir` collecting every `node_modules/.bin`
/// directory, nearest first. The accumulator is freshly allocated per
/// call and `ancestors()` cannot cycle, so the walk always terminates;
/// unreadable directories report as absent and are skipped.
fn find_node_modules_bin_dirs(environment: &impl Environment, start_dir: &Path) -> Vec<String> {
  let mut bin_dirs = Vec::new();
  for ancestor_dir in start_dir.ancestors().take(MAX_UPWARD_WALK_DEPTH) {
    let bin_dir = ancestor_dir.join("node_modules").join(".bin");
    if environment.dir_exists(&bin_dir) {
      bin_dirs.push(bin_dir.to_string_lossy().into_owned());
    }
  }
  bin_dirs
}

/// Runs the configured shell command and takes the first stdout line
/// that looks like a path list (starts with a path separator). Gives
/// back `None` when the command fails so the inherited PATH can be
/// used instead.
fn derive_login_path(environment: &impl Environment, command: &[String]) -> Option<String> {
  let executable = command.first()?;
  match environment.run_command(executable, &command[1..], None, b"", Some(LOGIN_PATH_TIMEOUT)) {
    Ok(output) => {
      let stdout = String::from_utf8_lossy(&output.stdout).replace('\r', "");
      stdout.lines().map(str::trim).find(|line| line.starts_with('/')).map(ToOwned::to_owned)
    }
    Err(err) => {
      log_debug!(environment, "Error deriving login PATH: {:#}", err);
      None
    }
  }
}
