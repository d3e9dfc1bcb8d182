use anyhow::Result;
use anyhow::bail;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::Environment;
use crate::utils::CommandOutput;
use crate::utils::ExecError;
use crate::utils::LogLevel;

/// Scripted behavior for an executable registered on the test
/// environment, keyed by executable name or path.
#[derive(Clone)]
pub enum TestCommandBehavior {
  /// Fixed streams and exit code regardless of input.
  Output {
    stdout: String,
    stderr: String,
    exit_code: i32,
  },
  /// Echoes stdin to stdout unchanged.
  Identity,
  /// Derives the output from the input text.
  Transform(Arc<dyn Fn(&str) -> CommandOutput + Send + Sync>),
  /// Never exits; the invocation fails with a timeout.
  Hang,
}

#[derive(Clone)]
pub struct TestEnvironment {
  files: Arc<Mutex<HashMap<PathBuf, String>>>,
  directories: Arc<Mutex<HashSet<PathBuf>>>,
  env_vars: Arc<Mutex<HashMap<String, String>>>,
  executables: Arc<Mutex<HashSet<PathBuf>>>,
  command_behaviors: Arc<Mutex<HashMap<String, TestCommandBehavior>>>,
  logged_messages: Arc<Mutex<Vec<String>>>,
  logged_errors: Arc<Mutex<Vec<String>>>,
  machine_readable_output: Arc<Mutex<Vec<String>>>,
  os: Arc<Mutex<String>>,
  config_dir: Arc<Mutex<Option<PathBuf>>>,
  cwd: Arc<Mutex<PathBuf>>,
}

impl TestEnvironment {
  pub fn new() -> TestEnvironment {
    TestEnvironment {
      files: Default::default(),
      directories: Default::default(),
      env_vars: Default::default(),
      executables: Default::default(),
      command_behaviors: Default::default(),
      logged_messages: Default::default(),
      logged_errors: Default::default(),
      machine_readable_output: Default::default(),
      os: Arc::new(Mutex::new("linux".to_string())),
      config_dir: Arc::new(Mutex::new(Some(PathBuf::from("/config")))),
      cwd: Arc::new(Mutex::new(PathBuf::from("/"))),
    }
  }

  pub fn set_os(&self, os: &str) {
    *self.os.lock() = os.to_string();
  }

  pub fn set_cwd(&self, cwd: &str) {
    *self.cwd.lock() = PathBuf::from(cwd);
  }

  pub fn set_config_dir(&self, dir: Option<&str>) {
    *self.config_dir.lock() = dir.map(PathBuf::from);
  }

  pub fn set_env_var(&self, name: &str, value: Option<&str>) {
    let mut env_vars = self.env_vars.lock();
    match value {
      Some(value) => {
        env_vars.insert(name.to_string(), value.to_string());
      }
      None => {
        env_vars.remove(name);
      }
    }
  }

  /// Registers an executable file at the given absolute path and also
  /// creates its parent directories.
  pub fn add_executable(&self, file_path: &str) {
    let file_path = PathBuf::from(file_path);
    if let Some(parent) = file_path.parent() {
      self.mk_dir_all(parent).unwrap();
    }
    self.executables.lock().insert(file_path);
  }

  pub fn set_command_behavior(&self, executable: &str, behavior: TestCommandBehavior) {
    self.command_behaviors.lock().insert(executable.to_string(), behavior);
  }

  pub fn get_logged_messages(&self) -> Vec<String> {
    self.logged_messages.lock().clone()
  }

  pub fn get_logged_errors(&self) -> Vec<String> {
    self.logged_errors.lock().clone()
  }

  pub fn get_machine_readable_output(&self) -> Vec<String> {
    self.machine_readable_output.lock().clone()
  }

  fn behavior_for(&self, executable: &str) -> Option<TestCommandBehavior> {
    let behaviors = self.command_behaviors.lock();
    if let Some(behavior) = behaviors.get(executable) {
      return Some(behavior.clone());
    }
    // a resolved absolute path still matches a behavior registered by name
    let file_name = Path::new(executable).file_name()?.to_string_lossy().into_owned();
    behaviors.get(&file_name).cloned()
  }
}

impl Environment for TestEnvironment {
  fn read_file(&self, file_path: impl AsRef<Path>) -> Result<String> {
    let files = self.files.lock();
    match files.get(file_path.as_ref()) {
      Some(text) => Ok(text.clone()),
      None => bail!("Could not find file at path {}", file_path.as_ref().display()),
    }
  }

  fn write_file(&self, file_path: impl AsRef<Path>, file_text: &str) -> Result<()> {
    let file_path = file_path.as_ref().to_path_buf();
    if let Some(parent) = file_path.parent() {
      self.mk_dir_all(parent)?;
    }
    self.files.lock().insert(file_path, file_text.to_string());
    Ok(())
  }

  fn path_exists(&self, file_path: impl AsRef<Path>) -> bool {
    self.files.lock().contains_key(file_path.as_ref()) || self.directories.lock().contains(file_path.as_ref())
  }

  fn dir_exists(&self, dir_path: impl AsRef<Path>) -> bool {
    self.directories.lock().contains(dir_path.as_ref())
  }

  fn mk_dir_all(&self, dir_path: impl AsRef<Path>) -> Result<()> {
    let mut directories = self.directories.lock();
    for ancestor_dir in dir_path.as_ref().ancestors() {
      directories.insert(ancestor_dir.to_path_buf());
    }
    Ok(())
  }

  fn cwd(&self) -> PathBuf {
    self.cwd.lock().clone()
  }

  fn os(&self) -> String {
    self.os.lock().clone()
  }

  fn env_var(&self, name: &str) -> Option<String> {
    self.env_vars.lock().get(name).cloned()
  }

  fn get_config_dir(&self) -> Option<PathBuf> {
    self.config_dir.lock().clone()
  }

  fn find_executable(&self, name: &str, search_path: &str) -> Option<PathBuf> {
    let executables = self.executables.lock();
    for dir in search_path.split(self.path_separator()) {
      if dir.is_empty() {
        continue;
      }
      let candidate = PathBuf::from(dir).join(name);
      if executables.contains(&candidate) {
        return Some(candidate);
      }
      if self.is_windows() {
        let candidate = PathBuf::from(dir).join(format!("{}.exe", name));
        if executables.contains(&candidate) {
          return Some(candidate);
        }
      }
    }
    None
  }

  fn run_command(
    &self,
    executable: &str,
    args: &[String],
    _env_path: Option<&str>,
    input: &[u8],
    timeout: Option<Duration>,
  ) -> Result<CommandOutput, ExecError> {
    let _ = args;
    match self.behavior_for(executable) {
      Some(TestCommandBehavior::Output { stdout, stderr, exit_code }) => Ok(CommandOutput {
        stdout: stdout.into_bytes(),
        stderr: stderr.into_bytes(),
        exit_code: Some(exit_code),
      }),
      Some(TestCommandBehavior::Identity) => Ok(CommandOutput {
        stdout: input.to_vec(),
        stderr: Vec::new(),
        exit_code: Some(0),
      }),
      Some(TestCommandBehavior::Transform(transform)) => Ok(transform(&String::from_utf8_lossy(input))),
      Some(TestCommandBehavior::Hang) => Err(ExecError::Timeout {
        timeout: timeout.unwrap_or(Duration::from_secs(10)),
      }),
      None => Err(ExecError::NotFound {
        executable: executable.to_string(),
      }),
    }
  }

  fn log(&self, text: &str) {
    self.logged_messages.lock().push(text.to_string());
  }

  fn log_machine_readable(&self, text: &str) {
    self.machine_readable_output.lock().push(text.to_string());
  }

  fn log_stderr(&self, text: &str) {
    self.logged_errors.lock().push(text.to_string());
  }

  fn log_level(&self) -> LogLevel {
    LogLevel::Debug
  }
}
