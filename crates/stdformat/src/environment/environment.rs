use anyhow::Result;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::CommandOutput;
use crate::utils::ExecError;
use crate::utils::LogLevel;

pub trait Environment: Clone + Send + Sync + 'static {
  fn read_file(&self, file_path: impl AsRef<Path>) -> Result<String>;
  fn write_file(&self, file_path: impl AsRef<Path>, file_text: &str) -> Result<()>;
  fn path_exists(&self, file_path: impl AsRef<Path>) -> bool;
  fn dir_exists(&self, dir_path: impl AsRef<Path>) -> bool;
  fn mk_dir_all(&self, dir_path: impl AsRef<Path>) -> Result<()>;
  fn cwd(&self) -> PathBuf;
  fn os(&self) -> String;
  fn env_var(&self, name: &str) -> Option<String>;
  fn get_config_dir(&self) -> Option<PathBuf>;
  /// Resolves an executable name to a file on the given search path,
  /// earlier entries taking priority.
  fn find_executable(&self, name: &str, search_path: &str) -> Option<PathBuf>;
  /// Runs a command to completion, feeding `input` over stdin. When
  /// `env_path` is provided the child's PATH is replaced with it.
  fn run_command(
    &self,
    executable: &str,
    args: &[String],
    env_path: Option<&str>,
    input: &[u8],
    timeout: Option<Duration>,
  ) -> Result<CommandOutput, ExecError>;
  fn log(&self, text: &str);
  /// Logs raw text to stdout even when stdout is machine readable.
  fn log_machine_readable(&self, text: &str);
  fn log_stderr(&self, text: &str);
  fn log_level(&self) -> LogLevel;

  fn is_windows(&self) -> bool {
    self.os() == "windows"
  }

  /// The separator used between entries of a joined search path.
  fn path_separator(&self) -> char {
    if self.is_windows() { ';' } else { ':' }
  }
}

// use macros here so the expressions provided are only evaluated when
// the log level allows the message through
macro_rules! log_debug {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level() >= $crate::utils::LogLevel::Debug {
      let mut text = String::from("[DEBUG] ");
      text.push_str(&format!($($arg)*));
      $environment.log_stderr(&text);
    }
  }
}

macro_rules! log_warn {
  ($environment:expr, $($arg:tt)*) => {
    if $environment.log_level() >= $crate::utils::LogLevel::Info {
      $environment.log_stderr(&format!($($arg)*));
    }
  }
}
