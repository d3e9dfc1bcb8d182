use anyhow::Context;
use anyhow::Result;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use super::Environment;
use crate::utils::CommandOutput;
use crate::utils::ExecError;
use crate::utils::LogLevel;
use crate::utils::Logger;
use crate::utils::LoggerOptions;
use crate::utils::execute_command;

pub struct RealEnvironmentOptions {
  pub log_level: LogLevel,
  pub is_stdout_machine_readable: bool,
}

#[derive(Clone)]
pub struct RealEnvironment {
  logger: Logger,
}

impl RealEnvironment {
  pub fn new(options: &RealEnvironmentOptions) -> RealEnvironment {
    RealEnvironment {
      logger: Logger::new(&LoggerOptions {
        log_level: options.log_level,
        is_stdout_machine_readable: options.is_stdout_machine_readable,
      }),
    }
  }
}

impl Environment for RealEnvironment {
  fn read_file(&self, file_path: impl AsRef<Path>) -> Result<String> {
    let file_path = file_path.as_ref();
    let bytes = std::fs::read(file_path).with_context(|| format!("Error reading file {}", file_path.display()))?;
    // strip any bom
    let bytes = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) { &bytes[3..] } else { &bytes[..] };
    Ok(String::from_utf8_lossy(bytes).into_owned())
  }

  fn write_file(&self, file_path: impl AsRef<Path>, file_text: &str) -> Result<()> {
    let file_path = file_path.as_ref();
    std::fs::write(file_path, file_text).with_context(|| format!("Error writing file {}", file_path.display()))
  }

  fn path_exists(&self, file_path: impl AsRef<Path>) -> bool {
    file_path.as_ref().exists()
  }

  fn dir_exists(&self, dir_path: impl AsRef<Path>) -> bool {
    // an unreadable directory reports as absent
    std::fs::metadata(dir_path.as_ref()).map(|metadata| metadata.is_dir()).unwrap_or(false)
  }

  fn mk_dir_all(&self, dir_path: impl AsRef<Path>) -> Result<()> {
    let dir_path = dir_path.as_ref();
    std::fs::create_dir_all(dir_path).with_context(|| format!("Error creating directory {}", dir_path.display()))
  }

  fn cwd(&self) -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
  }

  fn os(&self) -> String {
    std::env::consts::OS.to_string()
  }

  fn env_var(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }

  fn get_config_dir(&self) -> Option<PathBuf> {
    dirs::config_dir()
  }

  fn find_executable(&self, name: &str, search_path: &str) -> Option<PathBuf> {
    which::which_in(name, Some(search_path), self.cwd()).ok()
  }

  fn run_command(
    &self,
    executable: &str,
    args: &[String],
    env_path: Option<&str>,
    input: &[u8],
    timeout: Option<Duration>,
  ) -> Result<CommandOutput, ExecError> {
    execute_command(executable, args, env_path, input, timeout)
  }

  fn log(&self, text: &str) {
    self.logger.log(text);
  }

  fn log_machine_readable(&self, text: &str) {
    self.logger.log_machine_readable(text);
  }

  fn log_stderr(&self, text: &str) {
    self.logger.log_stderr(text);
  }

  fn log_level(&self) -> LogLevel {
    self.logger.log_level()
  }
}
