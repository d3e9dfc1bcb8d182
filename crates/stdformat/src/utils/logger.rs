use parking_lot::Mutex;
use std::io::Stderr;
use std::io::Stdout;
use std::io::Write;
use std::io::stderr;
use std::io::stdout;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
  Silent = 0,
  Info = 1,
  Debug = 2,
}

#[derive(Clone)]
pub struct LoggerOptions {
  pub log_level: LogLevel,
  /// Whether stdout will be read by a program.
  pub is_stdout_machine_readable: bool,
}

#[derive(Clone)]
pub struct Logger {
  output_lock: Arc<Mutex<LoggerState>>,
  is_stdout_machine_readable: bool,
  log_level: LogLevel,
}

struct LoggerState {
  std_out: Stdout,
  std_err: Stderr,
}

impl Logger {
  pub fn new(options: &LoggerOptions) -> Self {
    Logger {
      output_lock: Arc::new(Mutex::new(LoggerState {
        std_out: stdout(),
        std_err: stderr(),
      })),
      is_stdout_machine_readable: options.is_stdout_machine_readable,
      log_level: options.log_level,
    }
  }

  #[inline]
  pub fn log_level(&self) -> LogLevel {
    self.log_level
  }

  pub fn log(&self, text: &str) {
    if self.is_stdout_machine_readable || self.log_level == LogLevel::Silent {
      return;
    }
    let mut state = self.output_lock.lock();
    let _ = writeln!(state.std_out, "{}", text);
    let _ = state.std_out.flush();
  }

  /// Logs to stdout even when stdout is machine readable. Used for
  /// the output another program is waiting to read.
  pub fn log_machine_readable(&self, text: &str) {
    let mut state = self.output_lock.lock();
    let _ = write!(state.std_out, "{}", text);
    let _ = state.std_out.flush();
  }

  pub fn log_stderr(&self, text: &str) {
    if self.log_level == LogLevel::Silent {
      return;
    }
    let mut state = self.output_lock.lock();
    let _ = writeln!(state.std_err, "{}", text);
    let _ = state.std_err.flush();
  }
}
