use std::io::Read;
use std::io::Write;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
use std::time::Instant;
use thiserror::Error;

/// Captured streams and exit status of a finished child process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
  pub stdout: Vec<u8>,
  pub stderr: Vec<u8>,
  /// `None` when the process was terminated by a signal.
  pub exit_code: Option<i32>,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.exit_code == Some(0)
  }
}

#[derive(Debug, Error)]
pub enum ExecError {
  #[error("Executable '{executable}' was not found.")]
  NotFound { executable: String },
  #[error("Process did not exit within {} seconds and was killed.", .timeout.as_secs())]
  Timeout { timeout: Duration },
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `executable` with `args`, writing `input` to its stdin and
/// draining stdout/stderr on background threads so a chatty child
/// can't deadlock against the stdin write. The wait is bounded by
/// `timeout` when provided; an expired child is killed and reaped.
pub fn execute_command(
  executable: &str,
  args: &[String],
  env_path: Option<&str>,
  input: &[u8],
  timeout: Option<Duration>,
) -> Result<CommandOutput, ExecError> {
  let mut command = Command::new(executable);
  command.args(args).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
  if let Some(env_path) = env_path {
    command.env("PATH", env_path);
  }
  #[cfg(windows)]
  {
    use std::os::windows::process::CommandExt;
    // stops the child from flashing a console window on spawn
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
  }

  let mut child = command.spawn().map_err(|err| {
    if err.kind() == std::io::ErrorKind::NotFound {
      ExecError::NotFound {
        executable: executable.to_string(),
      }
    } else {
      ExecError::Io(err)
    }
  })?;

  // start draining the output pipes before writing stdin
  let stdout_handle = spawn_reader(child.stdout.take());
  let stderr_handle = spawn_reader(child.stderr.take());

  if let Some(mut stdin) = child.stdin.take() {
    match stdin.write_all(input) {
      // the child may exit without reading all its input
      Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
      Err(err) => {
        // reap the child so a failed write doesn't leak the process
        let _ = child.kill();
        let _ = child.wait();
        return Err(err.into());
      }
      Ok(()) => {}
    }
    // dropping closes the pipe so the child sees eof
    drop(stdin);
  }

  let exit_status = wait_with_timeout(&mut child, timeout)?;
  let stdout = join_reader(stdout_handle)?;
  let stderr = join_reader(stderr_handle)?;

  Ok(CommandOutput {
    stdout,
    stderr,
    exit_code: exit_status.code(),
  })
}

fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> Result<std::process::ExitStatus, ExecError> {
  let deadline = timeout.map(|timeout| Instant::now() + timeout);
  loop {
    if let Some(status) = child.try_wait()? {
      return Ok(status);
    }
    if let Some(deadline) = deadline
      && Instant::now() >= deadline
    {
      let _ = child.kill();
      let _ = child.wait();
      return Err(ExecError::Timeout {
        timeout: timeout.unwrap_or_default(),
      });
    }
    thread::sleep(WAIT_POLL_INTERVAL);
  }
}

fn spawn_reader<TRead: Read + Send + 'static>(reader: Option<TRead>) -> Option<thread::JoinHandle<std::io::Result<Vec<u8>>>> {
  reader.map(|mut reader| {
    thread::spawn(move || {
      let mut bytes = Vec::new();
      reader.read_to_end(&mut bytes)?;
      Ok(bytes)
    })
  })
}

fn join_reader(handle: Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>, ExecError> {
  match handle {
    Some(handle) => match handle.join() {
      Ok(result) => Ok(result?),
      Err(_) => Err(ExecError::Io(std::io::Error::other("Output reader thread panicked."))),
    },
    None => Ok(Vec::new()),
  }
}
