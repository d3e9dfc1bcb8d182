use std::ops::Range;
use std::time::Duration;
use thiserror::Error;

use crate::configuration::Settings;
use crate::document::Document;
use crate::document::FormatTrigger;
use crate::environment::Environment;
use crate::resolution::ResolvedCommand;
use crate::utils::ExecError;

#[derive(Debug, Error)]
pub enum FormatError {
  #[error("Formatter produced no output.{}", stderr_suffix(.stderr))]
  EmptyOutput { stderr: String },
  #[error("Formatter reported errors.{}", stderr_suffix(.stderr))]
  Stderr { stderr: String },
  #[error("Formatter timed out after {} seconds.", .timeout.as_secs())]
  Timeout { timeout: Duration },
  #[error("Error running formatter: {0}")]
  Exec(ExecError),
}

fn stderr_suffix(stderr: &str) -> String {
  let stderr = stderr.trim();
  if stderr.is_empty() { String::new() } else { format!(" {}", stderr) }
}

/// Pipes `text` through the resolved formatter and returns the
/// formatted text.
///
/// Non-empty stdout wins: the exit code is ignored and stderr is only
/// logged, because some tools emit warnings alongside valid output.
/// Setting `apply_output_on_stderr` to false makes stderr fatal
/// instead. Empty stdout is always a failure so a broken formatter
/// can never blank a document.
pub fn format_text<TEnvironment: Environment>(
  environment: &TEnvironment,
  settings: &Settings,
  command: &ResolvedCommand,
  search_path: &str,
  text: &str,
) -> Result<String, FormatError> {
  let output = environment
    .run_command(&command.executable, &command.args, Some(search_path), text.as_bytes(), settings.format_timeout())
    .map_err(|err| match err {
      ExecError::Timeout { timeout } => FormatError::Timeout { timeout },
      err => FormatError::Exec(err),
    })?;

  let stdout = String::from_utf8_lossy(&output.stdout).replace('\r', "");
  let stderr = String::from_utf8_lossy(&output.stderr).replace('\r', "");

  if stdout.is_empty() {
    return Err(FormatError::EmptyOutput { stderr });
  }
  if !stderr.is_empty() {
    if !settings.apply_output_on_stderr {
      return Err(FormatError::Stderr { stderr });
    }
    if settings.log_errors {
      log_warn!(environment, "Formatter reported warnings: {}", stderr.trim_end());
    }
  }
  Ok(stdout)
}

pub struct SpanFailure {
  /// The span in the document's original coordinates.
  pub span: Range<usize>,
  pub error: FormatError,
}

pub struct FormatDocumentResult {
  pub changed: bool,
  pub failures: Vec<SpanFailure>,
}

/// Formats each span of the document in document order, replacing a
/// span's content only when its invocation succeeds. A failed span is
/// recorded and left untouched; later spans still get formatted.
pub fn format_document<TEnvironment: Environment>(
  environment: &TEnvironment,
  settings: &Settings,
  command: &ResolvedCommand,
  search_path: &str,
  document: &mut Document,
  trigger: FormatTrigger,
  force_whole_document: bool,
) -> FormatDocumentResult {
  let spans = document.format_spans(trigger, force_whole_document);
  let mut failures = Vec::new();
  let mut changed = false;
  // earlier replacements shift the offsets of later spans
  let mut offset = 0isize;

  for span in spans {
    let adjusted_start = span.start.wrapping_add_signed(offset);
    let adjusted_end = span.end.wrapping_add_signed(offset);
    let input = document.text()[adjusted_start..adjusted_end].to_string();
    match format_text(environment, settings, command, search_path, &input) {
      Ok(output) => {
        if output != input {
          offset += output.len() as isize - input.len() as isize;
          document.replace(adjusted_start..adjusted_end, &output);
          changed = true;
        }
      }
      Err(error) => failures.push(SpanFailure { span, error }),
    }
  }

  FormatDocumentResult { changed, failures }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::environment::TestCommandBehavior;
  use crate::environment::TestEnvironment;
  use crate::utils::CommandOutput;
  use pretty_assertions::assert_eq;
  use std::path::PathBuf;
  use std::sync::Arc;

  fn command() -> ResolvedCommand {
    ResolvedCommand {
      executable: "standard-format".to_string(),
      args: vec!["-".to_string()],
    }
  }

  fn doc(text: &str) -> Document {
    Document::new(Some(PathBuf::from("/project/foo.js")), None, text.to_string())
  }

  #[test]
  fn identity_formatter_round_trips_text() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior("standard-format", TestCommandBehavior::Identity);

    let input = "const π = Math.PI\nlet x = 1\n";
    let output = format_text(&environment, &Settings::default(), &command(), "/a", input).unwrap();
    assert_eq!(output, input);
  }

  #[test]
  fn strips_carriage_returns_from_output() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior(
      "standard-format",
      TestCommandBehavior::Output {
        stdout: "let x = 1\r\n".to_string(),
        stderr: String::new(),
        exit_code: 0,
      },
    );

    let output = format_text(&environment, &Settings::default(), &command(), "/a", "let x=1\n").unwrap();
    assert_eq!(output, "let x = 1\n");
  }

  #[test]
  fn empty_output_is_a_failure() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior(
      "standard-format",
      TestCommandBehavior::Output {
        stdout: String::new(),
        stderr: "Parsing error: unexpected token".to_string(),
        exit_code: 1,
      },
    );

    let err = format_text(&environment, &Settings::default(), &command(), "/a", "let x=1\n").unwrap_err();
    assert!(matches!(err, FormatError::EmptyOutput { .. }));
    assert_eq!(err.to_string(), "Formatter produced no output. Parsing error: unexpected token");
  }

  #[test]
  fn output_alongside_stderr_is_applied_and_logged() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior(
      "standard-format",
      TestCommandBehavior::Output {
        stdout: "let x = 1\n".to_string(),
        stderr: "warning: deprecated option\n".to_string(),
        exit_code: 1,
      },
    );

    let output = format_text(&environment, &Settings::default(), &command(), "/a", "let x=1\n").unwrap();
    assert_eq!(output, "let x = 1\n");
    assert_eq!(
      environment.get_logged_errors(),
      vec!["Formatter reported warnings: warning: deprecated option"]
    );
  }

  #[test]
  fn stderr_is_fatal_when_policy_disabled() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior(
      "standard-format",
      TestCommandBehavior::Output {
        stdout: "let x = 1\n".to_string(),
        stderr: "warning\n".to_string(),
        exit_code: 0,
      },
    );

    let mut settings = Settings::default();
    settings.apply_output_on_stderr = false;
    let err = format_text(&environment, &settings, &command(), "/a", "let x=1\n").unwrap_err();
    assert!(matches!(err, FormatError::Stderr { .. }));
  }

  #[test]
  fn hung_formatter_surfaces_timeout_error() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior("standard-format", TestCommandBehavior::Hang);

    let err = format_text(&environment, &Settings::default(), &command(), "/a", "let x=1\n").unwrap_err();
    assert!(matches!(err, FormatError::Timeout { .. }));
  }

  #[test]
  fn formats_whole_document_on_save() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior(
      "standard-format",
      TestCommandBehavior::Output {
        stdout: "let x = 1;\n".to_string(),
        stderr: String::new(),
        exit_code: 0,
      },
    );

    let mut document = doc("let x=1");
    let result = format_document(
      &environment,
      &Settings::default(),
      &command(),
      "/a",
      &mut document,
      FormatTrigger::OnSave,
      false,
    );

    assert!(result.changed);
    assert!(result.failures.is_empty());
    assert_eq!(document.text(), "let x = 1;\n");
  }

  #[test]
  fn failed_span_leaves_document_untouched() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior(
      "standard-format",
      TestCommandBehavior::Output {
        stdout: String::new(),
        stderr: "boom".to_string(),
        exit_code: 1,
      },
    );

    let mut document = doc("let x=1\n");
    let result = format_document(
      &environment,
      &Settings::default(),
      &command(),
      "/a",
      &mut document,
      FormatTrigger::OnSave,
      false,
    );

    assert!(!result.changed);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(document.text(), "let x=1\n");
  }

  #[test]
  fn failure_on_first_span_does_not_block_second() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior(
      "standard-format",
      TestCommandBehavior::Transform(Arc::new(|text| {
        if text.contains('y') {
          CommandOutput {
            stdout: Vec::new(),
            stderr: b"cannot format".to_vec(),
            exit_code: Some(1),
          }
        } else {
          CommandOutput {
            stdout: text.replace('=', " = ").into_bytes(),
            stderr: Vec::new(),
            exit_code: Some(0),
          }
        }
      })),
    );

    let mut document = doc("let y=2\nlet x=1\n");
    document.set_selections(vec![0..7, 8..15]).unwrap();
    let result = format_document(
      &environment,
      &Settings::default(),
      &command(),
      "/a",
      &mut document,
      FormatTrigger::Manual,
      false,
    );

    assert!(result.changed);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].span, 0..7);
    assert_eq!(document.text(), "let y=2\nlet x = 1\n");
  }

  #[test]
  fn later_spans_account_for_earlier_growth() {
    let environment = TestEnvironment::new();
    environment.set_command_behavior(
      "standard-format",
      TestCommandBehavior::Transform(Arc::new(|text| CommandOutput {
        stdout: text.replace('=', " = ").into_bytes(),
        stderr: Vec::new(),
        exit_code: Some(0),
      })),
    );

    let mut document = doc("let x=1\nlet y=2\n");
    // selections given out of order get processed in document order
    document.set_selections(vec![8..15, 0..7]).unwrap();
    let result = format_document(
      &environment,
      &Settings::default(),
      &command(),
      "/a",
      &mut document,
      FormatTrigger::Manual,
      false,
    );

    assert!(result.changed);
    assert!(result.failures.is_empty());
    assert_eq!(document.text(), "let x = 1\nlet y = 2\n");
  }
}
