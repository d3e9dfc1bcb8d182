use indexmap::IndexMap;
use serde::Serialize;

/// One candidate formatter invocation: the executable name followed
/// by its fixed arguments (ex. telling the tool to read from stdin).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandSpec(pub Vec<String>);

impl CommandSpec {
  pub fn new(parts: &[&str]) -> CommandSpec {
    CommandSpec(parts.iter().map(|part| part.to_string()).collect())
  }

  pub fn executable_name(&self) -> Option<&str> {
    self.0.first().map(|name| name.as_str())
  }

  pub fn args(&self) -> &[String] {
    if self.0.is_empty() { &[] } else { &self.0[1..] }
  }
}

/// The recognized settings, every field defaulted so a missing or
/// malformed settings file can never prevent the tool from running.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Settings {
  pub format_on_save: bool,
  /// User supplied directories searched before anything else.
  #[serde(rename = "PATH")]
  pub path: Vec<String>,
  pub use_view_path: bool,
  pub use_project_path_fallback: bool,
  pub use_global_path: bool,
  /// Prioritized formatter invocations. The first one whose
  /// executable resolves on the search path wins.
  pub commands: Vec<CommandSpec>,
  /// File extensions (no leading dot) treated as JavaScript.
  pub includes: Vec<String>,
  /// File extensions never formatted. Takes precedence over includes.
  pub excludes: Vec<String>,
  /// Syntax name to content-selector mapping for embedded code
  /// regions. Carried as data for the host editor to interpret.
  pub selectors: IndexMap<String, String>,
  /// Whether failures show as a blocking error instead of a status line.
  pub loud_error: bool,
  pub log_errors: bool,
  /// Log the resolved formatter's version after selecting it.
  pub check_version: bool,
  /// Shell command run once per process on non-Windows platforms to
  /// derive a login PATH richer than the inherited one.
  pub get_path_command: Vec<String>,
  pub logging_on_view_change: bool,
  /// Seconds before a formatter process is killed. Zero disables the bound.
  pub format_timeout_seconds: u64,
  /// Whether formatter output is still applied when the formatter
  /// also wrote to stderr.
  pub apply_output_on_stderr: bool,
  /// Syntax names that must never classify as JavaScript even when
  /// their syntax path mentions it.
  pub syntax_blacklist: Vec<String>,
}

impl Default for Settings {
  fn default() -> Settings {
    Settings {
      format_on_save: false,
      path: Vec::new(),
      use_view_path: true,
      use_project_path_fallback: true,
      use_global_path: true,
      commands: vec![CommandSpec::new(&["standard-format", "-"])],
      includes: vec!["js".to_string(), "jsx".to_string()],
      excludes: Vec::new(),
      selectors: IndexMap::from([("vue".to_string(), "source.js.embedded.html".to_string())]),
      loud_error: true,
      log_errors: true,
      check_version: false,
      get_path_command: vec!["/bin/bash".to_string(), "-lc".to_string(), "echo $PATH".to_string()],
      logging_on_view_change: false,
      format_timeout_seconds: 10,
      apply_output_on_stderr: true,
      syntax_blacklist: vec!["json".to_string()],
    }
  }
}

impl Settings {
  pub fn format_timeout(&self) -> Option<std::time::Duration> {
    if self.format_timeout_seconds == 0 {
      None
    } else {
      Some(std::time::Duration::from_secs(self.format_timeout_seconds))
    }
  }
}
