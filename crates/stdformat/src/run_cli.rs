use anyhow::Context;
use anyhow::anyhow;
use std::path::Path;
use std::path::PathBuf;

use crate::arg_parser::CliArgs;
use crate::arg_parser::FmtSubCommand;
use crate::arg_parser::StdInFmtSubCommand;
use crate::arg_parser::SubCommand;
use crate::classify;
use crate::configuration;
use crate::configuration::Settings;
use crate::document::Document;
use crate::document::FormatTrigger;
use crate::environment::Environment;
use crate::format::SpanFailure;
use crate::format::format_document;
use crate::format::format_text;
use crate::paths::PathResolver;
use crate::resolution::ResolvedCommand;
use crate::resolution::resolve_command;

#[derive(Debug)]
pub struct AppError {
  pub inner: anyhow::Error,
  pub exit_code: i32,
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    AppError { inner: err, exit_code: 1 }
  }
}

impl From<crate::arg_parser::ParseArgsError> for AppError {
  fn from(err: crate::arg_parser::ParseArgsError) -> Self {
    AppError {
      inner: err.into(),
      exit_code: 1,
    }
  }
}

pub fn run_cli<TEnvironment: Environment>(args: &CliArgs, environment: &TEnvironment) -> Result<(), AppError> {
  match &args.sub_command {
    SubCommand::Help(help_text) => {
      environment.log(help_text);
      Ok(())
    }
    SubCommand::Version => {
      environment.log(&format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
      Ok(())
    }
    SubCommand::Init => init_settings_file(environment),
    SubCommand::ToggleFormatOnSave => {
      let format_on_save = configuration::toggle_format_on_save(environment)?;
      environment.log(&format!("Format on save: {}", if format_on_save { "on" } else { "off" }));
      Ok(())
    }
    SubCommand::OutputResolvedCommand => output_resolved_command(environment),
    SubCommand::Fmt(command) => format_file(environment, command),
    SubCommand::StdInFmt(command) => format_stdin(environment, command),
  }
}

fn format_file<TEnvironment: Environment>(environment: &TEnvironment, command: &FmtSubCommand) -> Result<(), AppError> {
  let settings = configuration::load_settings(environment);
  if command.on_save && !settings.format_on_save {
    log_debug!(environment, "format_on_save is disabled. Doing nothing.");
    return Ok(());
  }

  let file_path = PathBuf::from(&command.file_path);
  if !classify::is_javascript(&settings, Some(file_path.as_path()), None) {
    log_debug!(environment, "{} is not a JavaScript document. Doing nothing.", file_path.display());
    return Ok(());
  }

  let file_text = environment.read_file(&file_path)?;
  let mut document = Document::new(Some(file_path.clone()), None, file_text);
  document.set_selections(command.selections.clone())?;

  // no resolvable formatter is a silent no-op
  let Some((resolved_command, search_path)) = resolve_for_document(environment, &settings, Some(file_path.as_path())) else {
    return Ok(());
  };

  let trigger = if command.on_save { FormatTrigger::OnSave } else { FormatTrigger::Manual };
  let result = format_document(
    environment,
    &settings,
    &resolved_command,
    &search_path,
    &mut document,
    trigger,
    command.force_document,
  );

  if result.changed {
    environment.write_file(&file_path, document.text())?;
  }
  report_failures(environment, &settings, &result.failures)
}

fn format_stdin<TEnvironment: Environment>(environment: &TEnvironment, command: &StdInFmtSubCommand) -> Result<(), AppError> {
  let settings = configuration::load_settings(environment);
  let document = Document::new(
    Some(PathBuf::from(&command.file_name_or_path)),
    command.syntax.clone(),
    command.file_text.clone(),
  );

  if !classify::is_javascript(&settings, document.file_name(), document.syntax()) {
    // pass the buffer through untouched
    environment.log_machine_readable(document.text());
    return Ok(());
  }

  // only an absolute path gives a meaningful directory to walk upward from
  let view_file_path = document.file_name().filter(|file_path| file_path.is_absolute());
  let Some((resolved_command, search_path)) = resolve_for_document(environment, &settings, view_file_path) else {
    environment.log_machine_readable(document.text());
    return Ok(());
  };

  match format_text(environment, &settings, &resolved_command, &search_path, document.text()) {
    Ok(formatted_text) => {
      environment.log_machine_readable(&formatted_text);
      Ok(())
    }
    Err(err) => {
      // echo the original so a wrapper piping stdout back into the
      // buffer can never corrupt it
      environment.log_machine_readable(document.text());
      fail_or_log(environment, &settings, anyhow!("Error formatting text: {:#}", err))
    }
  }
}

fn resolve_for_document<TEnvironment: Environment>(
  environment: &TEnvironment,
  settings: &Settings,
  view_file_path: Option<&Path>,
) -> Option<(ResolvedCommand, String)> {
  let resolver = PathResolver::new(environment.clone());
  let search_path = resolver.build_search_path(settings, view_file_path, &[environment.cwd()]);
  resolve_command(environment, settings, &search_path).map(|command| (command, search_path))
}

fn report_failures<TEnvironment: Environment>(environment: &TEnvironment, settings: &Settings, failures: &[SpanFailure]) -> Result<(), AppError> {
  if failures.is_empty() {
    return Ok(());
  }
  let message = failures
    .iter()
    .map(|failure| format!("Error formatting {}:{}. {}", failure.span.start, failure.span.end, failure.error))
    .collect::<Vec<_>>()
    .join("\n");
  fail_or_log(environment, settings, anyhow!("{}", message))
}

/// Surfaces a failure the way the settings ask for it: a hard error
/// when `loud_error` is set, otherwise a status line.
fn fail_or_log<TEnvironment: Environment>(environment: &TEnvironment, settings: &Settings, error: anyhow::Error) -> Result<(), AppError> {
  if settings.loud_error {
    return Err(error.into());
  }
  if settings.log_errors {
    log_warn!(environment, "{:#}", error);
  }
  Ok(())
}

fn output_resolved_command<TEnvironment: Environment>(environment: &TEnvironment) -> Result<(), AppError> {
  let settings = configuration::load_settings(environment);
  let resolver = PathResolver::new(environment.clone());
  let search_path = resolver.build_search_path(&settings, None, &[environment.cwd()]);
  let resolved_command = resolve_command(environment, &settings, &search_path);
  let json = serde_json::json!({
    "searchPath": search_path,
    "command": resolved_command,
    "selectors": settings.selectors,
  });
  let json_text = serde_json::to_string_pretty(&json).context("Error serializing the resolved command.")?;
  environment.log_machine_readable(&format!("{}\n", json_text));
  Ok(())
}

fn init_settings_file<TEnvironment: Environment>(environment: &TEnvironment) -> Result<(), AppError> {
  let file_path = configuration::resolve_settings_file_path(environment).context("Could not resolve a settings directory.")?;
  if environment.path_exists(&file_path) {
    return Err(anyhow!("Settings file '{}' already exists.", file_path.display()).into());
  }
  configuration::save_settings(environment, &Settings::default())?;
  environment.log(&format!("Created {}", file_path.display()));
  Ok(())
}
