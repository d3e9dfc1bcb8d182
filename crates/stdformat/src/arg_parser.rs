use anyhow::Result;
use anyhow::bail;
use clap::ArgMatches;
use std::ops::Range;
use thiserror::Error;

use crate::utils::LogLevel;
use crate::utils::StdInReader;

pub struct CliArgs {
  pub sub_command: SubCommand,
  pub log_level: LogLevel,
}

impl CliArgs {
  pub fn is_stdout_machine_readable(&self) -> bool {
    // these output text that's read by another program
    matches!(self.sub_command, SubCommand::StdInFmt(..) | SubCommand::OutputResolvedCommand)
  }

  fn new_with_sub_command(sub_command: SubCommand) -> CliArgs {
    CliArgs {
      sub_command,
      log_level: LogLevel::Info,
    }
  }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubCommand {
  Fmt(FmtSubCommand),
  StdInFmt(StdInFmtSubCommand),
  ToggleFormatOnSave,
  OutputResolvedCommand,
  Init,
  Version,
  Help(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct FmtSubCommand {
  pub file_path: String,
  pub on_save: bool,
  pub force_document: bool,
  pub selections: Vec<Range<usize>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct StdInFmtSubCommand {
  pub file_name_or_path: String,
  pub syntax: Option<String>,
  pub file_text: String,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ParseArgsError(#[from] anyhow::Error);

pub fn parse_args<TStdInReader: StdInReader>(args: Vec<String>, std_in_reader: TStdInReader) -> Result<CliArgs, ParseArgsError> {
  inner_parse_args(args, std_in_reader).map_err(ParseArgsError)
}

fn inner_parse_args<TStdInReader: StdInReader>(args: Vec<String>, std_in_reader: TStdInReader) -> Result<CliArgs> {
  // this is all done because clap doesn't output exactly how I like
  if args.len() == 1 || (args.len() == 2 && (args[1] == "help" || args[1] == "--help")) {
    let mut cli_parser = create_cli_parser(CliArgParserKind::ForOutputtingMainHelp);
    cli_parser.try_get_matches_from_mut(vec![""])?;
    let help_text = format!("{}", cli_parser.render_help());
    return Ok(CliArgs::new_with_sub_command(SubCommand::Help(help_text)));
  } else if args.len() == 2 && (args[1] == "-v" || args[1] == "-V" || args[1] == "--version") {
    return Ok(CliArgs::new_with_sub_command(SubCommand::Version));
  }

  let cli_parser = create_cli_parser(CliArgParserKind::Default);
  let matches = match cli_parser.try_get_matches_from(&args) {
    Ok(result) => result,
    Err(err) => return Err(err.into()),
  };

  let sub_command = match matches.subcommand().unwrap() {
    ("fmt", matches) => {
      if let Some(file_name_path_or_extension) = matches.get_one::<String>("stdin").map(String::from) {
        let file_name_or_path = if file_name_path_or_extension.contains('.') {
          file_name_path_or_extension
        } else {
          // convert extension to file path
          format!("file.{}", file_name_path_or_extension)
        };
        SubCommand::StdInFmt(StdInFmtSubCommand {
          file_name_or_path,
          syntax: matches.get_one::<String>("syntax").map(String::from),
          file_text: std_in_reader.read()?,
        })
      } else {
        let Some(file_path) = matches.get_one::<String>("file").map(String::from) else {
          bail!("Provide a file path or use --stdin.");
        };
        SubCommand::Fmt(FmtSubCommand {
          file_path,
          on_save: matches.get_flag("on-save"),
          force_document: matches.get_flag("force-document"),
          selections: parse_selections(matches)?,
        })
      }
    }
    ("toggle-format-on-save", _) => SubCommand::ToggleFormatOnSave,
    ("output-resolved-command", _) => SubCommand::OutputResolvedCommand,
    ("init", _) => SubCommand::Init,
    ("version", _) => SubCommand::Version,
    _ => unreachable!(),
  };

  let log_level = if matches.get_flag("silent") {
    LogLevel::Silent
  } else if matches.get_flag("verbose") {
    LogLevel::Debug
  } else {
    LogLevel::Info
  };

  Ok(CliArgs { sub_command, log_level })
}

fn parse_selections(matches: &ArgMatches) -> Result<Vec<Range<usize>>> {
  let Some(values) = matches.get_many::<String>("select") else {
    return Ok(Vec::new());
  };
  let mut selections = Vec::new();
  for value in values {
    let Some((start, end)) = value.split_once(':') else {
      bail!("Expected a selection of the form <start>:<end>, but found '{}'.", value);
    };
    let start = start.parse::<usize>().map_err(|_| anyhow::anyhow!("Invalid selection start '{}'.", start))?;
    let end = end.parse::<usize>().map_err(|_| anyhow::anyhow!("Invalid selection end '{}'.", end))?;
    selections.push(start..end);
  }
  Ok(selections)
}

#[derive(Debug, PartialEq, Eq)]
enum CliArgParserKind {
  ForOutputtingMainHelp,
  Default,
}

fn create_cli_parser(kind: CliArgParserKind) -> clap::Command {
  use clap::Arg;
  use clap::ArgAction;
  use clap::Command;

  let mut app = Command::new("stdformat");

  // hack to get this to display the way I want
  app = if kind == CliArgParserKind::ForOutputtingMainHelp {
    app.disable_help_subcommand(true).disable_version_flag(true).disable_help_flag(true)
  } else {
    app.subcommand_required(true)
  };

  app
    .bin_name("stdformat")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Formats JavaScript buffers by piping them through an external standard-style formatter.")
    .override_usage("stdformat <SUBCOMMAND> [OPTIONS]")
    .help_template(
      r#"{bin} {version}

{about}

USAGE:
    {usage}

SUBCOMMANDS:
{subcommands}

OPTIONS:
{options}

ENVIRONMENT VARIABLES:
  STDFORMAT_CONFIG_DIR  Directory holding the stdformat.json settings file.{after-help}"#,
    )
    .after_help(
      r#"EXAMPLES:
  Format a file in place:

    stdformat fmt src/index.js

  Format editor buffer text from stdin:

    cat src/index.js | stdformat fmt --stdin index.js

  Format only two selections of a file:

    stdformat fmt src/index.js --select 0:120 --select 140:260"#,
    )
    .arg(
      Arg::new("verbose")
        .long("verbose")
        .help("Prints additional diagnostic information.")
        .global(true)
        .action(ArgAction::SetTrue),
    )
    .arg(
      Arg::new("silent")
        .long("silent")
        .help("Suppresses status and diagnostic output.")
        .global(true)
        .conflicts_with("verbose")
        .action(ArgAction::SetTrue),
    )
    .subcommand(
      Command::new("fmt")
        .about("Formats a file in place, or formats stdin and writes the result to stdout.")
        .arg(Arg::new("file").required(false).num_args(1).help("File to format in place."))
        .arg(
          Arg::new("stdin")
            .long("stdin")
            .value_name("extension/file-name/file-path")
            .help("Format stdin and output the result to stdout. Provide a file path or name to classify by extension, or an extension by itself.")
            .required(false)
            .num_args(1)
            .conflicts_with("file"),
        )
        .arg(
          Arg::new("syntax")
            .long("syntax")
            .value_name("syntax-label")
            .help("Syntax label the editor assigned to the buffer, used when the file name is not conclusive.")
            .required(false)
            .num_args(1),
        )
        .arg(
          Arg::new("on-save")
            .long("on-save")
            .help("Behave as the pre-save hook: only formats when format_on_save is enabled and always formats the whole document.")
            .action(ArgAction::SetTrue),
        )
        .arg(
          Arg::new("force-document")
            .long("force-document")
            .help("Format the whole document even when selections are given.")
            .action(ArgAction::SetTrue),
        )
        .arg(
          Arg::new("select")
            .long("select")
            .value_name("start:end")
            .help("Byte range of a selection to format. May be provided multiple times.")
            .action(ArgAction::Append)
            .num_args(1),
        ),
    )
    .subcommand(Command::new("toggle-format-on-save").about("Flips the persisted format_on_save preference."))
    .subcommand(Command::new("output-resolved-command").about("Outputs the search path and resolved formatter invocation as JSON."))
    .subcommand(Command::new("init").about("Initializes a settings file in the user configuration directory."))
    .subcommand(Command::new("version").about("Outputs the version."))
}
