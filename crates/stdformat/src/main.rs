#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

#[macro_use]
mod environment;

use environment::RealEnvironment;
use environment::RealEnvironmentOptions;
use run_cli::AppError;
use utils::LogLevel;
use utils::RealStdInReader;

mod arg_parser;
mod classify;
mod configuration;
mod document;
mod format;
mod paths;
mod resolution;
mod run_cli;
mod utils;

fn main() {
  match run() {
    Ok(()) => {}
    Err((err, log_level)) => {
      if log_level != LogLevel::Silent {
        let result = format!("{:#}", err.inner);
        #[allow(clippy::print_stderr)]
        if !result.is_empty() {
          eprintln!("{}", result);
        }
      }
      std::process::exit(err.exit_code);
    }
  }
}

fn run() -> Result<(), (AppError, LogLevel)> {
  let args = arg_parser::parse_args(std::env::args().collect(), RealStdInReader).map_err(|err| (err.into(), LogLevel::Info))?;

  let environment = RealEnvironment::new(&RealEnvironmentOptions {
    log_level: args.log_level,
    is_stdout_machine_readable: args.is_stdout_machine_readable(),
  });

  run_cli::run_cli(&args, &environment).map_err(|err| (err, args.log_level))
}
