//! `prep`: preparation history management.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use prep_cli::config::AppConfig;
use prep_cli::logging::{LogConfig, init_logging};
use prep_history::PreparationService;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod output;

use crate::cli::{Cli, Command};
use crate::commands::{
    run_actions, run_append, run_clone, run_create, run_delete_step, run_head, run_list,
    run_locks, run_remove, run_rename, run_show, run_steps, run_unlock, run_update,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::discover(cli.config.as_deref())?.with_store_location(cli.store);
    let service = config.open_service()?;
    let owner = owner(cli.owner);
    dispatch(&service, cli.command, &owner)
}

fn dispatch(service: &PreparationService, command: Command, owner: &str) -> Result<()> {
    match command {
        Command::Create { data_set, name } => run_create(service, &data_set, &name, owner),
        Command::List(args) => run_list(service, &args),
        Command::Show { preparation } => run_show(service, &preparation),
        Command::Steps { preparation } => run_steps(service, &preparation),
        Command::Actions {
            preparation,
            version,
        } => run_actions(service, &preparation, &version),
        Command::Append { preparation, step } => run_append(service, &preparation, &step, owner),
        Command::Update {
            preparation,
            step_id,
            step,
        } => run_update(service, &preparation, &step_id, &step, owner),
        Command::DeleteStep {
            preparation,
            step_id,
        } => run_delete_step(service, &preparation, &step_id, owner),
        Command::Head {
            preparation,
            step_id,
        } => run_head(service, &preparation, &step_id, owner),
        Command::Rename { preparation, name } => run_rename(service, &preparation, &name, owner),
        Command::Clone { preparation } => run_clone(service, &preparation),
        Command::Remove { preparation } => run_remove(service, &preparation, owner),
        Command::Locks { user } => run_locks(service, user.as_deref()),
        Command::Unlock { preparation, force } => run_unlock(service, &preparation, force, owner),
    }
}

/// `--owner`, else `$USER`, else `anonymous`.
fn owner(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var("USER").ok())
        .filter(|owner| !owner.trim().is_empty())
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Logging setup from the flags. An explicit `--log-level` or `-v`/`-q`
/// turns off `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let explicit_level = cli.log_level.map(LevelFilter::from);
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    LogConfig {
        level_filter: explicit_level.unwrap_or_else(|| cli.verbosity.tracing_level_filter()),
        use_env_filter: explicit_level.is_none() && !cli.verbosity.is_present(),
        format: cli.log_format.into(),
        log_file: cli.log_file.clone(),
        with_ansi,
        ..LogConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use prep_cli::logging::LogFormat;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(["prep"].iter().chain(args).copied()).unwrap()
    }

    #[test]
    fn explicit_level_overrides_rust_log() {
        let config = log_config_from_cli(&parse(&[
            "--log-level", "debug", "--log-format", "json", "--color", "never", "list",
        ]));
        assert_eq!(config.level_filter, LevelFilter::DEBUG);
        assert!(!config.use_env_filter);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.with_ansi);
    }

    #[test]
    fn quiet_defaults_defer_to_rust_log() {
        let config = log_config_from_cli(&parse(&["--log-file", "prep.log", "list"]));
        assert_eq!(config.level_filter, LevelFilter::WARN);
        assert!(config.use_env_filter);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.log_file, Some(PathBuf::from("prep.log")));
        assert!(!config.with_ansi);
    }

    #[test]
    fn verbosity_flags_pick_the_level() {
        let config = log_config_from_cli(&parse(&["-vv", "list"]));
        assert_eq!(config.level_filter, LevelFilter::DEBUG);
        assert!(!config.use_env_filter);
    }
}
