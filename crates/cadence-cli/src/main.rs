use cadence_core::db;
use cadence_core::error::CoreError;
use cadence_core::repository::SqliteRepository;
use cadence_core::service::Scheduler;
use clap::Parser;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};
use tokio_util::sync::CancellationToken;

mod cli;
mod commands;
mod config;
mod logger;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable configuration");
            config::Config::default()
        }
    };

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let scheduler = Scheduler::new(SqliteRepository::new(db_pool), config.scheduling.clone());

    // Ctrl-C cancels the calls of this one command run.
    let interrupt = CancellationToken::new();
    let token = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let result = run(&scheduler, cli, &config, interrupt).await;

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(
    scheduler: &Scheduler<SqliteRepository>,
    cli: cli::Cli,
    config: &config::Config,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    match cli.command {
        cli::Commands::Preview(command) => commands::preview::preview_rule(scheduler, command),
        cli::Commands::Schedule(command) => {
            let user_id = util::acting_user(cli.user, config)?;
            commands::schedule::schedule_workout(scheduler, user_id, command, cancel).await
        }
        cli::Commands::List(command) => {
            let user_id = util::acting_user(cli.user, config)?;
            commands::list::list_schedule(scheduler, user_id, command, cancel).await
        }
        cli::Commands::Edit(command) => {
            commands::edit::edit_assignment(scheduler, command, cancel).await
        }
        cli::Commands::Delete(command) => {
            let id = util::resolve_assignment_id(scheduler.repository(), &command.id).await?;
            let assignment = scheduler
                .find_assignment_with_cancellation(id, cancel.clone())
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Workout with ID '{}' not found", id)))?;

            if !command.force
                && !confirm(&format!(
                    "Delete '{}' on {}?",
                    assignment.title, assignment.date
                ))
            {
                println!("Deletion cancelled.");
                return Ok(());
            }
            commands::delete::delete_assignment(scheduler, id, cancel).await
        }
        cli::Commands::DeleteSeries(command) => {
            if !command.force
                && !confirm(&format!(
                    "Delete every workout in series {}?",
                    command.series_id
                ))
            {
                println!("Deletion cancelled.");
                return Ok(());
            }
            commands::delete::delete_series(scheduler, command.series_id, cancel).await
        }
        cli::Commands::Group(command) => {
            commands::group::group_command(
                scheduler.repository(),
                cli.user.or(config.user_id),
                command,
            )
            .await
        }
    }
}

fn confirm(prompt: &str) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::AmbiguousId(matches) => {
                eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, title) in matches {
                    eprintln!("  {} ({})", id.yellow(), title);
                }
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidRule(s) => {
                eprintln!("{} Invalid recurrence rule: {}", "Error:".style(error_style), s);
                eprintln!("Try one of: once, daily, weekdays, weekly:mon,wed, monthly:15, monthly:2nd-tue, monthly:last-day");
            }
            CoreError::Cancelled => {
                eprintln!(
                    "{} Interrupted; work already saved was kept.",
                    "Error:".style(error_style)
                );
            }
            e if e.is_validation() => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), e);
            }
            e if e.is_retryable() => {
                eprintln!("{} {} (try again)", "Error:".style(error_style), e);
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {}", "Error:".style(error_style), err);
    }
}
