use anyhow::{anyhow, Result};
use cadence_core::models::NewAssignment;
use cadence_core::repository::Repository;
use cadence_core::series::WriteStatus;
use cadence_core::service::Scheduler;
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cli::ScheduleCommand;
use crate::commands::build_request;
use crate::parser::parse_optional_date;
use crate::util::find_group;

pub async fn schedule_workout<R: Repository>(
    scheduler: &Scheduler<R>,
    user_id: Uuid,
    command: ScheduleCommand,
    cancel: CancellationToken,
) -> Result<()> {
    let request = build_request(scheduler, &command.recurrence)?;

    let group_id = match &command.group {
        Some(name) => Some(find_group(scheduler.repository(), name).await?.id),
        None => None,
    };

    let template = NewAssignment {
        title: command.title,
        description: command.description,
        workout_type: command.workout_type.into(),
        template_id: command.template,
        date: request.anchor(),
        owner_id: user_id,
        group_id,
        series_id: None,
        hide_details: command.hide_details,
        reveal_date: parse_optional_date(command.reveal.as_deref())?,
    };

    let result = scheduler
        .schedule_series_with_cancellation(&template, &request, cancel)
        .await?;
    let outcome = &result.outcome;

    match outcome.status() {
        WriteStatus::NoDates => {
            println!(
                "{}",
                "The rule produced no dates in that range; nothing was scheduled.".yellow()
            );
            return Ok(());
        }
        WriteStatus::Failed => {
            for (date, error) in &outcome.failed {
                eprintln!("  {} {}: {}", "✗".red(), date, error);
            }
            return Err(anyhow!(
                "none of the {} workouts could be scheduled",
                outcome.failed.len()
            ));
        }
        WriteStatus::Complete | WriteStatus::Partial => {}
    }

    println!(
        "{} Scheduled {} workout(s): '{}' ({})",
        "✓".green(),
        outcome.succeeded.len(),
        template.title,
        request.rule()
    );
    if let Some(series_id) = outcome.series_id {
        println!("Series ID: {}", series_id);
    }
    if let [only] = outcome.succeeded.as_slice() {
        println!("ID: {}", only.id);
    }
    if result.truncated {
        println!(
            "{}",
            format!(
                "Stopped at {} instances; extend with another series if needed.",
                request.instance_cap()
            )
            .yellow()
        );
    }
    if !outcome.failed.is_empty() {
        eprintln!(
            "{} {} date(s) could not be scheduled:",
            "Warning:".yellow().bold(),
            outcome.failed.len()
        );
        for (date, error) in &outcome.failed {
            eprintln!("  {} {}: {}", "✗".red(), date, error);
        }
    }

    Ok(())
}
