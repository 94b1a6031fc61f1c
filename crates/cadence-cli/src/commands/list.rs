use anyhow::Result;
use cadence_core::repository::Repository;
use cadence_core::service::Scheduler;
use chrono::{Days, Utc};
use owo_colors::OwoColorize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cli::ListCommand;
use crate::parser::{parse_date, parse_optional_date};
use crate::views::table::{display_schedule, ViewAssignment};

pub async fn list_schedule<R: Repository>(
    scheduler: &Scheduler<R>,
    user_id: Uuid,
    command: ListCommand,
    cancel: CancellationToken,
) -> Result<()> {
    let start = parse_date(&command.from)?;
    let end = match parse_optional_date(command.to.as_deref())? {
        Some(end) => end,
        None => start.checked_add_days(Days::new(6)).unwrap_or(start),
    };

    let schedule = scheduler
        .load_schedule_with_cancellation(user_id, start, end, cancel.clone())
        .await?;
    let today = Utc::now().date_naive();

    let groups: HashMap<Uuid, String> = scheduler
        .groups_with_cancellation(cancel)
        .await?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();

    let items: Vec<ViewAssignment> = schedule
        .assignments
        .iter()
        .map(|a| ViewAssignment::new(a, user_id, today, &groups))
        .collect();

    if command.json {
        let redacted: Vec<_> = items.iter().map(|item| &item.assignment).collect();
        println!("{}", serde_json::to_string_pretty(&redacted)?);
    } else {
        display_schedule(&items, today);
    }

    if !schedule.is_complete() {
        eprintln!(
            "{} Some workouts could not be loaded; this schedule may be incomplete.",
            "Warning:".yellow().bold()
        );
        for partial in &schedule.partial_errors {
            eprintln!("  {} {}", "✗".red(), partial);
        }
    }

    Ok(())
}
