use anyhow::{anyhow, Result};
use cadence_core::models::UpdateAssignmentData;
use cadence_core::repository::Repository;
use cadence_core::service::Scheduler;
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use crate::cli::EditCommand;
use crate::parser::{parse_date, parse_optional_date};
use crate::util::{find_group, resolve_assignment_id};

pub async fn edit_assignment<R: Repository>(
    scheduler: &Scheduler<R>,
    command: EditCommand,
    cancel: CancellationToken,
) -> Result<()> {
    let id = resolve_assignment_id(scheduler.repository(), &command.id).await?;

    let description = if command.description_clear {
        Some(None)
    } else {
        command.description.map(Some)
    };

    let group_id = if command.personal {
        Some(None)
    } else {
        match &command.group {
            Some(name) => Some(Some(find_group(scheduler.repository(), name).await?.id)),
            None => None,
        }
    };

    let reveal_date = if command.reveal_clear {
        Some(None)
    } else {
        parse_optional_date(command.reveal.as_deref())?.map(Some)
    };

    let update = UpdateAssignmentData {
        title: command.title,
        description,
        workout_type: command.workout_type.map(Into::into),
        template_id: None,
        date: command.date.as_deref().map(parse_date).transpose()?,
        group_id,
        hide_details: command.hide_details,
        reveal_date,
    };

    if update.is_empty() {
        return Err(anyhow!("nothing to change; pass at least one field to edit"));
    }

    let updated = scheduler
        .update_assignment_with_cancellation(id, update, cancel)
        .await?;
    println!(
        "{} Updated '{}' on {}",
        "✓".green(),
        updated.title,
        updated.date
    );
    if updated.series_id.is_some() {
        println!("Only this occurrence was changed; the rest of the series is untouched.");
    }
    Ok(())
}
