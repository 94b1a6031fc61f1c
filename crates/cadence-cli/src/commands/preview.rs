use anyhow::Result;
use cadence_core::repository::Repository;
use cadence_core::service::Scheduler;
use owo_colors::OwoColorize;

use crate::cli::PreviewCommand;
use crate::commands::build_request;
use crate::views::table::display_dates;

pub fn preview_rule<R: Repository>(
    scheduler: &Scheduler<R>,
    command: PreviewCommand,
) -> Result<()> {
    let request = build_request(scheduler, &command.recurrence)?;
    let expansion = scheduler.expand(&request);

    println!(
        "{} from {} until {}",
        request.rule().bold(),
        request.anchor(),
        request.end()
    );
    display_dates(&expansion.dates);
    if expansion.truncated {
        println!(
            "{}",
            format!(
                "Stopped at {} instances; more dates fall before the end date.",
                request.instance_cap()
            )
            .yellow()
        );
    }
    Ok(())
}
