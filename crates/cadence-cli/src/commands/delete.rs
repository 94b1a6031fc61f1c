use anyhow::Result;
use cadence_core::repository::Repository;
use cadence_core::service::Scheduler;
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub async fn delete_assignment<R: Repository>(
    scheduler: &Scheduler<R>,
    id: Uuid,
    cancel: CancellationToken,
) -> Result<()> {
    scheduler.delete_assignment_with_cancellation(id, cancel).await?;
    println!("{} Deleted workout {}", "✓".green(), id);
    Ok(())
}

pub async fn delete_series<R: Repository>(
    scheduler: &Scheduler<R>,
    series_id: Uuid,
    cancel: CancellationToken,
) -> Result<()> {
    let outcome = scheduler
        .delete_series_with_cancellation(series_id, cancel)
        .await?;

    println!(
        "{} Deleted {} workout(s) from series {}",
        "✓".green(),
        outcome.deleted.len(),
        series_id
    );
    if !outcome.is_complete() {
        eprintln!(
            "{} {} workout(s) could not be deleted; run the command again to retry:",
            "Warning:".yellow().bold(),
            outcome.failed.len()
        );
        for (id, error) in &outcome.failed {
            eprintln!("  {} {}: {}", "✗".red(), id, error);
        }
    }
    Ok(())
}
