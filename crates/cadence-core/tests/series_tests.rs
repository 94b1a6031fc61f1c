use cadence_core::error::CoreError;
use cadence_core::models::{NewAssignment, SchedulingConfig, WorkoutType};
use cadence_core::recurrence::{RecurrenceExpander, RecurrenceRule, SeriesRequest};
use cadence_core::repository::memory::InMemoryRepository;
use cadence_core::repository::AssignmentRepository;
use cadence_core::series::{SeriesWriter, WriteStatus};
use cadence_core::service::Scheduler;
use chrono::{NaiveDate, Weekday};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn template(owner: Uuid) -> NewAssignment {
    let mut data = NewAssignment::new("Deadlift 3x3", date(2025, 1, 6), owner);
    data.workout_type = WorkoutType::Lift;
    data
}

#[tokio::test]
async fn test_partial_write_keeps_committed_instances() {
    let repo = InMemoryRepository::new();
    let dates = [
        date(2025, 1, 6),
        date(2025, 1, 8),
        date(2025, 1, 13),
        date(2025, 1, 15),
    ];
    repo.fail_creates_on(dates[1]);
    repo.fail_creates_on(dates[3]);

    let writer = SeriesWriter::new(&repo, &SchedulingConfig::default());
    let outcome = writer.write(&template(Uuid::now_v7()), &dates).await.unwrap();

    assert_eq!(outcome.status(), WriteStatus::Partial);
    let written: Vec<NaiveDate> = outcome.succeeded.iter().map(|a| a.date).collect();
    assert_eq!(written, vec![dates[0], dates[2]]);
    let failed: Vec<NaiveDate> = outcome.failed.iter().map(|(d, _)| *d).collect();
    assert_eq!(failed, vec![dates[1], dates[3]]);
    assert!(outcome.failed.iter().all(|(_, e)| e.is_retryable()));

    // Nothing is rolled back
    assert_eq!(repo.assignment_count(), 2);
    assert_eq!(repo.stats().creates, 4);
}

#[tokio::test]
async fn test_every_create_failing_is_failed_status() {
    let repo = InMemoryRepository::new();
    let dates = [date(2025, 1, 6), date(2025, 1, 7)];
    for d in dates {
        repo.fail_creates_on(d);
    }

    let writer = SeriesWriter::new(&repo, &SchedulingConfig::default());
    let outcome = writer.write(&template(Uuid::now_v7()), &dates).await.unwrap();

    assert_eq!(outcome.status(), WriteStatus::Failed);
    assert!(!outcome.no_dates_generated());
    assert_eq!(outcome.attempted(), 2);
}

#[tokio::test]
async fn test_creates_run_concurrently() {
    let repo = InMemoryRepository::new();
    repo.set_latency(Duration::from_millis(40));
    let rule = RecurrenceRule::Daily;
    let request = SeriesRequest::new(date(2025, 1, 1), rule)
        .with_end_date(date(2025, 1, 8))
        .unwrap();
    let dates = RecurrenceExpander::expand(&request).dates;

    let writer = SeriesWriter::new(&repo, &SchedulingConfig::default());
    let outcome = writer.write(&template(Uuid::now_v7()), &dates).await.unwrap();

    assert_eq!(outcome.succeeded.len(), 8);
    assert_eq!(repo.stats().peak_in_flight, 8);
}

#[tokio::test]
async fn test_create_timeout_is_per_instance() {
    let repo = InMemoryRepository::new();
    repo.set_latency(Duration::from_millis(300));
    let config = SchedulingConfig {
        store_timeout_ms: 50,
        ..Default::default()
    };

    let writer = SeriesWriter::new(&repo, &config);
    let outcome = writer
        .write(&template(Uuid::now_v7()), &[date(2025, 1, 6), date(2025, 1, 7)])
        .await
        .unwrap();

    assert_eq!(outcome.status(), WriteStatus::Failed);
    assert!(outcome
        .failed
        .iter()
        .all(|(_, e)| matches!(e, CoreError::Timeout(_))));
}

#[tokio::test]
async fn test_cancelled_write_reports_cancelled_instances() {
    let repo = InMemoryRepository::new();
    repo.set_latency(Duration::from_secs(30));
    let token = CancellationToken::new();
    token.cancel();

    let writer = SeriesWriter::new(&repo, &SchedulingConfig::default()).with_cancellation(token);
    let outcome = writer
        .write(&template(Uuid::now_v7()), &[date(2025, 1, 6), date(2025, 1, 7)])
        .await
        .unwrap();

    assert_eq!(outcome.failed.len(), 2);
    assert!(outcome
        .failed
        .iter()
        .all(|(_, e)| matches!(e, CoreError::Cancelled)));
    assert_eq!(repo.assignment_count(), 0);
}

#[tokio::test]
async fn test_delete_series_removes_only_that_series() {
    let repo = InMemoryRepository::new();
    let owner = Uuid::now_v7();
    let writer = SeriesWriter::new(&repo, &SchedulingConfig::default());

    let rule = RecurrenceRule::weekly([Weekday::Tue, Weekday::Thu]).unwrap();
    let request = SeriesRequest::new(date(2025, 1, 6), rule)
        .with_instance_cap(6)
        .unwrap();
    let first = writer.schedule(&template(owner), &request).await.unwrap();
    let second = writer.schedule(&template(owner), &request).await.unwrap();
    assert_eq!(repo.assignment_count(), 12);

    let deleted = writer
        .delete_series(first.outcome.series_id.unwrap())
        .await
        .unwrap();

    assert!(deleted.is_complete());
    assert_eq!(deleted.deleted.len(), 6);
    assert_eq!(repo.assignment_count(), 6);
    let survivors = repo
        .find_assignments_by_series(second.outcome.series_id.unwrap())
        .await
        .unwrap();
    assert_eq!(survivors.len(), 6);
}

#[tokio::test]
async fn test_delete_series_lookup_failure_is_fatal() {
    let repo = InMemoryRepository::new();
    let config = SchedulingConfig {
        store_timeout_ms: 50,
        ..Default::default()
    };
    let token = CancellationToken::new();
    token.cancel();

    let writer = SeriesWriter::new(&repo, &config).with_cancellation(token);
    let result = writer.delete_series(Uuid::now_v7()).await;

    assert!(matches!(result, Err(CoreError::Cancelled)));
    assert_eq!(repo.stats().deletes, 0);
}

#[tokio::test]
async fn test_schedule_with_no_occurrences_writes_nothing() {
    let repo = InMemoryRepository::new();
    let writer = SeriesWriter::new(&repo, &SchedulingConfig::default());
    // The 5th of the month falls before the anchor and the next one after the end
    let request = SeriesRequest::new(date(2025, 2, 10), RecurrenceRule::monthly_on_day(5).unwrap())
        .with_end_date(date(2025, 2, 28))
        .unwrap();

    let result = writer.schedule(&template(Uuid::now_v7()), &request).await.unwrap();

    assert!(result.outcome.no_dates_generated());
    assert_eq!(repo.stats().creates, 0);
}

#[test]
fn test_scheduler_facade_blocking() {
    let scheduler = Scheduler::with_defaults(InMemoryRepository::new());
    let owner = Uuid::now_v7();

    let request = scheduler
        .request(
            date(2025, 1, 1),
            RecurrenceRule::monthly_on_weekday(2, Weekday::Tue).unwrap(),
            Some(date(2025, 3, 31)),
            None,
        )
        .unwrap();
    let preview = scheduler.expand(&request);
    assert_eq!(
        preview.dates,
        vec![date(2025, 1, 14), date(2025, 2, 11), date(2025, 3, 11)]
    );

    let outcome =
        tokio_test::block_on(scheduler.write_series(&template(owner), &preview.dates)).unwrap();
    assert_eq!(outcome.status(), WriteStatus::Complete);

    let first = outcome.succeeded[0].id;
    let update = cadence_core::models::UpdateAssignmentData {
        title: Some("Deadlift 5x2".to_string()),
        ..Default::default()
    };
    let updated = tokio_test::block_on(scheduler.update_assignment(first, update)).unwrap();
    assert_eq!(updated.title, "Deadlift 5x2");
    assert_eq!(updated.series_id, outcome.series_id);

    tokio_test::block_on(scheduler.delete_assignment(first)).unwrap();
    assert_eq!(scheduler.repository().assignment_count(), 2);
}

#[tokio::test]
async fn test_cancelling_one_call_leaves_later_calls_alone() {
    let scheduler = Scheduler::with_defaults(InMemoryRepository::new());
    let owner = Uuid::now_v7();
    let dates = [date(2025, 1, 6), date(2025, 1, 8)];
    let (start, end) = (date(2025, 1, 1), date(2025, 1, 31));

    let token = CancellationToken::new();
    token.cancel();
    let abandoned = scheduler
        .write_series_with_cancellation(&template(owner), &dates, token.clone())
        .await
        .unwrap();
    assert_eq!(abandoned.status(), WriteStatus::Failed);
    assert!(abandoned
        .failed
        .iter()
        .all(|(_, e)| matches!(e, CoreError::Cancelled)));
    let load = scheduler
        .load_schedule_with_cancellation(owner, start, end, token)
        .await;
    assert!(matches!(load, Err(CoreError::Cancelled)));

    let written = scheduler.write_series(&template(owner), &dates).await.unwrap();
    assert_eq!(written.status(), WriteStatus::Complete);

    let schedule = scheduler.load_schedule(owner, start, end).await.unwrap();
    assert!(schedule.is_complete());
    assert_eq!(schedule.assignments.len(), 2);

    let series_id = written.series_id.unwrap();
    let deleted = scheduler.delete_series(series_id).await.unwrap();
    assert_eq!(deleted.deleted.len(), 2);
}

#[tokio::test]
async fn test_update_carries_store_timeout() {
    let config = SchedulingConfig {
        store_timeout_ms: 50,
        ..Default::default()
    };
    let scheduler = Scheduler::new(InMemoryRepository::new(), config);
    let written = scheduler
        .write_series(&template(Uuid::now_v7()), &[date(2025, 1, 6)])
        .await
        .unwrap();
    let id = written.succeeded[0].id;

    scheduler.repository().set_latency(Duration::from_millis(300));
    let update = cadence_core::models::UpdateAssignmentData {
        title: Some("Row 10k".to_string()),
        ..Default::default()
    };
    let result = scheduler.update_assignment(id, update).await;

    assert!(matches!(result, Err(CoreError::Timeout(_))));
    let stored = scheduler.find_assignment(id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Deadlift 3x3");
}
