use cadence_core::recurrence::{RecurrenceExpander, RecurrenceRule, SeriesRequest};
use cadence_core::schedule::{merge_assignments, partition_batches};
use chrono::{Months, NaiveDate, Weekday};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;
use uuid::Uuid;

fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

fn bench_expansion_by_rule(c: &mut Criterion) {
    let rules = [
        ("daily", RecurrenceRule::Daily),
        (
            "weekly_mwf",
            RecurrenceRule::weekly([Weekday::Mon, Weekday::Wed, Weekday::Fri]).unwrap(),
        ),
        ("monthly_day_31", RecurrenceRule::monthly_on_day(31).unwrap()),
        (
            "monthly_last_fri",
            RecurrenceRule::monthly_on_weekday(5, Weekday::Fri).unwrap(),
        ),
        ("monthly_last_day", RecurrenceRule::monthly_last_day()),
    ];

    let mut group = c.benchmark_group("expansion_by_rule");
    for (name, rule) in rules {
        let request = SeriesRequest::new(anchor(), rule);
        group.bench_with_input(BenchmarkId::new("rule", name), &request, |b, request| {
            b.iter(|| RecurrenceExpander::expand(black_box(request)))
        });
    }
    group.finish();
}

fn bench_expansion_horizon(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion_horizon");
    for years in [1u32, 5, 10] {
        let end = anchor()
            .checked_add_months(Months::new(12 * years))
            .unwrap();
        let request = SeriesRequest::new(anchor(), RecurrenceRule::Daily)
            .with_end_date(end)
            .unwrap()
            .with_instance_cap(usize::MAX)
            .unwrap();
        group.bench_with_input(BenchmarkId::new("years", years), &request, |b, request| {
            b.iter(|| RecurrenceExpander::expand(black_box(request)))
        });
    }
    group.finish();
}

fn bench_rule_parsing(c: &mut Criterion) {
    let inputs = ["daily", "weekly:mon,wed,fri", "monthly:2nd-tue", "monthly:last-day"];

    let mut group = c.benchmark_group("rule_parsing");
    for input in inputs {
        group.bench_with_input(BenchmarkId::new("rule", input), input, |b, input| {
            b.iter(|| black_box(input).parse::<RecurrenceRule>().unwrap())
        });
    }
    group.finish();
}

fn bench_partition_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition_batches");
    for count in [5usize, 23, 250] {
        let ids: Vec<Uuid> = (0..count).map(|_| Uuid::now_v7()).collect();
        group.bench_with_input(BenchmarkId::new("groups", count), &ids, |b, ids| {
            b.iter(|| partition_batches(black_box(ids), 10))
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    use cadence_core::models::{Assignment, WorkoutType};
    use chrono::Utc;

    let owner = Uuid::now_v7();
    let batch: Vec<Assignment> = (0..500)
        .map(|i| Assignment {
            id: Uuid::now_v7(),
            series_id: None,
            title: format!("Workout {}", i),
            description: None,
            workout_type: WorkoutType::Wod,
            template_id: None,
            date: anchor(),
            owner_id: owner,
            group_id: None,
            hide_details: false,
            reveal_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .collect();

    c.bench_function("merge_500_assignments", |b| {
        b.iter(|| {
            let mut merged = HashMap::new();
            merge_assignments(&mut merged, black_box(batch.clone()));
            merged
        })
    });
}

criterion_group!(
    benches,
    bench_expansion_by_rule,
    bench_expansion_horizon,
    bench_rule_parsing,
    bench_partition_batches,
    bench_merge
);
criterion_main!(benches);
