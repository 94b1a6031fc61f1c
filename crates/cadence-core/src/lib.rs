//! # Cadence Core Library
//!
//! Recurring workout programming for gyms and individuals, plus the merged
//! schedule every athlete sees.
//!
//! ## Features
//!
//! - **Calendar Recurrence**: daily, weekday-set and month-relative rules
//!   ("second Tuesday", "last day of month") expanded into concrete dates
//! - **Fan-out Series Writes**: one assignment per date, written concurrently
//!   with per-date success and failure reporting
//! - **Merged Schedules**: personal and group assignments joined across
//!   batched, concurrent queries with partial-failure reporting
//! - **Cooperative Cancellation**: every store call carries its own timeout
//!   and stops when the caller cancels
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Assignments, groups and configuration
//! - [`repository`]: Data access layer with Repository pattern
//! - [`recurrence`]: Recurrence rules and date expansion
//! - [`series`]: Series writes and deletes
//! - [`schedule`]: Schedule aggregation
//! - [`service`]: The [`service::Scheduler`] facade
//! - [`error`]: Error types shared by every module
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     db, models::NewAssignment, recurrence::RecurrenceRule,
//!     repository::SqliteRepository, service::Scheduler,
//! };
//! use chrono::{NaiveDate, Weekday};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::establish_connection("cadence.db").await?;
//!     let scheduler = Scheduler::with_defaults(SqliteRepository::new(pool));
//!
//!     let coach = Uuid::now_v7();
//!     let anchor = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
//!     let rule = RecurrenceRule::weekly([Weekday::Mon, Weekday::Wed])?;
//!     let request = scheduler.request(anchor, rule, None, Some(8))?;
//!
//!     let template = NewAssignment::new("Back squat 5x5", anchor, coach);
//!     let result = scheduler.schedule_series(&template, &request).await?;
//!     println!("created {} workouts", result.outcome.succeeded.len());
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
mod fanout;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod schedule;
pub mod series;
pub mod service;
