use anyhow::Result;
use cadence_core::recurrence::{RecurrenceRule, SeriesRequest};
use cadence_core::repository::Repository;
use cadence_core::service::Scheduler;

use crate::cli::RecurrenceArgs;
use crate::parser::{parse_date, parse_optional_date};

pub mod delete;
pub mod edit;
pub mod group;
pub mod list;
pub mod preview;
pub mod schedule;

pub(crate) fn build_request<R: Repository>(
    scheduler: &Scheduler<R>,
    args: &RecurrenceArgs,
) -> Result<SeriesRequest> {
    let rule: RecurrenceRule = args.rule.parse()?;
    let anchor = parse_date(&args.start)?;
    let until = parse_optional_date(args.until.as_deref())?;
    Ok(scheduler.request(anchor, rule, until, args.count)?)
}
