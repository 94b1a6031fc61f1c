use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::recurrence::{DEFAULT_HORIZON_MONTHS, DEFAULT_INSTANCE_CAP};

/// Ceiling the backing store puts on "match any of" id lists.
pub const MAX_IDS_PER_QUERY: usize = 10;

/// Title shown in place of a workout whose details are not yet revealed.
pub const HIDDEN_TITLE: &str = "Hidden workout";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Wod,
    Lift,
}

impl std::fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkoutType::Wod => write!(f, "WOD"),
            WorkoutType::Lift => write!(f, "Lift"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid workout type: {0}")]
pub struct ParseWorkoutTypeError(String);

impl FromStr for WorkoutType {
    type Err = ParseWorkoutTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wod" => Ok(WorkoutType::Wod),
            "lift" => Ok(WorkoutType::Lift),
            _ => Err(ParseWorkoutTypeError(s.to_string())),
        }
    }
}

/// One concrete, dated instance of a scheduled workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    /// Assigned by the store on creation
    pub id: Uuid,
    /// Shared by every instance generated from one series request
    pub series_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub workout_type: WorkoutType,
    /// Opaque reference into the workout catalog
    pub template_id: Option<Uuid>,
    /// Day the workout is scheduled for
    pub date: NaiveDate,
    /// Creator
    pub owner_id: Uuid,
    /// None means personal; Some means visible to that group's members
    pub group_id: Option<Uuid>,
    /// Hide the description from athletes until `reveal_date`
    pub hide_details: bool,
    pub reveal_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_personal(&self) -> bool {
        self.group_id.is_none()
    }

    /// Hidden details become visible on the reveal date, or on the workout date when none is set.
    pub fn is_revealed(&self, today: NaiveDate) -> bool {
        !self.hide_details || today >= self.reveal_date.unwrap_or(self.date)
    }

    /// Whether `viewer` still sees this workout with its name and details withheld.
    pub fn is_hidden_from(&self, viewer: Uuid, today: NaiveDate) -> bool {
        viewer != self.owner_id && !self.is_revealed(today)
    }

    /// Copy suitable for showing to `viewer`: owners always see everything,
    /// everyone else gets a placeholder title and no description until the reveal.
    pub fn redacted_for(&self, viewer: Uuid, today: NaiveDate) -> Assignment {
        let mut view = self.clone();
        if self.is_hidden_from(viewer, today) {
            view.title = HIDDEN_TITLE.to_string();
            view.description = None;
        }
        view
    }
}

/// Everything needed to create an assignment; the store fills in identity and timestamps.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: Option<String>,
    pub workout_type: WorkoutType,
    pub template_id: Option<Uuid>,
    pub date: NaiveDate,
    pub owner_id: Uuid,
    pub group_id: Option<Uuid>,
    pub series_id: Option<Uuid>,
    pub hide_details: bool,
    pub reveal_date: Option<NaiveDate>,
}

impl NewAssignment {
    pub fn new(title: impl Into<String>, date: NaiveDate, owner_id: Uuid) -> Self {
        Self {
            title: title.into(),
            description: None,
            workout_type: WorkoutType::Wod,
            template_id: None,
            date,
            owner_id,
            group_id: None,
            series_id: None,
            hide_details: false,
            reveal_date: None,
        }
    }

    pub fn validate(&self) -> Result<(), crate::error::CoreError> {
        if self.title.trim().is_empty() {
            return Err(crate::error::CoreError::InvalidInput(
                "assignment title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAssignmentData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub workout_type: Option<WorkoutType>,
    pub template_id: Option<Option<Uuid>>,
    pub date: Option<NaiveDate>,
    pub group_id: Option<Option<Uuid>>,
    pub hide_details: Option<bool>,
    pub reveal_date: Option<Option<NaiveDate>>,
}

impl UpdateAssignmentData {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.workout_type.is_none()
            && self.template_id.is_none()
            && self.date.is_none()
            && self.group_id.is_none()
            && self.hide_details.is_none()
            && self.reveal_date.is_none()
    }

    /// Applies the present fields to `assignment`, leaving identity untouched.
    pub fn apply_to(&self, assignment: &mut Assignment) {
        if let Some(title) = &self.title {
            assignment.title = title.clone();
        }
        if let Some(description) = &self.description {
            assignment.description = description.clone();
        }
        if let Some(workout_type) = self.workout_type {
            assignment.workout_type = workout_type;
        }
        if let Some(template_id) = self.template_id {
            assignment.template_id = template_id;
        }
        if let Some(date) = self.date {
            assignment.date = date;
        }
        if let Some(group_id) = self.group_id {
            assignment.group_id = group_id;
        }
        if let Some(hide_details) = self.hide_details {
            assignment.hide_details = hide_details;
        }
        if let Some(reveal_date) = self.reveal_date {
            assignment.reveal_date = reveal_date;
        }
        assignment.updated_at = Utc::now();
    }
}

/// A group athletes can belong to; assignments posted to it are visible to every member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WorkoutGroup {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Tunables shared by expansion, series writes and schedule loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Instances generated per series when the caller gives no cap
    pub default_instance_cap: usize,
    /// Months from the anchor used when the caller gives no end date
    pub default_horizon_months: u32,
    /// Group ids per batch query; clamped to [`MAX_IDS_PER_QUERY`]
    pub max_ids_per_query: usize,
    /// Independent timeout for each store operation
    pub store_timeout_ms: u64,
}

impl SchedulingConfig {
    pub fn batch_size(&self) -> usize {
        self.max_ids_per_query.clamp(1, MAX_IDS_PER_QUERY)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_instance_cap: DEFAULT_INSTANCE_CAP,
            default_horizon_months: DEFAULT_HORIZON_MONTHS,
            max_ids_per_query: MAX_IDS_PER_QUERY,
            store_timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(hide_details: bool, reveal_date: Option<NaiveDate>) -> Assignment {
        Assignment {
            id: Uuid::now_v7(),
            series_id: None,
            title: "Fran".to_string(),
            description: Some("21-15-9 thrusters and pull-ups".to_string()),
            workout_type: WorkoutType::Wod,
            template_id: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            owner_id: Uuid::now_v7(),
            group_id: Some(Uuid::now_v7()),
            hide_details,
            reveal_date,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_workout_type_from_str() {
        assert_eq!("WOD".parse::<WorkoutType>(), Ok(WorkoutType::Wod));
        assert_eq!("lift".parse::<WorkoutType>(), Ok(WorkoutType::Lift));
        assert!("cardio".parse::<WorkoutType>().is_err());
    }

    #[test]
    fn test_hidden_details_redacted_until_workout_day() {
        let a = sample(true, None);
        let athlete = Uuid::now_v7();
        let day_before = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();

        let hidden = a.redacted_for(athlete, day_before);
        assert!(hidden.description.is_none());
        assert_eq!(hidden.title, HIDDEN_TITLE);
        assert!(a.is_hidden_from(athlete, day_before));

        let own = a.redacted_for(a.owner_id, day_before);
        assert!(own.description.is_some());
        assert_eq!(own.title, "Fran");

        let revealed = a.redacted_for(athlete, a.date);
        assert!(revealed.description.is_some());
        assert_eq!(revealed.title, "Fran");
    }

    #[test]
    fn test_personal_means_no_group() {
        let mut a = sample(false, None);
        assert!(!a.is_personal());
        a.group_id = None;
        assert!(a.is_personal());
    }

    #[test]
    fn test_explicit_reveal_date() {
        let reveal = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let a = sample(true, Some(reveal));
        assert!(!a.is_revealed(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()));
        assert!(a.is_revealed(reveal));
    }

    #[test]
    fn test_update_apply_keeps_identity() {
        let mut a = sample(false, None);
        let id = a.id;
        let update = UpdateAssignmentData {
            title: Some("Grace".to_string()),
            description: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply_to(&mut a);
        assert_eq!(a.id, id);
        assert_eq!(a.title, "Grace");
        assert!(a.description.is_none());
    }

    #[test]
    fn test_batch_size_clamped_to_store_limit() {
        let config = SchedulingConfig {
            max_ids_per_query: 50,
            ..Default::default()
        };
        assert_eq!(config.batch_size(), MAX_IDS_PER_QUERY);

        let config = SchedulingConfig {
            max_ids_per_query: 0,
            ..Default::default()
        };
        assert_eq!(config.batch_size(), 1);
    }

    #[test]
    fn test_new_assignment_requires_title() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(NewAssignment::new("  ", date, Uuid::now_v7()).validate().is_err());
        assert!(NewAssignment::new("Murph", date, Uuid::now_v7()).validate().is_ok());
    }
}
