//! In-memory repository for isolated tests and demos.
//!
//! Behaves like the SQLite store (including the ten-id batch ceiling) and adds
//! fault injection plus counters for the queries it served.

use crate::error::CoreError;
use crate::models::{Assignment, NewAssignment, UpdateAssignmentData, WorkoutGroup};
use crate::repository::ensure_batch_within_limit;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    assignments: HashMap<Uuid, Assignment>,
    groups: HashMap<Uuid, WorkoutGroup>,
    members: HashSet<(Uuid, Uuid)>,
}

#[derive(Default, Clone)]
struct Faults {
    failing_groups: HashSet<Uuid>,
    hanging_groups: HashSet<Uuid>,
    failing_create_dates: HashSet<NaiveDate>,
    failing_personal: bool,
    failing_memberships: bool,
    latency: Option<Duration>,
}

#[derive(Default)]
struct Counters {
    personal_queries: AtomicUsize,
    group_queries: AtomicUsize,
    membership_lookups: AtomicUsize,
    creates: AtomicUsize,
    deletes: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Point-in-time copy of what the repository has served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryStats {
    pub personal_queries: usize,
    pub group_queries: usize,
    pub membership_lookups: usize,
    pub creates: usize,
    pub deletes: usize,
    /// Highest number of operations observed running at the same time
    pub peak_in_flight: usize,
}

#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<MemoryState>,
    faults: Mutex<Faults>,
    counters: Counters,
}

/// Tracks one running operation; the count drops when the guard does.
struct InFlight<'a>(&'a Counters);

impl<'a> InFlight<'a> {
    fn start(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn injected(message: impl Into<String>) -> CoreError {
    CoreError::Store {
        message: message.into(),
        retryable: true,
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn faults(&self) -> Faults {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn with_faults(&self, f: impl FnOnce(&mut Faults)) {
        let mut faults = self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut faults);
    }

    /// Every query whose batch contains `group_id` fails.
    pub fn fail_group_queries(&self, group_id: Uuid) {
        self.with_faults(|f| {
            f.failing_groups.insert(group_id);
        });
    }

    /// Every query whose batch contains `group_id` never completes.
    pub fn hang_group_queries(&self, group_id: Uuid) {
        self.with_faults(|f| {
            f.hanging_groups.insert(group_id);
        });
    }

    pub fn fail_personal_queries(&self) {
        self.with_faults(|f| f.failing_personal = true);
    }

    pub fn fail_membership_lookups(&self) {
        self.with_faults(|f| f.failing_memberships = true);
    }

    pub fn fail_creates_on(&self, date: NaiveDate) {
        self.with_faults(|f| {
            f.failing_create_dates.insert(date);
        });
    }

    /// Delay applied to every operation, so concurrent calls overlap.
    pub fn set_latency(&self, latency: Duration) {
        self.with_faults(|f| f.latency = Some(latency));
    }

    pub fn clear_faults(&self) {
        self.with_faults(|f| *f = Faults::default());
    }

    pub fn stats(&self) -> QueryStats {
        let c = &self.counters;
        QueryStats {
            personal_queries: c.personal_queries.load(Ordering::SeqCst),
            group_queries: c.group_queries.load(Ordering::SeqCst),
            membership_lookups: c.membership_lookups.load(Ordering::SeqCst),
            creates: c.creates.load(Ordering::SeqCst),
            deletes: c.deletes.load(Ordering::SeqCst),
            peak_in_flight: c.peak_in_flight.load(Ordering::SeqCst),
        }
    }

    pub fn assignment_count(&self) -> usize {
        self.state().assignments.len()
    }

    /// Registers membership without requiring the group to exist.
    pub fn add_membership(&self, group_id: Uuid, user_id: Uuid) {
        self.state().members.insert((group_id, user_id));
    }

    async fn simulate_latency(&self, faults: &Faults) {
        if let Some(latency) = faults.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl super::AssignmentRepository for InMemoryRepository {
    async fn create_assignment(&self, data: NewAssignment) -> Result<Assignment, CoreError> {
        let _guard = InFlight::start(&self.counters);
        let faults = self.faults();
        self.simulate_latency(&faults).await;
        self.counters.creates.fetch_add(1, Ordering::SeqCst);

        data.validate()?;
        if faults.failing_create_dates.contains(&data.date) {
            return Err(injected(format!("injected create failure on {}", data.date)));
        }

        let now = Utc::now();
        let assignment = Assignment {
            id: Uuid::now_v7(),
            series_id: data.series_id,
            title: data.title,
            description: data.description,
            workout_type: data.workout_type,
            template_id: data.template_id,
            date: data.date,
            owner_id: data.owner_id,
            group_id: data.group_id,
            hide_details: data.hide_details,
            reveal_date: data.reveal_date,
            created_at: now,
            updated_at: now,
        };
        self.state()
            .assignments
            .insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn find_assignment_by_id(&self, id: Uuid) -> Result<Option<Assignment>, CoreError> {
        Ok(self.state().assignments.get(&id).cloned())
    }

    async fn find_assignments_by_id_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<Assignment>, CoreError> {
        let prefix = prefix.replace('-', "").to_lowercase();
        let mut found: Vec<Assignment> = self
            .state()
            .assignments
            .values()
            .filter(|a| a.id.simple().to_string().starts_with(&prefix))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.date, a.id));
        Ok(found)
    }

    async fn update_assignment(
        &self,
        id: Uuid,
        data: UpdateAssignmentData,
    ) -> Result<Assignment, CoreError> {
        let _guard = InFlight::start(&self.counters);
        let faults = self.faults();
        self.simulate_latency(&faults).await;

        let mut state = self.state();
        let assignment = state
            .assignments
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("Assignment with id {} not found", id)))?;
        if matches!(&data.title, Some(title) if title.trim().is_empty()) {
            return Err(CoreError::InvalidInput(
                "assignment title must not be empty".to_string(),
            ));
        }
        if !data.is_empty() {
            data.apply_to(assignment);
        }
        Ok(assignment.clone())
    }

    async fn delete_assignment(&self, id: Uuid) -> Result<(), CoreError> {
        let _guard = InFlight::start(&self.counters);
        let faults = self.faults();
        self.simulate_latency(&faults).await;
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);

        match self.state().assignments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound(format!("Assignment with id {} not found", id))),
        }
    }

    async fn find_assignments_by_series(
        &self,
        series_id: Uuid,
    ) -> Result<Vec<Assignment>, CoreError> {
        let mut found: Vec<Assignment> = self
            .state()
            .assignments
            .values()
            .filter(|a| a.series_id == Some(series_id))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.date, a.id));
        Ok(found)
    }

    async fn find_personal_assignments(
        &self,
        owner_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>, CoreError> {
        let _guard = InFlight::start(&self.counters);
        self.counters.personal_queries.fetch_add(1, Ordering::SeqCst);
        let faults = self.faults();
        self.simulate_latency(&faults).await;

        if faults.failing_personal {
            return Err(injected("injected personal query failure"));
        }

        let mut found: Vec<Assignment> = self
            .state()
            .assignments
            .values()
            .filter(|a| a.owner_id == owner_id && a.is_personal())
            .filter(|a| a.date >= start && a.date <= end)
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.date, a.id));
        Ok(found)
    }

    async fn find_group_assignments(
        &self,
        group_ids: &[Uuid],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>, CoreError> {
        ensure_batch_within_limit(group_ids)?;
        let _guard = InFlight::start(&self.counters);
        self.counters.group_queries.fetch_add(1, Ordering::SeqCst);
        let faults = self.faults();
        self.simulate_latency(&faults).await;

        if group_ids.iter().any(|id| faults.hanging_groups.contains(id)) {
            std::future::pending::<()>().await;
        }
        if let Some(id) = group_ids.iter().find(|id| faults.failing_groups.contains(id)) {
            return Err(injected(format!("injected failure for group {}", id)));
        }

        let wanted: HashSet<&Uuid> = group_ids.iter().collect();
        let mut found: Vec<Assignment> = self
            .state()
            .assignments
            .values()
            .filter(|a| a.group_id.as_ref().is_some_and(|g| wanted.contains(g)))
            .filter(|a| a.date >= start && a.date <= end)
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.date, a.id));
        Ok(found)
    }
}

#[async_trait]
impl super::GroupDirectory for InMemoryRepository {
    async fn memberships_for(&self, user_id: Uuid) -> Result<HashSet<Uuid>, CoreError> {
        let _guard = InFlight::start(&self.counters);
        self.counters.membership_lookups.fetch_add(1, Ordering::SeqCst);
        let faults = self.faults();
        self.simulate_latency(&faults).await;

        if faults.failing_memberships {
            return Err(injected("injected membership lookup failure"));
        }

        Ok(self
            .state()
            .members
            .iter()
            .filter(|(_, member)| *member == user_id)
            .map(|(group, _)| *group)
            .collect())
    }
}

#[async_trait]
impl super::GroupRepository for InMemoryRepository {
    async fn add_group(&self, name: String) -> Result<WorkoutGroup, CoreError> {
        let mut state = self.state();
        if state.groups.values().any(|g| g.name == name) {
            return Err(CoreError::InvalidInput(format!("Group '{}' already exists", name)));
        }
        let group = WorkoutGroup {
            id: Uuid::now_v7(),
            name,
            created_at: Utc::now(),
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<WorkoutGroup>, CoreError> {
        Ok(self.state().groups.values().find(|g| g.name == name).cloned())
    }

    async fn find_groups(&self) -> Result<Vec<WorkoutGroup>, CoreError> {
        let mut groups: Vec<WorkoutGroup> = self.state().groups.values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn add_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), CoreError> {
        let mut state = self.state();
        if !state.groups.contains_key(&group_id) {
            return Err(CoreError::NotFound(format!("Group with id {} not found", group_id)));
        }
        state.members.insert((group_id, user_id));
        Ok(())
    }

    async fn remove_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), CoreError> {
        if self.state().members.remove(&(group_id, user_id)) {
            Ok(())
        } else {
            Err(CoreError::NotFound(format!(
                "User {} is not a member of group {}",
                user_id, group_id
            )))
        }
    }
}
