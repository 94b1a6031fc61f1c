use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::WorkoutGroup;
use cadence_core::repository::Repository;
use uuid::Uuid;

use crate::config::Config;

pub async fn resolve_assignment_id(repo: &impl Repository, short_id: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(short_id) {
        return Ok(id);
    }
    let hex = short_id.replace('-', "");
    if hex.len() < 2 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!(CoreError::InvalidInput(
            "ID prefix must be at least 2 hex characters long.".to_string()
        )));
    }
    let assignments = repo.find_assignments_by_id_prefix(&hex).await?;
    if assignments.len() == 1 {
        Ok(assignments[0].id)
    } else if assignments.is_empty() {
        Err(anyhow!(CoreError::NotFound(format!(
            "No workout found with ID prefix '{}'",
            short_id
        ))))
    } else {
        let info: Vec<(String, String)> = assignments
            .into_iter()
            .map(|a| (a.id.to_string(), a.title))
            .collect();
        Err(anyhow!(CoreError::AmbiguousId(info)))
    }
}

pub async fn find_group(repo: &impl Repository, name: &str) -> Result<WorkoutGroup> {
    repo.find_group_by_name(name)
        .await?
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Group '{}' not found", name))))
}

/// The `--user` flag, falling back to the configured user.
pub fn acting_user(flag: Option<Uuid>, config: &Config) -> Result<Uuid> {
    flag.or(config.user_id).ok_or_else(|| {
        anyhow!(CoreError::InvalidInput(
            "no user configured; pass --user or set CADENCE_USER_ID".to_string()
        ))
    })
}
