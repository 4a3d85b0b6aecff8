//! Read-only views of the MOCO account: projects to pick from and the day's entries

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};

use crate::services::moco::{Activity, MocoClient, Project};

const UNKNOWN_PROJECT: &str = "Unknown project";
const UNKNOWN_TASK: &str = "Unknown task";

/// Active projects, each carrying only its active tasks.
///
/// Projects listed without embedded tasks get theirs fetched when
/// `with_tasks` is set.
pub async fn active_projects(moco: &MocoClient, assigned: bool, with_tasks: bool) -> Result<Vec<Project>> {
    let projects = if assigned {
        moco.assigned_projects().await
    } else {
        moco.projects().await
    }
    .context("Failed to load projects")?;

    let mut active: Vec<Project> = projects.into_iter().filter(|p| p.active).collect();
    if !with_tasks {
        return Ok(active);
    }

    for project in &mut active {
        if project.tasks.is_empty() {
            project.tasks = moco
                .project_tasks(project.id)
                .await
                .with_context(|| format!("Failed to load tasks of project {}", project.id))?;
        }
        project.tasks.retain(|t| t.active);
    }
    Ok(active)
}

/// The current user's entries booked on `day`
pub async fn entries_on(moco: &MocoClient, day: NaiveDate) -> Result<Vec<Activity>> {
    let user = moco.current_user().await.context("Failed to load the current user")?;
    moco.get_activities(day, day, Some(user.id))
        .await
        .context("Failed to load entries")
}

/// One line per entry: hours, project and task, creation time, note
pub fn format_activity(activity: &Activity) -> String {
    let project = activity.project.as_ref().map_or(UNKNOWN_PROJECT, |p| p.name.as_str());
    let task = activity.task.as_ref().map_or(UNKNOWN_TASK, |t| t.name.as_str());

    let mut line = format!("{:>5.2}h  {} / {}", activity.hours, project, task);
    if let Some(created) = activity.created_at.as_deref().and_then(created_time) {
        line.push_str(&format!("  {}", created));
    }
    if let Some(note) = activity.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!("  {}", note));
    }
    line
}

/// Local wall-clock time (HH:MM) of an RFC 3339 timestamp
fn created_time(created_at: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(created_at)
        .ok()
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
}
