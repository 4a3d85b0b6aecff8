//! Booking a stopped timer on the remote service

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    services::moco::{Activity, TimeTracking},
    state::{NewActivity, TimeEntry},
};

/// Daily total above which the user is warned
pub const DAILY_HOURS_LIMIT: f64 = 10.0;

/// Non-blocking heads-up about a long working day
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub total_hours: f64,
}

impl Advisory {
    pub fn message(&self) -> String {
        format!(
            "You have booked {:.2} hours today, more than {} hours.",
            self.total_hours, DAILY_HOURS_LIMIT
        )
    }
}

/// Advisory when already committed plus pending hours exceed the daily limit
pub fn daily_advisory(committed_hours: f64, pending_hours: f64) -> Option<Advisory> {
    let total_hours = committed_hours + pending_hours;
    (total_hours > DAILY_HOURS_LIMIT).then_some(Advisory { total_hours })
}

/// Result of booking an entry
#[derive(Debug, Clone)]
pub struct Submitted {
    pub activity: Activity,
    pub advisory: Option<Advisory>,
}

/// Book a stopped timer entry and work out whether the day is getting long
pub async fn submit_entry(tracking: &dyn TimeTracking, entry: &TimeEntry) -> Result<Submitted> {
    let activity = entry.to_activity()?;
    book_activity(tracking, &activity).await
}

/// Book `activity` after checking its required fields.
///
/// Only a failure to create the activity is an error. Problems fetching the
/// day's entries just mean no advisory.
pub async fn book_activity(tracking: &dyn TimeTracking, activity: &NewActivity) -> Result<Submitted> {
    validate(activity)?;

    let advisory = match committed_hours(tracking, activity.date).await {
        Ok(committed) => daily_advisory(committed, activity.hours),
        Err(e) => {
            warn!("Skipping daily hours check: {:#}", e);
            None
        }
    };

    let created = tracking
        .create_activity(activity)
        .await
        .context("Failed to book time entry")?;

    info!(
        "Booked {}h on project {} / task {} as activity {}",
        activity.hours, activity.project_id, activity.task_id, created.id
    );
    Ok(Submitted {
        activity: created,
        advisory,
    })
}

/// Project, task and a positive number of hours are required
pub fn validate(activity: &NewActivity) -> Result<()> {
    if activity.project_id <= 0 || activity.task_id <= 0 {
        bail!("A project and a task are required");
    }
    if !activity.hours.is_finite() || activity.hours <= 0.0 {
        bail!("Hours must be a positive number, got {}", activity.hours);
    }
    Ok(())
}

async fn committed_hours(tracking: &dyn TimeTracking, day: NaiveDate) -> Result<f64> {
    let user = tracking.me().await?;
    let activities = tracking.activities(day, day, Some(user.id)).await?;
    Ok(activities.iter().map(|a| a.hours).sum())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::{future::BoxFuture, FutureExt};
    use reqwest::StatusCode;

    use super::*;
    use crate::{
        services::moco::{self, MocoError, User},
    };

    #[derive(Default)]
    struct FakeTracking {
        booked: Vec<f64>,
        fail_listing: bool,
        fail_create: bool,
        created: Mutex<Vec<NewActivity>>,
    }

    fn unavailable() -> MocoError {
        MocoError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "down".to_string(),
        }
    }

    impl TimeTracking for FakeTracking {
        fn me(&self) -> BoxFuture<'_, moco::Result<User>> {
            async move {
                Ok(User {
                    id: 42,
                    firstname: String::new(),
                    lastname: String::new(),
                })
            }
            .boxed()
        }

        fn create_activity<'a>(
            &'a self,
            activity: &'a NewActivity,
        ) -> BoxFuture<'a, moco::Result<Activity>> {
            async move {
                if self.fail_create {
                    return Err(unavailable());
                }
                self.created.lock().unwrap().push(activity.clone());
                Ok(Activity {
                    id: 1,
                    date: Some(activity.date),
                    hours: activity.hours,
                    description: Some(activity.description.clone()),
                    project: None,
                    task: None,
                    created_at: None,
                })
            }
            .boxed()
        }

        fn activities<'a>(
            &'a self,
            _from: NaiveDate,
            _to: NaiveDate,
            _user_id: Option<i64>,
        ) -> BoxFuture<'a, moco::Result<Vec<Activity>>> {
            async move {
                if self.fail_listing {
                    return Err(unavailable());
                }
                Ok(self
                    .booked
                    .iter()
                    .enumerate()
                    .map(|(i, hours)| Activity {
                        id: i as i64,
                        date: None,
                        hours: *hours,
                        description: None,
                        project: None,
                        task: None,
                        created_at: None,
                    })
                    .collect())
            }
            .boxed()
        }
    }

    fn entry(hours: f64) -> TimeEntry {
        TimeEntry {
            project_id: 1,
            task_id: 2,
            project_name: "Website".to_string(),
            task_name: "Design".to_string(),
            note: "kickoff".to_string(),
            hours,
            start_time: 1_700_000_000_000,
        }
    }

    #[test]
    fn advisory_only_above_the_limit() {
        assert_eq!(daily_advisory(8.0, 2.0), None);
        assert_eq!(daily_advisory(8.0, 2.25), Some(Advisory { total_hours: 10.25 }));
    }

    #[tokio::test]
    async fn books_the_entry_and_flags_a_long_day() {
        let tracking = FakeTracking {
            booked: vec![6.0, 3.5],
            ..Default::default()
        };

        let submitted = submit_entry(&tracking, &entry(1.5)).await.unwrap();
        assert_eq!(submitted.advisory, Some(Advisory { total_hours: 11.0 }));

        let created = tracking.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].hours, 1.5);
        assert_eq!(created[0].description, "kickoff");
        assert_eq!(created[0].date, NaiveDate::from_ymd_opt(2023, 11, 14).unwrap());
    }

    #[tokio::test]
    async fn listing_failure_is_swallowed() {
        let tracking = FakeTracking {
            booked: vec![12.0],
            fail_listing: true,
            ..Default::default()
        };

        let submitted = submit_entry(&tracking, &entry(1.0)).await.unwrap();
        assert_eq!(submitted.advisory, None);
        assert_eq!(tracking.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_failure_is_reported() {
        let tracking = FakeTracking {
            fail_create: true,
            ..Default::default()
        };

        let err = submit_entry(&tracking, &entry(1.0)).await.unwrap_err();
        assert!(format!("{:#}", err).contains("MOCO API Error: 503 - down"));
    }

    #[tokio::test]
    async fn manual_booking_requires_positive_hours() {
        let tracking = FakeTracking::default();
        let mut activity = entry(1.0).to_activity().unwrap();
        activity.hours = 0.0;

        let err = book_activity(&tracking, &activity).await.unwrap_err();
        assert!(err.to_string().contains("Hours must be a positive number"));
        assert!(tracking.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn manual_booking_requires_project_and_task() {
        let tracking = FakeTracking::default();
        let mut activity = entry(1.0).to_activity().unwrap();
        activity.task_id = 0;

        let err = book_activity(&tracking, &activity).await.unwrap_err();
        assert_eq!(err.to_string(), "A project and a task are required");
        assert!(tracking.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn entry_with_out_of_range_start_is_not_booked() {
        let tracking = FakeTracking::default();
        let mut bad = entry(1.0);
        bad.start_time = i64::MAX;

        assert!(submit_entry(&tracking, &bad).await.is_err());
        assert!(tracking.created.lock().unwrap().is_empty());
    }
}
