//! MOCO REST API client

use chrono::NaiveDate;
use futures::{future::BoxFuture, FutureExt};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error};

use crate::state::NewActivity;

#[derive(Debug, thiserror::Error)]
pub enum MocoError {
    /// The request never produced a response
    #[error("MOCO API request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The service answered with a non-success status
    #[error("MOCO API Error: {} - {body}", .status.as_u16())]
    Status { status: StatusCode, body: String },
    /// The response body did not have the expected shape
    #[error("MOCO API returned an unexpected response: {0}")]
    Decode(#[source] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, MocoError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// A booked time entry as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project: Option<NamedRef>,
    #[serde(default)]
    pub task: Option<NamedRef>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Serialize)]
struct CreateActivityBody<'a> {
    activity: &'a NewActivity,
}

/// The calls the stop-and-book flow needs from the remote service
pub trait TimeTracking: Send + Sync {
    fn me(&self) -> BoxFuture<'_, Result<User>>;

    fn create_activity<'a>(&'a self, activity: &'a NewActivity) -> BoxFuture<'a, Result<Activity>>;

    fn activities<'a>(
        &'a self,
        from: NaiveDate,
        to: NaiveDate,
        user_id: Option<i64>,
    ) -> BoxFuture<'a, Result<Vec<Activity>>>;
}

/// Client for one MOCO account
#[derive(Debug, Clone)]
pub struct MocoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MocoClient {
    /// Client for `https://{domain}.mocoapp.com`
    pub fn new(domain: &str, api_key: &str) -> Self {
        Self::with_base_url(format!("https://{}.mocoapp.com/api/v1", domain), api_key)
    }

    /// Client against an explicit API root, e.g. a test server
    pub fn with_base_url(base_url: impl Into<String>, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn make_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, self.make_url(endpoint))
            .header("Authorization", format!("Token token={}", self.api_key))
            .header("Content-Type", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, request_builder: RequestBuilder) -> Result<T> {
        let response = request_builder.send().await.map_err(|e| {
            error!("API request failed: {}", e);
            MocoError::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("API request failed with status {}", status);
            return Err(MocoError::Status { status, body });
        }

        response.json().await.map_err(MocoError::Decode)
    }

    pub async fn current_user(&self) -> Result<User> {
        self.send(self.request(Method::GET, "/users/me")).await
    }

    /// Check the credentials by fetching the current user
    pub async fn test_connection(&self) -> Result<User> {
        let user = self.current_user().await?;
        debug!("Connection test succeeded for user {}", user.id);
        Ok(user)
    }

    pub async fn get_activities(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_id: Option<i64>,
    ) -> Result<Vec<Activity>> {
        let mut query = vec![
            ("from", from.format("%Y-%m-%d").to_string()),
            ("to", to.format("%Y-%m-%d").to_string()),
        ];
        if let Some(user_id) = user_id {
            query.push(("user_id", user_id.to_string()));
        }

        self.send(self.request(Method::GET, "/activities").query(&query))
            .await
    }

    pub async fn post_activity(&self, activity: &NewActivity) -> Result<Activity> {
        debug!(
            "Creating activity: {}h on project {} / task {} for {}",
            activity.hours, activity.project_id, activity.task_id, activity.date
        );
        self.send(
            self.request(Method::POST, "/activities")
                .json(&CreateActivityBody { activity }),
        )
        .await
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.send(self.request(Method::GET, "/projects")).await
    }

    pub async fn assigned_projects(&self) -> Result<Vec<Project>> {
        self.send(self.request(Method::GET, "/projects/assigned")).await
    }

    pub async fn project_tasks(&self, project_id: i64) -> Result<Vec<Task>> {
        self.send(self.request(Method::GET, &format!("/projects/{}/tasks", project_id)))
            .await
    }
}

impl TimeTracking for MocoClient {
    fn me(&self) -> BoxFuture<'_, Result<User>> {
        self.current_user().boxed()
    }

    fn create_activity<'a>(&'a self, activity: &'a NewActivity) -> BoxFuture<'a, Result<Activity>> {
        self.post_activity(activity).boxed()
    }

    fn activities<'a>(
        &'a self,
        from: NaiveDate,
        to: NaiveDate,
        user_id: Option<i64>,
    ) -> BoxFuture<'a, Result<Vec<Activity>>> {
        self.get_activities(from, to, user_id).boxed()
    }
}

#[cfg(test)]
mod tests {
    use httpmock::{Method::GET, Method::POST, MockServer};
    use serde_json::json;

    use super::*;

    fn client(server: &MockServer) -> MocoClient {
        MocoClient::with_base_url(server.url("/api/v1"), "secret")
    }

    #[test]
    fn domain_maps_to_api_root() {
        let client = MocoClient::new("acme", "secret");
        assert_eq!(client.base_url(), "https://acme.mocoapp.com/api/v1");
    }

    #[tokio::test]
    async fn sends_token_header_and_decodes_user() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/users/me")
                    .header("Authorization", "Token token=secret");
                then.status(200)
                    .json_body(json!({ "id": 42, "firstname": "Ada", "lastname": "Lovelace" }));
            })
            .await;

        let user = client(&server).test_connection().await.unwrap();
        mock.assert_async().await;
        assert_eq!(user.id, 42);
        assert_eq!(user.firstname, "Ada");
    }

    #[tokio::test]
    async fn creates_activity_wrapped_in_activity_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/activities").json_body(json!({
                    "activity": {
                        "date": "2024-03-01",
                        "hours": 1.5,
                        "project_id": 1,
                        "task_id": 2,
                        "description": "kickoff"
                    }
                }));
                then.status(200).json_body(json!({ "id": 7, "hours": 1.5 }));
            })
            .await;

        let activity = NewActivity {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            hours: 1.5,
            project_id: 1,
            task_id: 2,
            description: "kickoff".to_string(),
        };
        let created = client(&server).create_activity(&activity).await.unwrap();
        mock.assert_async().await;
        assert_eq!(created.id, 7);
    }

    #[tokio::test]
    async fn filters_activities_by_day_and_user() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/activities")
                    .query_param("from", "2024-03-01")
                    .query_param("to", "2024-03-01")
                    .query_param("user_id", "42");
                then.status(200).json_body(json!([
                    {
                        "id": 1,
                        "hours": 2.0,
                        "description": "review",
                        "project": { "id": 1, "name": "Website" },
                        "task": { "id": 2, "name": "Design" },
                        "created_at": "2024-03-01T09:00:00Z"
                    },
                    { "id": 2, "hours": 0.5 }
                ]));
            })
            .await;

        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let activities = client(&server).activities(day, day, Some(42)).await.unwrap();
        mock.assert_async().await;
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].project.as_ref().unwrap().name, "Website");
        assert_eq!(activities[1].description, None);
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/projects");
                then.status(401).body("Unauthorized");
            })
            .await;

        let err = client(&server).projects().await.unwrap_err();
        assert_eq!(err.to_string(), "MOCO API Error: 401 - Unauthorized");
    }

    #[tokio::test]
    async fn lists_project_tasks() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/projects/9/tasks");
                then.status(200)
                    .json_body(json!([{ "id": 3, "name": "Design", "active": true }]));
            })
            .await;

        let tasks = client(&server).project_tasks(9).await.unwrap();
        assert_eq!(tasks, vec![Task { id: 3, name: "Design".to_string(), active: true }]);
    }
}
