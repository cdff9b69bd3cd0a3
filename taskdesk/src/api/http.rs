//! `reqwest`-backed [`Backend`] speaking JSON to the REST API.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use taskdesk_proto::endpoint::{Endpoint, Method};
use taskdesk_proto::model::{Notification, NotificationId, Task, TaskId, User, UserId};
use taskdesk_proto::request::{
    ApiErrorBody, ApproveRequest, CompleteRequest, HealthStatus, NewTask, NewUser,
};

use super::{ApiError, Backend};

/// HTTP client bound to one backend origin.
///
/// Endpoint paths are absolute (`/api/...`), so any path component of the
/// base URL is replaced.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] for an unparsable URL or
    /// [`ApiError::Client`] if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self { base, client })
    }

    /// The backend origin.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Fetches a JSON array from a collection endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`]/[`ApiError::Rejected`] when the response
    /// is not a success, [`ApiError::Network`] when no response arrives and
    /// [`ApiError::Decode`] when the body is not a JSON array of `T`.
    pub async fn fetch_collection<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
    ) -> Result<Vec<T>, ApiError> {
        let response = self.send::<()>(endpoint, None).await?;
        let items: Vec<T> = decode(endpoint, response).await?;
        tracing::debug!(%endpoint, count = items.len(), "fetched collection");
        Ok(items)
    }

    /// Sends one request and checks the status.
    async fn send<Q: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        body: Option<&Q>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.base.join(&endpoint.path())?;
        let request = match endpoint.method() {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        let request = match body {
            Some(body) => request.json(body),
            None if endpoint.method() == Method::Put => {
                request.header(CONTENT_TYPE, "application/json")
            }
            None => request,
        };

        tracing::debug!(%endpoint, "sending request");
        let response = request.send().await.map_err(|source| {
            tracing::warn!(%endpoint, error = %source, "request failed");
            ApiError::Network { endpoint, source }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status = status.as_u16();
        let text = response.text().await.unwrap_or_default();
        let err = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => ApiError::Rejected {
                endpoint,
                status,
                message: body.error,
            },
            Err(_) => ApiError::Status { endpoint, status },
        };
        tracing::warn!(%endpoint, status, error = %err, "backend refused request");
        Err(err)
    }

    /// Sends a mutation and discards the response body.
    async fn mutate<Q: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        body: Option<&Q>,
    ) -> Result<(), ApiError> {
        self.send(endpoint, body).await?;
        tracing::info!(%endpoint, "mutation accepted");
        Ok(())
    }
}

/// Decodes a JSON body, tagging failures with the endpoint.
async fn decode<T: DeserializeOwned>(
    endpoint: Endpoint,
    response: reqwest::Response,
) -> Result<T, ApiError> {
    response.json::<T>().await.map_err(|e| ApiError::Decode {
        endpoint,
        reason: e.to_string(),
    })
}

impl Backend for HttpBackend {
    async fn members(&self) -> Result<Vec<User>, ApiError> {
        self.fetch_collection(Endpoint::Members).await
    }

    async fn created_tasks(&self, lead: UserId) -> Result<Vec<Task>, ApiError> {
        self.fetch_collection(Endpoint::CreatedTasks(lead)).await
    }

    async fn assigned_tasks(&self, member: UserId) -> Result<Vec<Task>, ApiError> {
        self.fetch_collection(Endpoint::AssignedTasks(member)).await
    }

    async fn notifications(&self, user: UserId) -> Result<Vec<Notification>, ApiError> {
        self.fetch_collection(Endpoint::Notifications(user)).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        let endpoint = Endpoint::CreateUser;
        let response = self.send(endpoint, Some(user)).await?;
        let created: User = decode(endpoint, response).await?;
        tracing::info!(user_id = %created.id, username = %created.username, "user created");
        Ok(created)
    }

    async fn assign_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let endpoint = Endpoint::AssignTask;
        let response = self.send(endpoint, Some(task)).await?;
        let created: Task = decode(endpoint, response).await?;
        tracing::info!(task_id = %created.id, assignee = %task.assigned_to, "task assigned");
        Ok(created)
    }

    async fn approve_task(&self, task: TaskId, lead: UserId) -> Result<(), ApiError> {
        self.mutate(
            Endpoint::ApproveTask(task),
            Some(&ApproveRequest { user_id: lead }),
        )
        .await
    }

    async fn complete_task(&self, task: TaskId, result: &str) -> Result<(), ApiError> {
        let body = CompleteRequest {
            result: result.to_string(),
        };
        self.mutate(Endpoint::CompleteTask(task), Some(&body)).await
    }

    async fn delete_task(&self, task: TaskId) -> Result<(), ApiError> {
        self.mutate::<()>(Endpoint::DeleteTask(task), None).await
    }

    async fn delete_user(&self, user: UserId) -> Result<(), ApiError> {
        self.mutate::<()>(Endpoint::DeleteUser(user), None).await
    }

    async fn mark_notification_read(&self, id: NotificationId) -> Result<(), ApiError> {
        self.mutate::<()>(Endpoint::MarkNotificationRead(id), None).await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let endpoint = Endpoint::Health;
        let response = self.send::<()>(endpoint, None).await?;
        decode(endpoint, response).await
    }
}
