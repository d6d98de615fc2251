//! Users API service and the state it feeds

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::models::User;
use crate::http::{HttpAdapter, NormalizedError, NormalizedResponse, RequestConfig};
use crate::notify::{handle_api_error, Notifier};

/// Collection endpoint for users
pub const USERS_ENDPOINT: &str = "/api/users";

/// Arguments for [`UsersService::create_user`]
#[derive(Debug, Clone, Default)]
pub struct CreateUserParams {
    pub request_body: Vec<User>,
    pub request_config: Option<RequestConfig>,
}

/// Thin wrapper over the adapter for the users endpoints
#[derive(Debug, Clone)]
pub struct UsersService {
    http: Arc<HttpAdapter>,
}

impl UsersService {
    pub fn new(http: Arc<HttpAdapter>) -> Self {
        Self { http }
    }

    /// Get all users
    pub async fn get_users(&self) -> Result<NormalizedResponse<Vec<User>>, NormalizedError> {
        self.http.get(USERS_ENDPOINT, RequestConfig::new()).await
    }

    /// Create users from `params.request_body`
    pub async fn create_user(
        &self,
        params: CreateUserParams,
    ) -> Result<NormalizedResponse<Vec<User>>, NormalizedError> {
        let config = params.request_config.unwrap_or_default();
        self.http.post(USERS_ENDPOINT, &params.request_body, config).await
    }

    /// Abort the most recent call made through the shared adapter
    pub fn abort_request(&self) {
        self.http.abort_request();
    }
}

/// Lifecycle of a tracked request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiRequestStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// Users slice of application state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub users: Vec<User>,
    pub is_data_fetch_request_pending: bool,
    pub request_status: ApiRequestStatus,
}

impl UserState {
    pub fn set_users(&mut self, users: Vec<User>) {
        self.users = users;
    }

    pub fn set_data_fetch_request_pending_to(&mut self, pending: bool) {
        self.is_data_fetch_request_pending = pending;
    }

    /// Fetch users into the state, reporting failures through `notifier`
    ///
    /// The pending flag is raised for the duration of the call and always
    /// lowered afterwards.
    pub async fn fetch(
        &mut self,
        service: &UsersService,
        notifier: &Arc<dyn Notifier>,
    ) -> Result<(), NormalizedError> {
        self.set_data_fetch_request_pending_to(true);
        self.request_status = ApiRequestStatus::Pending;

        let outcome = service.get_users().await;
        self.set_data_fetch_request_pending_to(false);

        match outcome {
            Ok(response) => {
                tracing::debug!(count = response.body.len(), "Users loaded");
                self.set_users(response.body);
                self.request_status = ApiRequestStatus::Success;
                Ok(())
            }
            Err(error) => {
                handle_api_error(&error, notifier);
                self.request_status = ApiRequestStatus::Error;
                Err(error)
            }
        }
    }
}
