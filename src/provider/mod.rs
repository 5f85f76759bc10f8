//! Data providers for the fleet backend REST API.
//!
//! Every data request carries the session's bearer token; an authorization
//! failure tears the session down.

mod models;

pub use models::*;

use crate::db::DbError;
use crate::session::{Session, User};

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Provider error types.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication token not found")]
    MissingToken,
    #[error("unauthorized access, please log in again")]
    Unauthorized,
    #[error("{0}")]
    Rejected(String),
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("session storage error: {0}")]
    Session(#[from] DbError),
}

impl ProviderError {
    fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(timeout)
        } else if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Source of dashboard summaries for the poller.
pub trait SummarySource: Send + Sync + 'static {
    fn fetch_summary(&self) -> impl Future<Output = Result<SummaryDriverData, ProviderError>> + Send;
}

/// REST client for the fleet backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<Session>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            session,
        })
    }

    /// Fleet summary: status counts, overall center and the driver list.
    pub async fn fetch_summary(&self) -> Result<SummaryDriverData, ProviderError> {
        tracing::debug!("ApiClient: Requesting summary driver data");
        self.get_json("/summary-dashboard-data", &[]).await
    }

    /// A driver's current trip, or a specific trip when `trip_id` is given.
    pub async fn fetch_driver_trip(
        &self,
        driver_id: &str,
        trip_id: Option<&str>,
    ) -> Result<DriverCurrentTrip, ProviderError> {
        let path = match trip_id {
            Some(tid) => format!("/driver-trip-data/{}/{}", driver_id, tid),
            None => format!("/driver-trip-data/{}", driver_id),
        };
        tracing::debug!("ApiClient: Requesting trip data for driver {}", driver_id);
        self.get_json(&path, &[]).await
    }

    /// Fleet statistics, optionally limited to a date range.
    pub async fn fetch_statistics(
        &self,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<StatisticModel, ProviderError> {
        let query = date_query(date_from, date_to);
        self.get_json("/statistics", &query).await
    }

    /// Statistics for one driver, optionally limited to a date range.
    pub async fn fetch_driver_statistics(
        &self,
        driver_id: &str,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<StatisticDriverModel, ProviderError> {
        let query = date_query(date_from, date_to);
        self.get_json(&format!("/driver-statistics/{}", driver_id), &query).await
    }

    /// Log in and store the returned token and profile in the session.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, ProviderError> {
        let response = self
            .http
            .post(format!("{}/userlogin", self.base_url))
            .json(credentials)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            tracing::error!("ApiClient: Login failed with {}", status);
            return Err(match (message, status) {
                (Some(m), _) => ProviderError::Rejected(m),
                (None, StatusCode::UNAUTHORIZED) => ProviderError::Rejected(
                    "Invalid email or password. Please try again.".to_string(),
                ),
                (None, s) => ProviderError::Status {
                    status: s.as_u16(),
                    message: "An unknown error occurred during login.".to_string(),
                },
            });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let token = body
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::Decode("login response missing token".to_string()))?;

        let user = body.user();
        self.session.sign_in(token, &user)?;
        Ok(user)
    }

    /// Register a new account; a returned token signs the user in directly.
    pub async fn register(&self, data: &RegistrationData) -> Result<User, ProviderError> {
        let response = self
            .http
            .post(format!("{}/register", self.base_url))
            .json(data)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            tracing::error!("ApiClient: Registration failed with {}", status);
            return Err(match (message, status) {
                (Some(m), _) => ProviderError::Rejected(m),
                (None, StatusCode::CONFLICT) => ProviderError::Rejected(
                    "Email or username already exists. Please choose another.".to_string(),
                ),
                (None, s) => ProviderError::Status {
                    status: s.as_u16(),
                    message: "An unknown error occurred during registration.".to_string(),
                },
            });
        }

        let body: RegisterResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let user = User {
            user_id: body.user.user_id,
            email: body.user.email,
            username: body.user.username,
        };

        if let Some(token) = body.user.token.as_deref().filter(|t| !t.is_empty()) {
            self.session.sign_in(token, &user)?;
            tracing::info!("ApiClient: User auto-logged in after registration");
        }

        Ok(user)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let token = self.session.token().ok_or_else(|| {
            tracing::error!("ApiClient: No token found, user is not authenticated");
            ProviderError::MissingToken
        })?;

        let request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(query);

        let response = self.send(request).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!("ApiClient: Backend returned {}, ending session", status);
            if let Err(e) = self.session.logout() {
                tracing::error!("ApiClient: Failed to clear session: {}", e);
            }
            return Err(ProviderError::Unauthorized);
        }

        if !status.is_success() {
            let message = error_message(response)
                .await
                .unwrap_or_else(|| "Failed to load data.".to_string());
            tracing::error!("ApiClient: Error fetching data: {} {}", status, message);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

impl SummarySource for ApiClient {
    fn fetch_summary(&self) -> impl Future<Output = Result<SummaryDriverData, ProviderError>> + Send {
        ApiClient::fetch_summary(self)
    }
}

fn date_query<'a>(date_from: Option<&'a str>, date_to: Option<&'a str>) -> Vec<(&'static str, &'a str)> {
    let mut query = Vec::new();
    if let Some(from) = date_from.filter(|d| !d.is_empty()) {
        query.push(("dateFrom", from));
    }
    if let Some(to) = date_to.filter(|d| !d.is_empty()) {
        query.push(("dateTo", to));
    }
    query
}

/// Pull `{"message": ...}` out of an error response, if present.
async fn error_message(response: Response) -> Option<String> {
    let body = response.text().await.ok()?;
    serde_json::from_str::<ErrorBody>(&body).ok()?.message
}
