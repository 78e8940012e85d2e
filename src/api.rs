//! Backend API
//!
//! `Backend` is the seam between the client logic and the network. The
//! browser build talks HTTP through `HttpBackend`; tests plug in scripted
//! backends.
//!
//! Endpoints:
//! - `GET  /api/v1/expressions`: task list, 401 when not logged in
//! - `POST /api/v1/calculate`: `{id, expression}`, any non-2xx is a rejection
//! - `GET  /user`: `{username}`, 401 when not logged in

use crate::error::{ClientError, ClientResult};
use crate::net::HttpResponse;
use crate::task::{Submission, Task};
use serde::Deserialize;
use std::future::Future;

#[cfg(target_arch = "wasm32")]
use crate::config::ClientConfig;
#[cfg(target_arch = "wasm32")]
use crate::net::HttpRequest;

/// Answer to a task list request
#[derive(Debug, Clone, PartialEq)]
pub enum TaskListing {
    Tasks(Vec<Task>),
    /// Not logged in; the page must go to the auth entry point
    Unauthorized,
}

/// Answer to a submission that reached the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResponse {
    Accepted,
    Rejected { status: u16 },
}

/// Answer to a session lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    User(String),
    Anonymous,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    username: String,
}

/// The calculator backend, as the client sees it
pub trait Backend {
    fn list_tasks(&self) -> impl Future<Output = ClientResult<TaskListing>>;

    fn submit(&self, submission: &Submission) -> impl Future<Output = ClientResult<SubmitResponse>>;

    fn current_user(&self) -> impl Future<Output = ClientResult<UserLookup>>;
}

pub fn classify_listing(resp: &HttpResponse) -> ClientResult<TaskListing> {
    match resp.status {
        401 => Ok(TaskListing::Unauthorized),
        _ if resp.is_success() => Ok(TaskListing::Tasks(resp.json()?)),
        status => Err(ClientError::Status(status)),
    }
}

pub fn classify_submission(resp: &HttpResponse) -> SubmitResponse {
    if resp.is_success() {
        SubmitResponse::Accepted
    } else {
        SubmitResponse::Rejected {
            status: resp.status,
        }
    }
}

pub fn classify_user(resp: &HttpResponse) -> ClientResult<UserLookup> {
    match resp.status {
        401 => Ok(UserLookup::Anonymous),
        _ if resp.is_success() => {
            let info: UserInfo = resp.json()?;
            Ok(UserLookup::User(info.username))
        }
        status => Err(ClientError::Status(status)),
    }
}

/// `Backend` over the Fetch API
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    expressions_url: String,
    calculate_url: String,
    user_url: String,
}

#[cfg(target_arch = "wasm32")]
impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            expressions_url: config.expressions_url.clone(),
            calculate_url: config.calculate_url.clone(),
            user_url: config.user_url.clone(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl Backend for HttpBackend {
    async fn list_tasks(&self) -> ClientResult<TaskListing> {
        let resp = HttpRequest::get(&self.expressions_url).send().await?;
        classify_listing(&resp)
    }

    async fn submit(&self, submission: &Submission) -> ClientResult<SubmitResponse> {
        let resp = HttpRequest::post(&self.calculate_url)
            .json(submission)?
            .send()
            .await?;
        let outcome = classify_submission(&resp);
        if let SubmitResponse::Rejected { status } = outcome {
            crate::console_log!(
                "[api] Submission rejected ({} {}): {}",
                status,
                resp.status_text,
                resp.text().unwrap_or_default().trim()
            );
        }
        Ok(outcome)
    }

    async fn current_user(&self) -> ClientResult<UserLookup> {
        let resp = HttpRequest::get(&self.user_url)
            .include_credentials()
            .send()
            .await?;
        classify_user(&resp)
    }
}
