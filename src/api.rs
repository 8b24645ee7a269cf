use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::batch::{BatchError, BatchState};
use crate::config::Config;
use crate::model::{ScanPayload, SubmissionOutcome, TIMESTAMP_FORMAT};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Transport seam for posting a batch. Implementations never fail: every
/// result, including "no response", is folded into a [`SubmissionOutcome`].
/// A request that cannot be built is `RequestNotBuilt`, never a network
/// failure.
#[async_trait]
pub trait ScanApi: Send + Sync {
    async fn post_scan(&self, payload: &ScanPayload) -> SubmissionOutcome;
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("nothing to submit: {0}")]
    EmptyBatch(#[source] BatchError),
}

/// Long-lived HTTP client for the scan endpoint, shared across submissions.
#[derive(Clone)]
pub struct ScanApiClient {
    http: Client,
    endpoint: Url,
}

impl fmt::Debug for ScanApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanApiClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ScanApiClient {
    pub fn new(endpoint: Url, user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(user_agent.to_string())
            .no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build HTTP client")?;
        Ok(Self { http, endpoint })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let endpoint = cfg.api.endpoint_url().context("invalid scan endpoint")?;
        Self::new(endpoint, &cfg.api.user_agent, cfg.api.timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_request(&self, payload: &ScanPayload) -> Result<reqwest::Request> {
        let body = serde_json::to_vec(payload).context("failed to encode scan payload")?;
        self.http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .build()
            .context("failed to build scan request")
    }

    pub async fn post_scan(&self, payload: &ScanPayload) -> SubmissionOutcome {
        let request = match self.build_request(payload) {
            Ok(request) => request,
            Err(err) => {
                warn!(?err, "could not create scan request");
                return SubmissionOutcome::RequestNotBuilt(format!("{err:#}"));
            }
        };
        debug!(
            url = %request.url(),
            fabricator = %payload.fabricator,
            mattresses = payload.mattresses.len(),
            "sending scan batch"
        );
        match self.http.execute(request).await {
            Ok(res) => outcome_for_status(res.status()),
            Err(err) => {
                warn!(?err, "scan endpoint unreachable");
                SubmissionOutcome::NetworkFailure(err.to_string())
            }
        }
    }
}

#[async_trait]
impl ScanApi for ScanApiClient {
    async fn post_scan(&self, payload: &ScanPayload) -> SubmissionOutcome {
        ScanApiClient::post_scan(self, payload).await
    }
}

/// Only the status is inspected; the response body is ignored.
pub fn outcome_for_status(status: StatusCode) -> SubmissionOutcome {
    match status.as_u16() {
        200 | 201 => SubmissionOutcome::Success,
        400 => SubmissionOutcome::DuplicateOrNotFound,
        other => SubmissionOutcome::ServerError(other),
    }
}

pub fn local_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Stamp `batch` with the local time and post it once. The caller is expected
/// to have checked eligibility; an incomplete batch is refused before any
/// request is made.
#[instrument(skip_all)]
pub async fn submit(
    api: &dyn ScanApi,
    batch: &BatchState,
) -> Result<SubmissionOutcome, SubmitError> {
    let payload = batch
        .to_payload(local_timestamp())
        .map_err(SubmitError::EmptyBatch)?;
    let outcome = api.post_scan(&payload).await;
    info!(
        fabricator = %payload.fabricator,
        mattresses = payload.mattresses.len(),
        ?outcome,
        "scan batch submitted"
    );
    Ok(outcome)
}
