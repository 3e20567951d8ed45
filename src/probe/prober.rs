use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue},
};
use tokio::time::Instant;
use tracing::debug;

use crate::args::DEFAULT_USER_AGENT;
use crate::error::{AppError, AppResult, ProbeError, ValidationError};

use super::payload::ChatPayload;
use super::types::ProbeTiming;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Issues one timed request against a route.
///
/// Implementations never retry; every call is exactly one attempt.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeTiming, ProbeError>;
}

/// Builds the pooled client shared by every probe of a run.
///
/// # Errors
///
/// Returns an error when the TLS backend or client cannot be initialised.
pub fn build_client(connection_pool_size: usize, timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .timeout(timeout)
        .pool_max_idle_per_host(connection_pool_size)
        .build()
        .map_err(|source| AppError::validation(ValidationError::BuildClient { source }))
}

/// Probes routes over HTTP with a fixed token and request body.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    auth_token: HeaderValue,
    body: Bytes,
    timeout: Duration,
}

impl HttpProber {
    /// # Errors
    ///
    /// Returns an error when the token is not a valid header value or the
    /// payload cannot be serialised.
    pub fn new(
        client: Client,
        auth_token: &str,
        payload: &ChatPayload,
        timeout: Duration,
    ) -> AppResult<Self> {
        let mut auth_token = HeaderValue::from_str(auth_token)
            .map_err(|_err| AppError::validation(ValidationError::TokenHeader))?;
        auth_token.set_sensitive(true);
        let body = Bytes::from(serde_json::to_vec(payload)?);
        Ok(Self {
            client,
            auth_token,
            body,
            timeout,
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> Result<ProbeTiming, ProbeError> {
        probe_once(
            &self.client,
            url,
            &self.auth_token,
            self.body.clone(),
            self.timeout,
        )
        .await
    }
}

/// Sends one streaming POST and times the first non-empty chunk and the end
/// of the body.
///
/// The body is always drained to the end so the pooled connection stays
/// reusable.
///
/// # Errors
///
/// Returns the probe failure: a non-200 status, a timeout, a transport
/// failure, or an empty body.
pub async fn probe_once(
    client: &Client,
    url: &str,
    auth_token: &HeaderValue,
    body: Bytes,
    timeout: Duration,
) -> Result<ProbeTiming, ProbeError> {
    let start = Instant::now();
    let response = client
        .post(url)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(AUTHORIZATION, auth_token.clone())
        .timeout(timeout)
        .body(body)
        .send()
        .await
        .map_err(|err| ProbeError::from_reqwest(&err))?;

    let status = response.status();
    if status != StatusCode::OK {
        debug!("{} answered {}", url, status);
        return Err(ProbeError::HttpStatus(status.as_u16()));
    }

    let mut first_byte = None;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| ProbeError::from_reqwest(&err))?;
        if first_byte.is_none() && !chunk.is_empty() {
            first_byte = Some(start.elapsed());
        }
    }
    let total = start.elapsed();

    let first_byte = first_byte.ok_or(ProbeError::NoResponseData)?;
    Ok(ProbeTiming { first_byte, total })
}
