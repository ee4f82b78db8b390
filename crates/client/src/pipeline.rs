//! Outgoing request pipeline.
//!
//! A [`Pipeline`] runs every request through an ordered list of [`Stage`]s
//! before sending it exactly once, then lets each stage inspect the
//! response. The authenticated pipeline uses [`BearerAuth`] (token check,
//! `Authorization` header, 401 handling) and [`RequestLogging`].

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use reqwest::{
    Request, Response, StatusCode,
    header::{AUTHORIZATION, HeaderValue},
};
use tracing::debug;

use crate::{ClientError, Result, auth::Authenticator};

#[async_trait]
pub trait Stage: Send + Sync {
    async fn before(&self, request: &mut Request) -> Result<()>;

    async fn after(&self, _request: &RequestLine, _response: &Response) -> Result<()> {
        Ok(())
    }
}

/// Method and URL of a request already handed to the transport.
#[derive(Clone, Debug)]
pub struct RequestLine {
    pub method: reqwest::Method,
    pub url: reqwest::Url,
    pub started: Instant,
}

#[derive(Clone)]
pub struct Pipeline {
    http: reqwest::Client,
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Runs the stages and sends the request once. No retries.
    pub async fn execute(&self, mut request: Request) -> Result<Response> {
        for stage in &self.stages {
            stage.before(&mut request).await?;
        }
        let line = RequestLine {
            method: request.method().clone(),
            url: request.url().clone(),
            started: Instant::now(),
        };
        let response = self.http.execute(request).await?;
        for stage in &self.stages {
            stage.after(&line, &response).await?;
        }
        Ok(response)
    }
}

/// Adds a valid bearer token and turns a 401 into an expired session.
pub struct BearerAuth {
    auth: Arc<Authenticator>,
}

impl BearerAuth {
    pub fn new(auth: Arc<Authenticator>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Stage for BearerAuth {
    async fn before(&self, request: &mut Request) -> Result<()> {
        let token = self.auth.ensure_valid_token().await?;
        let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ClientError::InvalidServerResponse("access token is not a valid header".to_string())
        })?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }

    async fn after(&self, line: &RequestLine, response: &Response) -> Result<()> {
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(method = %line.method, url = %line.url, "request rejected with 401");
            self.auth.invalidate()?;
            return Err(ClientError::SessionExpired);
        }
        Ok(())
    }
}

/// Logs every request and its outcome at debug level.
pub struct RequestLogging;

#[async_trait]
impl Stage for RequestLogging {
    async fn before(&self, request: &mut Request) -> Result<()> {
        debug!(method = %request.method(), url = %request.url(), "sending request");
        Ok(())
    }

    async fn after(&self, line: &RequestLine, response: &Response) -> Result<()> {
        debug!(
            method = %line.method,
            url = %line.url,
            status = response.status().as_u16(),
            elapsed_ms = line.started.elapsed().as_millis() as u64,
            "response received"
        );
        Ok(())
    }
}
