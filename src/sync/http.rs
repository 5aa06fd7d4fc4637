// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP implementation of the sync master client.

use crate::error::{OperatorError, Result};
use crate::kubernetes::secrets::{BasicAuth, SecretCredentials};
use crate::sync::client::{SyncMasterClient, SyncMasterConnector, SyncStatus, SynchronizationRequest};
use crate::sync::endpoint::{resolve_endpoint, Endpoint};
use crate::types::EndpointSpec;
use async_trait::async_trait;
use reqwest::{Certificate, Identity, Method, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const STATUS_PATH: &str = "/_api/sync";
const SYNCHRONIZE_PATH: &str = "/_api/sync";
const CANCEL_PATH: &str = "/_api/sync/cancel";

/// Talks to one sync master over HTTPS. Requests go to the first URL of the
/// endpoint that answers.
pub struct HttpSyncMasterClient {
    http: reqwest::Client,
    endpoint: Endpoint,
    basic_auth: Option<BasicAuth>,
    timeout: Duration,
}

impl HttpSyncMasterClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: Endpoint,
        basic_auth: Option<BasicAuth>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoint,
            basic_auth,
            timeout,
        }
    }

    /// Send a request to the first URL that answers. Only a 2xx answer is returned,
    /// any other answer is an error without trying the remaining URLs.
    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(String, Response)>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut last_error = OperatorError::SyncMasterError(format!(
            "endpoint {} has no addresses",
            self.endpoint
        ));

        for base in self.endpoint.urls() {
            let url = format!("{}{}", base, path);
            let mut request = self.http.request(method.clone(), &url).timeout(self.timeout);
            if let Some(auth) = &self.basic_auth {
                request = request.basic_auth(&auth.username, Some(&auth.password));
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!("{} {}", method, url);

            match request.send().await {
                Ok(resp) if resp.status().is_success() => return Ok((url, resp)),
                Ok(resp) => {
                    // The master answered, another address would not change the outcome
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(OperatorError::SyncMasterError(format!(
                        "{} {} failed (status={}): {}",
                        method, url, status, body
                    )));
                }
                Err(e) if e.is_timeout() => {
                    warn!("Request to {} timed out", url);
                    last_error = OperatorError::Timeout(format!("{} {}", method, url), self.timeout);
                }
                Err(e) => {
                    warn!("Request to {} failed: {}", url, e);
                    last_error = OperatorError::SyncMasterError(format!("{} {}: {}", method, url, e));
                }
            }
        }

        Err(last_error)
    }

    /// Send a request whose answer carries no information beyond its status
    async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let (url, resp) = self.send(method, path, body).await?;
        resp.bytes().await.map_err(|e| {
            OperatorError::SyncMasterError(format!("failed to read response from {}: {}", url, e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl SyncMasterClient for HttpSyncMasterClient {
    async fn status(&self) -> Result<SyncStatus> {
        let (url, resp) = self.send::<()>(Method::GET, STATUS_PATH, None).await?;
        resp.json::<SyncStatus>().await.map_err(|e| {
            OperatorError::SyncMasterError(format!("invalid response from {}: {}", url, e))
        })
    }

    async fn synchronize(&self, request: &SynchronizationRequest) -> Result<()> {
        self.execute(Method::POST, SYNCHRONIZE_PATH, Some(request)).await
    }

    async fn cancel_synchronization(&self) -> Result<()> {
        self.execute(Method::POST, CANCEL_PATH, Some(&serde_json::json!({}))).await
    }
}

/// Builds HTTP sync master clients, loading TLS and auth material from secrets
pub struct HttpSyncMasterConnector {
    credentials: SecretCredentials,
    timeout: Duration,
}

impl HttpSyncMasterConnector {
    pub fn new(credentials: SecretCredentials, timeout: Duration) -> Self {
        Self {
            credentials,
            timeout,
        }
    }
}

#[async_trait]
impl SyncMasterConnector for HttpSyncMasterConnector {
    #[instrument(skip(self, spec))]
    async fn connect(&self, namespace: &str, spec: &EndpointSpec) -> Result<Arc<dyn SyncMasterClient>> {
        let endpoint = resolve_endpoint(namespace, spec)?;

        let mut builder = reqwest::Client::builder().use_rustls_tls();

        if let Some(ca) = self.credentials.ca_certificate(namespace, spec).await? {
            let certificate = Certificate::from_pem(ca.as_bytes()).map_err(|e| {
                OperatorError::CredentialsError(format!("invalid CA certificate: {}", e))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        if let Some(keyfile) = self.credentials.keyfile(namespace, spec).await? {
            let identity = Identity::from_pem(keyfile.pem.as_bytes()).map_err(|e| {
                OperatorError::CredentialsError(format!("invalid client keyfile: {}", e))
            })?;
            builder = builder.identity(identity);
        }

        let basic_auth = self.credentials.basic_auth(namespace, spec).await?;

        let http = builder.build().map_err(|e| {
            OperatorError::SyncMasterError(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Arc::new(HttpSyncMasterClient::new(
            http,
            endpoint,
            basic_auth,
            self.timeout,
        )))
    }
}
